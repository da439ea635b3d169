//! Error module containing the emulator error type and result alias

mod emulator_error;

pub use emulator_error::{EmulatorError, ErrorKind};

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;
