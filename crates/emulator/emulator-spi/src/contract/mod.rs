//! Contract module containing the traits model providers implement

mod model_loader;
mod time_series_model;

pub use model_loader::ModelLoader;
pub use time_series_model::{ModelHandle, TimeSeriesModel};
