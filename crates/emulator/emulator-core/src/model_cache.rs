//! Lazy, shared registry of loaded models
//!
//! The key set is closed, so every key owns a fixed once-cell indexed by
//! [`ModelKey::index`]. Lookups take no lock; loads of different keys
//! proceed in parallel while concurrent requests for the same key wait on
//! one loader. Failed loads leave the cell empty and are retried on the
//! next request.

use emulator_spi::{ErrorKind, ModelHandle, ModelKey, ModelLoader, Result};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which keys to load eagerly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarmUp {
    /// Every known (predictor, model type) combination
    All,
    Subset(Vec<ModelKey>),
}

impl WarmUp {
    fn keys(&self) -> Vec<ModelKey> {
        match self {
            WarmUp::All => ModelKey::all(),
            WarmUp::Subset(keys) => keys.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmUpOptions {
    /// Log each load at info level
    pub verbose: bool,
    /// Fail on the first missing artifact instead of recording it
    pub strict: bool,
}

/// Outcome of [`ModelCache::warm_up`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WarmUpReport {
    pub loaded: Vec<ModelKey>,
    pub missing: Vec<ModelKey>,
}

impl WarmUpReport {
    /// True when every requested key is now loaded.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Registry from [`ModelKey`] to a loaded [`ModelHandle`].
pub struct ModelCache {
    loader: Arc<dyn ModelLoader>,
    slots: [OnceCell<ModelHandle>; ModelKey::COUNT],
}

impl ModelCache {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            slots: Default::default(),
        }
    }

    pub fn with_loader<L: ModelLoader + 'static>(loader: L) -> Self {
        Self::new(Arc::new(loader))
    }

    fn slot(&self, key: ModelKey) -> &OnceCell<ModelHandle> {
        &self.slots[key.index()]
    }

    /// Model for `key`, loading it on first use.
    ///
    /// Every successful call for the same key returns the same handle.
    pub fn get(&self, key: ModelKey) -> Result<ModelHandle> {
        let slot = self.slot(key);
        if let Some(handle) = slot.get() {
            debug!(model = %key, "model cache hit");
            return Ok(handle.clone());
        }
        slot.get_or_try_init(|| {
            debug!(model = %key, location = %self.loader.location(), "loading model");
            self.loader.load(key)
        })
        .cloned()
    }

    /// Load `which` eagerly.
    ///
    /// Missing artifacts are recorded and logged unless `options.strict` is
    /// set, in which case the first one fails the call. Any other load error
    /// is returned immediately.
    pub fn warm_up(&self, which: &WarmUp, options: WarmUpOptions) -> Result<WarmUpReport> {
        let mut report = WarmUpReport::default();
        for key in which.keys() {
            match self.get(key) {
                Ok(_) => {
                    if options.verbose {
                        info!(model = %key, "model ready");
                    }
                    report.loaded.push(key);
                }
                Err(e) if e.kind() == ErrorKind::ArtifactNotFound && !options.strict => {
                    warn!(model = %key, error = %e, "skipping missing model artifact");
                    report.missing.push(key);
                }
                Err(e) => return Err(e),
            }
        }
        if options.verbose {
            info!(
                loaded = report.loaded.len(),
                missing = report.missing.len(),
                location = %self.loader.location(),
                "model warm-up finished"
            );
        }
        Ok(report)
    }

    pub fn is_loaded(&self, key: ModelKey) -> bool {
        self.slot(key).get().is_some()
    }

    /// Keys with a loaded model, sorted.
    pub fn loaded_keys(&self) -> Vec<ModelKey> {
        ModelKey::all()
            .into_iter()
            .filter(|&key| self.is_loaded(key))
            .collect()
    }

    /// Number of loaded models.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Where the loader looks for artifacts.
    pub fn location(&self) -> String {
        self.loader.location()
    }
}

impl fmt::Debug for ModelCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelCache")
            .field("location", &self.loader.location())
            .field("loaded", &self.loaded_keys())
            .finish()
    }
}
