use crate::error::EngineResult;
use crate::registry::ServiceRegistry;
use crate::service::{Service, ServiceCtx};
use crate::startup::StartupConfig;

use keystone_assets::{
    AssetError, AssetEvent, AssetKey, AssetStore, FileSystemSource, LoadedAsset, PumpBudget,
    RequestId,
};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

pub type AssetCallback = Box<dyn FnOnce(&ServiceRegistry, Result<LoadedAsset, AssetError>)>;
pub type BatchCallback = Box<dyn FnOnce(&ServiceRegistry, Result<Vec<LoadedAsset>, AssetError>)>;

enum Pending {
    Single(AssetCallback),
    Batch(BatchCallback),
}

/// Service front-end of the asset store.
///
/// Requests are pumped during `update`; callbacks run as deferred continuations
/// so they may look up and mutate any service, including the requester.
pub struct AssetService {
    store: Arc<AssetStore>,
    catalog: Option<PathBuf>,
    budget: PumpBudget,
    initialized: bool,
    pending: HashMap<RequestId, Pending>,
}

impl Default for AssetService {
    #[inline]
    fn default() -> Self {
        Self::new(Arc::new(AssetStore::new()))
    }
}

impl AssetService {
    pub fn new(store: Arc<AssetStore>) -> Self {
        Self {
            store,
            catalog: None,
            budget: PumpBudget::steps(8),
            initialized: false,
            pending: HashMap::new(),
        }
    }

    /// File-system backed service rooted at `assets_root`, reading the label
    /// catalog and pump budget from the startup config.
    pub fn from_config(cfg: &StartupConfig) -> Self {
        let store = Arc::new(AssetStore::new());
        store.add_source(Arc::new(FileSystemSource::new(&cfg.assets_root)));
        Self::new(store)
            .with_catalog(&cfg.asset_catalog)
            .with_budget(cfg.asset_pump_steps)
    }

    /// Catalog file read during `init`, relative to the store sources.
    #[inline]
    pub fn with_catalog(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog = Some(path.into());
        self
    }

    #[inline]
    pub fn with_budget(mut self, steps: u32) -> Self {
        self.budget = PumpBudget::steps(steps.max(1));
        self
    }

    #[inline]
    pub fn store(&self) -> &Arc<AssetStore> {
        &self.store
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[inline]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Requests one asset. The callback fires on a later `update`.
    ///
    /// Returns `None` (with a warning) before the service is initialized.
    pub fn load_asset<F>(&mut self, key: impl Into<AssetKey>, callback: F) -> Option<RequestId>
    where
        F: FnOnce(&ServiceRegistry, Result<LoadedAsset, AssetError>) + 'static,
    {
        let key = key.into();
        if !self.initialized {
            warn!(target: "assets", "asset service is not initialized yet; dropped load of '{key}'");
            return None;
        }
        let req = self.store.load(key);
        self.pending.insert(req, Pending::Single(Box::new(callback)));
        Some(req)
    }

    /// Requests every asset tagged with `label` as one batch.
    pub fn load_assets<F>(&mut self, label: &str, callback: F) -> Option<RequestId>
    where
        F: FnOnce(&ServiceRegistry, Result<Vec<LoadedAsset>, AssetError>) + 'static,
    {
        if !self.initialized {
            warn!(target: "assets", "asset service is not initialized yet; dropped label '{label}'");
            return None;
        }
        let req = self.store.load_label(label);
        self.pending.insert(req, Pending::Batch(Box::new(callback)));
        Some(req)
    }
}

impl Service for AssetService {
    fn init(&mut self, _ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
        if let Some(path) = &self.catalog {
            if let Err(e) = self.store.load_catalog(path) {
                error!(target: "assets", "asset catalog load failed: {e}");
                return Ok(());
            }
            info!(target: "assets", "catalog loaded: {}", path.display());
        }
        self.initialized = true;
        Ok(())
    }

    fn update(&mut self, ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        self.store.pump(self.budget);

        for ev in self.store.drain_events() {
            let Some(pending) = self.pending.remove(&ev.request()) else {
                continue;
            };

            match (pending, ev) {
                (Pending::Single(cb), AssetEvent::Ready { asset, .. }) => {
                    ctx.defer(move |s| cb(s, Ok(asset)));
                }
                (Pending::Single(cb), AssetEvent::Failed { key, error, .. }) => {
                    error!(target: "assets", "failed to load asset '{key}': {error}");
                    ctx.defer(move |s| cb(s, Err(error)));
                }
                (Pending::Batch(cb), AssetEvent::BatchReady { label, assets, .. }) => {
                    debug!(target: "assets", "label '{label}' ready ({} assets)", assets.len());
                    ctx.defer(move |s| cb(s, Ok(assets)));
                }
                (Pending::Batch(cb), AssetEvent::BatchFailed { label, error, .. }) => {
                    error!(target: "assets", "failed to load assets with label '{label}': {error}");
                    ctx.defer(move |s| cb(s, Err(error)));
                }
                (_, ev) => {
                    warn!(target: "assets", "request kind mismatch for {:?}", ev.request());
                }
            }
        }

        Ok(())
    }

    fn cleanup(&mut self, _ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
        if !self.pending.is_empty() {
            debug!(target: "assets", "dropping {} pending requests", self.pending.len());
            self.pending.clear();
        }
        Ok(())
    }
}
