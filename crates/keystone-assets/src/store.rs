use crate::catalog::AssetCatalog;
use crate::events::AssetEvent;
use crate::id::AssetId;
use crate::source::AssetSource;
use crate::types::{AssetError, AssetKey, AssetState, LoadedAsset, RequestId};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct PumpBudget {
    pub steps: u32,
}

impl PumpBudget {
    #[inline]
    pub fn steps(steps: u32) -> Self {
        Self { steps }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub sources: usize,
    pub queued: usize,
    pub ready: usize,
    pub failed: usize,
}

#[derive(Debug)]
enum PendingKind {
    Single(AssetKey),
    Batch {
        label: String,
        keys: Vec<AssetKey>,
        loaded: Vec<LoadedAsset>,
    },
}

#[derive(Debug)]
struct PendingRequest {
    request: RequestId,
    kind: PendingKind,
}

#[derive(Default)]
struct StoreInner {
    sources: Vec<Arc<dyn AssetSource>>,
    catalog: AssetCatalog,

    state: HashMap<AssetId, AssetState>,
    loaded: HashMap<AssetId, LoadedAsset>,

    queue: VecDeque<PendingRequest>,
    events: VecDeque<AssetEvent>,
    next_request: u64,
}

impl StoreInner {
    #[inline]
    fn next_request(&mut self) -> RequestId {
        self.next_request += 1;
        RequestId(self.next_request)
    }

    fn is_queued(&self, id: AssetId) -> bool {
        self.queue.iter().any(|r| match &r.kind {
            PendingKind::Single(k) => k.id() == id,
            PendingKind::Batch { keys, loaded, .. } => {
                keys[loaded.len()..].iter().any(|k| k.id() == id)
            }
        })
    }

    /// Members after a failed one are never read; drop their `Loading` mark
    /// unless another queued request still covers them.
    fn release_untried(&mut self, untried: &[AssetKey]) {
        for k in untried {
            let id = k.id();
            if matches!(self.state.get(&id), Some(AssetState::Loading)) && !self.is_queued(id) {
                self.state.remove(&id);
            }
        }
    }
}

/// Pump-driven asset store.
///
/// Requests are queued immediately and progressed by `pump`; completions are
/// reported as [`AssetEvent`]s through `drain_events`. A label batch reads one
/// member per pump step and completes (or fails) as a whole.
#[derive(Default)]
pub struct AssetStore {
    inner: Mutex<StoreInner>,
}

impl AssetStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add_source(&self, source: Arc<dyn AssetSource>) {
        let mut g = self.inner.lock();
        g.sources.push(source);
    }

    #[inline]
    pub fn set_catalog(&self, catalog: AssetCatalog) {
        self.inner.lock().catalog = catalog;
    }

    #[inline]
    pub fn catalog(&self) -> AssetCatalog {
        self.inner.lock().catalog.clone()
    }

    /// Reads and parses a catalog file through the registered sources and
    /// merges it into the active catalog.
    pub fn load_catalog(&self, logical_path: &Path) -> Result<(), AssetError> {
        let bytes = self.read(logical_path)?;
        let parsed = AssetCatalog::from_json(&bytes, &logical_path.to_string_lossy())?;
        self.inner.lock().catalog.merge(parsed);
        Ok(())
    }

    #[inline]
    pub fn state(&self, id: AssetId) -> AssetState {
        let g = self.inner.lock();
        g.state.get(&id).cloned().unwrap_or(AssetState::Unloaded)
    }

    #[inline]
    pub fn get(&self, id: AssetId) -> Option<LoadedAsset> {
        self.inner.lock().loaded.get(&id).cloned()
    }

    #[inline]
    pub fn drain_events(&self) -> Vec<AssetEvent> {
        let mut g = self.inner.lock();
        g.events.drain(..).collect()
    }

    pub fn stats(&self) -> StoreStats {
        let g = self.inner.lock();
        StoreStats {
            sources: g.sources.len(),
            queued: g.queue.len(),
            ready: g
                .state
                .values()
                .filter(|s| matches!(s, AssetState::Ready))
                .count(),
            failed: g
                .state
                .values()
                .filter(|s| matches!(s, AssetState::Failed(_)))
                .count(),
        }
    }

    /// Enqueue a single asset and return its request ticket immediately.
    pub fn load(&self, key: AssetKey) -> RequestId {
        let mut g = self.inner.lock();
        let request = g.next_request();
        let id = key.id();
        if !matches!(g.state.get(&id), Some(AssetState::Ready)) {
            g.state.insert(id, AssetState::Loading);
        }
        g.queue.push_back(PendingRequest {
            request,
            kind: PendingKind::Single(key),
        });
        request
    }

    /// Enqueue every asset tagged with `label` as one batch.
    ///
    /// An unknown label fails the batch on the next drain without touching
    /// any source.
    pub fn load_label(&self, label: &str) -> RequestId {
        let mut g = self.inner.lock();
        let request = g.next_request();

        let Some(keys) = g.catalog.keys(label) else {
            g.events.push_back(AssetEvent::BatchFailed {
                request,
                label: label.to_owned(),
                error: AssetError::UnknownLabel(label.to_owned()),
            });
            return request;
        };

        for k in &keys {
            let id = k.id();
            if !matches!(g.state.get(&id), Some(AssetState::Ready)) {
                g.state.insert(id, AssetState::Loading);
            }
        }

        g.queue.push_back(PendingRequest {
            request,
            kind: PendingKind::Batch {
                label: label.to_owned(),
                keys,
                loaded: Vec::new(),
            },
        });
        request
    }

    /// Progress loading pipeline for a limited amount of work.
    pub fn pump(&self, budget: PumpBudget) {
        let mut steps_left = budget.steps;
        while steps_left > 0 {
            steps_left -= 1;

            let req = {
                let mut g = self.inner.lock();
                g.queue.pop_front()
            };

            let Some(req) = req else {
                break;
            };

            match req.kind {
                PendingKind::Single(key) => {
                    let ev = match self.load_one(&key) {
                        Ok(asset) => AssetEvent::Ready {
                            request: req.request,
                            asset,
                        },
                        Err(error) => AssetEvent::Failed {
                            request: req.request,
                            key,
                            error,
                        },
                    };
                    self.inner.lock().events.push_back(ev);
                }
                PendingKind::Batch {
                    label,
                    keys,
                    mut loaded,
                } => {
                    if let Some(key) = keys.get(loaded.len()) {
                        match self.load_one(key) {
                            Ok(asset) => loaded.push(asset),
                            Err(e) => {
                                let mut g = self.inner.lock();
                                g.release_untried(&keys[loaded.len() + 1..]);
                                g.events.push_back(AssetEvent::BatchFailed {
                                    request: req.request,
                                    label: label.clone(),
                                    error: AssetError::Batch {
                                        label,
                                        cause: Box::new(e),
                                    },
                                });
                                continue;
                            }
                        }
                    }

                    let mut g = self.inner.lock();
                    if loaded.len() < keys.len() {
                        // Keep the batch at the head so it finishes before later requests.
                        g.queue.push_front(PendingRequest {
                            request: req.request,
                            kind: PendingKind::Batch {
                                label,
                                keys,
                                loaded,
                            },
                        });
                    } else {
                        g.events.push_back(AssetEvent::BatchReady {
                            request: req.request,
                            label,
                            assets: loaded,
                        });
                    }
                }
            }
        }
    }

    /// Reads raw bytes through the sources, bypassing the cache.
    pub fn read(&self, logical_path: &Path) -> Result<Vec<u8>, AssetError> {
        let sources = self.inner.lock().sources.clone();
        if sources.is_empty() {
            return Err(AssetError::NoSources);
        }

        // First source that "exists" wins (allows mod override layering).
        for s in &sources {
            if s.exists(logical_path) {
                return s.read(logical_path);
            }
        }

        Err(AssetError::NotFound(
            logical_path.to_string_lossy().into_owned(),
        ))
    }

    fn load_one(&self, key: &AssetKey) -> Result<LoadedAsset, AssetError> {
        let id = key.id();
        if let Some(hit) = self.get(id) {
            return Ok(hit);
        }

        match self.read(&key.logical_path) {
            Ok(bytes) => {
                let asset = LoadedAsset {
                    key: key.clone(),
                    id,
                    bytes: Arc::from(bytes),
                };
                let mut g = self.inner.lock();
                g.loaded.insert(id, asset.clone());
                g.state.insert(id, AssetState::Ready);
                Ok(asset)
            }
            Err(e) => {
                log::debug!(target: "assets", "load failed: key={} err={}", key, e);
                self.inner
                    .lock()
                    .state
                    .insert(id, AssetState::Failed(Arc::from(e.to_string())));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn store_with(files: &[(&str, &str)]) -> AssetStore {
        let mut src = MemorySource::new();
        for (p, body) in files {
            src = src.with(p, *body);
        }
        let store = AssetStore::new();
        store.add_source(Arc::new(src));
        store
    }

    #[test]
    fn single_load_completes_on_pump() {
        let store = store_with(&[("a.json", "{}")]);
        let req = store.load(AssetKey::new("a.json"));
        assert_eq!(store.state(AssetKey::new("a.json").id()), AssetState::Loading);
        assert!(store.drain_events().is_empty());

        store.pump(PumpBudget::steps(1));
        let events = store.drain_events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            AssetEvent::Ready { request, asset } => {
                assert_eq!(*request, req);
                assert_eq!(&*asset.bytes, b"{}");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(store.state(AssetKey::new("a.json").id()), AssetState::Ready);
    }

    #[test]
    fn missing_asset_reports_failure() {
        let store = store_with(&[]);
        store.load(AssetKey::new("missing.json"));
        store.pump(PumpBudget::steps(4));

        let events = store.drain_events();
        assert!(matches!(
            &events[..],
            [AssetEvent::Failed { error: AssetError::NotFound(_), .. }]
        ));
        assert!(matches!(
            store.state(AssetKey::new("missing.json").id()),
            AssetState::Failed(_)
        ));
    }

    #[test]
    fn no_sources_is_an_error() {
        let store = AssetStore::new();
        store.load(AssetKey::new("a.json"));
        store.pump(PumpBudget::steps(1));
        assert!(matches!(
            &store.drain_events()[..],
            [AssetEvent::Failed { error: AssetError::NoSources, .. }]
        ));
    }

    #[test]
    fn batch_takes_one_step_per_member() {
        let store = store_with(&[("a.json", "a"), ("b.json", "b"), ("c.json", "c")]);
        store.set_catalog(
            AssetCatalog::new()
                .with("views", "a.json")
                .with("views", "b.json")
                .with("views", "c.json"),
        );

        let req = store.load_label("views");
        store.pump(PumpBudget::steps(2));
        assert!(store.drain_events().is_empty());
        assert_eq!(store.stats().queued, 1);

        store.pump(PumpBudget::steps(1));
        let events = store.drain_events();
        match &events[..] {
            [AssetEvent::BatchReady { request, label, assets }] => {
                assert_eq!(*request, req);
                assert_eq!(label, "views");
                let names: Vec<String> = assets.iter().map(|a| a.key.to_string()).collect();
                assert_eq!(names, vec!["a.json", "b.json", "c.json"]);
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn batch_fails_as_a_whole() {
        let store = store_with(&[("a.json", "a")]);
        store.set_catalog(
            AssetCatalog::new()
                .with("views", "a.json")
                .with("views", "gone.json"),
        );

        store.load_label("views");
        store.pump(PumpBudget::steps(8));
        let events = store.drain_events();
        assert!(matches!(
            &events[..],
            [AssetEvent::BatchFailed { error: AssetError::Batch { .. }, .. }]
        ));
    }

    #[test]
    fn failed_batch_releases_untried_members() {
        let store = store_with(&[("a.json", "a"), ("c.json", "c")]);
        store.set_catalog(
            AssetCatalog::new()
                .with("views", "a.json")
                .with("views", "missing.json")
                .with("views", "c.json"),
        );

        store.load_label("views");
        store.pump(PumpBudget::steps(16));
        assert!(matches!(
            &store.drain_events()[..],
            [AssetEvent::BatchFailed { .. }]
        ));

        assert_eq!(store.state(AssetKey::new("a.json").id()), AssetState::Ready);
        assert!(matches!(
            store.state(AssetKey::new("missing.json").id()),
            AssetState::Failed(_)
        ));
        assert_eq!(store.state(AssetKey::new("c.json").id()), AssetState::Unloaded);

        // A retry of the same member still loads.
        store.load(AssetKey::new("c.json"));
        store.pump(PumpBudget::steps(1));
        assert_eq!(store.state(AssetKey::new("c.json").id()), AssetState::Ready);
        let stats = store.stats();
        assert_eq!((stats.ready, stats.failed, stats.queued), (2, 1, 0));
    }

    #[test]
    fn failed_batch_keeps_members_another_request_covers() {
        let store = store_with(&[("c.json", "c")]);
        store.set_catalog(
            AssetCatalog::new()
                .with("views", "missing.json")
                .with("views", "c.json"),
        );

        store.load_label("views");
        store.load(AssetKey::new("c.json"));
        store.pump(PumpBudget::steps(1));
        assert_eq!(store.state(AssetKey::new("c.json").id()), AssetState::Loading);

        store.pump(PumpBudget::steps(1));
        assert_eq!(store.state(AssetKey::new("c.json").id()), AssetState::Ready);
    }

    #[test]
    fn unknown_label_fails_and_empty_label_succeeds() {
        let store = store_with(&[]);
        let cat = AssetCatalog::from_json(br#"{"labels":{"empty":[]}}"#, "mem").unwrap();
        store.set_catalog(cat);

        store.load_label("nope");
        store.load_label("empty");
        store.pump(PumpBudget::steps(4));

        let events = store.drain_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            AssetEvent::BatchFailed { error: AssetError::UnknownLabel(l), .. } if l == "nope"
        ));
        assert!(matches!(
            &events[1],
            AssetEvent::BatchReady { assets, .. } if assets.is_empty()
        ));
    }

    #[test]
    fn budget_bounds_work_per_pump() {
        let store = store_with(&[("a.json", "a"), ("b.json", "b")]);
        store.load(AssetKey::new("a.json"));
        store.load(AssetKey::new("b.json"));

        store.pump(PumpBudget::steps(1));
        assert_eq!(store.drain_events().len(), 1);
        store.pump(PumpBudget::steps(1));
        assert_eq!(store.drain_events().len(), 1);
        assert_eq!(store.stats().ready, 2);
    }

    #[test]
    fn catalog_loads_through_sources() {
        let store = store_with(&[("catalog.json", r#"{"labels":{"views":["a.json"]}}"#)]);
        store.load_catalog(Path::new("catalog.json")).unwrap();
        assert!(store.catalog().contains_label("views"));
        assert!(store.load_catalog(Path::new("missing.json")).is_err());
    }
}
