use keystone_core::asset::{AssetCatalog, AssetError, AssetStore, MemorySource};
use keystone_core::{AssetService, Engine, EngineConfig, EngineResult, Service, ServiceCtx};
use std::sync::Arc;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
struct Consumer {
    label: &'static str,
    batch: Option<Result<Vec<String>, String>>,
    single: Option<Result<String, String>>,
}

impl Service for Consumer {
    fn late_init(&mut self, ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
        let Some(assets) = ctx.get::<AssetService>() else {
            return Ok(());
        };
        let mut assets = assets.borrow_mut();

        assets.load_assets(self.label, |services, result| {
            let mapped: Result<Vec<String>, String> = result
                .map(|list| list.iter().map(|a| a.key.to_string()).collect())
                .map_err(|e| e.to_string());
            if let Some(me) = services.get::<Consumer>() {
                me.borrow_mut().batch = Some(mapped);
            }
        });

        assets.load_asset("readme.txt", |services, result| {
            let mapped: Result<String, String> = result
                .and_then(|a| a.as_str().map(str::to_owned))
                .map_err(|e: AssetError| e.to_string());
            if let Some(me) = services.get::<Consumer>() {
                me.borrow_mut().single = Some(mapped);
            }
        });
        Ok(())
    }
}

fn engine_with(label: &'static str) -> Engine {
    let store = Arc::new(AssetStore::new());
    store.add_source(Arc::new(
        MemorySource::new()
            .with("catalog.json", r#"{ "labels": { "views": ["a.json", "b.json"], "broken": ["a.json", "zz.json"] } }"#)
            .with("a.json", "{}")
            .with("b.json", "{}")
            .with("readme.txt", "hello"),
    ));

    let mut engine = Engine::new(EngineConfig {
        target_fps: 0,
        ..Default::default()
    });
    engine
        .register(AssetService::new(store).with_catalog("catalog.json").with_budget(1))
        .unwrap();
    engine
        .register(Consumer {
            label,
            ..Default::default()
        })
        .unwrap();
    engine
}

#[test]
fn batch_and_single_callbacks_fire_on_later_frames() {
    init_logs();
    let mut engine = engine_with("views");
    engine.start().unwrap();

    let consumer = engine.services().get::<Consumer>().unwrap();
    assert!(consumer.borrow().batch.is_none());

    for _ in 0..5 {
        engine.step_with(0.016).unwrap();
    }

    let c = consumer.borrow();
    assert_eq!(
        c.batch,
        Some(Ok(vec!["a.json".to_owned(), "b.json".to_owned()]))
    );
    assert_eq!(c.single, Some(Ok("hello".to_owned())));
}

#[test]
fn failed_batch_reports_an_error() {
    init_logs();
    let mut engine = engine_with("broken");
    engine.start().unwrap();
    for _ in 0..5 {
        engine.step_with(0.016).unwrap();
    }

    let consumer = engine.services().get::<Consumer>().unwrap();
    let c = consumer.borrow();
    assert!(matches!(&c.batch, Some(Err(msg)) if msg.contains("broken")));
}

#[test]
fn unknown_label_reports_an_error() {
    init_logs();
    let mut engine = engine_with("nope");
    engine.start().unwrap();
    engine.step_with(0.016).unwrap();

    let consumer = engine.services().get::<Consumer>().unwrap();
    assert!(matches!(&consumer.borrow().batch, Some(Err(msg)) if msg.contains("nope")));
}

#[test]
fn loading_before_init_is_refused() {
    init_logs();
    let mut assets = AssetService::default();
    assert!(!assets.is_initialized());
    assert!(assets.load_assets("views", |_, _| {}).is_none());
    assert!(assets.load_asset("a.json", |_, _| {}).is_none());
    assert_eq!(assets.pending(), 0);
}

#[test]
fn missing_catalog_leaves_service_uninitialized() {
    init_logs();
    let store = Arc::new(AssetStore::new());
    store.add_source(Arc::new(MemorySource::new()));
    store.set_catalog(AssetCatalog::new());

    let mut engine = Engine::new(EngineConfig::default());
    let assets = engine
        .register(AssetService::new(store).with_catalog("catalog.json"))
        .unwrap();
    engine.start().unwrap();
    assert!(!assets.borrow().is_initialized());
}
