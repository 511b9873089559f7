use crate::error::{EngineError, EngineResult, RegistryKind, ServiceStage};
use crate::frame::Frame;
use crate::service::{
    short_type_name, Continuation, Service, ServiceCtx, ServiceFactory, ServiceHandle,
};
use crate::sync::ShutdownToken;

use log::{debug, error, info, warn};
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    Started,
    CleanedUp,
}

/// Internal registry record.
struct ServiceSlot {
    name: &'static str,
    service: Rc<RefCell<dyn Service>>,
    // Holds `ServiceHandle<T>` for typed lookups.
    typed: Box<dyn Any>,
}

/// Type-keyed registry of singleton services.
///
/// Engine-thread local: services are `Rc<RefCell<_>>` and may hold `!Send` state.
/// Hooks run in insertion order.
pub struct ServiceRegistry {
    slots: Vec<ServiceSlot>,
    index: HashMap<TypeId, usize>,
    shutdown: ShutdownToken,
    phase: Phase,
}

impl Default for ServiceRegistry {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::with_shutdown(ShutdownToken::new())
    }

    #[inline]
    pub fn with_shutdown(shutdown: ShutdownToken) -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
            shutdown,
            phase: Phase::Created,
        }
    }

    #[inline]
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }

    #[inline]
    pub(crate) fn set_shutdown_token(&mut self, shutdown: ShutdownToken) {
        self.shutdown = shutdown;
    }

    #[inline]
    pub fn request_exit(&self) {
        self.shutdown.request();
    }

    #[inline]
    pub fn exit_requested(&self) -> bool {
        self.shutdown.is_requested()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.phase == Phase::Started
    }

    /// Registered service names in insertion order.
    pub fn names(&self) -> Vec<&'static str> {
        self.slots.iter().map(|s| s.name).collect()
    }

    /// Registers `service` under its concrete type.
    ///
    /// A second registration of the same type, or of another type with the same
    /// short name, fails with `AlreadyExists` and the first instance stays.
    /// Registering after `start` runs `init` and `late_init` for the newcomer
    /// right away.
    pub fn register<T: Service>(&mut self, service: T) -> EngineResult<ServiceHandle<T>> {
        let name = short_type_name::<T>();
        let type_id = TypeId::of::<T>();
        if self.index.contains_key(&type_id) || self.slots.iter().any(|s| s.name == name) {
            let e = EngineError::already_exists(RegistryKind::Service, name);
            error!(target: "services", "{e}");
            return Err(e);
        }

        let handle: ServiceHandle<T> = Rc::new(RefCell::new(service));
        let dynamic: Rc<RefCell<dyn Service>> = handle.clone();

        let idx = self.slots.len();
        self.index.insert(type_id, idx);
        self.slots.push(ServiceSlot {
            name,
            service: dynamic,
            typed: Box::new(handle.clone()),
        });
        debug!(target: "services", "registered {name}");

        if self.phase == Phase::Started {
            for stage in [ServiceStage::Init, ServiceStage::LateInit] {
                self.run_one(idx, stage, None)?;
            }
        }

        Ok(handle)
    }

    /// Constructs one instance per table entry. Failures are logged and skipped.
    pub fn register_all(&mut self, factories: &[ServiceFactory]) {
        for f in factories {
            match f.build(self) {
                Ok(()) => {}
                // Already reported by `register`.
                Err(EngineError::AlreadyExists { .. }) => {}
                Err(e) => error!(target: "services", "failed to construct {}: {e}", f.name()),
            }
        }
    }

    /// Constructs every table entry, then runs `start`.
    pub fn init_all(&mut self, factories: &[ServiceFactory]) -> EngineResult<()> {
        self.register_all(factories);
        self.start()
    }

    /// Runs `init` on every service, then `late_init` on every service. Runs once.
    pub fn start(&mut self) -> EngineResult<()> {
        if self.phase != Phase::Created {
            warn!(target: "services", "start called twice; ignored");
            return Ok(());
        }
        self.phase = Phase::Started;

        self.run_stage(ServiceStage::Init, None)?;
        self.run_stage(ServiceStage::LateInit, None)?;

        info!(target: "services", "started {} services", self.slots.len());
        Ok(())
    }

    /// Runs `update` on every service in insertion order.
    pub fn update_all(&self, frame: &Frame) -> EngineResult<()> {
        if self.phase != Phase::Started {
            warn!(target: "services", "update before start (or after cleanup); ignored");
            return Ok(());
        }
        self.run_stage(ServiceStage::Update, Some(frame))
    }

    /// Runs `cleanup` on every service in insertion order. Runs once.
    pub fn cleanup_all(&mut self) {
        if self.phase != Phase::Started {
            return;
        }
        self.phase = Phase::CleanedUp;
        let _ = self.run_stage(ServiceStage::Cleanup, None);
    }

    /// Returns the single instance of `T`, logging an error when it is not registered.
    pub fn get<T: Service>(&self) -> Option<ServiceHandle<T>> {
        let found = self.try_get::<T>();
        if found.is_none() {
            error!(
                target: "services",
                "could not find {} in the service registry, was it registered?",
                short_type_name::<T>()
            );
        }
        found
    }

    /// Same as `get` without the error log.
    pub fn try_get<T: Service>(&self) -> Option<ServiceHandle<T>> {
        let &idx = self.index.get(&TypeId::of::<T>())?;
        self.slots[idx]
            .typed
            .downcast_ref::<ServiceHandle<T>>()
            .cloned()
    }

    #[inline]
    pub fn contains<T: Service>(&self) -> bool {
        self.index.contains_key(&TypeId::of::<T>())
    }

    fn run_stage(&self, stage: ServiceStage, frame: Option<&Frame>) -> EngineResult<()> {
        for idx in 0..self.slots.len() {
            match self.run_one(idx, stage, frame) {
                Err(EngineError::ExitRequested) if stage != ServiceStage::Cleanup => {
                    return Err(EngineError::ExitRequested);
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Runs one hook and its deferred continuations. Errors other than
    /// `ExitRequested` are logged with stage attribution and swallowed.
    fn run_one(&self, idx: usize, stage: ServiceStage, frame: Option<&Frame>) -> EngineResult<()> {
        let slot = &self.slots[idx];
        let mut ctx = ServiceCtx::new(self);
        if let Some(f) = frame {
            ctx.set_frame(f);
        }

        let result = {
            let Ok(mut svc) = slot.service.try_borrow_mut() else {
                error!(
                    target: "services",
                    "service '{}' is busy; skipping {stage:?}",
                    slot.name
                );
                return Ok(());
            };
            match stage {
                ServiceStage::Init => svc.init(&mut ctx),
                ServiceStage::LateInit => svc.late_init(&mut ctx),
                ServiceStage::Update => svc.update(&mut ctx),
                ServiceStage::Cleanup => svc.cleanup(&mut ctx),
            }
        };

        self.run_deferred(ctx.take_deferred());

        match result {
            Ok(()) => Ok(()),
            Err(EngineError::ExitRequested) => Err(EngineError::ExitRequested),
            Err(e) => {
                error!(target: "services", "{}", EngineError::with_stage(slot.name, stage, e));
                Ok(())
            }
        }
    }

    fn run_deferred(&self, deferred: Vec<Continuation>) {
        for c in deferred {
            c(self);
        }
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.names())
            .field("phase", &self.phase)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Journal = Rc<RefCell<Vec<String>>>;

    #[derive(Debug)]
    struct Recorder {
        tag: &'static str,
        journal: Journal,
        value: u32,
    }

    impl Recorder {
        fn new(tag: &'static str, journal: &Journal) -> Self {
            Self {
                tag,
                journal: journal.clone(),
                value: 0,
            }
        }

        fn note(&self, what: &str) {
            self.journal.borrow_mut().push(format!("{}.{what}", self.tag));
        }
    }

    macro_rules! recorder_service {
        ($name:ident) => {
            #[derive(Debug)]
            struct $name(Recorder);

            impl Service for $name {
                fn init(&mut self, _ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
                    self.0.note("init");
                    Ok(())
                }

                fn late_init(&mut self, _ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
                    self.0.note("late_init");
                    Ok(())
                }

                fn update(&mut self, _ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
                    self.0.note("update");
                    Ok(())
                }

                fn cleanup(&mut self, _ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
                    self.0.note("cleanup");
                    Ok(())
                }
            }
        };
    }

    recorder_service!(Alpha);
    recorder_service!(Beta);

    #[derive(Default)]
    struct Gamma;
    impl Service for Gamma {}

    #[derive(Default)]
    struct Counter {
        updates: u32,
    }
    impl Service for Counter {
        fn update(&mut self, _ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
            self.updates += 1;
            Ok(())
        }
    }

    fn journal() -> Journal {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn get_returns_the_same_instance() {
        let j = journal();
        let mut reg = ServiceRegistry::new();
        reg.register(Alpha(Recorder::new("a", &j))).unwrap();
        reg.register(Beta(Recorder::new("b", &j))).unwrap();
        reg.start().unwrap();

        let a1 = reg.get::<Alpha>().unwrap();
        let a2 = reg.get::<Alpha>().unwrap();
        assert!(Rc::ptr_eq(&a1, &a2));
        assert!(reg.get::<Beta>().is_some());
        assert!(reg.get::<Gamma>().is_none());
        assert!(!reg.contains::<Gamma>());
    }

    #[test]
    fn every_init_runs_before_any_late_init() {
        let j = journal();
        let mut reg = ServiceRegistry::new();
        reg.register(Alpha(Recorder::new("a", &j))).unwrap();
        reg.register(Beta(Recorder::new("b", &j))).unwrap();
        reg.start().unwrap();

        assert_eq!(
            *j.borrow(),
            vec!["a.init", "b.init", "a.late_init", "b.late_init"]
        );
    }

    #[test]
    fn update_and_cleanup_follow_insertion_order() {
        let j = journal();
        let mut reg = ServiceRegistry::new();
        reg.register(Beta(Recorder::new("b", &j))).unwrap();
        reg.register(Alpha(Recorder::new("a", &j))).unwrap();

        reg.update_all(&Frame::first(0.016)).unwrap();
        assert!(j.borrow().is_empty(), "update before start must be ignored");

        reg.start().unwrap();
        j.borrow_mut().clear();
        reg.update_all(&Frame::first(0.016)).unwrap();
        reg.cleanup_all();
        reg.cleanup_all();

        assert_eq!(
            *j.borrow(),
            vec!["b.update", "a.update", "b.cleanup", "a.cleanup"]
        );
    }

    #[test]
    fn duplicate_registration_keeps_the_first_instance() {
        let j = journal();
        let mut reg = ServiceRegistry::new();
        let mut first = Recorder::new("a", &j);
        first.value = 1;
        reg.register(Alpha(first)).unwrap();

        let mut second = Recorder::new("a2", &j);
        second.value = 2;
        let err = reg.register(Alpha(second)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::AlreadyExists { kind: RegistryKind::Service, ref name } if name == "Alpha"
        ));

        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get::<Alpha>().unwrap().borrow().0.value, 1);
    }

    mod audio {
        #[derive(Default, Debug)]
        pub struct Cache;
        impl super::Service for Cache {}
    }

    mod net {
        #[derive(Default, Debug)]
        pub struct Cache;
        impl super::Service for Cache {}
    }

    #[test]
    fn same_short_name_from_another_module_is_rejected() {
        let mut reg = ServiceRegistry::new();
        reg.register(audio::Cache).unwrap();

        let err = reg.register(net::Cache).unwrap_err();
        assert!(matches!(
            err,
            EngineError::AlreadyExists { kind: RegistryKind::Service, ref name } if name == "Cache"
        ));
        assert_eq!(reg.names(), vec!["Cache"]);
        assert!(reg.try_get::<audio::Cache>().is_some());
        assert!(reg.try_get::<net::Cache>().is_none());
    }

    #[test]
    fn init_all_builds_from_factory_table() {
        let mut reg = ServiceRegistry::new();
        reg.init_all(&[
            ServiceFactory::of::<Counter>(),
            ServiceFactory::of::<Gamma>(),
            ServiceFactory::of::<Counter>(),
        ])
        .unwrap();

        assert_eq!(reg.names(), vec!["Counter", "Gamma"]);
        reg.update_all(&Frame::first(0.0)).unwrap();
        reg.update_all(&Frame::first(0.0)).unwrap();
        assert_eq!(reg.get::<Counter>().unwrap().borrow().updates, 2);
    }

    #[derive(Default)]
    struct Failing {
        attempts: u32,
    }
    impl Service for Failing {
        fn update(&mut self, _ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
            self.attempts += 1;
            Err(EngineError::other("boom"))
        }
    }

    #[test]
    fn hook_errors_do_not_stop_other_services() {
        let mut reg = ServiceRegistry::new();
        reg.register(Failing::default()).unwrap();
        reg.register(Counter::default()).unwrap();
        reg.start().unwrap();

        reg.update_all(&Frame::first(0.0)).unwrap();
        assert_eq!(reg.get::<Failing>().unwrap().borrow().attempts, 1);
        assert_eq!(reg.get::<Counter>().unwrap().borrow().updates, 1);
    }

    #[derive(Default)]
    struct SelfPoke {
        poked: bool,
    }
    impl Service for SelfPoke {
        fn late_init(&mut self, ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
            // Self is borrowed here; the continuation runs after we return.
            assert!(ctx.services().try_get::<SelfPoke>().unwrap().try_borrow_mut().is_err());
            ctx.defer(|services| {
                if let Some(me) = services.get::<SelfPoke>() {
                    me.borrow_mut().poked = true;
                }
            });
            Ok(())
        }
    }

    #[test]
    fn deferred_work_runs_after_the_hook_returns() {
        let mut reg = ServiceRegistry::new();
        reg.register(SelfPoke::default()).unwrap();
        reg.start().unwrap();
        assert!(reg.get::<SelfPoke>().unwrap().borrow().poked);
    }

    #[derive(Default)]
    struct Quitter;
    impl Service for Quitter {
        fn update(&mut self, ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
            ctx.request_exit();
            Ok(())
        }
    }

    #[test]
    fn request_exit_reaches_the_shared_token() {
        let token = ShutdownToken::new();
        let mut reg = ServiceRegistry::with_shutdown(token.clone());
        reg.register(Quitter).unwrap();
        reg.start().unwrap();
        reg.update_all(&Frame::first(0.0)).unwrap();
        assert!(token.is_requested());
    }

    #[test]
    fn late_registration_is_initialized_immediately() {
        let j = journal();
        let mut reg = ServiceRegistry::new();
        reg.start().unwrap();
        reg.register(Alpha(Recorder::new("a", &j))).unwrap();
        assert_eq!(*j.borrow(), vec!["a.init", "a.late_init"]);
    }
}
