use crate::error::EngineResult;
use crate::frame::Frame;
use crate::registry::ServiceRegistry;

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to a registered service. Repeated lookups return the same `Rc`.
pub type ServiceHandle<T> = Rc<RefCell<T>>;

/// Work queued by a hook that must run once no service is borrowed.
pub type Continuation = Box<dyn FnOnce(&ServiceRegistry)>;

/// A process-lifetime singleton driven by the registry.
///
/// Lifecycle: `init` on every service, then `late_init` on every service, then
/// `update` once per frame, then `cleanup` at shutdown. All hooks default to no-ops.
pub trait Service: Any {
    fn init(&mut self, _ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
        Ok(())
    }

    fn late_init(&mut self, _ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
        Ok(())
    }

    fn update(&mut self, _ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
        Ok(())
    }

    fn cleanup(&mut self, _ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
        Ok(())
    }
}

/// Context passed to service hooks.
///
/// The service receiving the hook is mutably borrowed for the duration of the
/// call; looking itself up through `get` would fail, so self-directed follow-up
/// work goes through `defer`.
pub struct ServiceCtx<'a> {
    services: &'a ServiceRegistry,
    frame: Option<Frame>,
    deferred: Vec<Continuation>,
}

impl<'a> ServiceCtx<'a> {
    #[inline]
    pub(crate) fn new(services: &'a ServiceRegistry) -> Self {
        Self {
            services,
            frame: None,
            deferred: Vec::new(),
        }
    }

    /// Attaches a frame snapshot to the context.
    #[inline]
    pub fn set_frame(&mut self, frame: &Frame) {
        self.frame = Some(*frame);
    }

    /// Returns the current frame snapshot; attached only during `update`.
    #[inline]
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    #[inline]
    pub fn services(&self) -> &'a ServiceRegistry {
        self.services
    }

    /// Looks up another service, logging an error when it is not registered.
    #[inline]
    pub fn get<T: Service>(&self) -> Option<ServiceHandle<T>> {
        self.services.get::<T>()
    }

    #[inline]
    pub fn try_get<T: Service>(&self) -> Option<ServiceHandle<T>> {
        self.services.try_get::<T>()
    }

    #[inline]
    pub fn contains<T: Service>(&self) -> bool {
        self.services.contains::<T>()
    }

    /// Queues `f` to run right after the current hook returns.
    #[inline]
    pub fn defer(&mut self, f: impl FnOnce(&ServiceRegistry) + 'static) {
        self.deferred.push(Box::new(f));
    }

    #[inline]
    pub fn request_exit(&mut self) {
        self.services.request_exit();
    }

    #[inline]
    pub fn is_exit_requested(&self) -> bool {
        self.services.exit_requested()
    }

    #[inline]
    pub(crate) fn take_deferred(&mut self) -> Vec<Continuation> {
        std::mem::take(&mut self.deferred)
    }
}

/// Entry of an explicit registration table.
#[derive(Clone, Copy)]
pub struct ServiceFactory {
    name: &'static str,
    build: fn(&mut ServiceRegistry) -> EngineResult<()>,
}

impl ServiceFactory {
    /// Factory that registers `T::default()`.
    #[inline]
    pub fn of<T: Service + Default>() -> Self {
        Self {
            name: short_type_name::<T>(),
            build: build_default::<T>,
        }
    }

    /// Factory with a custom constructor.
    #[inline]
    pub fn new(name: &'static str, build: fn(&mut ServiceRegistry) -> EngineResult<()>) -> Self {
        Self { name, build }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub(crate) fn build(&self, registry: &mut ServiceRegistry) -> EngineResult<()> {
        (self.build)(registry)
    }
}

impl std::fmt::Debug for ServiceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ServiceFactory").field(&self.name).finish()
    }
}

fn build_default<T: Service + Default>(registry: &mut ServiceRegistry) -> EngineResult<()> {
    registry.register(T::default()).map(|_| ())
}

/// Type name without module path or generic arguments: `"ViewService"`.
///
/// Used as the case-sensitive string key for services, states and views.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = match full.find('<') {
        Some(i) => &full[..i],
        None => full,
    };
    match base.rfind("::") {
        Some(i) => &base[i + 2..],
        None => base,
    }
}
