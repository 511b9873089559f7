use crate::any::AsAny;
use crate::view::ViewBehaviour;
use crate::view_service::ViewService;

use keystone_core::{short_type_name, EngineError, EngineResult, Frame, RegistryKind};
use log::error;
use std::any::TypeId;

/// Context passed to state hooks.
///
/// Transitions requested here are applied by the state service right after
/// the hook returns; the last request wins.
pub struct StateCtx<'a> {
    views: Option<&'a mut ViewService>,
    request: &'a mut Option<String>,
    frame: Option<Frame>,
}

impl<'a> StateCtx<'a> {
    #[inline]
    pub(crate) fn new(
        views: Option<&'a mut ViewService>,
        request: &'a mut Option<String>,
        frame: Option<Frame>,
    ) -> Self {
        Self {
            views,
            request,
            frame,
        }
    }

    #[inline]
    pub fn views(&mut self) -> Option<&mut ViewService> {
        self.views.as_deref_mut()
    }

    pub fn open_view<V: ViewBehaviour>(&mut self) -> EngineResult<bool> {
        self.require_views()?.open::<V>()
    }

    pub fn close_view<V: ViewBehaviour>(&mut self) -> EngineResult<bool> {
        self.require_views()?.close::<V>()
    }

    fn require_views(&mut self) -> EngineResult<&mut ViewService> {
        match self.views.as_deref_mut() {
            Some(v) => Ok(v),
            None => {
                let e = EngineError::not_found(RegistryKind::Service, "ViewService");
                error!(target: "states", "{e}");
                Err(e)
            }
        }
    }

    /// Requests a transition to `S` once the current hook returns.
    #[inline]
    pub fn change_state<S: State>(&mut self) {
        self.change_state_named(short_type_name::<S>());
    }

    #[inline]
    pub fn change_state_named(&mut self, name: &str) {
        *self.request = Some(name.to_owned());
    }

    #[inline]
    pub fn requested_state(&self) -> Option<&str> {
        self.request.as_deref()
    }

    /// Current frame; present during `update` and transitions made from it.
    #[inline]
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }
}

/// One node of the navigation state machine. All hooks default to no-ops,
/// except `enter` and `exit` which open and close the state's views.
pub trait State: AsAny + 'static {
    fn init(&mut self, _ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        Ok(())
    }

    fn cleanup(&mut self, _ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        Ok(())
    }

    fn enter(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        self.open_views(ctx)
    }

    fn update(&mut self, _ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        Ok(())
    }

    fn exit(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        self.close_views(ctx)
    }

    /// Opens the views belonging to this state.
    fn open_views(&mut self, _ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        Ok(())
    }

    /// Closes the views belonging to this state.
    fn close_views(&mut self, _ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        Ok(())
    }
}

/// Entry of the explicit state table handed to the state service.
#[derive(Clone, Copy)]
pub struct StateFactory {
    name: &'static str,
    type_id: TypeId,
    build: fn() -> Box<dyn State>,
}

impl StateFactory {
    #[inline]
    pub fn of<T: State + Default>() -> Self {
        Self {
            name: short_type_name::<T>(),
            type_id: TypeId::of::<T>(),
            build: build_state::<T>,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub(crate) fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub(crate) fn build(&self) -> Box<dyn State> {
        (self.build)()
    }
}

impl std::fmt::Debug for StateFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StateFactory").field(&self.name).finish()
    }
}

fn build_state<T: State + Default>() -> Box<dyn State> {
    Box::new(T::default())
}
