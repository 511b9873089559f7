use crate::state::{State, StateCtx, StateFactory};
use crate::view_service::ViewService;

use keystone_core::{
    short_type_name, EngineError, EngineResult, Frame, RegistryKind, Service, ServiceCtx,
    ServiceHandle,
};
use log::{debug, error, info, warn};
use std::any::TypeId;
use std::collections::HashMap;

/// Transitions requested from state hooks chain at most this many times per call.
const MAX_CHAINED_TRANSITIONS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hook {
    Init,
    Enter,
    Update,
    Exit,
    Cleanup,
}

struct StateSlot {
    name: &'static str,
    type_id: TypeId,
    state: Box<dyn State>,
}

/// Navigation state machine: at most one current state.
///
/// States are built from an explicit factory table during `init`. The
/// configured starting state is entered on the first update after the view
/// batch has settled.
pub struct StateService {
    factories: Vec<StateFactory>,
    states: Vec<StateSlot>,
    by_name: HashMap<&'static str, usize>,
    current: Option<usize>,
    views: Option<ServiceHandle<ViewService>>,
    starting: Option<String>,
    initialized: bool,
    frame: Option<Frame>,
}

impl Default for StateService {
    #[inline]
    fn default() -> Self {
        Self::new(&[])
    }
}

impl StateService {
    pub fn new(factories: &[StateFactory]) -> Self {
        Self {
            factories: factories.to_vec(),
            states: Vec::new(),
            by_name: HashMap::new(),
            current: None,
            views: None,
            starting: None,
            initialized: false,
            frame: None,
        }
    }

    /// State entered once views are loaded. An empty name means none.
    pub fn with_starting_state(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.starting = (!name.is_empty()).then_some(name);
        self
    }

    /// Adds a state type. After `init` the state is built and initialized right away.
    pub fn add_state(&mut self, factory: StateFactory) {
        if self.initialized {
            self.build_slot(factory);
        } else {
            self.factories.push(factory);
        }
    }

    fn build_slot(&mut self, factory: StateFactory) {
        let name = factory.name();
        if self.by_name.contains_key(name)
            || self.states.iter().any(|s| s.type_id == factory.type_id())
        {
            error!(
                target: "states",
                "{}",
                EngineError::already_exists(RegistryKind::State, name)
            );
            return;
        }

        let idx = self.states.len();
        self.states.push(StateSlot {
            name,
            type_id: factory.type_id(),
            state: factory.build(),
        });
        self.by_name.insert(name, idx);

        if let Ok(Some(req)) = self.call(idx, Hook::Init) {
            warn!(target: "states", "{name} requested '{req}' during init; ignored");
        }
    }

    fn lookup(&self, name: &str) -> EngineResult<usize> {
        match self.by_name.get(name) {
            Some(&idx) => Ok(idx),
            None => {
                let e = EngineError::not_found(RegistryKind::State, name);
                error!(target: "states", "{e}");
                Err(e)
            }
        }
    }

    /// Enters `name` without exiting anything. Only valid with no current state.
    pub fn set_starting_state(&mut self, name: &str) -> EngineResult<()> {
        if let Some(cur) = self.current {
            warn!(
                target: "states",
                "starting state '{name}' ignored, already in {}",
                self.states[cur].name
            );
            return Ok(());
        }
        let idx = self.lookup(name)?;
        self.starting = None;
        self.transition(idx)
    }

    /// Exits the current state and enters `T`. Re-entering the current type
    /// runs exit then enter again.
    pub fn change_state<T: State>(&mut self) -> EngineResult<()> {
        self.change_state_named(short_type_name::<T>())
    }

    pub fn change_state_named(&mut self, name: &str) -> EngineResult<()> {
        let idx = self.lookup(name)?;
        self.transition(idx)
    }

    fn transition(&mut self, target: usize) -> EngineResult<()> {
        let mut next = Some(target);
        let mut hops = 0;

        while let Some(target) = next.take() {
            hops += 1;
            if hops > MAX_CHAINED_TRANSITIONS {
                error!(
                    target: "states",
                    "more than {MAX_CHAINED_TRANSITIONS} chained transitions; stopped at {}",
                    self.states[target].name
                );
                break;
            }

            let mut request = None;
            if let Some(cur) = self.current {
                request = self.call(cur, Hook::Exit)?;
            }

            let from = self.current.map_or("<none>", |i| self.states[i].name);
            info!(target: "states", "{from} -> {}", self.states[target].name);
            self.current = Some(target);

            if let Some(r) = self.call(target, Hook::Enter)? {
                request = Some(r);
            }

            next = match request {
                Some(name) => self.lookup(&name).ok(),
                None => None,
            };
        }
        Ok(())
    }

    /// Runs `update` on the current state. No-op without one.
    pub fn update_current(&mut self) -> EngineResult<()> {
        let Some(cur) = self.current else {
            return Ok(());
        };
        match self.call(cur, Hook::Update)? {
            Some(name) => match self.lookup(&name) {
                Ok(idx) => self.transition(idx),
                Err(_) => Ok(()),
            },
            None => Ok(()),
        }
    }

    /// Runs one hook, logging failures. Returns the transition it requested.
    fn call(&mut self, idx: usize, hook: Hook) -> EngineResult<Option<String>> {
        let mut request = None;
        let views = self.views.clone();
        let mut guard = match views.as_ref().map(|v| v.try_borrow_mut()) {
            Some(Ok(g)) => Some(g),
            Some(Err(_)) => {
                warn!(target: "states", "view service is busy during {hook:?}");
                None
            }
            None => None,
        };

        let slot = &mut self.states[idx];
        let result = {
            let mut ctx = StateCtx::new(guard.as_deref_mut(), &mut request, self.frame);
            match hook {
                Hook::Init => slot.state.init(&mut ctx),
                Hook::Enter => slot.state.enter(&mut ctx),
                Hook::Update => slot.state.update(&mut ctx),
                Hook::Exit => slot.state.exit(&mut ctx),
                Hook::Cleanup => slot.state.cleanup(&mut ctx),
            }
        };
        drop(guard);

        match result {
            Ok(()) => Ok(request),
            Err(EngineError::ExitRequested) => Err(EngineError::ExitRequested),
            Err(e) => {
                error!(target: "states", "state '{}' {hook:?}: {e}", slot.name);
                Ok(request)
            }
        }
    }

    pub fn current_state_name(&self) -> Option<&'static str> {
        self.current.map(|i| self.states[i].name)
    }

    pub fn is_current<T: State>(&self) -> bool {
        self.current
            .is_some_and(|i| self.states[i].type_id == TypeId::of::<T>())
    }

    /// State names in registration order.
    pub fn state_names(&self) -> Vec<&'static str> {
        self.states.iter().map(|s| s.name).collect()
    }

    pub fn state<T: State>(&self) -> Option<&T> {
        self.states
            .iter()
            .find(|s| s.type_id == TypeId::of::<T>())
            .and_then(|s| s.state.as_ref().as_any().downcast_ref::<T>())
    }

    pub fn state_mut<T: State>(&mut self) -> Option<&mut T> {
        self.states
            .iter_mut()
            .find(|s| s.type_id == TypeId::of::<T>())
            .and_then(|s| s.state.as_mut().as_any_mut().downcast_mut::<T>())
    }

    #[inline]
    pub fn starting_state(&self) -> Option<&str> {
        self.starting.as_deref()
    }

    fn views_settled(&self) -> bool {
        match &self.views {
            Some(v) => v.try_borrow().map_or(false, |v| v.is_settled()),
            None => true,
        }
    }
}

impl Service for StateService {
    fn init(&mut self, ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
        self.views = ctx.try_get::<ViewService>();
        if self.views.is_none() {
            debug!(target: "states", "no ViewService registered; states run without views");
        }

        for factory in std::mem::take(&mut self.factories) {
            self.build_slot(factory);
        }
        self.initialized = true;
        info!(target: "states", "initialized {} states", self.states.len());
        Ok(())
    }

    fn update(&mut self, ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
        self.frame = ctx.frame().copied();

        if self.starting.is_some() && self.views_settled() {
            if let Some(name) = self.starting.take() {
                if self.current.is_none() {
                    // Unknown names are logged by lookup.
                    let _ = self.set_starting_state(&name);
                }
            }
        }

        self.update_current()
    }

    fn cleanup(&mut self, _ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
        for idx in 0..self.states.len() {
            let _ = self.call(idx, Hook::Cleanup);
        }
        self.current = None;
        Ok(())
    }
}
