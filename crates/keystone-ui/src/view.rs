use crate::animator::ViewAnimator;
use crate::any::AsAny;
use crate::prefab::ViewPrefab;

use log::{debug, warn};
use std::any::Any;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewState {
    Uninitialized,
    Closed,
    Opening,
    Open,
    Closing,
}

impl ViewState {
    #[inline]
    pub fn is_open_or_opening(self) -> bool {
        matches!(self, ViewState::Opening | ViewState::Open)
    }

    #[inline]
    pub fn is_closed_or_closing(self) -> bool {
        matches!(self, ViewState::Closing | ViewState::Closed)
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            ViewState::Uninitialized => "uninitialized",
            ViewState::Closed => "closed",
            ViewState::Opening => "opening",
            ViewState::Open => "open",
            ViewState::Closing => "closing",
        }
    }
}

/// Per-type behaviour of a view. All hooks default to no-ops.
pub trait ViewBehaviour: AsAny + 'static {
    /// Receives the prefab right after construction, before `on_init`.
    fn configure(&mut self, _prefab: &ViewPrefab) {}

    fn on_init(&mut self) {}
    fn on_open_started(&mut self) {}
    fn on_open_complete(&mut self) {}
    fn on_close_started(&mut self) {}
    fn on_close_complete(&mut self) {}
    fn on_cleanup(&mut self) {}

    /// One-line summary shown by the developer console.
    fn describe(&self) -> Option<String> {
        None
    }
}

/// One UI overlay with an animated open/close lifecycle.
///
/// Open and close completion are detected by `poll`, called once per tick;
/// only the predicate of the transition currently in flight is checked.
pub struct View {
    name: String,
    type_name: &'static str,
    state: ViewState,
    active: bool,
    order: u64,
    animator: ViewAnimator,
    behaviour: Box<dyn ViewBehaviour>,
}

impl View {
    pub fn new(
        name: impl Into<String>,
        type_name: &'static str,
        animator: ViewAnimator,
        behaviour: Box<dyn ViewBehaviour>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name,
            state: ViewState::Uninitialized,
            active: false,
            order: 0,
            animator,
            behaviour,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn state(&self) -> ViewState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Draw order; higher is in front.
    #[inline]
    pub fn order(&self) -> u64 {
        self.order
    }

    #[inline]
    pub fn is_open_or_opening(&self) -> bool {
        self.state.is_open_or_opening()
    }

    #[inline]
    pub fn is_closed_or_closing(&self) -> bool {
        self.state.is_closed_or_closing()
    }

    #[inline]
    pub fn animator(&self) -> &ViewAnimator {
        &self.animator
    }

    #[inline]
    pub fn behaviour(&self) -> &dyn ViewBehaviour {
        self.behaviour.as_ref()
    }

    #[inline]
    pub fn behaviour_mut(&mut self) -> &mut dyn ViewBehaviour {
        self.behaviour.as_mut()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.behaviour.as_ref().as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.behaviour.as_mut().as_any_mut().downcast_mut::<T>()
    }

    /// Uninitialized -> Closed, inactive.
    pub fn init(&mut self) {
        self.active = false;
        self.state = ViewState::Closed;
        self.behaviour.on_init();
    }

    /// Starts opening at draw position `order`. Returns whether a transition started.
    pub fn open(&mut self, order: u64) -> bool {
        if self.state == ViewState::Uninitialized {
            warn!(target: "views", "{} opened before init; ignored", self.name);
            return false;
        }
        if self.is_open_or_opening() {
            debug!(target: "views", "{} is already {}", self.name, self.state.as_str());
            return false;
        }

        self.order = order;
        self.active = true;
        self.animator.transition_in();
        self.state = ViewState::Opening;
        self.behaviour.on_open_started();
        true
    }

    /// Starts closing. Returns whether a transition started.
    pub fn close(&mut self) -> bool {
        if self.state == ViewState::Uninitialized {
            warn!(target: "views", "{} closed before init; ignored", self.name);
            return false;
        }
        if self.is_closed_or_closing() {
            debug!(target: "views", "{} is already {}", self.name, self.state.as_str());
            return false;
        }

        self.animator.transition_out();
        self.state = ViewState::Closing;
        self.behaviour.on_close_started();
        true
    }

    /// Advances the animator and completes the pending transition once its
    /// idle state is reached. Returns whether a transition completed.
    pub fn poll(&mut self, dt: f32) -> bool {
        self.animator.tick(dt);
        match self.state {
            ViewState::Opening if self.animator.is_in_open_idle() => {
                self.state = ViewState::Open;
                self.behaviour.on_open_complete();
                true
            }
            ViewState::Closing if self.animator.is_in_closed_idle() => {
                self.active = false;
                self.state = ViewState::Closed;
                self.behaviour.on_close_complete();
                true
            }
            _ => false,
        }
    }

    pub fn cleanup(&mut self) {
        self.behaviour.on_cleanup();
        self.state = ViewState::Uninitialized;
    }
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("state", &self.state)
            .field("active", &self.active)
            .field("order", &self.order)
            .finish()
    }
}
