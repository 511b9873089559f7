#![forbid(unsafe_op_in_unsafe_fn)]

pub mod animator;
pub mod layout;
pub mod prefab;
pub mod state;
pub mod state_service;
pub mod text;
pub mod view;
pub mod view_service;

mod any;

pub use animator::{
    Animator, AnimatorConfig, AnimatorProvider, TimedAnimator, TimedAnimatorProvider, ViewAnimator,
};
pub use any::AsAny;
pub use prefab::ViewPrefab;
pub use state::{State, StateCtx, StateFactory};
pub use state_service::StateService;
pub use text::split_camel_case;
pub use view::{View, ViewBehaviour, ViewState};
pub use view_service::ViewService;
