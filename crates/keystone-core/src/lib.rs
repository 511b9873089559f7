#![forbid(unsafe_op_in_unsafe_fn)]

pub mod assets;
pub mod bus;
pub mod engine;
pub mod error;
pub mod frame;
pub mod registry;
pub mod service;
pub mod startup;
pub mod sync;

pub use assets::{AssetCallback, AssetService, BatchCallback};
pub use bus::Bus;
pub use engine::{Engine, EngineConfig};
pub use error::{EngineError, EngineResult, RegistryKind, ServiceStage};
pub use frame::Frame;
pub use registry::ServiceRegistry;
pub use service::{
    short_type_name, Continuation, Service, ServiceCtx, ServiceFactory, ServiceHandle,
};
pub use startup::{ConfigPaths, StartupConfig, StartupLoadReport, StartupLoader, StartupOverrides};
pub use sync::ShutdownToken;

pub use keystone_assets as asset;
