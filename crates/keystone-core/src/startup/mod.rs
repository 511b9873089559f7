mod config;
mod loader;

pub use config::{
    ConfigPaths,
    StartupConfig,
    StartupConfigSource,
    StartupLoadReport,
    StartupOverride,
    StartupOverrideSource,
    StartupOverrides,
    StartupResolvedFrom,
};

pub use loader::StartupLoader;
