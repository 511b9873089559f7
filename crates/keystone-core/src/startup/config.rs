use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub startup: Option<PathBuf>,
    pub root_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    #[inline]
    fn default() -> Self {
        Self {
            startup: Some(PathBuf::from("config.json")),
            root_dir: None,
        }
    }
}

impl ConfigPaths {
    #[inline]
    pub fn new<P>(startup: P, root_dir: Option<PathBuf>) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            startup: Some(startup.into()),
            root_dir,
        }
    }

    /// No startup file: defaults, env and programmatic layers only.
    #[inline]
    pub fn none() -> Self {
        Self {
            startup: None,
            root_dir: None,
        }
    }

    #[inline]
    pub fn from_startup_str(startup: &str) -> Self {
        Self::new(startup, None)
    }

    #[inline]
    pub fn with_root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(root_dir.into());
        self
    }

    #[inline]
    pub fn startup_path(&self) -> Option<&Path> {
        self.startup.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum StartupConfigSource {
    #[default]
    Defaults,
    File {
        path: PathBuf,
    },
    Mixed,
}

/// Normalized startup configuration.
/// All fields have concrete defaults (no Option).
#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub source: StartupConfigSource,

    pub log_level: String,
    pub log_colors: bool,

    pub target_fps: u32,
    pub max_dt_ms: u32,
    /// `0` = run until exit is requested.
    pub max_frames: u64,

    pub assets_root: PathBuf,
    pub asset_pump_steps: u32,
    /// Catalog path relative to `assets_root`.
    pub asset_catalog: PathBuf,

    /// Asset label the view service loads its prefabs from.
    pub view_label: String,
    /// Empty = no starting state.
    pub starting_state: String,

    pub console_enabled: bool,
    pub console_max_logs: usize,

    pub extra: HashMap<String, String>,
}

impl Default for StartupConfig {
    #[inline]
    fn default() -> Self {
        Self {
            source: StartupConfigSource::Defaults,

            log_level: "info".to_owned(),
            log_colors: true,

            target_fps: 60,
            max_dt_ms: 250,
            max_frames: 0,

            assets_root: PathBuf::from("assets"),
            asset_pump_steps: 8,
            asset_catalog: PathBuf::from("catalog.json"),

            view_label: "views".to_owned(),
            starting_state: String::new(),

            console_enabled: true,
            console_max_logs: 512,

            extra: HashMap::new(),
        }
    }
}

impl StartupConfig {
    #[inline]
    pub fn starting_state(&self) -> Option<&str> {
        let s = self.starting_state.trim();
        (!s.is_empty()).then_some(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupOverrideSource {
    File,
    Env,
    Programmatic,
}

#[derive(Debug, Clone)]
pub struct StartupOverride {
    pub key: &'static str,
    pub source: StartupOverrideSource,
    pub from: String,
    pub to: String,
}

/// Optional values layered over the file (env and programmatic layers).
#[derive(Debug, Clone, Default)]
pub struct StartupOverrides {
    pub log_level: Option<String>,
    pub log_colors: Option<bool>,
    pub target_fps: Option<u32>,
    pub max_frames: Option<u64>,
    pub assets_root: Option<PathBuf>,
    pub starting_state: Option<String>,
    pub console_enabled: Option<bool>,
}

impl StartupOverrides {
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Reads `KEYSTONE_LOG`, `KEYSTONE_LOG_COLORS`, `KEYSTONE_ASSETS_ROOT`,
    /// `KEYSTONE_START_STATE` and `KEYSTONE_MAX_FRAMES`.
    #[inline]
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |k: &str| lookup(k).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        Self {
            log_level: non_empty("KEYSTONE_LOG"),
            log_colors: non_empty("KEYSTONE_LOG_COLORS").map(|v| v != "0"),
            target_fps: None,
            max_frames: non_empty("KEYSTONE_MAX_FRAMES").and_then(|v| v.parse().ok()),
            assets_root: non_empty("KEYSTONE_ASSETS_ROOT").map(PathBuf::from),
            starting_state: non_empty("KEYSTONE_START_STATE"),
            console_enabled: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum StartupResolvedFrom {
    /// Path was absolute and existed.
    Absolute,
    /// Found as `cwd/<file>`.
    Cwd,
    /// Found as `exe_dir/<file>`.
    ExeDir,
    /// Found as `root_dir/<file>`.
    RootDir,
    /// No file path was provided, or the file does not exist.
    #[default]
    NotProvided,
}

#[derive(Debug, Clone)]
pub struct StartupLoadReport {
    pub source: StartupConfigSource,
    /// The actual file used (absolute when found).
    pub file: Option<PathBuf>,
    /// Where the file was resolved from.
    pub resolved_from: StartupResolvedFrom,
    pub overrides: Vec<StartupOverride>,
}

impl StartupLoadReport {
    #[inline]
    pub fn has_overrides(&self) -> bool {
        !self.overrides.is_empty()
    }

    #[inline]
    pub fn is_defaults(&self) -> bool {
        matches!(self.source, StartupConfigSource::Defaults)
    }

    #[inline]
    pub fn used_file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Logs where the config came from and each applied override.
    pub fn log(&self) {
        match &self.file {
            Some(p) => log::info!(
                target: "startup",
                "config: {} ({:?})",
                p.display(),
                self.resolved_from
            ),
            None => log::info!(target: "startup", "config: defaults"),
        }
        for o in &self.overrides {
            log::debug!(
                target: "startup",
                "override {} [{:?}]: {} -> {}",
                o.key,
                o.source,
                o.from,
                o.to
            );
        }
    }
}
