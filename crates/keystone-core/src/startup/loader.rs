use crate::error::{EngineError, EngineResult};
use crate::startup::{
    ConfigPaths, StartupConfig, StartupConfigSource, StartupLoadReport, StartupOverride,
    StartupOverrideSource, StartupOverrides, StartupResolvedFrom,
};

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

pub struct StartupLoader;

impl StartupLoader {
    /// Loads startup config with layering:
    /// defaults -> file -> env -> programmatic.
    pub fn load_json(paths: &ConfigPaths) -> EngineResult<(StartupConfig, StartupLoadReport)> {
        Self::load_json_with_overrides(
            paths,
            &StartupOverrides::from_env(),
            &StartupOverrides::empty(),
        )
    }

    /// Same as [`StartupLoader::load_json`] with explicit env and programmatic layers.
    pub fn load_json_with_overrides(
        paths: &ConfigPaths,
        env: &StartupOverrides,
        programmatic: &StartupOverrides,
    ) -> EngineResult<(StartupConfig, StartupLoadReport)> {
        let mut cfg = StartupConfig::default();

        let mut report = StartupLoadReport {
            source: StartupConfigSource::Defaults,
            file: None,
            resolved_from: StartupResolvedFrom::NotProvided,
            overrides: Vec::new(),
        };

        // File layer (optional)
        if let Some(raw_path) = paths.startup_path() {
            if let Some((resolved, from)) = resolve_startup_file_optional(paths, raw_path) {
                let data = fs::read_to_string(&resolved).map_err(|e| {
                    EngineError::Other(format!(
                        "startup config read failed: path={:?} err={}",
                        resolved, e
                    ))
                })?;

                let parsed: RootJson = serde_json::from_str(&data).map_err(|e| {
                    EngineError::Other(format!(
                        "startup config parse failed (json): path={:?} err={}",
                        resolved, e
                    ))
                })?;

                apply_root(&mut cfg, &mut report, parsed);

                cfg.source = StartupConfigSource::File {
                    path: resolved.clone(),
                };
                report.source = cfg.source.clone();
                report.file = Some(resolved);
                report.resolved_from = from;
            }
        }

        apply_overrides(&mut cfg, &mut report, StartupOverrideSource::Env, env);
        apply_overrides(
            &mut cfg,
            &mut report,
            StartupOverrideSource::Programmatic,
            programmatic,
        );

        let mixed = report.overrides.iter().any(|o| {
            o.source == StartupOverrideSource::Env || o.source == StartupOverrideSource::Programmatic
        });
        if mixed {
            cfg.source = StartupConfigSource::Mixed;
            report.source = StartupConfigSource::Mixed;
        }

        Ok((cfg, report))
    }
}

#[derive(Deserialize)]
struct RootJson {
    logging: Option<LoggingJson>,
    engine: Option<EngineJson>,
    assets: Option<AssetsJson>,
    views: Option<ViewsJson>,
    console: Option<ConsoleJson>,
    extra: Option<HashMap<String, String>>,
}

#[derive(Deserialize)]
struct LoggingJson {
    level: Option<String>,
    colors: Option<bool>,
}

#[derive(Deserialize)]
struct EngineJson {
    target_fps: Option<u32>,
    max_dt_ms: Option<u32>,
    max_frames: Option<u64>,
}

#[derive(Deserialize)]
struct AssetsJson {
    root: Option<String>,
    pump_steps: Option<u32>,
    catalog: Option<String>,
}

#[derive(Deserialize)]
struct ViewsJson {
    label: Option<String>,
    starting_state: Option<String>,
}

#[derive(Deserialize)]
struct ConsoleJson {
    enabled: Option<bool>,
    max_logs: Option<usize>,
}

fn apply_root(cfg: &mut StartupConfig, report: &mut StartupLoadReport, root: RootJson) {
    let src = StartupOverrideSource::File;

    if let Some(l) = root.logging {
        if let Some(v) = l.level {
            apply_value(report, src, "log_level", &mut cfg.log_level, v);
        }
        if let Some(v) = l.colors {
            apply_value(report, src, "log_colors", &mut cfg.log_colors, v);
        }
    }

    if let Some(e) = root.engine {
        if let Some(v) = e.target_fps {
            apply_value(report, src, "target_fps", &mut cfg.target_fps, v);
        }
        if let Some(v) = e.max_dt_ms {
            apply_value(report, src, "max_dt_ms", &mut cfg.max_dt_ms, v.max(1));
        }
        if let Some(v) = e.max_frames {
            apply_value(report, src, "max_frames", &mut cfg.max_frames, v);
        }
    }

    if let Some(a) = root.assets {
        if let Some(v) = a.root {
            apply_path(report, src, "assets_root", &mut cfg.assets_root, PathBuf::from(v));
        }
        if let Some(v) = a.pump_steps {
            apply_value(report, src, "asset_pump_steps", &mut cfg.asset_pump_steps, v.max(1));
        }
        if let Some(v) = a.catalog {
            apply_path(report, src, "asset_catalog", &mut cfg.asset_catalog, PathBuf::from(v));
        }
    }

    if let Some(v) = root.views {
        if let Some(x) = v.label {
            apply_value(report, src, "view_label", &mut cfg.view_label, x);
        }
        if let Some(x) = v.starting_state {
            apply_value(report, src, "starting_state", &mut cfg.starting_state, x);
        }
    }

    if let Some(c) = root.console {
        if let Some(v) = c.enabled {
            apply_value(report, src, "console_enabled", &mut cfg.console_enabled, v);
        }
        if let Some(v) = c.max_logs {
            apply_value(report, src, "console_max_logs", &mut cfg.console_max_logs, v);
        }
    }

    if let Some(extra) = root.extra {
        let mut keys: Vec<_> = extra.into_iter().collect();
        keys.sort();
        for (k, v) in keys {
            apply_extra(report, src, &mut cfg.extra, k, v);
        }
    }
}

fn apply_overrides(
    cfg: &mut StartupConfig,
    report: &mut StartupLoadReport,
    source: StartupOverrideSource,
    o: &StartupOverrides,
) {
    if let Some(v) = o.log_level.clone() {
        apply_value(report, source, "log_level", &mut cfg.log_level, v);
    }
    if let Some(v) = o.log_colors {
        apply_value(report, source, "log_colors", &mut cfg.log_colors, v);
    }
    if let Some(v) = o.target_fps {
        apply_value(report, source, "target_fps", &mut cfg.target_fps, v);
    }
    if let Some(v) = o.max_frames {
        apply_value(report, source, "max_frames", &mut cfg.max_frames, v);
    }
    if let Some(v) = o.assets_root.clone() {
        apply_path(report, source, "assets_root", &mut cfg.assets_root, v);
    }
    if let Some(v) = o.starting_state.clone() {
        apply_value(report, source, "starting_state", &mut cfg.starting_state, v);
    }
    if let Some(v) = o.console_enabled {
        apply_value(report, source, "console_enabled", &mut cfg.console_enabled, v);
    }
}

fn apply_value<T: PartialEq + Display>(
    report: &mut StartupLoadReport,
    source: StartupOverrideSource,
    key: &'static str,
    slot: &mut T,
    to: T,
) {
    if *slot == to {
        return;
    }
    let from = slot.to_string();
    let to_s = to.to_string();
    *slot = to;
    report.overrides.push(StartupOverride {
        key,
        source,
        from,
        to: to_s,
    });
}

fn apply_path(
    report: &mut StartupLoadReport,
    source: StartupOverrideSource,
    key: &'static str,
    slot: &mut PathBuf,
    to: PathBuf,
) {
    if *slot == to {
        return;
    }
    let from = slot.to_string_lossy().into_owned();
    let to_s = to.to_string_lossy().into_owned();
    *slot = to;
    report.overrides.push(StartupOverride {
        key,
        source,
        from,
        to: to_s,
    });
}

fn apply_extra(
    report: &mut StartupLoadReport,
    source: StartupOverrideSource,
    slot: &mut HashMap<String, String>,
    k: String,
    v: String,
) {
    let from_v = slot.get(&k).cloned().unwrap_or_else(|| "<unset>".to_owned());
    if from_v == v {
        return;
    }
    slot.insert(k.clone(), v.clone());
    report.overrides.push(StartupOverride {
        key: "extra",
        source,
        from: format!("{}={}", k, from_v),
        to: format!("{}={}", k, v),
    });
}

fn resolve_startup_file_optional(
    paths: &ConfigPaths,
    raw: &Path,
) -> Option<(PathBuf, StartupResolvedFrom)> {
    if raw.is_absolute() {
        return raw
            .is_file()
            .then(|| (raw.to_path_buf(), StartupResolvedFrom::Absolute));
    }

    if let Ok(cwd) = std::env::current_dir() {
        let p = cwd.join(raw);
        if p.is_file() {
            return Some((p, StartupResolvedFrom::Cwd));
        }
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join(raw);
            if p.is_file() {
                return Some((p, StartupResolvedFrom::ExeDir));
            }
        }
    }

    if let Some(root) = paths.root_dir.as_deref() {
        let p = root.join(raw);
        if p.is_file() {
            return Some((p, StartupResolvedFrom::RootDir));
        }
    }

    None
}
