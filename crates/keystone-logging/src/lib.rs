use env_logger::{Builder, WriteStyle};
use keystone_core::{EngineError, EngineResult, Service, ServiceCtx, StartupConfig};
use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

static INSTALLED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone)]
pub struct ConsoleLoggerConfig {
    pub level: LevelFilter,
    pub colors: bool,
    pub include_module: bool,
}

impl ConsoleLoggerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let level = get("KEYSTONE_LOG")
            .and_then(|v| v.parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::Info);
        let colors = get("KEYSTONE_LOG_COLORS").map(|v| v != "0").unwrap_or(true);
        let include_module = get("KEYSTONE_LOG_MODULE")
            .map(|v| v != "0")
            .unwrap_or(true);

        Self {
            level,
            colors,
            include_module,
        }
    }

    /// Level and colors from the resolved startup config. Env overrides were
    /// already applied by the startup loader.
    pub fn from_startup(cfg: &StartupConfig) -> Self {
        let mut out = Self::from_env();
        match cfg.log_level.parse::<LevelFilter>() {
            Ok(level) => out.level = level,
            Err(_) => eprintln!("unknown log level '{}', using {}", cfg.log_level, out.level),
        }
        out.colors = cfg.log_colors;
        out
    }
}

impl Default for ConsoleLoggerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Owned copy of one log record, handed to sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: log::Level,
    pub target: String,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl LogEntry {
    pub fn from_record(record: &Record<'_>) -> Self {
        Self {
            level: record.level(),
            target: record.target().to_owned(),
            message: record.args().to_string(),
            file: record.file().map(str::to_owned),
            line: record.line(),
        }
    }

    /// `file:line` when the record carried a location.
    pub fn location(&self) -> Option<String> {
        match (&self.file, self.line) {
            (Some(f), Some(l)) => Some(format!("{f}:{l}")),
            (Some(f), None) => Some(f.clone()),
            _ => None,
        }
    }
}

/// Receives every record that passes the console filter.
pub trait LogSink: Send + Sync {
    fn record(&self, entry: &LogEntry);
}

/// Forwards records to the console logger and every sink.
struct TeeLogger {
    console: env_logger::Logger,
    sinks: Mutex<Vec<Arc<dyn LogSink>>>,
}

impl Log for TeeLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.console.enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if !self.console.matches(record) {
            return;
        }
        self.console.log(record);

        let sinks = self.sinks.lock();
        if sinks.is_empty() {
            return;
        }
        let entry = LogEntry::from_record(record);
        for s in sinks.iter() {
            s.record(&entry);
        }
    }

    fn flush(&self) {
        self.console.flush();
    }
}

fn build_console(config: &ConsoleLoggerConfig) -> env_logger::Logger {
    let mut builder = Builder::new();
    builder.filter_level(config.level);
    builder.write_style(if config.colors {
        WriteStyle::Auto
    } else {
        WriteStyle::Never
    });

    let include_module = config.include_module;
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        if include_module {
            writeln!(
                buf,
                "[{style}{:<5}{style:#}] {:<25} {}",
                record.level(),
                record.target(),
                record.args()
            )
        } else {
            writeln!(buf, "[{style}{:<5}{style:#}] {}", record.level(), record.args())
        }
    });

    builder.build()
}

/// Installs the process logger. Fails if a logger is already installed.
pub fn install(config: &ConsoleLoggerConfig, sinks: Vec<Arc<dyn LogSink>>) -> EngineResult<()> {
    let console = build_console(config);
    let max = console.filter();
    let tee = TeeLogger {
        console,
        sinks: Mutex::new(sinks),
    };

    log::set_boxed_logger(Box::new(tee))
        .map_err(|e| EngineError::Other(format!("logger init failed: {e}")))?;
    log::set_max_level(max);
    INSTALLED.store(true, Ordering::Release);
    Ok(())
}

#[inline]
pub fn is_installed() -> bool {
    INSTALLED.load(Ordering::Acquire)
}

/// Service front-end of [`install`]: installs the logger during `init`.
///
/// Register it first so later services log through it.
pub struct ConsoleLoggerService {
    config: ConsoleLoggerConfig,
    sinks: Vec<Arc<dyn LogSink>>,
    initialized: bool,
}

impl ConsoleLoggerService {
    #[inline]
    pub fn new(config: ConsoleLoggerConfig) -> Self {
        Self {
            config,
            sinks: Vec::new(),
            initialized: false,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Default for ConsoleLoggerService {
    fn default() -> Self {
        Self::new(ConsoleLoggerConfig::default())
    }
}

impl Service for ConsoleLoggerService {
    fn init(&mut self, _ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
        if self.initialized {
            return Ok(());
        }
        if is_installed() {
            log::debug!(target: "logging", "logger already installed");
            self.initialized = true;
            return Ok(());
        }

        install(&self.config, std::mem::take(&mut self.sinks))?;
        self.initialized = true;
        Ok(())
    }
}
