use crate::commands::{CommandCtx, CommandSet};
use crate::console::{DeveloperConsole, Tab};
use crate::log_buffer::{LogBuffer, LogKind};
use crate::options::{OptionData, OptionError, OptionId, OptionsTab, DEFAULT_CATEGORY};

use keystone_core::{Bus, EngineResult, Service, ServiceCtx, ServiceRegistry, StartupConfig};
use log::{debug, info, warn};

/// Lines of captured logs shown by the console tab.
const RENDER_LOG_LINES: usize = 20;

/// In-process developer console.
///
/// Command lines arrive on [`bus`](Self::bus) from any thread and run during
/// `update`. Captured logs come from the shared [`LogBuffer`], which must be
/// installed as a log sink by the host.
pub struct DeveloperConsoleService {
    enabled: bool,
    console: DeveloperConsole,
    options: OptionsTab,
    logs: LogBuffer,
    commands: CommandSet,
    input: Bus<String>,
    frame_option: Option<OptionId>,
    builtins: bool,
}

impl Default for DeveloperConsoleService {
    fn default() -> Self {
        Self::new(LogBuffer::default())
    }
}

impl DeveloperConsoleService {
    pub fn new(logs: LogBuffer) -> Self {
        Self {
            enabled: true,
            console: DeveloperConsole::default(),
            options: OptionsTab::new(),
            logs,
            commands: CommandSet::new(),
            input: Bus::unbounded(),
            frame_option: None,
            builtins: false,
        }
    }

    pub fn from_config(cfg: &StartupConfig, logs: LogBuffer) -> Self {
        logs.set_max_len(cfg.console_max_logs);
        let mut out = Self::new(logs);
        out.enabled = cfg.console_enabled;
        out
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Command input. Clone its sender into producer threads.
    #[inline]
    pub fn bus(&self) -> &Bus<String> {
        &self.input
    }

    #[inline]
    pub fn logs(&self) -> &LogBuffer {
        &self.logs
    }

    #[inline]
    pub fn console(&self) -> &DeveloperConsole {
        &self.console
    }

    #[inline]
    pub fn console_mut(&mut self) -> &mut DeveloperConsole {
        &mut self.console
    }

    #[inline]
    pub fn options(&self) -> &OptionsTab {
        &self.options
    }

    #[inline]
    pub fn options_mut(&mut self) -> &mut OptionsTab {
        &mut self.options
    }

    #[inline]
    pub fn commands(&self) -> &CommandSet {
        &self.commands
    }

    /// Adds an option under `category`, `Default` when `None`.
    pub fn add_option(&mut self, data: OptionData, category: Option<&str>) -> OptionId {
        self.options.add_option(category.unwrap_or(DEFAULT_CATEGORY), data)
    }

    pub fn remove_option(&mut self, id: OptionId) -> Result<OptionData, OptionError> {
        let removed = self.options.remove_option(id);
        if let Err(e) = &removed {
            warn!(target: "console", "{e}");
        }
        removed
    }

    /// Runs one command line and records it in the history and output.
    pub fn execute(&mut self, services: &ServiceRegistry, line: &str) -> Result<String, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(String::new());
        }

        self.console.record_command(line);
        self.console.push_output(&format!("> {line}"));

        let mut ctx = CommandCtx {
            services,
            logs: &self.logs,
            options: &mut self.options,
            console: &mut self.console,
        };
        let result = self.commands.exec(&mut ctx, line);

        match &result {
            Ok(out) => {
                debug!(target: "console", "{line}");
                self.console.push_output(out);
            }
            Err(e) => {
                info!(target: "console", "'{line}' failed: {e}");
                self.console.push_output(&format!("error: {e}"));
            }
        }
        result
    }

    fn register_builtins(&mut self, services: &ServiceRegistry) {
        if self.builtins {
            return;
        }
        self.builtins = true;

        self.options.add_option(
            DEFAULT_CATEGORY,
            OptionData::text("Version", env!("CARGO_PKG_VERSION")),
        );

        self.frame_option = Some(self.options.add_option("Engine", OptionData::text("Frame", "-")));
        let shutdown = services.shutdown_token();
        self.options.add_option("Engine", OptionData::action("Quit", move || shutdown.request()));

        let logs = self.logs.clone();
        self.options.add_option(
            "Console",
            OptionData::toggle("Pin log counts", logs.is_pinned(), move |v| {
                logs.set_pinned(v)
            }),
        );
        for (label, kind) in [
            ("Show logs", LogKind::Log),
            ("Show warnings", LogKind::Warning),
            ("Show errors", LogKind::Error),
        ] {
            let logs = self.logs.clone();
            self.options.add_option(
                "Console",
                OptionData::toggle(label, logs.is_visible(kind), move |v| {
                    logs.set_visible(kind, v)
                }),
            );
        }
        let logs = self.logs.clone();
        self.options.add_option("Console", OptionData::action("Clear logs", move || logs.clear()));
    }

    /// Text rendering of the overlay. Closed and unpinned renders as empty.
    pub fn render(&self) -> String {
        let counts = self.logs.counts();
        let counts_line = format!(
            "[logs {} | warnings {} | errors {}]",
            counts.logs, counts.warnings, counts.errors
        );

        let Some(tab) = self.console.selected_tab() else {
            return if self.logs.is_pinned() {
                counts_line
            } else {
                String::new()
            };
        };

        let mut out = String::from("== Developer Console ==\n");
        let tabs: Vec<String> = Tab::ALL
            .into_iter()
            .map(|t| {
                if t == tab {
                    format!("[{}]", t.name())
                } else {
                    format!(" {} ", t.name())
                }
            })
            .collect();
        out.push_str(&tabs.join(" "));
        out.push('\n');

        match tab {
            Tab::Console => {
                out.push_str(&counts_line);
                out.push('\n');
                for (i, e) in self.logs.tail(RENDER_LOG_LINES).iter().enumerate() {
                    out.push_str(&format!("{i:>3} [{}] {}\n", e.kind.as_str(), e.text));
                }
                if let Some(detail) = self.logs.selected_detail() {
                    out.push_str("-- selected --\n");
                    out.push_str(&detail);
                    out.push('\n');
                }
            }
            Tab::Options => out.push_str(&self.options.render()),
        }
        out
    }
}

impl Service for DeveloperConsoleService {
    fn init(&mut self, ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
        if !self.enabled {
            info!(target: "console", "developer console disabled");
            return Ok(());
        }
        self.register_builtins(ctx.services());
        debug!(
            target: "console",
            "{} commands, {} options",
            self.commands.names().len(),
            self.options.len()
        );
        Ok(())
    }

    fn update(&mut self, ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
        if !self.enabled {
            return Ok(());
        }

        let mut lines = Vec::new();
        self.input.drain_into(&mut lines);
        for line in lines {
            let _ = self.execute(ctx.services(), &line);
        }

        if let (Some(id), Some(frame)) = (self.frame_option, ctx.frame()) {
            let fps = if frame.dt > 0.0 { 1.0 / frame.dt } else { 0.0 };
            let text = format!("{} ({fps:.0} fps)", frame.frame_index);
            if self.options.set_text(id, text).is_err() {
                // Removed by the host.
                self.frame_option = None;
            }
        }
        Ok(())
    }

    fn cleanup(&mut self, _ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
        let mut pending = Vec::new();
        let dropped = self.input.drain_into(&mut pending);
        if dropped > 0 {
            debug!(target: "console", "dropped {dropped} pending commands");
        }
        self.console.close();
        Ok(())
    }
}
