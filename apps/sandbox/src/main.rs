mod screens;

use anyhow::Context;
use crossbeam_channel::Sender;
use log::info;

use keystone_console::{DeveloperConsoleService, LogBuffer};
use keystone_core::{
    AssetService, ConfigPaths, Engine, EngineConfig, EngineResult, Service, ServiceCtx,
    StartupLoader,
};
use keystone_logging::{ConsoleLoggerConfig, LogSink};
use keystone_ui::{StateService, ViewService};

use screens::{HudView, MainMenuView, SettingsView};

use std::io::BufRead;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let (cfg, report) = StartupLoader::load_json(&ConfigPaths::default())?;

    let logs = LogBuffer::new(cfg.console_max_logs);
    let sink: Arc<dyn LogSink> = Arc::new(logs.clone());
    keystone_logging::install(&ConsoleLoggerConfig::from_startup(&cfg), vec![sink])?;
    report.log();

    let mut engine = Engine::new(EngineConfig::from(&cfg));

    let shutdown = engine.shutdown_token();
    ctrlc::set_handler(move || shutdown.request()).context("installing ctrl-c handler")?;

    engine.register(AssetService::from_config(&cfg))?;
    engine.register(
        ViewService::new(cfg.view_label.clone())
            .with_view_type::<MainMenuView>()
            .with_view_type::<SettingsView>()
            .with_view_type::<HudView>(),
    )?;
    engine.register(
        StateService::new(&screens::states())
            .with_starting_state(cfg.starting_state().unwrap_or("MainMenuState")),
    )?;
    let console = engine.register(DeveloperConsoleService::from_config(&cfg, logs))?;
    engine.register(ConsoleEcho::default())?;

    if console.borrow().is_enabled() {
        spawn_stdin_reader(console.borrow().bus().sender()).context("starting stdin reader")?;
        info!(target: "sandbox", "developer console ready; type `help`");
    }

    engine.run()?;
    Ok(())
}

fn spawn_stdin_reader(tx: Sender<String>) -> std::io::Result<()> {
    std::thread::Builder::new()
        .name("console-stdin".to_owned())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(())
}

/// Prints console output to stdout, plus the overlay while it is open.
#[derive(Default)]
struct ConsoleEcho {
    seen: u64,
}

impl Service for ConsoleEcho {
    fn update(&mut self, ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
        let Some(console) = ctx.try_get::<DeveloperConsoleService>() else {
            return Ok(());
        };
        let console = console.borrow();

        let written = console.console().lines_written();
        if written == self.seen {
            return Ok(());
        }
        for line in console.console().output_since(self.seen) {
            println!("{line}");
        }
        self.seen = written;

        if console.console().is_open() {
            println!("{}", console.render());
        }
        Ok(())
    }
}
