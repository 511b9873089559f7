use keystone_console::{
    ConsoleLog, DeveloperConsoleService, LogBuffer, LogKind, OptionData, Tab,
};
use keystone_core::{EngineResult, Frame, ServiceHandle, ServiceRegistry};
use keystone_ui::{
    AnimatorConfig, State, StateCtx, StateFactory, StateService, TimedAnimator, ViewAnimator,
    ViewBehaviour, ViewService, ViewState,
};

use std::cell::Cell;
use std::rc::Rc;

#[derive(Default)]
struct HudView;
impl ViewBehaviour for HudView {
    fn describe(&self) -> Option<String> {
        Some("score 0".into())
    }
}

#[derive(Default)]
struct PauseView;
impl ViewBehaviour for PauseView {}

#[derive(Default)]
struct PlayState;
impl State for PlayState {
    fn open_views(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        ctx.open_view::<HudView>().map(|_| ())
    }

    fn close_views(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        ctx.close_view::<HudView>().map(|_| ())
    }
}

#[derive(Default)]
struct PauseState;
impl State for PauseState {
    fn open_views(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        ctx.open_view::<PauseView>().map(|_| ())
    }

    fn close_views(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        ctx.close_view::<PauseView>().map(|_| ())
    }
}

struct Harness {
    registry: ServiceRegistry,
    views: ServiceHandle<ViewService>,
    states: ServiceHandle<StateService>,
    console: ServiceHandle<DeveloperConsoleService>,
    frame: Frame,
}

impl Harness {
    fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let cfg = AnimatorConfig::default();
        let instant = || {
            ViewAnimator::new(
                Box::new(TimedAnimator::for_view(&cfg, 0.0)),
                cfg.clone(),
            )
        };
        let mut views = ViewService::default();
        views.add_view("Hud", HudView, instant()).unwrap();
        views.add_view("Pause", PauseView, instant()).unwrap();

        let mut registry = ServiceRegistry::new();
        let views = registry.register(views).unwrap();
        let states = registry
            .register(
                StateService::new(&[
                    StateFactory::of::<PlayState>(),
                    StateFactory::of::<PauseState>(),
                ])
                .with_starting_state("PlayState"),
            )
            .unwrap();
        let console = registry
            .register(DeveloperConsoleService::new(LogBuffer::new(32)))
            .unwrap();
        registry.start().unwrap();

        let mut h = Self {
            registry,
            views,
            states,
            console,
            frame: Frame::first(0.02),
        };
        h.tick();
        h
    }

    fn tick(&mut self) {
        self.registry.update_all(&self.frame).unwrap();
        self.frame = self.frame.next(0.02);
    }

    fn run(&mut self, line: &str) -> Result<String, String> {
        self.console.borrow_mut().execute(&self.registry, line)
    }

    fn send(&self, line: &str) {
        self.console.borrow().bus().send(line.to_owned());
    }
}

#[test]
fn unknown_and_empty_lines() {
    let mut h = Harness::new();
    assert_eq!(h.run("   "), Ok(String::new()));
    assert_eq!(h.run("frobnicate now"), Err("unknown command: frobnicate".into()));
    assert_eq!(h.run("state"), Err("usage: state <name>".into()));
    assert_eq!(h.run("help state"), Ok("usage: state <name>".into()));
}

#[test]
fn help_lists_every_command() {
    let mut h = Harness::new();
    let help = h.run("help").unwrap();
    for name in h.console.borrow().commands().names() {
        assert!(help.contains(name), "{name} missing from help");
    }
    assert_eq!(
        h.console.borrow().commands().complete("st"),
        vec!["state".to_owned(), "states".to_owned()]
    );
}

#[test]
fn services_are_listed_with_spaced_names() {
    let mut h = Harness::new();
    let out = h.run("services").unwrap();
    assert_eq!(
        out.lines().collect::<Vec<_>>(),
        vec!["View Service", "State Service", "Developer Console Service"]
    );
}

#[test]
fn state_command_changes_state() {
    let mut h = Harness::new();
    assert_eq!(h.states.borrow().current_state_name(), Some("PlayState"));

    assert_eq!(h.run("state PauseState"), Ok("current state: PauseState".into()));
    assert_eq!(h.views.borrow().state_of::<PauseView>(), Some(ViewState::Opening));
    assert_eq!(h.views.borrow().state_of::<HudView>(), Some(ViewState::Closing));

    let listed = h.run("states").unwrap();
    assert_eq!(listed, "  PlayState\n* PauseState");

    assert!(h.run("state Missing").unwrap_err().contains("Missing"));
    assert_eq!(h.states.borrow().current_state_name(), Some("PauseState"));
}

#[test]
fn view_commands_open_and_close_by_type_name() {
    let mut h = Harness::new();
    h.tick();

    let listed = h.run("views").unwrap();
    assert!(listed.contains("HudView"));
    assert!(listed.contains("score 0"));

    assert_eq!(h.run("open PauseView"), Ok("opening PauseView".into()));
    assert_eq!(h.run("open PauseView"), Ok("PauseView is already open".into()));
    h.tick();
    assert_eq!(h.views.borrow().state_of::<PauseView>(), Some(ViewState::Open));

    assert_eq!(h.run("close PauseView"), Ok("closing PauseView".into()));
    assert!(h.run("open Pause").is_err());
}

#[test]
fn bus_lines_run_during_update() {
    let mut h = Harness::new();
    h.send("state PauseState");
    h.send("console options");
    assert_eq!(h.states.borrow().current_state_name(), Some("PlayState"));

    h.tick();
    assert_eq!(h.states.borrow().current_state_name(), Some("PauseState"));

    let console = h.console.borrow();
    assert_eq!(console.console().selected_tab(), Some(Tab::Options));
    assert_eq!(
        console.console().history().collect::<Vec<_>>(),
        vec!["state PauseState", "console options"]
    );
    assert!(console.console().output_tail(8).contains(&"> console options"));
}

#[test]
fn quit_requests_exit() {
    let mut h = Harness::new();
    assert!(!h.registry.exit_requested());
    assert_eq!(h.run("quit"), Ok("exit requested".into()));
    assert!(h.registry.exit_requested());
}

#[test]
fn log_commands_use_the_shared_buffer() {
    let mut h = Harness::new();
    let logs = h.console.borrow().logs().clone();
    logs.push(ConsoleLog::new(LogKind::Log, "loaded"));
    logs.push(ConsoleLog::new(LogKind::Warning, "slow frame"));
    logs.push(ConsoleLog::new(LogKind::Error, "missing asset"));

    let out = h.run("logs 2").unwrap();
    assert!(out.starts_with("logs 1 | warnings 1 | errors 1"));
    assert!(!out.contains("loaded"));
    assert!(out.contains("[error] : missing asset"));

    assert_eq!(h.run("filter error off"), Ok("error hidden".into()));
    assert!(!h.run("logs").unwrap().contains("missing asset"));
    assert!(h.run("filter bogus on").is_err());

    assert!(h.run("select 1").unwrap().starts_with("slow frame"));
    assert!(h.run("select 9").is_err());

    assert_eq!(h.run("pin"), Ok("log counts pinned".into()));
    assert!(logs.is_pinned());
    assert_eq!(h.run("pin off"), Ok("log counts unpinned".into()));

    assert_eq!(h.run("clear"), Ok("logs cleared".into()));
    assert!(logs.is_empty());
}

#[test]
fn builtin_and_custom_options() {
    let mut h = Harness::new();
    let listed = h.run("options").unwrap();
    assert!(listed.contains("- Engine"));
    assert!(listed.contains("<Quit>"));
    assert!(listed.contains("Pin log counts: [ ]"));

    // Frame text is refreshed every update.
    assert!(listed.contains("Frame: 0 ("));

    assert_eq!(h.run("opt pin log counts"), Ok("Pin log counts: [x]".into()));
    assert!(h.console.borrow().logs().is_pinned());
    assert_eq!(h.run("opt Pin log counts off"), Ok("Pin log counts: [ ]".into()));

    let submitted = Rc::new(Cell::new(0usize));
    let seen = submitted.clone();
    let id = h.console.borrow_mut().add_option(
        OptionData::input("Seed", move |v| seen.set(v.len())),
        Some("Debug"),
    );
    assert_eq!(h.run("opt Seed abc def"), Ok("Seed: \"abc def\"".into()));
    assert_eq!(submitted.get(), 7);

    assert!(h.run("opt Version 2").is_err());
    assert!(h.run("opt Nothing").is_err());

    h.console.borrow_mut().remove_option(id).unwrap();
    assert!(h.console.borrow().options().category("Debug").is_none());

    h.run("opt Quit").unwrap();
    assert!(h.registry.exit_requested());
}
