use keystone_core::{EngineResult, Frame, ServiceHandle, ServiceRegistry};
use keystone_ui::{
    AnimatorConfig, State, StateCtx, StateFactory, StateService, TimedAnimator, ViewAnimator,
    ViewBehaviour, ViewService, ViewState,
};

#[derive(Default)]
struct MenuView;
impl ViewBehaviour for MenuView {}

#[derive(Default)]
struct SettingsView;
impl ViewBehaviour for SettingsView {}

#[derive(Default)]
struct MenuState {
    entered: u32,
    exited: u32,
    updates: u32,
}

impl State for MenuState {
    fn enter(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        self.entered += 1;
        self.open_views(ctx)
    }

    fn update(&mut self, _ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        self.updates += 1;
        Ok(())
    }

    fn exit(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        self.exited += 1;
        self.close_views(ctx)
    }

    fn open_views(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        ctx.open_view::<MenuView>().map(|_| ())
    }

    fn close_views(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        ctx.close_view::<MenuView>().map(|_| ())
    }
}

#[derive(Default)]
struct SettingsState;

impl State for SettingsState {
    fn open_views(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        ctx.open_view::<SettingsView>().map(|_| ())
    }

    fn close_views(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        ctx.close_view::<SettingsView>().map(|_| ())
    }
}

/// Bounces back to the menu on its first update.
#[derive(Default)]
struct SplashState;

impl State for SplashState {
    fn update(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        ctx.change_state::<MenuState>();
        Ok(())
    }
}

/// Never added to the state table.
#[derive(Default)]
struct CreditsState;
impl State for CreditsState {}

struct Harness {
    registry: ServiceRegistry,
    views: ServiceHandle<ViewService>,
    states: ServiceHandle<StateService>,
    frame: Frame,
}

impl Harness {
    fn new(starting: &str) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let cfg = AnimatorConfig::default();
        let instant = || {
            ViewAnimator::new(
                Box::new(TimedAnimator::for_view(&cfg, 0.0)),
                cfg.clone(),
            )
        };
        let mut views = ViewService::default();
        views.add_view("Menu", MenuView, instant()).unwrap();
        views.add_view("Settings", SettingsView, instant()).unwrap();

        let mut registry = ServiceRegistry::new();
        let views = registry.register(views).unwrap();
        let states = registry
            .register(
                StateService::new(&[
                    StateFactory::of::<MenuState>(),
                    StateFactory::of::<SettingsState>(),
                    StateFactory::of::<SplashState>(),
                ])
                .with_starting_state(starting),
            )
            .unwrap();
        registry.start().unwrap();

        Self {
            registry,
            views,
            states,
            frame: Frame::first(0.016),
        }
    }

    fn tick(&mut self) {
        self.registry.update_all(&self.frame).unwrap();
        self.frame = self.frame.next(0.016);
    }

    fn current(&self) -> Option<&'static str> {
        self.states.borrow().current_state_name()
    }

    fn view_state<V: ViewBehaviour>(&self) -> Option<ViewState> {
        self.views.borrow().state_of::<V>()
    }
}

#[test]
fn starting_state_is_entered_on_first_update() {
    let mut h = Harness::new("MenuState");
    assert_eq!(h.current(), None);
    assert_eq!(
        h.states.borrow().state_names(),
        vec!["MenuState", "SettingsState", "SplashState"]
    );

    h.tick();
    assert_eq!(h.current(), Some("MenuState"));
    assert_eq!(h.view_state::<MenuView>(), Some(ViewState::Opening));

    h.tick();
    assert_eq!(h.view_state::<MenuView>(), Some(ViewState::Open));
    assert_eq!(h.states.borrow().state::<MenuState>().unwrap().entered, 1);
    assert!(h.states.borrow().state::<MenuState>().unwrap().updates >= 1);
}

#[test]
fn change_state_exits_current_and_enters_target() {
    let mut h = Harness::new("MenuState");
    h.tick();
    h.tick();

    h.states.borrow_mut().change_state::<SettingsState>().unwrap();
    assert!(h.states.borrow().is_current::<SettingsState>());
    assert_eq!(h.view_state::<MenuView>(), Some(ViewState::Closing));
    assert_eq!(h.view_state::<SettingsView>(), Some(ViewState::Opening));

    h.tick();
    assert_eq!(h.view_state::<MenuView>(), Some(ViewState::Closed));
    assert_eq!(h.view_state::<SettingsView>(), Some(ViewState::Open));
    assert_eq!(h.states.borrow().state::<MenuState>().unwrap().exited, 1);
}

#[test]
fn unknown_state_leaves_current_unchanged() {
    let mut h = Harness::new("MenuState");
    h.tick();

    let err = h
        .states
        .borrow_mut()
        .change_state::<CreditsState>()
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(h.current(), Some("MenuState"));

    assert!(h.states.borrow_mut().change_state_named("Nope").is_err());
    assert_eq!(h.current(), Some("MenuState"));
}

#[test]
fn changing_to_the_current_state_re_enters_it() {
    let mut h = Harness::new("MenuState");
    h.tick();

    h.states.borrow_mut().change_state::<MenuState>().unwrap();
    let states = h.states.borrow();
    let menu = states.state::<MenuState>().unwrap();
    assert_eq!((menu.entered, menu.exited), (2, 1));
    assert_eq!(h.view_state::<MenuView>(), Some(ViewState::Opening));
}

#[test]
fn transition_requested_from_a_hook_is_applied_after_it() {
    let mut h = Harness::new("SplashState");
    h.tick();
    // Splash was entered and updated in the same tick; its request chained.
    assert_eq!(h.current(), Some("MenuState"));
    assert_eq!(h.states.borrow().state::<MenuState>().unwrap().entered, 1);
}

#[test]
fn starting_state_is_ignored_once_a_state_is_current() {
    let mut h = Harness::new("");
    h.tick();
    assert_eq!(h.current(), None);

    let mut states = h.states.borrow_mut();
    states.change_state::<SettingsState>().unwrap();
    states.set_starting_state("MenuState").unwrap();
    assert_eq!(states.current_state_name(), Some("SettingsState"));
}

#[test]
fn cleanup_clears_the_current_state_and_views() {
    let mut h = Harness::new("MenuState");
    h.tick();
    h.registry.cleanup_all();

    assert_eq!(h.current(), None);
    assert_eq!(h.view_state::<MenuView>(), Some(ViewState::Uninitialized));
}
