use keystone_core::EngineResult;
use keystone_ui::{State, StateCtx, StateFactory, ViewBehaviour, ViewPrefab};
use log::info;

#[derive(Default)]
pub struct MainMenuView {
    title: String,
}

impl ViewBehaviour for MainMenuView {
    fn configure(&mut self, prefab: &ViewPrefab) {
        self.title = prefab.property("title").unwrap_or("Main Menu").to_owned();
    }

    fn on_open_complete(&mut self) {
        info!(target: "sandbox", "{} ready; try `state GameState`", self.title);
    }

    fn describe(&self) -> Option<String> {
        Some(self.title.clone())
    }
}

#[derive(Default)]
pub struct SettingsView;
impl ViewBehaviour for SettingsView {}

#[derive(Default)]
pub struct HudView {
    elapsed: f64,
}

impl ViewBehaviour for HudView {
    fn on_open_started(&mut self) {
        self.elapsed = 0.0;
    }

    fn describe(&self) -> Option<String> {
        Some(format!("{:.1}s", self.elapsed))
    }
}

#[derive(Default)]
pub struct MainMenuState;

impl State for MainMenuState {
    fn open_views(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        ctx.open_view::<MainMenuView>().map(|_| ())
    }

    fn close_views(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        ctx.close_view::<MainMenuView>().map(|_| ())
    }
}

/// Settings sit on top of the menu, which stays open.
#[derive(Default)]
pub struct SettingsState;

impl State for SettingsState {
    fn open_views(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        ctx.open_view::<MainMenuView>()?;
        ctx.open_view::<SettingsView>().map(|_| ())
    }

    fn close_views(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        ctx.close_view::<SettingsView>().map(|_| ())
    }
}

#[derive(Default)]
pub struct GameState {
    rounds: u32,
}

impl State for GameState {
    fn enter(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        self.rounds += 1;
        info!(target: "sandbox", "round {}", self.rounds);
        self.open_views(ctx)
    }

    fn update(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        let dt = ctx.frame().map_or(0.0, |f| f64::from(f.dt));
        if let Some(hud) = ctx.views().and_then(|v| v.behaviour_mut::<HudView>()) {
            hud.elapsed += dt;
        }
        Ok(())
    }

    fn open_views(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        ctx.open_view::<HudView>().map(|_| ())
    }

    fn close_views(&mut self, ctx: &mut StateCtx<'_>) -> EngineResult<()> {
        ctx.close_view::<HudView>().map(|_| ())
    }
}

pub fn states() -> [StateFactory; 3] {
    [
        StateFactory::of::<MainMenuState>(),
        StateFactory::of::<SettingsState>(),
        StateFactory::of::<GameState>(),
    ]
}
