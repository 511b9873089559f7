use crate::error::{EngineError, EngineResult};
use crate::frame::Frame;
use crate::registry::ServiceRegistry;
use crate::service::{Service, ServiceFactory, ServiceHandle};
use crate::startup::StartupConfig;
use crate::sync::ShutdownToken;

use log::{info, warn};
use std::time::{Duration, Instant};

/// Frame pacing for the host loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Frames per second targeted by `run`. `0` runs unpaced.
    pub target_fps: u32,
    /// Upper bound for a single frame delta.
    pub max_dt_ms: u32,
    /// Stop `run` after this many frames. `0` runs until exit is requested.
    pub max_frames: u64,
}

impl Default for EngineConfig {
    #[inline]
    fn default() -> Self {
        Self {
            target_fps: 60,
            max_dt_ms: 250,
            max_frames: 0,
        }
    }
}

impl From<&StartupConfig> for EngineConfig {
    #[inline]
    fn from(cfg: &StartupConfig) -> Self {
        Self {
            target_fps: cfg.target_fps,
            max_dt_ms: cfg.max_dt_ms,
            max_frames: cfg.max_frames,
        }
    }
}

/// Application-owned host loop.
///
/// Drives the registry through `start` (init + late_init), one `update_all`
/// per `step`, and `cleanup_all` on `shutdown`.
pub struct Engine {
    config: EngineConfig,
    services: ServiceRegistry,
    shutdown: ShutdownToken,

    last_frame: Option<Frame>,
    last: Instant,
    started: bool,
    stopped: bool,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let shutdown = ShutdownToken::new();
        Self {
            config,
            services: ServiceRegistry::with_shutdown(shutdown.clone()),
            shutdown,
            last_frame: None,
            last: Instant::now(),
            started: false,
            stopped: false,
        }
    }

    /// Shares an externally owned token (ctrl-c handler, another thread).
    pub fn with_shutdown(mut self, shutdown: ShutdownToken) -> Self {
        self.services.set_shutdown_token(shutdown.clone());
        self.shutdown = shutdown;
        self
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    #[inline]
    pub fn services_mut(&mut self) -> &mut ServiceRegistry {
        &mut self.services
    }

    #[inline]
    pub fn register<T: Service>(&mut self, service: T) -> EngineResult<ServiceHandle<T>> {
        self.services.register(service)
    }

    #[inline]
    pub fn register_all(&mut self, factories: &[ServiceFactory]) {
        self.services.register_all(factories);
    }

    #[inline]
    pub fn request_exit(&self) {
        self.shutdown.request();
    }

    #[inline]
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }

    #[inline]
    pub fn exit_requested(&self) -> bool {
        self.shutdown.is_requested()
    }

    /// Last completed frame.
    #[inline]
    pub fn frame(&self) -> Option<Frame> {
        self.last_frame
    }

    pub fn start(&mut self) -> EngineResult<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        self.last = Instant::now();
        self.services.start()
    }

    /// Runs one frame with the measured (clamped) wall-clock delta.
    pub fn step(&mut self) -> EngineResult<Frame> {
        if self.exit_requested() {
            return Err(EngineError::ExitRequested);
        }

        let now = Instant::now();
        if !self.started {
            self.start()?;
            self.last = now;
        }

        let mut dt = (now - self.last).as_secs_f32();
        self.last = now;

        if !dt.is_finite() || dt < 0.0 {
            dt = 0.0;
        }
        dt = dt.min(self.config.max_dt_ms as f32 / 1000.0);

        self.step_with(dt)
    }

    /// Runs one frame with an explicit delta.
    pub fn step_with(&mut self, dt: f32) -> EngineResult<Frame> {
        if self.exit_requested() {
            return Err(EngineError::ExitRequested);
        }
        if !self.started {
            self.start()?;
        }

        let frame = match self.last_frame {
            Some(prev) => prev.next(dt),
            None => Frame::first(dt),
        };

        self.services.update_all(&frame)?;
        self.last_frame = Some(frame);
        Ok(frame)
    }

    /// Steps until exit is requested or `max_frames` is reached, then shuts down.
    pub fn run(&mut self) -> EngineResult<()> {
        match self.start() {
            Ok(()) => {}
            Err(EngineError::ExitRequested) => return self.shutdown(),
            Err(e) => {
                let _ = self.shutdown();
                return Err(e);
            }
        }

        let budget = (self.config.target_fps > 0)
            .then(|| Duration::from_secs_f64(1.0 / self.config.target_fps as f64));

        loop {
            let frame_start = Instant::now();
            match self.step() {
                Ok(frame) => {
                    let limit = self.config.max_frames;
                    if limit > 0 && frame.frame_index + 1 >= limit {
                        info!(target: "engine", "frame limit reached ({limit})");
                        break;
                    }
                }
                Err(EngineError::ExitRequested) => break,
                Err(e) => {
                    let _ = self.shutdown();
                    return Err(e);
                }
            }

            if let Some(budget) = budget {
                let spent = frame_start.elapsed();
                if spent < budget {
                    std::thread::sleep(budget - spent);
                }
            }
        }

        self.shutdown()
    }

    pub fn shutdown(&mut self) -> EngineResult<()> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;

        if !self.started {
            warn!(target: "engine", "shutdown before start");
            return Ok(());
        }

        self.services.cleanup_all();
        info!(
            target: "engine",
            "shutdown after {} frames",
            self.last_frame.map(|f| f.frame_index + 1).unwrap_or(0)
        );
        Ok(())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.started && !self.stopped {
            let _ = self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceCtx;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Ticker {
        frames: Vec<u64>,
        cleaned: Rc<Cell<bool>>,
        quit_at: Option<u64>,
    }

    impl Service for Ticker {
        fn update(&mut self, ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
            let frame = *ctx.frame().ok_or("update without frame")?;
            self.frames.push(frame.frame_index);
            if self.quit_at == Some(frame.frame_index) {
                ctx.request_exit();
            }
            Ok(())
        }

        fn cleanup(&mut self, _ctx: &mut ServiceCtx<'_>) -> EngineResult<()> {
            self.cleaned.set(true);
            Ok(())
        }
    }

    fn unpaced(max_frames: u64) -> EngineConfig {
        EngineConfig {
            target_fps: 0,
            max_dt_ms: 250,
            max_frames,
        }
    }

    #[test]
    fn step_with_advances_frames() {
        let mut engine = Engine::new(unpaced(0));
        let ticker = engine.register(Ticker::default()).unwrap();

        let f0 = engine.step_with(0.5).unwrap();
        let f1 = engine.step_with(0.25).unwrap();
        assert_eq!(f0.frame_index, 0);
        assert_eq!(f1.frame_index, 1);
        assert!((f1.elapsed - 0.75).abs() < 1e-9);
        assert_eq!(ticker.borrow().frames, vec![0, 1]);
    }

    #[test]
    fn run_stops_at_frame_limit_and_cleans_up() {
        let cleaned = Rc::new(Cell::new(false));
        let mut engine = Engine::new(unpaced(3));
        let ticker = engine
            .register(Ticker {
                cleaned: cleaned.clone(),
                ..Default::default()
            })
            .unwrap();

        engine.run().unwrap();
        assert_eq!(ticker.borrow().frames, vec![0, 1, 2]);
        assert!(cleaned.get());
    }

    #[test]
    fn exit_request_ends_the_loop() {
        let mut engine = Engine::new(unpaced(100));
        let ticker = engine
            .register(Ticker {
                quit_at: Some(1),
                ..Default::default()
            })
            .unwrap();

        engine.run().unwrap();
        assert_eq!(ticker.borrow().frames, vec![0, 1]);
        assert!(matches!(engine.step(), Err(EngineError::ExitRequested)));
    }

    #[test]
    fn external_token_is_shared_with_services() {
        let token = ShutdownToken::new();
        let mut engine = Engine::new(unpaced(0)).with_shutdown(token.clone());
        engine.start().unwrap();
        engine.services().request_exit();
        assert!(token.is_requested());
        assert!(matches!(engine.step_with(0.1), Err(EngineError::ExitRequested)));
    }
}
