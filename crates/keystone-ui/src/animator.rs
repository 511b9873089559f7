use crate::prefab::ViewPrefab;
use serde::{Deserialize, Serialize};

/// External animation state machine driving view transitions.
///
/// Views only fire triggers and poll for named idle states; how the animator
/// gets there is its own business.
pub trait Animator {
    fn set_trigger(&mut self, trigger: &str);
    fn is_in_state(&self, state: &str) -> bool;

    /// Advances time-driven animators. Called once per frame before polling.
    fn tick(&mut self, _dt: f32) {}

    fn current_state(&self) -> Option<&str> {
        None
    }
}

/// State and trigger names a view uses on its animator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    pub open_idle_state: String,
    pub closed_idle_state: String,
    pub transition_in_trigger: String,
    pub transition_out_trigger: String,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            open_idle_state: "Open_Idle".to_owned(),
            closed_idle_state: "Closed_Idle".to_owned(),
            transition_in_trigger: "transition_in".to_owned(),
            transition_out_trigger: "transition_out".to_owned(),
        }
    }
}

/// Animator bound to a view's state and trigger names.
pub struct ViewAnimator {
    animator: Box<dyn Animator>,
    config: AnimatorConfig,
}

impl ViewAnimator {
    #[inline]
    pub fn new(animator: Box<dyn Animator>, config: AnimatorConfig) -> Self {
        Self { animator, config }
    }

    #[inline]
    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    #[inline]
    pub fn animator(&self) -> &dyn Animator {
        self.animator.as_ref()
    }

    #[inline]
    pub fn transition_in(&mut self) {
        self.animator.set_trigger(&self.config.transition_in_trigger);
    }

    #[inline]
    pub fn transition_out(&mut self) {
        self.animator.set_trigger(&self.config.transition_out_trigger);
    }

    #[inline]
    pub fn is_in_open_idle(&self) -> bool {
        self.animator.is_in_state(&self.config.open_idle_state)
    }

    #[inline]
    pub fn is_in_closed_idle(&self) -> bool {
        self.animator.is_in_state(&self.config.closed_idle_state)
    }

    #[inline]
    pub fn tick(&mut self, dt: f32) {
        self.animator.tick(dt);
    }
}

#[derive(Debug, Clone)]
struct TimedTransition {
    trigger: String,
    clip: String,
    target: String,
    duration: f32,
}

/// Headless animator: a trigger plays a clip for a fixed duration, then
/// settles in the transition's target state.
#[derive(Debug, Clone)]
pub struct TimedAnimator {
    state: String,
    transitions: Vec<TimedTransition>,
    // (transition index, seconds left)
    playing: Option<(usize, f32)>,
}

impl TimedAnimator {
    pub fn new(initial_state: impl Into<String>) -> Self {
        Self {
            state: initial_state.into(),
            transitions: Vec::new(),
            playing: None,
        }
    }

    pub fn with_transition(
        mut self,
        trigger: impl Into<String>,
        clip: impl Into<String>,
        target: impl Into<String>,
        duration: f32,
    ) -> Self {
        self.transitions.push(TimedTransition {
            trigger: trigger.into(),
            clip: clip.into(),
            target: target.into(),
            duration: duration.max(0.0),
        });
        self
    }

    /// Two-clip animator matching a view's idle states and triggers.
    pub fn for_view(config: &AnimatorConfig, duration: f32) -> Self {
        Self::new(config.closed_idle_state.clone())
            .with_transition(
                config.transition_in_trigger.clone(),
                "TransitionIn",
                config.open_idle_state.clone(),
                duration,
            )
            .with_transition(
                config.transition_out_trigger.clone(),
                "TransitionOut",
                config.closed_idle_state.clone(),
                duration,
            )
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing.is_some()
    }
}

impl Animator for TimedAnimator {
    fn set_trigger(&mut self, trigger: &str) {
        let Some(idx) = self.transitions.iter().position(|t| t.trigger == trigger) else {
            log::debug!(target: "views", "animator has no transition for trigger '{trigger}'");
            return;
        };
        let t = &self.transitions[idx];
        if t.duration <= 0.0 {
            self.state = t.target.clone();
            self.playing = None;
        } else {
            self.state = t.clip.clone();
            self.playing = Some((idx, t.duration));
        }
    }

    #[inline]
    fn is_in_state(&self, state: &str) -> bool {
        self.playing.is_none() && self.state == state
    }

    fn tick(&mut self, dt: f32) {
        let Some((idx, left)) = self.playing else {
            return;
        };
        let left = left - dt.max(0.0);
        if left <= 0.0 {
            self.state = self.transitions[idx].target.clone();
            self.playing = None;
        } else {
            self.playing = Some((idx, left));
        }
    }

    #[inline]
    fn current_state(&self) -> Option<&str> {
        Some(&self.state)
    }
}

/// Creates the animator for each instantiated view prefab.
pub trait AnimatorProvider {
    fn create(&mut self, prefab: &ViewPrefab) -> Box<dyn Animator>;
}

impl<F> AnimatorProvider for F
where
    F: FnMut(&ViewPrefab) -> Box<dyn Animator>,
{
    #[inline]
    fn create(&mut self, prefab: &ViewPrefab) -> Box<dyn Animator> {
        self(prefab)
    }
}

/// Default provider: a [`TimedAnimator`] using the prefab's transition time.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimedAnimatorProvider;

impl AnimatorProvider for TimedAnimatorProvider {
    fn create(&mut self, prefab: &ViewPrefab) -> Box<dyn Animator> {
        Box::new(TimedAnimator::for_view(&prefab.animator, prefab.transition_secs))
    }
}
