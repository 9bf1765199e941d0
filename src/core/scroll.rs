//! Scroll emulation engine.
//!
//! Owns the virtual scroll offset - the single source of truth for
//! "where the user is". Wheel/touch input retargets an eased tween
//! instead of moving the offset directly, which is what produces the
//! inertia feel; programmatic jumps either tween or set the offset in
//! one step. Nothing else in the system may write the offset.
//!
//! Drift policy: the paint surface is always derived from the virtual
//! offset (through the trigger scheduler's render mapping), never the
//! other way around. After a rapid jump there is nothing to re-sync -
//! the next frame simply renders from the new offset.
//!
//! # Timing model
//!
//! All methods that move state take `now_s`, the host clock in seconds.
//! Tests drive a synthetic clock; the app passes egui's frame time.

use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use crate::core::easing::{Easing, lerp};

/// Scroll axis. Horizontal narratives use the same math on the x axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

/// Engine tuning. Persisted with the app settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tween duration for wheel retargets and non-immediate jumps.
    pub duration_s: f32,
    pub easing: Easing,
    pub orientation: Orientation,
    /// When false, wheel input snaps the offset (no inertia).
    pub smooth_wheel: bool,
    pub wheel_multiplier: f32,
    pub touch_multiplier: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            duration_s: 1.1,
            easing: Easing::OutExpo,
            orientation: Orientation::Vertical,
            smooth_wheel: true,
            wheel_multiplier: 1.0,
            touch_multiplier: 1.6,
        }
    }
}

impl EngineConfig {
    /// A config the engine can actually run with. Rejecting here is what
    /// routes callers onto the native fallback driver.
    fn is_valid(&self) -> bool {
        self.duration_s > 0.0
            && self.duration_s.is_finite()
            && self.wheel_multiplier.is_finite()
            && self.touch_multiplier.is_finite()
    }
}

/// Engine-owned scroll state. Read-only snapshot for every consumer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollState {
    /// Virtual offset, px. Always within [0, max_offset].
    pub offset: f32,
    /// Signed px/s over the last frame. Positive = scrolling forward.
    pub velocity: f32,
    /// Input is suppressed while locked (preloader, modal overlays).
    pub locked: bool,
}

/// Retargetable eased tween over the virtual offset.
#[derive(Clone, Copy, Debug)]
struct Tween {
    from: f32,
    to: f32,
    start_s: f64,
    duration_s: f32,
    easing: Easing,
}

impl Tween {
    fn sample(&self, now_s: f64) -> f32 {
        let elapsed = (now_s - self.start_s).max(0.0) as f32;
        let t = (elapsed / self.duration_s).clamp(0.0, 1.0);
        lerp(self.from, self.to, self.easing.apply(t))
    }

    fn is_done(&self, now_s: f64) -> bool {
        (now_s - self.start_s) as f32 >= self.duration_s
    }

    /// Restart from the current sampled position toward a new target.
    /// Interruption keeps motion continuous instead of snapping back.
    fn retarget(&mut self, now_s: f64, to: f32, duration_s: f32, easing: Easing) {
        *self = Tween {
            from: self.sample(now_s),
            to,
            start_s: now_s,
            duration_s: duration_s.max(f32::EPSILON),
            easing,
        };
    }
}

/// Options for [`ScrollEngine::scroll_to`] / [`ScrollDriver::scroll_to`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ScrollToOptions {
    /// Extra offset applied after target resolution (sticky header
    /// compensation and the like).
    pub offset_px: f32,
    /// Override the engine's tween duration.
    pub duration_s: Option<f32>,
    /// Set the offset in one step: no intermediate frames render at
    /// stale positions, any in-flight tween is cancelled.
    pub immediate: bool,
}

/// Emulated-inertia scroll engine.
pub struct ScrollEngine {
    config: EngineConfig,
    state: ScrollState,
    /// Where input wants the offset to settle.
    target: f32,
    tween: Option<Tween>,
    max_offset: f32,
    last_tick_s: Option<f64>,
}

impl ScrollEngine {
    fn new(config: EngineConfig) -> Self {
        info!(
            "scroll engine up: duration={}s easing={:?} smooth_wheel={}",
            config.duration_s, config.easing, config.smooth_wheel
        );
        Self {
            config,
            state: ScrollState::default(),
            target: 0.0,
            tween: None,
            max_offset: 0.0,
            last_tick_s: None,
        }
    }

    /// Wheel input. Ignored while locked.
    pub fn wheel(&mut self, delta: f32, now_s: f64) {
        self.input(delta * self.config.wheel_multiplier, now_s);
    }

    /// Touch/drag input. Ignored while locked.
    pub fn touch(&mut self, delta: f32, now_s: f64) {
        self.input(delta * self.config.touch_multiplier, now_s);
    }

    fn input(&mut self, delta: f32, now_s: f64) {
        if self.state.locked {
            trace!("scroll input dropped, engine locked");
            return;
        }
        self.target = (self.target + delta).clamp(0.0, self.max_offset);
        if self.config.smooth_wheel {
            self.retarget_tween(now_s, self.target, self.config.duration_s);
        } else {
            self.tween = None;
            self.state.offset = self.target;
        }
    }

    fn retarget_tween(&mut self, now_s: f64, to: f32, duration_s: f32) {
        match &mut self.tween {
            Some(tween) => tween.retarget(now_s, to, duration_s, self.config.easing),
            None => {
                self.tween = Some(Tween {
                    from: self.state.offset,
                    to,
                    start_s: now_s,
                    duration_s: duration_s.max(f32::EPSILON),
                    easing: self.config.easing,
                });
            }
        }
    }

    /// Advance the offset toward the target. Call exactly once per
    /// frame, in the Scroll phase.
    pub fn tick(&mut self, now_s: f64) -> ScrollState {
        let prev_offset = self.state.offset;

        if let Some(tween) = self.tween {
            self.state.offset = tween.sample(now_s).clamp(0.0, self.max_offset);
            if tween.is_done(now_s) {
                self.state.offset = tween.to.clamp(0.0, self.max_offset);
                self.tween = None;
            }
        }

        let dt = self
            .last_tick_s
            .map(|last| (now_s - last).max(0.0) as f32)
            .unwrap_or(0.0);
        self.state.velocity = if dt > 0.0 {
            (self.state.offset - prev_offset) / dt
        } else {
            0.0
        };
        self.last_tick_s = Some(now_s);
        self.state
    }

    /// Jump to an absolute offset.
    pub fn scroll_to(&mut self, offset: f32, opts: &ScrollToOptions, now_s: f64) {
        let resolved = (offset + opts.offset_px).clamp(0.0, self.max_offset);
        self.target = resolved;
        if opts.immediate {
            // One-step jump: cancels the in-flight tween so no frame
            // renders between here and there.
            self.tween = None;
            self.state.offset = resolved;
            self.state.velocity = 0.0;
            debug!("immediate jump to {:.1}px", resolved);
        } else {
            let duration = opts.duration_s.unwrap_or(self.config.duration_s);
            self.retarget_tween(now_s, resolved, duration);
            debug!("eased jump to {:.1}px over {:.2}s", resolved, duration);
        }
    }

    /// Lock the engine: input is suppressed, in-flight motion freezes
    /// where it is.
    pub fn stop(&mut self) {
        if !self.state.locked {
            self.state.locked = true;
            self.tween = None;
            self.target = self.state.offset;
            debug!("scroll locked at {:.1}px", self.state.offset);
        }
    }

    /// Release the lock.
    pub fn start(&mut self) {
        if self.state.locked {
            self.state.locked = false;
            debug!("scroll unlocked");
        }
    }

    /// Content bounds. Recomputed on resize; offset and target clamp
    /// into the new range immediately so stale pins can't hold the
    /// offset out of bounds.
    pub fn set_bounds(&mut self, max_offset: f32) {
        self.max_offset = max_offset.max(0.0);
        self.target = self.target.clamp(0.0, self.max_offset);
        self.state.offset = self.state.offset.clamp(0.0, self.max_offset);
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    pub fn offset(&self) -> f32 {
        self.state.offset
    }

    pub fn max_offset(&self) -> f32 {
        self.max_offset
    }

    /// No tween in flight and the offset sits on its target.
    pub fn is_settled(&self) -> bool {
        self.tween.is_none() && (self.state.offset - self.target).abs() < 0.5
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Direct-positioning fallback for hosts where the emulated engine
/// cannot run. Same end-state contract as the engine, no easing -
/// `scroll_to` lands on the resolved offset in one step.
pub struct NativeFallback {
    state: ScrollState,
    max_offset: f32,
}

impl NativeFallback {
    fn new() -> Self {
        Self {
            state: ScrollState::default(),
            max_offset: 0.0,
        }
    }
}

/// The scroll driver consumers talk to: the emulated engine when it
/// initialized, the native fallback otherwise. Callers never branch on
/// which one they got - end-state positioning is equivalent.
pub enum ScrollDriver {
    Emulated(ScrollEngine),
    Native(NativeFallback),
}

impl ScrollDriver {
    /// Build a driver from config. An unusable config falls back to
    /// direct positioning instead of failing outward.
    pub fn init(config: EngineConfig) -> Self {
        if config.is_valid() {
            ScrollDriver::Emulated(ScrollEngine::new(config))
        } else {
            warn!("scroll engine config unusable ({config:?}), falling back to native positioning");
            ScrollDriver::Native(NativeFallback::new())
        }
    }

    pub fn is_emulated(&self) -> bool {
        matches!(self, ScrollDriver::Emulated(_))
    }

    pub fn wheel(&mut self, delta: f32, now_s: f64) {
        match self {
            ScrollDriver::Emulated(engine) => engine.wheel(delta, now_s),
            ScrollDriver::Native(nf) => {
                if !nf.state.locked {
                    nf.state.offset = (nf.state.offset + delta).clamp(0.0, nf.max_offset);
                }
            }
        }
    }

    pub fn touch(&mut self, delta: f32, now_s: f64) {
        match self {
            ScrollDriver::Emulated(engine) => engine.touch(delta, now_s),
            ScrollDriver::Native(nf) => {
                if !nf.state.locked {
                    nf.state.offset = (nf.state.offset + delta).clamp(0.0, nf.max_offset);
                }
            }
        }
    }

    pub fn tick(&mut self, now_s: f64) -> ScrollState {
        match self {
            ScrollDriver::Emulated(engine) => engine.tick(now_s),
            ScrollDriver::Native(nf) => nf.state,
        }
    }

    pub fn scroll_to(&mut self, offset: f32, opts: &ScrollToOptions, now_s: f64) {
        match self {
            ScrollDriver::Emulated(engine) => engine.scroll_to(offset, opts, now_s),
            ScrollDriver::Native(nf) => {
                // Degraded easing is acceptable; equivalent end state is not optional.
                nf.state.offset = (offset + opts.offset_px).clamp(0.0, nf.max_offset);
                nf.state.velocity = 0.0;
            }
        }
    }

    pub fn stop(&mut self) {
        match self {
            ScrollDriver::Emulated(engine) => engine.stop(),
            ScrollDriver::Native(nf) => nf.state.locked = true,
        }
    }

    pub fn start(&mut self) {
        match self {
            ScrollDriver::Emulated(engine) => engine.start(),
            ScrollDriver::Native(nf) => nf.state.locked = false,
        }
    }

    pub fn set_bounds(&mut self, max_offset: f32) {
        match self {
            ScrollDriver::Emulated(engine) => engine.set_bounds(max_offset),
            ScrollDriver::Native(nf) => {
                nf.max_offset = max_offset.max(0.0);
                nf.state.offset = nf.state.offset.clamp(0.0, nf.max_offset);
            }
        }
    }

    pub fn state(&self) -> ScrollState {
        match self {
            ScrollDriver::Emulated(engine) => engine.state(),
            ScrollDriver::Native(nf) => nf.state,
        }
    }

    /// Whether in-flight motion has finished. Always true for the
    /// native fallback - it positions in one step.
    pub fn is_settled(&self) -> bool {
        match self {
            ScrollDriver::Emulated(engine) => engine.is_settled(),
            ScrollDriver::Native(_) => true,
        }
    }

    pub fn offset(&self) -> f32 {
        self.state().offset
    }
}
