//! One-shot warp transition overlay.
//!
//! Plays a short full-screen flash when the user scrolls organically
//! through a chapter boundary. The replay rule is a small state machine
//! instead of a timer-guarded boolean, so overlapping suppression
//! windows have explicit semantics:
//!
//! ```text
//! Idle ──(enter region, organic)──> Armed ──(cross fire point)──> Fired
//!   │                                  │
//!   └──(enter region, navigating)──────┴──(navigating at fire)──> Suppressed
//!
//! Suppressed/Fired ──(exit region either side)──> Idle
//! ```
//!
//! Navigation intent is sampled at the moment the trigger fires - a nav
//! jump that sweeps the offset through the region must not replay the
//! transition it skipped over.

use log::{debug, trace};

use crate::core::frame_loop::FrameTick;

/// Progress threshold inside the trigger region where the overlay
/// fires.
const FIRE_POINT: f32 = 0.5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WarpState {
    #[default]
    Idle,
    /// Inside the region on an organic scroll; will fire at the fire
    /// point.
    Armed,
    /// Inside the region but playback is vetoed for this traversal.
    Suppressed,
    /// Played; waiting for the region to be exited before re-arming.
    Fired,
}

/// One-shot overlay controller. Progress comes from the owning
/// trigger, intent from the navigation arbiter.
pub struct WarpOverlay {
    state: WarpState,
    fired_at_s: Option<f64>,
    /// Flash length, seconds.
    duration_s: f32,
}

impl WarpOverlay {
    pub fn new(duration_s: f32) -> Self {
        Self {
            state: WarpState::Idle,
            fired_at_s: None,
            duration_s: duration_s.max(0.05),
        }
    }

    pub fn state(&self) -> WarpState {
        self.state
    }

    /// Advance the machine with this frame's trigger progress and the
    /// intent flag sampled right now.
    pub fn update(&mut self, tick: &FrameTick, progress: f32, navigating: bool) {
        let inside = progress > 0.0 && progress < 1.0;

        self.state = match self.state {
            WarpState::Idle => {
                if inside {
                    if navigating {
                        trace!("warp suppressed on entry (navigation in flight)");
                        WarpState::Suppressed
                    } else {
                        WarpState::Armed
                    }
                } else if progress >= 1.0 {
                    // Jumped clean over the region in one frame - treat
                    // as traversed, nothing to play
                    WarpState::Suppressed
                } else {
                    WarpState::Idle
                }
            }
            WarpState::Armed => {
                if navigating {
                    trace!("warp suppressed mid-region");
                    WarpState::Suppressed
                } else if progress >= FIRE_POINT {
                    debug!("warp fired at progress {:.2}", progress);
                    self.fired_at_s = Some(tick.now_s);
                    WarpState::Fired
                } else if !inside {
                    WarpState::Idle
                } else {
                    WarpState::Armed
                }
            }
            WarpState::Suppressed => {
                if !inside {
                    WarpState::Idle
                } else {
                    WarpState::Suppressed
                }
            }
            WarpState::Fired => {
                if !inside {
                    WarpState::Idle
                } else {
                    WarpState::Fired
                }
            }
        };
    }

    /// Overlay alpha for painting, [0,1]. A triangular pulse over the
    /// flash duration.
    pub fn opacity(&self, now_s: f64) -> f32 {
        let Some(fired_at) = self.fired_at_s else {
            return 0.0;
        };
        let t = ((now_s - fired_at) as f32 / self.duration_s).clamp(0.0, 1.0);
        if t >= 1.0 {
            0.0
        } else {
            (1.0 - (2.0 * t - 1.0).abs()).clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame_loop::{FrameStamp, Phase};

    fn tick(frame: u64) -> FrameTick {
        FrameTick {
            frame: FrameStamp(frame),
            now_s: frame as f64 / 60.0,
            dt_s: 1.0 / 60.0,
            phase: Phase::Effects,
        }
    }

    #[test]
    fn test_organic_pass_fires_once() {
        let mut warp = WarpOverlay::new(0.5);

        warp.update(&tick(1), 0.1, false);
        assert_eq!(warp.state(), WarpState::Armed);

        warp.update(&tick(2), 0.6, false);
        assert_eq!(warp.state(), WarpState::Fired);

        // Still inside: does not refire or re-arm
        warp.update(&tick(3), 0.8, false);
        assert_eq!(warp.state(), WarpState::Fired);

        // Exit forward, back to idle
        warp.update(&tick(4), 1.0, false);
        assert_eq!(warp.state(), WarpState::Idle);
    }

    #[test]
    fn test_navigation_jump_suppresses_playback() {
        let mut warp = WarpOverlay::new(0.5);

        // Jump lands mid-region with intent active
        warp.update(&tick(1), 0.4, true);
        assert_eq!(warp.state(), WarpState::Suppressed);

        // Crossing the fire point while suppressed stays silent
        warp.update(&tick(2), 0.7, true);
        assert_eq!(warp.state(), WarpState::Suppressed);
        assert_eq!(warp.opacity(0.05), 0.0);
    }

    #[test]
    fn test_intent_at_fire_moment_vetoes() {
        let mut warp = WarpOverlay::new(0.5);
        warp.update(&tick(1), 0.2, false); // armed organically
        // Intent arrives before the fire point is crossed
        warp.update(&tick(2), 0.6, true);
        assert_eq!(warp.state(), WarpState::Suppressed);
    }

    #[test]
    fn test_rearms_after_exit() {
        let mut warp = WarpOverlay::new(0.5);
        warp.update(&tick(1), 0.4, true);
        assert_eq!(warp.state(), WarpState::Suppressed);

        // Scroll back out below the region start
        warp.update(&tick(2), 0.0, false);
        assert_eq!(warp.state(), WarpState::Idle);

        // Organic re-entry arms and fires again
        warp.update(&tick(3), 0.3, false);
        warp.update(&tick(4), 0.55, false);
        assert_eq!(warp.state(), WarpState::Fired);
    }

    #[test]
    fn test_single_frame_sweep_does_not_fire() {
        let mut warp = WarpOverlay::new(0.5);
        // Immediate jump: progress goes 0 -> 1 with no frame inside
        warp.update(&tick(1), 1.0, true);
        assert_ne!(warp.state(), WarpState::Fired);
    }

    #[test]
    fn test_opacity_pulse_shape() {
        let mut warp = WarpOverlay::new(1.0);
        warp.update(&tick(1), 0.3, false);
        warp.update(&tick(2), 0.6, false); // fires at now_s = 2/60
        let fired_at = 2.0 / 60.0;

        assert_eq!(warp.opacity(fired_at), 0.0);
        assert!(warp.opacity(fired_at + 0.5) > 0.9); // peak mid-pulse
        assert_eq!(warp.opacity(fired_at + 2.0), 0.0); // done
    }
}
