//! Easing functions shared by the scroll tween and section timelines.
//!
//! Every function maps t in [0,1] to [0,1] with f(0)=0 and f(1)=1.
//! Inputs outside [0,1] are clamped before evaluation, so easing can
//! never push a property outside its from/to range.

use serde::{Deserialize, Serialize};

/// Easing kind for tweens and timeline steps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    /// Hermite smoothstep: t*t*(3 - 2t)
    SmoothStep,
    /// Exponential ease-out: 1 - 2^(-10t). The scroll engine default -
    /// fast launch, long settle.
    #[default]
    OutExpo,
    /// Cubic ease-in-out
    InOutCubic,
    /// Cubic ease-out
    OutCubic,
}

impl Easing {
    /// Evaluate at `t`, clamped to [0,1].
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::SmoothStep => t * t * (3.0 - 2.0 * t),
            Easing::OutExpo => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f32.powf(-10.0 * t)
                }
            }
            Easing::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::OutCubic => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
