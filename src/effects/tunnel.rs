//! Tunnel renderer: concentric rings flying past a camera whose depth
//! is driven by the shared progress cell.
//!
//! Rings live at fixed depths along the tunnel and wrap, so the camera
//! can travel any distance (including a 0 -> 1 jump in one frame) and
//! every ring still lands at a valid depth. Geometry is recomputed in
//! place each frame; the ring buffer never reallocates after
//! construction.

use glam::Vec2;

use crate::core::frame_loop::FrameTick;
use crate::core::progress::ProgressCell;
use crate::effects::EffectConsumer;

#[derive(Clone, Copy, Debug)]
pub struct TunnelConfig {
    pub ring_count: usize,
    /// Tunnel depth in camera units; the progress cell's [0,1] maps
    /// onto one full traversal.
    pub depth: f32,
    /// Ring radius at the near plane, as a fraction of the viewport's
    /// shorter side.
    pub base_radius: f32,
    /// Speed ceiling, screens/s. Input above this clamps.
    pub max_speed: f32,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            ring_count: 48,
            depth: 40.0,
            base_radius: 0.85,
            max_speed: 3.0,
        }
    }
}

/// One ring, ready for painting.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ring {
    /// Radius as a fraction of the viewport's shorter side.
    pub radius_frac: f32,
    /// Stroke opacity, [0,1].
    pub opacity: f32,
    /// Ring rotation, radians (drives the dash pattern swirl).
    pub rotation: f32,
    /// Center drift from viewport center, in radius fractions.
    pub drift: Vec2,
}

/// Procedural tunnel. One per narrative chapter.
pub struct TunnelEffect {
    config: TunnelConfig,
    cell: ProgressCell,
    rings: Vec<Ring>,
    swirl: f32,
    last_speed: f32,
}

impl TunnelEffect {
    pub fn new(config: TunnelConfig, cell: ProgressCell) -> Self {
        let rings = vec![Ring::default(); config.ring_count];
        Self {
            config,
            cell,
            rings,
            swirl: 0.0,
            last_speed: 0.0,
        }
    }

    /// Rings back-to-front, recomputed by the last `advance`.
    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    /// Speed after clamping, for overlays that dim with velocity.
    pub fn speed(&self) -> f32 {
        self.last_speed
    }
}

impl EffectConsumer for TunnelEffect {
    fn advance(&mut self, tick: &FrameTick) {
        let snap = self.cell.read(tick);
        let speed = snap.speed.clamp(0.0, self.config.max_speed);
        self.last_speed = speed;

        // Swirl accumulates with travel speed, wrapped to keep the
        // angle well-conditioned over long sessions.
        self.swirl = (self.swirl + speed * tick.dt_s * 2.4) % std::f32::consts::TAU;

        let depth = self.config.depth.max(1.0);
        let camera_z = snap.value * depth;
        let spacing = depth / self.rings.len().max(1) as f32;
        let near = 0.8;

        for (i, ring) in self.rings.iter_mut().enumerate() {
            let ring_z = i as f32 * spacing;
            // Wrap into (0, depth] ahead of the camera
            let rel = (ring_z - camera_z).rem_euclid(depth).max(1e-3);

            ring.radius_frac = self.config.base_radius * near / (near + rel);
            // Far rings fade out; speed pushes brightness up, clamped
            ring.opacity = ((1.0 - rel / depth) * (0.35 + 0.4 * speed)).clamp(0.0, 1.0);
            ring.rotation = self.swirl + rel * 0.12;
            let wobble = rel * 0.35 + self.swirl;
            ring.drift = Vec2::new(wobble.cos(), wobble.sin()) * 0.04 * rel.min(6.0);
        }
    }
}
