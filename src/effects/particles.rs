//! Starfield particles driven by the shared progress cell.
//!
//! Each particle has a fixed home position in a unit volume; per frame
//! the field projects homes through a camera whose depth follows
//! progress, writing into a preallocated render buffer. Speed stretches
//! the stars into streaks, clamped to the configured maximum.

use glam::{Vec2, Vec3};

use crate::core::frame_loop::FrameTick;
use crate::core::progress::ProgressCell;
use crate::effects::{EffectConsumer, XorShift32};

#[derive(Clone, Copy, Debug)]
pub struct ParticleConfig {
    pub count: usize,
    /// Field depth in camera units, one full traversal per unit
    /// progress.
    pub depth: f32,
    /// Speed ceiling, screens/s.
    pub max_speed: f32,
    /// Seed for the deterministic home layout.
    pub seed: u32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 600,
            depth: 24.0,
            max_speed: 3.0,
            seed: 0x5f37_59df,
        }
    }
}

/// Immutable per-particle seed data.
#[derive(Clone, Copy, Debug)]
struct Home {
    pos: Vec3,
    size: f32,
    twinkle: f32,
}

/// One projected star, ready for painting.
#[derive(Clone, Copy, Debug, Default)]
pub struct Star {
    /// Position in normalized viewport coords, [-1,1] on both axes.
    pub pos: Vec2,
    /// Streak tail end, same coords. Equals `pos` when still.
    pub tail: Vec2,
    /// Point size in px.
    pub size: f32,
    /// Alpha, [0,1].
    pub alpha: f32,
}

/// Procedural starfield consumer.
pub struct ParticleField {
    config: ParticleConfig,
    cell: ProgressCell,
    homes: Vec<Home>,
    stars: Vec<Star>,
    last_speed: f32,
}

impl ParticleField {
    pub fn new(config: ParticleConfig, cell: ProgressCell) -> Self {
        let mut rng = XorShift32::new(config.seed);
        let homes = (0..config.count)
            .map(|_| Home {
                pos: Vec3::new(
                    rng.next_signed() * 1.6,
                    rng.next_signed() * 1.6,
                    rng.next_f32() * config.depth,
                ),
                size: 0.8 + rng.next_f32() * 2.2,
                twinkle: 0.4 + rng.next_f32() * 0.6,
            })
            .collect();
        Self {
            config,
            cell,
            homes,
            stars: vec![Star::default(); config.count],
            last_speed: 0.0,
        }
    }

    /// Stars recomputed by the last `advance`.
    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn speed(&self) -> f32 {
        self.last_speed
    }
}

impl EffectConsumer for ParticleField {
    fn advance(&mut self, tick: &FrameTick) {
        let snap = self.cell.read(tick);
        let speed = snap.speed.clamp(0.0, self.config.max_speed);
        self.last_speed = speed;

        let depth = self.config.depth.max(1.0);
        let camera_z = snap.value * depth;
        let near = 0.5;
        // Streak length follows speed; zero when coasting
        let streak = speed * 0.35;

        for (home, star) in self.homes.iter().zip(self.stars.iter_mut()) {
            let rel = (home.pos.z - camera_z).rem_euclid(depth).max(1e-3);
            let scale = near / (near + rel);
            let pos = Vec2::new(home.pos.x, home.pos.y) * scale;

            // Streaks point radially outward from the flight axis
            let tail_scale = near / (near + (rel + streak).min(depth));
            let tail = Vec2::new(home.pos.x, home.pos.y) * tail_scale;

            star.pos = pos;
            star.tail = tail;
            star.size = (home.size * scale * 3.0).clamp(0.3, 6.0);
            star.alpha = (home.twinkle * (1.0 - rel / depth) * (0.6 + 0.4 * speed)).clamp(0.0, 1.0);
        }
    }
}
