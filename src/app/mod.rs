//! Application module - NarrativeApp and related functionality.
//!
//! Submodules:
//! - `run` - the per-frame eframe update (core pipeline + painting)
//! - `events` - bus event handling and navigation routing

mod events;
mod run;

use log::{debug, info};

use crate::cli::Args;
use crate::config::AppSettings;
use crate::core::easing::Easing;
use crate::core::event_bus::EventBus;
use crate::core::frame_loop::FrameLoop;
use crate::core::nav_intent::NavIntent;
use crate::core::progress::ProgressCell;
use crate::core::resolver::SectionResolver;
use crate::core::scroll::ScrollDriver;
use crate::core::timeline::{Channel, Timeline};
use crate::core::trigger::{
    AnchorSpec, SectionId, Trigger, TriggerHandle, TriggerScheduler, Viewport,
};
use crate::effects::{
    ParticleConfig, ParticleField, TunnelConfig, TunnelEffect, WarpOverlay,
};
use crate::sections::{NARRATIVE, SharedLayout};

/// Startup lock bookkeeping: the preloader holds the scroll lock, and a
/// safety ceiling force-releases it if the release path never runs.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LockGuard {
    pub locked_at_s: f64,
    /// Normal release point.
    pub release_at_s: f64,
    /// Hard ceiling; reaching it means the release path is stuck.
    pub max_s: f32,
}

/// Main application state.
pub struct NarrativeApp {
    pub settings: AppSettings,

    // Core pipeline
    pub(crate) driver: ScrollDriver,
    pub(crate) frame_loop: FrameLoop,
    pub(crate) sched: TriggerScheduler,
    pub(crate) nav: NavIntent,
    pub(crate) resolver: SectionResolver,
    pub(crate) bus: EventBus,
    pub(crate) layout: SharedLayout,

    // Effect consumers
    pub(crate) tunnel: TunnelEffect,
    pub(crate) starfield: ParticleField,
    pub(crate) warp: WarpOverlay,
    pub(crate) warp_trigger: TriggerHandle,

    // Section ids the painter needs to find effect chapters
    pub(crate) tunnel_section: SectionId,
    pub(crate) starfield_section: SectionId,

    // Runtime state
    pub(crate) current_section: Option<SectionId>,
    pub(crate) lock_guard: Option<LockGuard>,
    pub(crate) last_viewport: Viewport,
    pub(crate) pending_initial_jump: Option<SectionId>,
    pub(crate) is_fullscreen: bool,
    /// When the last programmatic jump was issued; drives the intent
    /// completion signal.
    pub(crate) last_jump_s: f64,
}

impl NarrativeApp {
    pub fn new(mut settings: AppSettings, args: &Args) -> Self {
        // CLI overrides win over persisted settings
        if args.no_smooth {
            settings.engine.smooth_wheel = false;
        }
        if args.no_preloader {
            settings.preloader = false;
        }
        if let Some(count) = args.particles {
            settings.particle_count = count;
        }

        let bus = EventBus::new();
        let layout = SharedLayout::new(NARRATIVE.clone());
        let mut sched = TriggerScheduler::new(Box::new(layout.clone()));
        let driver = ScrollDriver::init(settings.engine);
        if !driver.is_emulated() {
            info!("running on native-fallback scrolling");
        }

        let tunnel_cell = ProgressCell::new();
        let star_cell = ProgressCell::new();
        let (tunnel_section, starfield_section, warp_trigger) =
            mount_triggers(&mut sched, &tunnel_cell, &star_cell);

        let tunnel = TunnelEffect::new(
            TunnelConfig { ring_count: settings.ring_count, ..Default::default() },
            tunnel_cell,
        );
        let starfield = ParticleField::new(
            ParticleConfig { count: settings.particle_count, ..Default::default() },
            star_cell,
        );
        let warp = WarpOverlay::new(settings.warp_duration_s);

        let nav = NavIntent::with_bus(bus.clone());

        info!(
            "narrative up: {} sections, {} triggers",
            layout.sections().len(),
            sched.len()
        );

        Self {
            settings,
            driver,
            frame_loop: FrameLoop::new(),
            sched,
            nav,
            resolver: SectionResolver::new(),
            bus,
            layout,
            tunnel,
            starfield,
            warp,
            warp_trigger,
            tunnel_section,
            starfield_section,
            current_section: None,
            lock_guard: None,
            last_viewport: Viewport::default(),
            pending_initial_jump: args.section.as_deref().map(SectionId::new),
            is_fullscreen: args.fullscreen,
            last_jump_s: 0.0,
        }
    }

    /// Arm the startup preloader: scroll locked until release, with the
    /// stuck-lock ceiling from settings.
    pub(crate) fn arm_preloader(&mut self, now_s: f64) {
        if !self.settings.preloader || self.lock_guard.is_some() {
            return;
        }
        self.driver.stop();
        self.lock_guard = Some(LockGuard {
            locked_at_s: now_s,
            release_at_s: now_s + 0.9,
            max_s: self.settings.lock_guard_max_s,
        });
        debug!("preloader lock armed");
    }
}

/// Register the narrative's triggers and timelines. Returns the effect
/// chapter ids and the warp's trigger handle.
fn mount_triggers(
    sched: &mut TriggerScheduler,
    tunnel_cell: &ProgressCell,
    star_cell: &ProgressCell,
) -> (SectionId, SectionId, TriggerHandle) {
    // Hero title fades out as the page starts moving
    sched.register(
        Trigger {
            section: SectionId::new("hero"),
            anchor: AnchorSpec::SectionExtent,
            pin: false,
            reverse_on_exit: true,
        },
        Timeline::new()
            .step(Channel::Opacity, 1.0, 0.0, Easing::OutCubic)
            .step(Channel::Scale, 1.0, 0.85, Easing::OutCubic),
    );

    // Manifesto rises in once and stays (no reverse replay)
    sched.register(
        Trigger {
            section: SectionId::new("manifesto"),
            anchor: AnchorSpec::SectionExtent,
            pin: false,
            reverse_on_exit: false,
        },
        Timeline::new()
            .step_in(Channel::Opacity, 0.0, 1.0, Easing::OutCubic, (0.0, 0.5))
            .step_in(Channel::TranslateY, 120.0, 0.0, Easing::OutCubic, (0.0, 0.5)),
    );

    // Tunnel chapter: pinned scrub drives the tunnel camera
    let tunnel_section = SectionId::new("tunnel");
    sched.register_with_cell(
        Trigger {
            section: tunnel_section.clone(),
            anchor: AnchorSpec::SectionSpanVh { vh: 2.5 },
            pin: true,
            reverse_on_exit: true,
        },
        Timeline::new()
            .step(Channel::EffectDrive, 0.0, 1.0, Easing::Linear)
            .step_in(Channel::Opacity, 0.0, 1.0, Easing::OutCubic, (0.0, 0.15)),
        tunnel_cell.clone(),
    );

    // Starfield chapter: pinned scrub drives the star camera; the warp
    // overlay keys off this trigger's progress
    let starfield_section = SectionId::new("starfield");
    let warp_trigger = sched.register_with_cell(
        Trigger {
            section: starfield_section.clone(),
            anchor: AnchorSpec::SectionSpanVh { vh: 1.5 },
            pin: true,
            reverse_on_exit: true,
        },
        Timeline::new().step(Channel::EffectDrive, 0.0, 1.0, Easing::Linear),
        star_cell.clone(),
    );

    // Work reveals once and latches
    sched.register(
        Trigger {
            section: SectionId::new("work"),
            anchor: AnchorSpec::SectionExtent,
            pin: false,
            reverse_on_exit: false,
        },
        Timeline::new()
            .step_in(Channel::Opacity, 0.0, 1.0, Easing::OutCubic, (0.0, 0.4))
            .step_in(Channel::TranslateY, 90.0, 0.0, Easing::OutCubic, (0.0, 0.4)),
    );

    (tunnel_section, starfield_section, warp_trigger)
}
