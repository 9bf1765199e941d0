//! Main application loop - eframe::App implementation.
//!
//! One update() per host frame:
//! 1. Resize detection -> relayout + remeasure + engine bounds
//! 2. Preloader lock release (with the stuck-lock ceiling)
//! 3. Input -> scroll driver
//! 4. Core pipeline via the frame loop (scroll -> timelines -> effects)
//! 5. Bus events and pending navigation
//! 6. Painting from this frame's outputs

use eframe::egui;
use log::{info, warn};

use super::NarrativeApp;
use crate::core::events::{NavTarget, ScrollToRequested, SectionChanged, ViewportResized};
use crate::core::frame_loop::{FramePipeline, FrameTick};
use crate::core::nav_intent::NavIntent;
use crate::core::scroll::{ScrollDriver, ScrollState, ScrollToOptions};
use crate::core::trigger::{TriggerHandle, TriggerScheduler, Viewport};
use crate::effects::{EffectConsumer, ParticleField, TunnelEffect, WarpOverlay};
use crate::widgets::navbar::{NavAction, render_navbar};
use crate::widgets::viewport::{NarrativeFrame, render_narrative};

/// The fixed-order core pipeline over the app's components. Built
/// fresh each frame from disjoint field borrows.
struct CorePipeline<'a> {
    driver: &'a mut ScrollDriver,
    sched: &'a mut TriggerScheduler,
    nav: &'a mut NavIntent,
    tunnel: &'a mut TunnelEffect,
    starfield: &'a mut ParticleField,
    warp: &'a mut WarpOverlay,
    warp_trigger: TriggerHandle,
    /// This frame's scroll snapshot, captured in the Scroll phase.
    scroll: ScrollState,
}

impl FramePipeline for CorePipeline<'_> {
    fn scroll(&mut self, tick: &FrameTick) {
        self.nav.tick(tick.now_s);
        self.scroll = self.driver.tick(tick.now_s);
    }

    fn timelines(&mut self, tick: &FrameTick) {
        self.sched.update(tick, self.scroll);
    }

    fn effects(&mut self, tick: &FrameTick) {
        self.tunnel.advance(tick);
        self.starfield.advance(tick);

        // Intent is sampled at the moment the warp's trigger would fire
        let progress = self.sched.progress_of(self.warp_trigger).unwrap_or(0.0);
        let navigating = self.nav.is_navigating(tick.now_s);
        self.warp.update(tick, progress, navigating);
    }
}

impl eframe::App for NarrativeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now_s = ctx.input(|i| i.time);
        let first_frame = self.frame_loop.frame().0 == 0;

        if first_frame && self.is_fullscreen {
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(true));
        }

        // Resize contract: relayout, remeasure anchor ranges, recompute
        // engine bounds. Stale ranges are stale pins.
        let rect = ctx.screen_rect();
        let viewport = Viewport { width: rect.width(), height: rect.height() };
        if (viewport.width - self.last_viewport.width).abs() > 0.5
            || (viewport.height - self.last_viewport.height).abs() > 0.5
        {
            self.last_viewport = viewport;
            self.layout.relayout(viewport);
            self.sched.remeasure();
            self.driver.set_bounds(self.layout.max_scroll());
            self.bus.emit(ViewportResized { viewport });
        }

        if first_frame {
            self.arm_preloader(now_s);
            if let Some(id) = self.pending_initial_jump.take() {
                self.bus.emit(ScrollToRequested {
                    target: NavTarget::Section(id),
                    opts: ScrollToOptions { immediate: true, ..Default::default() },
                });
            }
        }

        // Preloader release, with the stuck-lock ceiling as backstop
        if let Some(guard) = self.lock_guard {
            if now_s >= guard.release_at_s {
                self.driver.start();
                self.lock_guard = None;
                info!("preloader released");
            } else if (now_s - guard.locked_at_s) as f32 >= guard.max_s {
                warn!("scroll lock held past {}s ceiling, force releasing", guard.max_s);
                self.driver.start();
                self.lock_guard = None;
            }
        }

        // Input. The driver itself drops input while locked.
        let (raw_delta, touching) = ctx.input(|i| (i.raw_scroll_delta, i.any_touches()));
        let scroll_delta = match self.settings.engine.orientation {
            crate::core::scroll::Orientation::Vertical => raw_delta.y,
            crate::core::scroll::Orientation::Horizontal => raw_delta.x,
        };
        if scroll_delta != 0.0 {
            // Wheel-down means forward through the narrative
            let delta = -scroll_delta;
            if touching {
                self.driver.touch(delta, now_s);
            } else {
                self.driver.wheel(delta, now_s);
            }
        }
        self.handle_keyboard(ctx);

        // Core pipeline: scroll -> timelines -> effects, fixed order
        let mut pipeline = CorePipeline {
            driver: &mut self.driver,
            sched: &mut self.sched,
            nav: &mut self.nav,
            tunnel: &mut self.tunnel,
            starfield: &mut self.starfield,
            warp: &mut self.warp,
            warp_trigger: self.warp_trigger,
            scroll: ScrollState::default(),
        };
        self.frame_loop.run_frame(now_s, &mut pipeline);
        let scroll = pipeline.scroll;

        // Bus events + pending navigation
        self.handle_events(now_s);

        // Section-changed detection at the rendered offset
        let render_offset = self.sched.render_offset(scroll.offset);
        if let Some(section) = self.layout.section_at(render_offset) {
            if self.current_section.as_ref() != Some(&section) {
                self.bus.emit(SectionChanged { section: section.clone() });
                self.current_section = Some(section);
            }
        }

        // Navbar
        let sections = self.layout.sections();
        let current = self.current_section.clone();
        let mut nav_action = NavAction::None;
        egui::TopBottomPanel::top("navbar").show(ctx, |ui| {
            nav_action = render_navbar(ui, &sections, current.as_ref());
        });
        self.handle_nav_action(nav_action);

        // Narrative viewport
        let max_scroll = self.layout.max_scroll().max(1.0);
        let frame_data = NarrativeFrame {
            layout: &self.layout,
            sched: &self.sched,
            render_offset,
            tunnel: &self.tunnel,
            tunnel_section: &self.tunnel_section,
            starfield: &self.starfield,
            starfield_section: &self.starfield_section,
            warp: &self.warp,
            now_s,
            scroll_fraction: scroll.offset / max_scroll,
            show_progress_bar: self.settings.show_progress_bar,
        };
        let preloading = self.lock_guard.is_some();
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                render_narrative(ui, &frame_data);
                if preloading {
                    let rect = ui.max_rect();
                    ui.painter()
                        .rect_filled(rect, 0.0, egui::Color32::from_black_alpha(180));
                    ui.painter().text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        "warming up…",
                        egui::FontId::proportional(18.0),
                        egui::Color32::from_gray(180),
                    );
                }
            });

        // The narrative animates continuously while anything moves
        ctx.request_repaint();
    }

    fn save(&mut self, _storage: &mut dyn eframe::Storage) {
        if let Err(e) = self.settings.save() {
            warn!("failed to persist settings: {e:#}");
        }
    }
}

impl NarrativeApp {
    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        let (home, end, fullscreen) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Home),
                i.key_pressed(egui::Key::End),
                i.key_pressed(egui::Key::F11),
            )
        });

        if home {
            self.bus.emit(ScrollToRequested {
                target: NavTarget::Top,
                opts: ScrollToOptions::default(),
            });
        }
        if end {
            self.bus.emit(ScrollToRequested {
                target: NavTarget::Offset(self.layout.max_scroll()),
                opts: ScrollToOptions::default(),
            });
        }
        if fullscreen {
            self.is_fullscreen = !self.is_fullscreen;
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(self.is_fullscreen));
        }
    }
}
