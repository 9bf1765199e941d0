//! Event handling for NarrativeApp.
//!
//! All programmatic navigation funnels through here: UI actions become
//! `ScrollToRequested` events, which arm the navigation intent arbiter
//! and queue resolution; resolved jumps move the scroll driver.

use log::{debug, trace};

use super::NarrativeApp;
use crate::core::event_bus::downcast_event;
use crate::core::events::{NavIntentChanged, NavTarget, ScrollToRequested, SectionChanged, ViewportResized};
use crate::core::scroll::ScrollToOptions;
use crate::widgets::navbar::NavAction;

/// Quiet period after a jump lands before intent is considered
/// complete. Covers the frame(s) triggers need to re-derive state at
/// the new offset.
const JUMP_SETTLE_GRACE_S: f64 = 0.25;

impl NarrativeApp {
    /// Drain the bus and drive pending navigation. Runs once per frame
    /// after the core pipeline.
    pub(crate) fn handle_events(&mut self, now_s: f64) {
        for event in self.bus.poll() {
            if let Some(e) = downcast_event::<ScrollToRequested>(&event) {
                debug!("scroll-to requested: {:?}", e.target);
                // Intent first, so effects crossing regions during the
                // jump see it from the very next frame
                self.nav.set_navigating(true, now_s);
                self.resolver.request(e.target.clone(), e.opts);
                continue;
            }
            if let Some(e) = downcast_event::<NavIntentChanged>(&event) {
                trace!("navigation intent -> {}", e.active);
                continue;
            }
            if let Some(e) = downcast_event::<SectionChanged>(&event) {
                debug!("section -> {}", e.section);
                continue;
            }
            if let Some(e) = downcast_event::<ViewportResized>(&event) {
                trace!(
                    "viewport resized to {:.0}x{:.0}",
                    e.viewport.width, e.viewport.height
                );
                continue;
            }
        }

        // Pending jump resolution (missing anchors retry inside, with a
        // bounded ceiling)
        if let Some((offset, opts)) = self.resolver.tick(&mut self.sched) {
            self.driver.scroll_to(offset, &opts, now_s);
            self.last_jump_s = now_s;
        }

        // Completion signal: the jump landed, nothing pending, and the
        // grace window passed - clear intent instead of waiting out the
        // expiry ceiling
        if self.nav.is_navigating(now_s)
            && !self.resolver.is_pending()
            && self.driver.is_settled()
            && now_s - self.last_jump_s > JUMP_SETTLE_GRACE_S
        {
            self.nav.set_navigating(false, now_s);
        }
    }

    /// Route a navbar interaction onto the bus.
    pub(crate) fn handle_nav_action(&mut self, action: NavAction) {
        let target = match action {
            NavAction::None => return,
            NavAction::Jump(id) => NavTarget::Section(id),
            NavAction::JumpInterior(id) => NavTarget::SectionInterior(id),
            NavAction::BackToTop => NavTarget::Top,
        };
        self.bus.emit(ScrollToRequested {
            target,
            opts: ScrollToOptions::default(),
        });
    }
}
