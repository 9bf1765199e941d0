//! Navigation intent arbiter.
//!
//! A single injectable flag distinguishing "the user is scrolling
//! organically" from "a jump was just programmatically initiated".
//! One-shot transition effects check it at the moment their trigger
//! fires and skip playback while it is set, so a menu click that jumps
//! far down the page does not replay every transition it skipped over.
//!
//! The flag self-expires after a bounded ceiling regardless of whether
//! the navigation completed cleanly - a caller that forgets to clear it
//! must not suppress organic-scroll effects forever.

use log::trace;

use crate::core::event_bus::EventBus;
use crate::core::events::NavIntentChanged;

/// Hard ceiling on how long intent can stay active, seconds.
pub const INTENT_CEILING_S: f64 = 2.0;

/// Process-wide navigation intent, held by the app and passed by
/// reference. Instantiable, so tests get independent instances.
pub struct NavIntent {
    active: bool,
    expires_at: Option<f64>,
    bus: Option<EventBus>,
}

impl NavIntent {
    pub fn new() -> Self {
        Self {
            active: false,
            expires_at: None,
            bus: None,
        }
    }

    /// Announce flips as [`NavIntentChanged`] on the bus.
    pub fn with_bus(bus: EventBus) -> Self {
        Self {
            active: false,
            expires_at: None,
            bus: Some(bus),
        }
    }

    /// Set or clear intent. Setting while already active re-arms the
    /// expiry deadline (debounce) instead of stacking a second window.
    pub fn set_navigating(&mut self, active: bool, now_s: f64) {
        if active {
            let was_active = self.active;
            self.active = true;
            self.expires_at = Some(now_s + INTENT_CEILING_S);
            if !was_active {
                trace!("navigation intent armed, expires in {INTENT_CEILING_S}s");
                self.announce(true);
            } else {
                trace!("navigation intent re-armed");
            }
        } else {
            self.expires_at = None;
            if self.active {
                self.active = false;
                trace!("navigation intent cleared");
                self.announce(false);
            }
        }
    }

    /// Pure read. Honors the expiry deadline even if `tick` has not run
    /// yet this frame, so a late reader never sees a stale `true`.
    pub fn is_navigating(&self, now_s: f64) -> bool {
        self.active && self.expires_at.is_some_and(|deadline| now_s < deadline)
    }

    /// Apply expiry. Called once per frame by the app.
    pub fn tick(&mut self, now_s: f64) {
        if self.active && self.expires_at.is_some_and(|deadline| now_s >= deadline) {
            self.active = false;
            self.expires_at = None;
            trace!("navigation intent expired");
            self.announce(false);
        }
    }

    fn announce(&self, active: bool) {
        if let Some(bus) = &self.bus {
            bus.emit(NavIntentChanged { active });
        }
    }
}

impl Default for NavIntent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_bus::downcast_event;

    #[test]
    fn test_set_and_clear() {
        let mut intent = NavIntent::new();
        assert!(!intent.is_navigating(0.0));

        intent.set_navigating(true, 0.0);
        assert!(intent.is_navigating(0.1));

        intent.set_navigating(false, 0.2);
        assert!(!intent.is_navigating(0.2));
    }

    #[test]
    fn test_self_expires_after_ceiling() {
        let mut intent = NavIntent::new();
        intent.set_navigating(true, 10.0);

        // Just inside the window
        intent.tick(11.9);
        assert!(intent.is_navigating(11.9));

        // Past the ceiling: expired with no explicit clear
        intent.tick(12.01);
        assert!(!intent.is_navigating(12.01));
    }

    #[test]
    fn test_pure_read_honors_deadline_without_tick() {
        let mut intent = NavIntent::new();
        intent.set_navigating(true, 0.0);
        // No tick ran, the read alone must not report stale intent
        assert!(!intent.is_navigating(5.0));
    }

    #[test]
    fn test_rearm_resets_deadline_not_stacked() {
        let mut intent = NavIntent::new();
        intent.set_navigating(true, 0.0);
        intent.set_navigating(true, 1.5); // debounce: deadline moves to 3.5

        intent.tick(2.5);
        assert!(intent.is_navigating(2.5), "re-arm extended the window");
        intent.tick(3.6);
        assert!(!intent.is_navigating(3.6));
    }

    #[test]
    fn test_announces_transitions_once() {
        let bus = EventBus::new();
        let mut intent = NavIntent::with_bus(bus.clone());

        intent.set_navigating(true, 0.0);
        intent.set_navigating(true, 0.5); // re-arm, no second announcement
        intent.tick(1.0);
        intent.set_navigating(false, 1.2);

        let flips: Vec<bool> = bus
            .poll()
            .iter()
            .filter_map(|e| downcast_event::<NavIntentChanged>(e).map(|c| c.active))
            .collect();
        assert_eq!(flips, vec![true, false]);
    }
}
