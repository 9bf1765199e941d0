//! Section entry resolution for programmatic jumps.
//!
//! Jumping to a section's start is a layout lookup. Jumping into the
//! *interior* of a pinned/scrubbed section is not: the section's
//! timeline must first be forced to its completed state and the
//! scheduler remeasured, otherwise the computed offset is stale
//! relative to pre-jump layout.
//!
//! Sections mount asynchronously, so a missing anchor is retried across
//! frames with a bounded ceiling rather than failed immediately.

use log::{debug, warn};

use crate::core::events::NavTarget;
use crate::core::scroll::ScrollToOptions;
use crate::core::trigger::TriggerScheduler;

/// Frames a pending jump keeps retrying an unresolved anchor before
/// being dropped. ~3 seconds at 60fps.
const MAX_RETRY_FRAMES: u32 = 180;

/// Resolve a navigation target to a virtual offset, or `None` when the
/// anchor is not mounted yet.
///
/// `SectionInterior` mutates the scheduler: the target's timelines are
/// completed and anchor ranges remeasured before the offset is read.
pub fn resolve_target(sched: &mut TriggerScheduler, target: &NavTarget) -> Option<f32> {
    match target {
        NavTarget::Top => Some(0.0),
        NavTarget::Offset(offset) => Some(*offset),
        NavTarget::Section(id) => sched.probe().measure(id).map(|m| m.top),
        NavTarget::SectionInterior(id) => {
            // Completed state first, then remeasure, then read - the
            // offset must reflect post-reveal layout.
            sched.complete_section(id);
            sched.remeasure();
            let pin_end = sched
                .registrations()
                .filter(|r| r.section == id && r.pin)
                .filter_map(|r| r.range)
                .last()
                .map(|range| range.end());
            match pin_end {
                Some(end) => Some(end),
                None => sched.probe().measure(id).map(|m| m.top),
            }
        }
    }
}

#[derive(Debug)]
struct PendingJump {
    target: NavTarget,
    opts: ScrollToOptions,
    attempts: u32,
}

/// Frame-retried navigation resolution. One pending jump at a time; a
/// new request supersedes (and thereby cancels) the old one.
#[derive(Debug, Default)]
pub struct SectionResolver {
    pending: Option<PendingJump>,
}

impl SectionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a jump for resolution. Supersedes any pending jump.
    pub fn request(&mut self, target: NavTarget, opts: ScrollToOptions) {
        if let Some(old) = &self.pending {
            debug!("pending jump to {:?} superseded by {:?}", old.target, target);
        }
        self.pending = Some(PendingJump { target, opts, attempts: 0 });
    }

    /// Drop the pending jump, if any.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Try to resolve the pending jump. Returns the resolved offset and
    /// options once the anchor is measurable; keeps retrying across
    /// frames until the ceiling, then drops the jump with a warning.
    pub fn tick(&mut self, sched: &mut TriggerScheduler) -> Option<(f32, ScrollToOptions)> {
        let pending = self.pending.as_mut()?;

        if let Some(offset) = resolve_target(sched, &pending.target) {
            let opts = pending.opts;
            debug!(
                "jump to {:?} resolved at {:.1}px after {} retries",
                pending.target, offset, pending.attempts
            );
            self.pending = None;
            return Some((offset, opts));
        }

        pending.attempts += 1;
        if pending.attempts >= MAX_RETRY_FRAMES {
            warn!(
                "jump to {:?} dropped: anchor unresolved after {} frames",
                pending.target, pending.attempts
            );
            self.pending = None;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::easing::Easing;
    use crate::core::timeline::{Channel, Timeline};
    use crate::core::trigger::{
        AnchorSpec, LayoutProbe, SectionId, SectionMetrics, Trigger, Viewport,
    };
    use std::collections::HashMap;

    struct MapProbe {
        sections: HashMap<SectionId, SectionMetrics>,
    }

    impl MapProbe {
        fn new() -> Self {
            Self { sections: HashMap::new() }
        }

        fn with(mut self, id: &str, top: f32, height: f32) -> Self {
            self.sections.insert(SectionId::new(id), SectionMetrics { top, height });
            self
        }
    }

    impl LayoutProbe for MapProbe {
        fn measure(&self, id: &SectionId) -> Option<SectionMetrics> {
            self.sections.get(id).copied()
        }
        fn viewport(&self) -> Viewport {
            Viewport { width: 1280.0, height: 800.0 }
        }
        fn content_len(&self) -> f32 {
            10_000.0
        }
    }

    fn pinned_section_sched() -> TriggerScheduler {
        let probe = MapProbe::new().with("tunnel", 2000.0, 800.0);
        let mut sched = TriggerScheduler::new(Box::new(probe));
        sched.register(
            Trigger {
                section: SectionId::new("tunnel"),
                anchor: AnchorSpec::SectionSpan { span: 1200.0 },
                pin: true,
                reverse_on_exit: true,
            },
            Timeline::new().step(Channel::Opacity, 0.0, 1.0, Easing::Linear),
        );
        sched
    }

    #[test]
    fn test_resolve_top_and_offset() {
        let mut sched = pinned_section_sched();
        assert_eq!(resolve_target(&mut sched, &NavTarget::Top), Some(0.0));
        assert_eq!(resolve_target(&mut sched, &NavTarget::Offset(420.0)), Some(420.0));
    }

    #[test]
    fn test_resolve_section_start() {
        let mut sched = pinned_section_sched();
        let offset = resolve_target(&mut sched, &NavTarget::Section(SectionId::new("tunnel")));
        assert_eq!(offset, Some(2000.0));
    }

    #[test]
    fn test_resolve_interior_lands_past_scrub_span() {
        let mut sched = pinned_section_sched();
        let target = NavTarget::SectionInterior(SectionId::new("tunnel"));
        let offset = resolve_target(&mut sched, &target);
        // Past the pin's scrub span, with the timeline completed
        assert_eq!(offset, Some(3200.0));

        let view = sched.registrations().next().unwrap();
        assert_eq!(view.progress, 1.0);
        assert_eq!(view.values[&Channel::Opacity], 1.0);
    }

    #[test]
    fn test_missing_anchor_retries_then_resolves() {
        let mut sched = TriggerScheduler::new(Box::new(MapProbe::new()));
        let mut resolver = SectionResolver::new();
        resolver.request(
            NavTarget::Section(SectionId::new("contact")),
            ScrollToOptions::default(),
        );

        // Section not mounted: no resolution, jump stays pending
        assert!(resolver.tick(&mut sched).is_none());
        assert!(resolver.is_pending());

        // Section mounts; the retry resolves
        let mut sched = TriggerScheduler::new(Box::new(MapProbe::new().with("contact", 7000.0, 600.0)));
        let (offset, _) = resolver.tick(&mut sched).expect("resolved after mount");
        assert_eq!(offset, 7000.0);
        assert!(!resolver.is_pending());
    }

    #[test]
    fn test_retry_bounded_then_dropped() {
        let mut sched = TriggerScheduler::new(Box::new(MapProbe::new()));
        let mut resolver = SectionResolver::new();
        resolver.request(
            NavTarget::Section(SectionId::new("ghost")),
            ScrollToOptions::default(),
        );

        for _ in 0..MAX_RETRY_FRAMES {
            assert!(resolver.tick(&mut sched).is_none());
        }
        // Ceiling reached: dropped, not retried forever
        assert!(!resolver.is_pending());
    }

    #[test]
    fn test_new_request_supersedes_pending() {
        let mut resolver = SectionResolver::new();
        resolver.request(NavTarget::Section(SectionId::new("a")), ScrollToOptions::default());
        resolver.request(NavTarget::Top, ScrollToOptions::default());

        let mut sched = TriggerScheduler::new(Box::new(MapProbe::new()));
        let (offset, _) = resolver.tick(&mut sched).unwrap();
        assert_eq!(offset, 0.0);
    }
}
