//! Scroll-linked timeline scheduler.
//!
//! Sections register (trigger-region, timeline) pairs; every frame the
//! scheduler recomputes each trigger's progress from the virtual offset,
//! scrubs the timeline, and maintains pin bookkeeping. Layout is only
//! reached through the injected [`LayoutProbe`], so anchor math is
//! mockable and never hard-codes a traversal shape.
//!
//! # Pinning model
//!
//! A pinned trigger consumes scroll distance: while the offset moves
//! through its anchor range, the rendered page translation holds at the
//! range start and the timeline scrubs instead. The mapping is
//!
//! ```text
//! render_offset(v) = v - sum over pins of clamp(v - pin.start, 0, pin.len)
//! ```
//!
//! which is exactly "the section stays at the viewport boundary while
//! its scrub span is consumed, then native motion resumes".
//!
//! # Overlapping pin ranges
//!
//! When two pinned ranges overlap and both are mid-scrub, the
//! later-registered trigger owns the pin ([`pin_owner`]). This is a
//! documented constraint on section authors - do not overlap pin
//! ranges - not an arbitration the scheduler tries to get clever about.
//!
//! [`pin_owner`]: TriggerScheduler::pin_owner

use indexmap::IndexMap;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::frame_loop::{FrameTick, Phase};
use crate::core::progress::ProgressCell;
use crate::core::scroll::ScrollState;
use crate::core::timeline::{Channel, ChannelValues, Timeline};

/// Stable section identifier - the anchor contract. Renaming an id is a
/// breaking change for stored navigation links.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionId(String);

impl SectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Measured placement of a section in content space, px.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectionMetrics {
    pub top: f32,
    pub height: f32,
}

/// Host viewport, px.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

/// Layout measurement capability injected into the scheduler.
///
/// Sections mount asynchronously; `measure` returning `None` is a normal
/// transient, and the scheduler re-resolves on later frames.
pub trait LayoutProbe {
    fn measure(&self, id: &SectionId) -> Option<SectionMetrics>;
    fn viewport(&self) -> Viewport;
    /// Total scrollable content length, including pin scrub spans.
    fn content_len(&self) -> f32;
}

/// Resolved anchor range in content space. Invariant: `start < end`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorRange {
    start: f32,
    end: f32,
}

impl AnchorRange {
    /// Build a validated range; a degenerate or inverted range is
    /// rejected, not clamped into something plausible.
    pub fn new(start: f32, end: f32) -> Option<Self> {
        if start.is_finite() && end.is_finite() && start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn start(&self) -> f32 {
        self.start
    }

    pub fn end(&self) -> f32 {
        self.end
    }

    pub fn len(&self) -> f32 {
        self.end - self.start
    }

    /// Progress fraction of `offset` through this range, clamped to
    /// [0,1] even when a fast jump lands the offset far outside.
    pub fn progress(&self, offset: f32) -> f32 {
        ((offset - self.start) / self.len()).clamp(0.0, 1.0)
    }

    pub fn contains(&self, offset: f32) -> bool {
        offset >= self.start && offset <= self.end
    }
}

/// How a trigger's anchor range is derived from layout. Kept as a rule
/// (not a resolved range) so remeasure can recompute after resize.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnchorSpec {
    /// Fixed content-space offsets; unaffected by remeasure.
    Absolute { start: f32, end: f32 },
    /// From the section's measured top, spanning `span` px. The usual
    /// shape for pinned scrub ranges.
    SectionSpan { span: f32 },
    /// Like `SectionSpan`, but in viewport heights so the range follows
    /// window size across remeasures.
    SectionSpanVh { vh: f32 },
    /// From the section's top through its full measured height.
    SectionExtent,
}

/// Trigger configuration registered alongside a timeline.
#[derive(Clone, Debug)]
pub struct Trigger {
    pub section: SectionId,
    pub anchor: AnchorSpec,
    /// Hold the section at the viewport boundary while the timeline
    /// scrubs through the anchor range.
    pub pin: bool,
    /// Replay the timeline in reverse when scrolling back out. When
    /// false the timeline latches at its furthest progress.
    pub reverse_on_exit: bool,
}

/// Opaque handle returned by [`TriggerScheduler::register`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TriggerHandle(Uuid);

struct Registration {
    trigger: Trigger,
    timeline: Timeline,
    /// None until the section mounts and the probe can measure it.
    range: Option<AnchorRange>,
    progress: f32,
    /// Furthest progress reached; drives non-reversing triggers.
    latched: f32,
    cell: Option<ProgressCell>,
    values: ChannelValues,
}

impl Registration {
    fn effective_progress(&self) -> f32 {
        if self.trigger.reverse_on_exit {
            self.progress
        } else {
            self.latched
        }
    }
}

/// Read-only view over one registration, for painters and diagnostics.
pub struct RegistrationView<'a> {
    pub handle: TriggerHandle,
    pub section: &'a SectionId,
    pub values: &'a ChannelValues,
    pub progress: f32,
    pub pin: bool,
    pub range: Option<AnchorRange>,
}

/// Scroll-linked timeline scheduler. One per narrative.
pub struct TriggerScheduler {
    probe: Box<dyn LayoutProbe>,
    regs: IndexMap<Uuid, Registration>,
}

impl TriggerScheduler {
    pub fn new(probe: Box<dyn LayoutProbe>) -> Self {
        Self {
            probe,
            regs: IndexMap::new(),
        }
    }

    /// Register a trigger with its timeline. Registration order is
    /// semantic: overlapping pins resolve last-registered-wins.
    pub fn register(&mut self, trigger: Trigger, timeline: Timeline) -> TriggerHandle {
        self.register_inner(trigger, timeline, None)
    }

    /// Register a trigger whose timeline also drives a progress cell.
    /// The cell's `value` follows the timeline's `EffectDrive` channel
    /// when present, the trigger progress otherwise. Exactly one
    /// trigger may drive a given cell.
    pub fn register_with_cell(
        &mut self,
        trigger: Trigger,
        timeline: Timeline,
        cell: ProgressCell,
    ) -> TriggerHandle {
        self.register_inner(trigger, timeline, Some(cell))
    }

    fn register_inner(
        &mut self,
        trigger: Trigger,
        timeline: Timeline,
        cell: Option<ProgressCell>,
    ) -> TriggerHandle {
        let id = Uuid::new_v4();
        let entry_values = timeline.entry_values();
        let mut reg = Registration {
            trigger,
            timeline,
            range: None,
            progress: 0.0,
            latched: 0.0,
            cell,
            values: entry_values,
        };
        reg.range = self.resolve_range(&reg.trigger);
        if reg.range.is_none() {
            // Section not mounted yet; resolution retries each frame
            trace!("trigger for '{}' registered before mount, range deferred", reg.trigger.section);
        }
        debug!(
            "trigger registered: section='{}' pin={} range={:?}",
            reg.trigger.section, reg.trigger.pin, reg.range
        );
        self.regs.insert(id, reg);
        TriggerHandle(id)
    }

    /// Detach a trigger. A pin held by it is released on the next
    /// render-offset query - pin state is derived, never stored.
    pub fn unregister(&mut self, handle: TriggerHandle) {
        if let Some(reg) = self.regs.shift_remove(&handle.0) {
            debug!("trigger unregistered: section='{}'", reg.trigger.section);
        }
    }

    fn resolve_range(&self, trigger: &Trigger) -> Option<AnchorRange> {
        let range = match trigger.anchor {
            AnchorSpec::Absolute { start, end } => AnchorRange::new(start, end),
            AnchorSpec::SectionSpan { span } => {
                let m = self.probe.measure(&trigger.section)?;
                AnchorRange::new(m.top, m.top + span)
            }
            AnchorSpec::SectionSpanVh { vh } => {
                let m = self.probe.measure(&trigger.section)?;
                AnchorRange::new(m.top, m.top + vh * self.probe.viewport().height)
            }
            AnchorSpec::SectionExtent => {
                let m = self.probe.measure(&trigger.section)?;
                AnchorRange::new(m.top, m.top + m.height)
            }
        };
        if range.is_none() {
            warn!(
                "trigger for '{}' has a degenerate anchor range ({:?}), ignoring",
                trigger.section, trigger.anchor
            );
        }
        range
    }

    /// Recompute every trigger's anchor range from the probe. Call on
    /// viewport resize - stale ranges are stale pins.
    pub fn remeasure(&mut self) {
        let specs: Vec<(Uuid, Trigger)> = self
            .regs
            .iter()
            .map(|(id, r)| (*id, r.trigger.clone()))
            .collect();
        for (id, trigger) in specs {
            let range = self.resolve_range(&trigger);
            if let Some(reg) = self.regs.get_mut(&id) {
                reg.range = range;
            }
        }
        debug!("remeasured {} triggers", self.regs.len());
    }

    /// Per-frame update: recompute progress, scrub timelines, write
    /// bound progress cells. Timelines phase only.
    pub fn update(&mut self, tick: &FrameTick, scroll: ScrollState) {
        debug_assert!(
            tick.phase == Phase::Timelines,
            "trigger scheduler runs in the Timelines phase, got {:?}",
            tick.phase
        );

        // Speed for effect consumers: screens per second, unsigned.
        let viewport_h = self.probe.viewport().height.max(1.0);
        let speed = scroll.velocity.abs() / viewport_h;

        // Late-mounting sections: retry unresolved ranges. Absolute
        // anchors never resolve differently, so a rejected one is not
        // retried (it already warned at registration).
        let unresolved: Vec<Uuid> = self
            .regs
            .iter()
            .filter(|(_, r)| {
                r.range.is_none() && !matches!(r.trigger.anchor, AnchorSpec::Absolute { .. })
            })
            .map(|(id, _)| *id)
            .collect();
        for id in unresolved {
            if let Some(trigger) = self.regs.get(&id).map(|r| r.trigger.clone()) {
                let range = self.resolve_range(&trigger);
                if let Some(reg) = self.regs.get_mut(&id) {
                    if range.is_some() {
                        trace!("trigger for '{}' resolved late: {:?}", reg.trigger.section, range);
                    }
                    reg.range = range;
                }
            }
        }

        for reg in self.regs.values_mut() {
            let Some(range) = reg.range else { continue };
            reg.progress = range.progress(scroll.offset);
            reg.latched = reg.latched.max(reg.progress);

            let effective = reg.effective_progress();
            reg.timeline.sample_into(effective, &mut reg.values);

            if let Some(cell) = &reg.cell {
                let drive = reg
                    .values
                    .get(&Channel::EffectDrive)
                    .copied()
                    .unwrap_or(effective);
                cell.write(drive, speed, tick);
            }
        }
    }

    /// Scroll distance consumed by pin scrubs at `offset`.
    fn consumed(&self, offset: f32) -> f32 {
        self.regs
            .values()
            .filter(|r| r.trigger.pin)
            .filter_map(|r| r.range)
            .map(|range| (offset - range.start).clamp(0.0, range.len()))
            .sum()
    }

    /// Map the virtual offset to the rendered page translation. Pinned
    /// sections hold still because their scrub span is subtracted.
    pub fn render_offset(&self, offset: f32) -> f32 {
        offset - self.consumed(offset)
    }

    /// The trigger currently holding the pin: the last-registered
    /// pinned trigger whose progress is strictly inside (0,1).
    pub fn pin_owner(&self) -> Option<TriggerHandle> {
        self.regs
            .iter()
            .filter(|(_, r)| r.trigger.pin && r.progress > 0.0 && r.progress < 1.0)
            .map(|(id, _)| TriggerHandle(*id))
            .last()
    }

    /// Force a section's timelines to their completed state and latch
    /// them there. Used by section resolvers before computing interior
    /// jump offsets; values are consistent immediately, cells follow on
    /// the next frame.
    pub fn complete_section(&mut self, section: &SectionId) {
        for reg in self.regs.values_mut() {
            if &reg.trigger.section == section {
                reg.progress = 1.0;
                reg.latched = 1.0;
                reg.timeline.sample_into(1.0, &mut reg.values);
            }
        }
    }

    pub fn progress_of(&self, handle: TriggerHandle) -> Option<f32> {
        self.regs.get(&handle.0).map(|r| r.effective_progress())
    }

    pub fn range_of(&self, handle: TriggerHandle) -> Option<AnchorRange> {
        self.regs.get(&handle.0).and_then(|r| r.range)
    }

    /// All registrations in registration order, for painting.
    pub fn registrations(&self) -> impl Iterator<Item = RegistrationView<'_>> {
        self.regs.iter().map(|(id, r)| RegistrationView {
            handle: TriggerHandle(*id),
            section: &r.trigger.section,
            values: &r.values,
            progress: r.effective_progress(),
            pin: r.trigger.pin,
            range: r.range,
        })
    }

    pub fn probe(&self) -> &dyn LayoutProbe {
        self.probe.as_ref()
    }

    pub fn probe_mut(&mut self) -> &mut dyn LayoutProbe {
        self.probe.as_mut()
    }

    /// Total scrollable length, for the engine's bounds.
    pub fn content_len(&self) -> f32 {
        self.probe.content_len()
    }

    pub fn len(&self) -> usize {
        self.regs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::easing::Easing;
    use crate::core::frame_loop::FrameStamp;
    use std::collections::HashMap;

    struct MapProbe {
        sections: HashMap<SectionId, SectionMetrics>,
        viewport: Viewport,
        content_len: f32,
    }

    impl MapProbe {
        fn new() -> Self {
            Self {
                sections: HashMap::new(),
                viewport: Viewport { width: 1280.0, height: 800.0 },
                content_len: 10_000.0,
            }
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
            self.viewport
        }
        fn content_len(&self) -> f32 {
            self.content_len
        }
    }

    fn tick(frame: u64) -> FrameTick {
        FrameTick {
            frame: FrameStamp(frame),
            now_s: frame as f64 / 60.0,
            dt_s: 1.0 / 60.0,
            phase: Phase::Timelines,
        }
    }

    fn scroll_at(offset: f32) -> ScrollState {
        ScrollState { offset, velocity: 0.0, locked: false }
    }

    fn absolute(section: &str, start: f32, end: f32, pin: bool) -> Trigger {
        Trigger {
            section: SectionId::new(section),
            anchor: AnchorSpec::Absolute { start, end },
            pin,
            reverse_on_exit: true,
        }
    }

    fn fade() -> Timeline {
        Timeline::new().step(Channel::Opacity, 0.0, 1.0, Easing::Linear)
    }

    #[test]
    fn test_progress_endpoints_and_midpoint() {
        let mut sched = TriggerScheduler::new(Box::new(MapProbe::new()));
        let h = sched.register(absolute("hero", 1000.0, 3000.0, false), fade());

        for (offset, expected) in [(1000.0, 0.0), (2000.0, 0.5), (3000.0, 1.0)] {
            sched.update(&tick(1), scroll_at(offset));
            assert_eq!(sched.progress_of(h), Some(expected), "offset {offset}");
        }
    }

    #[test]
    fn test_progress_monotonic_and_clamped() {
        let mut sched = TriggerScheduler::new(Box::new(MapProbe::new()));
        let h = sched.register(absolute("hero", 1000.0, 3000.0, false), fade());

        let mut prev = -1.0;
        for i in 0..100 {
            let offset = 500.0 + i as f32 * 40.0; // sweeps past both ends
            sched.update(&tick(i), scroll_at(offset));
            let p = sched.progress_of(h).unwrap();
            assert!((0.0..=1.0).contains(&p));
            assert!(p >= prev, "not monotonic at offset {offset}");
            prev = p;
        }
    }

    #[test]
    fn test_midpoint_property_value() {
        // Anchor [1000, 3000], offset 2000 -> progress 0.5 -> opacity 0.5
        let mut sched = TriggerScheduler::new(Box::new(MapProbe::new()));
        sched.register(absolute("hero", 1000.0, 3000.0, false), fade());
        sched.update(&tick(1), scroll_at(2000.0));

        let view = sched.registrations().next().unwrap();
        assert_eq!(view.values[&Channel::Opacity], 0.5);
    }

    #[test]
    fn test_pin_consumes_scroll_distance() {
        let mut sched = TriggerScheduler::new(Box::new(MapProbe::new()));
        sched.register(absolute("tunnel", 1000.0, 1400.0, true), fade());

        // Before the pin: identity mapping
        assert_eq!(sched.render_offset(800.0), 800.0);
        // Mid-pin: page holds at the range start
        assert_eq!(sched.render_offset(1200.0), 1000.0);
        assert_eq!(sched.render_offset(1399.0), 1000.0);
        // Past the pin: motion resumes, shifted by the consumed span
        assert_eq!(sched.render_offset(1600.0), 1200.0);
    }

    #[test]
    fn test_overlapping_pins_last_registered_wins() {
        let mut sched = TriggerScheduler::new(Box::new(MapProbe::new()));
        let _first = sched.register(absolute("a", 1000.0, 2000.0, true), fade());
        let second = sched.register(absolute("b", 1500.0, 2500.0, true), fade());

        // Both mid-scrub at 1800
        sched.update(&tick(1), scroll_at(1800.0));
        assert_eq!(sched.pin_owner(), Some(second));
    }

    #[test]
    fn test_unregister_mid_pin_releases_lock() {
        let mut sched = TriggerScheduler::new(Box::new(MapProbe::new()));
        let h = sched.register(absolute("tunnel", 1000.0, 1400.0, true), fade());

        sched.update(&tick(1), scroll_at(1200.0));
        assert_eq!(sched.pin_owner(), Some(h));
        assert_eq!(sched.render_offset(1200.0), 1000.0);

        sched.unregister(h);
        // Next frame: no pin, native motion resumed
        sched.update(&tick(2), scroll_at(1200.0));
        assert_eq!(sched.pin_owner(), None);
        assert_eq!(sched.render_offset(1200.0), 1200.0);
    }

    #[test]
    fn test_section_anchored_range_and_remeasure() {
        let probe = MapProbe::new().with("work", 4000.0, 900.0);
        let mut sched = TriggerScheduler::new(Box::new(probe));
        let h = sched.register(
            Trigger {
                section: SectionId::new("work"),
                anchor: AnchorSpec::SectionSpan { span: 600.0 },
                pin: true,
                reverse_on_exit: true,
            },
            fade(),
        );
        let range = sched.range_of(h).unwrap();
        assert_eq!((range.start(), range.end()), (4000.0, 4600.0));

        // Layout moved (resize): remeasure refreshes the range
        sched.probe = Box::new(MapProbe::new().with("work", 5000.0, 900.0));
        sched.remeasure();
        let range = sched.range_of(h).unwrap();
        assert_eq!((range.start(), range.end()), (5000.0, 5600.0));
    }

    #[test]
    fn test_unmounted_section_resolves_late() {
        let mut sched = TriggerScheduler::new(Box::new(MapProbe::new()));
        let h = sched.register(
            Trigger {
                section: SectionId::new("late"),
                anchor: AnchorSpec::SectionExtent,
                pin: false,
                reverse_on_exit: true,
            },
            fade(),
        );
        assert!(sched.range_of(h).is_none());

        // Section mounts; the next update resolves the range
        sched.probe = Box::new(MapProbe::new().with("late", 2000.0, 800.0));
        sched.update(&tick(1), scroll_at(2400.0));
        assert!(sched.range_of(h).is_some());
        assert_eq!(sched.progress_of(h), Some(0.5));
    }

    #[test]
    fn test_no_reverse_latches_at_furthest() {
        let mut sched = TriggerScheduler::new(Box::new(MapProbe::new()));
        let h = sched.register(
            Trigger {
                section: SectionId::new("reveal"),
                anchor: AnchorSpec::Absolute { start: 1000.0, end: 2000.0 },
                pin: false,
                reverse_on_exit: false,
            },
            fade(),
        );

        sched.update(&tick(1), scroll_at(1800.0));
        assert_eq!(sched.progress_of(h), Some(0.8));
        // Scrolling back does not replay in reverse
        sched.update(&tick(2), scroll_at(1200.0));
        assert_eq!(sched.progress_of(h), Some(0.8));
    }

    #[test]
    fn test_cell_driven_by_trigger() {
        let mut sched = TriggerScheduler::new(Box::new(MapProbe::new()));
        let cell = ProgressCell::new();
        sched.register_with_cell(
            absolute("tunnel", 1000.0, 2000.0, true),
            fade(),
            cell.clone(),
        );

        sched.update(
            &tick(1),
            ScrollState { offset: 1500.0, velocity: 400.0, locked: false },
        );
        let snap = cell.peek();
        assert_eq!(snap.value, 0.5);
        assert!(snap.speed > 0.0);
    }

    #[test]
    fn test_complete_section_forces_exit_state() {
        let mut sched = TriggerScheduler::new(Box::new(MapProbe::new()));
        let h = sched.register(absolute("tunnel", 1000.0, 2000.0, true), fade());

        sched.update(&tick(1), scroll_at(1100.0));
        sched.complete_section(&SectionId::new("tunnel"));
        assert_eq!(sched.progress_of(h), Some(1.0));

        let view = sched.registrations().next().unwrap();
        assert_eq!(view.values[&Channel::Opacity], 1.0);
    }

    #[test]
    fn test_degenerate_range_rejected() {
        let mut sched = TriggerScheduler::new(Box::new(MapProbe::new()));
        let h = sched.register(absolute("broken", 3000.0, 1000.0, false), fade());
        sched.update(&tick(1), scroll_at(2000.0));
        // Never resolves; trigger stays inert instead of corrupting progress
        assert!(sched.range_of(h).is_none());
    }
}
