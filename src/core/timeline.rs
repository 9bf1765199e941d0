//! Scrubbed property timelines.
//!
//! A timeline is an ordered list of steps, each interpolating one
//! channel from a value to a value over a segment of the trigger's
//! [0,1] progress. Evaluation is a pure function of progress - no
//! accumulated state - which is what buys the hard invariants:
//! scrubbing is idempotent, and 0 -> 1 -> 0 restores the entry values
//! exactly. Reverse playback falls out for free.
//!
//! Later steps on the same channel override earlier ones where their
//! segments overlap (declaration order is the stacking order).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::easing::{Easing, lerp};

/// Animatable property channel. The viewport painter maps these onto
/// section transforms; `EffectDrive` feeds a bound progress cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    TranslateX,
    TranslateY,
    Scale,
    Opacity,
    Rotation,
    /// Raw drive value for a bound effect progress cell.
    EffectDrive,
}

/// One interpolated property change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    pub channel: Channel,
    pub from: f32,
    pub to: f32,
    pub easing: Easing,
    /// Sub-range of trigger progress this step spans, within [0,1].
    /// Progress below the segment holds `from`, above holds `to`.
    pub segment: (f32, f32),
}

impl Step {
    fn value_at(&self, progress: f32) -> f32 {
        let (seg_start, seg_end) = self.segment;
        let span = seg_end - seg_start;
        let local = if span > 0.0 {
            ((progress - seg_start) / span).clamp(0.0, 1.0)
        } else {
            // Degenerate segment acts as a step function
            if progress >= seg_start { 1.0 } else { 0.0 }
        };
        lerp(self.from, self.to, self.easing.apply(local))
    }
}

/// Evaluated channel values for one section, in declaration order.
pub type ChannelValues = IndexMap<Channel, f32>;

/// An ordered sequence of steps keyed to a trigger's progress.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    steps: Vec<Step>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step spanning the full progress range.
    pub fn step(self, channel: Channel, from: f32, to: f32, easing: Easing) -> Self {
        self.step_in(channel, from, to, easing, (0.0, 1.0))
    }

    /// Add a step spanning `segment` of the progress range.
    pub fn step_in(
        mut self,
        channel: Channel,
        from: f32,
        to: f32,
        easing: Easing,
        segment: (f32, f32),
    ) -> Self {
        debug_assert!(
            segment.0 <= segment.1 && (0.0..=1.0).contains(&segment.0) && segment.1 <= 1.0,
            "step segment must be an ordered sub-range of [0,1], got {segment:?}"
        );
        self.steps.push(Step {
            channel,
            from,
            to,
            easing,
            segment,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Evaluate all channels at `progress` into `out`. `out` is cleared
    /// first so repeated sampling into the same map stays idempotent.
    pub fn sample_into(&self, progress: f32, out: &mut ChannelValues) {
        let progress = progress.clamp(0.0, 1.0);
        out.clear();
        for step in &self.steps {
            out.insert(step.channel, step.value_at(progress));
        }
    }

    /// Evaluate into a fresh map. Prefer [`sample_into`] on hot paths.
    ///
    /// [`sample_into`]: Timeline::sample_into
    pub fn sample(&self, progress: f32) -> ChannelValues {
        let mut out = ChannelValues::default();
        self.sample_into(progress, &mut out);
        out
    }

    /// Channel values at progress 0 - the section's entry visual state.
    pub fn entry_values(&self) -> ChannelValues {
        self.sample(0.0)
    }

    /// Channel values at progress 1 - the section's exit visual state.
    pub fn exit_values(&self) -> ChannelValues {
        self.sample(1.0)
    }
}
