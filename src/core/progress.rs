//! Shared effect progress cell.
//!
//! One trigger's timeline writes a cell during the Timelines phase; one
//! or more procedural consumers read it in the Effects phase (or later)
//! of the same frame. Single-writer/multi-reader is a construction-time
//! discipline here, not a locking question - all access is serialized by
//! the frame loop. The cell stamps every write with the writing frame's
//! phase so a read that lands *before* the write phase of its own frame
//! is caught in debug builds instead of silently rendering stale values.

use std::sync::{Arc, Mutex};

use log::warn;

use crate::core::frame_loop::{FrameStamp, FrameTick, Phase};

/// Snapshot handed to consumers. Values are already clamped.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProgressSnapshot {
    /// Timeline progress, [0,1].
    pub value: f32,
    /// Normalized scroll speed, >= 0. Consumers clamp further to their
    /// own configured maximum.
    pub speed: f32,
}

#[derive(Debug, Default)]
struct CellState {
    snapshot: ProgressSnapshot,
    wrote_frame: FrameStamp,
}

/// Shared, frame-phased progress/speed cell.
///
/// Cloning shares the cell; exactly one clone may write.
#[derive(Clone, Debug, Default)]
pub struct ProgressCell {
    inner: Arc<Mutex<CellState>>,
}

impl ProgressCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write this frame's progress and speed. Timelines phase only.
    ///
    /// Out-of-range inputs (a programmatic jump can hand a transient
    /// overshoot) are clamped, not rejected.
    pub fn write(&self, value: f32, speed: f32, tick: &FrameTick) {
        debug_assert!(
            tick.phase == Phase::Timelines,
            "progress cells are written in the Timelines phase, got {:?}",
            tick.phase
        );
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.snapshot = ProgressSnapshot {
            value: value.clamp(0.0, 1.0),
            speed: if speed.is_finite() { speed.max(0.0) } else { 0.0 },
        };
        state.wrote_frame = tick.frame;
    }

    /// Read the latest snapshot. Must run strictly after the Timelines
    /// phase of the current frame; a same-frame read from an earlier
    /// phase would observe last frame's value and desync the consumer.
    pub fn read(&self, tick: &FrameTick) -> ProgressSnapshot {
        debug_assert!(
            tick.phase > Phase::Timelines,
            "progress cells are read after the Timelines phase, got {:?}",
            tick.phase
        );
        let state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if state.wrote_frame > tick.frame {
            // A write stamped ahead of the reader's frame means two
            // drivers disagree about the frame counter.
            warn!(
                "progress cell written at frame {:?} but read at {:?}",
                state.wrote_frame, tick.frame
            );
        }
        state.snapshot
    }

    /// Last value without phase checking, for displays outside the
    /// frame pipeline (status bar, tests).
    pub fn peek(&self) -> ProgressSnapshot {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(frame: u64, phase: Phase) -> FrameTick {
        FrameTick {
            frame: FrameStamp(frame),
            now_s: frame as f64 / 60.0,
            dt_s: 1.0 / 60.0,
            phase,
        }
    }

    #[test]
    fn test_write_then_read_same_frame() {
        let cell = ProgressCell::new();
        cell.write(0.5, 1.2, &tick(1, Phase::Timelines));

        let snap = cell.read(&tick(1, Phase::Effects));
        assert_eq!(snap.value, 0.5);
        assert_eq!(snap.speed, 1.2);
    }

    #[test]
    fn test_out_of_range_clamped() {
        let cell = ProgressCell::new();
        // Immediate jump can drive progress past 1 in a single frame
        cell.write(3.7, -5.0, &tick(1, Phase::Timelines));

        let snap = cell.peek();
        assert_eq!(snap.value, 1.0);
        assert_eq!(snap.speed, 0.0);
    }

    #[test]
    fn test_nan_speed_zeroed() {
        let cell = ProgressCell::new();
        cell.write(0.2, f32::NAN, &tick(1, Phase::Timelines));
        assert_eq!(cell.peek().speed, 0.0);
    }

    #[test]
    fn test_unwritten_cell_reads_default() {
        let cell = ProgressCell::new();
        let snap = cell.read(&tick(1, Phase::Effects));
        assert_eq!(snap, ProgressSnapshot::default());
    }

    #[test]
    #[should_panic(expected = "written in the Timelines phase")]
    #[cfg(debug_assertions)]
    fn test_write_outside_timeline_phase_panics() {
        let cell = ProgressCell::new();
        cell.write(0.5, 0.0, &tick(1, Phase::Effects));
    }

    #[test]
    #[should_panic(expected = "read after the Timelines phase")]
    #[cfg(debug_assertions)]
    fn test_read_before_write_phase_panics() {
        let cell = ProgressCell::new();
        cell.read(&tick(1, Phase::Scroll));
    }
}
