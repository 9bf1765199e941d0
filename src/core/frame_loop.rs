//! Single shared per-frame driver.
//!
//! One `run_frame()` call per host frame executes the pipeline phases in
//! a fixed order: scroll tick -> timeline update -> effect regeneration ->
//! external subscribers. The ordering is structural - phases are plain
//! method calls, not registration-order callbacks - so timelines can
//! never read last frame's offset and effects can never read this
//! frame's progress before it was written.
//!
//! There is deliberately no lag smoothing or frame skipping here: `dt`
//! is raw host-clock delta. Any resampling would decouple perceived
//! scroll speed from timeline progress.

use log::trace;
use uuid::Uuid;

/// Pipeline phase within one frame. Ordered; later phases may read
/// state written by earlier ones, never the reverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Scroll engine advances the virtual offset.
    Scroll,
    /// Trigger scheduler recomputes progress, scrubs timelines, writes
    /// progress cells.
    Timelines,
    /// Procedural consumers regenerate geometry from progress cells.
    Effects,
    /// External per-frame subscribers (overlays, diagnostics).
    Subscribers,
}

/// Monotonically increasing frame counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct FrameStamp(pub u64);

/// Per-phase tick context handed to every pipeline stage.
#[derive(Clone, Copy, Debug)]
pub struct FrameTick {
    pub frame: FrameStamp,
    /// Host clock, seconds. Monotonic within a session.
    pub now_s: f64,
    /// Delta since the previous frame, seconds. Zero on the first frame.
    pub dt_s: f32,
    pub phase: Phase,
}

impl FrameTick {
    fn at(self, phase: Phase) -> Self {
        Self { phase, ..self }
    }
}

/// The fixed-order core pipeline. Implemented by the app over its
/// engine/scheduler/effect fields.
pub trait FramePipeline {
    fn scroll(&mut self, tick: &FrameTick);
    fn timelines(&mut self, tick: &FrameTick);
    fn effects(&mut self, tick: &FrameTick);
}

type Subscriber = Box<dyn FnMut(&FrameTick)>;

/// Handle returned by [`FrameLoop::add_subscriber`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriberId(Uuid);

/// Drives the pipeline once per host frame and fans out to subscribers.
#[derive(Default)]
pub struct FrameLoop {
    frame: u64,
    last_now_s: Option<f64>,
    subscribers: Vec<(SubscriberId, Subscriber)>,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an external per-frame callback. Runs after the core
    /// phases, in registration order.
    pub fn add_subscriber<F>(&mut self, callback: F) -> SubscriberId
    where
        F: FnMut(&FrameTick) + 'static,
    {
        let id = SubscriberId(Uuid::new_v4());
        self.subscribers.push((id, Box::new(callback)));
        trace!("frame subscriber added ({} total)", self.subscribers.len());
        id
    }

    /// Remove a subscriber. Unknown ids are a no-op.
    pub fn remove_subscriber(&mut self, id: SubscriberId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }

    /// Current frame number (frames completed so far).
    pub fn frame(&self) -> FrameStamp {
        FrameStamp(self.frame)
    }

    /// Run one frame: scroll -> timelines -> effects -> subscribers.
    /// Returns the tick so the caller can stamp reads done after the
    /// pipeline (painting).
    pub fn run_frame(&mut self, now_s: f64, pipeline: &mut impl FramePipeline) -> FrameTick {
        self.frame += 1;
        let dt_s = match self.last_now_s {
            Some(last) => (now_s - last).max(0.0) as f32,
            None => 0.0,
        };
        self.last_now_s = Some(now_s);

        let tick = FrameTick {
            frame: FrameStamp(self.frame),
            now_s,
            dt_s,
            phase: Phase::Scroll,
        };

        pipeline.scroll(&tick.at(Phase::Scroll));
        pipeline.timelines(&tick.at(Phase::Timelines));
        pipeline.effects(&tick.at(Phase::Effects));

        let sub_tick = tick.at(Phase::Subscribers);
        for (_, cb) in &mut self.subscribers {
            cb(&sub_tick);
        }
        sub_tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        calls: Rc<RefCell<Vec<Phase>>>,
    }

    impl FramePipeline for Recorder {
        fn scroll(&mut self, tick: &FrameTick) {
            self.calls.borrow_mut().push(tick.phase);
        }
        fn timelines(&mut self, tick: &FrameTick) {
            self.calls.borrow_mut().push(tick.phase);
        }
        fn effects(&mut self, tick: &FrameTick) {
            self.calls.borrow_mut().push(tick.phase);
        }
    }

    #[test]
    fn test_phase_order_fixed() {
        let mut frame_loop = FrameLoop::new();
        let mut pipeline = Recorder::default();
        let calls = Rc::clone(&pipeline.calls);

        frame_loop.run_frame(0.0, &mut pipeline);
        frame_loop.run_frame(0.016, &mut pipeline);

        let expected = [Phase::Scroll, Phase::Timelines, Phase::Effects];
        let recorded = calls.borrow();
        assert_eq!(recorded[0..3], expected[..]);
        assert_eq!(recorded[3..6], expected[..]);
    }

    #[test]
    fn test_dt_from_host_clock() {
        let mut frame_loop = FrameLoop::new();
        let mut pipeline = Recorder::default();

        let t0 = frame_loop.run_frame(1.0, &mut pipeline);
        assert_eq!(t0.dt_s, 0.0); // first frame has no predecessor

        let t1 = frame_loop.run_frame(1.25, &mut pipeline);
        assert!((t1.dt_s - 0.25).abs() < 1e-6);
        assert!(t1.frame > t0.frame);

        // A clock going backwards clamps to zero, never negative dt
        let t2 = frame_loop.run_frame(1.0, &mut pipeline);
        assert_eq!(t2.dt_s, 0.0);
    }

    #[test]
    fn test_subscribers_run_after_pipeline() {
        let mut frame_loop = FrameLoop::new();
        let mut pipeline = Recorder::default();
        let calls = Rc::clone(&pipeline.calls);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_cb = Rc::clone(&seen);
        let id = frame_loop.add_subscriber(move |tick| {
            seen_cb.borrow_mut().push(tick.phase);
        });

        frame_loop.run_frame(0.0, &mut pipeline);
        assert_eq!(calls.borrow().len(), 3);
        assert_eq!(*seen.borrow(), vec![Phase::Subscribers]);

        frame_loop.remove_subscriber(id);
        frame_loop.run_frame(0.016, &mut pipeline);
        assert_eq!(seen.borrow().len(), 1); // removed, not called again
    }
}
