//! Core orchestration modules - scroll engine, frame loop, triggers,
//! navigation arbitration.
//!
//! Everything here is UI-independent and clock-injected: the host hands
//! in `now` seconds each frame, so the whole pipeline runs under
//! synthetic clocks in tests.

pub mod easing;
pub mod event_bus;
pub mod events;
pub mod frame_loop;
pub mod nav_intent;
pub mod progress;
pub mod resolver;
pub mod scroll;
pub mod timeline;
pub mod trigger;

// Re-exports for convenience
pub use easing::Easing;
pub use event_bus::{EventBus, downcast_event};
pub use frame_loop::{FrameLoop, FramePipeline, FrameTick, Phase};
pub use nav_intent::NavIntent;
pub use progress::{ProgressCell, ProgressSnapshot};
pub use resolver::SectionResolver;
pub use scroll::{EngineConfig, ScrollDriver, ScrollState, ScrollToOptions};
pub use timeline::{Channel, Timeline};
pub use trigger::{AnchorSpec, LayoutProbe, SectionId, Trigger, TriggerScheduler};
