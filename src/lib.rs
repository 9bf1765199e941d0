//! SLIPSTREAM - scroll-narrative presentation engine
//!
//! Re-exports all modules for use by binary targets.

// Core engine (scroll, frame loop, triggers, navigation)
pub mod core;

// App modules
pub mod app;
pub mod cli;
pub mod config;
pub mod effects;
pub mod sections;
pub mod widgets;

// Re-export commonly used types from core
pub use core::event_bus::{BoxedEvent, EventBus, downcast_event};
pub use core::frame_loop::{FrameLoop, FramePipeline, FrameTick, Phase};
pub use core::nav_intent::NavIntent;
pub use core::progress::{ProgressCell, ProgressSnapshot};
pub use core::scroll::{EngineConfig, ScrollDriver, ScrollState, ScrollToOptions};
pub use core::timeline::{Channel, Timeline};
pub use core::trigger::{LayoutProbe, SectionId, Trigger, TriggerScheduler};

// Re-export app surface
pub use app::NarrativeApp;
pub use config::AppSettings;
pub use sections::{Section, SharedLayout};
