//! Domain events carried by the [`EventBus`].
//!
//! Emitted from UI and engine components, drained once per frame by the
//! app after the core pipeline has run.
//!
//! [`EventBus`]: crate::core::event_bus::EventBus

use crate::core::scroll::ScrollToOptions;
use crate::core::trigger::{SectionId, Viewport};

/// Where a navigation request wants to land.
#[derive(Clone, Debug, PartialEq)]
pub enum NavTarget {
    /// Top of the page (back-to-top affordance).
    Top,
    /// Start of a section by its stable id.
    Section(SectionId),
    /// Interior of a pinned/scrubbed section: land past its scrub span,
    /// with its timeline completed.
    SectionInterior(SectionId),
    /// Absolute content offset, px.
    Offset(f32),
}

/// A programmatic scroll jump was requested (nav menu, footer link,
/// back-to-top). Routed through the navigation intent arbiter before
/// the engine moves.
#[derive(Clone, Debug)]
pub struct ScrollToRequested {
    pub target: NavTarget,
    pub opts: ScrollToOptions,
}

/// The navigation intent flag flipped.
#[derive(Clone, Copy, Debug)]
pub struct NavIntentChanged {
    pub active: bool,
}

/// The section under the viewport anchor changed during scrolling.
#[derive(Clone, Debug)]
pub struct SectionChanged {
    pub section: SectionId,
}

/// Host viewport dimensions changed; layout and anchor ranges were
/// remeasured in response.
#[derive(Clone, Copy, Debug)]
pub struct ViewportResized {
    pub viewport: Viewport,
}
