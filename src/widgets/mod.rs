//! UI widgets - navbar and the narrative viewport painter.

pub mod navbar;
pub mod viewport;

pub use navbar::{NavAction, render_navbar};
pub use viewport::{NarrativeFrame, render_narrative};
