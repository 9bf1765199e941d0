//! Top navigation bar: section links, interior skips, back-to-top.
//!
//! Pure UI - returns an action for the app to route through the
//! navigation intent arbiter. Never touches the engine directly.

use eframe::egui::{self, Color32, RichText, Ui};

use crate::core::trigger::SectionId;
use crate::sections::Section;

/// Interaction result of one navbar pass.
#[derive(Clone, Debug, PartialEq)]
pub enum NavAction {
    None,
    /// Jump to the start of a section.
    Jump(SectionId),
    /// Jump past a pinned section's scrub span (skip the chapter).
    JumpInterior(SectionId),
    /// Back to the top of the page.
    BackToTop,
}

/// Render the nav menu. `current` highlights the section under the
/// viewport anchor.
pub fn render_navbar(ui: &mut Ui, sections: &[Section], current: Option<&SectionId>) -> NavAction {
    let mut action = NavAction::None;

    ui.horizontal(|ui| {
        if ui.button(RichText::new("⬆ Top").small()).clicked() {
            action = NavAction::BackToTop;
        }
        ui.separator();

        for section in sections.iter().filter(|s| s.in_nav) {
            let is_current = current == Some(&section.id);
            let label = if is_current {
                RichText::new(&section.title).strong().color(Color32::WHITE)
            } else {
                RichText::new(&section.title).color(Color32::from_gray(170))
            };
            if ui.button(label).clicked() {
                action = NavAction::Jump(section.id.clone());
            }
            // Pinned chapters get a skip affordance landing past the scrub
            if section.pin_span_vh > 0.0 {
                let skip = ui.add(egui::Button::new(RichText::new("»").small()).frame(false));
                if skip.on_hover_text("Skip chapter").clicked() {
                    action = NavAction::JumpInterior(section.id.clone());
                }
            }
        }
    });

    action
}
