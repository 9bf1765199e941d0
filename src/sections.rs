//! Narrative section catalog and the stacked layout probe.
//!
//! Sections are the anchor contract: their ids feed both navigation
//! (`ScrollToRequested`) and trigger anchor computation. The layout is
//! a vertical stack in content space; a pinned section contributes its
//! scrub span to the scrollable length on top of its own height (the
//! span the pin consumes while its timeline scrubs).

use std::sync::{Arc, Mutex};

use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::core::trigger::{LayoutProbe, SectionId, SectionMetrics, Viewport};

/// Static definition of one narrative section. Heights are in viewport
/// units so the layout follows window size.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    /// Content height, in viewport heights.
    pub height_vh: f32,
    /// Pinned scrub span, in viewport heights. Zero = not pinned.
    pub pin_span_vh: f32,
    /// Accent color for the painter.
    pub accent: [u8; 3],
    /// Shown in the nav menu.
    pub in_nav: bool,
}

impl Section {
    fn new(id: &str, title: &str, height_vh: f32, pin_span_vh: f32, accent: [u8; 3]) -> Self {
        Self {
            id: SectionId::new(id),
            title: title.to_string(),
            height_vh,
            pin_span_vh,
            accent,
            in_nav: true,
        }
    }
}

/// The default narrative. Pin spans here are the scrub lengths of the
/// tunnel and starfield chapters.
pub static NARRATIVE: Lazy<Vec<Section>> = Lazy::new(|| {
    vec![
        Section::new("hero", "Slipstream", 1.0, 0.0, [24, 26, 38]),
        Section::new("manifesto", "Manifesto", 1.2, 0.0, [30, 24, 44]),
        Section::new("tunnel", "The Tunnel", 1.0, 2.5, [12, 14, 24]),
        Section::new("starfield", "Starfield", 1.0, 1.5, [10, 18, 30]),
        Section::new("work", "Selected Work", 1.6, 0.0, [26, 30, 34]),
        Section::new("contact", "Contact", 0.9, 0.0, [20, 20, 26]),
    ]
});

#[derive(Debug)]
struct Row {
    id: SectionId,
    metrics: SectionMetrics,
    pin_span: f32,
}

/// Vertical stack layout over a section list. Interior state behind
/// [`SharedLayout`]; not used directly.
#[derive(Debug)]
struct StackedLayout {
    sections: Vec<Section>,
    rows: Vec<Row>,
    viewport: Viewport,
    content_len: f32,
}

impl StackedLayout {
    fn new(sections: Vec<Section>) -> Self {
        Self {
            sections,
            rows: Vec::new(),
            viewport: Viewport::default(),
            content_len: 0.0,
        }
    }

    fn relayout(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.rows.clear();
        let vh = viewport.height.max(1.0);
        let mut cursor = 0.0;
        for section in &self.sections {
            let height = section.height_vh * vh;
            let pin_span = section.pin_span_vh * vh;
            self.rows.push(Row {
                id: section.id.clone(),
                metrics: SectionMetrics { top: cursor, height },
                pin_span,
            });
            cursor += height + pin_span;
        }
        self.content_len = cursor;
        debug!(
            "layout: {} sections over {:.0}px content for {:.0}x{:.0} viewport",
            self.rows.len(),
            self.content_len,
            viewport.width,
            viewport.height
        );
    }

    fn section_at(&self, render_offset: f32) -> Option<SectionId> {
        // Anchor point: upper third of the viewport reads as "current"
        let probe_y = render_offset + self.viewport.height / 3.0;
        self.rows
            .iter()
            .rev()
            .find(|row| probe_y >= row.metrics.top)
            .map(|row| row.id.clone())
    }
}

/// Cloneable handle over the stacked layout. The trigger scheduler gets
/// one clone as its [`LayoutProbe`]; the app keeps another for resize
/// and painting queries.
#[derive(Clone, Debug)]
pub struct SharedLayout {
    inner: Arc<Mutex<StackedLayout>>,
}

impl SharedLayout {
    pub fn new(sections: Vec<Section>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StackedLayout::new(sections))),
        }
    }

    /// Recompute section placement for a new viewport. Follow with
    /// `TriggerScheduler::remeasure` and an engine bounds update.
    pub fn relayout(&self, viewport: Viewport) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).relayout(viewport);
    }

    /// Section under the viewport anchor at the given rendered offset.
    pub fn section_at(&self, render_offset: f32) -> Option<SectionId> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).section_at(render_offset)
    }

    /// Pin scrub span of a section, px, at the current layout.
    pub fn pin_span(&self, id: &SectionId) -> Option<f32> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.rows.iter().find(|row| &row.id == id).map(|row| row.pin_span)
    }

    /// Scrollable maximum: content length minus one viewport.
    pub fn max_scroll(&self) -> f32 {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        (inner.content_len - inner.viewport.height).max(0.0)
    }

    pub fn sections(&self) -> Vec<Section> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).sections.clone()
    }
}

impl LayoutProbe for SharedLayout {
    fn measure(&self, id: &SectionId) -> Option<SectionMetrics> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.rows.iter().find(|row| &row.id == id).map(|row| row.metrics)
    }

    fn viewport(&self) -> Viewport {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).viewport
    }

    fn content_len(&self) -> f32 {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).content_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_sections() -> SharedLayout {
        let layout = SharedLayout::new(vec![
            Section::new("a", "A", 1.0, 0.0, [0, 0, 0]),
            Section::new("b", "B", 2.0, 1.5, [0, 0, 0]),
        ]);
        layout.relayout(Viewport { width: 1000.0, height: 800.0 });
        layout
    }

    #[test]
    fn test_stacking_includes_pin_spans() {
        let layout = two_sections();
        let a = layout.measure(&SectionId::new("a")).unwrap();
        let b = layout.measure(&SectionId::new("b")).unwrap();

        assert_eq!(a.top, 0.0);
        assert_eq!(a.height, 800.0);
        // b starts after a's height (a has no pin span)
        assert_eq!(b.top, 800.0);
        assert_eq!(b.height, 1600.0);
        // content = a + b + b's pin span
        assert_eq!(layout.content_len(), 800.0 + 1600.0 + 1200.0);
    }

    #[test]
    fn test_relayout_follows_viewport() {
        let layout = two_sections();
        layout.relayout(Viewport { width: 1000.0, height: 400.0 });
        let b = layout.measure(&SectionId::new("b")).unwrap();
        assert_eq!(b.top, 400.0);
        assert_eq!(layout.pin_span(&SectionId::new("b")), Some(600.0));
    }

    #[test]
    fn test_missing_section_unmeasured() {
        let layout = two_sections();
        assert!(layout.measure(&SectionId::new("nope")).is_none());
    }

    #[test]
    fn test_section_at_render_offset() {
        let layout = two_sections();
        assert_eq!(layout.section_at(0.0), Some(SectionId::new("a")));
        assert_eq!(layout.section_at(900.0), Some(SectionId::new("b")));
    }

    #[test]
    fn test_max_scroll_leaves_one_viewport() {
        let layout = two_sections();
        assert_eq!(layout.max_scroll(), 3600.0 - 800.0);
    }
}
