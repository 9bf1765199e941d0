//! Narrative viewport painter.
//!
//! Paints one consistent frame from the latest pipeline outputs: the
//! section stack at the scheduler's render offset, the tunnel and
//! starfield geometry regenerated this frame, and the warp overlay on
//! top. Painting is read-only over engine state - every value here was
//! computed earlier in the same frame, in pipeline order.

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui, Vec2};

use crate::core::trigger::{SectionId, TriggerScheduler};
use crate::core::timeline::Channel;
use crate::effects::{ParticleField, TunnelEffect, WarpOverlay};
use crate::sections::SharedLayout;

/// Everything the painter needs for one frame, borrowed from the app.
pub struct NarrativeFrame<'a> {
    pub layout: &'a SharedLayout,
    pub sched: &'a TriggerScheduler,
    /// Pin-aware page translation for this frame.
    pub render_offset: f32,
    pub tunnel: &'a TunnelEffect,
    pub tunnel_section: &'a SectionId,
    pub starfield: &'a ParticleField,
    pub starfield_section: &'a SectionId,
    pub warp: &'a WarpOverlay,
    pub now_s: f64,
    /// Overall scroll fraction for the progress bar, [0,1].
    pub scroll_fraction: f32,
    pub show_progress_bar: bool,
}

/// Paint the whole narrative into the available rect.
pub fn render_narrative(ui: &mut Ui, frame: &NarrativeFrame<'_>) {
    let (rect, _) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
    if !ui.is_rect_visible(rect) {
        return;
    }
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, Color32::from_gray(8));

    paint_sections(&painter, rect, frame);
    paint_effects(&painter, rect, frame);

    // Warp flash above everything
    let warp_alpha = frame.warp.opacity(frame.now_s);
    if warp_alpha > 0.0 {
        painter.rect_filled(
            rect,
            0.0,
            Color32::from_white_alpha((warp_alpha * 220.0) as u8),
        );
    }

    if frame.show_progress_bar {
        paint_progress_bar(&painter, rect, frame.scroll_fraction);
    }
}

fn paint_sections(painter: &egui::Painter, rect: Rect, frame: &NarrativeFrame<'_>) {
    for section in frame.layout.sections() {
        let Some(metrics) = frame.layout.measure(&section.id) else {
            continue;
        };
        // Pinned sections hold in place because render_offset already
        // stops advancing through their scrub span
        let top = rect.min.y + metrics.top - frame.render_offset;
        let section_rect = Rect::from_min_size(
            Pos2::new(rect.min.x, top),
            Vec2::new(rect.width(), metrics.height),
        );
        if !section_rect.intersects(rect) {
            continue;
        }

        let [r, g, b] = section.accent;
        painter.rect_filled(section_rect, 0.0, Color32::from_rgb(r, g, b));

        // Timeline-driven presentation: opacity/translate/scale scrubbed
        // by this section's triggers
        let mut opacity = 1.0_f32;
        let mut translate_y = 0.0_f32;
        let mut scale = 1.0_f32;
        for view in frame.sched.registrations() {
            if view.section != &section.id {
                continue;
            }
            if let Some(v) = view.values.get(&Channel::Opacity) {
                opacity = v.clamp(0.0, 1.0);
            }
            if let Some(v) = view.values.get(&Channel::TranslateY) {
                translate_y = *v;
            }
            if let Some(v) = view.values.get(&Channel::Scale) {
                scale = v.max(0.0);
            }
        }

        let title_pos = Pos2::new(
            section_rect.center().x,
            (section_rect.min.y + 80.0 + translate_y).max(rect.min.y - 100.0),
        );
        painter.text(
            title_pos,
            Align2::CENTER_CENTER,
            &section.title,
            FontId::proportional(42.0 * scale),
            Color32::from_white_alpha((opacity * 235.0) as u8),
        );
    }
}

fn paint_effects(painter: &egui::Painter, rect: Rect, frame: &NarrativeFrame<'_>) {
    let center = rect.center();
    let half_min = rect.width().min(rect.height()) / 2.0;

    // Tunnel rings while its chapter is mid-scrub
    if chapter_active(frame.sched, frame.tunnel_section) {
        for ring in frame.tunnel.rings() {
            if ring.opacity <= 0.0 {
                continue;
            }
            let ring_center = Pos2::new(
                center.x + ring.drift.x * half_min,
                center.y + ring.drift.y * half_min,
            );
            painter.circle_stroke(
                ring_center,
                ring.radius_frac * half_min,
                Stroke::new(
                    1.5,
                    Color32::from_white_alpha((ring.opacity * 200.0) as u8),
                ),
            );
        }
    }

    // Starfield while its chapter is mid-scrub
    if chapter_active(frame.sched, frame.starfield_section) {
        for star in frame.starfield.stars() {
            if star.alpha <= 0.0 {
                continue;
            }
            let pos = Pos2::new(
                center.x + star.pos.x * half_min,
                center.y + star.pos.y * half_min,
            );
            let color = Color32::from_white_alpha((star.alpha * 255.0) as u8);
            let tail = Pos2::new(
                center.x + star.tail.x * half_min,
                center.y + star.tail.y * half_min,
            );
            if (tail - pos).length() > 0.5 {
                painter.line_segment([tail, pos], Stroke::new(star.size * 0.5, color));
            }
            painter.circle_filled(pos, star.size * 0.5, color);
        }
    }
}

fn chapter_active(sched: &TriggerScheduler, section: &SectionId) -> bool {
    sched
        .registrations()
        .any(|view| view.section == section && view.progress > 0.0 && view.progress < 1.0)
}

fn paint_progress_bar(painter: &egui::Painter, rect: Rect, fraction: f32) {
    let fraction = fraction.clamp(0.0, 1.0);
    let track = Rect::from_min_size(
        Pos2::new(rect.max.x - 4.0, rect.min.y),
        Vec2::new(3.0, rect.height()),
    );
    painter.rect_filled(track, 1.5, Color32::from_gray(30));
    let fill = Rect::from_min_size(track.min, Vec2::new(3.0, rect.height() * fraction));
    painter.rect_filled(fill, 1.5, Color32::from_rgb(120, 180, 255));
}
