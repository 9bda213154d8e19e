use eframe::egui::{self, StrokeKind};

use crate::ops::adapters::{overlay_pointer_down, overlay_pointer_move, overlay_pointer_up};
use crate::types::region::Region;
use crate::types::waveform::OverlaySurface;

const OVERLAY_HEIGHT: f32 = 60.0;

/// Fallback selection strip for when no waveform could be loaded.
///
/// A pointer drag across the strip is mapped from pixel space to seconds by
/// the overlay adapter on release. Returns true when the release produced an
/// accepted region mutation.
pub fn overlay_view(
    ui: &mut egui::Ui,
    overlay: &mut OverlaySurface,
    region: &mut Region,
    duration: f64,
) -> bool {
    let width = ui.available_width().max(1.0);
    let (rect, response) = ui.allocate_exact_size(
        egui::vec2(width, OVERLAY_HEIGHT),
        egui::Sense::click_and_drag(),
    );
    overlay.width_px = rect.width();

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 2.0, egui::Color32::from_gray(40));
    painter.rect_stroke(
        rect,
        2.0,
        egui::Stroke::new(1.0, egui::Color32::from_gray(70)),
        StrokeKind::Inside,
    );

    // committed selection, derived from the canonical region
    if duration > 0.0 {
        let left = rect.left() + (region.start / duration) as f32 * rect.width();
        let right = rect.left() + (region.end / duration) as f32 * rect.width();
        let sel = egui::Rect::from_min_max(
            egui::pos2(left, rect.top()),
            egui::pos2(right.min(rect.right()), rect.bottom()),
        );
        painter.rect_filled(sel, 0.0, egui::Color32::from_rgba_unmultiplied(100, 65, 165, 90));
    }

    // in-flight gesture highlight, in raw pixel space
    if let Some((anchor, current)) = overlay.gesture {
        let (lo, hi) = if anchor <= current {
            (anchor, current)
        } else {
            (current, anchor)
        };
        let ghost = egui::Rect::from_min_max(
            egui::pos2(rect.left() + lo, rect.top()),
            egui::pos2(rect.left() + hi, rect.bottom()),
        );
        painter.rect_filled(ghost, 0.0, egui::Color32::from_rgba_unmultiplied(255, 255, 255, 30));
    }

    let local_x = |pos: egui::Pos2| (pos.x - rect.left()).clamp(0.0, rect.width());

    if response.drag_started() {
        if let Some(pos) = response.interact_pointer_pos() {
            overlay_pointer_down(overlay, local_x(pos));
        }
    }
    if response.dragged() {
        if let Some(pos) = response.interact_pointer_pos() {
            overlay_pointer_move(overlay, local_x(pos));
        }
    }
    if response.drag_stopped() {
        return overlay_pointer_up(overlay, region, duration);
    }
    false
}
