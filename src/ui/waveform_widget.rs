use eframe::egui::{self, StrokeKind};

use crate::types::waveform::WaveformHandle;

const WAVEFORM_HEIGHT: f32 = 100.0;
const EDGE_GRAB_PX: f32 = 6.0;
/// Drag slop before a new region is created, in px.
const CREATE_SLOP_PX: f32 = 5.0;

/// What the pointer is currently doing to the waveform.
#[derive(Debug, Clone, Copy)]
enum DragKind {
    /// Drag-selecting a new region from an anchor time.
    Select { anchor: f64, region: Option<u64> },
    /// Dragging the left or right edge of an existing region.
    ResizeLeft { id: u64 },
    ResizeRight { id: u64 },
    /// Dragging the whole region, keeping its length.
    Move { id: u64, grab_offset: f64 },
}

/// Waveform display with drag-region selection.
///
/// Interactions only push events onto the handle's queue; the session
/// controller drains those events through the drag-selection adapter, so the
/// widget itself never mutates the region model.
pub fn waveform_view(ui: &mut egui::Ui, handle: &mut WaveformHandle) {
    let width = ui.available_width().max(1.0);
    let (rect, response) = ui.allocate_exact_size(
        egui::vec2(width, WAVEFORM_HEIGHT),
        egui::Sense::click_and_drag(),
    );
    let duration = handle.duration();
    if duration <= 0.0 {
        return;
    }

    let x_to_time = |x: f32| ((x - rect.left()) / rect.width()).clamp(0.0, 1.0) as f64 * duration;
    let time_to_x = |t: f64| rect.left() + (t / duration) as f32 * rect.width();

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 2.0, egui::Color32::from_gray(30));

    // peak bars
    let peaks = &handle.data.peaks;
    if !peaks.is_empty() {
        let bar_w = rect.width() / peaks.len() as f32;
        for (i, peak) in peaks.iter().enumerate() {
            let h = (peak * (WAVEFORM_HEIGHT - 8.0)).max(1.0);
            let x = rect.left() + i as f32 * bar_w;
            let bar = egui::Rect::from_center_size(
                egui::pos2(x + bar_w / 2.0, rect.center().y),
                egui::vec2((bar_w - 1.0).max(1.0), h),
            );
            painter.rect_filled(bar, 1.0, egui::Color32::from_gray(190));
        }
    }

    // selection rectangle
    if let Some(region) = handle.regions().first() {
        let sel = egui::Rect::from_min_max(
            egui::pos2(time_to_x(region.start), rect.top()),
            egui::pos2(time_to_x(region.end), rect.bottom()),
        );
        painter.rect_filled(sel, 0.0, egui::Color32::from_rgba_unmultiplied(100, 65, 165, 80));
        painter.rect_stroke(
            sel,
            0.0,
            egui::Stroke::new(1.0, egui::Color32::from_rgb(100, 65, 165)),
            StrokeKind::Inside,
        );
    }

    // playhead
    let px = time_to_x(handle.playhead);
    painter.line_segment(
        [egui::pos2(px, rect.top()), egui::pos2(px, rect.bottom())],
        egui::Stroke::new(1.0, egui::Color32::WHITE),
    );

    let drag_id = response.id.with("waveform_drag");

    if response.drag_started() {
        if let Some(pos) = response.interact_pointer_pos() {
            let kind = hit_test(handle, pos.x, time_to_x, x_to_time);
            ui.ctx().data_mut(|d| d.insert_temp(drag_id, kind));
        }
    }

    if response.dragged() {
        if let Some(pos) = response.interact_pointer_pos() {
            let t = x_to_time(pos.x);
            let kind: Option<DragKind> = ui.ctx().data_mut(|d| d.get_temp(drag_id));
            if let Some(kind) = kind {
                let updated = apply_drag(handle, kind, t, rect.width(), duration);
                if let Some(updated) = updated {
                    ui.ctx().data_mut(|d| d.insert_temp(drag_id, updated));
                }
            }
        }
    }

    if response.drag_stopped() {
        ui.ctx().data_mut(|d| d.remove::<DragKind>(drag_id));
    }
}

fn hit_test(
    handle: &WaveformHandle,
    x: f32,
    time_to_x: impl Fn(f64) -> f32,
    x_to_time: impl Fn(f32) -> f64,
) -> DragKind {
    if let Some(region) = handle.regions().first() {
        let left = time_to_x(region.start);
        let right = time_to_x(region.end);
        if (x - left).abs() <= EDGE_GRAB_PX {
            return DragKind::ResizeLeft { id: region.id };
        }
        if (x - right).abs() <= EDGE_GRAB_PX {
            return DragKind::ResizeRight { id: region.id };
        }
        if x > left && x < right {
            return DragKind::Move {
                id: region.id,
                grab_offset: x_to_time(x) - region.start,
            };
        }
    }
    DragKind::Select {
        anchor: x_to_time(x),
        region: None,
    }
}

/// Advance one drag frame. Returns a replacement drag state when it changed
/// (a selection drag acquires its region id on first movement past the slop).
fn apply_drag(
    handle: &mut WaveformHandle,
    kind: DragKind,
    t: f64,
    width: f32,
    duration: f64,
) -> Option<DragKind> {
    match kind {
        DragKind::Select { anchor, region } => {
            let slop_time = (CREATE_SLOP_PX / width) as f64 * duration;
            let (lo, hi) = if t < anchor { (t, anchor) } else { (anchor, t) };
            match region {
                None if hi - lo > slop_time => {
                    let id = handle.add_region(lo, hi);
                    Some(DragKind::Select {
                        anchor,
                        region: Some(id),
                    })
                }
                Some(id) => {
                    handle.update_region(id, lo, hi);
                    None
                }
                None => None,
            }
        }
        DragKind::ResizeLeft { id } => {
            if let Some(region) = handle.regions().iter().find(|r| r.id == id) {
                let end = region.end;
                handle.update_region(id, t, end);
            }
            None
        }
        DragKind::ResizeRight { id } => {
            if let Some(region) = handle.regions().iter().find(|r| r.id == id) {
                let start = region.start;
                handle.update_region(id, start, t);
            }
            None
        }
        DragKind::Move { id, grab_offset } => {
            if let Some(region) = handle.regions().iter().find(|r| r.id == id) {
                let len = region.end - region.start;
                let start = (t - grab_offset).clamp(0.0, duration - len);
                handle.update_region(id, start, start + len);
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::waveform::{WaveformData, WaveformEvent};

    fn handle() -> WaveformHandle {
        let mut h = WaveformHandle::new(WaveformData {
            duration: 40.0,
            peaks: vec![0.5; 10],
        });
        while h.poll_event().is_some() {}
        h
    }

    #[test]
    fn test_select_drag_creates_after_slop() {
        let mut h = handle();
        let kind = DragKind::Select {
            anchor: 10.0,
            region: None,
        };
        // within slop: nothing created
        let slop = (CREATE_SLOP_PX / 200.0) as f64 * 40.0;
        let next = apply_drag(&mut h, kind, 10.0 + slop / 2.0, 200.0, 40.0);
        assert!(next.is_none());
        assert!(h.regions().is_empty());
        // past slop: region created covering anchor..t
        let next = apply_drag(&mut h, kind, 15.0, 200.0, 40.0);
        assert!(matches!(
            next,
            Some(DragKind::Select {
                region: Some(_),
                ..
            })
        ));
        assert_eq!(h.regions().len(), 1);
        assert!(matches!(
            h.poll_event(),
            Some(WaveformEvent::RegionCreated { start, end, .. })
                if start == 10.0 && end == 15.0
        ));
    }

    #[test]
    fn test_move_drag_preserves_length() {
        let mut h = handle();
        let id = h.add_region(5.0, 15.0);
        let _ = h.poll_event();
        apply_drag(
            &mut h,
            DragKind::Move {
                id,
                grab_offset: 2.0,
            },
            30.0,
            200.0,
            40.0,
        );
        let region = &h.regions()[0];
        assert_eq!(region.start, 28.0);
        assert_eq!(region.end, 38.0);
        // moving past the right edge clamps to the clip
        apply_drag(
            &mut h,
            DragKind::Move {
                id,
                grab_offset: 0.0,
            },
            39.0,
            200.0,
            40.0,
        );
        let region = &h.regions()[0];
        assert_eq!(region.end - region.start, 10.0);
        assert_eq!(region.end, 40.0);
    }

    #[test]
    fn test_resize_emits_updates() {
        let mut h = handle();
        let id = h.add_region(5.0, 15.0);
        let _ = h.poll_event();
        apply_drag(&mut h, DragKind::ResizeRight { id }, 25.0, 200.0, 40.0);
        assert!(matches!(
            h.poll_event(),
            Some(WaveformEvent::RegionUpdated { start, end, .. })
                if start == 5.0 && end == 25.0
        ));
    }
}
