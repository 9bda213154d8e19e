//! Input adapters: each maps one physical input source onto region model
//! mutations. Adapters never talk to each other and never touch the display
//! surfaces; accepted mutations are followed by a broadcast pass.

use tracing::debug;

use crate::ops::broadcast::format_seconds;
use crate::types::region::{NUDGE_STEP, Region};
use crate::types::waveform::{OverlaySurface, WaveformEvent, WaveformHandle};

/// Feed one waveform notification into the region model.
///
/// On `RegionCreated` every other region on the display is removed first so
/// exactly one selection exists at a time; the surviving bounds are then
/// forwarded atomically. Returns true when the model accepted the update.
pub fn apply_waveform_event(
    region: &mut Region,
    handle: &mut WaveformHandle,
    event: &WaveformEvent,
) -> bool {
    match *event {
        WaveformEvent::RegionCreated { id, start, end } => {
            handle.clear_regions_except(id);
            let accepted = region.set_region(start, end);
            debug!(start, end, accepted, "drag selection created");
            accepted
        }
        WaveformEvent::RegionUpdated { start, end, .. } => region.set_region(start, end),
        _ => false,
    }
}

/// Pointer went down on the overlay strip at `x` (surface-local px).
pub fn overlay_pointer_down(overlay: &mut OverlaySurface, x: f32) {
    overlay.gesture = Some((x, x));
}

/// Pointer moved while a gesture is in flight.
pub fn overlay_pointer_move(overlay: &mut OverlaySurface, x: f32) {
    if let Some((anchor, _)) = overlay.gesture {
        overlay.gesture = Some((anchor, x));
    }
}

/// Pointer released: map the gesture from pixel space to seconds and apply it.
///
/// `x / width` gives a fractional position which is scaled by `duration`.
/// Guards a zero-width surface, tolerates right-to-left drags, and clamps the
/// far edge to the duration. Returns true when the model accepted the region.
pub fn overlay_pointer_up(overlay: &mut OverlaySurface, region: &mut Region, duration: f64) -> bool {
    let Some((anchor, release)) = overlay.gesture.take() else {
        return false;
    };
    if overlay.width_px <= 0.0 || duration <= 0.0 {
        return false;
    }
    let (left, right) = if anchor <= release {
        (anchor, release)
    } else {
        (release, anchor)
    };
    let start = (left / overlay.width_px).max(0.0) as f64 * duration;
    let end = ((right / overlay.width_px) as f64 * duration).min(duration);
    let accepted = region.set_region(start, end);
    if accepted {
        overlay.committed_px = Some((left, right));
    }
    debug!(start, end, accepted, "overlay selection");
    accepted
}

/// Which bound a numeric field edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

/// A committed-on-blur numeric time field.
///
/// The text buffer is free-form while the user types; on commit it is parsed
/// and proposed to the region model. A parse failure or model rejection
/// reverts the text to the last accepted value instead of mutating anything.
#[derive(Debug)]
pub struct NumericField {
    pub bound: Bound,
    pub text: String,
    pub has_focus: bool,
    last_accepted: f64,
}

impl NumericField {
    pub fn new(bound: Bound, value: f64) -> Self {
        NumericField {
            bound,
            text: format_seconds(value),
            has_focus: false,
            last_accepted: value,
        }
    }

    /// Parse and propose the field's text. Returns true when the model
    /// accepted the new value.
    pub fn commit(&mut self, region: &mut Region) -> bool {
        let accepted = match self.text.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => match self.bound {
                Bound::Start => region.set_start(value),
                Bound::End => region.set_end(value),
            },
            _ => false,
        };
        if accepted {
            self.last_accepted = match self.bound {
                Bound::Start => region.start,
                Bound::End => region.end,
            };
            self.text = format_seconds(self.last_accepted);
        } else {
            self.text = format_seconds(self.last_accepted);
        }
        accepted
    }

    /// Keyboard fine adjustment: +/- one step, clamped to the legal range.
    pub fn step(&mut self, region: &mut Region, direction: f64) -> bool {
        let delta = direction.signum() * NUDGE_STEP;
        let accepted = match self.bound {
            Bound::Start => region.nudge_start(delta),
            Bound::End => region.nudge_end(delta),
        };
        if accepted {
            self.last_accepted = match self.bound {
                Bound::Start => region.start,
                Bound::End => region.end,
            };
            self.text = format_seconds(self.last_accepted);
        }
        accepted
    }
}

impl crate::ops::broadcast::RegionDisplay for NumericField {
    fn show_region(&mut self, start: f64, end: f64) {
        // do not clobber text the user is in the middle of editing
        if self.has_focus {
            return;
        }
        let value = match self.bound {
            Bound::Start => start,
            Bound::End => end,
        };
        self.last_accepted = value;
        self.text = format_seconds(value);
    }
}

/// Playback-clock adapter: while playing, the playback position is proposed
/// as the region start for scrubbing feedback, but never while the start
/// field has input focus (that would fight the user's typing).
pub fn apply_playback_position(
    region: &mut Region,
    playback_time: f64,
    start_field_focused: bool,
) -> bool {
    if start_field_focused {
        return false;
    }
    let mut t = playback_time;
    if let Some(d) = region.duration {
        t = t.min(d);
    }
    region.set_start(t)
}
