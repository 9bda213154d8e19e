/// Provisional end time used before the clip's real duration is known.
pub const PROVISIONAL_END: f64 = 30.0;

/// Keyboard fine-adjustment step in seconds.
pub const NUDGE_STEP: f64 = 0.1;

/// Minimum gap kept between start and end when nudging.
pub const MIN_GAP: f64 = 0.1;

/// The canonical trim selection, in seconds.
///
/// All mutators validate their input and return whether the mutation was
/// accepted. A rejected mutation leaves the region untouched; degenerate
/// ranges (start >= end) are rejected rather than swapped or clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub start: f64,
    pub end: f64,
    /// Upper bound for `end`, once some source has reported the real duration.
    pub duration: Option<f64>,
}

impl Region {
    /// Placeholder region used the instant a clip is requested.
    pub fn placeholder() -> Self {
        Region {
            start: 0.0,
            end: PROVISIONAL_END,
            duration: None,
        }
    }

    /// Record the media duration. Clamps `end` down when it exceeds the new
    /// bound; if clamping made the range degenerate, resets `start` to 0.
    pub fn set_duration(&mut self, d: f64) -> bool {
        if d <= 0.0 {
            return false;
        }
        self.duration = Some(d);
        if self.end > d {
            self.end = d;
            if self.start >= self.end {
                self.start = 0.0;
            }
        }
        true
    }

    pub fn set_start(&mut self, t: f64) -> bool {
        if t < 0.0 || t >= self.end {
            return false;
        }
        self.start = t;
        true
    }

    pub fn set_end(&mut self, t: f64) -> bool {
        if t <= self.start {
            return false;
        }
        if let Some(d) = self.duration {
            if t > d {
                return false;
            }
        }
        self.end = t;
        true
    }

    /// Atomic two-field update. Rejects the pair as a whole when invalid.
    pub fn set_region(&mut self, s: f64, e: f64) -> bool {
        if s < 0.0 || s >= e {
            return false;
        }
        if let Some(d) = self.duration {
            if e > d {
                return false;
            }
        }
        self.start = s;
        self.end = e;
        true
    }

    /// Move `start` by `delta`, clamped into `[0, end - MIN_GAP]`.
    pub fn nudge_start(&mut self, delta: f64) -> bool {
        let target = (self.start + delta).min(self.end - MIN_GAP).max(0.0);
        if target >= self.end {
            return false;
        }
        self.start = target;
        true
    }

    /// Move `end` by `delta`, clamped into `[start + MIN_GAP, duration]`.
    pub fn nudge_end(&mut self, delta: f64) -> bool {
        let mut target = (self.end + delta).max(self.start + MIN_GAP);
        if let Some(d) = self.duration {
            target = target.min(d);
        }
        if target <= self.start {
            return false;
        }
        self.end = target;
        true
    }

    /// True when the current range satisfies `0 <= start < end <= duration`.
    pub fn is_valid(&self) -> bool {
        let within_bound = match self.duration {
            Some(d) => self.end <= d,
            None => true,
        };
        self.start >= 0.0 && self.start < self.end && within_bound
    }
}
