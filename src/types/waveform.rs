use std::collections::VecDeque;

/// Notification emitted by the waveform display.
#[derive(Debug, Clone, PartialEq)]
pub enum WaveformEvent {
    /// Audio finished loading; carries the resolved duration in seconds.
    Ready { duration: f64 },
    RegionCreated { id: u64, start: f64, end: f64 },
    RegionUpdated { id: u64, start: f64, end: f64 },
    Loading { percent: u8 },
    Error { message: String },
}

/// A selection rectangle owned by the waveform display.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformRegion {
    pub id: u64,
    pub start: f64,
    pub end: f64,
}

/// Decoded peak data backing a waveform display.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformData {
    pub duration: f64,
    /// Normalized amplitude peaks in [0, 1], one per display bucket.
    pub peaks: Vec<f32>,
}

/// Handle to a live waveform display.
///
/// The drag-selection widget and tests both talk to the region model through
/// this handle: interactions push events onto an internal queue which the
/// session controller drains each frame.
#[derive(Debug)]
pub struct WaveformHandle {
    pub data: WaveformData,
    pub playing: bool,
    pub playhead: f64,
    regions: Vec<WaveformRegion>,
    events: VecDeque<WaveformEvent>,
    next_region_id: u64,
    destroyed: bool,
}

impl WaveformHandle {
    pub fn new(data: WaveformData) -> Self {
        let duration = data.duration;
        let mut handle = WaveformHandle {
            data,
            playing: false,
            playhead: 0.0,
            regions: Vec::new(),
            events: VecDeque::new(),
            next_region_id: 1,
            destroyed: false,
        };
        handle.events.push_back(WaveformEvent::Ready { duration });
        handle
    }

    pub fn duration(&self) -> f64 {
        self.data.duration
    }

    /// Add a region and emit `RegionCreated`. Returns the new region's id.
    pub fn add_region(&mut self, start: f64, end: f64) -> u64 {
        let id = self.next_region_id;
        self.next_region_id += 1;
        self.regions.push(WaveformRegion { id, start, end });
        self.events
            .push_back(WaveformEvent::RegionCreated { id, start, end });
        id
    }

    /// Move an existing region's bounds and emit `RegionUpdated`.
    pub fn update_region(&mut self, id: u64, start: f64, end: f64) {
        if let Some(region) = self.regions.iter_mut().find(|r| r.id == id) {
            region.start = start;
            region.end = end;
            self.events
                .push_back(WaveformEvent::RegionUpdated { id, start, end });
        }
    }

    /// Silently resize a region without emitting an event. Used by the sync
    /// broadcaster so display updates do not echo back as input.
    pub fn sync_region(&mut self, start: f64, end: f64) {
        if let Some(region) = self.regions.first_mut() {
            region.start = start;
            region.end = end;
        }
    }

    /// Drop every region except `keep`, enforcing the single-active-region
    /// policy after a drag creates a new one.
    pub fn clear_regions_except(&mut self, keep: u64) {
        self.regions.retain(|r| r.id == keep);
    }

    pub fn regions(&self) -> &[WaveformRegion] {
        &self.regions
    }

    pub fn play_pause(&mut self) {
        self.playing = !self.playing;
    }

    pub fn poll_event(&mut self) -> Option<WaveformEvent> {
        self.events.pop_front()
    }

    pub fn destroy(&mut self) {
        self.playing = false;
        self.regions.clear();
        self.events.clear();
        self.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

/// Descriptor for the fallback selection strip used when no audio could be
/// decoded. Selection happens purely in pixel space and is mapped to seconds
/// by the overlay adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySurface {
    pub width_px: f32,
    /// In-flight pointer gesture as (anchor x, current x), in surface-local px.
    pub gesture: Option<(f32, f32)>,
    /// Last committed selection in pixel space, kept for drawing.
    pub committed_px: Option<(f32, f32)>,
}

impl OverlaySurface {
    pub fn new(width_px: f32) -> Self {
        OverlaySurface {
            width_px,
            gesture: None,
            committed_px: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> WaveformHandle {
        WaveformHandle::new(WaveformData {
            duration: 40.0,
            peaks: vec![0.5; 8],
        })
    }

    #[test]
    fn test_new_handle_reports_ready() {
        let mut h = handle();
        assert_eq!(h.poll_event(), Some(WaveformEvent::Ready { duration: 40.0 }));
        assert_eq!(h.poll_event(), None);
    }

    #[test]
    fn test_add_region_emits_created() {
        let mut h = handle();
        let _ = h.poll_event();
        let id = h.add_region(0.0, 40.0);
        assert_eq!(
            h.poll_event(),
            Some(WaveformEvent::RegionCreated {
                id,
                start: 0.0,
                end: 40.0
            })
        );
        assert_eq!(h.regions().len(), 1);
    }

    #[test]
    fn test_clear_regions_except_keeps_one() {
        let mut h = handle();
        let _first = h.add_region(0.0, 5.0);
        let second = h.add_region(10.0, 15.0);
        h.clear_regions_except(second);
        assert_eq!(h.regions().len(), 1);
        assert_eq!(h.regions()[0].id, second);
    }

    #[test]
    fn test_sync_region_is_silent() {
        let mut h = handle();
        let _ = h.poll_event();
        h.add_region(0.0, 40.0);
        let _ = h.poll_event();
        h.sync_region(3.0, 9.0);
        assert_eq!(h.poll_event(), None);
        assert_eq!(h.regions()[0].start, 3.0);
        assert_eq!(h.regions()[0].end, 9.0);
    }

    #[test]
    fn test_destroy_clears_everything() {
        let mut h = handle();
        h.add_region(0.0, 5.0);
        h.playing = true;
        h.destroy();
        assert!(h.is_destroyed());
        assert!(!h.playing);
        assert!(h.regions().is_empty());
        assert_eq!(h.poll_event(), None);
    }
}
