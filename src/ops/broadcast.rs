use crate::types::region::Region;
use crate::types::session::EditorSurface;

/// A display surface that mirrors the canonical region.
pub trait RegionDisplay {
    /// Called with the region's current bounds after every accepted mutation.
    fn show_region(&mut self, start: f64, end: f64);
}

/// Two-decimal display formatting for region readouts.
pub fn format_seconds(t: f64) -> String {
    format!("{:.2}", t)
}

/// Push the current region to every registered display surface.
///
/// Runs after each accepted region mutation regardless of which adapter
/// caused it, so no readout can drift from the model.
pub fn sync_displays(region: &Region, displays: &mut [&mut dyn RegionDisplay]) {
    for display in displays {
        display.show_region(region.start, region.end);
    }
}

/// The waveform's visual region rectangle is itself a display surface; keep
/// it matched to the model without echoing an input event back.
impl RegionDisplay for EditorSurface {
    fn show_region(&mut self, start: f64, end: f64) {
        match self {
            EditorSurface::WaveformBacked(handle) => handle.sync_region(start, end),
            // the overlay widget derives its highlight strip from the region
            // each frame, so there is no pixel state to push here
            EditorSurface::ManualOverlay(_) | EditorSurface::Unavailable => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::waveform::{WaveformData, WaveformHandle};

    struct Readout {
        start: String,
        end: String,
    }

    impl RegionDisplay for Readout {
        fn show_region(&mut self, start: f64, end: f64) {
            self.start = format_seconds(start);
            self.end = format_seconds(end);
        }
    }

    #[test]
    fn test_format_seconds_two_decimals() {
        assert_eq!(format_seconds(0.0), "0.00");
        assert_eq!(format_seconds(37.2), "37.20");
        assert_eq!(format_seconds(5.005), "5.01");
    }

    #[test]
    fn test_sync_updates_all_displays() {
        let mut region = Region::placeholder();
        region.set_duration(40.0);
        assert!(region.set_region(5.0, 20.0));

        let mut first = Readout {
            start: String::new(),
            end: String::new(),
        };
        let mut second = Readout {
            start: String::new(),
            end: String::new(),
        };
        sync_displays(&region, &mut [&mut first, &mut second]);
        assert_eq!(first.start, "5.00");
        assert_eq!(first.end, "20.00");
        assert_eq!(second.start, "5.00");
        assert_eq!(second.end, "20.00");
    }

    #[test]
    fn test_waveform_surface_mirrors_region() {
        let mut region = Region::placeholder();
        region.set_duration(40.0);
        region.set_region(3.0, 9.0);

        let mut handle = WaveformHandle::new(WaveformData {
            duration: 40.0,
            peaks: vec![0.2; 4],
        });
        handle.add_region(0.0, 40.0);
        while handle.poll_event().is_some() {}

        let mut surface = EditorSurface::WaveformBacked(handle);
        sync_displays(&region, &mut [&mut surface]);
        match &mut surface {
            EditorSurface::WaveformBacked(handle) => {
                assert_eq!(handle.regions()[0].start, 3.0);
                assert_eq!(handle.regions()[0].end, 9.0);
                // display sync must not feed back as an input event
                assert_eq!(handle.poll_event(), None);
            }
            _ => unreachable!(),
        }
    }
}
