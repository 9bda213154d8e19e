use std::time::{Duration, Instant};

use tracing::info;
use uuid::Uuid;

use crate::types::region::Region;
use crate::types::waveform::{OverlaySurface, WaveformData, WaveformHandle};

/// How long the waveform load may take before the session falls back to the
/// manual pixel-overlay selector.
pub const DECODE_DEADLINE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// The editing surface's lifecycle.
///
/// `AwaitingClip -> Loading -> {WaveformReady | ManualFallback | LoadFailed}`,
/// and any state returns to `Loading` when a new clip URL is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    AwaitingClip,
    Loading,
    WaveformReady,
    ManualFallback,
    LoadFailed,
}

/// Which editing capability the session currently has.
///
/// Adapters switch on this tagged union instead of probing a display object's
/// shape at runtime.
#[derive(Debug)]
pub enum EditorSurface {
    Unavailable,
    WaveformBacked(WaveformHandle),
    ManualOverlay(OverlaySurface),
}

/// One fetch -> edit -> download cycle for a single clip URL.
///
/// Exactly one session is live at a time; the controller tears the previous
/// one down before starting a new fetch. The `id` is the staleness token:
/// background results are tagged with the session they were started for and
/// dropped when it no longer matches.
#[derive(Debug)]
pub struct ClipSession {
    pub id: Uuid,
    pub source_url: String,
    pub clip_url: Option<String>,
    pub status: SessionStatus,
    pub editor: EditorState,
    pub region: Region,
    pub surface: EditorSurface,
    /// Duration reported by the backend metadata endpoint, if any.
    pub backend_duration: Option<f64>,
    /// Duration reported by the native media element, if any.
    pub media_duration: Option<f64>,
    /// Deadline for the waveform load attempt, armed on clip resolution.
    pub decode_deadline: Option<Instant>,
}

impl ClipSession {
    /// Start a new session for `source_url`, in `Loading` with the
    /// placeholder region.
    pub fn begin(source_url: String) -> Self {
        let id = Uuid::new_v4();
        info!(session = %id, url = %source_url, "session started");
        ClipSession {
            id,
            source_url,
            clip_url: None,
            status: SessionStatus::Loading,
            editor: EditorState::Loading,
            region: Region::placeholder(),
            surface: EditorSurface::Unavailable,
            backend_duration: None,
            media_duration: None,
            decode_deadline: None,
        }
    }

    /// Empty session shown before any URL has been submitted.
    pub fn idle() -> Self {
        ClipSession {
            id: Uuid::new_v4(),
            source_url: String::new(),
            clip_url: None,
            status: SessionStatus::Idle,
            editor: EditorState::AwaitingClip,
            region: Region::placeholder(),
            surface: EditorSurface::Unavailable,
            backend_duration: None,
            media_duration: None,
            decode_deadline: None,
        }
    }

    /// Release the session's resources: stop playback polling and discard any
    /// live waveform instance. Called before a replacement session starts.
    pub fn teardown(&mut self) {
        if let EditorSurface::WaveformBacked(handle) = &mut self.surface {
            handle.destroy();
        }
        self.surface = EditorSurface::Unavailable;
        self.decode_deadline = None;
        info!(session = %self.id, "session torn down");
    }

    /// The clip URL resolved; arm the decode deadline.
    pub fn clip_resolved(&mut self, clip_url: String, now: Instant) {
        self.clip_url = Some(clip_url);
        self.decode_deadline = Some(now + DECODE_DEADLINE);
    }

    /// Waveform load succeeded before the deadline: enter waveform-backed
    /// editing with an initial region spanning the whole clip.
    pub fn waveform_ready(&mut self, data: WaveformData) {
        let duration = data.duration;
        let mut handle = WaveformHandle::new(data);
        self.region.set_duration(duration);
        self.region.set_region(0.0, duration);
        handle.add_region(self.region.start, self.region.end);
        self.surface = EditorSurface::WaveformBacked(handle);
        self.status = SessionStatus::Ready;
        self.editor = EditorState::WaveformReady;
        self.decode_deadline = None;
        info!(session = %self.id, duration, "waveform ready");
    }

    /// Waveform load failed or timed out: degrade to the pixel-overlay
    /// selector using the best duration still available.
    pub fn fall_back_to_manual(&mut self, surface_width_px: f32) {
        let duration = self.best_duration();
        self.region.set_duration(duration);
        self.region.set_region(0.0, duration);
        self.surface = EditorSurface::ManualOverlay(OverlaySurface::new(surface_width_px));
        self.status = SessionStatus::Ready;
        self.editor = EditorState::ManualFallback;
        self.decode_deadline = None;
        info!(session = %self.id, duration, "falling back to manual selection");
    }

    /// The clip-URL fetch itself failed; no editing surface.
    pub fn load_failed(&mut self) {
        self.teardown();
        self.status = SessionStatus::Failed;
        self.editor = EditorState::LoadFailed;
    }

    /// Whether the decode deadline has passed while still loading.
    pub fn decode_timed_out(&self, now: Instant) -> bool {
        self.editor == EditorState::Loading
            && self.decode_deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Best available duration: backend metadata, then native media metadata,
    /// then the provisional default.
    pub fn best_duration(&self) -> f64 {
        self.backend_duration
            .or(self.media_duration)
            .unwrap_or(crate::types::region::PROVISIONAL_END)
    }

    pub fn waveform_available(&self) -> bool {
        matches!(self.surface, EditorSurface::WaveformBacked(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(duration: f64) -> WaveformData {
        WaveformData {
            duration,
            peaks: vec![0.3; 16],
        }
    }

    #[test]
    fn test_begin_enters_loading_with_placeholder() {
        let session = ClipSession::begin("https://clips.twitch.tv/x".into());
        assert_eq!(session.status, SessionStatus::Loading);
        assert_eq!(session.editor, EditorState::Loading);
        assert_eq!(session.region, Region::placeholder());
        assert!(!session.waveform_available());
    }

    #[test]
    fn test_waveform_ready_spans_full_clip() {
        let mut session = ClipSession::begin("u".into());
        session.waveform_ready(data(37.2));
        assert_eq!(session.editor, EditorState::WaveformReady);
        assert_eq!(session.status, SessionStatus::Ready);
        assert_eq!(session.region.start, 0.0);
        assert_eq!(session.region.end, 37.2);
        assert!(session.waveform_available());
        match &session.surface {
            EditorSurface::WaveformBacked(handle) => {
                assert_eq!(handle.regions().len(), 1);
            }
            other => panic!("expected waveform surface, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_timeout_triggers_manual_fallback() {
        let mut session = ClipSession::begin("u".into());
        let t0 = Instant::now();
        session.clip_resolved("https://x/y.mp4".into(), t0);
        assert!(!session.decode_timed_out(t0 + Duration::from_millis(500)));
        let late = t0 + DECODE_DEADLINE + Duration::from_millis(1);
        assert!(session.decode_timed_out(late));
        session.fall_back_to_manual(400.0);
        assert_eq!(session.editor, EditorState::ManualFallback);
        assert!(!session.waveform_available());
        assert!(matches!(session.surface, EditorSurface::ManualOverlay(_)));
        // once fallen back, the deadline no longer fires
        assert!(!session.decode_timed_out(late + Duration::from_secs(10)));
    }

    #[test]
    fn test_best_duration_prefers_backend_metadata() {
        let mut session = ClipSession::begin("u".into());
        assert_eq!(
            session.best_duration(),
            crate::types::region::PROVISIONAL_END
        );
        session.media_duration = Some(25.0);
        assert_eq!(session.best_duration(), 25.0);
        session.backend_duration = Some(31.5);
        assert_eq!(session.best_duration(), 31.5);
    }

    #[test]
    fn test_fallback_uses_best_duration() {
        let mut session = ClipSession::begin("u".into());
        session.backend_duration = Some(18.0);
        session.fall_back_to_manual(300.0);
        assert_eq!(session.region.end, 18.0);
        assert_eq!(session.region.duration, Some(18.0));
    }

    #[test]
    fn test_teardown_destroys_waveform() {
        let mut session = ClipSession::begin("u".into());
        session.waveform_ready(data(12.0));
        session.teardown();
        assert!(matches!(session.surface, EditorSurface::Unavailable));
    }

    #[test]
    fn test_load_failed_clears_surface() {
        let mut session = ClipSession::begin("u".into());
        session.waveform_ready(data(12.0));
        session.load_failed();
        assert_eq!(session.status, SessionStatus::Failed);
        assert_eq!(session.editor, EditorState::LoadFailed);
        assert!(matches!(session.surface, EditorSurface::Unavailable));
    }
}
