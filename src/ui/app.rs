use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;
use std::time::{Duration, Instant};

use eframe::egui;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ops::adapters::{
    Bound, NumericField, apply_playback_position, apply_waveform_event,
};
use crate::ops::backend::{BackendClient, BackendError, download_filename};
use crate::ops::broadcast::sync_displays;
use crate::ops::waveform_load::WaveformLoader;
use crate::types::session::{ClipSession, EditorState, EditorSurface, SessionStatus};
use crate::types::waveform::{WaveformData, WaveformEvent};
use crate::ui::i18n::{Labels, Language, labels};
use crate::ui::overlay_widget::overlay_view;
use crate::ui::waveform_widget::waveform_view;

/// Result of a background task, tagged with the session it was started for.
/// Results whose session id no longer matches the live session are dropped so
/// a superseded request can never mutate a newer session.
enum WorkerMsg {
    ClipResolved {
        session: Uuid,
        result: Result<String, BackendError>,
    },
    Metadata {
        session: Uuid,
        duration: f64,
    },
    WaveformLoaded {
        session: Uuid,
        result: Result<WaveformData, String>,
    },
    Downloaded {
        session: Uuid,
        result: Result<Vec<u8>, BackendError>,
    },
}

pub struct ClipTrimApp {
    backend: Arc<BackendClient>,
    loader: Arc<dyn WaveformLoader>,
    session: ClipSession,
    url_input: String,
    start_field: NumericField,
    end_field: NumericField,
    language: Language,
    status_line: Option<String>,
    download_in_flight: bool,
    last_playback_tick: Option<Instant>,
    tx: Sender<WorkerMsg>,
    rx: Receiver<WorkerMsg>,
}

impl ClipTrimApp {
    pub fn new(backend: BackendClient, loader: Arc<dyn WaveformLoader>) -> Self {
        let (tx, rx) = channel();
        ClipTrimApp {
            backend: Arc::new(backend),
            loader,
            session: ClipSession::idle(),
            url_input: String::new(),
            start_field: NumericField::new(Bound::Start, 0.0),
            end_field: NumericField::new(Bound::End, crate::types::region::PROVISIONAL_END),
            language: Language::En,
            status_line: None,
            download_in_flight: false,
            last_playback_tick: None,
            tx,
            rx,
        }
    }

    /// Push the canonical region to every display surface.
    fn broadcast(&mut self) {
        sync_displays(
            &self.session.region,
            &mut [
                &mut self.start_field,
                &mut self.end_field,
                &mut self.session.surface,
            ],
        );
    }

    /// Tear down the previous session and start the fetch cycle for the URL
    /// currently in the input field.
    fn submit_url(&mut self) {
        let url = self.url_input.trim().to_string();
        if url.is_empty() {
            self.status_line = Some("Please enter a Twitch clip URL.".into());
            return;
        }
        self.session.teardown();
        self.session = ClipSession::begin(url.clone());
        self.status_line = None;
        self.last_playback_tick = None;
        self.download_in_flight = false;
        self.broadcast();

        let session = self.session.id;
        let backend = Arc::clone(&self.backend);
        let loader = Arc::clone(&self.loader);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = backend.get_clip_url(&url);
            let clip_url = match &result {
                Ok(clip_url) => Some(clip_url.clone()),
                Err(_) => None,
            };
            let _ = tx.send(WorkerMsg::ClipResolved { session, result });
            let Some(clip_url) = clip_url else { return };

            // best-effort duration; tolerated to fail or be absent
            if let Ok(duration) = backend.get_audio_metadata(&url) {
                let _ = tx.send(WorkerMsg::Metadata { session, duration });
            }

            let result = loader
                .load(&clip_url)
                .map_err(|e| e.to_string());
            let _ = tx.send(WorkerMsg::WaveformLoaded { session, result });
        });
    }

    fn request_download(&mut self) {
        if self.session.source_url.is_empty() {
            self.status_line = Some("Please enter a Twitch clip URL.".into());
            return;
        }
        if !self.session.region.is_valid() {
            self.status_line = Some("Please select a valid region to trim.".into());
            return;
        }
        self.download_in_flight = true;
        let session = self.session.id;
        let backend = Arc::clone(&self.backend);
        let url = self.session.source_url.clone();
        let (start, end) = (self.session.region.start, self.session.region.end);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = backend.download(&url, start, end);
            let _ = tx.send(WorkerMsg::Downloaded { session, result });
        });
    }

    /// Apply background results on the UI thread, discarding stale ones.
    fn drain_worker_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                WorkerMsg::ClipResolved { session, result } => {
                    if session != self.session.id {
                        continue;
                    }
                    match result {
                        Ok(clip_url) => {
                            self.session.clip_resolved(clip_url, Instant::now());
                        }
                        Err(err) => {
                            self.session.load_failed();
                            self.status_line = Some(err.to_string());
                        }
                    }
                }
                WorkerMsg::Metadata { session, duration } => {
                    if session != self.session.id {
                        continue;
                    }
                    self.session.backend_duration = Some(duration);
                    if self.session.editor == EditorState::ManualFallback
                        && self.session.region.set_duration(duration)
                    {
                        self.broadcast();
                    }
                }
                WorkerMsg::WaveformLoaded { session, result } => {
                    if session != self.session.id {
                        warn!("discarding waveform result for a superseded session");
                        continue;
                    }
                    match result {
                        Ok(data) => {
                            if self.session.editor == EditorState::Loading {
                                self.session.waveform_ready(data);
                                self.drain_waveform_events();
                                self.broadcast();
                            } else {
                                // load finished after the fallback fired; still
                                // a usable duration source
                                self.session.media_duration = Some(data.duration);
                                if self.session.region.set_duration(data.duration) {
                                    self.broadcast();
                                }
                            }
                        }
                        Err(message) => {
                            info!(%message, "waveform load failed");
                            if self.session.editor == EditorState::Loading {
                                self.session.fall_back_to_manual(600.0);
                                self.broadcast();
                            }
                        }
                    }
                }
                WorkerMsg::Downloaded { session, result } => {
                    if session != self.session.id {
                        continue;
                    }
                    self.download_in_flight = false;
                    match result {
                        Ok(bytes) => self.save_download(&bytes),
                        Err(err) => self.status_line = Some(err.to_string()),
                    }
                }
            }
        }
    }

    fn save_download(&mut self, bytes: &[u8]) {
        let suggested = download_filename(OffsetDateTime::now_utc());
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(&suggested)
            .add_filter("MP3 audio", &["mp3"])
            .save_file()
        else {
            self.status_line = Some("Download cancelled.".into());
            return;
        };
        match std::fs::write(&path, bytes) {
            Ok(()) => {
                info!(path = %path.display(), "clip saved");
                self.status_line = Some(format!("Saved {}", path.display()));
            }
            Err(err) => self.status_line = Some(format!("Could not save file: {}", err)),
        }
    }

    /// Forward queued waveform notifications through the drag-selection
    /// adapter; broadcast after any selection event, accepted or not. A
    /// rejected drag has already moved the display's rectangle, so the
    /// re-sync is what snaps it back to the model's bounds.
    fn drain_waveform_events(&mut self) {
        let mut saw_selection = false;
        if let EditorSurface::WaveformBacked(handle) = &mut self.session.surface {
            while let Some(event) = handle.poll_event() {
                match event {
                    WaveformEvent::Ready { .. } | WaveformEvent::Loading { .. } => {}
                    WaveformEvent::Error { message } => {
                        warn!(%message, "waveform error");
                    }
                    event => {
                        saw_selection = true;
                        apply_waveform_event(&mut self.session.region, handle, &event);
                    }
                }
            }
        }
        if saw_selection {
            self.broadcast();
        }
    }

    /// Advance the playback clock and run the playback-position adapter.
    fn tick_playback(&mut self, ctx: &egui::Context) {
        let EditorSurface::WaveformBacked(handle) = &mut self.session.surface else {
            self.last_playback_tick = None;
            return;
        };
        if !handle.playing {
            self.last_playback_tick = None;
            return;
        }
        let now = Instant::now();
        if let Some(last) = self.last_playback_tick {
            let dt = now.duration_since(last).as_secs_f64();
            handle.playhead = (handle.playhead + dt).min(handle.duration());
            if handle.playhead >= handle.duration() {
                handle.playing = false;
            }
        }
        self.last_playback_tick = Some(now);

        let playhead = handle.playhead;
        let focused = self.start_field.has_focus;
        if apply_playback_position(&mut self.session.region, playhead, focused) {
            self.broadcast();
        }
        ctx.request_repaint_after(Duration::from_millis(33));
    }

    fn numeric_field_row(&mut self, ui: &mut egui::Ui, text: &Labels) {
        let mut changed = false;
        ui.horizontal(|ui| {
            for (label, bound) in [(text.start, Bound::Start), (text.end, Bound::End)] {
                let field = match bound {
                    Bound::Start => &mut self.start_field,
                    Bound::End => &mut self.end_field,
                };
                ui.label(label);
                let response =
                    ui.add(egui::TextEdit::singleline(&mut field.text).desired_width(64.0));
                field.has_focus = response.has_focus();
                if response.lost_focus() {
                    changed |= field.commit(&mut self.session.region);
                }
                if response.has_focus() {
                    if ui.input(|i| i.key_pressed(egui::Key::ArrowUp)) {
                        changed |= field.step(&mut self.session.region, 1.0);
                    }
                    if ui.input(|i| i.key_pressed(egui::Key::ArrowDown)) {
                        changed |= field.step(&mut self.session.region, -1.0);
                    }
                }
                ui.add_space(8.0);
            }
        });
        if changed {
            self.broadcast();
        }
    }

    fn editor_panel(&mut self, ui: &mut egui::Ui, text: &Labels) {
        match self.session.editor {
            EditorState::AwaitingClip | EditorState::LoadFailed => {}
            EditorState::Loading => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(text.loading);
                });
            }
            EditorState::WaveformReady => {
                if let EditorSurface::WaveformBacked(handle) = &mut self.session.surface {
                    waveform_view(ui, handle);
                }
                self.drain_waveform_events();

                ui.add_space(4.0);
                self.numeric_field_row(ui, text);
                ui.horizontal(|ui| {
                    if ui.button(text.play_pause).clicked() {
                        if let EditorSurface::WaveformBacked(handle) = &mut self.session.surface {
                            handle.play_pause();
                        }
                    }
                    self.download_button(ui, text);
                });
            }
            EditorState::ManualFallback => {
                ui.label(text.manual_hint);
                let duration = self.session.best_duration();
                let accepted =
                    if let EditorSurface::ManualOverlay(overlay) = &mut self.session.surface {
                        overlay_view(ui, overlay, &mut self.session.region, duration)
                    } else {
                        false
                    };
                if accepted {
                    self.broadcast();
                }
                ui.add_space(4.0);
                self.numeric_field_row(ui, text);
                ui.horizontal(|ui| {
                    self.download_button(ui, text);
                });
            }
        }
    }

    fn download_button(&mut self, ui: &mut egui::Ui, text: &Labels) {
        let enabled = self.session.status == SessionStatus::Ready && !self.download_in_flight;
        if ui
            .add_enabled(enabled, egui::Button::new(text.download))
            .clicked()
        {
            self.request_download();
        }
        if self.download_in_flight {
            ui.spinner();
            ui.label(text.loading);
        }
    }
}

impl eframe::App for ClipTrimApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_worker_messages();

        // decode deadline: Loading -> ManualFallback when the waveform load
        // has not finished in time
        if self.session.decode_timed_out(Instant::now()) {
            info!("waveform load deadline passed");
            self.session.fall_back_to_manual(600.0);
            self.broadcast();
        }

        self.tick_playback(ctx);

        let text = labels(self.language);

        egui::TopBottomPanel::top("header_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(text.title);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("日本語").clicked() {
                        self.language = Language::Jp;
                    }
                    if ui.button("English").clicked() {
                        self.language = Language::En;
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| {
            if let Some(status) = &self.status_line {
                ui.label(status);
            } else {
                ui.label("");
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                let fetching = self.session.status == SessionStatus::Loading;
                ui.add_enabled(
                    !fetching,
                    egui::TextEdit::singleline(&mut self.url_input)
                        .hint_text(text.placeholder)
                        .desired_width(320.0),
                );
                if ui
                    .add_enabled(!fetching, egui::Button::new(text.get_clip))
                    .clicked()
                {
                    self.submit_url();
                }
            });
            ui.separator();
            self.editor_panel(ui, text);
        });

        // while a fetch is outstanding, keep polling the worker channel
        if self.session.status == SessionStatus::Loading || self.download_in_flight {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::waveform_load::{WaveformLoadError, decode_wav_peaks};
    use crate::types::region::Region;

    struct FailingLoader;

    impl WaveformLoader for FailingLoader {
        fn load(&self, _clip_url: &str) -> Result<WaveformData, WaveformLoadError> {
            Err(WaveformLoadError::Decode("not audio".into()))
        }
    }

    fn app() -> ClipTrimApp {
        ClipTrimApp::new(
            BackendClient::new("http://127.0.0.1:1"),
            Arc::new(FailingLoader),
        )
    }

    #[test]
    fn test_initial_state_is_awaiting_clip() {
        let app = app();
        assert_eq!(app.session.editor, EditorState::AwaitingClip);
        assert_eq!(app.session.status, SessionStatus::Idle);
        assert_eq!(app.session.region, Region::placeholder());
    }

    #[test]
    fn test_stale_waveform_result_is_discarded() {
        let mut app = app();
        app.session = ClipSession::begin("https://clips.twitch.tv/a".into());
        let stale = Uuid::new_v4();
        app.tx
            .send(WorkerMsg::WaveformLoaded {
                session: stale,
                result: Ok(WaveformData {
                    duration: 99.0,
                    peaks: vec![0.5; 4],
                }),
            })
            .unwrap();
        app.drain_worker_messages();
        assert_eq!(app.session.editor, EditorState::Loading);
        assert!(app.session.region.duration.is_none());
    }

    #[test]
    fn test_end_to_end_drag_then_download_body() {
        // submit -> clip resolves -> duration 37.2 -> initial region {0, 37.2}
        // -> drag to {5, 20} -> download body carries exactly those bounds
        let mut app = app();
        app.session = ClipSession::begin("https://clips.twitch.tv/a".into());
        let id = app.session.id;
        app.tx
            .send(WorkerMsg::ClipResolved {
                session: id,
                result: Ok("https://x/y.mp4".into()),
            })
            .unwrap();
        app.tx
            .send(WorkerMsg::WaveformLoaded {
                session: id,
                result: Ok(WaveformData {
                    duration: 37.2,
                    peaks: vec![0.5; 4],
                }),
            })
            .unwrap();
        app.drain_worker_messages();
        assert_eq!(app.session.editor, EditorState::WaveformReady);
        assert_eq!(app.session.region.start, 0.0);
        assert_eq!(app.session.region.end, 37.2);
        assert_eq!(app.start_field.text, "0.00");
        assert_eq!(app.end_field.text, "37.20");

        // user drags the region edge
        if let EditorSurface::WaveformBacked(handle) = &mut app.session.surface {
            let region_id = handle.regions()[0].id;
            handle.update_region(region_id, 5.0, 20.0);
        }
        app.drain_waveform_events();
        assert_eq!(app.session.region.start, 5.0);
        assert_eq!(app.session.region.end, 20.0);
        assert_eq!(app.start_field.text, "5.00");
        assert_eq!(app.end_field.text, "20.00");

        // the download request body is exactly {url, start, end}
        let body = serde_json::json!({
            "url": app.session.source_url,
            "start": app.session.region.start,
            "end": app.session.region.end,
        });
        assert_eq!(
            body,
            serde_json::json!({
                "url": "https://clips.twitch.tv/a",
                "start": 5.0,
                "end": 20.0,
            })
        );
    }

    #[test]
    fn test_rejected_drag_resyncs_waveform_display() {
        let mut app = app();
        app.session = ClipSession::begin("https://clips.twitch.tv/a".into());
        app.session.waveform_ready(WaveformData {
            duration: 37.2,
            peaks: vec![0.5; 4],
        });
        app.drain_waveform_events();

        // right edge dragged onto the left edge: the display moved its
        // rectangle before the model could reject the degenerate range
        if let EditorSurface::WaveformBacked(handle) = &mut app.session.surface {
            let id = handle.regions()[0].id;
            handle.update_region(id, 20.0, 20.0);
        }
        app.drain_waveform_events();

        assert_eq!(app.session.region.start, 0.0);
        assert_eq!(app.session.region.end, 37.2);
        // the visual rectangle must snap back to the model's bounds
        if let EditorSurface::WaveformBacked(handle) = &app.session.surface {
            assert_eq!(handle.regions()[0].start, 0.0);
            assert_eq!(handle.regions()[0].end, 37.2);
        } else {
            panic!("expected waveform surface");
        }
        assert_eq!(app.start_field.text, "0.00");
        assert_eq!(app.end_field.text, "37.20");
    }

    #[test]
    fn test_failed_load_falls_back_and_flips_adapters() {
        let mut app = app();
        app.session = ClipSession::begin("https://clips.twitch.tv/a".into());
        app.session.backend_duration = Some(40.0);
        let id = app.session.id;
        app.tx
            .send(WorkerMsg::WaveformLoaded {
                session: id,
                result: Err("decode failed".into()),
            })
            .unwrap();
        app.drain_worker_messages();
        assert_eq!(app.session.editor, EditorState::ManualFallback);
        // drag-selection adapter has nothing to bind to any more
        assert!(!app.session.waveform_available());
        // the overlay adapter is live
        assert!(matches!(
            app.session.surface,
            EditorSurface::ManualOverlay(_)
        ));
        assert_eq!(app.session.region.end, 40.0);
    }

    #[test]
    fn test_backend_failure_returns_to_interactive_state() {
        let mut app = app();
        app.session = ClipSession::begin("https://clips.twitch.tv/a".into());
        let id = app.session.id;
        app.tx
            .send(WorkerMsg::ClipResolved {
                session: id,
                result: Err(BackendError::Backend {
                    status: 500,
                    body: "Clip fetch failed".into(),
                }),
            })
            .unwrap();
        app.drain_worker_messages();
        assert_eq!(app.session.editor, EditorState::LoadFailed);
        assert_eq!(app.session.status, SessionStatus::Failed);
        assert_eq!(
            app.status_line.as_deref(),
            Some("Backend error: Clip fetch failed")
        );
    }

    #[test]
    fn test_late_waveform_result_still_provides_duration() {
        let mut app = app();
        app.session = ClipSession::begin("https://clips.twitch.tv/a".into());
        app.session.fall_back_to_manual(600.0);
        let id = app.session.id;
        // loader finished after the deadline already fired
        let wav = {
            let spec = hound::WavSpec {
                channels: 1,
                sample_rate: 8000,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            };
            let mut cursor = std::io::Cursor::new(Vec::new());
            {
                let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
                for i in 0..16000i32 {
                    writer.write_sample((i % 1000) as i16).unwrap();
                }
                writer.finalize().unwrap();
            }
            cursor.into_inner()
        };
        let data = decode_wav_peaks(&wav).unwrap();
        app.tx
            .send(WorkerMsg::WaveformLoaded {
                session: id,
                result: Ok(data),
            })
            .unwrap();
        app.drain_worker_messages();
        // stays in fallback but picks up the real duration
        assert_eq!(app.session.editor, EditorState::ManualFallback);
        assert_eq!(app.session.media_duration, Some(2.0));
    }
}
