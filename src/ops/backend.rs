//! HTTP client for the remote clip backend. JSON in, JSON (or MP3 bytes) out;
//! the backend owns all Twitch and media handling.

use std::io::Read;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound for a downloaded MP3 payload.
const MAX_DOWNLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Failure categories for backend calls. Application-level failures carry the
/// backend's error text verbatim; connection-level failures are distinguished
/// so the UI can show a "cannot connect" message instead.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend error: {body}")]
    Backend { status: u16, body: String },
    #[error("Cannot connect to backend server: {0}")]
    Transport(String),
    #[error("Malformed backend response: {0}")]
    Response(String),
}

#[derive(Serialize)]
struct ClipRequest<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ClipUrlResponse {
    #[serde(rename = "clipUrl")]
    clip_url: String,
}

#[derive(Deserialize)]
struct MetadataResponse {
    duration: f64,
}

#[derive(Serialize)]
struct DownloadRequest<'a> {
    url: &'a str,
    start: f64,
    end: f64,
}

pub struct BackendClient {
    agent: ureq::Agent,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .build();
        BackendClient {
            agent,
            base_url: base_url.into(),
        }
    }

    /// Resolve a clip page URL to a playable media URL.
    pub fn get_clip_url(&self, url: &str) -> Result<String, BackendError> {
        let response = self
            .agent
            .post(&format!("{}/get-clip-url", self.base_url))
            .send_json(ClipRequest { url })
            .map_err(map_ureq_error)?;
        let parsed: ClipUrlResponse = response
            .into_json()
            .map_err(|e| BackendError::Response(e.to_string()))?;
        if parsed.clip_url.is_empty() {
            return Err(BackendError::Response(
                "no clip URL received from backend".into(),
            ));
        }
        info!(clip_url = %parsed.clip_url, "clip URL resolved");
        Ok(parsed.clip_url)
    }

    /// Best-effort duration lookup. Callers must tolerate this endpoint being
    /// absent or failing.
    pub fn get_audio_metadata(&self, url: &str) -> Result<f64, BackendError> {
        let response = self
            .agent
            .post(&format!("{}/get-audio-metadata", self.base_url))
            .send_json(ClipRequest { url })
            .map_err(map_ureq_error)?;
        let parsed: MetadataResponse = response
            .into_json()
            .map_err(|e| BackendError::Response(e.to_string()))?;
        Ok(parsed.duration)
    }

    /// Request the trimmed MP3 for `[start, end]` of the clip.
    pub fn download(&self, url: &str, start: f64, end: f64) -> Result<Vec<u8>, BackendError> {
        let response = self
            .agent
            .post(&format!("{}/download", self.base_url))
            .send_json(DownloadRequest { url, start, end })
            .map_err(map_ureq_error)?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_DOWNLOAD_BYTES as u64)
            .read_to_end(&mut bytes)
            .map_err(|e| BackendError::Response(e.to_string()))?;
        info!(bytes = bytes.len(), start, end, "trimmed clip downloaded");
        Ok(bytes)
    }
}

fn map_ureq_error(err: ureq::Error) -> BackendError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response
                .into_string()
                .unwrap_or_else(|_| "unreadable error body".into());
            warn!(status, %body, "backend returned an error");
            BackendError::Backend { status, body }
        }
        ureq::Error::Transport(transport) => BackendError::Transport(transport.to_string()),
    }
}

/// Timestamped filename for a finished download, e.g.
/// `clip-2024-06-09T12-30-05.mp3`.
pub fn download_filename(now: OffsetDateTime) -> String {
    let fmt = format_description!("[year]-[month]-[day]T[hour]-[minute]-[second]");
    match now.format(&fmt) {
        Ok(stamp) => format!("clip-{}.mp3", stamp),
        Err(_) => "clip.mp3".into(),
    }
}
