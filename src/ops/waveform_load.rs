//! Loading audio peaks for the waveform display.
//!
//! The clip URL is fetched and decoded into display peaks. Only WAV payloads
//! are decoded here; anything else (typical CDN MP4s, cross-origin blocks,
//! truncated bodies) surfaces as a load error and the session degrades to the
//! manual pixel-overlay selector instead of aborting.

use std::io::{Cursor, Read};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::types::waveform::WaveformData;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_AUDIO_BYTES: usize = 50 * 1024 * 1024;

/// Number of amplitude buckets rendered by the waveform widget.
const PEAK_BUCKETS: usize = 600;

#[derive(Debug, Error)]
pub enum WaveformLoadError {
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("Audio decode error: {0}")]
    Decode(String),
    #[error("Audio stream is empty")]
    Empty,
}

/// Capability to turn a clip URL into waveform peaks. The session controller
/// runs a loader on a worker thread and races it against the decode deadline.
pub trait WaveformLoader: Send + Sync {
    fn load(&self, clip_url: &str) -> Result<WaveformData, WaveformLoadError>;
}

/// Loader that fetches the clip over HTTP and decodes WAV payloads.
pub struct HttpWaveformLoader {
    agent: ureq::Agent,
}

impl HttpWaveformLoader {
    pub fn new() -> Self {
        HttpWaveformLoader {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(FETCH_TIMEOUT)
                .timeout_read(FETCH_TIMEOUT)
                .build(),
        }
    }
}

impl Default for HttpWaveformLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveformLoader for HttpWaveformLoader {
    fn load(&self, clip_url: &str) -> Result<WaveformData, WaveformLoadError> {
        let response = self.agent.get(clip_url).call().map_err(|e| {
            WaveformLoadError::Fetch {
                url: clip_url.to_string(),
                message: e.to_string(),
            }
        })?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_AUDIO_BYTES as u64)
            .read_to_end(&mut bytes)
            .map_err(|e| WaveformLoadError::Fetch {
                url: clip_url.to_string(),
                message: e.to_string(),
            })?;
        debug!(bytes = bytes.len(), url = %clip_url, "audio payload fetched");
        decode_wav_peaks(&bytes)
    }
}

/// Decode a WAV payload into normalized display peaks and a duration.
pub fn decode_wav_peaks(bytes: &[u8]) -> Result<WaveformData, WaveformLoadError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| WaveformLoadError::Decode(e.to_string()))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(WaveformLoadError::Decode("zero sample rate".into()));
    }
    let duration = reader.duration() as f64 / spec.sample_rate as f64;
    if duration <= 0.0 {
        return Err(WaveformLoadError::Empty);
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| WaveformLoadError::Decode(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| WaveformLoadError::Decode(e.to_string()))?
        }
    };
    if samples.is_empty() {
        return Err(WaveformLoadError::Empty);
    }

    // max-abs per bucket across all interleaved channels
    let bucket_len = samples.len().div_ceil(PEAK_BUCKETS);
    let peaks: Vec<f32> = samples
        .chunks(bucket_len.max(1))
        .map(|chunk| chunk.iter().fold(0.0f32, |acc, s| acc.max(s.abs())))
        .collect();

    Ok(WaveformData { duration, peaks })
}
