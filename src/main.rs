mod ops;
mod types;
mod ui;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::ops::backend::BackendClient;
use crate::ops::waveform_load::HttpWaveformLoader;
use crate::ui::app::ClipTrimApp;

const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cliptrim=info")),
        )
        .init();

    let backend_url =
        std::env::var("CLIPTRIM_BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
    tracing::info!(%backend_url, "starting");

    let app = ClipTrimApp::new(
        BackendClient::new(backend_url),
        Arc::new(HttpWaveformLoader::new()),
    );

    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "cliptrim",
        native_options,
        Box::new(|_cc| Ok(Box::new(app))),
    )?;
    Ok(())
}
