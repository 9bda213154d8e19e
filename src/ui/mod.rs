pub mod app;
pub mod i18n;
pub mod overlay_widget;
pub mod waveform_widget;
