pub mod region;
pub mod session;
pub mod waveform;
