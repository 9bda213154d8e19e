pub mod adapters;
pub mod backend;
pub mod broadcast;
pub mod waveform_load;
