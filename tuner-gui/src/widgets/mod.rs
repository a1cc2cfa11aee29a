//! Canvas widgets used by the main display.

pub mod headstock;
pub mod spectrogram;
pub mod tuning_scale;
