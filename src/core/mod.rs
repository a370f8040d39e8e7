pub mod analysis;
pub mod audio;
pub mod dsp;
pub mod key;
pub mod tempo;
