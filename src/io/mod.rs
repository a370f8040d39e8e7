pub mod net;
pub mod progress;
