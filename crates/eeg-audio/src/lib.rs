// Sample capture, spectral analysis, artifact rejection and band-power
// estimation for eegscope.

pub mod artifact;
pub mod band_power;
pub mod batch_analyzer;
pub mod buffer;
pub mod capture;
pub mod decode;
pub mod error;
pub mod fft;
pub mod pipeline;
pub mod smoothing;
pub mod source;
pub mod state;

pub use pipeline::Pipeline;
