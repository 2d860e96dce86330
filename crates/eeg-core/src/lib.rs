/// Configuration, band table, and shared types for eegscope.
///
/// This crate contains the types shared by the analysis pipeline,
/// the presentation layer, and the binary.

pub mod band;
pub mod bins;
pub mod config;
pub mod error;
pub mod frame;
pub mod traits;

pub use band::{BAND_COUNT, Band, BandDefinition, BandTable, BandValues};
pub use bins::BinMapper;
pub use config::{ArtifactConfig, BandSettings, PipelineConfig, WindowFunction};
pub use error::CoreError;
pub use frame::{AnalysisSnapshot, AnalysisStatus, ArtifactFlags, FrameResult};
