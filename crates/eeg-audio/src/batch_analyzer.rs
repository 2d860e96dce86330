use std::path::Path;

use eeg_core::band::{Band, BandValues};
use eeg_core::config::PipelineConfig;
use eeg_core::error::CoreError;
use eeg_core::frame::{ArtifactFlags, FrameResult};
use serde::Serialize;

use crate::pipeline::Pipeline;

/// Une frame de l'analyse offline.
#[derive(Clone, Debug, Serialize)]
pub struct BatchFrame {
    pub frame: u64,
    /// End of the frame's window, in seconds from the start of the recording.
    pub time_s: f32,
    pub bands: BandValues,
    pub raw_bands: BandValues,
    pub flags: ArtifactFlags,
}

/// Result of analysing a whole recording offline.
#[derive(Clone, Debug, Serialize)]
pub struct BatchReport {
    pub sample_rate: u32,
    pub buffer_len: usize,
    pub hop_len: usize,
    /// Band names, in the order of every `bands` array below.
    pub band_names: Vec<&'static str>,
    pub good_frames: usize,
    pub bad_frames: usize,
    pub degenerate_hits: u64,
    /// Smoothed values after the last frame.
    pub final_bands: BandValues,
    pub dominant: Option<Band>,
    pub frames: Vec<BatchFrame>,
}

/// Analyseur offline : rejoue un enregistrement complet à travers le pipeline.
///
/// Frame `i` covers the N samples ending at `(i + 1) * hop`; the first frames
/// are zero-padded at the head, exactly as a live session fills up.
pub struct BatchAnalyzer {
    pipeline: Pipeline,
}

impl BatchAnalyzer {
    /// Build an analyzer around a fresh pipeline.
    ///
    /// # Errors
    /// [`CoreError::Configuration`] if `config` is invalid.
    ///
    /// # Example
    /// ```
    /// use eeg_audio::batch_analyzer::BatchAnalyzer;
    /// use eeg_core::config::PipelineConfig;
    ///
    /// let config = PipelineConfig { buffer_len: 1024, sample_rate: 256, target_fps: 32, ..PipelineConfig::default() };
    /// let mut analyzer = BatchAnalyzer::new(config).unwrap();
    /// let report = analyzer.analyze_all(&vec![0.0; 256]); // 1 seconde de silence
    /// assert_eq!(report.frames.len(), 32);
    /// ```
    pub fn new(config: PipelineConfig) -> Result<Self, CoreError> {
        Ok(Self {
            pipeline: Pipeline::new(config)?,
        })
    }

    /// Run every frame of `samples` and collect the report.
    #[must_use]
    pub fn analyze_all(&mut self, samples: &[f32]) -> BatchReport {
        let config = self.pipeline.config().clone();
        let hop = config.hop_len();
        let num_frames = samples.len().div_ceil(hop);

        let mut frames = Vec::with_capacity(num_frames);
        let mut good_frames = 0;
        let mut final_bands = BandValues::default();
        let mut degenerate_hits = 0;
        let mut result = FrameResult::default();

        for i in 0..num_frames {
            let end = ((i + 1) * hop).min(samples.len());
            let start = end.saturating_sub(config.buffer_len);
            self.pipeline.advance_into(&samples[start..end], &mut result);

            if result.flags.is_good() {
                good_frames += 1;
            }
            final_bands = result.bands;
            degenerate_hits = result.degenerate_hits;
            frames.push(BatchFrame {
                frame: result.frame_index,
                time_s: end as f32 / config.sample_rate as f32,
                bands: result.bands,
                raw_bands: result.raw_bands,
                flags: result.flags,
            });
        }

        log::info!(
            "Analyse batch : {} frames ({} rejetées)",
            frames.len(),
            frames.len() - good_frames
        );

        BatchReport {
            sample_rate: config.sample_rate,
            buffer_len: config.buffer_len,
            hop_len: hop,
            band_names: Band::ALL.iter().map(|b| b.name()).collect(),
            good_frames,
            bad_frames: frames.len() - good_frames,
            degenerate_hits,
            dominant: final_bands.dominant(),
            final_bands,
            frames,
        }
    }

    /// Décode un fichier et analyse l'intégralité de ses échantillons.
    ///
    /// The pipeline is rebuilt at the file's own sample rate when it differs
    /// from the configured one.
    ///
    /// # Errors
    /// Retourne une erreur si le fichier ne peut être décodé ou si la
    /// configuration est invalide à sa fréquence d'échantillonnage.
    pub fn analyze_file(&mut self, path: &Path) -> anyhow::Result<BatchReport> {
        let (samples, actual_sr) = crate::decode::decode_file(path)?;
        if actual_sr != self.pipeline.config().sample_rate {
            let config = PipelineConfig {
                sample_rate: actual_sr,
                ..self.pipeline.config().clone()
            };
            self.pipeline = Pipeline::new(config)?;
        }
        Ok(self.analyze_all(&samples))
    }
}
