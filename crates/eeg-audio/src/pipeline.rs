use eeg_core::config::{PipelineConfig, WindowFunction};
use eeg_core::error::CoreError;
use eeg_core::frame::FrameResult;
use eeg_core::traits::{SampleSource, SpectralTransform};

use crate::artifact::ArtifactDetector;
use crate::band_power::BandPowerEstimator;
use crate::buffer::SampleBuffer;
use crate::fft::SpectralAnalyzer;

/// One channel's complete analysis state.
///
/// Owns the sample buffer, transform, detectors, running windows and frame
/// counter. Frame-synchronous: each [`Pipeline::advance_frame`] runs
/// buffer -> transform -> artifact flags -> band estimation once. Channels
/// never share an instance.
///
/// # Example
/// ```
/// use eeg_audio::Pipeline;
/// use eeg_core::config::PipelineConfig;
///
/// let config = PipelineConfig { buffer_len: 1024, sample_rate: 256, ..PipelineConfig::default() };
/// let mut pipeline = Pipeline::new(config).unwrap();
/// let frame = pipeline.advance_frame(&[0.0; 1024]);
/// assert_eq!(frame.spectrum.len(), 512);
/// assert!(frame.flags.is_good());
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    buffer: SampleBuffer,
    analyzer: SpectralAnalyzer,
    detector: ArtifactDetector,
    estimator: BandPowerEstimator,
    frame_counter: u64,
    /// Scratch for blocks pulled from a source.
    block: Vec<f32>,
}

impl Pipeline {
    /// Validate `config` and build every stage with the realfft engine.
    ///
    /// # Errors
    /// [`CoreError::Configuration`] if the configuration is invalid.
    pub fn new(config: PipelineConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let analyzer = SpectralAnalyzer::new(&config);
        Self::assemble(config, analyzer)
    }

    /// Same as [`Pipeline::new`] with a caller-supplied transform engine.
    ///
    /// # Errors
    /// [`CoreError::Configuration`] if the configuration is invalid or the
    /// transform length differs from N.
    pub fn with_transform(
        config: PipelineConfig,
        transform: Box<dyn SpectralTransform>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let analyzer = SpectralAnalyzer::with_transform(&config, transform)?;
        Self::assemble(config, analyzer)
    }

    fn assemble(config: PipelineConfig, analyzer: SpectralAnalyzer) -> Result<Self, CoreError> {
        let table = config.band_table()?;
        let mapper = analyzer.mapper();
        log::info!(
            "Pipeline: N={} @ {}Hz, {:.3} Hz/bin, scale_factor={}, L={}, window={}",
            config.buffer_len,
            config.sample_rate,
            config.sample_rate as f32 / config.buffer_len as f32,
            config.scale_factor,
            config.window_len,
            config.window_function.label()
        );
        let estimator = BandPowerEstimator::new(table, mapper, config.window_len);

        Ok(Self {
            buffer: SampleBuffer::new(config.buffer_len),
            detector: ArtifactDetector::new(&config.artifact),
            block: vec![0.0; config.buffer_len],
            analyzer,
            estimator,
            frame_counter: 0,
            config,
        })
    }

    /// Run one frame over `samples` (N values, oldest first).
    pub fn advance_frame(&mut self, samples: &[f32]) -> FrameResult {
        let mut result = FrameResult::default();
        self.advance_into(samples, &mut result);
        result
    }

    /// [`Pipeline::advance_frame`] writing into `out`, whose sample and
    /// spectrum vectors are reused. No allocation once they hold N and N/2.
    pub fn advance_into(&mut self, samples: &[f32], out: &mut FrameResult) {
        self.buffer.refresh(samples);
        self.analyzer.transform(&self.buffer);
        let flags = self.detector.evaluate(&self.buffer);
        let (raw_bands, bands) =
            self.estimator
                .estimate(self.analyzer.magnitudes(), flags.is_good(), self.frame_counter);

        out.frame_index = self.frame_counter;
        out.samples.clear();
        out.samples.extend_from_slice(self.buffer.as_slice());
        out.spectrum.clear();
        out.spectrum.extend_from_slice(self.analyzer.magnitudes());
        out.bands = bands;
        out.raw_bands = raw_bands;
        out.flags = flags;
        out.window_function = self.analyzer.window_function();
        out.degenerate_hits = self.estimator.degenerate_hits();
        self.frame_counter += 1;
    }

    /// Pull one block from `source`, then run [`Pipeline::advance_frame`].
    ///
    /// # Errors
    /// Propagates [`CoreError::SourceUnavailable`] from the source.
    pub fn pull_frame(&mut self, source: &mut dyn SampleSource) -> Result<FrameResult, CoreError> {
        let mut result = FrameResult::default();
        self.pull_into(source, &mut result)?;
        Ok(result)
    }

    /// [`Pipeline::pull_frame`] writing into `out`. On a source error `out`
    /// and the frame counter are left untouched.
    ///
    /// # Errors
    /// Propagates [`CoreError::SourceUnavailable`] from the source.
    pub fn pull_into(
        &mut self,
        source: &mut dyn SampleSource,
        out: &mut FrameResult,
    ) -> Result<(), CoreError> {
        let mut block = std::mem::take(&mut self.block);
        let read = source.read_block(&mut block);
        if read.is_ok() {
            self.advance_into(&block, out);
        }
        self.block = block;
        read
    }

    /// Switch the transform window from the next frame on.
    pub fn set_window_function(&mut self, window: WindowFunction) {
        log::info!("Fenêtre : {}", window.label());
        self.analyzer.set_window_function(window);
    }

    /// Current transform window.
    #[must_use]
    pub fn window_function(&self) -> WindowFunction {
        self.analyzer.window_function()
    }

    /// Frames processed so far.
    #[must_use]
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    /// Configuration the pipeline was built with.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The band estimator (bin ranges, running windows).
    #[must_use]
    pub fn estimator(&self) -> &BandPowerEstimator {
        &self.estimator
    }

    /// The spectral analyzer (bin mapper, last magnitudes).
    #[must_use]
    pub fn analyzer(&self) -> &SpectralAnalyzer {
        &self.analyzer
    }
}

#[cfg(test)]
mod tests {
    use eeg_core::band::Band;

    use super::*;

    struct Flat(usize);

    impl SpectralTransform for Flat {
        fn fft_size(&self) -> usize {
            self.0
        }

        fn magnitudes(&mut self, _samples: &[f32], _window: WindowFunction, out: &mut [f32]) {
            out.fill(1.0);
        }
    }

    struct Broken;

    impl SampleSource for Broken {
        fn read_block(&mut self, _out: &mut [f32]) -> Result<(), CoreError> {
            Err(CoreError::SourceUnavailable("débranché".into()))
        }

        fn sample_rate(&self) -> u32 {
            256
        }
    }

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            buffer_len: 1024,
            sample_rate: 256,
            scale_factor: 1.0,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn invalid_config_refuses_to_start() {
        let config = PipelineConfig {
            buffer_len: 1000,
            ..small_config()
        };
        assert!(matches!(Pipeline::new(config), Err(CoreError::Configuration(_))));
    }

    #[test]
    fn flat_spectrum_good_frame_writes_scale_constants() {
        let config = small_config();
        let mut pipeline = Pipeline::with_transform(config.clone(), Box::new(Flat(1024)))
            .unwrap_or_else(|e| panic!("{e}"));
        let frame = pipeline.advance_frame(&[0.0; 1024]);
        assert!(frame.flags.is_good());
        for band in Band::ALL {
            let scale = config.bands[band.index()].scale;
            assert!((frame.raw_bands[band] - scale).abs() < 1e-6);
            assert!((frame.bands[band] - scale / 60.0).abs() < 1e-6);
        }
    }

    #[test]
    fn frame_counter_advances_on_bad_frames_too() {
        let mut pipeline = Pipeline::new(small_config()).unwrap_or_else(|e| panic!("{e}"));
        let mut clipped = vec![0.0f32; 1024];
        clipped[3] = 10.0;
        let frame = pipeline.advance_frame(&clipped);
        assert!(frame.flags.absolute);
        assert_eq!(frame.frame_index, 0);
        assert_eq!(frame.bands, eeg_core::band::BandValues::default());
        assert_eq!(pipeline.frame_counter(), 1);
    }

    #[test]
    fn source_failure_propagates() {
        let mut pipeline = Pipeline::new(small_config()).unwrap_or_else(|e| panic!("{e}"));
        let res = pipeline.pull_frame(&mut Broken);
        assert!(matches!(res, Err(CoreError::SourceUnavailable(_))));
        assert_eq!(pipeline.frame_counter(), 0);
    }

    #[test]
    fn advance_into_reuses_the_frame_buffers() {
        let mut pipeline = Pipeline::new(small_config()).unwrap_or_else(|e| panic!("{e}"));
        let mut frame = FrameResult::default();
        pipeline.advance_into(&[0.1; 1024], &mut frame);
        let (samples_ptr, spectrum_ptr) = (frame.samples.as_ptr(), frame.spectrum.as_ptr());

        pipeline.advance_into(&[0.2; 1024], &mut frame);
        assert_eq!(frame.frame_index, 1);
        assert_eq!(frame.samples.len(), 1024);
        assert_eq!(frame.spectrum.len(), 512);
        assert!((frame.samples[0] - 0.2).abs() < 1e-6);
        assert_eq!(frame.samples.as_ptr(), samples_ptr);
        assert_eq!(frame.spectrum.as_ptr(), spectrum_ptr);
    }

    #[test]
    fn failed_pull_leaves_the_frame_alone() {
        let mut pipeline = Pipeline::new(small_config()).unwrap_or_else(|e| panic!("{e}"));
        let mut frame = pipeline.advance_frame(&[0.1; 1024]);
        assert!(pipeline.pull_into(&mut Broken, &mut frame).is_err());
        assert_eq!(frame.frame_index, 0);
        assert_eq!(pipeline.frame_counter(), 1);
    }

    #[test]
    fn window_toggle_is_reported_in_frames() {
        let mut pipeline = Pipeline::new(small_config()).unwrap_or_else(|e| panic!("{e}"));
        pipeline.set_window_function(WindowFunction::None);
        let frame = pipeline.advance_frame(&[0.0; 1024]);
        assert_eq!(frame.window_function, WindowFunction::None);
    }
}
