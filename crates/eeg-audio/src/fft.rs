use std::sync::Arc;

use eeg_core::bins::BinMapper;
use eeg_core::config::{PipelineConfig, WindowFunction};
use eeg_core::error::CoreError;
use eeg_core::traits::SpectralTransform;
use realfft::RealFftPlanner;
use realfft::num_complex::Complex;

use crate::buffer::SampleBuffer;

/// Windowed real FFT using realfft.
///
/// Pre-allocates the FFT plan, scratch buffers and Hamming coefficients for
/// a zero-allocation hot path.
///
/// # Example
/// ```
/// use eeg_audio::fft::RealFftTransform;
/// use eeg_core::config::WindowFunction;
/// use eeg_core::traits::SpectralTransform;
///
/// let mut fft = RealFftTransform::new(256);
/// let mut out = vec![0.0f32; 128];
/// fft.magnitudes(&[0.0; 256], WindowFunction::Hamming, &mut out);
/// assert!(out.iter().all(|m| *m == 0.0));
/// ```
pub struct RealFftTransform {
    fft_size: usize,
    input_buf: Vec<f32>,
    spectrum_buf: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    plan: Arc<dyn realfft::RealToComplex<f32>>,
    /// Hamming window coefficients.
    hamming: Vec<f32>,
}

impl RealFftTransform {
    /// Plan a forward transform of `size` samples.
    ///
    /// # Panics
    /// Panics if `size` < 2.
    #[must_use]
    pub fn new(size: usize) -> Self {
        assert!(size >= 2, "FFT size must be >= 2");

        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(size);

        let input_buf = plan.make_input_vec();
        let spectrum_buf = plan.make_output_vec();
        let scratch = plan.make_scratch_vec();

        let hamming: Vec<f32> = (0..size)
            .map(|i| {
                0.54 - 0.46 * (2.0 * std::f32::consts::PI * i as f32 / (size as f32 - 1.0)).cos()
            })
            .collect();

        Self {
            fft_size: size,
            input_buf,
            spectrum_buf,
            scratch,
            plan,
            hamming,
        }
    }
}

impl SpectralTransform for RealFftTransform {
    fn fft_size(&self) -> usize {
        self.fft_size
    }

    fn magnitudes(&mut self, samples: &[f32], window: WindowFunction, out: &mut [f32]) {
        let n = self.fft_size.min(samples.len());

        // Copy and window, zero-pad a short input
        for (i, slot) in self.input_buf.iter_mut().enumerate() {
            *slot = if i >= n {
                0.0
            } else {
                match window {
                    WindowFunction::Hamming => samples[i] * self.hamming[i],
                    WindowFunction::None => samples[i],
                }
            };
        }

        if let Err(e) = self.plan.process_with_scratch(
            &mut self.input_buf,
            &mut self.spectrum_buf,
            &mut self.scratch,
        ) {
            log::warn!("FFT failed: {e}");
            out.fill(0.0);
            return;
        }

        let norm = self.fft_size as f32;
        for (slot, c) in out.iter_mut().zip(self.spectrum_buf.iter()) {
            *slot = c.norm() / norm;
        }
    }
}

/// Runs the forward transform once per frame and exposes per-bin magnitude.
pub struct SpectralAnalyzer {
    transform: Box<dyn SpectralTransform>,
    magnitudes: Vec<f32>,
    mapper: BinMapper,
    window: WindowFunction,
}

impl SpectralAnalyzer {
    /// Analyzer backed by [`RealFftTransform`].
    #[must_use]
    pub fn new(config: &PipelineConfig) -> Self {
        Self::build(config, Box::new(RealFftTransform::new(config.buffer_len)))
    }

    /// Analyzer backed by a caller-supplied transform engine.
    ///
    /// # Errors
    /// [`CoreError::Configuration`] if the transform length is not N.
    pub fn with_transform(
        config: &PipelineConfig,
        transform: Box<dyn SpectralTransform>,
    ) -> Result<Self, CoreError> {
        if transform.fft_size() != config.buffer_len {
            return Err(CoreError::Configuration(format!(
                "transformée de taille {} pour un buffer de {}",
                transform.fft_size(),
                config.buffer_len
            )));
        }
        Ok(Self::build(config, transform))
    }

    fn build(config: &PipelineConfig, transform: Box<dyn SpectralTransform>) -> Self {
        let mapper = config.bin_mapper();
        Self {
            transform,
            magnitudes: vec![0.0; mapper.bin_count()],
            mapper,
            window: config.window_function,
        }
    }

    /// Forward transform of the whole buffer.
    pub fn transform(&mut self, buffer: &SampleBuffer) {
        self.transform
            .magnitudes(buffer.as_slice(), self.window, &mut self.magnitudes);
    }

    /// See [`BinMapper::hz_to_bin`].
    #[inline]
    #[must_use]
    pub fn hz_to_bin(&self, hz: f32) -> usize {
        self.mapper.hz_to_bin(hz)
    }

    /// Magnitude of `bin` from the last transform. 0.0 outside `0..N/2`.
    #[inline]
    #[must_use]
    pub fn magnitude_at(&self, bin: usize) -> f32 {
        self.magnitudes.get(bin).copied().unwrap_or(0.0)
    }

    /// All N/2 magnitudes from the last transform.
    #[must_use]
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    /// The Hz -> bin mapper in use.
    #[must_use]
    pub fn mapper(&self) -> &BinMapper {
        &self.mapper
    }

    /// Current window function.
    #[must_use]
    pub fn window_function(&self) -> WindowFunction {
        self.window
    }

    /// Switch window function from the next frame on.
    pub fn set_window_function(&mut self, window: WindowFunction) {
        self.window = window;
    }
}
