use crate::config::WindowFunction;
use crate::error::CoreError;

/// Supplies one block of time-domain samples per frame.
///
/// Implémenté par : `AudioCapture`, `FileSource`, `SignalGenerator`.
///
/// # Example
/// ```
/// use eeg_core::traits::SampleSource;
/// use eeg_core::error::CoreError;
///
/// struct Silence;
/// impl SampleSource for Silence {
///     fn read_block(&mut self, out: &mut [f32]) -> Result<(), CoreError> {
///         out.fill(0.0);
///         Ok(())
///     }
///     fn sample_rate(&self) -> u32 { 256 }
/// }
/// ```
pub trait SampleSource: Send {
    /// Fill `out` with the most recent `out.len()` samples, oldest first.
    ///
    /// Ne bloque JAMAIS : sans nouvelles données, renvoie le bloc précédent
    /// (ou des zéros avant les premières données).
    ///
    /// # Errors
    /// [`CoreError::SourceUnavailable`] once the source can no longer supply data.
    fn read_block(&mut self, out: &mut [f32]) -> Result<(), CoreError>;

    /// Sample rate of the produced signal, in Hz.
    fn sample_rate(&self) -> u32;
}

/// Forward spectral transform engine, treated as a pure function.
///
/// # Example
/// ```
/// use eeg_core::traits::SpectralTransform;
/// use eeg_core::config::WindowFunction;
///
/// struct Flat(usize);
/// impl SpectralTransform for Flat {
///     fn fft_size(&self) -> usize { self.0 }
///     fn magnitudes(&mut self, _samples: &[f32], _window: WindowFunction, out: &mut [f32]) {
///         out.fill(1.0);
///     }
/// }
/// ```
pub trait SpectralTransform: Send {
    /// Input length N the transform was planned for.
    fn fft_size(&self) -> usize;

    /// Write the magnitude of bins `0..out.len()` (at most N/2) for `samples`.
    ///
    /// CONTRAT : ne doit PAS allouer.
    fn magnitudes(&mut self, samples: &[f32], window: WindowFunction, out: &mut [f32]);
}
