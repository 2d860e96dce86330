//! Hz <-> bin conversion shared by the band table, the analyzer and the display.

/// Hz -> bin conversion under the bin-width correction factor.
///
/// `hz_to_bin(hz) = round((hz / bin_width) / scale_factor)` with
/// `bin_width = sample_rate / N`. The same factor is used at every
/// conversion site.
///
/// # Example
/// ```
/// use eeg_core::bins::BinMapper;
/// let mapper = BinMapper::new(256, 1024, 1.0);
/// assert_eq!(mapper.hz_to_bin(10.0), 40);
/// let corrected = BinMapper::new(256, 1024, 2.0);
/// assert_eq!(corrected.hz_to_bin(10.0), 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BinMapper {
    bin_hz: f32,
    scale_factor: f32,
    bins: usize,
}

impl BinMapper {
    /// Mapper for an `fft_size`-point transform at `sample_rate` Hz.
    #[must_use]
    pub fn new(sample_rate: u32, fft_size: usize, scale_factor: f32) -> Self {
        Self {
            bin_hz: sample_rate as f32 / fft_size.max(1) as f32,
            scale_factor,
            bins: fft_size / 2,
        }
    }

    /// The transform engine's own (uncorrected, fractional) bin index for `hz`.
    #[inline]
    #[must_use]
    pub fn native_bin(&self, hz: f32) -> f32 {
        hz / self.bin_hz
    }

    /// Corrected bin index. May exceed the last bin; see [`Self::clamp_bin`].
    #[inline]
    #[must_use]
    pub fn hz_to_bin(&self, hz: f32) -> usize {
        (self.native_bin(hz) / self.scale_factor).round().max(0.0) as usize
    }

    /// Inverse of [`Self::hz_to_bin`], for axis labels.
    #[inline]
    #[must_use]
    pub fn bin_to_hz(&self, bin: usize) -> f32 {
        bin as f32 * self.scale_factor * self.bin_hz
    }

    /// Clamp into `0..N/2`.
    #[inline]
    #[must_use]
    pub fn clamp_bin(&self, bin: usize) -> usize {
        bin.min(self.bins.saturating_sub(1))
    }

    /// Number of usable bins, N/2.
    #[inline]
    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.bins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hz_to_bin_is_monotonic() {
        for scale in [1.0f32, 1.33, 2.7] {
            let mapper = BinMapper::new(44100, 16384, scale);
            let mut prev = 0;
            for step in 0..4000 {
                let bin = mapper.hz_to_bin(step as f32 * 0.05);
                assert!(bin >= prev, "non monotonic at {} Hz", step as f32 * 0.05);
                prev = bin;
            }
        }
    }

    #[test]
    fn clamp_stays_below_half_size() {
        let mapper = BinMapper::new(256, 64, 1.0);
        assert_eq!(mapper.bin_count(), 32);
        assert_eq!(mapper.clamp_bin(mapper.hz_to_bin(1000.0)), 31);
        assert!((mapper.bin_to_hz(mapper.hz_to_bin(10.0)) - 12.0).abs() < 4.0);
    }
}
