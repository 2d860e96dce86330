use eeg_core::band::{BAND_COUNT, Band, BandTable, BandValues};
use eeg_core::bins::BinMapper;

use crate::smoothing::RunningAverageWindow;

/// Inclusive bin range of one band.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BinRange {
    /// First bin (inclusive).
    pub low: usize,
    /// Last bin (inclusive).
    pub high: usize,
}

impl BinRange {
    /// Resolve `[low_hz, high_hz]` through `mapper`, clamped into `0..N/2`.
    #[must_use]
    pub fn from_hz(mapper: &BinMapper, low_hz: f32, high_hz: f32) -> Self {
        Self {
            low: mapper.clamp_bin(mapper.hz_to_bin(low_hz)),
            high: mapper.clamp_bin(mapper.hz_to_bin(high_hz)),
        }
    }

    /// `high < low`: the band covers no bin.
    #[inline]
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.high < self.low
    }
}

/// Mean magnitude over `range`, inclusive.
///
/// A degenerate range is clamped to its low bin (the band power becomes that
/// single bin's magnitude). Returns the average and whether clamping happened.
///
/// # Example
/// ```
/// use eeg_audio::band_power::{band_average, BinRange};
/// let spectrum = [1.0, 2.0, 3.0, 4.0];
/// assert_eq!(band_average(&spectrum, BinRange { low: 1, high: 2 }), (2.5, false));
/// assert_eq!(band_average(&spectrum, BinRange { low: 3, high: 1 }), (4.0, true));
/// ```
#[must_use]
pub fn band_average(magnitudes: &[f32], range: BinRange) -> (f32, bool) {
    if magnitudes.is_empty() {
        return (0.0, range.is_degenerate());
    }
    let last = magnitudes.len() - 1;
    let degenerate = range.is_degenerate();
    let low = range.low.min(last);
    let high = if degenerate { low } else { range.high.min(last) };

    let sum: f32 = magnitudes[low..=high].iter().sum();
    (sum / (high - low + 1) as f32, degenerate)
}

/// Per-band power with artifact-gated running averages.
///
/// Bin ranges are resolved once at construction; each frame averages the
/// magnitudes over every range, applies the band's scale constant, and (on a
/// good frame only) writes the result into the band's running window.
pub struct BandPowerEstimator {
    table: BandTable,
    ranges: [BinRange; BAND_COUNT],
    windows: [RunningAverageWindow; BAND_COUNT],
    degenerate_hits: u64,
    warned: [bool; BAND_COUNT],
}

impl BandPowerEstimator {
    /// Build for `table`, mapping Hz through `mapper`, smoothing over
    /// `window_len` frames.
    ///
    /// # Panics
    /// Panics if `window_len` is 0 (rejected earlier by config validation).
    #[must_use]
    pub fn new(table: BandTable, mapper: &BinMapper, window_len: usize) -> Self {
        let ranges = Band::ALL.map(|band| {
            let def = table.get(band);
            let range = BinRange::from_hz(mapper, def.low_hz, def.high_hz);
            log::info!(
                "{:>9}: {:>5.1}-{:<5.1} Hz -> bins {}..={} (x{})",
                band.name(),
                def.low_hz,
                def.high_hz,
                range.low,
                range.high,
                def.scale
            );
            range
        });

        Self {
            table,
            ranges,
            windows: std::array::from_fn(|_| RunningAverageWindow::new(window_len)),
            degenerate_hits: 0,
            warned: [false; BAND_COUNT],
        }
    }

    /// Process one frame of magnitudes.
    ///
    /// Returns `(raw, smoothed)`: this frame's scaled band powers and the
    /// running-window means after the (possibly skipped) write.
    pub fn estimate(
        &mut self,
        magnitudes: &[f32],
        good_frame: bool,
        frame_counter: u64,
    ) -> (BandValues, BandValues) {
        let mut raw = BandValues::default();
        let mut smoothed = BandValues::default();

        for band in Band::ALL {
            let i = band.index();
            let (avg, degenerate) = band_average(magnitudes, self.ranges[i]);
            if degenerate {
                self.degenerate_hits += 1;
                if !self.warned[i] {
                    self.warned[i] = true;
                    log::warn!(
                        "bande {} vide (bins {}..={}), ramenée à un seul bin : vérifier scale_factor",
                        band.name(),
                        self.ranges[i].low,
                        self.ranges[i].high
                    );
                }
            }

            let value = avg * self.table.get(band).scale;
            raw[band] = value;
            if good_frame {
                self.windows[i].write(frame_counter, value);
            }
            smoothed[band] = self.windows[i].mean();
        }

        (raw, smoothed)
    }

    /// Override the bin range of `band`.
    pub fn set_range(&mut self, band: Band, range: BinRange) {
        self.ranges[band.index()] = range;
    }

    /// Resolved bin range of `band`.
    #[must_use]
    pub fn range(&self, band: Band) -> BinRange {
        self.ranges[band.index()]
    }

    /// Running window of `band`.
    #[must_use]
    pub fn window(&self, band: Band) -> &RunningAverageWindow {
        &self.windows[band.index()]
    }

    /// How many times a degenerate range has been clamped.
    #[must_use]
    pub fn degenerate_hits(&self) -> u64 {
        self.degenerate_hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eeg_core::config::PipelineConfig;

    fn estimator(window_len: usize) -> (BandPowerEstimator, BandTable) {
        let config = PipelineConfig {
            buffer_len: 1024,
            sample_rate: 256,
            scale_factor: 1.0,
            ..PipelineConfig::default()
        };
        let table = config.band_table().unwrap_or_else(|e| panic!("{e}"));
        let mapper = config.bin_mapper();
        (BandPowerEstimator::new(table.clone(), &mapper, window_len), table)
    }

    #[test]
    fn ranges_follow_the_band_table() {
        let (est, _) = estimator(60);
        // 0.25 Hz per bin
        assert_eq!(est.range(Band::Delta), BinRange { low: 0, high: 16 });
        assert_eq!(est.range(Band::Theta), BinRange { low: 20, high: 32 });
        assert_eq!(est.range(Band::Alpha), BinRange { low: 36, high: 48 });
        assert_eq!(est.range(Band::HighBeta), BinRange { low: 84, high: 120 });
    }

    #[test]
    fn flat_spectrum_yields_scale_constant() {
        let (mut est, table) = estimator(60);
        let spectrum = vec![1.0f32; 512];
        let (raw, _) = est.estimate(&spectrum, true, 7);
        for band in Band::ALL {
            assert!((raw[band] - table.get(band).scale).abs() < 1e-6);
            assert!((est.window(band).slots()[7] - table.get(band).scale).abs() < 1e-6);
        }
    }

    #[test]
    fn bad_frames_leave_windows_untouched() {
        let (mut est, _) = estimator(4);
        let spectrum = vec![1.0f32; 512];
        for frame in 0..4 {
            est.estimate(&spectrum, true, frame);
        }
        let (_, before) = est.estimate(&spectrum, true, 4);

        let loud = vec![50.0f32; 512];
        let mut after = before;
        for frame in 5..9 {
            let (raw, smoothed) = est.estimate(&loud, false, frame);
            assert!(raw[Band::Alpha] > before[Band::Alpha]);
            after = smoothed;
        }
        assert_eq!(before, after);
    }

    #[test]
    fn partial_window_counts_zero_slots() {
        let (mut est, table) = estimator(10);
        let spectrum = vec![1.0f32; 512];
        est.estimate(&spectrum, true, 0);
        let (_, smoothed) = est.estimate(&spectrum, true, 1);
        let alpha_scale = table.get(Band::Alpha).scale;
        assert!((smoothed[Band::Alpha] - 2.0 * alpha_scale / 10.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_range_is_clamped_and_counted() {
        let (mut est, _) = estimator(1);
        est.set_range(Band::Theta, BinRange { low: 10, high: 5 });
        let spectrum: Vec<f32> = (0..512).map(|i| i as f32).collect();
        let (raw, _) = est.estimate(&spectrum, true, 0);
        let theta_scale = PipelineConfig::default().bands[Band::Theta.index()].scale;
        assert!((raw[Band::Theta] - 10.0 * theta_scale).abs() < 1e-4);
        assert_eq!(est.degenerate_hits(), 1);
        est.estimate(&spectrum, true, 1);
        assert_eq!(est.degenerate_hits(), 2);
    }
}
