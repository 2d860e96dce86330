use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::config::BandSettings;
use crate::error::CoreError;

/// Number of canonical bands.
pub const BAND_COUNT: usize = 6;

/// Canonical EEG band, in ascending frequency order.
///
/// # Example
/// ```
/// use eeg_core::band::Band;
/// assert_eq!(Band::Alpha.index(), 2);
/// assert_eq!(Band::ALL[5], Band::HighBeta);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    /// Deep sleep rhythm.
    Delta,
    /// Drowsiness, light sleep.
    Theta,
    /// Relaxed wakefulness.
    Alpha,
    /// Low beta (SMR).
    LowBeta,
    /// Mid beta.
    MidBeta,
    /// High beta.
    HighBeta,
}

impl Band {
    /// All bands, lowest frequency first.
    pub const ALL: [Band; BAND_COUNT] = [
        Band::Delta,
        Band::Theta,
        Band::Alpha,
        Band::LowBeta,
        Band::MidBeta,
        Band::HighBeta,
    ];

    /// Position in [`Band::ALL`].
    #[inline(always)]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Machine name, as used in config files and reports.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Band::Delta => "delta",
            Band::Theta => "theta",
            Band::Alpha => "alpha",
            Band::LowBeta => "low_beta",
            Band::MidBeta => "mid_beta",
            Band::HighBeta => "high_beta",
        }
    }

    /// Short label for on-screen display.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Band::Delta => "Delta",
            Band::Theta => "Theta",
            Band::Alpha => "Alpha",
            Band::LowBeta => "Lo-β",
            Band::MidBeta => "Mid-β",
            Band::HighBeta => "Hi-β",
        }
    }
}

/// One resolved band: frequency range in Hz and calibration constant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandDefinition {
    /// Which band this is.
    pub band: Band,
    /// Lower bound in Hz (inclusive). `previous.high_hz + 1`, or 0 for delta.
    pub low_hz: f32,
    /// Upper bound in Hz (inclusive).
    pub high_hz: f32,
    /// Per-band scale constant applied to the averaged magnitude.
    pub scale: f32,
}

/// The six band definitions, contiguous and in ascending order.
///
/// # Example
/// ```
/// use eeg_core::band::{Band, BandTable};
/// use eeg_core::config::PipelineConfig;
///
/// let table = BandTable::from_settings(&PipelineConfig::default().bands).unwrap();
/// let theta = table.get(Band::Theta);
/// assert_eq!(theta.low_hz, table.get(Band::Delta).high_hz + 1.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct BandTable {
    defs: [BandDefinition; BAND_COUNT],
}

impl BandTable {
    /// Resolve per-band upper bounds into contiguous `[low, high]` ranges.
    ///
    /// # Errors
    /// Returns [`CoreError::Configuration`] if a bound is not finite, the
    /// bounds are not increasing by at least 1 Hz per band (which would
    /// leave a band empty or overlapping), or a scale constant is negative.
    pub fn from_settings(settings: &[BandSettings; BAND_COUNT]) -> Result<Self, CoreError> {
        let mut defs = [BandDefinition {
            band: Band::Delta,
            low_hz: 0.0,
            high_hz: 0.0,
            scale: 0.0,
        }; BAND_COUNT];

        let mut low_hz = 0.0f32;
        for (i, (band, s)) in Band::ALL.iter().zip(settings.iter()).enumerate() {
            if !s.upper_hz.is_finite() || s.upper_hz <= 0.0 {
                return Err(CoreError::config(format!(
                    "bande {} : borne supérieure invalide ({})",
                    band.name(),
                    s.upper_hz
                )));
            }
            if s.upper_hz < low_hz {
                return Err(CoreError::config(format!(
                    "bande {} : bornes non monotones ({} Hz < {} Hz)",
                    band.name(),
                    s.upper_hz,
                    low_hz
                )));
            }
            if !s.scale.is_finite() || s.scale < 0.0 {
                return Err(CoreError::config(format!(
                    "bande {} : constante d'échelle invalide ({})",
                    band.name(),
                    s.scale
                )));
            }
            defs[i] = BandDefinition {
                band: *band,
                low_hz,
                high_hz: s.upper_hz,
                scale: s.scale,
            };
            low_hz = s.upper_hz + 1.0;
        }

        Ok(Self { defs })
    }

    /// Definition for `band`.
    #[must_use]
    pub fn get(&self, band: Band) -> &BandDefinition {
        &self.defs[band.index()]
    }

    /// Definitions in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &BandDefinition> {
        self.defs.iter()
    }

    /// Upper bound of the highest band.
    #[must_use]
    pub fn max_hz(&self) -> f32 {
        self.defs[BAND_COUNT - 1].high_hz
    }
}

/// One value per band, indexable by [`Band`].
///
/// # Example
/// ```
/// use eeg_core::band::{Band, BandValues};
/// let mut v = BandValues::default();
/// v[Band::Alpha] = 2.0;
/// assert_eq!(v.dominant(), Some(Band::Alpha));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct BandValues(pub [f32; BAND_COUNT]);

impl BandValues {
    /// `(band, value)` pairs in ascending band order.
    pub fn iter(&self) -> impl Iterator<Item = (Band, f32)> + '_ {
        Band::ALL.iter().map(|&b| (b, self.0[b.index()]))
    }

    /// Band with the strictly largest value; `None` if all are zero.
    #[must_use]
    pub fn dominant(&self) -> Option<Band> {
        let (band, value) = self
            .iter()
            .fold((Band::Delta, f32::MIN), |acc, (b, v)| if v > acc.1 { (b, v) } else { acc });
        (value > 0.0).then_some(band)
    }

    /// Largest value across the bands.
    #[must_use]
    pub fn max(&self) -> f32 {
        self.0.iter().copied().fold(0.0f32, f32::max)
    }
}

impl Index<Band> for BandValues {
    type Output = f32;

    fn index(&self, band: Band) -> &f32 {
        &self.0[band.index()]
    }
}

impl IndexMut<Band> for BandValues {
    fn index_mut(&mut self, band: Band) -> &mut f32 {
        &mut self.0[band.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;

    fn settings(uppers: [f32; BAND_COUNT]) -> [BandSettings; BAND_COUNT] {
        uppers.map(|upper_hz| BandSettings {
            upper_hz,
            scale: 1.0,
        })
    }

    #[test]
    fn default_bands_are_contiguous() {
        let table = BandTable::from_settings(&PipelineConfig::default().bands)
            .unwrap_or_else(|e| panic!("default bands rejected: {e}"));
        assert_eq!(table.get(Band::Delta).low_hz, 0.0);
        let defs: Vec<_> = table.iter().collect();
        for pair in defs.windows(2) {
            assert!(pair[1].low_hz > pair[0].high_hz);
            assert!((pair[1].low_hz - (pair[0].high_hz + 1.0)).abs() < f32::EPSILON);
            assert!(pair[1].high_hz >= pair[1].low_hz);
        }
        assert_eq!(table.max_hz(), 30.0);
    }

    #[test]
    fn rejects_non_monotonic_bounds() {
        let err = BandTable::from_settings(&settings([4.0, 8.0, 7.0, 15.0, 20.0, 30.0]));
        assert!(matches!(err, Err(CoreError::Configuration(_))));
    }

    #[test]
    fn rejects_bands_left_empty_by_the_one_hz_step() {
        // theta would be [4.0 + 1.0, 4.5]
        let err = BandTable::from_settings(&settings([4.0, 4.5, 12.0, 15.0, 20.0, 30.0]));
        assert!(err.is_err());
    }

    #[test]
    fn rejects_non_finite_and_negative_scale() {
        assert!(BandTable::from_settings(&settings([f32::NAN, 8.0, 12.0, 15.0, 20.0, 30.0])).is_err());
        let mut s = settings([4.0, 8.0, 12.0, 15.0, 20.0, 30.0]);
        s[3].scale = -1.0;
        assert!(BandTable::from_settings(&s).is_err());
    }

    #[test]
    fn dominant_ignores_all_zero() {
        assert_eq!(BandValues::default().dominant(), None);
        let v = BandValues([0.1, 0.2, 0.9, 0.3, 0.0, 0.0]);
        assert_eq!(v.dominant(), Some(Band::Alpha));
        assert!((v.max() - 0.9).abs() < f32::EPSILON);
    }
}
