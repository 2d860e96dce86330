use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::band::{BAND_COUNT, Band, BandTable};
use crate::bins::BinMapper;
use crate::error::CoreError;

/// Window function applied before the forward transform.
///
/// # Example
/// ```
/// use eeg_core::config::WindowFunction;
/// assert_eq!(WindowFunction::default(), WindowFunction::Hamming);
/// assert_eq!(WindowFunction::Hamming.toggled(), WindowFunction::None);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum WindowFunction {
    /// Hamming window (0.54 - 0.46 cos).
    #[default]
    Hamming,
    /// Rectangular, samples passed through untouched.
    None,
}

impl WindowFunction {
    /// Hamming <-> None.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            WindowFunction::Hamming => WindowFunction::None,
            WindowFunction::None => WindowFunction::Hamming,
        }
    }

    /// Display name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            WindowFunction::Hamming => "Hamming",
            WindowFunction::None => "None",
        }
    }
}

/// Upper bound and calibration constant of one band.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct BandSettings {
    /// Upper frequency bound in Hz (inclusive).
    pub upper_hz: f32,
    /// Scale constant bringing the band into a comparable range.
    pub scale: f32,
}

/// Artifact-detection thresholds.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ArtifactConfig {
    /// Saturation threshold on the display-scaled sample magnitude.
    pub absolute_threshold: f32,
    /// A jump larger than this many times the mean absolute sample flags a spike.
    pub average_multiplier: f32,
    /// Scale applied to samples when plotted.
    pub display_scale: f32,
    /// Full-scale value the display normalises against.
    pub normalization_scale: f32,
    /// Logical width of the rendered window the detectors look at.
    /// `None` = the whole sample buffer.
    #[serde(default)]
    pub detection_width: Option<usize>,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            absolute_threshold: 0.95,
            average_multiplier: 4.0,
            display_scale: 0.5,
            normalization_scale: 1.0,
            detection_width: None,
        }
    }
}

impl ArtifactConfig {
    /// `display_scale / normalization_scale`, the factor applied before the
    /// absolute threshold.
    #[inline]
    #[must_use]
    pub fn sample_gain(&self) -> f32 {
        self.display_scale / self.normalization_scale
    }
}

/// Complete pipeline configuration. Fixed for the lifetime of a session.
///
/// # Example
/// ```
/// use eeg_core::config::PipelineConfig;
/// let config = PipelineConfig::default();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.window_len, 60);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Sample buffer length N. Power of two.
    pub buffer_len: usize,
    /// Input sample rate R in Hz.
    pub sample_rate: u32,
    /// Bin-width correction applied at every Hz -> bin conversion.
    pub scale_factor: f32,
    /// Running-average window length L, in frames.
    pub window_len: usize,
    /// Window function for the forward transform.
    pub window_function: WindowFunction,
    /// Frames per second the host loop aims for.
    pub target_fps: u32,
    /// Band table, in [`Band::ALL`] order.
    pub bands: [BandSettings; BAND_COUNT],
    /// Artifact thresholds.
    pub artifact: ArtifactConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            buffer_len: 16384,
            sample_rate: 44100,
            scale_factor: 1.33,
            window_len: 60,
            window_function: WindowFunction::Hamming,
            target_fps: 30,
            bands: [
                BandSettings { upper_hz: 4.0, scale: 1.0 },
                BandSettings { upper_hz: 8.0, scale: 1.5 },
                BandSettings { upper_hz: 12.0, scale: 2.0 },
                BandSettings { upper_hz: 15.0, scale: 3.0 },
                BandSettings { upper_hz: 20.0, scale: 3.5 },
                BandSettings { upper_hz: 30.0, scale: 4.0 },
            ],
            artifact: ArtifactConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Check every invariant the pipeline relies on.
    ///
    /// # Errors
    /// Returns [`CoreError::Configuration`] describing the first violation.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.buffer_len < 2 || !self.buffer_len.is_power_of_two() {
            return Err(CoreError::config(format!(
                "buffer_len doit être une puissance de deux >= 2 (reçu {})",
                self.buffer_len
            )));
        }
        if self.sample_rate == 0 {
            return Err(CoreError::config("sample_rate doit être > 0"));
        }
        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
            return Err(CoreError::config(format!(
                "scale_factor invalide ({})",
                self.scale_factor
            )));
        }
        if self.window_len == 0 {
            return Err(CoreError::config("window_len doit être > 0"));
        }
        if self.target_fps == 0 {
            return Err(CoreError::config("target_fps doit être > 0"));
        }

        let table = self.band_table()?;
        let nyquist = self.sample_rate as f32 / 2.0;
        if table.max_hz() > nyquist {
            return Err(CoreError::config(format!(
                "la bande high_beta ({} Hz) dépasse Nyquist ({nyquist} Hz)",
                table.max_hz()
            )));
        }
        let mapper = self.bin_mapper();
        let top_bin = mapper.hz_to_bin(table.max_hz());
        if top_bin >= mapper.bin_count() {
            return Err(CoreError::config(format!(
                "la bande high_beta ({} Hz) tombe au bin {top_bin}, hors des {} bins : vérifier scale_factor ({})",
                table.max_hz(),
                mapper.bin_count(),
                self.scale_factor
            )));
        }

        let a = &self.artifact;
        if !(a.absolute_threshold.is_finite() && a.absolute_threshold > 0.0) {
            return Err(CoreError::config("absolute_threshold doit être > 0"));
        }
        if !(a.average_multiplier.is_finite() && a.average_multiplier > 0.0) {
            return Err(CoreError::config("average_multiplier doit être > 0"));
        }
        if !(a.normalization_scale.is_finite() && a.normalization_scale != 0.0) {
            return Err(CoreError::config("normalization_scale ne peut pas être nul"));
        }
        if !a.display_scale.is_finite() {
            return Err(CoreError::config("display_scale invalide"));
        }
        if let Some(width) = a.detection_width
            && (width == 0 || width > self.buffer_len)
        {
            return Err(CoreError::config(format!(
                "detection_width doit être dans 1..={} (reçu {width})",
                self.buffer_len
            )));
        }

        Ok(())
    }

    /// Resolve the band table.
    ///
    /// # Errors
    /// See [`BandTable::from_settings`].
    pub fn band_table(&self) -> Result<BandTable, CoreError> {
        BandTable::from_settings(&self.bands)
    }

    /// Hz -> bin mapper for this buffer length, sample rate and scale factor.
    #[must_use]
    pub fn bin_mapper(&self) -> BinMapper {
        BinMapper::new(self.sample_rate, self.buffer_len, self.scale_factor)
    }

    /// Number of input samples that elapse between two frames.
    #[must_use]
    pub fn hop_len(&self) -> usize {
        (self.sample_rate / self.target_fps.max(1)).max(1) as usize
    }
}

/// Structure TOML intermédiaire : toutes les valeurs sont optionnelles.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    pipeline: Option<PipelineSection>,
    artifact: Option<ArtifactSection>,
    bands: Option<BandsSection>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PipelineSection {
    buffer_len: Option<usize>,
    sample_rate: Option<u32>,
    scale_factor: Option<f32>,
    window_len: Option<usize>,
    window_function: Option<WindowFunction>,
    target_fps: Option<u32>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ArtifactSection {
    absolute_threshold: Option<f32>,
    average_multiplier: Option<f32>,
    display_scale: Option<f32>,
    normalization_scale: Option<f32>,
    detection_width: Option<usize>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BandsSection {
    delta: Option<BandSection>,
    theta: Option<BandSection>,
    alpha: Option<BandSection>,
    low_beta: Option<BandSection>,
    mid_beta: Option<BandSection>,
    high_beta: Option<BandSection>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BandSection {
    upper_hz: Option<f32>,
    scale: Option<f32>,
}

impl BandsSection {
    fn take(&mut self, band: Band) -> Option<BandSection> {
        match band {
            Band::Delta => self.delta.take(),
            Band::Theta => self.theta.take(),
            Band::Alpha => self.alpha.take(),
            Band::LowBeta => self.low_beta.take(),
            Band::MidBeta => self.mid_beta.take(),
            Band::HighBeta => self.high_beta.take(),
        }
    }
}

/// Parse a TOML document, merge it over the defaults, and validate.
///
/// # Errors
/// Returns an error if the TOML is malformed or the merged configuration
/// is invalid.
///
/// # Example
/// ```
/// use eeg_core::config::parse_config;
/// let config = parse_config("[pipeline]\nwindow_len = 30\n").unwrap();
/// assert_eq!(config.window_len, 30);
/// ```
pub fn parse_config(content: &str) -> Result<PipelineConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;

    let mut config = PipelineConfig::default();

    if let Some(p) = file.pipeline {
        if let Some(v) = p.buffer_len {
            config.buffer_len = v;
        }
        if let Some(v) = p.sample_rate {
            config.sample_rate = v;
        }
        if let Some(v) = p.scale_factor {
            config.scale_factor = v;
        }
        if let Some(v) = p.window_len {
            config.window_len = v;
        }
        if let Some(v) = p.window_function {
            config.window_function = v;
        }
        if let Some(v) = p.target_fps {
            config.target_fps = v;
        }
    }

    if let Some(a) = file.artifact {
        if let Some(v) = a.absolute_threshold {
            config.artifact.absolute_threshold = v;
        }
        if let Some(v) = a.average_multiplier {
            config.artifact.average_multiplier = v;
        }
        if let Some(v) = a.display_scale {
            config.artifact.display_scale = v;
        }
        if let Some(v) = a.normalization_scale {
            config.artifact.normalization_scale = v;
        }
        if a.detection_width.is_some() {
            config.artifact.detection_width = a.detection_width;
        }
    }

    if let Some(mut bands) = file.bands {
        for band in Band::ALL {
            if let Some(section) = bands.take(band) {
                let slot = &mut config.bands[band.index()];
                if let Some(v) = section.upper_hz {
                    slot.upper_hz = v;
                }
                if let Some(v) = section.scale {
                    slot.scale = v;
                }
            }
        }
    }

    config.validate()?;
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed, or fails validation.
///
/// # Example
/// ```no_run
/// use eeg_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let config =
        parse_config(&content).with_context(|| format!("Config invalide : {}", path.display()))?;
    log::info!("Config chargée depuis {}", path.display());
    Ok(config)
}
