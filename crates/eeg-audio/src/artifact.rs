use eeg_core::config::ArtifactConfig;
use eeg_core::frame::ArtifactFlags;

use crate::buffer::SampleBuffer;

/// Evaluates the two artifact heuristics over the rendered time-domain window.
///
/// Both flags are recomputed from scratch every frame; nothing carries over.
///
/// # Example
/// ```
/// use eeg_audio::artifact::ArtifactDetector;
/// use eeg_audio::buffer::SampleBuffer;
/// use eeg_core::config::ArtifactConfig;
///
/// let mut detector = ArtifactDetector::new(&ArtifactConfig::default());
/// let buffer = SampleBuffer::new(256);
/// assert!(detector.evaluate(&buffer).is_good());
/// ```
pub struct ArtifactDetector {
    absolute_threshold: f32,
    average_multiplier: f32,
    gain: f32,
    width: Option<usize>,
    /// Scratch for the remapped view (pre-allocated, reused).
    view: Vec<f32>,
}

impl ArtifactDetector {
    /// Build from the artifact section of the configuration.
    #[must_use]
    pub fn new(config: &ArtifactConfig) -> Self {
        Self {
            absolute_threshold: config.absolute_threshold,
            average_multiplier: config.average_multiplier,
            gain: config.sample_gain(),
            width: config.detection_width,
            view: Vec::with_capacity(config.detection_width.unwrap_or(0)),
        }
    }

    /// Flags for the current buffer contents.
    pub fn evaluate(&mut self, buffer: &SampleBuffer) -> ArtifactFlags {
        let window: &[f32] = match self.width {
            Some(width) => {
                buffer.view_into(width, &mut self.view);
                &self.view
            }
            None => buffer.as_slice(),
        };

        let flags = ArtifactFlags {
            absolute: absolute_flag(window, self.gain, self.absolute_threshold),
            average: average_flag(window, self.average_multiplier),
        };
        if !flags.is_good() {
            log::trace!("artifact frame: {flags:?}");
        }
        flags
    }
}

/// `true` iff some `|sample| * gain` exceeds `threshold`.
///
/// # Example
/// ```
/// use eeg_audio::artifact::absolute_flag;
/// assert!(!absolute_flag(&[0.0, 0.95, -0.95], 1.0, 0.95));
/// assert!(absolute_flag(&[0.0, -0.96], 1.0, 0.95));
/// ```
#[inline]
#[must_use]
pub fn absolute_flag(samples: &[f32], gain: f32, threshold: f32) -> bool {
    samples.iter().any(|s| (s * gain).abs() > threshold)
}

/// `true` iff some adjacent-sample jump exceeds `multiplier` times the mean
/// absolute sample value of the window.
///
/// A flat buffer never triggers: with a zero mean no jump exceeds zero.
///
/// # Example
/// ```
/// use eeg_audio::artifact::average_flag;
/// assert!(!average_flag(&[0.0; 16], 4.0));
/// ```
#[must_use]
pub fn average_flag(samples: &[f32], multiplier: f32) -> bool {
    if samples.len() < 2 {
        return false;
    }
    let mean_abs = samples.iter().map(|s| s.abs()).sum::<f32>() / samples.len() as f32;
    let limit = multiplier * mean_abs;
    samples.windows(2).any(|w| (w[1] - w[0]).abs() > limit)
}
