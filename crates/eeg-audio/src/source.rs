use std::path::Path;
use std::str::FromStr;

use eeg_core::error::CoreError;
use eeg_core::traits::SampleSource;

use crate::decode;
use crate::error::AudioError;

/// Replays a decoded recording in a loop, one hop per frame.
///
/// Each read advances the play head by `hop` samples and returns the N
/// samples ending at the head, wrapping around the end of the recording.
/// The first read returns the start of the recording.
pub struct FileSource {
    samples: Vec<f32>,
    sample_rate: u32,
    hop: usize,
    position: usize,
    started: bool,
}

impl FileSource {
    /// Decode `path` and replay it at `target_fps` frames per second of
    /// recording (hop = R / fps at the file's own rate R).
    ///
    /// # Errors
    /// Returns an error if decoding fails or the recording is empty.
    pub fn open(path: &Path, target_fps: u32) -> anyhow::Result<Self> {
        let (samples, sample_rate) = decode::decode_file(path)?;
        let hop = (sample_rate / target_fps.max(1)) as usize;
        Ok(Self::from_samples(samples, sample_rate, hop)?)
    }

    /// Replay already-decoded samples.
    ///
    /// # Errors
    /// [`AudioError::DecodeError`] if `samples` is empty.
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32, hop: usize) -> Result<Self, AudioError> {
        if samples.is_empty() {
            return Err(AudioError::DecodeError("enregistrement vide".into()));
        }
        Ok(Self {
            samples,
            sample_rate,
            hop: hop.max(1),
            position: 0,
            started: false,
        })
    }

    /// Play head, as a sample index into the recording.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Recording length in samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`, empty recordings are rejected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl SampleSource for FileSource {
    fn read_block(&mut self, out: &mut [f32]) -> Result<(), CoreError> {
        let total = self.samples.len();
        let n = out.len();
        self.position = if self.started {
            (self.position + self.hop) % total
        } else {
            self.started = true;
            n % total
        };

        let start = (self.position + total - n % total) % total;
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.samples[(start + i) % total];
        }
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// One sinusoidal component of a [`SignalGenerator`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tone {
    pub freq_hz: f32,
    pub amplitude: f32,
}

impl FromStr for Tone {
    type Err = CoreError;

    /// `"10"` (amplitude 1.0) or `"10@0.5"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || {
            CoreError::Configuration(format!("composante invalide : '{s}' (attendu HZ ou HZ@AMPL)"))
        };
        let (freq, amplitude) = match s.trim().split_once('@') {
            Some((f, a)) => (f, a.trim().parse::<f32>().map_err(|_| bad())?),
            None => (s, 1.0),
        };
        let freq_hz = freq.trim().parse::<f32>().map_err(|_| bad())?;
        if !freq_hz.is_finite() || freq_hz < 0.0 || !amplitude.is_finite() {
            return Err(bad());
        }
        Ok(Self { freq_hz, amplitude })
    }
}

/// Parse a comma-separated tone list such as `"10,20@0.3"`.
///
/// # Errors
/// [`CoreError::Configuration`] on an empty list or a malformed component.
///
/// # Example
/// ```
/// use eeg_audio::source::parse_tones;
/// let tones = parse_tones("10,20@0.3").unwrap();
/// assert_eq!(tones.len(), 2);
/// assert_eq!(tones[1].amplitude, 0.3);
/// ```
pub fn parse_tones(list: &str) -> Result<Vec<Tone>, CoreError> {
    let tones = list
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect::<Result<Vec<Tone>, _>>()?;
    if tones.is_empty() {
        return Err(CoreError::Configuration("aucune composante sinusoïdale".into()));
    }
    Ok(tones)
}

/// Synthetic source: a sum of phase-continuous sinusoids.
///
/// Same framing as [`FileSource`]: each read advances the clock by `hop`
/// samples and returns the N samples ending at the clock.
pub struct SignalGenerator {
    tones: Vec<Tone>,
    sample_rate: u32,
    hop: usize,
    clock: u64,
    started: bool,
}

impl SignalGenerator {
    /// Generator for `tones` at `sample_rate`, advancing `hop` samples per read.
    #[must_use]
    pub fn new(tones: Vec<Tone>, sample_rate: u32, hop: usize) -> Self {
        Self {
            tones,
            sample_rate,
            hop: hop.max(1),
            clock: 0,
            started: false,
        }
    }

    /// Value of the signal at absolute sample index `t`.
    #[must_use]
    pub fn sample_at(&self, t: u64) -> f32 {
        let secs = t as f64 / f64::from(self.sample_rate.max(1));
        self.tones
            .iter()
            .map(|tone| {
                let phase = std::f64::consts::TAU * f64::from(tone.freq_hz) * secs;
                tone.amplitude * phase.sin() as f32
            })
            .sum()
    }
}

impl SampleSource for SignalGenerator {
    fn read_block(&mut self, out: &mut [f32]) -> Result<(), CoreError> {
        let n = out.len() as u64;
        self.clock = if self.started {
            self.clock + self.hop as u64
        } else {
            self.started = true;
            n
        };
        let start = self.clock - n;
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.sample_at(start + i as u64);
        }
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_source_starts_at_the_beginning_then_hops() {
        let samples: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let mut src = FileSource::from_samples(samples, 100, 3).unwrap_or_else(|e| panic!("{e}"));
        let mut out = [0.0f32; 4];

        src.read_block(&mut out).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(out, [0.0, 1.0, 2.0, 3.0]);
        src.read_block(&mut out).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(out, [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn file_source_wraps_around() {
        let samples: Vec<f32> = (0..6).map(|i| i as f32).collect();
        let mut src = FileSource::from_samples(samples, 100, 4).unwrap_or_else(|e| panic!("{e}"));
        let mut out = [0.0f32; 4];
        src.read_block(&mut out).unwrap_or_else(|e| panic!("{e}"));
        src.read_block(&mut out).unwrap_or_else(|e| panic!("{e}"));
        // head at (4 + 4) % 6 = 2
        assert_eq!(src.position(), 2);
        assert_eq!(out, [4.0, 5.0, 0.0, 1.0]);
    }

    #[test]
    fn empty_recording_is_rejected() {
        assert!(FileSource::from_samples(Vec::new(), 256, 8).is_err());
    }

    #[test]
    fn tone_parsing() {
        assert_eq!(
            "10".parse::<Tone>().ok(),
            Some(Tone { freq_hz: 10.0, amplitude: 1.0 })
        );
        assert_eq!(
            " 12.5@0.25 ".parse::<Tone>().ok(),
            Some(Tone { freq_hz: 12.5, amplitude: 0.25 })
        );
        assert!("dix".parse::<Tone>().is_err());
        assert!("10@".parse::<Tone>().is_err());
        assert!(parse_tones(" , ").is_err());
    }

    #[test]
    fn generator_is_phase_continuous_across_blocks() {
        let tones = vec![Tone { freq_hz: 7.0, amplitude: 0.8 }];
        let mut generator = SignalGenerator::new(tones, 256, 16);
        let mut first = vec![0.0f32; 64];
        let mut second = vec![0.0f32; 64];
        generator.read_block(&mut first).unwrap_or_else(|e| panic!("{e}"));
        generator.read_block(&mut second).unwrap_or_else(|e| panic!("{e}"));
        for i in 0..48 {
            assert!((first[i + 16] - second[i]).abs() < 1e-6);
        }
        assert!(first[0].abs() < 1e-6);
    }
}
