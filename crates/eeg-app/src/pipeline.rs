use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use eeg_audio::Pipeline;
use eeg_audio::capture::AudioCapture;
use eeg_audio::source::{FileSource, SignalGenerator, Tone, parse_tones};
use eeg_audio::state::{AnalysisCommand, spawn_analysis_thread};
use eeg_core::config::PipelineConfig;
use eeg_core::frame::AnalysisSnapshot;
use eeg_core::traits::SampleSource;
use eeg_render::ui::SessionInfo;

/// Where samples come from, parsed from `--source`.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceSpec {
    Microphone,
    File(PathBuf),
    Synthetic(Vec<Tone>),
}

impl SourceSpec {
    /// `mic`, `sine:<tones>` or an existing file path.
    ///
    /// # Errors
    /// Returns an error for a malformed tone list or a missing file.
    pub fn parse(arg: &str) -> Result<Self> {
        match arg {
            "default" | "mic" | "microphone" => Ok(Self::Microphone),
            _ => {
                if let Some(list) = arg.strip_prefix("sine:") {
                    return Ok(Self::Synthetic(parse_tones(list)?));
                }
                let path = Path::new(arg);
                if path.exists() {
                    Ok(Self::File(path.to_path_buf()))
                } else {
                    anyhow::bail!("Source introuvable : {arg}")
                }
            }
        }
    }

    /// Short label for the status panel.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Microphone => "micro".to_string(),
            Self::File(path) => path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or_else(|| path.display().to_string(), String::from),
            Self::Synthetic(tones) => {
                let freqs: Vec<String> = tones.iter().map(|t| format!("{}", t.freq_hz)).collect();
                format!("sine {}Hz", freqs.join("+"))
            }
        }
    }
}

/// A running live session: analysis thread plus the handles the UI needs.
pub struct Session {
    pub output: triple_buffer::Output<AnalysisSnapshot>,
    pub cmd_tx: flume::Sender<AnalysisCommand>,
    pub handle: JoinHandle<()>,
    pub info: SessionInfo,
    /// Keeps the cpal stream alive for the whole session.
    pub capture: Option<AudioCapture>,
}

/// Open the source, build the pipeline at the source's sample rate, and
/// start the analysis thread.
///
/// # Errors
/// Returns an error if the source cannot be opened or the configuration is
/// invalid at the effective sample rate.
pub fn start_session(spec: &SourceSpec, mut config: PipelineConfig) -> Result<Session> {
    let mut capture = None;
    let source: Box<dyn SampleSource> = match spec {
        SourceSpec::Microphone => {
            log::info!("Démarrage de l'acquisition micro");
            let (handle, reader) = AudioCapture::start_default(config.buffer_len)?;
            capture = Some(handle);
            Box::new(reader)
        }
        SourceSpec::File(path) => {
            log::info!("Lecture en boucle : {}", path.display());
            Box::new(FileSource::open(path, config.target_fps)?)
        }
        SourceSpec::Synthetic(tones) => Box::new(SignalGenerator::new(
            tones.clone(),
            config.sample_rate,
            config.hop_len(),
        )),
    };

    if source.sample_rate() != config.sample_rate {
        log::warn!(
            "Fréquence imposée par la source : {} Hz (config : {} Hz)",
            source.sample_rate(),
            config.sample_rate
        );
        config.sample_rate = source.sample_rate();
    }

    let pipeline = Pipeline::new(config.clone())
        .with_context(|| format!("Configuration invalide à {} Hz", config.sample_rate))?;
    let (cmd_tx, cmd_rx) = flume::bounded(16);
    let (output, handle) = spawn_analysis_thread(pipeline, source, cmd_rx)?;

    let info = SessionInfo {
        source_label: spec.label(),
        sample_rate: config.sample_rate,
        buffer_len: config.buffer_len,
        scale_factor: config.scale_factor,
        max_band_hz: config.bands.last().map_or(0.0, |b| b.upper_hz),
        waveform_gain: config.artifact.sample_gain(),
    };

    Ok(Session {
        output,
        cmd_tx,
        handle,
        info,
        capture,
    })
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    #[test]
    fn parses_every_source_kind() {
        assert_eq!(SourceSpec::parse("mic").ok(), Some(SourceSpec::Microphone));
        assert_eq!(
            SourceSpec::parse("sine:10@0.5").ok(),
            Some(SourceSpec::Synthetic(vec![Tone {
                freq_hz: 10.0,
                amplitude: 0.5
            }]))
        );
        assert!(SourceSpec::parse("sine:").is_err());
        assert!(SourceSpec::parse("/nulle/part.wav").is_err());

        let file = tempfile::NamedTempFile::new().unwrap_or_else(|e| panic!("{e}"));
        let path = file.path().to_string_lossy().to_string();
        assert!(matches!(SourceSpec::parse(&path), Ok(SourceSpec::File(_))));
    }

    #[test]
    fn labels() {
        let tones = parse_tones("10,20").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(SourceSpec::Synthetic(tones).label(), "sine 10+20Hz");
        assert_eq!(
            SourceSpec::File(PathBuf::from("/data/s01.wav")).label(),
            "s01.wav"
        );
    }

    #[test]
    fn synthetic_session_produces_frames() {
        let config = PipelineConfig {
            buffer_len: 1024,
            sample_rate: 256,
            target_fps: 200,
            ..PipelineConfig::default()
        };
        let spec = SourceSpec::Synthetic(vec![Tone {
            freq_hz: 10.0,
            amplitude: 0.5,
        }]);
        let mut session = start_session(&spec, config).unwrap_or_else(|e| panic!("{e}"));
        assert!(session.capture.is_none());
        assert!((session.info.max_band_hz - 30.0).abs() < f32::EPSILON);

        let deadline = Instant::now() + Duration::from_secs(5);
        while session.output.read().frame.frame_index < 2 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(session.output.read().frame.frame_index >= 2);

        assert!(session.cmd_tx.send(AnalysisCommand::Quit).is_ok());
        assert!(session.handle.join().is_ok());
    }

    #[test]
    fn invalid_configuration_is_reported_before_starting() {
        let config = PipelineConfig {
            buffer_len: 1000,
            ..PipelineConfig::default()
        };
        let spec = SourceSpec::Synthetic(vec![Tone {
            freq_hz: 10.0,
            amplitude: 0.5,
        }]);
        assert!(start_session(&spec, config).is_err());
    }
}
