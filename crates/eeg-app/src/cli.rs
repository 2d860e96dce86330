use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use eeg_core::config::{PipelineConfig, WindowFunction};

/// eegscope: live EEG band-power monitor.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source : "mic" (entrée audio par défaut), "sine:10,20@0.3" (synthétique),
    /// ou chemin vers un enregistrement (WAV, FLAC, ...).
    #[arg(short, long, default_value = "mic")]
    pub source: String,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Fréquence d'échantillonnage (ignorée si la source impose la sienne).
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Taille du buffer N (puissance de deux).
    #[arg(long)]
    pub buffer_len: Option<usize>,

    /// Frames d'analyse par seconde.
    #[arg(long)]
    pub fps: Option<u32>,

    /// Fenêtre appliquée avant la FFT.
    #[arg(long, value_enum)]
    pub window: Option<WindowArg>,

    /// Analyse offline de l'enregistrement entier, rapport JSON sur stdout.
    #[arg(long, default_value_t = false)]
    pub batch: bool,

    /// Écrire le rapport batch dans ce fichier plutôt que sur stdout.
    #[arg(long, requires = "batch")]
    pub batch_out: Option<PathBuf>,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Fichier de log. Sans lui, l'interface n'affiche que les erreurs.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// `--window` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum WindowArg {
    Hamming,
    None,
}

impl From<WindowArg> for WindowFunction {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::Hamming => WindowFunction::Hamming,
            WindowArg::None => WindowFunction::None,
        }
    }
}

impl Cli {
    /// Apply the per-field flags over a loaded configuration.
    pub fn apply_overrides(&self, config: &mut PipelineConfig) {
        if let Some(rate) = self.sample_rate {
            config.sample_rate = rate;
        }
        if let Some(len) = self.buffer_len {
            config.buffer_len = len;
        }
        if let Some(fps) = self.fps {
            config.target_fps = fps;
        }
        if let Some(window) = self.window {
            config.window_function = window.into();
        }
    }

    /// Parsed `--log-level`, `warn` when unrecognised.
    #[must_use]
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Warn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_file_values() {
        let cli = Cli::try_parse_from([
            "eegscope",
            "--source",
            "sine:10",
            "--buffer-len",
            "1024",
            "--sample-rate",
            "256",
            "--window",
            "none",
        ])
        .unwrap_or_else(|e| panic!("{e}"));

        let mut config = PipelineConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.buffer_len, 1024);
        assert_eq!(config.sample_rate, 256);
        assert_eq!(config.window_function, WindowFunction::None);
        assert_eq!(config.target_fps, PipelineConfig::default().target_fps);
    }

    #[test]
    fn batch_out_requires_batch() {
        assert!(Cli::try_parse_from(["eegscope", "--batch-out", "r.json"]).is_err());
        assert!(Cli::try_parse_from(["eegscope", "--batch", "--batch-out", "r.json"]).is_ok());
    }

    #[test]
    fn unknown_log_level_falls_back_to_warn() {
        let cli = Cli::try_parse_from(["eegscope", "--log-level", "bavard"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(cli.level_filter(), log::LevelFilter::Warn);
    }
}
