use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use eeg_audio::batch_analyzer::{BatchAnalyzer, BatchReport};
use eeg_core::config::PipelineConfig;

use crate::pipeline::SourceSpec;

/// Point d'entrée de l'analyse offline : un enregistrement, un rapport JSON.
///
/// # Errors
/// Retourne une erreur si la source n'est pas un fichier, si le décodage
/// échoue, ou si le rapport ne peut être écrit.
pub fn run_batch(spec: &SourceSpec, config: PipelineConfig, out: Option<&Path>) -> Result<()> {
    let SourceSpec::File(path) = spec else {
        anyhow::bail!("--batch requiert un fichier enregistré comme --source");
    };

    let mut analyzer = BatchAnalyzer::new(config)?;
    let report = analyzer
        .analyze_file(path)
        .with_context(|| format!("Analyse impossible : {}", path.display()))?;

    match out {
        Some(out_path) => {
            let file = File::create(out_path)
                .with_context(|| format!("Impossible de créer {}", out_path.display()))?;
            write_report(&report, BufWriter::new(file))?;
            log::info!("Rapport écrit : {}", out_path.display());
        }
        None => write_report(&report, io::stdout().lock())?,
    }
    Ok(())
}

fn write_report(report: &BatchReport, mut writer: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use eeg_audio::source::Tone;

    use super::*;

    #[test]
    fn live_only_sources_are_refused() {
        let spec = SourceSpec::Synthetic(vec![Tone {
            freq_hz: 10.0,
            amplitude: 1.0,
        }]);
        assert!(run_batch(&spec, PipelineConfig::default(), None).is_err());
        assert!(run_batch(&SourceSpec::Microphone, PipelineConfig::default(), None).is_err());
    }

    #[test]
    fn undecodable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("notes.wav");
        std::fs::write(&path, b"pas un wav").unwrap_or_else(|e| panic!("{e}"));
        let out = dir.path().join("report.json");
        let res = run_batch(&SourceSpec::File(path), PipelineConfig::default(), Some(&out));
        assert!(res.is_err());
        assert!(!out.exists());
    }

    #[test]
    fn report_is_pretty_json() {
        let config = PipelineConfig {
            buffer_len: 256,
            sample_rate: 256,
            ..PipelineConfig::default()
        };
        let mut analyzer = BatchAnalyzer::new(config).unwrap_or_else(|e| panic!("{e}"));
        let report = analyzer.analyze_all(&[0.0; 64]);
        let mut buf = Vec::new();
        write_report(&report, &mut buf).unwrap_or_else(|e| panic!("{e}"));
        let text = String::from_utf8(buf).unwrap_or_else(|e| panic!("{e}"));
        assert!(text.starts_with('{'));
        assert!(text.contains("\"good_frames\": 8"));
    }
}
