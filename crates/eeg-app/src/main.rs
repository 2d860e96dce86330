use std::fs::File;

use anyhow::{Context, Result};
use clap::Parser;
use eeg_core::config::PipelineConfig;

pub mod app;
pub mod batch;
pub mod cli;
pub mod pipeline;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    init_logging(&cli)?;

    // 3. Charger la config, appliquer les overrides CLI
    let mut config = resolve_config(&cli)?;
    cli.apply_overrides(&mut config);

    // 4. Valider la source
    let spec = pipeline::SourceSpec::parse(&cli.source)?;

    // Analyse offline
    if cli.batch {
        log::info!("Analyse offline de {}", spec.label());
        return batch::run_batch(&spec, config, cli.batch_out.as_deref());
    }

    // 5. Démarrer la source et le thread d'analyse
    let redraw_fps = config.target_fps;
    let session = pipeline::start_session(&spec, config)?;

    // 6. Initialiser le terminal ratatui
    let terminal = ratatui::init();

    // 7. Boucle principale
    let mut app_instance = app::App::new(session.output, session.cmd_tx, session.info, redraw_fps);
    let result = app_instance.run(terminal);

    // 8. Restaurer le terminal (TOUJOURS, même en cas d'erreur)
    ratatui::restore();

    // app dropped its sender: the analysis thread is stopping
    drop(app_instance);
    if session.handle.join().is_err() {
        log::error!("Le thread d'analyse a paniqué");
    }
    drop(session.capture);

    result
}

/// Logging to `--log-file` when given. Without a file the TUI owns the
/// terminal, so only errors reach stderr; batch mode logs to stderr as asked.
fn init_logging(cli: &cli::Cli) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    let level = cli.level_filter();

    if let Some(path) = &cli.log_file {
        let file = File::create(path)
            .with_context(|| format!("Impossible de créer le log {}", path.display()))?;
        builder
            .filter_level(level)
            .target(env_logger::Target::Pipe(Box::new(file)));
    } else if cli.batch {
        builder.filter_level(level);
    } else {
        builder.filter_level(level.min(log::LevelFilter::Error));
    }

    builder.init();
    Ok(())
}

/// Resolve config: --config if it exists, defaults otherwise.
fn resolve_config(cli: &cli::Cli) -> Result<PipelineConfig> {
    if cli.config.exists() {
        eeg_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(PipelineConfig::default())
    }
}
