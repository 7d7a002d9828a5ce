use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tf_core::config::Settings;
use tf_render::pacing::{PacingController, ThreadSleeper};
use tf_render::screen::{self, ScreenWriter, TerminalGuard, TerminalProbe};
use tf_source::SourceKind;

pub mod cli;
pub mod pipeline;
pub mod playback;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging (stderr, stdout reste réservé aux frames)
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Valider la source
    let (source_id, kind) = cli.validate_source()?;

    // 4. Charger la config puis appliquer les overrides CLI
    let settings = resolve_settings(&cli)?;
    let config = cli.playback_config(source_id, settings);
    log::debug!("Config de session : {config:?}");

    // 5. Ouvrir la source (fatal avant tout rendu)
    let mut source = pipeline::open_source(&config, kind)?;

    let probe = TerminalProbe;
    let mut pipeline = pipeline::FramePipeline::new(config.settings());
    let mut screen = ScreenWriter::new(io::stdout().lock());

    // 6. Dispatch
    match kind {
        SourceKind::Image => {
            playback::view_image(source.as_mut(), &config, &probe, &mut pipeline, &mut screen)
        }
        SourceKind::Video => {
            let target = playback::target_interval(&config, source.native_frame_rate());
            log::info!("Cadence cible : {:.3} s/frame", target.as_secs_f64());
            let mut pacer = PacingController::new(target, ThreadSleeper);
            let shutdown = playback::Shutdown::install()?;

            // Le curseur est restauré au drop, même en cas d'erreur.
            screen::install_panic_hook();
            let _guard = TerminalGuard::enter(io::stdout()).context("Terminal indisponible")?;
            let report = playback::play_video(
                source.as_mut(),
                &config,
                &probe,
                &mut pipeline,
                &mut screen,
                &mut pacer,
                &shutdown,
            )?;
            log::debug!("{report:?}");
            Ok(())
        }
    }
}

/// `--config` explicite : doit exister. Sinon termframe.toml s'il existe, sinon défauts.
fn resolve_settings(cli: &cli::Cli) -> Result<Settings> {
    if let Some(ref path) = cli.config {
        return tf_core::config::load_settings(path);
    }
    let default_path = Path::new(cli::DEFAULT_CONFIG);
    if default_path.exists() {
        tf_core::config::load_settings(default_path)
    } else {
        log::debug!("Pas de {}, utilisation des défauts.", cli::DEFAULT_CONFIG);
        Ok(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tf_core::cell::CellMode;

    #[test]
    fn explicit_config_must_exist() {
        let cli = cli::Cli::try_parse_from(["termframe", "a.png", "-c", "/nonexistent/tf.toml"]).unwrap();
        assert!(resolve_settings(&cli).is_err());
    }

    #[test]
    fn explicit_config_is_loaded_then_overridden() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[render]\nmode = \"foreground_glyph\"\ncolor = true").unwrap();
        let path = file.path().to_string_lossy().into_owned();
        let cli = cli::Cli::try_parse_from(["termframe", "a.png", "-c", &path, "--no-color"]).unwrap();

        let settings = resolve_settings(&cli).unwrap();
        assert_eq!(settings.mode, CellMode::ForegroundGlyph);
        let config = cli.playback_config("a.png".into(), settings);
        assert!(!config.settings().color);
    }
}
