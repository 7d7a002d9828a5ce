use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tf_core::cell::CellMode;
use tf_core::config::{PlaybackConfig, Settings};
use tf_core::frame::TargetGrid;
use tf_source::SourceKind;

/// Fichier de configuration lu s'il existe et si `--config` est absent.
pub const DEFAULT_CONFIG: &str = "termframe.toml";

/// Mode de rendu des cellules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Espace sur fond coloré.
    Background,
    /// Glyphe '@' coloré en avant-plan.
    Glyph,
    /// Glyphe choisi par luminance, coloré.
    Density,
}

impl From<ModeArg> for CellMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Background => CellMode::Background,
            ModeArg::Glyph => CellMode::ForegroundGlyph,
            ModeArg::Density => CellMode::GrayscaleDensity,
        }
    }
}

/// termframe : images et vidéos en couleurs 24 bits dans le terminal.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source : chemin ou URL. Type détecté par extension (image sinon vidéo).
    pub source: Option<String>,

    /// Source image explicite (PNG, JPEG, BMP, GIF).
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Source vidéo explicite : chemin ou URL lisible par ffmpeg.
    #[arg(long)]
    pub video: Option<String>,

    /// Mode de rendu.
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Glyphe du mode `glyph`.
    #[arg(long)]
    pub glyph: Option<char>,

    /// Grille forcée, ex. `120x40`. Ignore la taille du terminal.
    #[arg(short, long, value_name = "COLSxROWS")]
    pub size: Option<TargetGrid>,

    /// Cadence forcée (remplace celle de la vidéo).
    #[arg(long)]
    pub fps: Option<f64>,

    /// Désactiver la couleur (niveaux de gris).
    #[arg(long, default_value_t = false)]
    pub no_color: bool,

    /// Fichier de configuration TOML. Défaut : termframe.toml s'il existe.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Validate that exactly one source is provided and return it with its kind.
    ///
    /// # Errors
    /// Returns an error if zero or more than one source is specified.
    pub fn validate_source(&self) -> anyhow::Result<(String, SourceKind)> {
        let count = usize::from(self.source.is_some())
            + usize::from(self.image.is_some())
            + usize::from(self.video.is_some());

        if count == 0 {
            anyhow::bail!("Aucune source spécifiée. Donnez un chemin/URL, --image ou --video.");
        }
        if count > 1 {
            anyhow::bail!("Une seule source à la fois : chemin/URL, --image, OU --video.");
        }

        if let Some(ref path) = self.image {
            return Ok((path.to_string_lossy().into_owned(), SourceKind::Image));
        }
        if let Some(ref url) = self.video {
            return Ok((url.clone(), SourceKind::Video));
        }
        let source = self.source.clone().unwrap_or_default();
        let kind = SourceKind::detect(&source);
        Ok((source, kind))
    }

    /// Apply command-line overrides on top of file settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(mode) = self.mode {
            settings.mode = mode.into();
        }
        if let Some(glyph) = self.glyph {
            settings.glyph = glyph;
        }
        if let Some(fps) = self.fps {
            settings.fps_override = Some(fps);
        }
        if self.no_color {
            settings.color = false;
        }
        settings.clamp_all();
    }

    /// Build the immutable session config.
    #[must_use]
    pub fn playback_config(&self, source: String, mut settings: Settings) -> PlaybackConfig {
        self.apply_overrides(&mut settings);
        PlaybackConfig::new(source, settings, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("termframe").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn positional_source_is_detected() {
        let cli = parse(&["Images/Image-10.jpg"]);
        let (source, kind) = cli.validate_source().unwrap();
        assert_eq!(source, "Images/Image-10.jpg");
        assert_eq!(kind, SourceKind::Image);

        let cli = parse(&["https://cdn.example/large.mp4"]);
        assert_eq!(cli.validate_source().unwrap().1, SourceKind::Video);
    }

    #[test]
    fn explicit_kind_flags() {
        let cli = parse(&["--video", "capture.png"]);
        assert_eq!(
            cli.validate_source().unwrap(),
            ("capture.png".to_string(), SourceKind::Video)
        );
    }

    #[test]
    fn zero_or_two_sources_rejected() {
        assert!(parse(&[]).validate_source().is_err());
        assert!(parse(&["a.png", "--video", "b.mp4"]).validate_source().is_err());
    }

    #[test]
    fn overrides_reach_config() {
        let cli = parse(&["a.mp4", "--mode", "glyph", "--size", "40x10", "--no-color", "--fps", "12"]);
        let config = cli.playback_config("a.mp4".into(), Settings::default());
        assert_eq!(config.mode(), CellMode::ForegroundGlyph);
        assert!(!config.settings().color);
        assert_eq!(config.settings().fps_override, Some(12.0));
        assert_eq!(config.forced_grid(), Some(TargetGrid { cols: 40, rows: 10 }));
    }

    #[test]
    fn bad_size_is_a_parse_error() {
        assert!(Cli::try_parse_from(["termframe", "a.png", "--size", "40by10"]).is_err());
    }
}
