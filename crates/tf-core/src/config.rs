use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

use crate::cell::{CellMode, DEFAULT_GLYPH};
use crate::frame::TargetGrid;

/// Cadence retenue quand la source ne fournit pas de fps exploitable.
pub const FALLBACK_FPS: f64 = 30.0;

/// Bornes de cadence acceptées, pour la config comme pour la cadence sondée.
pub const MIN_FPS: f64 = 1.0;
/// See [`MIN_FPS`].
pub const MAX_FPS: f64 = 240.0;

/// Ramène une cadence exploitable dans `[MIN_FPS, MAX_FPS]`. `None` si non finie ou ≤ 0.
///
/// Containers such as MPEG-TS report time-base rates like `90000/1`.
///
/// # Example
/// ```
/// use tf_core::config::{MAX_FPS, clamp_fps};
/// assert_eq!(clamp_fps(90_000.0), Some(MAX_FPS));
/// assert_eq!(clamp_fps(25.0), Some(25.0));
/// assert_eq!(clamp_fps(0.0), None);
/// ```
#[must_use]
pub fn clamp_fps(fps: f64) -> Option<f64> {
    (fps.is_finite() && fps > 0.0).then(|| fps.clamp(MIN_FPS, MAX_FPS))
}

/// Réglages de session chargés depuis TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use tf_core::config::Settings;
/// let settings = Settings::default();
/// assert_eq!(settings.fallback_cols, 80);
/// assert!(settings.color);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    // === Rendu ===
    /// Cell mode.
    pub mode: CellMode,
    /// Couleur activée. `false` = niveaux de gris (luma).
    pub color: bool,
    /// Glyph for the foreground-glyph mode. Must occupy exactly one column.
    pub glyph: char,

    // === Lecture ===
    /// Fallback grid width when the terminal size is unknown.
    pub fallback_cols: u16,
    /// Fallback grid height when the terminal size is unknown.
    pub fallback_rows: u16,
    /// Rows left free below the image so the last row terminator does not scroll.
    pub row_headroom: u16,
    /// Replaces the probed video frame rate when set.
    pub fps_override: Option<f64>,
    /// ffmpeg decodes wider streams at this width (aspect preserved).
    pub max_decode_width: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: CellMode::Background,
            color: true,
            glyph: DEFAULT_GLYPH,
            fallback_cols: TargetGrid::FALLBACK.cols,
            fallback_rows: TargetGrid::FALLBACK.rows,
            row_headroom: 1,
            fps_override: None,
            max_decode_width: 640,
        }
    }
}

impl Settings {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.fallback_cols = self.fallback_cols.max(1);
        self.fallback_rows = self.fallback_rows.max(1);
        self.row_headroom = self.row_headroom.min(8);
        self.max_decode_width = self.max_decode_width.clamp(16, 7680);
        self.fps_override = self.fps_override.and_then(clamp_fps);
        // Une cellule par pixel : contrôle et pleine chasse refusés.
        if self.glyph.is_control() || self.glyph.width() != Some(1) {
            log::warn!("Glyph {:?} refusé (largeur ≠ 1), retour à '{DEFAULT_GLYPH}'", self.glyph);
            self.glyph = DEFAULT_GLYPH;
        }
    }

    /// Fallback grid built from the clamped fallback dimensions.
    #[must_use]
    pub fn fallback_grid(&self) -> TargetGrid {
        TargetGrid {
            cols: self.fallback_cols.max(1),
            rows: self.fallback_rows.max(1),
        }
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    render: Option<RenderSection>,
    playback: Option<PlaybackSection>,
}

/// Render section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct RenderSection {
    mode: Option<CellMode>,
    color: Option<bool>,
    glyph: Option<char>,
}

/// Playback section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct PlaybackSection {
    fallback_cols: Option<u16>,
    fallback_rows: Option<u16>,
    row_headroom: Option<u16>,
    fps_override: Option<f64>,
    max_decode_width: Option<u32>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use tf_core::config::load_settings;
/// use std::path::Path;
/// let settings = load_settings(Path::new("termframe.toml")).unwrap();
/// ```
pub fn load_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_settings(&content).with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))
}

/// Parse TOML text over the defaults. See [`load_settings`].
///
/// # Errors
/// Returns an error on invalid TOML or mistyped fields.
pub fn parse_settings(content: &str) -> Result<Settings> {
    let file: ConfigFile = toml::from_str(content)?;
    let mut settings = Settings::default();

    if let Some(r) = file.render {
        if let Some(v) = r.mode {
            settings.mode = v;
        }
        if let Some(v) = r.color {
            settings.color = v;
        }
        if let Some(v) = r.glyph {
            settings.glyph = v;
        }
    }

    if let Some(p) = file.playback {
        if let Some(v) = p.fallback_cols {
            settings.fallback_cols = v;
        }
        if let Some(v) = p.fallback_rows {
            settings.fallback_rows = v;
        }
        if let Some(v) = p.row_headroom {
            settings.row_headroom = v;
        }
        if p.fps_override.is_some() {
            settings.fps_override = p.fps_override;
        }
        if let Some(v) = p.max_decode_width {
            settings.max_decode_width = v;
        }
    }

    settings.clamp_all();
    Ok(settings)
}

/// Immutable per-session playback configuration.
///
/// Built once from [`Settings`] plus the CLI, read-only afterwards.
///
/// # Example
/// ```
/// use tf_core::config::{PlaybackConfig, Settings};
/// let config = PlaybackConfig::new("clip.mp4", Settings::default(), None);
/// assert_eq!(config.source(), "clip.mp4");
/// ```
#[derive(Clone, Debug)]
pub struct PlaybackConfig {
    source: String,
    settings: Settings,
    forced_grid: Option<TargetGrid>,
}

impl PlaybackConfig {
    /// Assemble the session config.
    #[must_use]
    pub fn new(source: impl Into<String>, settings: Settings, forced_grid: Option<TargetGrid>) -> Self {
        Self {
            source: source.into(),
            settings,
            forced_grid,
        }
    }

    /// Source identifier (path or URL).
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Session settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Cell mode.
    #[must_use]
    pub fn mode(&self) -> CellMode {
        self.settings.mode
    }

    /// Grid forced from the command line, if any.
    #[must_use]
    pub fn forced_grid(&self) -> Option<TargetGrid> {
        self.forced_grid
    }

    /// Grille cible à partir de la taille sondée.
    ///
    /// A forced grid is used as is. A probed size loses `row_headroom` rows
    /// (never below one row). No usable size gives the fallback grid.
    ///
    /// # Example
    /// ```
    /// use tf_core::config::{PlaybackConfig, Settings};
    /// use tf_core::frame::TargetGrid;
    /// let config = PlaybackConfig::new("a.png", Settings::default(), None);
    /// assert_eq!(config.resolve_grid(Some((100, 30))), TargetGrid { cols: 100, rows: 29 });
    /// assert_eq!(config.resolve_grid(None), TargetGrid::FALLBACK);
    /// ```
    #[must_use]
    pub fn resolve_grid(&self, probed: Option<(u16, u16)>) -> TargetGrid {
        if let Some(grid) = self.forced_grid {
            return grid;
        }
        match probed {
            Some((cols, rows)) if cols > 0 && rows > 0 => TargetGrid {
                cols,
                rows: rows.saturating_sub(self.settings.row_headroom).max(1),
            },
            _ => self.settings.fallback_grid(),
        }
    }
}
