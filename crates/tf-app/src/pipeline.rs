use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tf_core::config::{PlaybackConfig, Settings};
use tf_core::frame::{RawFrame, ScaledFrame, TargetGrid};
use tf_core::traits::RasterSource;
use tf_render::compose::{self, FrameBuffer};
use tf_render::mapper::{CellGrid, ColorCellMapper};
use tf_render::screen::ScreenWriter;
use tf_source::SourceKind;
use tf_source::image::ImageSource;
use tf_source::resize::FrameScaler;

/// Capacité de rendu partagée par la vue image et la lecture vidéo.
///
/// resize → map colors → compose → paint. Each step is exposed on its own;
/// [`FramePipeline::render`] chains the first three so a failure never yields
/// a partial buffer.
pub struct FramePipeline {
    scaler: FrameScaler,
    mapper: ColorCellMapper,
}

impl FramePipeline {
    /// Pipeline for the session settings.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            scaler: FrameScaler::new(),
            mapper: ColorCellMapper::from_settings(settings),
        }
    }

    /// Resample to the grid.
    ///
    /// # Errors
    /// Propagates scaler failures.
    pub fn resize(&mut self, raw: &RawFrame, grid: TargetGrid) -> Result<ScaledFrame> {
        self.scaler.resize(raw, grid)
    }

    /// One cell per scaled pixel.
    #[must_use]
    pub fn map_colors(&self, scaled: &ScaledFrame) -> CellGrid {
        self.mapper.map(scaled)
    }

    /// Rows of cells into one buffer.
    #[must_use]
    pub fn compose(&self, cells: &CellGrid) -> FrameBuffer {
        compose::compose(cells)
    }

    /// Write a composed frame.
    ///
    /// # Errors
    /// Write failures are fatal and propagated.
    pub fn paint<W: Write>(&self, screen: &mut ScreenWriter<W>, buffer: &FrameBuffer) -> Result<()> {
        screen.paint(buffer).context("Écriture de la frame impossible")
    }

    /// Scale, map and compose one frame.
    ///
    /// # Errors
    /// Returns an error if scaling fails; nothing is composed in that case.
    pub fn render(&mut self, raw: &RawFrame, grid: TargetGrid) -> Result<FrameBuffer> {
        let scaled = self.resize(raw, grid)?;
        let cells = self.map_colors(&scaled);
        Ok(self.compose(&cells))
    }
}

/// Open the configured source. Failure here is fatal, before any rendering.
///
/// # Errors
/// Returns an error if the source cannot be opened or decoded.
pub fn open_source(config: &PlaybackConfig, kind: SourceKind) -> Result<Box<dyn RasterSource>> {
    let identifier = config.source();
    match kind {
        SourceKind::Image => {
            log::info!("Ouverture image : {identifier}");
            Ok(Box::new(ImageSource::open(Path::new(identifier))?))
        }
        #[cfg(feature = "video")]
        SourceKind::Video => {
            log::info!("Ouverture vidéo : {identifier}");
            let source = tf_source::video::VideoSource::open(
                identifier,
                config.settings().max_decode_width,
            )
            .with_context(|| format!("Impossible d'ouvrir {identifier}"))?;
            Ok(Box::new(source))
        }
        #[cfg(not(feature = "video"))]
        SourceKind::Video => {
            anyhow::bail!("Source vidéo {identifier} : recompiler avec --features video")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_core::frame::ChannelOrder;

    const RED: [u8; 3] = [0, 0, 255];
    const GREEN: [u8; 3] = [0, 255, 0];
    const BLUE: [u8; 3] = [255, 0, 0];
    const WHITE: [u8; 3] = [255, 255, 255];

    #[test]
    fn two_by_two_pure_colors_keep_positions() {
        // BGR, as a video decoder delivers it.
        let raw = RawFrame::from_rows(&[vec![RED, GREEN], vec![BLUE, WHITE]], ChannelOrder::Bgr)
            .unwrap();
        let mut pipeline = FramePipeline::new(&Settings::default());
        let buffer = pipeline.render(&raw, TargetGrid { cols: 2, rows: 2 }).unwrap();

        let lines: Vec<&str> = buffer.as_str().lines().collect();
        assert_eq!(
            lines,
            [
                "\x1b[48;2;255;0;0m \x1b[0m\x1b[48;2;0;255;0m \x1b[0m",
                "\x1b[48;2;0;0;255m \x1b[0m\x1b[48;2;255;255;255m \x1b[0m",
            ]
        );
        assert_eq!(buffer.rows(), 2);
    }

    #[test]
    fn paint_goes_through_screen() {
        let raw = RawFrame::from_rows(&[vec![WHITE]], ChannelOrder::Rgb).unwrap();
        let mut pipeline = FramePipeline::new(&Settings::default());
        let buffer = pipeline.render(&raw, TargetGrid { cols: 3, rows: 1 }).unwrap();
        let mut screen = ScreenWriter::new(Vec::new());
        pipeline.paint(&mut screen, &buffer).unwrap();
        assert_eq!(screen.into_inner(), buffer.as_bytes());
    }

    #[test]
    fn missing_image_fails_before_rendering() {
        let config = PlaybackConfig::new("/nonexistent/x.png", Settings::default(), None);
        assert!(open_source(&config, SourceKind::Image).is_err());
    }
}
