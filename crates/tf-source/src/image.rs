use std::path::Path;

use anyhow::{Context, Result};
use tf_core::frame::{ChannelOrder, RawFrame};
use tf_core::traits::{FrameRead, RasterSource};

/// Source d'image statique. Livre sa frame une fois, puis signale la fin.
///
/// # Example
/// ```no_run
/// use tf_source::image::ImageSource;
/// use std::path::Path;
/// let source = ImageSource::open(Path::new("photo.png")).unwrap();
/// ```
pub struct ImageSource {
    frame: Option<RawFrame>,
}

impl ImageSource {
    /// Load an image from disk and create a source.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or decoded.
    pub fn open(path: &Path) -> Result<Self> {
        let frame = load_image(path)?;
        let (w, h) = frame.dimensions();
        log::info!("Image chargée : {w}x{h} ({})", path.display());
        Ok(Self { frame: Some(frame) })
    }

    /// Wrap an already decoded frame.
    #[must_use]
    pub fn from_frame(frame: RawFrame) -> Self {
        Self { frame: Some(frame) }
    }
}

impl RasterSource for ImageSource {
    fn read_frame(&mut self) -> Result<FrameRead> {
        Ok(self.frame.take().map_or(FrameRead::EndOfStream, FrameRead::Frame))
    }

    fn native_frame_rate(&self) -> Option<f64> {
        None
    }
}

/// Decode an image file into an RGB [`RawFrame`].
///
/// # Errors
/// Returns an error if the image cannot be loaded.
pub fn load_image(path: &Path) -> Result<RawFrame> {
    let img = image::open(path)
        .with_context(|| format!("Impossible de charger {}", path.display()))?;
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    RawFrame::new(rgb.into_raw(), width, height, ChannelOrder::Rgb)
        .with_context(|| format!("Image vide : {}", path.display()))
}
