use anyhow::{Context, Result};
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer as FirResizer};
use tf_core::frame::{RawFrame, ScaledFrame, TargetGrid};

/// Rééchantillonne une frame brute vers la grille terminal (un pixel par cellule).
///
/// Wraps fast_image_resize with a bilinear convolution. Channel order is
/// carried through unchanged.
///
/// # Example
/// ```
/// use tf_core::frame::{ChannelOrder, RawFrame, TargetGrid};
/// use tf_source::resize::FrameScaler;
/// let mut scaler = FrameScaler::new();
/// let raw = RawFrame::new(vec![128; 100 * 50 * 3], 100, 50, ChannelOrder::Bgr).unwrap();
/// let scaled = scaler.resize(&raw, TargetGrid { cols: 20, rows: 10 }).unwrap();
/// assert_eq!((scaled.cols(), scaled.rows()), (20, 10));
/// ```
pub struct FrameScaler {
    inner: FirResizer,
    options: ResizeOptions,
    /// Scratch copy of the source (fast_image_resize wants `&mut` on it).
    src_buf: Vec<u8>,
}

impl FrameScaler {
    /// Create a new scaler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
            src_buf: Vec::new(),
        }
    }

    /// Resize `raw` to exactly `target`.
    ///
    /// # Errors
    /// Returns an error for a zero-sized target or if the resize fails. No
    /// partial frame is ever returned.
    pub fn resize(&mut self, raw: &RawFrame, target: TargetGrid) -> Result<ScaledFrame> {
        let target = TargetGrid::new(target.cols, target.rows)?;
        let (src_w, src_h) = raw.dimensions();
        let (dst_w, dst_h) = (u32::from(target.cols), u32::from(target.rows));

        if (src_w, src_h) == (dst_w, dst_h) {
            return Ok(ScaledFrame::new(raw.data().to_vec(), target, raw.order())?);
        }

        self.src_buf.clear();
        self.src_buf.extend_from_slice(raw.data());
        let src_image = Image::from_slice_u8(src_w, src_h, &mut self.src_buf, PixelType::U8x3)
            .context("Dimensions source invalides")?;

        let mut out = vec![0u8; target.area() * 3];
        let mut dst_image = Image::from_slice_u8(dst_w, dst_h, &mut out, PixelType::U8x3)
            .context("Dimensions destination invalides")?;

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .context("Resize failed")?;

        Ok(ScaledFrame::new(out, target, raw.order())?)
    }
}

impl Default for FrameScaler {
    fn default() -> Self {
        Self::new()
    }
}
