use crate::frame::{RawFrame, TargetGrid};

/// Outcome of one read on a [`RasterSource`].
#[derive(Debug)]
pub enum FrameRead {
    /// A decoded frame.
    Frame(RawFrame),
    /// Pas de frame cette itération (trou de décodage transitoire). Non fatal.
    Gap,
    /// Source épuisée : fin normale de lecture.
    EndOfStream,
}

/// Fournit des frames brutes au pipeline.
///
/// Implémenté par : `ImageSource`, `VideoSource`.
///
/// # Example
/// ```
/// use tf_core::traits::{FrameRead, RasterSource};
///
/// struct Empty;
/// impl RasterSource for Empty {
///     fn read_frame(&mut self) -> anyhow::Result<FrameRead> { Ok(FrameRead::EndOfStream) }
///     fn native_frame_rate(&self) -> Option<f64> { None }
/// }
/// let mut s = Empty;
/// assert!(matches!(s.read_frame().unwrap(), FrameRead::EndOfStream));
/// ```
pub trait RasterSource {
    /// Read the next frame.
    ///
    /// # Errors
    /// Only unrecoverable decoder I/O failures are errors; missing data for one
    /// iteration is [`FrameRead::Gap`].
    fn read_frame(&mut self) -> anyhow::Result<FrameRead>;

    /// Native frame rate in frames per second. `None` for still images.
    fn native_frame_rate(&self) -> Option<f64>;

    /// Release decoder resources. Called once when playback closes.
    fn close(&mut self) {}
}

/// Interroge la taille courante du terminal.
pub trait GridProbe {
    /// Current size as (columns, rows), or `None` when unavailable
    /// (non-interactive output, query failure).
    fn current_size(&self) -> Option<(u16, u16)>;
}

/// Probe returning a fixed size. Stands in for the terminal in tests;
/// `--size` bypasses probing through [`crate::config::PlaybackConfig::forced_grid`].
///
/// # Example
/// ```
/// use tf_core::frame::TargetGrid;
/// use tf_core::traits::{FixedGrid, GridProbe};
/// let probe = FixedGrid(TargetGrid { cols: 4, rows: 2 });
/// assert_eq!(probe.current_size(), Some((4, 2)));
/// ```
pub struct FixedGrid(pub TargetGrid);

impl GridProbe for FixedGrid {
    fn current_size(&self) -> Option<(u16, u16)> {
        Some((self.0.cols, self.0.rows))
    }
}
