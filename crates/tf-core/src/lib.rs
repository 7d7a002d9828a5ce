/// Types partagés, configuration et traits pour termframe.
///
/// This crate contains the frame and cell types, the session configuration
/// and the collaborator traits used across the termframe workspace.

pub mod cell;
pub mod charset;
pub mod config;
pub mod error;
pub mod frame;
pub mod traits;

pub use cell::{Cell, CellMode};
pub use config::{PlaybackConfig, Settings};
pub use error::CoreError;
pub use frame::{ChannelOrder, RawFrame, ScaledFrame, TargetGrid};
pub use traits::{FrameRead, GridProbe, RasterSource};
