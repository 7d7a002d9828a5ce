/// Terminal rendering for termframe.
///
/// Cell mapping, frame composition, screen output, terminal restoration,
/// frame pacing and FPS tracking.
pub mod compose;
pub mod fps;
pub mod mapper;
pub mod pacing;
pub mod screen;
