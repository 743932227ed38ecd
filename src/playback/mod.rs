pub mod controller;
pub mod frames;
pub mod window;

pub use controller::{PlaybackController, PlaybackEngine, PlaybackState, ReferenceLap};
pub use frames::{AlignedFrame, LapFrameValue, align_window};
pub use window::{VisibleWindow, VisibleWindowCache, compute_window};
