// Track map module
// Projects lap GPS traces into a unit square for plotting and locates lap
// positions on that projection

pub mod projector;
pub mod types;

// Re-export commonly used types
pub use projector::project_track_map;
pub use types::{BoundingBox, MapCoordinate, TrackMap};
