//! Utility modules for landmark_nav

pub mod angle;
pub mod visualization;

pub use angle::{normalize_angle, normalize_min_max};
pub use visualization::{sighting_endpoint, Visualizer, PathStyle, PointStyle, colors};
