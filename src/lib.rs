//! landmark_nav - landmark-based localization and target tracking
//!
//! A unicycle robot localizes itself with an Extended Kalman Filter fed by
//! range/bearing sightings of known landmarks, while a Dynamic Window
//! Approach planner picks the velocities that drive it toward a moving
//! target pose.

// Core modules
pub mod common;
pub mod utils;
pub mod models;

// Algorithm modules
pub mod localization;
pub mod path_planning;
pub mod path_tracking;
pub mod trajectory;
pub mod simulation;

// Re-export common types for convenience
pub use common::{ControlInput, KinematicLimits, Landmark, Observation, Point2D, Pose2D};
pub use common::{InputPlanner, MotionModel, ObservationModel, TrajectoryProvider};
pub use common::{NavError, NavResult};
