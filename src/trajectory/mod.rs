//! Target pose providers
//!
//! Each provider answers, once per tick, where the robot should be heading
//! and which kinematic limits apply at the current estimate.

pub mod circular;
pub mod square;
pub mod waypoints;

pub use circular::CircularTrajectory;
pub use square::SquareTrajectory;
pub use waypoints::{ApproachDerating, WaypointTrajectory};
