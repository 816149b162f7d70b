//! Waypoint cycling
//!
//! Holds one target at a time and moves on to the next waypoint once the
//! robot is within both the distance and the heading tolerance. Close to
//! the target the kinematic limits are de-rated so the robot slows into it.

use std::f64::consts::PI;

use log::info;

use crate::common::{KinematicLimits, NavError, NavResult, Pose2D, TrajectoryProvider};

/// Multipliers applied to the base limits near the target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproachDerating {
    pub accel: f64,
    pub linear: f64,
    pub angular: f64,
}

impl Default for ApproachDerating {
    fn default() -> Self {
        Self { accel: 0.5, linear: 0.3, angular: 0.8 }
    }
}

#[derive(Debug, Clone)]
pub struct WaypointTrajectory {
    waypoints: Vec<Pose2D>,
    /// Index of the current target in `waypoints`
    index: usize,
    target: Pose2D,
    /// Distance below which a waypoint counts as reached [m]
    pub distance_threshold: f64,
    /// Heading error below which a waypoint counts as reached [rad]
    pub angle_threshold: f64,
    pub derating: ApproachDerating,
    limits: KinematicLimits,
}

impl WaypointTrajectory {
    /// Cycle through `waypoints`, starting by holding `initial` as target
    pub fn new(
        initial: Pose2D,
        waypoints: Vec<Pose2D>,
        limits: KinematicLimits,
    ) -> NavResult<Self> {
        if waypoints.is_empty() {
            return Err(NavError::InvalidParameter(
                "waypoint trajectory needs at least one waypoint".to_string(),
            ));
        }
        limits.validate()?;
        Ok(Self {
            index: waypoints.len() - 1,
            waypoints,
            target: initial,
            distance_threshold: 0.2,
            angle_threshold: PI / 18.0,
            derating: ApproachDerating::default(),
            limits,
        })
    }

    pub fn default_waypoints() -> Vec<Pose2D> {
        vec![
            Pose2D::new(1.0, 0.5, PI * 3.0 / 4.0),
            Pose2D::new(0.5, 1.0, -PI),
            Pose2D::new(-0.5, 1.0, -PI / 2.0),
            Pose2D::new(-0.5, -1.0, 0.0),
            Pose2D::new(1.0, -1.0, PI / 2.0),
        ]
    }

    pub fn current_target(&self) -> &Pose2D {
        &self.target
    }

    fn is_near(&self, current: &Pose2D) -> bool {
        self.target.distance(current) < self.distance_threshold
    }

    fn is_reached(&self, current: &Pose2D) -> bool {
        self.is_near(current) && self.target.yaw_difference(current).abs() < self.angle_threshold
    }

    fn magnification(&self, current: &Pose2D, near: f64) -> f64 {
        if self.is_near(current) {
            near
        } else {
            1.0
        }
    }
}

impl TrajectoryProvider for WaypointTrajectory {
    fn target(&mut self, current: &Pose2D, _t: f64) -> Pose2D {
        if self.is_reached(current) {
            self.index = (self.index + 1) % self.waypoints.len();
            self.target = self.waypoints[self.index];
            info!(
                "waypoint reached, next target #{} ({:.2}, {:.2}, {:.2})",
                self.index, self.target.x, self.target.y, self.target.yaw
            );
        }
        self.target
    }

    fn base_limits(&self) -> &KinematicLimits {
        &self.limits
    }

    fn accel_limits(&self, current: &Pose2D) -> (f64, f64) {
        let m = self.magnification(current, self.derating.accel);
        (self.limits.max_linear_accel * m, self.limits.max_angular_accel * m)
    }

    fn velocity_limits(&self, current: &Pose2D) -> (f64, f64) {
        let m = self.magnification(current, self.derating.linear);
        (self.limits.max_v * m, self.limits.min_v * m)
    }

    fn angular_velocity_limits(&self, current: &Pose2D) -> (f64, f64) {
        let m = self.magnification(current, self.derating.angular);
        (self.limits.max_omega * m, self.limits.min_omega * m)
    }
}
