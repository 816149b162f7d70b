//! Common types used throughout landmark_nav

use nalgebra::{Vector2, Vector3};

use crate::common::error::{ensure_finite, ensure_non_negative, NavError, NavResult};
use crate::utils::normalize_angle;

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

/// A known, static landmark. Identity is its position.
pub type Landmark = Point2D;

/// 2D pose (position + heading).
///
/// Every constructor keeps `yaw` in `(-pi, pi]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw: normalize_angle(yaw) }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, yaw: 0.0 }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.yaw)
    }

    /// Euclidean distance between the positions of two poses
    pub fn distance(&self, other: &Pose2D) -> f64 {
        self.position().distance(&other.position())
    }

    /// Heading difference `self.yaw - other.yaw`, normalized
    pub fn yaw_difference(&self, other: &Pose2D) -> f64 {
        normalize_angle(self.yaw - other.yaw)
    }

    /// Normalize yaw to (-pi, pi]
    pub fn normalize_yaw(&mut self) {
        self.yaw = normalize_angle(self.yaw);
    }
}

impl From<Vector3<f64>> for Pose2D {
    fn from(v: Vector3<f64>) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<(f64, f64, f64)> for Pose2D {
    fn from(t: (f64, f64, f64)) -> Self {
        Self::new(t.0, t.1, t.2)
    }
}

/// Control input for a unicycle robot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlInput {
    pub v: f64,      // linear velocity
    pub omega: f64,  // angular velocity
}

impl ControlInput {
    pub fn new(v: f64, omega: f64) -> Self {
        Self { v, omega }
    }

    pub fn zero() -> Self {
        Self { v: 0.0, omega: 0.0 }
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.v, self.omega)
    }
}

impl Default for ControlInput {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<Vector2<f64>> for ControlInput {
    fn from(v: Vector2<f64>) -> Self {
        Self { v: v[0], omega: v[1] }
    }
}

/// Acceleration and velocity bounds of the robot.
///
/// Queried fresh each tick; providers may de-rate them near the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicLimits {
    /// Max linear acceleration [m/s^2]
    pub max_linear_accel: f64,
    /// Max angular acceleration [rad/s^2]
    pub max_angular_accel: f64,
    /// Max linear velocity [m/s]
    pub max_v: f64,
    /// Min linear velocity [m/s]
    pub min_v: f64,
    /// Max angular velocity [rad/s]
    pub max_omega: f64,
    /// Min angular velocity [rad/s]
    pub min_omega: f64,
}

impl Default for KinematicLimits {
    fn default() -> Self {
        Self {
            max_linear_accel: 1.0,
            max_angular_accel: 1.0,
            max_v: 0.5,
            min_v: 0.0,
            max_omega: 0.5,
            min_omega: -0.5,
        }
    }
}

impl KinematicLimits {
    /// Create validated limits
    pub fn new(
        max_linear_accel: f64,
        max_angular_accel: f64,
        (max_v, min_v): (f64, f64),
        (max_omega, min_omega): (f64, f64),
    ) -> NavResult<Self> {
        let limits = Self {
            max_linear_accel,
            max_angular_accel,
            max_v,
            min_v,
            max_omega,
            min_omega,
        };
        limits.validate()?;
        Ok(limits)
    }

    pub fn validate(&self) -> NavResult<()> {
        ensure_non_negative("max_linear_accel", self.max_linear_accel)?;
        ensure_non_negative("max_angular_accel", self.max_angular_accel)?;
        ensure_finite("max_v", self.max_v)?;
        ensure_finite("min_v", self.min_v)?;
        ensure_finite("max_omega", self.max_omega)?;
        ensure_finite("min_omega", self.min_omega)?;
        if self.min_v > self.max_v {
            return Err(NavError::InvalidParameter(format!(
                "min_v ({}) exceeds max_v ({})",
                self.min_v, self.max_v
            )));
        }
        if self.min_omega > self.max_omega {
            return Err(NavError::InvalidParameter(format!(
                "min_omega ({}) exceeds max_omega ({})",
                self.min_omega, self.max_omega
            )));
        }
        Ok(())
    }

    /// Multiplicative de-rating of accelerations, linear and angular velocity bounds
    pub fn scaled(&self, accel: f64, linear: f64, angular: f64) -> Self {
        Self {
            max_linear_accel: self.max_linear_accel * accel,
            max_angular_accel: self.max_angular_accel * accel,
            max_v: self.max_v * linear,
            min_v: self.min_v * linear,
            max_omega: self.max_omega * angular,
            min_omega: self.min_omega * angular,
        }
    }

    /// Clamp an input into the hard velocity bounds
    pub fn clamp(&self, input: ControlInput) -> ControlInput {
        ControlInput::new(
            input.v.max(self.min_v).min(self.max_v),
            input.omega.max(self.min_omega).min(self.max_omega),
        )
    }
}

/// One landmark sighting: the landmark and the measured (range, bearing)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub landmark: Landmark,
    /// [range, bearing]
    pub measurement: Vector2<f64>,
}

impl Observation {
    pub fn new(landmark: Landmark, range: f64, bearing: f64) -> Self {
        Self {
            landmark,
            measurement: Vector2::new(range, bearing),
        }
    }

    pub fn range(&self) -> f64 {
        self.measurement[0]
    }

    pub fn bearing(&self) -> f64 {
        self.measurement[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_point2d_distance() {
        let p1 = Point2D::new(0.0, 0.0);
        let p2 = Point2D::new(3.0, 4.0);
        assert!((p1.distance(&p2) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_pose2d_normalizes_on_construction() {
        let pose = Pose2D::new(0.0, 0.0, 4.0);
        assert!(pose.yaw > -PI && pose.yaw <= PI);
        assert!((pose.yaw - (4.0 - 2.0 * PI)).abs() < 1e-12);

        let pose: Pose2D = Vector3::new(1.0, 2.0, -PI).into();
        assert_eq!(pose.yaw, PI);
    }

    #[test]
    fn test_pose2d_yaw_difference_wraps() {
        let a = Pose2D::new(0.0, 0.0, PI - 0.1);
        let b = Pose2D::new(0.0, 0.0, -PI + 0.1);
        assert!((a.yaw_difference(&b) + 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_default_limits_are_valid() {
        assert!(KinematicLimits::default().validate().is_ok());
    }

    #[test]
    fn test_limits_reject_inverted_bounds() {
        assert!(KinematicLimits::new(1.0, 1.0, (0.0, 0.5), (0.5, -0.5)).is_err());
        assert!(KinematicLimits::new(1.0, 1.0, (0.5, 0.0), (-0.5, 0.5)).is_err());
        assert!(KinematicLimits::new(-1.0, 1.0, (0.5, 0.0), (0.5, -0.5)).is_err());
        assert!(KinematicLimits::new(1.0, 1.0, (f64::NAN, 0.0), (0.5, -0.5)).is_err());
    }

    #[test]
    fn test_limits_scaled_and_clamp() {
        let limits = KinematicLimits::default().scaled(0.5, 0.3, 0.8);
        assert!((limits.max_linear_accel - 0.5).abs() < 1e-12);
        assert!((limits.max_v - 0.15).abs() < 1e-12);
        assert!((limits.min_omega + 0.4).abs() < 1e-12);

        let clamped = limits.clamp(ControlInput::new(1.0, -1.0));
        assert_eq!(clamped.v, limits.max_v);
        assert_eq!(clamped.omega, limits.min_omega);
    }

    #[test]
    fn test_observation_accessors() {
        let obs = Observation::new(Point2D::origin(), 1.5, -0.25);
        assert_eq!(obs.range(), 1.5);
        assert_eq!(obs.bearing(), -0.25);
    }
}
