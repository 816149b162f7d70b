//! Unit circle around the origin traversed at a constant angular rate

use crate::common::error::ensure_finite;
use crate::common::{KinematicLimits, NavResult, Pose2D, TrajectoryProvider};

#[derive(Debug, Clone)]
pub struct CircularTrajectory {
    /// Angular rate along the circle [rad/s]
    pub omega: f64,
    /// Circle radius [m]
    pub radius: f64,
    limits: KinematicLimits,
}

impl CircularTrajectory {
    pub fn new(omega: f64, radius: f64, limits: KinematicLimits) -> NavResult<Self> {
        ensure_finite("omega", omega)?;
        ensure_finite("radius", radius)?;
        limits.validate()?;
        Ok(Self { omega, radius, limits })
    }

    /// Pose on the circle at time `t`, heading tangent to the circle
    pub fn pose_at(&self, t: f64) -> Pose2D {
        let phase = self.omega * t;
        Pose2D::new(
            self.radius * phase.cos(),
            self.radius * phase.sin(),
            std::f64::consts::FRAC_PI_2 + phase,
        )
    }
}

impl Default for CircularTrajectory {
    fn default() -> Self {
        Self {
            omega: 0.2,
            radius: 1.0,
            limits: KinematicLimits::default(),
        }
    }
}

impl TrajectoryProvider for CircularTrajectory {
    fn target(&mut self, _current: &Pose2D, t: f64) -> Pose2D {
        self.pose_at(t)
    }

    fn base_limits(&self) -> &KinematicLimits {
        &self.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::NavError;
    use std::f64::consts::PI;

    #[test]
    fn test_malformed_limits_rejected() {
        let limits = KinematicLimits { min_v: 0.5, max_v: 0.0, ..KinematicLimits::default() };
        assert!(matches!(
            CircularTrajectory::new(0.2, 1.0, limits),
            Err(NavError::InvalidParameter(_))
        ));
        assert!(CircularTrajectory::new(f64::NAN, 1.0, KinematicLimits::default()).is_err());
        assert!(CircularTrajectory::new(0.2, 1.0, KinematicLimits::default()).is_ok());
    }

    #[test]
    fn test_starts_at_initial_pose() {
        let mut trajectory = CircularTrajectory::default();
        let target = trajectory.target(&Pose2D::origin(), 0.0);
        assert_eq!(target, Pose2D::new(1.0, 0.0, PI / 2.0));
    }

    #[test]
    fn test_quarter_turn() {
        let trajectory = CircularTrajectory::default();
        let pose = trajectory.pose_at(PI / 2.0 / 0.2);
        assert!(pose.x.abs() < 1e-12);
        assert!((pose.y - 1.0).abs() < 1e-12);
        assert!((pose.yaw.abs() - PI).abs() < 1e-12);
    }

    #[test]
    fn test_heading_stays_normalized() {
        let trajectory = CircularTrajectory::default();
        for i in 0..1000 {
            let yaw = trajectory.pose_at(i as f64 * 0.37).yaw;
            assert!(yaw > -PI && yaw <= PI);
        }
    }
}
