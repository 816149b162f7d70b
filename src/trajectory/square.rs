//! Square path with corners at (±half_side, ±half_side), driven counter-clockwise
//!
//! Starts at the middle of the right edge heading up, drives straight at
//! `v`, turns in place at `omega` on every corner and repeats.

use std::f64::consts::FRAC_PI_2;

use crate::common::error::ensure_finite;
use crate::common::{KinematicLimits, NavError, NavResult, Pose2D, TrajectoryProvider};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Segment {
    Straight(f64),
    Turn(f64),
}

#[derive(Debug, Clone)]
pub struct SquareTrajectory {
    /// Linear speed on the edges [m/s]
    pub v: f64,
    /// Turn rate on the corners [rad/s]
    pub omega: f64,
    pub half_side: f64,
    limits: KinematicLimits,
}

impl SquareTrajectory {
    /// Fails unless `v`, `omega` and `half_side` are positive and `limits` are valid
    pub fn new(v: f64, omega: f64, half_side: f64, limits: KinematicLimits) -> NavResult<Self> {
        for &(name, value) in &[("v", v), ("omega", omega), ("half_side", half_side)] {
            ensure_finite(name, value)?;
            if value <= 0.0 {
                return Err(NavError::InvalidParameter(format!(
                    "square trajectory {} must be positive, got {}",
                    name, value
                )));
            }
        }
        limits.validate()?;
        Ok(Self { v, omega, half_side, limits })
    }

    fn segments(&self) -> [Segment; 9] {
        let side = 2.0 * self.half_side;
        [
            Segment::Straight(self.half_side),
            Segment::Turn(FRAC_PI_2),
            Segment::Straight(side),
            Segment::Turn(FRAC_PI_2),
            Segment::Straight(side),
            Segment::Turn(FRAC_PI_2),
            Segment::Straight(side),
            Segment::Turn(FRAC_PI_2),
            Segment::Straight(self.half_side),
        ]
    }

    fn duration(&self, segment: Segment) -> f64 {
        match segment {
            Segment::Straight(length) => length / self.v,
            Segment::Turn(angle) => angle / self.omega,
        }
    }

    /// Time for one full lap [s]
    pub fn period(&self) -> f64 {
        self.segments().iter().map(|&s| self.duration(s)).sum()
    }

    /// Pose on the square at time `t`, wrapping every lap
    pub fn pose_at(&self, t: f64) -> Pose2D {
        let mut local = t.rem_euclid(self.period());
        let (mut x, mut y, mut yaw) = (self.half_side, 0.0, FRAC_PI_2);
        for segment in self.segments().iter() {
            let elapsed = local.min(self.duration(*segment));
            match *segment {
                Segment::Straight(_) => {
                    x += self.v * elapsed * yaw.cos();
                    y += self.v * elapsed * yaw.sin();
                }
                Segment::Turn(_) => yaw += self.omega * elapsed,
            }
            local -= elapsed;
            if local <= 0.0 {
                break;
            }
        }
        Pose2D::new(x, y, yaw)
    }
}

impl Default for SquareTrajectory {
    fn default() -> Self {
        Self {
            v: 0.2,
            omega: 0.2,
            half_side: 1.0,
            limits: KinematicLimits::default(),
        }
    }
}

impl TrajectoryProvider for SquareTrajectory {
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
    use std::f64::consts::PI;

    fn assert_pose_near(a: &Pose2D, b: &Pose2D) {
        assert!(a.distance(b) < 1e-9, "{:?} vs {:?}", a, b);
        assert!(a.yaw_difference(b).abs() < 1e-9, "{:?} vs {:?}", a, b);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let limits = KinematicLimits::default();
        assert!(matches!(
            SquareTrajectory::new(0.0, 0.2, 1.0, limits),
            Err(NavError::InvalidParameter(_))
        ));
        assert!(SquareTrajectory::new(0.2, -0.2, 1.0, limits).is_err());
        assert!(SquareTrajectory::new(0.2, 0.2, f64::INFINITY, limits).is_err());

        let inverted = KinematicLimits { min_omega: 0.6, ..limits };
        assert!(matches!(
            SquareTrajectory::new(0.2, 0.2, 1.0, inverted),
            Err(NavError::InvalidParameter(_))
        ));
        assert!(SquareTrajectory::new(0.2, 0.2, 1.0, limits).is_ok());
    }

    #[test]
    fn test_period() {
        let square = SquareTrajectory::default();
        let expected = 8.0 / 0.2 + 4.0 * (PI / 2.0) / 0.2;
        assert!((square.period() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_corners() {
        let square = SquareTrajectory::default();
        let turn = (PI / 2.0) / 0.2;
        assert_pose_near(&square.pose_at(0.0), &Pose2D::new(1.0, 0.0, PI / 2.0));
        assert_pose_near(&square.pose_at(5.0), &Pose2D::new(1.0, 1.0, PI / 2.0));
        assert_pose_near(&square.pose_at(5.0 + turn), &Pose2D::new(1.0, 1.0, PI));
        assert_pose_near(&square.pose_at(5.0 + turn + 5.0), &Pose2D::new(0.0, 1.0, PI));
        assert_pose_near(&square.pose_at(15.0 + 2.0 * turn), &Pose2D::new(-1.0, 1.0, -PI / 2.0));
        assert_pose_near(&square.pose_at(35.0 + 3.5 * turn), &Pose2D::new(1.0, -1.0, PI / 4.0));
    }

    #[test]
    fn test_wraps_every_lap() {
        let mut square = SquareTrajectory::default();
        let period = square.period();
        let a = square.target(&Pose2D::origin(), 3.3);
        let b = square.target(&Pose2D::origin(), 3.3 + 2.0 * period);
        assert_pose_near(&a, &b);
    }
}
