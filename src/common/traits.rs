//! Common traits defining the seams between models, filter, planner and providers

use nalgebra::{Matrix2x3, Matrix3, Vector2};

use crate::common::types::*;

/// Trait for vehicle/robot motion models
pub trait MotionModel {
    /// Propagate a pose forward in time under a constant input
    fn propagate(&self, pose: &Pose2D, input: &ControlInput, dt: f64) -> Pose2D;

    /// Jacobian of `propagate` with respect to the pose (for EKF)
    fn jacobian_state(&self, pose: &Pose2D, input: &ControlInput, dt: f64) -> Matrix3<f64>;
}

/// Trait for landmark observation models
pub trait ObservationModel {
    /// Predict the measurement of `landmark` seen from `pose`
    fn predict(&self, landmark: &Landmark, pose: &Pose2D) -> Vector2<f64>;

    /// Jacobian of `predict` with respect to the pose (for EKF)
    fn jacobian(&self, landmark: &Landmark, pose: &Pose2D) -> Matrix2x3<f64>;

    /// Whether the linearization at `pose` is unreliable
    fn is_degenerate(&self, _landmark: &Landmark, _pose: &Pose2D) -> bool {
        false
    }
}

/// Trait for algorithms that pick the next control input toward a target pose
pub trait InputPlanner {
    fn choose_input(
        &self,
        current: &Pose2D,
        target: &Pose2D,
        previous: &ControlInput,
        limits: &KinematicLimits,
        dt: f64,
    ) -> ControlInput;
}

/// Source of the target pose and of the kinematic limits applying at a pose.
pub trait TrajectoryProvider {
    /// Target pose for this tick, given the current estimate and elapsed time
    fn target(&mut self, current: &Pose2D, t: f64) -> Pose2D;

    /// Undisturbed robot limits the provider de-rates from
    fn base_limits(&self) -> &KinematicLimits;

    /// (max linear accel, max angular accel)
    fn accel_limits(&self, _current: &Pose2D) -> (f64, f64) {
        let base = self.base_limits();
        (base.max_linear_accel, base.max_angular_accel)
    }

    /// (max linear velocity, min linear velocity)
    fn velocity_limits(&self, _current: &Pose2D) -> (f64, f64) {
        let base = self.base_limits();
        (base.max_v, base.min_v)
    }

    /// (max angular velocity, min angular velocity)
    fn angular_velocity_limits(&self, _current: &Pose2D) -> (f64, f64) {
        let base = self.base_limits();
        (base.max_omega, base.min_omega)
    }

    /// All limits applying at `current`
    fn limits(&self, current: &Pose2D) -> KinematicLimits {
        let (max_linear_accel, max_angular_accel) = self.accel_limits(current);
        let (max_v, min_v) = self.velocity_limits(current);
        let (max_omega, min_omega) = self.angular_velocity_limits(current);
        KinematicLimits {
            max_linear_accel,
            max_angular_accel,
            max_v,
            min_v,
            max_omega,
            min_omega,
        }
    }
}
