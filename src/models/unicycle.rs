//! Unicycle motion model
//!
//! Position is advanced along the heading at the middle of the interval,
//! `yaw + omega * dt / 2`, which tracks curved paths much better than a
//! plain Euler step.

use nalgebra::{Matrix3, Matrix3x2};

use crate::common::{ControlInput, MotionModel, Pose2D};

/// Heading at the midpoint of the control interval
fn midpoint_yaw(pose: &Pose2D, input: &ControlInput, dt: f64) -> f64 {
    pose.yaw + input.omega * dt / 2.0
}

/// Input matrix mapping (v, omega) to the pose increment over `dt`
pub fn input_matrix(yaw: f64, omega: f64, dt: f64) -> Matrix3x2<f64> {
    let mid = yaw + omega * dt / 2.0;
    Matrix3x2::new(
        mid.cos() * dt, 0.0,
        mid.sin() * dt, 0.0,
        0.0, dt,
    )
}

/// Predict the pose after applying `input` for `dt` seconds
pub fn predict_pose(pose: &Pose2D, input: &ControlInput, dt: f64) -> Pose2D {
    let mid = midpoint_yaw(pose, input, dt);
    Pose2D::new(
        pose.x + input.v * dt * mid.cos(),
        pose.y + input.v * dt * mid.sin(),
        pose.yaw + input.omega * dt,
    )
}

/// Jacobian of `predict_pose` with respect to (x, y, yaw)
pub fn motion_jacobian(pose: &Pose2D, input: &ControlInput, dt: f64) -> Matrix3<f64> {
    let mid = midpoint_yaw(pose, input, dt);
    let v = input.v;
    Matrix3::new(
        1.0, 0.0, -v * dt * mid.sin(),
        0.0, 1.0, v * dt * mid.cos(),
        0.0, 0.0, 1.0,
    )
}

/// Unicycle model as a `MotionModel`
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicycleModel;

impl MotionModel for UnicycleModel {
    fn propagate(&self, pose: &Pose2D, input: &ControlInput, dt: f64) -> Pose2D {
        predict_pose(pose, input, dt)
    }

    fn jacobian_state(&self, pose: &Pose2D, input: &ControlInput, dt: f64) -> Matrix3<f64> {
        motion_jacobian(pose, input, dt)
    }
}
