//! Range/bearing observation model for point landmarks

use nalgebra::{Matrix2x3, Vector2};

use crate::common::{Landmark, ObservationModel, Pose2D};

/// Squared-distance floor used when the robot sits on a landmark
pub const MIN_RANGE_SQUARED: f64 = 1e-9;

/// Predict (range, bearing) of `landmark` seen from `pose`.
///
/// The bearing is `atan2(dy, dx) - yaw` and is intentionally left
/// unnormalized; callers wrap differences themselves.
pub fn predict_observation(landmark: &Landmark, pose: &Pose2D) -> Vector2<f64> {
    let dx = landmark.x - pose.x;
    let dy = landmark.y - pose.y;
    Vector2::new((dx * dx + dy * dy).sqrt(), dy.atan2(dx) - pose.yaw)
}

/// Jacobian of `predict_observation` with respect to (x, y, yaw).
///
/// `q = dx^2 + dy^2` is floored at `min_range_squared`, so the result stays
/// finite when the robot coincides with the landmark.
pub fn observation_jacobian_with_floor(
    landmark: &Landmark,
    pose: &Pose2D,
    min_range_squared: f64,
) -> Matrix2x3<f64> {
    let dx = landmark.x - pose.x;
    let dy = landmark.y - pose.y;
    let q = (dx * dx + dy * dy).max(min_range_squared);
    let sqrt_q = q.sqrt();
    Matrix2x3::new(
        -dx / sqrt_q, -dy / sqrt_q, 0.0,
        dy / q, -dx / q, -1.0,
    )
}

/// Jacobian of `predict_observation` using the default floor
pub fn observation_jacobian(landmark: &Landmark, pose: &Pose2D) -> Matrix2x3<f64> {
    observation_jacobian_with_floor(landmark, pose, MIN_RANGE_SQUARED)
}

/// Whether `pose` is close enough to `landmark` that the linearization is floored
pub fn is_degenerate(landmark: &Landmark, pose: &Pose2D, min_range_squared: f64) -> bool {
    let dx = landmark.x - pose.x;
    let dy = landmark.y - pose.y;
    dx * dx + dy * dy < min_range_squared
}

/// Range/bearing sensor as an `ObservationModel`
#[derive(Debug, Clone, Copy)]
pub struct RangeBearingModel {
    pub min_range_squared: f64,
}

impl RangeBearingModel {
    pub fn new(min_range_squared: f64) -> Self {
        Self { min_range_squared }
    }
}

impl Default for RangeBearingModel {
    fn default() -> Self {
        Self::new(MIN_RANGE_SQUARED)
    }
}

impl ObservationModel for RangeBearingModel {
    fn predict(&self, landmark: &Landmark, pose: &Pose2D) -> Vector2<f64> {
        predict_observation(landmark, pose)
    }

    fn jacobian(&self, landmark: &Landmark, pose: &Pose2D) -> Matrix2x3<f64> {
        observation_jacobian_with_floor(landmark, pose, self.min_range_squared)
    }

    fn is_degenerate(&self, landmark: &Landmark, pose: &Pose2D) -> bool {
        is_degenerate(landmark, pose, self.min_range_squared)
    }
}
