//! Direct-input controller
//!
//! Solves the unicycle input equation `delta_pose = T(yaw, omega, dt) * u`
//! for `u` in the least-squares sense: the angular rate closes the heading
//! error in one interval and the linear velocity is the displacement
//! projected on the midpoint heading. The result is clamped into the
//! dynamic window so acceleration limits still hold.

use crate::common::{ControlInput, InputPlanner, KinematicLimits, Pose2D};
use crate::models::input_matrix;
use crate::path_planning::DynamicWindow;

/// Pseudo-inverse controller toward the target pose
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectInputController;

impl DirectInputController {
    pub fn new() -> Self {
        Self
    }

    /// Unclamped least-squares input reaching `target` in one interval
    pub fn raw_input(&self, current: &Pose2D, target: &Pose2D, dt: f64) -> ControlInput {
        if !(dt > 0.0) {
            return ControlInput::zero();
        }
        let omega = target.yaw_difference(current) / dt;
        let t = input_matrix(current.yaw, omega, dt);
        let mut delta = target.to_vector() - current.to_vector();
        delta[2] = target.yaw_difference(current);

        // columns of T are orthogonal with squared norm dt^2
        let u = t.transpose() * delta / (dt * dt);
        ControlInput::from(u)
    }
}

impl InputPlanner for DirectInputController {
    fn choose_input(
        &self,
        current: &Pose2D,
        target: &Pose2D,
        previous: &ControlInput,
        limits: &KinematicLimits,
        dt: f64,
    ) -> ControlInput {
        let raw = self.raw_input(current, target, dt);
        let window = DynamicWindow::new(previous, limits, dt);
        ControlInput::new(
            raw.v.max(window.v.min).min(window.v.max),
            raw.omega.max(window.omega.min).min(window.omega.max),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::predict_pose;
    use std::f64::consts::PI;

    #[test]
    fn test_raw_input_reaches_reachable_target() {
        let controller = DirectInputController::new();
        let current = Pose2D::new(0.0, 0.0, 0.2);
        let reachable = predict_pose(&current, &ControlInput::new(0.3, 0.4), 0.2);
        let u = controller.raw_input(&current, &reachable, 0.2);
        assert!((u.v - 0.3).abs() < 1e-9);
        assert!((u.omega - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_heading_error_is_wrapped() {
        let controller = DirectInputController::new();
        let current = Pose2D::new(0.0, 0.0, PI - 0.05);
        let target = Pose2D::new(0.0, 0.0, -PI + 0.05);
        let u = controller.raw_input(&current, &target, 0.2);
        assert!((u.omega - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_dt_gives_zero_input() {
        let controller = DirectInputController::new();
        let u = controller.raw_input(&Pose2D::origin(), &Pose2D::new(1.0, 0.0, 0.0), 0.0);
        assert_eq!(u, ControlInput::zero());
    }

    #[test]
    fn test_choose_input_respects_window() {
        let controller = DirectInputController::new();
        let limits = KinematicLimits::default();
        let previous = ControlInput::zero();
        let u = controller.choose_input(
            &Pose2D::origin(),
            &Pose2D::new(5.0, 0.0, 1.0),
            &previous,
            &limits,
            0.2,
        );
        assert!(DynamicWindow::new(&previous, &limits, 0.2).contains(&u));
        assert!((u.v - 0.2).abs() < 1e-12);
        assert!((u.omega - 0.2).abs() < 1e-12);
    }
}
