//! Extended Kalman Filter (EKF) localization against known landmarks
//!
//! The pose is predicted with the unicycle motion model and corrected once
//! per observed landmark. Corrections are sequential: each landmark's
//! posterior is the next landmark's prior, so no joint innovation matrix is
//! ever built.

use log::{debug, warn};
use nalgebra::{Matrix2, Matrix3, Matrix3x2};

use crate::common::{
    ControlInput, MotionModel, NavError, NavResult, Observation, ObservationModel, Pose2D,
};
use crate::models::{RangeBearingModel, UnicycleModel, MIN_RANGE_SQUARED};
use crate::utils::normalize_angle;

/// Configuration for EKF
#[derive(Debug, Clone)]
pub struct EKFConfig {
    /// Process noise covariance matrix (x, y, yaw)
    pub q: Matrix3<f64>,
    /// Measurement noise covariance matrix (range, bearing)
    pub r: Matrix2<f64>,
    /// Squared-distance floor for the observation Jacobian
    pub min_range_squared: f64,
}

impl Default for EKFConfig {
    fn default() -> Self {
        Self::from_scales(0.01, 0.04)
    }
}

impl EKFConfig {
    /// Diagonal noise: `Q = q * I3`, `R = r * I2`
    pub fn from_scales(q: f64, r: f64) -> Self {
        Self {
            q: Matrix3::identity() * q,
            r: Matrix2::identity() * r,
            min_range_squared: MIN_RANGE_SQUARED,
        }
    }

    pub fn validate(&self) -> NavResult<()> {
        if !self.q.iter().chain(self.r.iter()).all(|v| v.is_finite()) {
            return Err(NavError::InvalidParameter(
                "noise covariances must be finite".to_string(),
            ));
        }
        let q_asymmetry = (self.q - self.q.transpose()).amax();
        let r_asymmetry = (self.r - self.r.transpose()).amax();
        if q_asymmetry > 1e-12 || r_asymmetry > 1e-12 {
            return Err(NavError::InvalidParameter(
                "noise covariances must be symmetric".to_string(),
            ));
        }
        if self.q.symmetric_eigenvalues().iter().any(|&e| e < -1e-12) {
            return Err(NavError::InvalidParameter(
                "process noise Q must be positive semi-definite".to_string(),
            ));
        }
        if self.r.cholesky().is_none() {
            return Err(NavError::InvalidParameter(
                "measurement noise R must be positive definite".to_string(),
            ));
        }
        if !(self.min_range_squared > 0.0) || !self.min_range_squared.is_finite() {
            return Err(NavError::InvalidParameter(format!(
                "min_range_squared must be positive, got {}",
                self.min_range_squared
            )));
        }
        Ok(())
    }
}

/// Posterior of a single landmark correction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    pub estimate: Pose2D,
    pub covariance: Matrix3<f64>,
    pub gain: Matrix3x2<f64>,
    /// The observation Jacobian was floored at this landmark
    pub degraded: bool,
}

/// Result of one filter tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EKFStepOutput {
    pub estimate: Pose2D,
    pub covariance: Matrix3<f64>,
    /// Gain of the last applied correction, `None` on a dead-reckoning tick
    pub gain: Option<Matrix3x2<f64>>,
    /// Number of corrections applied
    pub corrections: usize,
    /// Number of corrections skipped on a numerical failure
    pub skipped: usize,
    /// At least one correction used a floored Jacobian
    pub degraded: bool,
}

impl EKFStepOutput {
    fn predicted(estimate: Pose2D, covariance: Matrix3<f64>) -> Self {
        Self {
            estimate,
            covariance,
            gain: None,
            corrections: 0,
            skipped: 0,
            degraded: false,
        }
    }
}

fn symmetrize(p: Matrix3<f64>) -> Matrix3<f64> {
    (p + p.transpose()) * 0.5
}

/// Extended Kalman Filter for landmark-based robot localization
pub struct EKFLocalizer<M = UnicycleModel, O = RangeBearingModel> {
    /// Current pose estimate
    estimate: Pose2D,
    /// Pose covariance matrix
    covariance: Matrix3<f64>,
    /// Gain of the most recent correction
    last_gain: Option<Matrix3x2<f64>>,
    /// Input applied on the previous tick
    previous_input: ControlInput,
    /// Accumulated tick time [s]
    elapsed: f64,
    degraded: bool,
    config: EKFConfig,
    motion: M,
    observation: O,
}

impl EKFLocalizer {
    /// Create a filter at `initial` with zero covariance
    pub fn new(initial: Pose2D, config: EKFConfig) -> NavResult<Self> {
        let observation = RangeBearingModel::new(config.min_range_squared);
        Self::with_models(initial, config, UnicycleModel, observation)
    }

    /// Create with default configuration
    pub fn with_defaults(initial: Pose2D) -> NavResult<Self> {
        Self::new(initial, EKFConfig::default())
    }
}

impl<M: MotionModel, O: ObservationModel> EKFLocalizer<M, O> {
    pub fn with_models(
        initial: Pose2D,
        config: EKFConfig,
        motion: M,
        observation: O,
    ) -> NavResult<Self> {
        config.validate()?;
        Ok(Self {
            estimate: initial,
            covariance: Matrix3::zeros(),
            last_gain: None,
            previous_input: ControlInput::zero(),
            elapsed: 0.0,
            degraded: false,
            config,
            motion,
            observation,
        })
    }

    /// Replace the initial covariance (before the first tick)
    pub fn with_initial_covariance(mut self, covariance: Matrix3<f64>) -> NavResult<Self> {
        if !covariance.iter().all(|v| v.is_finite())
            || covariance.symmetric_eigenvalues().iter().any(|&e| e < -1e-12)
        {
            return Err(NavError::InvalidParameter(
                "initial covariance must be finite and positive semi-definite".to_string(),
            ));
        }
        self.covariance = symmetrize(covariance);
        Ok(self)
    }

    pub fn estimate(&self) -> &Pose2D {
        &self.estimate
    }

    pub fn covariance(&self) -> &Matrix3<f64> {
        &self.covariance
    }

    pub fn last_gain(&self) -> Option<&Matrix3x2<f64>> {
        self.last_gain.as_ref()
    }

    pub fn previous_input(&self) -> &ControlInput {
        &self.previous_input
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Whether the last tick ran with a floored observation Jacobian
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn config(&self) -> &EKFConfig {
        &self.config
    }

    /// A-priori pose and covariance after applying `input` for `dt`
    pub fn predict(&self, input: &ControlInput, dt: f64) -> (Pose2D, Matrix3<f64>) {
        let x_pred = self.motion.propagate(&self.estimate, input, dt);
        let j_f = self.motion.jacobian_state(&self.estimate, input, dt);
        let p_pred = j_f * self.covariance * j_f.transpose() + self.config.q;
        (x_pred, symmetrize(p_pred))
    }

    /// Correct `prior` with a single landmark observation.
    ///
    /// Fails with `NumericalError` when the innovation covariance cannot be
    /// inverted or the correction is not finite.
    pub fn correct(
        &self,
        prior: &Pose2D,
        prior_covariance: &Matrix3<f64>,
        observation: &Observation,
    ) -> NavResult<Correction> {
        let landmark = &observation.landmark;
        let z_pred = self.observation.predict(landmark, prior);
        let mut y = observation.measurement - z_pred;
        y[1] = normalize_angle(y[1]);

        let degraded = self.observation.is_degenerate(landmark, prior);
        let j_h = self.observation.jacobian(landmark, prior);
        let s = j_h * prior_covariance * j_h.transpose() + self.config.r;

        let s_inv = s
            .try_inverse()
            .filter(|inv| inv.iter().all(|v| v.is_finite()))
            .ok_or_else(|| NavError::NumericalError("Failed to invert S matrix".to_string()))?;

        let k = prior_covariance * j_h.transpose() * s_inv;
        let dx = k * y;
        if !dx.iter().all(|v| v.is_finite()) {
            return Err(NavError::NumericalError("non-finite state correction".to_string()));
        }

        let covariance = symmetrize((Matrix3::identity() - k * j_h) * prior_covariance);
        Ok(Correction {
            estimate: Pose2D::new(prior.x + dx[0], prior.y + dx[1], prior.yaw + dx[2]),
            covariance,
            gain: k,
            degraded,
        })
    }

    /// Run one tick: predict with `input`, then correct once per observation in order.
    ///
    /// A correction that fails numerically is skipped and the previous
    /// posterior carries on to the next landmark. With no observations the
    /// prediction is the result.
    pub fn step(
        &mut self,
        observations: &[Observation],
        input: &ControlInput,
        dt: f64,
    ) -> EKFStepOutput {
        let (x_pred, p_pred) = self.predict(input, dt);

        let output = observations.iter().fold(
            EKFStepOutput::predicted(x_pred, p_pred),
            |acc, observation| match self.correct(&acc.estimate, &acc.covariance, observation) {
                Ok(c) => {
                    if c.degraded {
                        warn!(
                            "estimate coincides with landmark ({:.3}, {:.3}), jacobian floored",
                            observation.landmark.x, observation.landmark.y
                        );
                    }
                    EKFStepOutput {
                        estimate: c.estimate,
                        covariance: c.covariance,
                        gain: Some(c.gain),
                        corrections: acc.corrections + 1,
                        skipped: acc.skipped,
                        degraded: acc.degraded || c.degraded,
                    }
                }
                Err(e) => {
                    warn!(
                        "skipping correction for landmark ({:.3}, {:.3}): {}",
                        observation.landmark.x, observation.landmark.y, e
                    );
                    EKFStepOutput {
                        skipped: acc.skipped + 1,
                        ..acc
                    }
                }
            },
        );

        debug!(
            "ekf tick t={:.2}: estimate ({:.3}, {:.3}, {:.3}), trace(P)={:.5}, {} corrections",
            self.elapsed + dt,
            output.estimate.x,
            output.estimate.y,
            output.estimate.yaw,
            output.covariance.trace(),
            output.corrections
        );

        self.estimate = output.estimate;
        self.covariance = output.covariance;
        self.last_gain = output.gain;
        self.previous_input = *input;
        self.elapsed += dt;
        self.degraded = output.degraded;
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Point2D;
    use crate::models::predict_observation;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};
    use std::f64::consts::PI;

    fn landmarks() -> Vec<Point2D> {
        vec![
            Point2D::new(-1.5, 1.5),
            Point2D::new(1.5, 1.5),
            Point2D::new(1.5, -1.5),
            Point2D::new(-1.5, -1.5),
        ]
    }

    fn exact_observation(landmark: Point2D, truth: &Pose2D) -> Observation {
        let z = predict_observation(&landmark, truth);
        Observation::new(landmark, z[0], z[1])
    }

    fn pose_error(a: &Pose2D, b: &Pose2D) -> f64 {
        (a.distance(b).powi(2) + a.yaw_difference(b).powi(2)).sqrt()
    }

    #[test]
    fn test_ekf_creation() {
        let ekf = EKFLocalizer::with_defaults(Pose2D::new(1.0, 0.0, PI / 2.0)).unwrap();
        assert_eq!(*ekf.estimate(), Pose2D::new(1.0, 0.0, PI / 2.0));
        assert_eq!(*ekf.covariance(), Matrix3::zeros());
        assert!(ekf.last_gain().is_none());
        assert_eq!(ekf.elapsed(), 0.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EKFConfig::default();
        config.q[(1, 1)] = -0.1;
        assert!(EKFLocalizer::new(Pose2D::origin(), config).is_err());

        let config = EKFConfig::from_scales(0.01, 0.0);
        assert!(matches!(
            EKFLocalizer::new(Pose2D::origin(), config),
            Err(NavError::InvalidParameter(_))
        ));

        let mut config = EKFConfig::default();
        config.q[(0, 1)] = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dead_reckoning_tick_returns_prediction() {
        let mut ekf = EKFLocalizer::with_defaults(Pose2D::new(0.0, 0.0, 0.0)).unwrap();
        let input = ControlInput::new(0.5, 0.1);
        let (x_pred, p_pred) = ekf.predict(&input, 0.2);
        let out = ekf.step(&[], &input, 0.2);
        assert_eq!(out.estimate, x_pred);
        assert_eq!(out.covariance, p_pred);
        assert!(out.gain.is_none());
        assert_eq!(out.corrections, 0);
        assert_eq!(*ekf.previous_input(), input);
        assert!((ekf.elapsed() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_prediction_never_shrinks_covariance() {
        let mut ekf = EKFLocalizer::with_defaults(Pose2D::new(1.0, 0.0, PI / 2.0)).unwrap();
        let input = ControlInput::new(0.3, 0.0);
        let mut trace = ekf.covariance().trace();
        for _ in 0..100 {
            let out = ekf.step(&[], &input, 0.2);
            assert!(out.covariance.trace() >= trace);
            trace = out.covariance.trace();
        }
    }

    #[test]
    fn test_zero_input_scenario() {
        let truth = Pose2D::new(1.0, 0.0, PI / 2.0);
        let landmark = Point2D::new(0.0, 0.0);

        let ekf = EKFLocalizer::with_defaults(truth).unwrap();
        let (x_pred, _) = ekf.predict(&ControlInput::zero(), 0.2);
        assert!(pose_error(&x_pred, &truth) < 1e-12);

        // offset prior, exact observation
        let offset = Pose2D::new(1.1, 0.0, PI / 2.0);
        let mut ekf = EKFLocalizer::with_defaults(offset).unwrap();
        let (x_pred, _) = ekf.predict(&ControlInput::zero(), 0.2);
        let out = ekf.step(&[exact_observation(landmark, &truth)], &ControlInput::zero(), 0.2);
        assert!(pose_error(&out.estimate, &truth) < pose_error(&x_pred, &truth));
        assert!(out.gain.is_some());
        assert_eq!(out.corrections, 1);
    }

    #[test]
    fn test_correction_shrinks_covariance() {
        let ekf = EKFLocalizer::with_defaults(Pose2D::new(0.2, -0.1, 0.3)).unwrap();
        let (x_pred, p_pred) = ekf.predict(&ControlInput::new(0.2, 0.0), 0.2);
        let obs = exact_observation(Point2D::new(1.5, 1.5), &Pose2D::new(0.25, -0.1, 0.3));
        let c = ekf.correct(&x_pred, &p_pred, &obs).unwrap();
        assert!(c.covariance.trace() < p_pred.trace());
        assert!((c.covariance - c.covariance.transpose()).amax() == 0.0);
        assert!(!c.degraded);
    }

    #[test]
    fn test_bearing_innovation_wraps() {
        // true bearing just above -pi, predicted just below pi: the
        // innovation is small and the heading must barely move
        let truth = Pose2D::new(0.0, 0.0, 0.0);
        let landmark = Point2D::new(-1.0, -0.01);
        let mut ekf = EKFLocalizer::with_defaults(Pose2D::new(0.0, -0.02, 0.0)).unwrap();
        let out = ekf.step(&[exact_observation(landmark, &truth)], &ControlInput::zero(), 0.2);
        assert!(out.estimate.yaw.abs() < 0.05);
    }

    #[test]
    fn test_sequential_corrections_use_each_landmark() {
        let truth = Pose2D::new(0.0, 0.0, 0.0);
        let observations: Vec<Observation> =
            landmarks().into_iter().map(|l| exact_observation(l, &truth)).collect();
        let mut ekf = EKFLocalizer::with_defaults(Pose2D::new(0.1, 0.1, 0.05)).unwrap();

        let (mut x, mut p) = ekf.predict(&ControlInput::zero(), 0.2);
        let mut gain = None;
        for obs in &observations {
            let c = ekf.correct(&x, &p, obs).unwrap();
            x = c.estimate;
            p = c.covariance;
            gain = Some(c.gain);
        }

        let out = ekf.step(&observations, &ControlInput::zero(), 0.2);
        assert_eq!(out.corrections, 4);
        assert_eq!(out.estimate, x);
        assert_eq!(out.covariance, p);
        assert_eq!(out.gain, gain);
    }

    #[test]
    fn test_coincident_landmark_is_degraded_not_fatal() {
        let mut ekf = EKFLocalizer::with_defaults(Pose2D::new(0.5, 0.5, 0.0)).unwrap();
        let obs = Observation::new(Point2D::new(0.5, 0.5), 0.01, 0.0);
        let out = ekf.step(&[obs], &ControlInput::zero(), 0.2);
        assert!(out.degraded);
        assert!(ekf.is_degraded());
        assert!(out.estimate.to_vector().iter().all(|v| v.is_finite()));
        assert!(out.covariance.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_non_finite_observation_is_skipped() {
        let mut ekf = EKFLocalizer::with_defaults(Pose2D::new(0.0, 0.0, 0.0)).unwrap();
        let (x_pred, p_pred) = ekf.predict(&ControlInput::zero(), 0.2);
        let bad = Observation::new(Point2D::new(1.0, 0.0), f64::NAN, 0.0);
        let out = ekf.step(&[bad], &ControlInput::zero(), 0.2);
        assert_eq!(out.skipped, 1);
        assert_eq!(out.corrections, 0);
        assert_eq!(out.estimate, x_pred);
        assert_eq!(out.covariance, p_pred);
    }

    #[test]
    fn test_filter_converges() {
        let truth = Pose2D::new(0.3, -0.2, 0.4);
        let config = EKFConfig::from_scales(0.0, 0.04);
        let mut ekf = EKFLocalizer::new(Pose2D::new(0.5, -0.05, 0.25), config)
            .unwrap()
            .with_initial_covariance(Matrix3::identity() * 0.1)
            .unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let range_noise = Normal::new(0.0, 0.05).unwrap();
        let bearing_noise = Normal::new(0.0, 0.04).unwrap();

        let mut trace = ekf.covariance().trace();
        for _ in 0..50 {
            let observations: Vec<Observation> = landmarks()
                .into_iter()
                .map(|l| {
                    let z = predict_observation(&l, &truth);
                    Observation::new(
                        l,
                        z[0] + range_noise.sample(&mut rng),
                        z[1] + bearing_noise.sample(&mut rng),
                    )
                })
                .collect();
            let out = ekf.step(&observations, &ControlInput::zero(), 0.2);
            assert!(out.covariance.trace() <= trace + 1e-12);
            trace = out.covariance.trace();
        }

        let estimate = ekf.estimate();
        assert!(estimate.distance(&truth) < 0.05, "position error {}", estimate.distance(&truth));
        assert!(estimate.yaw_difference(&truth).abs() < 0.05);
    }
}
