//! Closed-loop tick runner
//!
//! One tick: target from the provider, limits at the estimate, input from
//! the planner, ground truth advanced and observed, filter stepped. Ticks
//! run strictly one after another.

use std::f64::consts::FRAC_PI_2;

use log::debug;
use nalgebra::{Matrix3, Matrix3x2};

use crate::common::{
    ControlInput, InputPlanner, Landmark, NavError, NavResult, Observation, Point2D, Pose2D,
    TrajectoryProvider,
};
use crate::localization::{EKFConfig, EKFLocalizer};
use crate::simulation::noise::{NoiseConfig, NoisySimulator};

/// Fixed run parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Tick length [s]
    pub dt: f64,
    pub initial_pose: Pose2D,
    pub landmarks: Vec<Landmark>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 0.2,
            initial_pose: Pose2D::new(1.0, 0.0, FRAC_PI_2),
            landmarks: default_landmarks(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> NavResult<()> {
        if !(self.dt > 0.0) || !self.dt.is_finite() {
            return Err(NavError::InvalidParameter(format!("dt must be positive, got {}", self.dt)));
        }
        let p = &self.initial_pose;
        if !(p.x.is_finite() && p.y.is_finite() && p.yaw.is_finite()) {
            return Err(NavError::InvalidParameter("initial pose must be finite".to_string()));
        }
        if self.landmarks.iter().any(|l| !(l.x.is_finite() && l.y.is_finite())) {
            return Err(NavError::InvalidParameter("landmarks must be finite".to_string()));
        }
        Ok(())
    }
}

/// Landmarks on the corners of a 3 m square around the origin
pub fn default_landmarks() -> Vec<Landmark> {
    vec![
        Point2D::new(-1.5, 1.5),
        Point2D::new(1.5, 1.5),
        Point2D::new(1.5, -1.5),
        Point2D::new(-1.5, -1.5),
    ]
}

/// Everything produced by one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickRecord {
    /// Elapsed time at the end of the tick [s]
    pub time: f64,
    pub target: Pose2D,
    pub truth: Pose2D,
    pub estimate: Pose2D,
    pub covariance: Matrix3<f64>,
    pub gain: Option<Matrix3x2<f64>>,
    pub input: ControlInput,
    pub observations: Vec<Observation>,
    pub degraded: bool,
}

impl TickRecord {
    /// Position error of the estimate against ground truth
    pub fn estimation_error(&self) -> f64 {
        self.estimate.distance(&self.truth)
    }

    /// Distance from ground truth to the target
    pub fn tracking_error(&self) -> f64 {
        self.truth.distance(&self.target)
    }
}

fn rms<I: Iterator<Item = f64>>(values: I) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v * v, n + 1));
    if n == 0 {
        0.0
    } else {
        (sum / n as f64).sqrt()
    }
}

/// Aggregate statistics of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub ticks: usize,
    pub final_estimation_error: f64,
    pub rms_estimation_error: f64,
    pub rms_tracking_error: f64,
    pub max_covariance_trace: f64,
    pub degraded_ticks: usize,
}

impl RunSummary {
    pub fn from_history(history: &[TickRecord]) -> Option<Self> {
        let last = history.last()?;
        Some(Self {
            ticks: history.len(),
            final_estimation_error: last.estimation_error(),
            rms_estimation_error: rms(history.iter().map(TickRecord::estimation_error)),
            rms_tracking_error: rms(history.iter().map(TickRecord::tracking_error)),
            max_covariance_trace: history.iter().map(|r| r.covariance.trace()).fold(0.0, f64::max),
            degraded_ticks: history.iter().filter(|r| r.degraded).count(),
        })
    }
}

/// Drives provider, planner, simulator and filter together
pub struct Simulation<P, C> {
    provider: P,
    planner: C,
    ekf: EKFLocalizer,
    simulator: NoisySimulator,
    landmarks: Vec<Landmark>,
    dt: f64,
    history: Vec<TickRecord>,
}

impl<P: TrajectoryProvider, C: InputPlanner> Simulation<P, C> {
    pub fn new(
        config: SimulationConfig,
        provider: P,
        planner: C,
        ekf_config: EKFConfig,
        noise: NoiseConfig,
    ) -> NavResult<Self> {
        config.validate()?;
        provider.base_limits().validate()?;
        Ok(Self {
            provider,
            planner,
            ekf: EKFLocalizer::new(config.initial_pose, ekf_config)?,
            simulator: NoisySimulator::new(config.initial_pose, noise)?,
            landmarks: config.landmarks,
            dt: config.dt,
            history: Vec::new(),
        })
    }

    /// Run one full tick and record it
    pub fn tick(&mut self) -> &TickRecord {
        let time = self.ekf.elapsed() + self.dt;
        let estimate = *self.ekf.estimate();

        let target = self.provider.target(&estimate, time);
        let limits = self.provider.limits(&estimate);
        let input = self
            .planner
            .choose_input(&estimate, &target, self.ekf.previous_input(), &limits, self.dt);

        let truth = self.simulator.advance(&input, self.dt);
        let observations = self.simulator.observe(&self.landmarks);
        let output = self.ekf.step(&observations, &input, self.dt);

        debug!(
            "tick t={:.2}: input ({:.3}, {:.3}), truth ({:.3}, {:.3}), estimate ({:.3}, {:.3})",
            time, input.v, input.omega, truth.x, truth.y, output.estimate.x, output.estimate.y
        );

        self.history.push(TickRecord {
            time,
            target,
            truth,
            estimate: output.estimate,
            covariance: output.covariance,
            gain: output.gain,
            input,
            observations,
            degraded: output.degraded,
        });
        &self.history[self.history.len() - 1]
    }

    /// Run `ticks` ticks and return the full history
    pub fn run(&mut self, ticks: usize) -> &[TickRecord] {
        for _ in 0..ticks {
            self.tick();
        }
        &self.history
    }

    pub fn history(&self) -> &[TickRecord] {
        &self.history
    }

    pub fn summary(&self) -> Option<RunSummary> {
        RunSummary::from_history(&self.history)
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn ekf(&self) -> &EKFLocalizer {
        &self.ekf
    }

    pub fn truth(&self) -> &Pose2D {
        self.simulator.truth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_planning::DWAPlanner;
    use crate::path_tracking::DirectInputController;
    use crate::trajectory::{CircularTrajectory, SquareTrajectory, WaypointTrajectory};
    use crate::common::KinematicLimits;

    /// Holds a fixed target under whatever limits it is given
    struct Stationary {
        target: Pose2D,
        limits: KinematicLimits,
    }

    impl TrajectoryProvider for Stationary {
        fn target(&mut self, _current: &Pose2D, _t: f64) -> Pose2D {
            self.target
        }

        fn base_limits(&self) -> &KinematicLimits {
            &self.limits
        }
    }

    fn circular_dwa(seed: u64) -> Simulation<CircularTrajectory, DWAPlanner> {
        Simulation::new(
            SimulationConfig::default(),
            CircularTrajectory::default(),
            DWAPlanner::with_defaults(),
            EKFConfig::default(),
            NoiseConfig { seed, ..NoiseConfig::default() },
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_dt_rejected() {
        let config = SimulationConfig { dt: 0.0, ..SimulationConfig::default() };
        let sim = Simulation::new(
            config,
            CircularTrajectory::default(),
            DWAPlanner::with_defaults(),
            EKFConfig::default(),
            NoiseConfig::default(),
        );
        assert!(sim.is_err());
    }

    #[test]
    fn test_malformed_provider_limits_rejected() {
        let provider = Stationary {
            target: Pose2D::origin(),
            limits: KinematicLimits { min_v: 0.5, max_v: 0.0, ..KinematicLimits::default() },
        };
        let sim = Simulation::new(
            SimulationConfig::default(),
            provider,
            DWAPlanner::with_defaults(),
            EKFConfig::default(),
            NoiseConfig::default(),
        );
        assert!(matches!(sim, Err(NavError::InvalidParameter(_))));
    }

    #[test]
    fn test_tick_records_everything() {
        let mut sim = circular_dwa(1);
        let record = sim.tick().clone();
        assert!((record.time - 0.2).abs() < 1e-12);
        assert_eq!(record.observations.len(), 4);
        assert!(record.gain.is_some());
        assert_eq!(record.estimate, *sim.ekf().estimate());
        assert_eq!(record.truth, *sim.truth());
        assert_eq!(sim.history().len(), 1);
    }

    #[test]
    fn test_circular_run_keeps_estimate_on_truth() {
        let mut sim = circular_dwa(5);
        let history = sim.run(300);
        assert_eq!(history.len(), 300);
        for record in &history[10..] {
            let error = record.estimation_error();
            assert!(error < 0.3, "t={} error {}", record.time, error);
            assert!(record.covariance.iter().all(|v| v.is_finite()));
        }
        let summary = sim.summary().unwrap();
        assert_eq!(summary.ticks, 300);
        assert!(summary.rms_estimation_error < 0.1);
        assert!(summary.rms_tracking_error < 0.5);
    }

    #[test]
    fn test_runs_are_reproducible() {
        let mut a = circular_dwa(9);
        let mut b = circular_dwa(9);
        assert_eq!(a.run(50), b.run(50));
    }

    #[test]
    fn test_direct_controller_on_square() {
        let mut sim = Simulation::new(
            SimulationConfig::default(),
            SquareTrajectory::default(),
            DirectInputController::new(),
            EKFConfig::default(),
            NoiseConfig::default(),
        )
        .unwrap();
        sim.run(200);
        let summary = sim.summary().unwrap();
        assert!(summary.rms_estimation_error < 0.1);
        assert_eq!(summary.degraded_ticks, 0);
    }

    #[test]
    fn test_waypoints_run_stays_finite() {
        let config = SimulationConfig::default();
        let provider = WaypointTrajectory::new(
            config.initial_pose,
            WaypointTrajectory::default_waypoints(),
            KinematicLimits::default(),
        )
        .unwrap();
        let mut sim = Simulation::new(
            config,
            provider,
            DWAPlanner::with_defaults(),
            EKFConfig::default(),
            NoiseConfig::default(),
        )
        .unwrap();
        for record in sim.run(200) {
            assert!(record.estimate.x.is_finite() && record.estimate.y.is_finite());
            assert!(record.input.v >= 0.0 && record.input.v <= 0.5);
        }
        assert_ne!(*sim.provider().current_target(), SimulationConfig::default().initial_pose);
    }

    #[test]
    fn test_summary_of_empty_history() {
        assert!(RunSummary::from_history(&[]).is_none());
    }
}
