//! Dynamic Window Approach without obstacles
//!
//! Searches the velocities reachable within one control interval, forward
//! simulates each candidate for one step and picks the one minimizing a
//! weighted sum of min-max normalized costs toward a moving target pose.

use itertools::Itertools;
use log::debug;
use ordered_float::OrderedFloat;

use crate::common::error::{ensure_finite, ensure_non_negative};
use crate::common::{
    ControlInput, InputPlanner, KinematicLimits, MotionModel, NavError, NavResult, Pose2D,
};
use crate::models::UnicycleModel;
use crate::utils::{normalize_angle, normalize_min_max};

/// Weights of the four normalized costs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DWAGains {
    /// Angle between the direction to the target and the candidate heading
    pub heading: f64,
    /// Shortfall from the max linear velocity
    pub velocity: f64,
    /// Distance from the candidate pose to the target
    pub distance: f64,
    /// Difference between candidate and target headings
    pub theta: f64,
}

impl DWAGains {
    pub fn new(heading: f64, velocity: f64, distance: f64, theta: f64) -> Self {
        Self { heading, velocity, distance, theta }
    }

    /// Profile used while far from the target
    pub fn far() -> Self {
        Self::new(1.0, 0.01, 0.8, 0.1)
    }

    /// Profile used on final approach: heading alignment dominates
    pub fn near() -> Self {
        Self::new(0.01, 0.01, 0.8, 1.0)
    }

    fn validate(&self, name: &str) -> NavResult<()> {
        ensure_non_negative(&format!("{}.heading", name), self.heading)?;
        ensure_non_negative(&format!("{}.velocity", name), self.velocity)?;
        ensure_non_negative(&format!("{}.distance", name), self.distance)?;
        ensure_non_negative(&format!("{}.theta", name), self.theta)
    }

    fn score(&self, heading: f64, velocity: f64, distance: f64, theta: f64) -> f64 {
        self.heading * heading
            + self.velocity * velocity
            + self.distance * distance
            + self.theta * theta
    }
}

/// Configuration for the DWA planner
#[derive(Debug, Clone, PartialEq)]
pub struct DWAConfig {
    /// Linear velocity sampling step [m/s]
    pub v_resolution: f64,
    /// Angular velocity sampling step [rad/s]
    pub omega_resolution: f64,
    pub far_gains: DWAGains,
    pub near_gains: DWAGains,
    /// Below this distance to the target the near gains apply [m]
    pub distance_threshold: f64,
}

impl Default for DWAConfig {
    fn default() -> Self {
        Self {
            v_resolution: 0.01,
            omega_resolution: 0.01,
            far_gains: DWAGains::far(),
            near_gains: DWAGains::near(),
            distance_threshold: 0.1,
        }
    }
}

impl DWAConfig {
    /// Single gain profile regardless of the distance to the target
    pub fn flat(gains: DWAGains) -> Self {
        Self {
            far_gains: gains,
            near_gains: gains,
            distance_threshold: 0.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> NavResult<()> {
        ensure_finite("v_resolution", self.v_resolution)?;
        ensure_finite("omega_resolution", self.omega_resolution)?;
        if self.v_resolution <= 0.0 || self.omega_resolution <= 0.0 {
            return Err(NavError::InvalidParameter(format!(
                "resolutions must be positive, got v={} omega={}",
                self.v_resolution, self.omega_resolution
            )));
        }
        self.far_gains.validate("far_gains")?;
        self.near_gains.validate("near_gains")?;
        ensure_non_negative("distance_threshold", self.distance_threshold)
    }
}

/// Closed interval of admissible velocities.
///
/// A window whose lower bound ended up above its upper bound has collapsed
/// onto the upper bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityRange {
    pub min: f64,
    pub max: f64,
}

impl VelocityRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_collapsed(&self) -> bool {
        !(self.max > self.min)
    }

    pub fn contains(&self, value: f64) -> bool {
        if self.is_collapsed() {
            value == self.max
        } else {
            value >= self.min && value <= self.max
        }
    }

    /// Regular samples from `min` at `resolution`, always ending with `max`
    pub fn samples(&self, resolution: f64) -> Vec<f64> {
        if self.is_collapsed() {
            return vec![self.max];
        }
        let n = ((self.max - self.min) / resolution).ceil() as usize;
        let mut samples: Vec<f64> = (0..n)
            .map(|i| self.min + i as f64 * resolution)
            .filter(|&v| v < self.max)
            .collect();
        samples.push(self.max);
        samples
    }
}

/// Velocities reachable from the previous input within one interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicWindow {
    pub v: VelocityRange,
    pub omega: VelocityRange,
}

impl DynamicWindow {
    pub fn new(previous: &ControlInput, limits: &KinematicLimits, dt: f64) -> Self {
        let delta_v = limits.max_linear_accel * dt;
        let delta_omega = limits.max_angular_accel * dt;
        Self {
            v: VelocityRange::new(
                (previous.v - delta_v).max(limits.min_v),
                (previous.v + delta_v).min(limits.max_v),
            ),
            omega: VelocityRange::new(
                (previous.omega - delta_omega).max(limits.min_omega),
                (previous.omega + delta_omega).min(limits.max_omega),
            ),
        }
    }

    pub fn contains(&self, input: &ControlInput) -> bool {
        self.v.contains(input.v) && self.omega.contains(input.omega)
    }
}

/// One scored candidate input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub input: ControlInput,
    /// Pose after applying `input` for one interval
    pub next: Pose2D,
    pub heading_cost: f64,
    pub velocity_cost: f64,
    pub distance_cost: f64,
    pub theta_cost: f64,
    /// Weighted sum of the normalized costs
    pub score: f64,
}

/// Full result of one DWA search
#[derive(Debug, Clone)]
pub struct DWAEvaluation {
    pub window: DynamicWindow,
    pub candidates: Vec<Candidate>,
    /// Index of the selected candidate
    pub best: usize,
    /// Whether the near gain profile was used
    pub near: bool,
}

impl DWAEvaluation {
    pub fn best_candidate(&self) -> &Candidate {
        &self.candidates[self.best]
    }

    pub fn input(&self) -> ControlInput {
        self.best_candidate().input
    }
}

fn heading_cost(next: &Pose2D, target: &Pose2D) -> f64 {
    let angle = (target.y - next.y).atan2(target.x - next.x);
    normalize_angle(angle - next.yaw).abs()
}

fn theta_cost(next: &Pose2D, target: &Pose2D) -> f64 {
    next.yaw_difference(target).abs()
}

fn normalized_costs(candidates: &[Candidate], cost: impl Fn(&Candidate) -> f64) -> Vec<f64> {
    normalize_min_max(&candidates.iter().map(cost).collect::<Vec<_>>())
}

/// Obstacle-free Dynamic Window Approach planner
#[derive(Debug, Clone)]
pub struct DWAPlanner<M = UnicycleModel> {
    config: DWAConfig,
    motion: M,
}

impl DWAPlanner {
    pub fn new(config: DWAConfig) -> NavResult<Self> {
        Self::with_model(config, UnicycleModel)
    }

    pub fn with_defaults() -> Self {
        Self {
            config: DWAConfig::default(),
            motion: UnicycleModel,
        }
    }
}

impl<M: MotionModel> DWAPlanner<M> {
    pub fn with_model(config: DWAConfig, motion: M) -> NavResult<Self> {
        config.validate()?;
        Ok(Self { config, motion })
    }

    pub fn config(&self) -> &DWAConfig {
        &self.config
    }

    /// Whether `current` is close enough to `target` for the near profile
    pub fn is_near(&self, current: &Pose2D, target: &Pose2D) -> bool {
        current.distance(target) < self.config.distance_threshold
    }

    /// Build, score and rank every candidate in the dynamic window
    pub fn evaluate(
        &self,
        current: &Pose2D,
        target: &Pose2D,
        previous: &ControlInput,
        limits: &KinematicLimits,
        dt: f64,
    ) -> DWAEvaluation {
        let window = DynamicWindow::new(previous, limits, dt);
        let v_samples = window.v.samples(self.config.v_resolution);
        let omega_samples = window.omega.samples(self.config.omega_resolution);

        let mut candidates: Vec<Candidate> = v_samples
            .iter()
            .cartesian_product(omega_samples.iter())
            .map(|(&v, &omega)| {
                let input = ControlInput::new(v, omega);
                let next = self.motion.propagate(current, &input, dt);
                Candidate {
                    input,
                    next,
                    heading_cost: heading_cost(&next, target),
                    velocity_cost: limits.max_v - v,
                    distance_cost: next.distance(target),
                    theta_cost: theta_cost(&next, target),
                    score: 0.0,
                }
            })
            .collect();

        let heading = normalized_costs(&candidates, |c| c.heading_cost);
        let velocity = normalized_costs(&candidates, |c| c.velocity_cost);
        let distance = normalized_costs(&candidates, |c| c.distance_cost);
        let theta = normalized_costs(&candidates, |c| c.theta_cost);

        let near = self.is_near(current, target);
        let gains = if near { &self.config.near_gains } else { &self.config.far_gains };
        for (i, candidate) in candidates.iter_mut().enumerate() {
            candidate.score = gains.score(heading[i], velocity[i], distance[i], theta[i]);
        }

        // first minimum in enumeration order wins ties
        let best = candidates
            .iter()
            .position_min_by_key(|c| OrderedFloat(c.score))
            .unwrap_or(0);

        debug!(
            "dwa: {} candidates ({}x{}), near={}, chose v={:.3} omega={:.3}",
            candidates.len(),
            v_samples.len(),
            omega_samples.len(),
            near,
            candidates[best].input.v,
            candidates[best].input.omega
        );

        DWAEvaluation { window, candidates, best, near }
    }
}

impl<M: MotionModel> InputPlanner for DWAPlanner<M> {
    fn choose_input(
        &self,
        current: &Pose2D,
        target: &Pose2D,
        previous: &ControlInput,
        limits: &KinematicLimits,
        dt: f64,
    ) -> ControlInput {
        self.evaluate(current, target, previous, limits, dt).input()
    }
}
