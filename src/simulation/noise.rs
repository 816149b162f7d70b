//! Noisy ground truth and landmark sightings

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::common::error::ensure_non_negative;
use crate::common::{ControlInput, Landmark, NavError, NavResult, Observation, Pose2D};
use crate::models::{predict_observation, predict_pose};

/// Standard deviations of the injected noise
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseConfig {
    /// Per-component noise added to the true pose every tick
    pub pose_sd: f64,
    /// Range measurement noise [m]
    pub range_sd: f64,
    /// Bearing measurement noise [rad]
    pub bearing_sd: f64,
    pub seed: u64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            pose_sd: 0.01,
            range_sd: 0.05,
            bearing_sd: 0.04,
            seed: 0,
        }
    }
}

impl NoiseConfig {
    /// No noise at all
    pub fn noiseless() -> Self {
        Self {
            pose_sd: 0.0,
            range_sd: 0.0,
            bearing_sd: 0.0,
            seed: 0,
        }
    }

    pub fn validate(&self) -> NavResult<()> {
        ensure_non_negative("pose_sd", self.pose_sd)?;
        ensure_non_negative("range_sd", self.range_sd)?;
        ensure_non_negative("bearing_sd", self.bearing_sd)
    }
}

fn normal(sd: f64) -> NavResult<Normal<f64>> {
    Normal::new(0.0, sd).map_err(|e| NavError::InvalidParameter(format!("noise sd {}: {}", sd, e)))
}

/// Ground-truth robot that the filter never sees directly
pub struct NoisySimulator {
    truth: Pose2D,
    rng: StdRng,
    pose_noise: Normal<f64>,
    range_noise: Normal<f64>,
    bearing_noise: Normal<f64>,
}

impl NoisySimulator {
    pub fn new(initial: Pose2D, config: NoiseConfig) -> NavResult<Self> {
        config.validate()?;
        Ok(Self {
            truth: initial,
            rng: StdRng::seed_from_u64(config.seed),
            pose_noise: normal(config.pose_sd)?,
            range_noise: normal(config.range_sd)?,
            bearing_noise: normal(config.bearing_sd)?,
        })
    }

    pub fn truth(&self) -> &Pose2D {
        &self.truth
    }

    /// Move the true pose by `input` and perturb it
    pub fn advance(&mut self, input: &ControlInput, dt: f64) -> Pose2D {
        let ideal = predict_pose(&self.truth, input, dt);
        self.truth = Pose2D::new(
            ideal.x + self.pose_noise.sample(&mut self.rng),
            ideal.y + self.pose_noise.sample(&mut self.rng),
            ideal.yaw + self.pose_noise.sample(&mut self.rng),
        );
        self.truth
    }

    /// Noisy (range, bearing) of every landmark from the true pose
    pub fn observe(&mut self, landmarks: &[Landmark]) -> Vec<Observation> {
        let truth = self.truth;
        landmarks
            .iter()
            .map(|landmark| {
                let z = predict_observation(landmark, &truth);
                Observation::new(
                    *landmark,
                    z[0] + self.range_noise.sample(&mut self.rng),
                    z[1] + self.bearing_noise.sample(&mut self.rng),
                )
            })
            .collect()
    }
}
