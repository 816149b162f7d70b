//! Closed-loop simulation
//!
//! A noisy ground-truth robot supplies landmark observations to the filter
//! while a trajectory provider and a planner close the control loop.

pub mod noise;
pub mod runner;

pub use noise::{NoiseConfig, NoisySimulator};
pub use runner::{default_landmarks, RunSummary, Simulation, SimulationConfig, TickRecord};
