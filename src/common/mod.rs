//! Common types, traits, and error definitions for landmark_nav
//!
//! This module provides the foundational building blocks shared by the
//! models, the filter, the planner and the simulation.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
