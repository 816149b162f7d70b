// Localization algorithms module

pub mod ekf;

// Re-exports
pub use ekf::{Correction, EKFConfig, EKFLocalizer, EKFStepOutput};
