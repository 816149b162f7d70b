//! Error types for landmark_nav

use std::fmt;

/// Main error type for the navigation stack
#[derive(Debug)]
pub enum NavError {
    /// Invalid parameter or configuration
    InvalidParameter(String),
    /// Numerical computation failed (matrix inversion, etc.)
    NumericalError(String),
    /// I/O error
    IoError(std::io::Error),
    /// Visualization error
    VisualizationError(String),
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            NavError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
            NavError::IoError(e) => write!(f, "I/O error: {}", e),
            NavError::VisualizationError(msg) => write!(f, "Visualization error: {}", msg),
        }
    }
}

impl std::error::Error for NavError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NavError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for NavError {
    fn from(e: std::io::Error) -> Self {
        NavError::IoError(e)
    }
}

/// Result type alias for navigation operations
pub type NavResult<T> = Result<T, NavError>;

/// Fails with `InvalidParameter` unless `value` is finite.
pub(crate) fn ensure_finite(name: &str, value: f64) -> NavResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(NavError::InvalidParameter(format!("{} must be finite, got {}", name, value)))
    }
}

/// Fails with `InvalidParameter` unless `value` is finite and `>= 0`.
pub(crate) fn ensure_non_negative(name: &str, value: f64) -> NavResult<()> {
    ensure_finite(name, value)?;
    if value < 0.0 {
        return Err(NavError::InvalidParameter(format!(
            "{} must be non-negative, got {}",
            name, value
        )));
    }
    Ok(())
}
