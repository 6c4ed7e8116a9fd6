//! Error types shared by the simulation core and its file front end.

use thiserror::Error;

/// Errors raised while building or running a simulation.
///
/// An empty selection (no surviving prey, no hungry predator) is not an
/// error; selection returns `None` for that case.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("species \"{0}\" already exists")]
    DuplicateSpecies(String),

    #[error("no species named \"{0}\"")]
    SpeciesNotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;

/// Check that `value` is a finite probability in `[0, 1]`.
pub(crate) fn check_unit(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(SimError::invalid(
            field,
            format!("must be between 0.0 and 1.0 inclusive, got {}", value),
        ));
    }
    Ok(())
}

/// Check that a name-like string is non-empty.
pub(crate) fn check_non_empty(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SimError::invalid(field, "must not be empty"));
    }
    Ok(())
}
