//! Error taxonomy for the envelope pipeline.
//!
//! Geometry, input and engine failures are fatal to one building only and are
//! caught by the batch driver. Classification failures are degraded to the
//! exterior-wall default by their callers. Profile failures corrupt a whole
//! building category and are surfaced before any batch starts. File access
//! lives in `io` and reports through `anyhow`, so it has no variant here.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UbemError {
    #[error("Degenerate geometry: {0}")]
    Geometry(String),

    #[error("Neighbor data unavailable for building {0}")]
    Classification(String),

    #[error("Malformed profile table '{table}': {reason}")]
    Profile { table: String, reason: String },

    #[error("Invalid building record '{id}': {reason}")]
    InvalidInput { id: String, reason: String },

    #[error("Simulation engine failed: {0}")]
    Engine(String),
}

/// Coarse failure class, reported per building by the batch driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ErrorClass {
    Geometry,
    Classification,
    Profile,
    InvalidInput,
    Engine,
}

impl UbemError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Geometry(_) => ErrorClass::Geometry,
            Self::Classification(_) => ErrorClass::Classification,
            Self::Profile { .. } => ErrorClass::Profile,
            Self::InvalidInput { .. } => ErrorClass::InvalidInput,
            Self::Engine(_) => ErrorClass::Engine,
        }
    }

    pub(crate) fn profile(table: &str, reason: impl Into<String>) -> Self {
        Self::Profile {
            table: table.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn input(id: &str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, UbemError>;
