use thiserror::Error;

use crate::prelude::Float;

pub type Result<T> = std::result::Result<T, Error>;

/// The error kinds of the engine. Configuration problems and invariant
/// violations are always fatal; the remaining kinds depend on run
/// policy (see the boundary and smoothing length parameters).
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration: {0}")]
    Configuration(String),

    #[error("invariant violated in {subsystem}: {reason}")]
    InvariantViolation {
        subsystem: &'static str,
        reason: String,
    },

    #[error(
        "smoothing length iteration did not converge for particle {particle} \
         (relative residual {residual:.3e})"
    )]
    NonConvergence { particle: usize, residual: Float },

    #[error("invalid riemann input state: {0}")]
    InvalidRiemannState(String),

    #[error("particle {particle} left the simulation domain")]
    DomainEscape { particle: usize },

    #[error("parameter file: {0}")]
    ParameterFile(String),

    #[error("output: {0}")]
    Output(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }

    pub fn invariant(subsystem: &'static str, reason: impl Into<String>) -> Self {
        Self::InvariantViolation {
            subsystem,
            reason: reason.into(),
        }
    }
}
