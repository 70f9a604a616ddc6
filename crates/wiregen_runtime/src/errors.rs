//! Errors raised by generated builders.

use thiserror::Error;

/// Failure of a generated builder's terminal build step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A requirement that needs a caller-supplied instance was never set.
    #[error("{requirement} must be set before building")]
    MissingRequirement { requirement: &'static str },
}

impl BuildError {
    pub const fn missing_requirement(requirement: &'static str) -> Self {
        Self::MissingRequirement { requirement }
    }

    /// Raise this error as a panic. Used by builders whose declared build method cannot return an error.
    #[cold]
    #[track_caller]
    pub fn raise(self) -> ! {
        panic!("{self}");
    }
}
