//! Errors surfaced by the fallback runners.

use thiserror::Error;

use crate::ports::BoxError;

/// Why a fallback run produced no result.
#[derive(Debug, Error)]
pub enum RunError {
    /// A candidate failed to launch for a reason other than being missing.
    #[error("{source}")]
    Launch {
        /// Candidate whose launch failed.
        command: String,
        /// The error reported by the executor, unchanged.
        #[source]
        source: BoxError,
    },
    /// Every candidate was missing; carries the last not-found error.
    #[error("{source}")]
    Exhausted {
        /// Last candidate tried.
        command: String,
        /// The not-found error reported for it.
        #[source]
        source: BoxError,
    },
    /// The candidate list was empty.
    #[error("no candidates available")]
    NoCandidates,
}

impl RunError {
    /// The candidate the error refers to, if any.
    #[must_use]
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::Launch { command, .. } | Self::Exhausted { command, .. } => Some(command),
            Self::NoCandidates => None,
        }
    }

    /// Returns `true` if no candidate could be found at all.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. } | Self::NoCandidates)
    }
}
