//! Fallback runner for external commands.
//!
//! Given an ordered list of candidate executables, try each in turn until
//! one launches. [`run`] is the plain variant; [`run_with_progress`] also
//! reports progress and can be cancelled.

pub mod candidate;
pub mod classify;
pub mod error;
pub mod fallback;
pub mod progress;

pub use candidate::{
    shell_candidates, CandidateList, CommandCandidate, SHELL_ALTERNATE, SHELL_PRIMARY,
    SHELL_WELL_KNOWN_PATH,
};
pub use classify::is_not_found;
pub use error::RunError;
pub use fallback::run;
pub use progress::{run_with_progress, RunOutcome};
