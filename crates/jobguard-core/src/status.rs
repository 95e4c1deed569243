//! State and result enums for job status records.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Lifecycle state of a job execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// Job is executing and should be holding its lock.
    Running,
    /// Job ran to completion.
    Finished,
    /// Job reported a failure.
    Failed,
    /// Job was canceled before completion.
    Canceled,
    /// Owning process disappeared without reporting a terminal state.
    ///
    /// Only the supervisor moves a record into this state.
    Dead,
}

impl JobState {
    /// Returns true if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if the job is still running.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Validate a transition from `self` to `next`.
    ///
    /// Terminal states are final, except that re-marking a dead job as dead
    /// is accepted so that overlapping supervisor passes stay harmless.
    pub fn transition_to(self, next: JobState) -> Result<JobState, CoreError> {
        match (self, next) {
            (Self::Running, _) | (Self::Dead, Self::Dead) => Ok(next),
            (from, to) => Err(CoreError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            }),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Running => "RUNNING",
            Self::Finished => "FINISHED",
            Self::Failed => "FAILED",
            Self::Canceled => "CANCELED",
            Self::Dead => "DEAD",
        };
        f.write_str(s)
    }
}

/// Outcome of a job execution, orthogonal to [`JobState`].
///
/// A canceled job, for instance, still carries [`JobResult::Failed`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobResult {
    /// No outcome yet.
    #[default]
    Pending,
    /// Job succeeded.
    Success,
    /// Job failed.
    Failed,
}

impl JobResult {
    /// Returns true if the job succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}
