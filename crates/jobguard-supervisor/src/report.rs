//! Outcome of a supervisor pass.

use std::fmt;

use jobguard_core::{CoreError, JobId, JobStatus, JobType, TriggerId};

/// Why no retrigger was issued for a job type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetriggerSkip {
    /// The current attempt already has a successful record.
    Succeeded { trigger_id: TriggerId },
    /// The current attempt used up its retry budget.
    BudgetExhausted {
        trigger_id: TriggerId,
        attempts: usize,
        budget: usize,
    },
    /// The job catalog does not know this job type.
    UnknownJobType,
}

/// Corrective operation that failed during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrectiveFailure {
    /// Re-reading or marking a record dead failed.
    MarkDead {
        job_type: JobType,
        job_id: JobId,
        error: CoreError,
    },
    /// Starting a fresh attempt failed.
    Retrigger {
        job_type: JobType,
        trigger_id: TriggerId,
        error: CoreError,
    },
}

impl fmt::Display for CorrectiveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MarkDead {
                job_type,
                job_id,
                error,
            } => write!(f, "marking {job_type}/{job_id} dead failed: {error}"),
            Self::Retrigger {
                job_type,
                trigger_id,
                error,
            } => write!(f, "retriggering {job_type} ({trigger_id}) failed: {error}"),
        }
    }
}

/// A retrigger that was started during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retriggered {
    pub job_type: JobType,
    pub trigger_id: TriggerId,
    pub started: JobId,
}

/// Everything a successful pass did.
///
/// Corrective failures are collected as warnings; they never fail the pass.
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    /// Running records inspected by the dead sweep.
    pub running_checked: usize,

    /// Records written as dead.
    pub marked_dead: Vec<JobStatus>,

    /// Running records without a lock that were gone (or no longer running)
    /// on re-read.
    pub vanished: Vec<JobId>,

    /// Fresh attempts started.
    pub retriggered: Vec<Retriggered>,

    /// Job types evaluated without a retrigger, with the reason.
    pub skipped: Vec<(JobType, RetriggerSkip)>,

    /// Isolated corrective failures.
    pub warnings: Vec<CorrectiveFailure>,
}

impl PassReport {
    /// True if no corrective operation failed.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
