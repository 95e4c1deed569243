//! Core domain errors.

use thiserror::Error;

/// Core domain errors for JobGuard.
///
/// Errors are `Clone` so a collaborator failure can be handed back to the
/// caller of a supervisor pass exactly as it was produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Lock registry could not be queried.
    #[error("Lock registry error: {0}")]
    LockRegistry(String),

    /// Status store could not be read or written.
    #[error("Status store error: {0}")]
    Storage(String),

    /// Status record not found.
    #[error("Job {job_id} of type '{job_type}' not found")]
    JobNotFound { job_type: String, job_id: String },

    /// Job type is not known to the job catalog.
    #[error("Unknown job type: {0}")]
    UnknownJobType(String),

    /// A fresh execution attempt could not be started.
    #[error("Failed to retrigger job '{job_type}': {reason}")]
    RetriggerFailed { job_type: String, reason: String },

    /// Lock type is already held by another job.
    #[error("Lock '{lock_type}' is already held by job {holder}")]
    LockHeld { lock_type: String, holder: String },

    /// Invalid state transition.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Execution task panicked or was cancelled before completing.
    #[error("Execution aborted: {0}")]
    ExecutionAborted(String),
}
