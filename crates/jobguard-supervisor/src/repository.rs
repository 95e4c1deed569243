//! Collaborator interfaces consumed by the supervisor.
//!
//! The supervisor never owns storage. It reads locks and status history,
//! writes dead transitions and asks the job manager for fresh attempts, all
//! through the traits below.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use jobguard_core::{CoreError, Job, JobId, JobStarted, JobState, JobStatus, JobType, Lock, TriggerId};

/// Status history grouped by job type.
pub type StatusHistory = HashMap<JobType, Vec<JobStatus>>;

/// Source of truth for which resources are currently held.
#[async_trait]
pub trait LockRegistry: Send + Sync {
    /// Every lock held cluster-wide at call time, in no particular order.
    async fn get_all(&self) -> Result<Vec<Lock>, CoreError>;
}

/// Queryable store of job status records.
#[async_trait]
pub trait StatusRepository: Send + Sync {
    /// Bulk metadata query grouped by job type.
    ///
    /// With `latest_only` set, each job type only carries the records of its
    /// current attempt (the trigger id of its newest record) plus every
    /// running record. `filter` restricts the result to the given job types.
    /// Content may be left out of the returned records.
    async fn get_metadata(
        &self,
        latest_only: bool,
        filter: Option<&HashSet<JobType>>,
    ) -> Result<StatusHistory, CoreError>;

    /// Fetch a single record. With `include_content` the record is returned
    /// with full fidelity.
    async fn get(
        &self,
        job_type: &JobType,
        job_id: &JobId,
        include_content: bool,
    ) -> Result<Option<JobStatus>, CoreError>;

    /// Write `status` with its state replaced by `new_state`.
    ///
    /// All other fields of `status`, content included, are written as given.
    async fn update_job_state(
        &self,
        status: JobStatus,
        new_state: JobState,
    ) -> Result<JobStatus, CoreError>;
}

/// Job catalog that knows job descriptors and can start new attempts.
#[async_trait]
pub trait JobManager: Send + Sync {
    /// Descriptor for `job_type`, or `None` if the type is not known.
    fn get_job(&self, job_type: &JobType) -> Option<Job>;

    /// Start a fresh execution attempt correlated to `trigger_id`.
    async fn retrigger_job(
        &self,
        job_type: &JobType,
        trigger_id: &TriggerId,
    ) -> Result<JobStarted, CoreError>;
}
