//! Correlation context of a running execution.

use serde::{Deserialize, Serialize};

use crate::{JobId, JobType, TriggerId};

/// Job type name used by supervisor passes.
pub const SUPERVISOR_JOB_TYPE: &str = "supervisor";

/// Correlation triple identifying one execution instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobContext {
    pub job_type: JobType,
    pub job_id: JobId,
    pub trigger_id: TriggerId,
}

impl JobContext {
    /// Create a new JobContext.
    pub fn new(job_type: JobType, job_id: JobId, trigger_id: TriggerId) -> Self {
        Self {
            job_type,
            job_id,
            trigger_id,
        }
    }

    /// Fresh context for one supervisor pass.
    pub fn supervisor() -> Self {
        Self::new(
            JobType::exclusive(SUPERVISOR_JOB_TYPE),
            JobId::generate(),
            TriggerId::generate(),
        )
    }
}
