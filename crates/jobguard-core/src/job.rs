//! Job types, job descriptors and status records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{JobId, JobResult, JobState, Lock, LockType, TriggerId};

/// A kind of job, together with the lock it runs under.
///
/// Compared by value: two job types with the same name and lock type are the
/// same job type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobType {
    /// Job type name.
    pub name: String,

    /// Resource a running instance must hold.
    pub lock_type: LockType,
}

impl JobType {
    /// Create a new JobType.
    pub fn new(name: impl Into<String>, lock_type: LockType) -> Self {
        Self {
            name: name.into(),
            lock_type,
        }
    }

    /// Create a JobType whose lock type shares its name.
    pub fn exclusive(name: impl Into<String>) -> Self {
        let name = name.into();
        let lock_type = LockType::new(name.clone());
        Self { name, lock_type }
    }

    /// The lock a live execution `job_id` of this type must be holding.
    pub fn lock_for(&self, job_id: &JobId) -> Lock {
        Lock::new(self.lock_type.clone(), job_id.clone())
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Runtime descriptor of a job type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Job type described.
    pub job_type: JobType,

    /// Maximum number of status records allowed under one trigger id before
    /// the supervisor stops retrying that attempt.
    pub retrigger_count: usize,

    /// Human readable description.
    #[serde(default)]
    pub description: Option<String>,
}

impl Job {
    /// Create a new Job descriptor.
    pub fn new(job_type: JobType, retrigger_count: usize) -> Self {
        Self {
            job_type,
            retrigger_count,
            description: None,
        }
    }
}

/// Marker returned when a fresh execution attempt has been started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStarted {
    /// Id of the new execution.
    pub job_id: JobId,
}

/// One status record written by a job execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Unique record / execution id.
    pub job_id: JobId,

    /// Type of the job.
    pub job_type: JobType,

    /// Logical attempt this record belongs to.
    pub trigger_id: TriggerId,

    /// Lifecycle state.
    pub job_state: JobState,

    /// Outcome.
    pub job_result: JobResult,

    /// When the record was last written.
    pub status_timestamp: DateTime<Utc>,

    /// Job-specific payload. Bulk queries may leave this out.
    #[serde(default)]
    pub content: Option<String>,
}

impl JobStatus {
    /// Create a new Running record with a pending result.
    pub fn new(job_id: JobId, job_type: JobType, trigger_id: TriggerId) -> Self {
        Self {
            job_id,
            job_type,
            trigger_id,
            job_state: JobState::Running,
            job_result: JobResult::Pending,
            status_timestamp: Utc::now(),
            content: None,
        }
    }

    /// Builder method to set state and result.
    pub fn with_result(mut self, job_state: JobState, job_result: JobResult) -> Self {
        self.job_state = job_state;
        self.job_result = job_result;
        self
    }

    /// Builder method to set the timestamp.
    pub fn with_timestamp(mut self, status_timestamp: DateTime<Utc>) -> Self {
        self.status_timestamp = status_timestamp;
        self
    }

    /// Builder method to attach content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Copy of this record with the state replaced and everything else kept.
    pub fn with_state(&self, job_state: JobState) -> Self {
        Self {
            job_state,
            ..self.clone()
        }
    }

    /// Metadata-only copy, as returned by bulk queries.
    pub fn without_content(&self) -> Self {
        Self {
            content: None,
            ..self.clone()
        }
    }

    /// The lock this record must be backed by while it is running.
    pub fn expected_lock(&self) -> Lock {
        self.job_type.lock_for(&self.job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_lock_uses_lock_type_of_job_type() {
        let job_type = JobType::new("import", LockType::new("import-lock"));
        let status = JobStatus::new(JobId::new("j1"), job_type, TriggerId::new("t1"));

        let lock = status.expected_lock();
        assert_eq!(lock.lock_type, LockType::new("import-lock"));
        assert_eq!(lock.job_id, JobId::new("j1"));
    }

    #[test]
    fn test_with_state_keeps_content() {
        let status = JobStatus::new(
            JobId::new("j1"),
            JobType::exclusive("import"),
            TriggerId::new("t1"),
        )
        .with_content("payload");

        let dead = status.with_state(JobState::Dead);
        assert_eq!(dead.job_state, JobState::Dead);
        assert_eq!(dead.content.as_deref(), Some("payload"));
        assert_eq!(dead.status_timestamp, status.status_timestamp);
    }

    #[test]
    fn test_status_deserializes_without_content() {
        let json = r#"{
            "job_id": "j1",
            "job_type": {"name": "import", "lock_type": "import"},
            "trigger_id": "t1",
            "job_state": "FAILED",
            "job_result": "FAILED",
            "status_timestamp": "2024-01-01T00:00:00Z"
        }"#;
        let status: JobStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.job_state, JobState::Failed);
        assert!(status.content.is_none());
    }
}
