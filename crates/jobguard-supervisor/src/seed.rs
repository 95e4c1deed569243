//! Seed files for the in-memory collaborators.
//!
//! A seed file is a JSON document listing held locks, status records and
//! job descriptors:
//!
//! ```json
//! {
//!   "jobs": [{ "job_type": { "name": "import", "lock_type": "import" }, "retrigger_count": 3 }],
//!   "locks": [{ "lock_type": "import", "job_id": "j-2" }],
//!   "statuses": []
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use jobguard_core::{CoreError, Job, JobStatus, Lock};

use crate::memory::{InMemoryJobManager, InMemoryLockRegistry, InMemoryStatusRepository};

/// Errors while loading a seed file.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub locks: Vec<Lock>,
    #[serde(default)]
    pub statuses: Vec<JobStatus>,
}

impl Seed {
    /// Read and parse a seed file.
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Parse seed JSON.
    pub fn parse(raw: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Load everything into the in-memory collaborators.
    pub async fn apply(
        self,
        locks: &InMemoryLockRegistry,
        statuses: &InMemoryStatusRepository,
        jobs: &InMemoryJobManager,
    ) -> Result<(), SeedError> {
        let (job_count, lock_count, status_count) =
            (self.jobs.len(), self.locks.len(), self.statuses.len());

        for job in self.jobs {
            jobs.register(job);
        }
        for lock in self.locks {
            locks.acquire(lock).await?;
        }
        for status in self.statuses {
            statuses.insert(status).await;
        }

        info!(
            jobs = job_count,
            locks = lock_count,
            statuses = status_count,
            "Seed loaded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{JobManager, LockRegistry, StatusRepository};
    use jobguard_core::JobType;

    const SEED: &str = r#"{
        "jobs": [
            { "job_type": { "name": "import", "lock_type": "import" }, "retrigger_count": 3 }
        ],
        "locks": [
            { "lock_type": "import", "job_id": "j-2" }
        ],
        "statuses": [
            {
                "job_id": "j-2",
                "job_type": { "name": "import", "lock_type": "import" },
                "trigger_id": "t-1",
                "job_state": "RUNNING",
                "job_result": "PENDING",
                "status_timestamp": "2024-05-01T10:00:00Z",
                "content": "{\"file\":\"a.csv\"}"
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_seed_populates_collaborators() {
        let locks = InMemoryLockRegistry::new();
        let statuses = InMemoryStatusRepository::new();
        let jobs = InMemoryJobManager::new();

        Seed::parse(SEED)
            .unwrap()
            .apply(&locks, &statuses, &jobs)
            .await
            .unwrap();

        let import = JobType::exclusive("import");
        assert_eq!(jobs.get_job(&import).unwrap().retrigger_count, 3);
        assert_eq!(locks.get_all().await.unwrap().len(), 1);
        assert_eq!(statuses.get_metadata(false, None).await.unwrap()[&import].len(), 1);
    }

    #[test]
    fn test_invalid_seed_is_rejected() {
        let err = Seed::parse("{ \"jobs\": 3 }").unwrap_err();
        assert!(matches!(err, SeedError::Json(_)));
    }

    #[tokio::test]
    async fn test_conflicting_locks_are_rejected() {
        let seed = Seed::parse(
            r#"{ "locks": [
                { "lock_type": "import", "job_id": "a" },
                { "lock_type": "import", "job_id": "b" }
            ] }"#,
        )
        .unwrap();

        let err = seed
            .apply(
                &InMemoryLockRegistry::new(),
                &InMemoryStatusRepository::new(),
                &InMemoryJobManager::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SeedError::Core(CoreError::LockHeld { .. })));
    }
}
