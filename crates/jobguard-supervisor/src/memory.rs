//! In-memory collaborators.
//!
//! Used by the test suite and by the daemon when it runs against a seed
//! file instead of a real lock registry and status store.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock as StdRwLock;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use jobguard_core::{
    CoreError, Job, JobId, JobStarted, JobState, JobStatus, JobType, Lock, LockType, TriggerId,
};

use crate::repository::{JobManager, LockRegistry, StatusHistory, StatusRepository};

/// Lock registry holding at most one lock per lock type.
#[derive(Default)]
pub struct InMemoryLockRegistry {
    locks: RwLock<HashMap<LockType, JobId>>,
}

impl InMemoryLockRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire `lock`. Re-acquiring a lock already held by the same job is a no-op.
    pub async fn acquire(&self, lock: Lock) -> Result<(), CoreError> {
        let mut locks = self.locks.write().await;
        match locks.get(&lock.lock_type) {
            Some(holder) if *holder != lock.job_id => Err(CoreError::LockHeld {
                lock_type: lock.lock_type.to_string(),
                holder: holder.to_string(),
            }),
            _ => {
                locks.insert(lock.lock_type, lock.job_id);
                Ok(())
            }
        }
    }

    /// Release `lock`. Returns false if it was not held.
    pub async fn release(&self, lock: &Lock) -> bool {
        let mut locks = self.locks.write().await;
        if locks.get(&lock.lock_type) == Some(&lock.job_id) {
            locks.remove(&lock.lock_type);
            true
        } else {
            false
        }
    }

    /// Number of held locks.
    pub async fn lock_count(&self) -> usize {
        self.locks.read().await.len()
    }
}

#[async_trait]
impl LockRegistry for InMemoryLockRegistry {
    async fn get_all(&self) -> Result<Vec<Lock>, CoreError> {
        let locks = self.locks.read().await;
        Ok(locks
            .iter()
            .map(|(lock_type, job_id)| Lock::new(lock_type.clone(), job_id.clone()))
            .collect())
    }
}

/// Status store keeping records per job type, ordered by timestamp.
#[derive(Default)]
pub struct InMemoryStatusRepository {
    records: RwLock<HashMap<JobType, Vec<JobStatus>>>,

    /// Every record written through `update_job_state`, in write order.
    writes: RwLock<Vec<JobStatus>>,
}

impl InMemoryStatusRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    pub async fn insert(&self, status: JobStatus) {
        let mut records = self.records.write().await;
        let list = records.entry(status.job_type.clone()).or_default();
        list.retain(|s| s.job_id != status.job_id);
        list.push(status);
        list.sort_by_key(|s| s.status_timestamp);
    }

    /// Records written through `update_job_state` so far.
    pub async fn writes(&self) -> Vec<JobStatus> {
        self.writes.read().await.clone()
    }
}

#[async_trait]
impl StatusRepository for InMemoryStatusRepository {
    async fn get_metadata(
        &self,
        latest_only: bool,
        filter: Option<&HashSet<JobType>>,
    ) -> Result<StatusHistory, CoreError> {
        let records = self.records.read().await;

        let history = records
            .iter()
            .filter(|(job_type, _)| filter.map_or(true, |f| f.contains(*job_type)))
            .map(|(job_type, list)| {
                let current = list.last().map(|s| &s.trigger_id);
                let selected: Vec<JobStatus> = list
                    .iter()
                    .filter(|s| {
                        !latest_only
                            || s.job_state.is_active()
                            || Some(&s.trigger_id) == current
                    })
                    .map(JobStatus::without_content)
                    .collect();
                (job_type.clone(), selected)
            })
            .collect();

        Ok(history)
    }

    async fn get(
        &self,
        job_type: &JobType,
        job_id: &JobId,
        include_content: bool,
    ) -> Result<Option<JobStatus>, CoreError> {
        let records = self.records.read().await;
        let found = records
            .get(job_type)
            .and_then(|list| list.iter().find(|s| &s.job_id == job_id));

        Ok(found.map(|s| {
            if include_content {
                s.clone()
            } else {
                s.without_content()
            }
        }))
    }

    async fn update_job_state(
        &self,
        status: JobStatus,
        new_state: JobState,
    ) -> Result<JobStatus, CoreError> {
        let mut records = self.records.write().await;
        let stored = records
            .get_mut(&status.job_type)
            .and_then(|list| list.iter_mut().find(|s| s.job_id == status.job_id))
            .ok_or_else(|| CoreError::JobNotFound {
                job_type: status.job_type.to_string(),
                job_id: status.job_id.to_string(),
            })?;

        stored.job_state.transition_to(new_state)?;
        let updated = status.with_state(new_state);
        *stored = updated.clone();
        drop(records);

        debug!(job_id = %updated.job_id, state = %new_state, "Status record updated");
        self.writes.write().await.push(updated.clone());

        Ok(updated)
    }
}

/// A retrigger request recorded by [`InMemoryJobManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetriggerRequest {
    pub job_type: JobType,
    pub trigger_id: TriggerId,
    pub started: JobId,
}

/// Job catalog backed by a map of registered descriptors.
#[derive(Default)]
pub struct InMemoryJobManager {
    jobs: StdRwLock<HashMap<JobType, Job>>,
    retriggers: Mutex<Vec<RetriggerRequest>>,
    fail_retriggers: AtomicBool,
}

impl InMemoryJobManager {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a job descriptor.
    pub fn register(&self, job: Job) {
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        jobs.insert(job.job_type.clone(), job);
    }

    /// Make every following retrigger fail (or succeed again).
    pub fn fail_retriggers(&self, fail: bool) {
        self.fail_retriggers.store(fail, Ordering::SeqCst);
    }

    /// Retriggers started so far, in start order.
    pub async fn retriggers(&self) -> Vec<RetriggerRequest> {
        self.retriggers.lock().await.clone()
    }
}

#[async_trait]
impl JobManager for InMemoryJobManager {
    fn get_job(&self, job_type: &JobType) -> Option<Job> {
        let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
        jobs.get(job_type).cloned()
    }

    async fn retrigger_job(
        &self,
        job_type: &JobType,
        trigger_id: &TriggerId,
    ) -> Result<JobStarted, CoreError> {
        if self.fail_retriggers.load(Ordering::SeqCst) {
            return Err(CoreError::RetriggerFailed {
                job_type: job_type.to_string(),
                reason: "job manager rejected the request".to_string(),
            });
        }
        if self.get_job(job_type).is_none() {
            return Err(CoreError::UnknownJobType(job_type.to_string()));
        }

        let started = JobId::generate();
        self.retriggers.lock().await.push(RetriggerRequest {
            job_type: job_type.clone(),
            trigger_id: trigger_id.clone(),
            started: started.clone(),
        });

        Ok(JobStarted { job_id: started })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jobguard_core::JobResult;

    fn status(job_id: &str, job_type: &JobType, trigger: &str, age_secs: i64) -> JobStatus {
        JobStatus::new(JobId::new(job_id), job_type.clone(), TriggerId::new(trigger))
            .with_timestamp(Utc::now() - Duration::seconds(age_secs))
            .with_content(format!("content of {job_id}"))
    }

    #[tokio::test]
    async fn test_lock_registry_allows_one_holder_per_lock_type() {
        let registry = InMemoryLockRegistry::new();
        let lock_type = LockType::new("import");

        registry
            .acquire(Lock::new(lock_type.clone(), JobId::new("a")))
            .await
            .unwrap();
        let err = registry
            .acquire(Lock::new(lock_type.clone(), JobId::new("b")))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::LockHeld { .. }));
        assert_eq!(registry.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lock_release_only_by_holder() {
        let registry = InMemoryLockRegistry::new();
        let lock = Lock::new(LockType::new("import"), JobId::new("a"));
        registry.acquire(lock.clone()).await.unwrap();

        assert!(!registry
            .release(&Lock::new(LockType::new("import"), JobId::new("b")))
            .await);
        assert!(registry.release(&lock).await);
        assert_eq!(registry.lock_count().await, 0);
    }

    #[tokio::test]
    async fn test_metadata_strips_content() {
        let repo = InMemoryStatusRepository::new();
        let import = JobType::exclusive("import");
        repo.insert(status("old", &import, "t1", 60)).await;
        repo.insert(status("new", &import, "t2", 10)).await;

        let all = repo.get_metadata(false, None).await.unwrap();
        assert_eq!(all[&import].len(), 2);
        assert!(all[&import].iter().all(|s| s.content.is_none()));
    }

    #[tokio::test]
    async fn test_latest_only_keeps_current_attempt_and_running_records() {
        let repo = InMemoryStatusRepository::new();
        let import = JobType::exclusive("import");
        repo.insert(status("orphan", &import, "t0", 90)).await;
        repo.insert(
            status("old-failure", &import, "t0", 80).with_result(JobState::Failed, JobResult::Failed),
        )
        .await;
        for (i, id) in ["f1", "f2", "f3"].iter().enumerate() {
            repo.insert(
                status(id, &import, "t1", 30 - i as i64).with_result(JobState::Failed, JobResult::Failed),
            )
            .await;
        }

        let latest = repo.get_metadata(true, None).await.unwrap();

        let mut ids: Vec<&str> = latest[&import].iter().map(|s| s.job_id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["f1", "f2", "f3", "orphan"]);
    }

    #[tokio::test]
    async fn test_metadata_filter() {
        let repo = InMemoryStatusRepository::new();
        let import = JobType::exclusive("import");
        let export = JobType::exclusive("export");
        repo.insert(status("a", &import, "t1", 5)).await;
        repo.insert(status("b", &export, "t2", 5)).await;

        let filter: HashSet<JobType> = [export.clone()].into_iter().collect();
        let history = repo.get_metadata(false, Some(&filter)).await.unwrap();

        assert_eq!(history.len(), 1);
        assert!(history.contains_key(&export));
    }

    #[tokio::test]
    async fn test_get_with_content() {
        let repo = InMemoryStatusRepository::new();
        let import = JobType::exclusive("import");
        repo.insert(status("a", &import, "t1", 5)).await;

        let full = repo.get(&import, &JobId::new("a"), true).await.unwrap().unwrap();
        assert_eq!(full.content.as_deref(), Some("content of a"));

        let bare = repo.get(&import, &JobId::new("a"), false).await.unwrap().unwrap();
        assert!(bare.content.is_none());

        assert!(repo.get(&import, &JobId::new("missing"), true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_job_state_writes_given_record() {
        let repo = InMemoryStatusRepository::new();
        let import = JobType::exclusive("import");
        repo.insert(status("a", &import, "t1", 5)).await;

        let fresh = repo.get(&import, &JobId::new("a"), true).await.unwrap().unwrap();
        let written = repo.update_job_state(fresh, JobState::Dead).await.unwrap();

        assert_eq!(written.job_state, JobState::Dead);
        assert_eq!(written.content.as_deref(), Some("content of a"));
        assert_eq!(repo.writes().await, vec![written]);
    }

    #[tokio::test]
    async fn test_update_job_state_rejects_leaving_terminal_state() {
        let repo = InMemoryStatusRepository::new();
        let import = JobType::exclusive("import");
        let finished = status("a", &import, "t1", 5)
            .with_result(JobState::Finished, JobResult::Success);
        repo.insert(finished.clone()).await;

        let err = repo
            .update_job_state(finished, JobState::Dead)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::InvalidStateTransition { .. }));
        assert!(repo.writes().await.is_empty());
    }

    #[tokio::test]
    async fn test_job_manager_records_retriggers() {
        let manager = InMemoryJobManager::new();
        let import = JobType::exclusive("import");
        manager.register(Job::new(import.clone(), 3));

        let started = manager
            .retrigger_job(&import, &TriggerId::new("t1"))
            .await
            .unwrap();

        let requests = manager.retriggers().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].trigger_id, TriggerId::new("t1"));
        assert_eq!(requests[0].started, started.job_id);
    }

    #[tokio::test]
    async fn test_job_manager_failure_mode() {
        let manager = InMemoryJobManager::new();
        let import = JobType::exclusive("import");
        manager.register(Job::new(import.clone(), 3));
        manager.fail_retriggers(true);

        let err = manager
            .retrigger_job(&import, &TriggerId::new("t1"))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::RetriggerFailed { .. }));
        assert!(manager.retriggers().await.is_empty());
    }
}
