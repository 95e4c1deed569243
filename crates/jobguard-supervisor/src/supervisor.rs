//! Supervisor - marks orphaned jobs dead and retriggers failed attempts.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, error, info, info_span, warn, Instrument};

use jobguard_core::{CoreError, Job, JobContext, JobState, JobStatus, JobType, Lock, TriggerId};

use crate::execution::JobExecution;
use crate::report::{CorrectiveFailure, PassReport, RetriggerSkip, Retriggered};
use crate::repository::{JobManager, LockRegistry, StatusHistory, StatusRepository};

/// What the retry policy decided for one job type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetriggerDecision {
    /// Start a fresh attempt correlated to this trigger id.
    Retrigger(TriggerId),
    /// Leave the job type alone.
    Skip(RetriggerSkip),
}

/// Apply the retry policy to the status history of one job type.
///
/// The record with the latest timestamp selects the current attempt. Only
/// records of that attempt count towards the retry budget. Returns `None`
/// for an empty history.
pub fn decide_retrigger(job: &Job, records: &[JobStatus]) -> Option<RetriggerDecision> {
    let latest = records.iter().max_by_key(|s| s.status_timestamp)?;
    let trigger_id = &latest.trigger_id;

    let attempt: Vec<&JobStatus> = records
        .iter()
        .filter(|s| &s.trigger_id == trigger_id)
        .collect();

    let decision = if attempt.iter().any(|s| s.job_result.is_success()) {
        RetriggerDecision::Skip(RetriggerSkip::Succeeded {
            trigger_id: trigger_id.clone(),
        })
    } else if attempt.len() >= job.retrigger_count {
        RetriggerDecision::Skip(RetriggerSkip::BudgetExhausted {
            trigger_id: trigger_id.clone(),
            attempts: attempt.len(),
            budget: job.retrigger_count,
        })
    } else {
        RetriggerDecision::Retrigger(trigger_id.clone())
    };

    Some(decision)
}

enum SweepOutcome {
    MarkedDead(JobStatus),
    Vanished(JobStatus),
    Failed(CorrectiveFailure),
}

#[derive(Default)]
struct SweepReport {
    running_checked: usize,
    outcomes: Vec<SweepOutcome>,
}

#[derive(Default)]
struct RetriggerReport {
    retriggered: Vec<Retriggered>,
    skipped: Vec<(JobType, RetriggerSkip)>,
    warnings: Vec<CorrectiveFailure>,
}

/// Self-healing supervisor.
///
/// A pass takes one snapshot of the lock registry and the status history,
/// then runs the dead sweep and the retrigger evaluation against it. The
/// supervisor holds no lock of its own; overlapping passes are tolerated.
pub struct Supervisor {
    locks: Arc<dyn LockRegistry>,
    statuses: Arc<dyn StatusRepository>,
    jobs: Arc<dyn JobManager>,
    latest_only: bool,
    filter: Option<HashSet<JobType>>,
}

impl Supervisor {
    /// Create a new Supervisor over the given collaborators.
    pub fn new(
        locks: Arc<dyn LockRegistry>,
        statuses: Arc<dyn StatusRepository>,
        jobs: Arc<dyn JobManager>,
    ) -> Self {
        Self {
            locks,
            statuses,
            jobs,
            latest_only: false,
            filter: None,
        }
    }

    /// Only fetch the current attempt and running records per job type.
    pub fn with_latest_only(mut self, latest_only: bool) -> Self {
        self.latest_only = latest_only;
        self
    }

    /// Restrict the status history fetch to the given job types.
    pub fn with_filter(mut self, filter: Option<HashSet<JobType>>) -> Self {
        self.filter = filter;
        self
    }

    /// Run one pass on the tokio runtime without waiting for it.
    pub fn spawn_pass(self: &Arc<Self>, ctx: JobContext) -> JobExecution {
        let supervisor = Arc::clone(self);
        let task_ctx = ctx.clone();
        let handle = tokio::spawn(async move { supervisor.run_pass(&task_ctx).await });
        JobExecution::new(ctx, handle)
    }

    /// Run one reconciliation pass.
    ///
    /// Fails with the unchanged collaborator error if the snapshot cannot be
    /// fetched; in that case nothing is written. Corrective failures after
    /// that point end up in [`PassReport::warnings`].
    pub async fn run_pass(&self, ctx: &JobContext) -> Result<PassReport, CoreError> {
        let span = info_span!(
            "supervisor_pass",
            job_type = %ctx.job_type,
            job_id = %ctx.job_id,
            trigger_id = %ctx.trigger_id,
        );
        self.reconcile().instrument(span).await
    }

    async fn reconcile(&self) -> Result<PassReport, CoreError> {
        let (locks, history) = tokio::try_join!(
            self.locks.get_all(),
            self.statuses
                .get_metadata(self.latest_only, self.filter.as_ref()),
        )
        .map_err(|e| {
            error!(error = %e, "Failed to fetch supervisor snapshot");
            e
        })?;

        let locks: HashSet<Lock> = locks.into_iter().collect();
        debug!(
            locks = locks.len(),
            job_types = history.len(),
            "Fetched supervisor snapshot"
        );

        let (sweep, retriggers) = tokio::join!(
            self.sweep_dead(&locks, &history),
            self.evaluate_retriggers(&history),
        );

        let mut report = PassReport {
            running_checked: sweep.running_checked,
            retriggered: retriggers.retriggered,
            skipped: retriggers.skipped,
            ..PassReport::default()
        };
        for outcome in sweep.outcomes {
            match outcome {
                SweepOutcome::MarkedDead(status) => report.marked_dead.push(status),
                SweepOutcome::Vanished(status) => report.vanished.push(status.job_id),
                SweepOutcome::Failed(failure) => report.warnings.push(failure),
            }
        }
        report.warnings.extend(retriggers.warnings);

        if report.is_clean() {
            info!(
                marked_dead = report.marked_dead.len(),
                retriggered = report.retriggered.len(),
                "Supervisor pass completed"
            );
        } else {
            warn!(
                marked_dead = report.marked_dead.len(),
                retriggered = report.retriggered.len(),
                failures = report.warnings.len(),
                "Supervisor pass completed with corrective failures"
            );
        }

        Ok(report)
    }

    /// Mark every running record without a matching lock as dead.
    async fn sweep_dead(&self, locks: &HashSet<Lock>, history: &StatusHistory) -> SweepReport {
        let running: Vec<&JobStatus> = history
            .values()
            .flatten()
            .filter(|s| s.job_state == JobState::Running)
            .collect();

        let orphans = running
            .iter()
            .filter(|s| !locks.contains(&s.expected_lock()))
            .map(|s| self.mark_dead(s));

        SweepReport {
            running_checked: running.len(),
            outcomes: join_all(orphans).await,
        }
    }

    async fn mark_dead(&self, candidate: &JobStatus) -> SweepOutcome {
        let job_type = &candidate.job_type;
        let job_id = &candidate.job_id;

        // The snapshot may be stale or stripped of content; write the fresh copy.
        let fresh = match self.statuses.get(job_type, job_id, true).await {
            Ok(Some(fresh)) => fresh,
            Ok(None) => {
                debug!(job_type = %job_type, job_id = %job_id, "Orphaned job already gone");
                return SweepOutcome::Vanished(candidate.clone());
            }
            Err(error) => {
                warn!(job_type = %job_type, job_id = %job_id, error = %error, "Failed to re-read orphaned job");
                return SweepOutcome::Failed(CorrectiveFailure::MarkDead {
                    job_type: job_type.clone(),
                    job_id: job_id.clone(),
                    error,
                });
            }
        };

        if !fresh.job_state.is_active() {
            debug!(
                job_type = %job_type,
                job_id = %job_id,
                state = %fresh.job_state,
                "Orphaned job settled since snapshot"
            );
            return SweepOutcome::Vanished(fresh);
        }

        match self.statuses.update_job_state(fresh, JobState::Dead).await {
            Ok(written) => {
                info!(
                    job_type = %job_type,
                    job_id = %job_id,
                    trigger_id = %written.trigger_id,
                    "Marked job dead - no lock held"
                );
                SweepOutcome::MarkedDead(written)
            }
            Err(error) => {
                warn!(job_type = %job_type, job_id = %job_id, error = %error, "Failed to mark job dead");
                SweepOutcome::Failed(CorrectiveFailure::MarkDead {
                    job_type: job_type.clone(),
                    job_id: job_id.clone(),
                    error,
                })
            }
        }
    }

    /// Retrigger every job type whose current attempt failed within budget.
    async fn evaluate_retriggers(&self, history: &StatusHistory) -> RetriggerReport {
        let mut report = RetriggerReport::default();
        let mut pending = Vec::new();

        for (job_type, records) in history {
            if records.is_empty() {
                continue;
            }

            let Some(job) = self.jobs.get_job(job_type) else {
                debug!(job_type = %job_type, "Skipping unknown job type");
                report
                    .skipped
                    .push((job_type.clone(), RetriggerSkip::UnknownJobType));
                continue;
            };

            match decide_retrigger(&job, records) {
                Some(RetriggerDecision::Retrigger(trigger_id)) => {
                    pending.push(self.retrigger(job_type, trigger_id));
                }
                Some(RetriggerDecision::Skip(reason)) => {
                    debug!(job_type = %job_type, reason = ?reason, "No retrigger needed");
                    report.skipped.push((job_type.clone(), reason));
                }
                None => {}
            }
        }

        for outcome in join_all(pending).await {
            match outcome {
                Ok(retriggered) => report.retriggered.push(retriggered),
                Err(failure) => report.warnings.push(failure),
            }
        }

        report
    }

    async fn retrigger(
        &self,
        job_type: &JobType,
        trigger_id: TriggerId,
    ) -> Result<Retriggered, CorrectiveFailure> {
        match self.jobs.retrigger_job(job_type, &trigger_id).await {
            Ok(started) => {
                info!(
                    job_type = %job_type,
                    trigger_id = %trigger_id,
                    started_job_id = %started.job_id,
                    "Retriggered failed job"
                );
                Ok(Retriggered {
                    job_type: job_type.clone(),
                    trigger_id,
                    started: started.job_id,
                })
            }
            Err(error) => {
                warn!(job_type = %job_type, trigger_id = %trigger_id, error = %error, "Failed to retrigger job");
                Err(CorrectiveFailure::Retrigger {
                    job_type: job_type.clone(),
                    trigger_id,
                    error,
                })
            }
        }
    }
}
