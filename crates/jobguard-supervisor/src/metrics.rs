//! Prometheus metrics for supervisor passes.
//!
//! Counters accumulate across passes and are rendered in Prometheus text
//! exposition format.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use jobguard_core::CoreError;

use crate::report::PassReport;

/// Cumulative counters over all passes run by this process.
#[derive(Debug, Default)]
pub struct SupervisorMetrics {
    passes_total: AtomicU64,
    passes_failed: AtomicU64,
    jobs_marked_dead: AtomicU64,
    retriggers: AtomicU64,
    corrective_failures: AtomicU64,
}

impl SupervisorMetrics {
    /// Create zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for the outcome of one pass.
    pub fn record(&self, outcome: &Result<PassReport, CoreError>) {
        self.passes_total.fetch_add(1, Ordering::Relaxed);

        match outcome {
            Ok(report) => {
                self.jobs_marked_dead
                    .fetch_add(report.marked_dead.len() as u64, Ordering::Relaxed);
                self.retriggers
                    .fetch_add(report.retriggered.len() as u64, Ordering::Relaxed);
                self.corrective_failures
                    .fetch_add(report.warnings.len() as u64, Ordering::Relaxed);
            }
            Err(_) => {
                self.passes_failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Number of passes recorded so far.
    pub fn passes_total(&self) -> u64 {
        self.passes_total.load(Ordering::Relaxed)
    }

    /// Render all counters as Prometheus text.
    pub fn render(&self) -> String {
        let mut output = String::new();

        write_counter(
            &mut output,
            "jobguard_supervisor_passes_total",
            "Supervisor passes run",
            self.passes_total.load(Ordering::Relaxed),
        );
        write_counter(
            &mut output,
            "jobguard_supervisor_passes_failed_total",
            "Supervisor passes that failed to fetch their snapshot",
            self.passes_failed.load(Ordering::Relaxed),
        );
        write_counter(
            &mut output,
            "jobguard_jobs_marked_dead_total",
            "Running jobs marked dead because no lock was held",
            self.jobs_marked_dead.load(Ordering::Relaxed),
        );
        write_counter(
            &mut output,
            "jobguard_retriggers_total",
            "Failed jobs retriggered",
            self.retriggers.load(Ordering::Relaxed),
        );
        write_counter(
            &mut output,
            "jobguard_corrective_failures_total",
            "Dead marks or retriggers that failed",
            self.corrective_failures.load(Ordering::Relaxed),
        );

        output
    }
}

fn write_counter(output: &mut String, name: &str, help: &str, value: u64) {
    if !output.is_empty() {
        writeln!(output).ok();
    }
    writeln!(output, "# HELP {name} {help}").ok();
    writeln!(output, "# TYPE {name} counter").ok();
    writeln!(output, "{name} {value}").ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobguard_core::{JobId, JobStatus, JobType, TriggerId};

    #[test]
    fn test_render_empty_metrics() {
        let metrics = SupervisorMetrics::new();
        let output = metrics.render();

        assert!(output.contains("# TYPE jobguard_supervisor_passes_total counter"));
        assert!(output.contains("jobguard_supervisor_passes_total 0"));
        assert!(output.contains("jobguard_retriggers_total 0"));
    }

    #[test]
    fn test_record_successful_and_failed_passes() {
        let metrics = SupervisorMetrics::new();
        let report = PassReport {
            marked_dead: vec![JobStatus::new(
                JobId::new("j1"),
                JobType::exclusive("import"),
                TriggerId::new("t1"),
            )],
            ..PassReport::default()
        };

        metrics.record(&Ok(report));
        metrics.record(&Err(CoreError::Storage("down".to_string())));

        let output = metrics.render();
        assert_eq!(metrics.passes_total(), 2);
        assert!(output.contains("jobguard_supervisor_passes_failed_total 1"));
        assert!(output.contains("jobguard_jobs_marked_dead_total 1"));
    }
}
