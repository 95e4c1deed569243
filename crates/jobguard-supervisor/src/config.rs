//! Supervisor configuration.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use jobguard_core::JobType;

const DEFAULT_INTERVAL_SECS: u64 = 30;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Supervisor configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "jobguard-supervisor", version, about = "Marks dead jobs and retriggers failed ones")]
pub struct Config {
    /// Seconds between two supervisor passes.
    #[arg(long, env = "JOBGUARD_INTERVAL_SECS", default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval_secs: u64,

    /// Only fetch the current attempt and running records per job type.
    #[arg(long, env = "JOBGUARD_LATEST_ONLY")]
    pub latest_only: bool,

    /// Restrict the pass to these job types (repeatable). Lock types are
    /// assumed to share the job type name.
    #[arg(long = "job-type", value_name = "NAME")]
    pub job_types: Vec<String>,

    /// Run a single pass and exit.
    #[arg(long)]
    pub once: bool,

    /// JSON file with locks, status records and job descriptors to load.
    #[arg(long, env = "JOBGUARD_SEED")]
    pub seed: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, env = "JOBGUARD_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}

impl Config {
    /// Interval between passes.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    /// Job type filter for the status history fetch, if any was configured.
    pub fn status_filter(&self) -> Option<HashSet<JobType>> {
        if self.job_types.is_empty() {
            return None;
        }
        Some(self.job_types.iter().map(|name| JobType::exclusive(name.as_str())).collect())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            latest_only: false,
            job_types: Vec::new(),
            once: false,
            seed: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_cli_defaults() {
        let parsed = Config::parse_from(["jobguard-supervisor"]);
        let default = Config::default();

        assert_eq!(parsed.interval_secs, default.interval_secs);
        assert_eq!(parsed.latest_only, default.latest_only);
        assert_eq!(parsed.log_level, default.log_level);
        assert!(parsed.status_filter().is_none());
    }

    #[test]
    fn test_job_type_filter() {
        let config = Config::parse_from([
            "jobguard-supervisor",
            "--job-type",
            "import",
            "--job-type",
            "export",
            "--once",
        ]);

        let filter = config.status_filter().unwrap();
        assert!(config.once);
        assert_eq!(filter.len(), 2);
        assert!(filter.contains(&JobType::exclusive("import")));
    }

    #[test]
    fn test_interval_is_never_zero() {
        let config = Config {
            interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.interval(), Duration::from_secs(1));
    }
}
