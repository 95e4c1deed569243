//! JobGuard Supervisor Library
//!
//! This crate provides the supervisor that keeps job bookkeeping honest:
//! it marks jobs whose process died as dead and retriggers failed attempts
//! that still have retry budget left.

pub mod config;
pub mod execution;
pub mod memory;
pub mod metrics;
pub mod report;
pub mod repository;
pub mod seed;
pub mod supervisor;

pub use config::Config;
pub use execution::JobExecution;
pub use memory::{InMemoryJobManager, InMemoryLockRegistry, InMemoryStatusRepository};
pub use metrics::SupervisorMetrics;
pub use report::{CorrectiveFailure, PassReport, RetriggerSkip, Retriggered};
pub use repository::{JobManager, LockRegistry, StatusRepository};
pub use supervisor::{decide_retrigger, RetriggerDecision, Supervisor};
