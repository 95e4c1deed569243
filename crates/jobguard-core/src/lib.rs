//! JobGuard Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/storage backends
//! - Runtime specifics
//!
//! Locks, job status records, job descriptors and the correlation context
//! shared by workers and the supervisor all live here.

pub mod context;
pub mod error;
pub mod ids;
pub mod job;
pub mod lock;
pub mod status;

// Re-export commonly used types
pub use context::JobContext;
pub use error::CoreError;
pub use ids::{JobId, TriggerId};
pub use job::{Job, JobStarted, JobStatus, JobType};
pub use lock::{Lock, LockType};
pub use status::{JobResult, JobState};
