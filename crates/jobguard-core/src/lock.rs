//! Lock types and held locks.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::JobId;

/// Name of a mutually-exclusive resource class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockType(String);

impl LockType {
    /// Create a new LockType.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the lock name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LockType {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A lock currently held by a running job instance.
///
/// Existence of a lock is the authoritative signal that the job is alive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lock {
    /// Resource class being held.
    pub lock_type: LockType,

    /// Job instance holding it.
    pub job_id: JobId,
}

impl Lock {
    /// Create a new Lock.
    pub fn new(lock_type: LockType, job_id: JobId) -> Self {
        Self { lock_type, job_id }
    }
}

impl fmt::Display for Lock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.lock_type, self.job_id)
    }
}
