use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Opaque identifier assigned by a batch scheduler to a submitted job.
///
/// A failed submission is represented by [`JobId::FAILED`] (`-1`) so that
/// batch submission can report one identifier per job without aborting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(i64);

impl JobId {
    /// Sentinel returned when a submission did not reach the scheduler.
    pub const FAILED: JobId = JobId(-1);

    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw numeric value.
    pub const fn value(&self) -> i64 {
        self.0
    }

    /// Returns `true` for the failed-submission sentinel.
    pub const fn is_failed(&self) -> bool {
        self.0 == Self::FAILED.0
    }
}

impl From<i64> for JobId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl FromStr for JobId {
    type Err = ModelError;

    /// Parses the scheduler's textual id (e.g. `sbatch --parsable` output).
    ///
    /// Cluster suffixes of the form `<id>;<cluster>` are accepted and ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let head = raw.split(';').next().unwrap_or(raw).trim();
        head.parse::<i64>()
            .map(JobId)
            .map_err(|_| ModelError::InvalidJobId(s.to_string()))
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
