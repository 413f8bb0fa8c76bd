use thiserror::Error;

use crate::error::CoreError;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("runner '{runner}' backend failed: {reason}")]
    Backend { runner: &'static str, reason: String },
}
