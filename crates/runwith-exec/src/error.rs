use thiserror::Error;

use runwith_core::prelude::CoreError;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("scheduler command '{command}' failed: {reason}")]
    Scheduler { command: String, reason: String },

    #[error("unexpected scheduler response: {0:?}")]
    InvalidResponse(String),

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error(transparent)]
    Core(#[from] CoreError),
}
