use std::path::PathBuf;

use thiserror::Error;

use runwith_model::ModelError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{template} template must contain {placeholder} placeholder, but got: {content:?}")]
    Template {
        template: &'static str,
        placeholder: &'static str,
        content: String,
    },

    #[error("invalid job: {0}")]
    Model(#[from] ModelError),

    #[error("codec '{codec}' failed: {reason}")]
    Codec { codec: &'static str, reason: String },

    #[error("cannot load result from {path}: {reason}")]
    ResultUnreadable { path: PathBuf, reason: String },

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("function '{0}' is already registered")]
    DuplicateFunction(String),

    #[error("call to '{function}' failed: {reason}")]
    CallFailed { function: String, reason: String },

    #[error("path is not valid UTF-8 and cannot be written into a script: {0:?}")]
    NonUtf8Path(PathBuf),

    #[error("cannot resolve worker executable: {0}")]
    Worker(String),

    #[error("entry usage: {0}")]
    EntryUsage(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
