use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid function name: {0:?}")]
    InvalidFunctionName(String),

    #[error("missing positional argument #{0}")]
    MissingArg(usize),

    #[error("missing keyword argument: {0}")]
    MissingKwarg(String),

    #[error("argument {name} has unexpected type: {reason}")]
    ArgType { name: String, reason: String },

    #[error("invalid job id: {0:?}")]
    InvalidJobId(String),

    #[error("invalid scheduler options: {0}")]
    InvalidOptions(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;
