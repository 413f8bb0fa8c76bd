//! Logging setup for runwith programs.
//!
//! Library crates only emit `tracing` events; binaries call [`init_logger`] once.
mod config;
mod error;
mod format;
mod init;
mod level;
mod timer;

pub use config::{ENV_FORMAT, ENV_LEVEL, ENV_TZ, LoggerConfig};
pub use error::{LoggerError, LoggerResult};
pub use format::LoggerFormat;
pub use init::init_logger;
pub use level::LoggerLevel;
pub use timer::{LoggerTimeZone, Rfc3339Timer};
