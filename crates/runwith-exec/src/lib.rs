mod error;
pub use error::ExecError;

mod spawn;

mod local;
pub use local::{InterpreterRunner, LocalRunner};

pub mod scheduler;
pub use scheduler::{JobGroup, SchedulerBackend, SchedulerRunner};

#[cfg(feature = "slurm")]
pub use scheduler::SlurmBackend;

/// Local runner type identifier.
pub const RUNNER_TYPE_LOCAL: &str = "local";

/// Interpreter runner type identifier.
pub const RUNNER_TYPE_INTERPRETER: &str = "interpreter";

/// Scheduler runner type identifier.
pub const RUNNER_TYPE_SCHEDULER: &str = "scheduler";
