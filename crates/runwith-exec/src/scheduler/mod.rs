//! Batch-scheduler execution.
//!
//! [`SchedulerRunner`] materializes a job and hands its launcher to a
//! [`SchedulerBackend`], either blocking until the job finishes (`run`) or
//! enqueueing it and returning the scheduler's job id (`submit`).
mod backend;
pub use backend::SchedulerBackend;

#[cfg(feature = "slurm")]
mod slurm;
#[cfg(feature = "slurm")]
pub use slurm::SlurmBackend;

mod runner;
pub use runner::SchedulerRunner;

mod group;
pub use group::JobGroup;
