use std::path::Path;

use async_trait::async_trait;

use runwith_model::{Directives, JobId};

use crate::ExecError;

/// Command-line integration with a batch scheduler.
///
/// Both operations receive the rendered launcher script and the filtered
/// directive mapping of the job's scheduler options.
#[async_trait]
pub trait SchedulerBackend: Send + Sync {
    /// Backend name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Submit `script` and block until the scheduler reports it finished.
    async fn run(&self, script: &Path, directives: &Directives) -> Result<(), ExecError>;

    /// Enqueue `script` and return the scheduler-assigned job id immediately.
    async fn submit(&self, script: &Path, directives: &Directives) -> Result<JobId, ExecError>;
}
