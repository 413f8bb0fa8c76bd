use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use runwith_core::prelude::{AssetSet, Materializer, Runner, RunnerError, TemplatePair};
use runwith_model::{BoundCall, JobId, SchedulerOptions};

use crate::{ExecError, RUNNER_TYPE_SCHEDULER, scheduler::SchedulerBackend};

/// Assets of a job that was enqueued but not yet collected.
#[derive(Debug)]
struct Submission {
    id: JobId,
    assets: AssetSet,
}

/// Runner that executes jobs through a batch scheduler.
///
/// - [`Runner::run`] blocks until the scheduler finishes the job, then collects
///   the result and cleans up like any other runner.
/// - [`SchedulerRunner::submit`] returns as soon as the job is enqueued. Its assets
///   stay on disk because the job has not produced output yet; they are tracked by
///   this runner until [`SchedulerRunner::reap`] collects them or
///   [`SchedulerRunner::abandon`] discards them.
pub struct SchedulerRunner {
    call: BoundCall,
    templates: TemplatePair,
    materializer: Materializer,
    options: SchedulerOptions,
    backend: Arc<dyn SchedulerBackend>,
    submissions: Mutex<Vec<Submission>>,
}

impl SchedulerRunner {
    /// Create a scheduler runner with the default templates.
    pub fn new(
        call: BoundCall,
        options: SchedulerOptions,
        backend: Arc<dyn SchedulerBackend>,
        materializer: Materializer,
    ) -> Self {
        Self {
            call,
            templates: TemplatePair::default(),
            materializer,
            options,
            backend,
            submissions: Mutex::new(Vec::new()),
        }
    }

    /// Create a runner backed by Slurm programs found on `PATH`.
    #[cfg(feature = "slurm")]
    pub fn slurm(call: BoundCall, options: SchedulerOptions, materializer: Materializer) -> Self {
        Self::new(call, options, Arc::new(crate::SlurmBackend::new()), materializer)
    }

    /// Replace the templates and return the updated runner.
    ///
    /// Custom launchers typically prepare the environment before invoking `{target}`,
    /// e.g. `module load ...; apptainer exec image.sif sh "{target}"`.
    pub fn with_templates(mut self, templates: TemplatePair) -> Self {
        self.templates = templates;
        self
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    pub fn backend(&self) -> &Arc<dyn SchedulerBackend> {
        &self.backend
    }

    /// Enqueue the job and return the scheduler-assigned id without waiting.
    ///
    /// Never fails: any error is logged and [`JobId::FAILED`] is returned, so a
    /// batch of submissions can tolerate individual failures.
    pub async fn submit(&self) -> JobId {
        match self.try_submit().await {
            Ok(id) => id,
            Err(e) => {
                warn!(call = %self.call, backend = self.backend.name(), "job submission failed: {e}");
                JobId::FAILED
            }
        }
    }

    /// Enqueue the job, reporting failures to the caller.
    ///
    /// On failure nothing was enqueued, so the assets are removed before returning.
    pub async fn try_submit(&self) -> Result<JobId, ExecError> {
        let mut assets = self.materializer.prepare(&self.call, &self.templates)?;
        let directives = self.options.to_mapping();

        match self.backend.submit(assets.exec(), &directives).await {
            Ok(id) => {
                assets.retain();
                debug!(job_id = %id, dir = %assets.dir().display(), "job enqueued; assets retained");
                self.ledger().push(Submission { id, assets });
                Ok(id)
            }
            Err(e) => {
                if let Err(ce) = assets.cleanup() {
                    warn!(dir = %assets.dir().display(), "asset cleanup failed: {ce}");
                }
                Err(e)
            }
        }
    }

    /// Ids of submitted jobs whose results have not been collected.
    pub fn pending(&self) -> Vec<JobId> {
        self.ledger().iter().map(|s| s.id).collect()
    }

    /// Collect every submitted job whose result file is present.
    ///
    /// Collected jobs are decoded and their assets removed; jobs still running stay pending.
    pub fn reap(&self) -> Vec<(JobId, Result<Value, RunnerError>)> {
        let mut ledger = self.ledger();
        let (done, pending): (Vec<_>, Vec<_>) =
            ledger.drain(..).partition(|s| s.assets.has_result());
        *ledger = pending;
        drop(ledger);

        done.into_iter()
            .map(|s| {
                let outcome = runwith_core::runner::finish(s.assets, Ok(()), self.materializer.codec());
                info!(job_id = %s.id, ok = outcome.is_ok(), "collected submitted job");
                (s.id, outcome)
            })
            .collect()
    }

    /// Stop tracking a submitted job and remove its assets.
    ///
    /// Returns `false` if `id` is not pending. The job itself is not cancelled.
    pub fn abandon(&self, id: JobId) -> bool {
        let removed = {
            let mut ledger = self.ledger();
            let idx = ledger.iter().position(|s| s.id == id);
            idx.map(|i| ledger.remove(i))
        };
        match removed {
            Some(mut s) => {
                if let Err(e) = s.assets.cleanup() {
                    warn!(job_id = %id, "asset cleanup failed: {e}");
                }
                true
            }
            None => false,
        }
    }

    fn ledger(&self) -> MutexGuard<'_, Vec<Submission>> {
        self.submissions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Runner for SchedulerRunner {
    fn name(&self) -> &'static str {
        RUNNER_TYPE_SCHEDULER
    }

    fn call(&self) -> &BoundCall {
        &self.call
    }

    fn templates(&self) -> &TemplatePair {
        &self.templates
    }

    fn materializer(&self) -> &Materializer {
        &self.materializer
    }

    async fn execute(&self, assets: &AssetSet) -> Result<(), RunnerError> {
        self.backend
            .run(assets.exec(), &self.options.to_mapping())
            .await
            .map_err(|e| RunnerError::Backend {
                runner: RUNNER_TYPE_SCHEDULER,
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for SchedulerRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args = self.call.args();
        let to_json = |v: Result<String, serde_json::Error>| v.map_err(|_| fmt::Error);
        writeln!(f, "Scheduler job:")?;
        writeln!(f, "  Function: {}", self.call.function())?;
        writeln!(f, "  Arguments: {}", to_json(serde_json::to_string(args.positional()))?)?;
        writeln!(f, "  Keyword arguments: {}", to_json(serde_json::to_string(args.keyword()))?)?;
        let options = to_json(serde_json::to_string(&self.options.to_mapping()))?;
        writeln!(f, "  Options: {options}")?;
        writeln!(f, "  Template: {:?}", self.templates.launcher())
    }
}

impl fmt::Debug for SchedulerRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerRunner")
            .field("call", &self.call.to_string())
            .field("backend", &self.backend.name())
            .field("options", &self.options.to_mapping())
            .field("pending", &self.pending())
            .finish()
    }
}
