//! Runner abstraction: materialize a job, hand its launcher to a backend, collect the result.
//!
//! Concrete runners (local shell, custom interpreter, batch scheduler) only implement
//! [`Runner::execute`]; the provided [`Runner::run`] owns the asset lifecycle.
mod error;
pub use error::RunnerError;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use runwith_model::BoundCall;

use crate::{assets::AssetSet, codec::Codec, materializer::Materializer, template::TemplatePair};

/// Generic job runner.
///
/// A runner is responsible for:
/// - describing the job it runs (`call`, `templates`, `materializer`)
/// - executing a prepared launcher script to completion (`execute`)
#[async_trait]
pub trait Runner: Send + Sync {
    /// Runner name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// The bound call this runner executes.
    fn call(&self) -> &BoundCall;

    fn templates(&self) -> &TemplatePair;

    fn materializer(&self) -> &Materializer;

    /// Run the launcher of `assets` and wait until it finishes.
    ///
    /// The exit status of the launched process is not inspected: a failed job
    /// shows up as a missing or unreadable result file.
    async fn execute(&self, assets: &AssetSet) -> Result<(), RunnerError>;

    /// Materialize, execute and return the decoded result.
    ///
    /// Assets are cleaned up exactly once before returning, on success and on error.
    async fn run(&self) -> Result<Value, RunnerError> {
        let assets = self.materializer().prepare(self.call(), self.templates())?;
        debug!(
            runner = self.name(),
            call = %self.call(),
            launcher = %assets.exec().display(),
            "executing launcher",
        );
        let executed = self.execute(&assets).await;
        finish(assets, executed, self.materializer().codec())
    }
}

/// Collect the result of an executed job and release its assets.
///
/// Cleanup runs before any error is returned; a cleanup failure is logged and never
/// masks the job outcome.
pub fn finish(
    mut assets: AssetSet,
    executed: Result<(), RunnerError>,
    codec: &dyn Codec,
) -> Result<Value, RunnerError> {
    let outcome = executed.and_then(|()| assets.load_result(codec).map_err(RunnerError::from));
    if let Err(e) = assets.cleanup() {
        warn!(dir = %assets.dir().display(), "asset cleanup failed: {e}");
    }
    outcome
}
