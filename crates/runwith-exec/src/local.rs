//! Runners that execute the launcher on this machine.
use std::{path::Path, process::Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace, warn};

use runwith_core::prelude::{AssetSet, Materializer, Runner, RunnerError, TemplatePair};
use runwith_model::BoundCall;

use crate::{RUNNER_TYPE_INTERPRETER, RUNNER_TYPE_LOCAL, spawn::retry_spawn};

/// Runner that executes the launcher script directly as a child process.
///
/// Child stdout/stderr are inherited so progress is visible live.
#[derive(Debug, Clone)]
pub struct LocalRunner {
    call: BoundCall,
    templates: TemplatePair,
    materializer: Materializer,
}

impl LocalRunner {
    /// Create a local runner with the default templates.
    pub fn new(call: BoundCall, materializer: Materializer) -> Self {
        Self::with_templates(call, TemplatePair::default(), materializer)
    }

    /// Create a local runner with custom templates.
    pub fn with_templates(call: BoundCall, templates: TemplatePair, materializer: Materializer) -> Self {
        Self {
            call,
            templates,
            materializer,
        }
    }
}

#[async_trait]
impl Runner for LocalRunner {
    fn name(&self) -> &'static str {
        RUNNER_TYPE_LOCAL
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
        spawn_launcher(self.name(), assets.exec()).await
    }
}

/// Runner that executes the entry script under a caller-chosen interpreter.
///
/// Identical to [`LocalRunner`] except for the launcher template, which invokes
/// `<interpreter> "<entry>"` instead of the default shell.
#[derive(Debug, Clone)]
pub struct InterpreterRunner {
    interpreter: String,
    inner: LocalRunner,
}

impl InterpreterRunner {
    /// Run the default entry script under `interpreter`.
    ///
    /// The default entry is a POSIX shell script, so `interpreter` must accept one
    /// (`bash`, `dash`, ...). Use [`InterpreterRunner::with_entry`] for anything else.
    pub fn new(call: BoundCall, interpreter: impl Into<String>, materializer: Materializer) -> Self {
        let interpreter = interpreter.into();
        let templates = TemplatePair::interpreter(&interpreter);
        Self {
            interpreter,
            inner: LocalRunner::with_templates(call, templates, materializer),
        }
    }

    /// Run a custom entry template written in the interpreter's own language.
    pub fn with_entry(
        call: BoundCall,
        interpreter: impl Into<String>,
        entry: impl Into<String>,
        materializer: Materializer,
    ) -> Self {
        let interpreter = interpreter.into();
        let launcher = TemplatePair::interpreter(&interpreter).launcher().to_string();
        Self {
            interpreter,
            inner: LocalRunner::with_templates(call, TemplatePair::new(entry, launcher), materializer),
        }
    }

    /// Interpreter executable used by the launcher.
    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }
}

#[async_trait]
impl Runner for InterpreterRunner {
    fn name(&self) -> &'static str {
        RUNNER_TYPE_INTERPRETER
    }

    fn call(&self) -> &BoundCall {
        self.inner.call()
    }

    fn templates(&self) -> &TemplatePair {
        self.inner.templates()
    }

    fn materializer(&self) -> &Materializer {
        self.inner.materializer()
    }

    async fn execute(&self, assets: &AssetSet) -> Result<(), RunnerError> {
        spawn_launcher(self.name(), assets.exec()).await
    }
}

/// Spawn `launcher`, inherit its output streams and wait for it to exit.
///
/// Only spawn/wait failures are errors; the exit status is logged and otherwise ignored.
async fn spawn_launcher(runner: &'static str, launcher: &Path) -> Result<(), RunnerError> {
    trace!(runner, launcher = %launcher.display(), "spawning launcher");

    let mut cmd = Command::new(launcher);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::inherit());
    cmd.stderr(Stdio::inherit());

    let mut attempt = 0;
    let mut child = loop {
        match cmd.spawn() {
            Ok(child) => break child,
            Err(e) => {
                if !retry_spawn(&e, &mut attempt).await {
                    return Err(RunnerError::Backend {
                        runner,
                        reason: format!("spawn failed: {e}"),
                    });
                }
            }
        }
    };
    let status = child.wait().await.map_err(|e| RunnerError::Backend {
        runner,
        reason: format!("wait failed: {e}"),
    })?;

    if status.success() {
        debug!(runner, "launcher exited successfully");
    } else {
        warn!(runner, status = %status, "launcher exited unsuccessfully");
    }
    Ok(())
}
