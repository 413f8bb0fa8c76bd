use std::{path::Path, process::Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace, warn};

use runwith_model::{Directives, JobId};

use crate::{ExecError, scheduler::SchedulerBackend, spawn::retry_spawn};

/// Slurm backend: `srun` for blocking runs, `sbatch --parsable` for submissions.
#[derive(Debug, Clone)]
pub struct SlurmBackend {
    srun: String,
    sbatch: String,
}

impl SlurmBackend {
    /// Use `srun` and `sbatch` from `PATH`.
    pub fn new() -> Self {
        Self::with_programs("srun", "sbatch")
    }

    /// Use explicit programs (e.g. absolute paths or wrappers).
    pub fn with_programs(srun: impl Into<String>, sbatch: impl Into<String>) -> Self {
        Self {
            srun: srun.into(),
            sbatch: sbatch.into(),
        }
    }

    fn command(program: &str, leading: &[&str], script: &Path, directives: &Directives) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(leading);
        cmd.args(directives.to_args());
        cmd.arg(script);
        cmd.stdin(Stdio::null());
        cmd
    }
}

impl Default for SlurmBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SchedulerBackend for SlurmBackend {
    fn name(&self) -> &'static str {
        "slurm"
    }

    async fn run(&self, script: &Path, directives: &Directives) -> Result<(), ExecError> {
        let mut cmd = Self::command(&self.srun, &[], script, directives);
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());
        trace!(program = %self.srun, args = ?directives.to_args(), script = %script.display(), "running srun");

        let mut attempt = 0;
        let status = loop {
            match cmd.status().await {
                Ok(status) => break status,
                Err(e) => {
                    if !retry_spawn(&e, &mut attempt).await {
                        return Err(ExecError::Scheduler {
                            command: self.srun.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        };
        if status.success() {
            debug!("srun finished");
        } else {
            warn!(status = %status, "srun exited unsuccessfully");
        }
        Ok(())
    }

    async fn submit(&self, script: &Path, directives: &Directives) -> Result<JobId, ExecError> {
        let mut cmd = Self::command(&self.sbatch, &["--parsable"], script, directives);
        trace!(program = %self.sbatch, args = ?directives.to_args(), script = %script.display(), "running sbatch");

        let mut attempt = 0;
        let out = loop {
            match cmd.output().await {
                Ok(out) => break out,
                Err(e) => {
                    if !retry_spawn(&e, &mut attempt).await {
                        return Err(ExecError::Scheduler {
                            command: self.sbatch.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        };
        if !out.status.success() {
            return Err(ExecError::Scheduler {
                command: self.sbatch.clone(),
                reason: format!(
                    "{}: {}",
                    out.status,
                    String::from_utf8_lossy(&out.stderr).trim()
                ),
            });
        }

        let raw = String::from_utf8_lossy(&out.stdout);
        raw.parse::<JobId>()
            .map_err(|_| ExecError::InvalidResponse(raw.trim().to_string()))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::{fs, os::unix::fs::PermissionsExt, path::Path};

    use runwith_model::{Directives, JobId};

    use super::*;

    /// Write a fake scheduler program that records its arguments and prints `stdout`.
    fn fake_program(dir: &Path, name: &str, stdout: &str, code: i32) -> String {
        let path = dir.join(name);
        let log = dir.join(format!("{name}.args"));
        fs::write(
            &path,
            format!(
                "#!/bin/sh\necho \"$@\" > \"{}\"\nprintf '%s\\n' '{stdout}'\nexit {code}\n",
                log.display()
            ),
        )
        .unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path.display().to_string()
    }

    #[tokio::test]
    async fn submit_parses_parsable_output_and_passes_directives() {
        let tmp = tempfile::tempdir().unwrap();
        let sbatch = fake_program(tmp.path(), "sbatch", "4242;cluster", 0);
        let backend = SlurmBackend::with_programs("srun", sbatch);

        let mut d = Directives::new();
        d.insert("partition", "short");
        d.insert("hold", true);

        let id = backend.submit(Path::new("/w/job.sh"), &d).await.unwrap();
        assert_eq!(id, JobId::new(4242));

        let args = fs::read_to_string(tmp.path().join("sbatch.args")).unwrap();
        assert_eq!(args.trim(), "--parsable --hold --partition=short /w/job.sh");
    }

    #[tokio::test]
    async fn submit_reports_non_zero_exit() {
        let tmp = tempfile::tempdir().unwrap();
        let sbatch = fake_program(tmp.path(), "sbatch", "", 1);
        let backend = SlurmBackend::with_programs("srun", sbatch);

        let err = backend
            .submit(Path::new("/w/job.sh"), &Directives::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Scheduler { .. }));
    }

    #[tokio::test]
    async fn submit_rejects_unparsable_output() {
        let tmp = tempfile::tempdir().unwrap();
        let sbatch = fake_program(tmp.path(), "sbatch", "queued!", 0);
        let backend = SlurmBackend::with_programs("srun", sbatch);

        let err = backend
            .submit(Path::new("/w/job.sh"), &Directives::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::InvalidResponse(raw) if raw == "queued!"));
    }

    #[tokio::test]
    async fn run_ignores_exit_status() {
        let tmp = tempfile::tempdir().unwrap();
        let srun = fake_program(tmp.path(), "srun", "", 2);
        let backend = SlurmBackend::with_programs(srun, "sbatch");

        let mut d = Directives::new();
        d.insert("ntasks", 2_i64);
        backend.run(Path::new("/w/job.sh"), &d).await.unwrap();

        let args = fs::read_to_string(tmp.path().join("srun.args")).unwrap();
        assert_eq!(args.trim(), "--ntasks=2 /w/job.sh");
    }

    #[tokio::test]
    async fn missing_program_is_a_scheduler_error() {
        let backend = SlurmBackend::with_programs("/nonexistent/srun", "/nonexistent/sbatch");
        let err = backend
            .run(Path::new("/w/job.sh"), &Directives::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Scheduler { command, .. } if command == "/nonexistent/srun"));
    }
}
