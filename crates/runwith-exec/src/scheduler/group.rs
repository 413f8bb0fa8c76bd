use serde_json::Value;
use tracing::{info, warn};

use runwith_core::prelude::RunnerError;
use runwith_model::JobId;

use crate::{ExecError, scheduler::SchedulerRunner};

/// Ordered collection of scheduler jobs submitted as one batch.
#[derive(Debug, Default)]
pub struct JobGroup {
    jobs: Vec<SchedulerRunner>,
}

impl JobGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job. Duplicates are allowed.
    pub fn add_job(&mut self, job: SchedulerRunner) {
        self.jobs.push(job);
    }

    pub fn jobs(&self) -> &[SchedulerRunner] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Submit every job in insertion order and return one id per job.
    ///
    /// A failed submission yields [`JobId::FAILED`] at its position and is reported
    /// individually; remaining jobs are still submitted.
    pub async fn submit_all(&self) -> Vec<JobId> {
        let mut ids = Vec::with_capacity(self.jobs.len());
        for (idx, job) in self.jobs.iter().enumerate() {
            let id = job.submit().await;
            if id.is_failed() {
                warn!(job = idx, "failed to submit job:\n{job}");
            } else {
                info!(job = idx, job_id = %id, "submitted job");
            }
            ids.push(id);
        }
        ids
    }

    /// Run every job to completion.
    ///
    /// Not supported: ordering, concurrency and failure aggregation are undefined
    /// for batch runs, so this always returns [`ExecError::NotImplemented`].
    pub async fn run_all(&self) -> Result<Vec<Value>, ExecError> {
        Err(ExecError::NotImplemented("JobGroup::run_all"))
    }

    /// Collect finished submissions of every member, in member order.
    pub fn reap_all(&self) -> Vec<(JobId, Result<Value, RunnerError>)> {
        self.jobs.iter().flat_map(SchedulerRunner::reap).collect()
    }
}

impl Extend<SchedulerRunner> for JobGroup {
    fn extend<T: IntoIterator<Item = SchedulerRunner>>(&mut self, iter: T) {
        self.jobs.extend(iter);
    }
}

impl FromIterator<SchedulerRunner> for JobGroup {
    fn from_iter<T: IntoIterator<Item = SchedulerRunner>>(iter: T) -> Self {
        Self {
            jobs: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path, sync::Arc};

    use runwith_core::prelude::{Materializer, MaterializerConfig};
    use runwith_model::{BoundCall, SchedulerOptions};

    use super::*;
    use crate::scheduler::{SchedulerBackend, testing::FakeScheduler};

    fn job(root: &Path, name: &str, backend: Arc<dyn SchedulerBackend>) -> SchedulerRunner {
        SchedulerRunner::new(
            BoundCall::new(name),
            SchedulerOptions::default(),
            backend,
            Materializer::new(MaterializerConfig {
                work_root: root.to_path_buf(),
                worker: Some("/opt/bin/worker".into()),
                verbose: false,
            }),
        )
    }

    #[tokio::test]
    async fn submit_all_keeps_going_after_a_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let backend: Arc<dyn SchedulerBackend> = Arc::new(FakeScheduler::failing_on(1));

        let mut group = JobGroup::new();
        for name in ["a", "b", "c"] {
            group.add_job(job(tmp.path(), name, backend.clone()));
        }

        let ids = group.submit_all().await;
        assert_eq!(ids, vec![JobId::new(100), JobId::FAILED, JobId::new(102)]);
        assert_eq!(ids.iter().filter(|id| id.is_failed()).count(), 1);

        // Successful submissions keep their assets; the failed one left nothing behind.
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 2);
        assert_eq!(group.jobs()[1].pending(), Vec::<JobId>::new());
    }

    #[tokio::test]
    async fn submit_all_follows_insertion_order() {
        let tmp = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeScheduler::default());
        let group: JobGroup = ["first", "second", "third"]
            .into_iter()
            .map(|n| job(tmp.path(), n, fake.clone()))
            .collect();

        group.submit_all().await;

        let seen = fake.seen.lock().unwrap();
        let order: Vec<String> = seen
            .iter()
            .map(|(script, _)| script.file_stem().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(order, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn run_all_is_not_implemented() {
        let tmp = tempfile::tempdir().unwrap();
        let empty = JobGroup::new();
        assert!(matches!(empty.run_all().await, Err(ExecError::NotImplemented(_))));

        let mut group = JobGroup::new();
        group.add_job(job(tmp.path(), "a", Arc::new(FakeScheduler::default())));
        assert!(matches!(group.run_all().await, Err(ExecError::NotImplemented(_))));
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn reap_all_gathers_finished_jobs_across_members() {
        let tmp = tempfile::tempdir().unwrap();
        let backend: Arc<dyn SchedulerBackend> = Arc::new(FakeScheduler::default());
        let mut group = JobGroup::new();
        group.add_job(job(tmp.path(), "a", backend.clone()));
        group.add_job(job(tmp.path(), "b", backend));

        let ids = group.submit_all().await;
        for entry in fs::read_dir(tmp.path()).unwrap() {
            let dir = entry.unwrap().path();
            for stem in ["a", "b"] {
                if dir.join(format!("{stem}.dump")).exists() {
                    fs::write(dir.join(format!("{stem}.ret")), b"true").unwrap();
                }
            }
        }

        let reaped = group.reap_all();
        let reaped_ids: Vec<JobId> = reaped.iter().map(|(id, _)| *id).collect();
        assert_eq!(reaped_ids, ids);
        assert!(reaped.iter().all(|(_, r)| r.is_ok()));
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }
}
