//! Demo agent and entry worker.
//!
//! Started with `__runwith-entry <dump> <ret>` it executes one bound call from its
//! function registry. Started without arguments it materializes a few demo jobs,
//! runs them locally and, when `RUNWITH_SLURM_OPTIONS` names an options file,
//! submits a small job group to Slurm.
mod jobs;

use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, warn};

use runwith_core::{
    codec::JsonCodec,
    entry,
    materializer::{Materializer, MaterializerConfig},
    runner::Runner,
};
use runwith_exec::{InterpreterRunner, JobGroup, LocalRunner, SchedulerRunner};
use runwith_model::{BoundCall, SchedulerOptions};
use runwith_observe::{LoggerConfig, init_logger};

const ENV_WORK_ROOT: &str = "RUNWITH_WORK_ROOT";
const ENV_SLURM_OPTIONS: &str = "RUNWITH_SLURM_OPTIONS";

fn main() -> anyhow::Result<()> {
    // 1) logger, before any thread exists
    init_logger(&LoggerConfig::from_env()?)?;

    // 2) entry-worker mode
    let registry = jobs::registry()?;
    if let Some(outcome) = entry::dispatch_env(&registry, &JsonCodec) {
        return outcome.context("entry worker failed");
    }

    // 3) demo
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(demo())
}

async fn demo() -> anyhow::Result<()> {
    let cfg = MaterializerConfig {
        work_root: std::env::var_os(ENV_WORK_ROOT)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
        ..Default::default()
    };
    let materializer = Materializer::new(cfg);

    let local = LocalRunner::new(
        BoundCall::new("add").kwarg("a", 1).kwarg("b", 2),
        materializer.clone(),
    );
    let sum = local.run().await?;
    info!(call = %local.call(), result = %sum, "local job finished");

    let bash = InterpreterRunner::new(
        BoundCall::new("greet").kwarg("name", "cluster"),
        "bash",
        materializer.clone(),
    );
    let greeting = bash.run().await?;
    info!(call = %bash.call(), interpreter = bash.interpreter(), result = %greeting, "interpreter job finished");

    let Some(path) = std::env::var_os(ENV_SLURM_OPTIONS) else {
        info!("{ENV_SLURM_OPTIONS} not set, skipping scheduler demo");
        return Ok(());
    };
    let options = SchedulerOptions::from_file(&path)
        .with_context(|| format!("loading scheduler options from {}", PathBuf::from(&path).display()))?;

    let group: JobGroup = (1..=3)
        .map(|n| {
            SchedulerRunner::slurm(
                BoundCall::new("sum").arg(n).arg(n * 10),
                options.clone(),
                materializer.clone(),
            )
        })
        .collect();
    let ids = group.submit_all().await;
    let failed = ids.iter().filter(|id| id.is_failed()).count();
    if failed > 0 {
        warn!(failed, "some jobs were not submitted");
    }
    info!(ids = ?ids, "job group submitted; results are collected once the jobs finish");
    Ok(())
}
