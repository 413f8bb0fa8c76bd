use std::{fs::File, io::Read, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Directives, ModelError, ModelResult, OptionValue};

/// Declares the directive table.
///
/// Each entry is `field: kind => "directive-name"`; the directive name is the
/// scheduler's long option and doubles as the key in options files.
macro_rules! scheduler_options {
    (@ty text) => { String };
    (@ty int) => { i64 };
    (@ty flag) => { bool };

    ($( $(#[$doc:meta])* $field:ident : $kind:ident => $directive:literal, )*) => {
        /// Flat table of batch-scheduler directives.
        ///
        /// Every field is independently optional. Unset fields never reach the scheduler:
        /// [`SchedulerOptions::to_mapping`] emits only what was explicitly provided.
        /// No cross-field validation is done here; conflicting directives are left
        /// for the scheduler to reject.
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(deny_unknown_fields)]
        pub struct SchedulerOptions {
            $(
                $(#[$doc])*
                #[serde(rename = $directive, default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<scheduler_options!(@ty $kind)>,
            )*
        }

        impl SchedulerOptions {
            /// Every recognized directive name, in declaration order.
            pub const DIRECTIVES: &'static [&'static str] = &[$($directive),*];

            /// Filtered `directive -> value` mapping of the set fields.
            pub fn to_mapping(&self) -> Directives {
                let mut out = Directives::new();
                $(
                    if let Some(v) = &self.$field {
                        out.insert($directive, OptionValue::from(v.clone()));
                    }
                )*
                out
            }
        }
    };
}

scheduler_options! {
    /// Charge resources to this account.
    account: text => "account",
    acctg_freq: text => "acctg-freq",
    /// Job array index specification, e.g. `0-15%4`.
    array: text => "array",
    batch: text => "batch",
    bb: text => "bb",
    bbf: text => "bbf",
    /// Deferred start time.
    begin: text => "begin",
    /// Working directory of the batch script.
    chdir: text => "chdir",
    cluster_constraint: text => "cluster-constraint",
    clusters: text => "clusters",
    comment: text => "comment",
    constraint: text => "constraint",
    container: text => "container",
    container_id: text => "container-id",
    contiguous: flag => "contiguous",
    core_spec: int => "core-spec",
    cores_per_socket: int => "cores-per-socket",
    cpu_freq: text => "cpu-freq",
    cpus_per_gpu: int => "cpus-per-gpu",
    cpus_per_task: int => "cpus-per-task",
    deadline: text => "deadline",
    delay_boot: int => "delay-boot",
    /// Dependency expression, e.g. `afterok:1234`.
    dependency: text => "dependency",
    distribution: text => "distribution",
    /// Path pattern for the job's stderr.
    error: text => "error",
    exclude: text => "exclude",
    exclusive: text => "exclusive",
    export: text => "export",
    export_file: text => "export-file",
    extra: text => "extra",
    extra_node_info: text => "extra-node-info",
    get_user_env: text => "get-user-env",
    gid: text => "gid",
    gpu_bind: text => "gpu-bind",
    gpu_freq: text => "gpu-freq",
    /// Total GPUs for the job, optionally typed (`a100:2`).
    gpus: text => "gpus",
    gpus_per_node: text => "gpus-per-node",
    gpus_per_socket: text => "gpus-per-socket",
    gpus_per_task: text => "gpus-per-task",
    gres: text => "gres",
    gres_flags: text => "gres-flags",
    /// Submit in held state.
    hold: flag => "hold",
    ignore_pbs: flag => "ignore-pbs",
    input: text => "input",
    job_name: text => "job-name",
    kill_on_invalid_dep: text => "kill-on-invalid-dep",
    licenses: text => "licenses",
    mail_type: text => "mail-type",
    mail_user: text => "mail-user",
    mcs_label: text => "mcs-label",
    /// Memory per node, e.g. `1000M`.
    mem: text => "mem",
    mem_bind: text => "mem-bind",
    mem_per_cpu: text => "mem-per-cpu",
    mem_per_gpu: text => "mem-per-gpu",
    mincpus: int => "mincpus",
    network: text => "network",
    nice: int => "nice",
    no_kill: flag => "no-kill",
    no_requeue: flag => "no-requeue",
    nodefile: text => "nodefile",
    nodelist: text => "nodelist",
    /// Node count or range (`2`, `2-4`).
    nodes: text => "nodes",
    ntasks: int => "ntasks",
    ntasks_per_core: int => "ntasks-per-core",
    ntasks_per_gpu: int => "ntasks-per-gpu",
    ntasks_per_node: int => "ntasks-per-node",
    ntasks_per_socket: int => "ntasks-per-socket",
    open_mode: text => "open-mode",
    /// Path pattern for the job's stdout.
    output: text => "output",
    overcommit: flag => "overcommit",
    partition: text => "partition",
    power: text => "power",
    prefer: text => "prefer",
    priority: text => "priority",
    profile: text => "profile",
    propagate: text => "propagate",
    qos: text => "qos",
    quiet: flag => "quiet",
    reboot: flag => "reboot",
    requeue: flag => "requeue",
    reservation: text => "reservation",
    signal: text => "signal",
    sockets_per_node: int => "sockets-per-node",
    spread_job: flag => "spread-job",
    switches: text => "switches",
    test_only: flag => "test-only",
    thread_spec: int => "thread-spec",
    threads_per_core: int => "threads-per-core",
    /// Wall-clock limit, e.g. `1:00:00`.
    time: text => "time",
    time_min: text => "time-min",
    tmp: text => "tmp",
    tres_per_task: text => "tres-per-task",
    uid: text => "uid",
    use_min_nodes: flag => "use-min-nodes",
    verbose: flag => "verbose",
    wait: flag => "wait",
    wait_all_nodes: int => "wait-all-nodes",
    wckey: text => "wckey",
    wrap: text => "wrap",
}

impl SchedulerOptions {
    /// Create options with every directive unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from a `directive -> value` JSON object.
    ///
    /// Keys may also be spelled with underscores (`cpus_per_task`); two keys that
    /// name the same directive are a conflict. Unknown directive names and
    /// mistyped values are rejected.
    pub fn from_mapping(map: Map<String, Value>) -> ModelResult<Self> {
        let mut normalized = Map::with_capacity(map.len());
        for (key, value) in map {
            let directive = key.replace('_', "-");
            if normalized.contains_key(&directive) {
                return Err(ModelError::InvalidOptions(format!(
                    "'{key}' sets directive '{directive}' more than once"
                )));
            }
            normalized.insert(directive, value);
        }
        serde_json::from_value(Value::Object(normalized))
            .map_err(|e| ModelError::InvalidOptions(e.to_string()))
    }

    /// Read options from a JSON document whose top-level keys are directive names.
    pub fn from_reader<R: Read>(reader: R) -> ModelResult<Self> {
        let map: Map<String, Value> =
            serde_json::from_reader(reader).map_err(|e| ModelError::InvalidOptions(e.to_string()))?;
        Self::from_mapping(map)
    }

    /// Read options from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> ModelResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Returns `true` if no directive is set.
    pub fn is_empty(&self) -> bool {
        self.to_mapping().is_empty()
    }
}
