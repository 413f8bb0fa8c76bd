mod job_id;
pub use job_id::JobId;
