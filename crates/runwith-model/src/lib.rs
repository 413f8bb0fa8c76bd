mod domain;
pub use domain::JobId;

mod error;
pub use error::{ModelError, ModelResult};

mod call;
pub use call::{BoundCall, CallArgs};

mod options;
pub use options::{Directives, OptionValue, SchedulerOptions};
