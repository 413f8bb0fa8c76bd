mod value;
pub use value::OptionValue;

mod directives;
pub use directives::Directives;

mod table;
pub use table::SchedulerOptions;
