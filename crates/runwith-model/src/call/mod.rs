mod args;
pub use args::CallArgs;

mod bound;
pub use bound::BoundCall;
