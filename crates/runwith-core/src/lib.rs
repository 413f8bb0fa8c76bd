pub mod assets;
pub mod codec;
pub mod entry;
pub mod error;
pub mod materializer;
pub mod registry;
pub mod runner;
pub mod template;

pub mod prelude {
    pub use crate::assets::{AssetSet, IdGenerator, RandomIds};
    pub use crate::codec::{Codec, JsonCodec};
    pub use crate::error::CoreError;
    pub use crate::materializer::{Materializer, MaterializerConfig};
    pub use crate::registry::{CallError, FunctionRegistry};
    pub use crate::runner::{Runner, RunnerError};
    pub use crate::template::TemplatePair;
}
