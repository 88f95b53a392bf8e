pub mod errors;
pub mod id;

pub use errors::{BindingError, EngineError, ScriptError};
pub use id::CorrelationId;

pub type Result<T> = std::result::Result<T, BindingError>;
