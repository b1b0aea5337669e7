pub mod config;
pub mod error;
pub mod frame;
pub mod record;

pub use config::LogscopeConfig;
pub use error::LogscopeError;
pub use frame::{Column, DType, Frame, Value};
pub use record::AccessRecord;

/// Convenience alias used across the workspace libraries.
pub type Result<T> = std::result::Result<T, LogscopeError>;
