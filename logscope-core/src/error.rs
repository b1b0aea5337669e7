use thiserror::Error;

/// Unified error type for logscope.
#[derive(Error, Debug)]
pub enum LogscopeError {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Column already exists: {0}")]
    ColumnExists(String),

    #[error("Length mismatch for column {column}: expected {expected}, got {actual}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Column {column} has unsupported type {dtype} for {operation}")]
    InvalidColumnType {
        column: String,
        dtype: String,
        operation: &'static str,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Geo lookup error: {0}")]
    Geo(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl LogscopeError {
    /// Process exit code for the binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            LogscopeError::Config(_) => 2,
            LogscopeError::Io(_) => 74,
            _ => 1,
        }
    }
}
