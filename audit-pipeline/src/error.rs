//! Audit error types.
//!
//! Data-quality problems (missing counts, negative stock, outliers) are
//! classification outputs, not errors. Only genuine faults land here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error at line {line}: {source}")]
    CsvRow {
        line: usize,
        #[source]
        source: csv::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid config value for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Unrecognized timestamp '{value}' at line {line}")]
    InvalidTimestamp { line: usize, value: String },

    #[error("Daily consumption rate for item {item_id} is {rate}; days on hand is undefined")]
    InvalidConsumptionRate { item_id: String, rate: f64 },
}

/// Result type alias for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;

impl AuditError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        AuditError::Io {
            path: path.into(),
            source,
        }
    }
}
