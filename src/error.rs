// ⚠️ Ledger errors
// Every failure surfaces unchanged to whoever submitted the transaction

use thiserror::Error;

use crate::schema::ValidationError;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// A reference (or a registry lookup) names a record that does not exist
    #[error("{type_name} with identifier '{id}' does not exist")]
    NotFound { type_name: String, id: String },

    /// A record with the same identifier is already registered
    #[error("{type_name} with identifier '{id}' already exists")]
    Duplicate { type_name: String, id: String },

    #[error("Type not declared in schema: {0}")]
    UnknownType(String),

    #[error("No transaction handler registered for {0}")]
    UnknownTransaction(String),

    #[error("Invalid fully qualified name: {0}")]
    InvalidName(String),

    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Registry lock poisoned: {0}")]
    Poisoned(String),

    /// A persisted history whose hash chain does not verify
    #[error("Transaction history is corrupt: {0}")]
    CorruptHistory(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    pub fn not_found(type_name: impl ToString, id: impl Into<String>) -> Self {
        LedgerError::NotFound {
            type_name: type_name.to_string(),
            id: id.into(),
        }
    }

    pub fn duplicate(type_name: impl ToString, id: impl Into<String>) -> Self {
        LedgerError::Duplicate {
            type_name: type_name.to_string(),
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound { .. })
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, LedgerError::Duplicate { .. })
    }
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
