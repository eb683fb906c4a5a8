use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Authentication failed (wrong key or tampered ciphertext)")]
    Authentication,

    #[error("Malformed ciphertext: {0}")]
    MalformedInput(String),

    #[error("Corrupt database document: {0}")]
    CorruptData(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table already exists: {0}")]
    DuplicateTable(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Column '{column}' does not exist in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Row for table '{table}' is missing column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Encryption failed")]
    Encryption,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DbError {
    /// True for errors caused by caller input; retrying with corrected input
    /// can succeed. Everything else is fatal for the file or the operation.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            DbError::TableNotFound(_)
                | DbError::DuplicateTable(_)
                | DbError::InvalidSchema(_)
                | DbError::UnknownColumn { .. }
                | DbError::MissingColumn { .. }
                | DbError::InvalidKey(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
