//! Error types for the wireframe converter

use thiserror::Error;

/// One store record whose JSON columns could not be decoded.
///
/// Collected during normalization instead of aborting the whole document.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Record decode error in {table} (id {record_id}): {message}")]
pub struct RecordDecodeError {
    pub table: String,
    pub record_id: String,
    pub message: String,
}

impl RecordDecodeError {
    pub fn new(
        table: impl Into<String>,
        record_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            record_id: record_id.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConverterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Cannot open wireframe store {path}: {message}")]
    StoreUnavailable { path: String, message: String },

    #[error("Schema mismatch in table {table}: {message}")]
    SchemaMismatch { table: String, message: String },

    #[error(transparent)]
    RecordDecode(#[from] RecordDecodeError),

    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Refusing to overwrite existing file: {path}")]
    WriteConflict { path: String },

    #[error("Document '{name}' could not be converted: {message}")]
    Document { name: String, message: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },
}

pub type Result<T> = std::result::Result<T, ConverterError>;

impl ConverterError {
    pub fn store_unavailable(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn schema_mismatch(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            table: table.into(),
            message: message.into(),
        }
    }

    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn document(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Document {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn write_conflict(path: impl Into<String>) -> Self {
        Self::WriteConflict { path: path.into() }
    }

    /// Whether the error only skips one record, document or file.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::RecordDecode(_) | Self::WriteConflict { .. } | Self::Document { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(ConverterError::write_conflict("a.ui").is_recoverable());
        assert!(ConverterError::document("Home", "bad controls").is_recoverable());
        assert!(ConverterError::from(RecordDecodeError::new("BRANCHES", "1", "eof")).is_recoverable());
        assert!(!ConverterError::store_unavailable("x.bmpr", "missing").is_recoverable());
        assert!(!ConverterError::schema_mismatch("INFO", "no such table").is_recoverable());
        assert!(!ConverterError::parse("doc.json", "eof").is_recoverable());
    }

    #[test]
    fn test_record_decode_message() {
        let err = RecordDecodeError::new("RESOURCES", "r-1", "expected value");
        assert_eq!(
            err.to_string(),
            "Record decode error in RESOURCES (id r-1): expected value"
        );
    }
}
