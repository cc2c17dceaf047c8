use crate::storage::StorageError;
use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// A report or snapshot id that does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Backup text that cannot be parsed
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Parsed data or caller input that fails structural checks
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Key-value backend failures
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Check if error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// Check if error came from the storage backend
    pub fn is_storage_error(&self) -> bool {
        matches!(self, AppError::Storage(_))
    }

    /// Stable short tag for the presentation layer to pick a message by
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::MalformedInput(_) => "malformed_input",
            AppError::ValidationFailed(_) => "validation_failed",
            AppError::Storage(_) => "storage",
            AppError::Serialization(_) => "serialization",
            AppError::Config(_) => "config",
        }
    }
}

/// Convenience function to convert Option<T> to Result<T, AppError>
pub fn option_to_result<T>(opt: Option<T>, error_msg: &str) -> AppResult<T> {
    opt.ok_or_else(|| AppError::NotFound(error_msg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(AppError::NotFound("r".into()).kind(), "not_found");
        assert_eq!(AppError::MalformedInput("x".into()).kind(), "malformed_input");
        assert_eq!(AppError::ValidationFailed("x".into()).kind(), "validation_failed");
        assert!(AppError::Storage(StorageError::Unavailable("down".into())).is_storage_error());
    }

    #[test]
    fn test_option_to_result() {
        let found: AppResult<u8> = option_to_result(Some(1), "missing");
        assert_eq!(found.unwrap(), 1);

        let missing: AppResult<u8> = option_to_result(None, "Report abc");
        assert!(missing.unwrap_err().is_not_found());
    }
}
