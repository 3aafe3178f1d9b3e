use serde::Serialize;
use thiserror::Error;

/// Application error types for better error handling and user feedback.
///
/// Serialized with a `type`/`message` shape so a UI layer can match on the
/// kind without parsing the message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    /// Rejected user input (empty label, non-positive snooze delay)
    #[error("validation error: {0}")]
    Validation(String),
    /// The persisted collection could not be read or parsed
    #[error("storage read error: {0}")]
    StorageRead(String),
    /// The persisted collection could not be written
    #[error("storage write error: {0}")]
    StorageWrite(String),
    /// The notification host rejected a schedule request
    #[error("scheduling error: {0}")]
    Scheduling(String),
    /// The notification host refused or revoked notification permission
    #[error("notification permission denied: {0}")]
    PermissionDenied(String),
    /// An operation referenced a missing or already-terminal activity
    #[error("not found: {0}")]
    NotFound(String),
}

// Conversion to String for UI-facing return types
impl From<AppError> for String {
    fn from(error: AppError) -> Self {
        error.to_string()
    }
}

// Convenience constructors
impl AppError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn storage_read<S: Into<String>>(msg: S) -> Self {
        AppError::StorageRead(msg.into())
    }

    pub fn storage_write<S: Into<String>>(msg: S) -> Self {
        AppError::StorageWrite(msg.into())
    }

    pub fn scheduling<S: Into<String>>(msg: S) -> Self {
        AppError::Scheduling(msg.into())
    }

    pub fn permission_denied<S: Into<String>>(msg: S) -> Self {
        AppError::PermissionDenied(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        AppError::NotFound(msg.into())
    }
}

/// Result type alias for lifecycle operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::storage_read("file not found");
        assert_eq!(err.to_string(), "storage read error: file not found");
    }

    #[test]
    fn test_error_conversion_to_string() {
        let err = AppError::permission_denied("notifications disabled");
        let s: String = err.into();
        assert!(s.contains("permission denied"));
    }

    #[test]
    fn test_error_constructors() {
        let validation_err = AppError::validation("test");
        assert!(matches!(validation_err, AppError::Validation(_)));

        let not_found_err = AppError::not_found("test");
        assert!(matches!(not_found_err, AppError::NotFound(_)));
    }

    #[test]
    fn test_error_serialization() {
        let err = AppError::validation("label must not be empty");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("Validation"));
        assert!(json.contains("label must not be empty"));
    }
}
