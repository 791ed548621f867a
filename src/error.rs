// ============================================================================
// ERRORS - Fallos tipados del núcleo de sync offline
// ============================================================================

use std::time::Duration;
use thiserror::Error;

/// Fallos de persistencia local. Siempre fatales para la operación intentada.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("storage quota exceeded while writing '{key}'")]
    QuotaExceeded { key: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Fallos de la API remota. Dispatch y sync tratan todas las variantes como reintentables.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("rejected by server: {0}")]
    Rejected(String),

    #[error("decode error: {0}")]
    Decode(String),
}

/// Errores que ven los llamadores del núcleo de sync.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_converts_into_sync_error() {
        let err: SyncError = StorageError::QuotaExceeded {
            key: "stock_pending_actions".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "storage quota exceeded while writing 'stock_pending_actions'"
        );
    }

    #[test]
    fn api_error_messages_are_readable() {
        let err = ApiError::Http {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }
}
