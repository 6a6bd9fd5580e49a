/// Why a sync step failed. Only [`SyncError::Network`] is worth retrying.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Transport failure or a 5xx answer.
    #[error("network error: {0}")]
    Network(String),
    /// 4xx answer or a body that does not decode.
    #[error("resolver rejected the request: {message}")]
    ApiResponse {
        status: Option<u16>,
        message: String,
    },
    #[error("sync cancelled")]
    Cancelled,
    #[error("local storage failed: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retry {
    Retryable,
    Fatal,
}

impl SyncError {
    pub fn classify(&self) -> Retry {
        match self {
            Self::Network(_) => Retry::Retryable,
            Self::ApiResponse { .. } | Self::Cancelled | Self::Storage(_) => Retry::Fatal,
        }
    }

    pub fn api_response(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::ApiResponse {
            status,
            message: message.into(),
        }
    }

    pub fn storage(e: &anyhow::Error) -> Self {
        Self::Storage(format!("{e:#}"))
    }
}
