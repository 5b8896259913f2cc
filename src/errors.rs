use std::error::Error as StdError;
use thiserror::Error;

/// Result type alias for BigPanda operations
pub type Result<T> = std::result::Result<T, BigPandaError>;

/// Errors that can occur when sending events to BigPanda
#[derive(Debug, Error)]
pub enum BigPandaError {
    /// Failed to build HTTP client
    #[error("Failed to build HTTP client: {0}")]
    BuildHttpClient(#[source] reqwest::Error),

    /// Base URL and endpoint do not form a valid URL
    #[error("Invalid request URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// HTTP request failed (connection error, timeout)
    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest_middleware::Error),

    /// Failed to serialize the payload
    #[error("Failed to serialize payload: {0}")]
    Serialize(#[source] serde_json::Error),

    /// BigPanda API returned a non-success response
    #[error("BigPanda API error: HTTP {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Alerts require an app key unless it is explicitly suppressed
    #[error("app_key is not set")]
    MissingAppKey,

    /// Batches may only contain alerts
    #[error("Batch mode is only supported for alerts")]
    BatchType,

    /// Batches must contain at least one alert
    #[error("Cannot send an empty batch")]
    EmptyBatch,

    /// An alert has no value for one of its identity attributes
    #[error("Alert is missing a value for identity attribute `{attr}`")]
    MissingIdentity {
        /// Name of the missing attribute
        attr: String,
    },
}

impl BigPandaError {
    /// Check if the error is retryable
    ///
    /// The client never retries on its own. This is exposed for callers that
    /// wrap it with their own retry policy.
    ///
    /// Returns `true` for:
    /// - Network/connection errors
    /// - Timeout errors
    /// - Server errors (5xx status codes)
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(source) => {
                if let reqwest_middleware::Error::Reqwest(err) = source {
                    return err.is_connect() || err.is_timeout();
                }
                if let Some(inner) = StdError::source(source) {
                    if let Some(err) = inner.downcast_ref::<reqwest::Error>() {
                        return err.is_connect() || err.is_timeout();
                    }
                }
                false
            }
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether the error was raised locally before any network call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingAppKey
                | Self::BatchType
                | Self::EmptyBatch
                | Self::MissingIdentity { .. }
                | Self::InvalidUrl { .. }
        )
    }
}
