//! Error taxonomy for the generation lifecycle.

/// Text shown when a prompt is empty or whitespace-only.
pub const EMPTY_PROMPT_MESSAGE: &str = "Please enter a prompt to generate a video.";

/// Errors that can occur while generating a video.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Rejected locally before any remote call.
    #[error("{0}")]
    Validation(String),

    #[error("API key not configured")]
    MissingApiKey,

    /// The service rejected the submit or poll call.
    #[error("Request failed with status {status}: {body}")]
    Request {
        /// HTTP status code returned by the service
        status: u16,
        /// Raw response body, usually a JSON error object
        body: String,
    },

    /// Polling gave up after the configured number of consecutive failures.
    #[error("Polling failed after {attempts} consecutive attempts: {last}")]
    PollFailed {
        /// Number of consecutive failed polls
        attempts: u32,
        /// Message of the last poll failure
        last: String,
    },

    #[error("Video generation failed: No download link found in the final response.")]
    MissingResult,

    /// The operation completed but the service reported an error object.
    #[error("{0}")]
    Operation(String),

    #[error("Failed to download video. Status: {status}. {body}")]
    Download {
        /// HTTP status code of the download response
        status: u16,
        /// Response body text
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generation timed out")]
    Timeout,

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl GenerationError {
    /// Whether a failed poll should be retried on the next tick.
    ///
    /// Local validation and credential problems can never succeed on retry;
    /// everything coming back from the wire is treated as transient.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            GenerationError::Validation(_) | GenerationError::MissingApiKey
        )
    }
}
