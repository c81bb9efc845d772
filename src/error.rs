use thiserror::Error;

/// Shown to the user for every provider failure, whatever the cause.
pub const FAILURE_MESSAGE: &str =
    "Error generating article. Please check your API key and try again.";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("unknown length category: {0:?}")]
    UnknownLengthCategory(String),

    #[error("a submission is already in flight")]
    SubmissionInFlight,

    #[error("provider call failed: {0}")]
    ProviderCallFailed(#[from] ProviderError),
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response contained no choices")]
    NoChoices,
}
