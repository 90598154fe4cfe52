use reqwest::StatusCode;
use thiserror::Error;

/// Retrieving a reply from the answer service failed.
///
/// Every variant is shown to the user the same way; the detail only ends up
/// in the log.
#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("could not reach the answer service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("answer service request failed with status: {0}")]
    Status(StatusCode),

    #[error("answer service returned a malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl AnswerError {
    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            AnswerError::Transport(_) => "transport",
            AnswerError::Status(_) => "status",
            AnswerError::Malformed(_) => "malformed",
        }
    }
}
