use thiserror::Error;

/// Failures of a single search request
#[derive(Debug, Error)]
pub enum ScoutError {
    /// Missing or malformed filter input; no session is started
    #[error("{0}")]
    Validation(String),

    /// Navigation or the results wait failed (includes timeouts)
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The automation engine could not open or read the page
    #[error("browser error: {0}")]
    Browser(String),

    /// The site served a bot challenge instead of results
    #[error("Received CAPTCHA")]
    ChallengeDetected,

    /// The blocking session task could not be joined
    #[error("session task failed: {0}")]
    Session(String),
}

impl ScoutError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
