//! Error types for the conversation engine and completion client.

/// Failure classification for a single completion request.
///
/// The variant alone decides whether a retry is worthwhile, see
/// [`CompletionError::is_retryable`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    /// The endpoint rejected the credential (HTTP 401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Too many requests (HTTP 429).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The endpoint failed on its side (HTTP 5xx).
    #[error("server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// Any other status, or a response body we could not understand.
    #[error("unexpected response: {0}")]
    Unknown(String),
}

/// Fieldless mirror of [`CompletionError`] used to pick user-facing wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Unauthorized,
    RateLimited,
    ServerError,
    Network,
    Unknown,
}

impl CompletionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Unauthorized(_) => FailureKind::Unauthorized,
            Self::RateLimited(_) => FailureKind::RateLimited,
            Self::ServerError { .. } => FailureKind::ServerError,
            Self::Network(_) => FailureKind::Network,
            Self::Unknown(_) => FailureKind::Unknown,
        }
    }

    /// Only rate limits and transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), FailureKind::RateLimited | FailureKind::Network)
    }
}

/// Reasons the engine refuses a submission outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// No API key has been configured for this session.
    #[error("the assistant is not configured yet - add an API key first")]
    NotConfigured,

    /// A previous message is still being answered.
    #[error("still answering the previous message")]
    AlreadyProcessing,
}
