//! Session-scoped API key.

use std::fmt;

use crate::error::CompletionError;

/// The key held for the current session. Never written to disk.
#[derive(Clone, Default)]
pub struct Credential {
    key: Option<String>,
}

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn clear(&mut self) {
        self.key = None;
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("configured", &self.is_configured())
            .finish()
    }
}

/// Why a key was not accepted during setup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("no API key entered")]
    EmptyKey,

    #[error("API key check failed: {0}")]
    Probe(#[from] CompletionError),
}

impl SetupError {
    /// Status line for the setup screen.
    pub fn status_message(&self) -> String {
        match self {
            SetupError::EmptyKey => "Please enter your OpenAI API key".to_string(),
            SetupError::Probe(CompletionError::Network(_)) => {
                "Network error. Please check your internet connection and try again.".to_string()
            }
            SetupError::Probe(err) => {
                let reason = match err {
                    CompletionError::Unauthorized(_) => {
                        "Invalid API key. Please check your key and try again.".to_string()
                    }
                    CompletionError::RateLimited(_) => {
                        "Rate limit exceeded. Please try again in a moment.".to_string()
                    }
                    CompletionError::ServerError { .. } => {
                        "OpenAI service is temporarily unavailable.".to_string()
                    }
                    CompletionError::Unknown(message) | CompletionError::Network(message) => {
                        format!("Error: {message}")
                    }
                };
                format!("API connection failed. {reason}")
            }
        }
    }
}
