pub mod ai;
pub mod config;
pub mod credential;
pub mod crisis;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod prompt;
pub mod state;

#[cfg(test)]
mod test_utils;

// Re-export main types for convenience
pub use ai::{ChatTransport, CompletionClient, OpenAIClient, RetryPolicy};
pub use config::Config;
pub use credential::{Credential, SetupError};
pub use crisis::{detect_crisis, CrisisResource, CRISIS_RESOURCES};
pub use engine::{Engine, FollowUp, Reply, ReplySource};
pub use error::{CompletionError, EngineError, FailureKind};
pub use fallback::{classify, Category};
pub use state::{ChatMessage, ChatRole, ConversationState};
