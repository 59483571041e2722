//! The conversation engine.
//!
//! One engine per chat session. It owns the history and the session key,
//! routes crisis messages, and turns every failed request into something the
//! user can still read. The UI holds it behind an `Arc` and calls
//! [`Engine::submit`]; a second submission while one is in flight is refused.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{info, warn};

use crate::ai::{ChatTransport, CompletionClient, OpenAIClient};
use crate::config::Config;
use crate::credential::{Credential, SetupError};
use crate::crisis::{detect_crisis, resources_message};
use crate::error::{EngineError, FailureKind};
use crate::fallback::{fallback_reply, Category};
use crate::prompt::{crisis_transcript, standard_transcript};
use crate::state::{ChatMessage, ConversationState};

/// Pause before the resource list when the model answered the crisis message.
pub const RESOURCES_DELAY: Duration = Duration::from_millis(2000);
/// Pause before the resource list after the canned crisis reply.
pub const RESOURCES_DELAY_AFTER_FALLBACK: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    /// Text produced by the model.
    Assistant,
    /// Canned text after the request failed.
    Fallback(FailureKind),
    /// Model reply to a crisis message.
    CrisisAssistant,
    /// Canned crisis reply after the request failed.
    CrisisFallback(FailureKind),
}

/// A second bot message the UI should show once `delay` has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUp {
    pub delay: Duration,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
    pub follow_up: Option<FollowUp>,
}

impl Reply {
    pub fn is_fallback(&self) -> bool {
        matches!(
            self.source,
            ReplySource::Fallback(_) | ReplySource::CrisisFallback(_)
        )
    }
}

pub struct Engine<T> {
    client: CompletionClient<T>,
    state: Mutex<ConversationState>,
    credential: Mutex<Credential>,
}

impl Engine<OpenAIClient> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(CompletionClient::from_config(
            OpenAIClient::from_config(config),
            config,
        ))
    }
}

impl<T: ChatTransport> Engine<T> {
    pub fn new(client: CompletionClient<T>) -> Self {
        Self {
            client,
            state: Mutex::new(ConversationState::new()),
            credential: Mutex::new(Credential::default()),
        }
    }

    pub fn client(&self) -> &CompletionClient<T> {
        &self.client
    }

    /// True once a key is held for this session; the UI enables input on it.
    pub fn is_ready(&self) -> bool {
        lock(&self.credential).is_configured()
    }

    pub fn is_processing(&self) -> bool {
        lock(&self.state).is_processing()
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        lock(&self.state).snapshot()
    }

    /// Accept a key without checking it, e.g. one supplied by the environment.
    pub fn set_credential(&self, key: impl Into<String>) {
        *lock(&self.credential) = Credential::new(key);
    }

    pub fn forget_credential(&self) {
        lock(&self.credential).clear();
    }

    /// Check a key against the endpoint and keep it only if the check passes.
    pub async fn configure(&self, key: &str) -> Result<(), SetupError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(SetupError::EmptyKey);
        }

        self.client.probe(key).await?;
        self.set_credential(key);
        info!("API key accepted for this session");
        Ok(())
    }

    /// Start over with an empty history. The key is kept.
    pub fn reset(&self) {
        lock(&self.state).clear();
    }

    /// Answer one user message.
    ///
    /// Blank input is ignored and yields `Ok(None)`.
    pub async fn submit(&self, text: &str) -> Result<Option<Reply>, EngineError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let key = lock(&self.credential)
            .key()
            .map(str::to_string)
            .ok_or(EngineError::NotConfigured)?;

        let _processing = ProcessingGuard::acquire(&self.state)?;

        let reply = if detect_crisis(text) {
            self.answer_crisis(&key, text).await
        } else {
            self.answer(&key, text).await
        };
        Ok(Some(reply))
    }

    async fn answer(&self, key: &str, text: &str) -> Reply {
        let transcript = {
            let mut state = lock(&self.state);
            let transcript = standard_transcript(state.history(), text);
            state.push(ChatMessage::user(text));
            transcript
        };

        match self.client.complete(key, transcript).await {
            Ok(answer) => {
                lock(&self.state).push(ChatMessage::assistant(answer.clone()));
                Reply {
                    text: answer,
                    source: ReplySource::Assistant,
                    follow_up: None,
                }
            }
            Err(err) => {
                let kind = err.kind();
                info!(?kind, "answering with fallback text");
                Reply {
                    text: fallback_reply(kind, text),
                    source: ReplySource::Fallback(kind),
                    follow_up: None,
                }
            }
        }
    }

    async fn answer_crisis(&self, key: &str, text: &str) -> Reply {
        info!("crisis language detected, using crisis instructions");
        let result = self.client.complete(key, crisis_transcript(text)).await;

        let mut state = lock(&self.state);
        state.push(ChatMessage::user(text));

        match result {
            Ok(answer) => {
                state.push(ChatMessage::assistant(answer.clone()));
                Reply {
                    text: answer,
                    source: ReplySource::CrisisAssistant,
                    follow_up: Some(FollowUp {
                        delay: RESOURCES_DELAY,
                        text: resources_message(),
                    }),
                }
            }
            Err(err) => {
                warn!(error = %err, "crisis request failed, sending canned crisis reply");
                Reply {
                    text: Category::Crisis.response().to_string(),
                    source: ReplySource::CrisisFallback(err.kind()),
                    follow_up: Some(FollowUp {
                        delay: RESOURCES_DELAY_AFTER_FALLBACK,
                        text: resources_message(),
                    }),
                }
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the processing flag for one submission and clears it on drop.
struct ProcessingGuard<'a> {
    state: &'a Mutex<ConversationState>,
}

impl<'a> ProcessingGuard<'a> {
    fn acquire(state: &'a Mutex<ConversationState>) -> Result<Self, EngineError> {
        let mut guard = lock(state);
        if guard.is_processing() {
            return Err(EngineError::AlreadyProcessing);
        }
        guard.set_processing(true);
        Ok(Self { state })
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        lock(self.state).set_processing(false);
    }
}
