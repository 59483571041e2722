//! UI-agnostic conversation state
//!
//! This module contains the data structures the engine owns on behalf of a
//! chat session. Nothing here depends on a particular UI.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Maximum number of stored turns (ten user/assistant exchanges).
pub const HISTORY_LIMIT: usize = 20;

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// Per-session conversation state owned by the engine.
///
/// `history` only ever holds user and assistant turns. System instructions are
/// injected when a request is built and never stored here.
#[derive(Debug, Default)]
pub struct ConversationState {
    history: VecDeque<ChatMessage>,
    is_processing: bool,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn, dropping the oldest entries once the cap is exceeded.
    pub fn push(&mut self, message: ChatMessage) {
        self.history.push_back(message);
        while self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }
    }

    pub fn history(&self) -> impl Iterator<Item = &ChatMessage> {
        self.history.iter()
    }

    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.history.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    pub(crate) fn set_processing(&mut self, processing: bool) {
        self.is_processing = processing;
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_capped_and_keeps_order() {
        let mut state = ConversationState::new();
        for i in 0..HISTORY_LIMIT {
            state.push(ChatMessage::user(format!("turn {i}")));
        }
        assert_eq!(state.len(), HISTORY_LIMIT);

        state.push(ChatMessage::assistant("turn 20"));
        assert_eq!(state.len(), HISTORY_LIMIT);

        let contents: Vec<&str> = state.history().map(|m| m.content.as_str()).collect();
        assert_eq!(contents.first(), Some(&"turn 1"));
        assert_eq!(contents.last(), Some(&"turn 20"));
        for (offset, content) in contents.iter().enumerate() {
            assert_eq!(*content, format!("turn {}", offset + 1));
        }
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }

    #[test]
    fn clear_empties_history() {
        let mut state = ConversationState::new();
        state.push(ChatMessage::user("hello"));
        state.clear();
        assert!(state.is_empty());
    }
}
