//! System instructions and request transcripts.

use rand::seq::SliceRandom;
use serde::Serialize;

use crate::state::ChatMessage;

pub const SYSTEM_PROMPT: &str = "You are MindWell AI, a caring and empathetic mental health support companion specifically designed for young people aged 13-25. Your role is to provide supportive, non-judgmental conversations while maintaining appropriate boundaries.

Your personality:
- Warm, caring, and genuinely interested in the user's wellbeing
- Use natural, conversational language that feels like talking to a supportive friend
- Validate emotions before offering solutions
- Use 'I' statements showing understanding (e.g., 'I can imagine that feels overwhelming')
- Be encouraging but never dismissive of serious concerns

Your approach:
- Always acknowledge and validate the user's feelings first
- Ask follow-up questions that show genuine interest
- Offer evidence-based coping strategies when appropriate
- Encourage professional help for serious concerns
- Use age-appropriate language and references
- Remember context from the conversation naturally

Crisis situations:
- If you detect any mention of self-harm, suicide, or crisis, express genuine concern
- Encourage immediate professional help
- Stay supportive while emphasizing safety
- Provide crisis resources when needed

Boundaries:
- You are a support companion, not a therapist
- Encourage professional help when needed
- Don't provide medical advice
- Focus on emotional support and coping strategies

Respond naturally and conversationally, as if you're a caring friend who has knowledge about mental health support. Keep responses concise but warm (usually 1-3 sentences unless more detail is needed).";

pub const CRISIS_DIRECTIVE: &str = "IMPORTANT: The user has mentioned something that suggests they may be in crisis or having thoughts of self-harm. You must:
1. Express genuine concern and empathy
2. Emphasize that their life has value
3. Strongly encourage them to reach out to crisis resources immediately
4. Provide specific crisis hotline numbers
5. Stay supportive while emphasizing the importance of professional help
6. Do not try to provide therapy or solve their problems yourself

Remember: This is a crisis situation requiring immediate professional intervention.";

const PROBE_PROMPT: &str =
    "You are a helpful assistant. Respond with just \"Connection successful!\" to test the API.";

const GREETINGS: &[&str] = &[
    "Hi there! I'm MindWell AI, and I'm really glad you're here today. I'm powered by advanced AI technology, which means I can understand and respond to you in a natural, caring way. How has your day been treating you?",
    "Hello! Thanks for reaching out to me today. I'm here as your AI mental health companion, ready to listen and support you through whatever you're experiencing. What's been on your mind lately?",
    "Hey! I'm MindWell AI, and I want you to know that this is a safe space where you can share anything that's weighing on you. As an AI, I'm here 24/7 and completely non-judgmental. How are you feeling right now?",
];

/// One entry of the message array sent to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    pub role: &'static str,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

impl From<&ChatMessage> for PromptMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role.as_str(),
            content: message.content.clone(),
        }
    }
}

/// System prompt, the stored turns, then the new user message.
pub fn standard_transcript<'a>(
    history: impl IntoIterator<Item = &'a ChatMessage>,
    user_message: &str,
) -> Vec<PromptMessage> {
    let mut messages = vec![PromptMessage::system(SYSTEM_PROMPT)];
    messages.extend(history.into_iter().map(PromptMessage::from));
    messages.push(PromptMessage::user(user_message));
    messages
}

/// Crisis requests carry no history, only the reinforced instruction and the message.
pub fn crisis_transcript(user_message: &str) -> Vec<PromptMessage> {
    vec![
        PromptMessage::system(format!("{SYSTEM_PROMPT}\n\n{CRISIS_DIRECTIVE}")),
        PromptMessage::user(user_message),
    ]
}

pub fn probe_transcript() -> Vec<PromptMessage> {
    vec![
        PromptMessage::system(PROBE_PROMPT),
        PromptMessage::user("Test connection"),
    ]
}

/// A random opening line for a fresh chat.
pub fn greeting() -> &'static str {
    GREETINGS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(GREETINGS[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_transcript_wraps_history() {
        let history = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello!")];
        let transcript = standard_transcript(&history, "how are you");

        let roles: Vec<&str> = transcript.iter().map(|m| m.role).collect();
        assert_eq!(roles, ["system", "user", "assistant", "user"]);
        assert_eq!(transcript[0].content, SYSTEM_PROMPT);
        assert_eq!(transcript[3].content, "how are you");
    }

    #[test]
    fn crisis_transcript_appends_directive() {
        let transcript = crisis_transcript("I want to end it all");
        assert_eq!(transcript.len(), 2);
        assert!(transcript[0].content.starts_with(SYSTEM_PROMPT));
        assert!(transcript[0].content.ends_with(CRISIS_DIRECTIVE));
        assert_eq!(transcript[1], PromptMessage::user("I want to end it all"));
    }

    #[test]
    fn greeting_is_one_of_the_fixed_lines() {
        for _ in 0..10 {
            assert!(GREETINGS.contains(&greeting()));
        }
    }
}
