//! Canned replies used when the completion endpoint cannot be reached.

use crate::crisis::detect_crisis;
use crate::error::FailureKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Anxiety,
    Sadness,
    Stress,
    Crisis,
    Default,
}

const ANXIETY_KEYWORDS: &[&str] = &["anxious", "anxiety", "worried"];
const SADNESS_KEYWORDS: &[&str] = &["sad", "depressed", "down"];
const STRESS_KEYWORDS: &[&str] = &["stress", "overwhelmed", "pressure"];

impl Category {
    pub fn response(&self) -> &'static str {
        match self {
            Category::Anxiety => "I can hear that anxiety is really weighing on you right now. It sounds like your mind might be racing with worry, which can be so exhausting. Would you like to try a breathing exercise together, or would you prefer to talk about what's making you feel anxious?",
            Category::Sadness => "I can feel the heaviness in what you're sharing. That kind of sadness can feel so overwhelming sometimes. It takes courage to reach out when you're feeling this way. What's been contributing to these feelings lately?",
            Category::Stress => "It sounds like you're dealing with a lot right now, and that feeling of being overwhelmed makes complete sense. When everything feels like too much, sometimes it helps to focus on just one small thing at a time. What's feeling most urgent for you today?",
            Category::Crisis => "I'm really concerned about what you've shared with me. Your safety and wellbeing are incredibly important. Please reach out to a crisis helpline right away - they have trained professionals who can provide the immediate support you need. You don't have to go through this alone.",
            Category::Default => "I'm here to listen and support you. It sounds like you're going through something challenging right now. Your feelings are valid, and it's okay to not be okay sometimes. Would you like to share more about what's on your mind, or would you prefer to try some coping techniques together?",
        }
    }
}

/// Pick a category by keyword. Checked in order: crisis, anxiety, sadness, stress.
pub fn classify(message: &str) -> Category {
    let lower = message.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    if detect_crisis(&lower) {
        Category::Crisis
    } else if mentions(ANXIETY_KEYWORDS) {
        Category::Anxiety
    } else if mentions(SADNESS_KEYWORDS) {
        Category::Sadness
    } else if mentions(STRESS_KEYWORDS) {
        Category::Stress
    } else {
        Category::Default
    }
}

/// Opening line explaining why a canned reply follows.
pub fn apology(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Unauthorized => {
            "There seems to be an issue with the API configuration. Please check your API key."
        }
        FailureKind::RateLimited => {
            "I'm experiencing high demand right now. Let me try to help with a thoughtful response."
        }
        FailureKind::Network => {
            "I'm having trouble connecting right now, but I'm still here for you."
        }
        FailureKind::ServerError | FailureKind::Unknown => {
            "I encountered a technical issue, but let me still try to support you."
        }
    }
}

/// Full fallback reply for a failed request: apology, blank line, canned text.
///
/// A credential problem is not about what the user said, so it always gets
/// the default text.
pub fn fallback_reply(kind: FailureKind, message: &str) -> String {
    let category = match kind {
        FailureKind::Unauthorized => Category::Default,
        _ => classify(message),
    };
    format!("{}\n\n{}", apology(kind), category.response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anxious_message_is_anxiety() {
        let category = classify("I feel so anxious about tomorrow");
        assert_eq!(category, Category::Anxiety);
        assert!(category.response().starts_with("I can hear that anxiety"));
    }

    #[test]
    fn plain_message_is_default() {
        assert_eq!(classify("just a normal message"), Category::Default);
    }

    #[test]
    fn categories_follow_priority_order() {
        assert_eq!(classify("I'm worried and sad"), Category::Anxiety);
        assert_eq!(classify("so DEPRESSED under all this pressure"), Category::Sadness);
        assert_eq!(classify("exams are stressing me out"), Category::Stress);
        assert_eq!(classify("anxious and want to die"), Category::Crisis);
    }

    #[test]
    fn unauthorized_fallback_ignores_message_content() {
        let reply = fallback_reply(FailureKind::Unauthorized, "I'm so anxious");
        assert!(reply.ends_with(Category::Default.response()));
        assert!(reply.starts_with("There seems to be an issue with the API configuration."));
    }

    #[test]
    fn network_fallback_uses_category_text() {
        let reply = fallback_reply(FailureKind::Network, "feeling down today");
        assert_eq!(
            reply,
            format!(
                "{}\n\n{}",
                apology(FailureKind::Network),
                Category::Sadness.response()
            )
        );
    }
}
