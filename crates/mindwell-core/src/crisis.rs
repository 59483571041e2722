//! Crisis keyword detection and the hotline resource list.

/// Phrases that route a message to the crisis path. Already lowercase.
pub const CRISIS_KEYWORDS: &[&str] = &[
    "suicide",
    "kill myself",
    "end it all",
    "hurt myself",
    "self harm",
    "self-harm",
    "cutting",
    "overdose",
    "want to die",
    "no point living",
    "better off dead",
    "harm myself",
    "end my life",
    "cant go on",
    "give up on life",
    "nothing matters",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrisisResource {
    pub name: &'static str,
    pub number: &'static str,
    pub description: &'static str,
    pub region: &'static str,
}

pub const CRISIS_RESOURCES: &[CrisisResource] = &[
    CrisisResource {
        name: "988 Suicide & Crisis Lifeline",
        number: "988",
        description: "24/7 confidential support - Call or text",
        region: "US",
    },
    CrisisResource {
        name: "Crisis Text Line",
        number: "741741",
        description: "Text HOME to 741741",
        region: "US",
    },
    CrisisResource {
        name: "Tele-MANAS",
        number: "14416",
        description: "Mental health support, Government helpline",
        region: "India",
    },
    CrisisResource {
        name: "KIRAN Mental Health",
        number: "1800-599-0019",
        description: "24/7 support in 13 languages",
        region: "India",
    },
];

/// True when the message contains any crisis phrase, ignoring case.
///
/// Plain substring containment, so "cutting" also matches "cutting class".
pub fn detect_crisis(message: &str) -> bool {
    let lower = message.to_lowercase();
    CRISIS_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// The block of hotline numbers sent after a crisis reply.
pub fn resources_message() -> String {
    let mut message = String::from("Here are immediate crisis resources:\n\n");
    for resource in CRISIS_RESOURCES {
        message.push_str(&format!(
            "📞 {}: {}\n{}\n\n",
            resource.name, resource.number, resource.description
        ));
    }
    message.push_str(
        "Please reach out to one of these resources right away. You don't have to go through this alone. ❤️",
    );
    message
}
