//! Inbound payload and reply types for the relay endpoint.
//!
//! The relay forwards the validated payload to the upstream verbatim, so
//! the serde encoding here is exactly the wire shape on both legs.

use serde::{Deserialize, Serialize};

/// One typed block inside a message's content array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Block kind, `"text"` for plain text.
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl ContentBlock {
    /// A plain text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}

/// A single chat message: a role plus an ordered sequence of content blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Vec<ContentBlock>,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: vec![ContentBlock::text(text)],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new("user", text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new("system", text)
    }
}

/// The full relay payload. Every field is required; axum's Json extractor
/// rejects anything that does not deserialize before the handler runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayPayload {
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

/// Success reply: the generated text, nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayReply {
    pub content: String,
}
