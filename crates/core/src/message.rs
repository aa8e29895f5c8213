//! Conversation messages and content blocks.
//!
//! The grading loop speaks a content-block protocol: every message is an
//! ordered list of tagged blocks. Assistant turns may interleave text and
//! tool-call blocks; user turns carry text, images, and tool results.

use serde::{Deserialize, Serialize};

/// The role of a message sender in the conversation.
///
/// The system briefing travels as a top-level request field, not as a
/// message, so only two roles exist here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The caller (and the carrier of tool results)
    User,
    /// The model
    Assistant,
}

/// A single tagged content block.
///
/// Closed variant set: the wire format of the conversational API. Anything
/// the model sends outside these tags is a malformed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text { text: String },

    /// A base64-encoded image attachment.
    Image { media_type: String, data: String },

    /// The model requests execution of a tool.
    ToolCall {
        id: String,
        name: String,
        input: serde_json::Value,
    },

    /// The serialized result of one tool call, keyed to its call id.
    ToolResult { call_id: String, output: String },
}

impl ContentBlock {
    /// Shorthand for a text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// A single message in the conversation: a role plus ordered content blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// Create a user message from content blocks.
    pub fn user(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content,
        }
    }

    /// Create an assistant message from content blocks.
    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }

    /// Create a single-text-block message.
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// Concatenate all text blocks in block order.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Iterate the tool-call blocks in block order.
    pub fn tool_calls(&self) -> impl Iterator<Item = (&str, &str, &serde_json::Value)> {
        self.content.iter().filter_map(|b| match b {
            ContentBlock::ToolCall { id, name, input } => {
                Some((id.as_str(), name.as_str(), input))
            }
            _ => None,
        })
    }
}
