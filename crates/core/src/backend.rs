//! ModelBackend trait — the abstraction over the language-model peer.
//!
//! A backend knows how to send a system briefing, the accumulated
//! conversation, and the tool catalog to a model and return the assistant's
//! content blocks. The grading loop calls `complete()` without knowing which
//! backend is behind it — pure polymorphism.

use crate::error::BackendError;
use crate::message::{ContentBlock, Message};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A tool declaration sent to the model so it knows what it may request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDeclaration {
    /// Unique tool name.
    pub name: String,

    /// Description of what the tool does.
    pub description: String,

    /// JSON Schema describing the tool's input shape.
    pub input_schema: serde_json::Value,
}

/// One complete request to the model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendRequest {
    /// The model to use.
    pub model: String,

    /// The system briefing, fixed for the whole invocation.
    pub system: String,

    /// The accumulated conversation.
    pub messages: Vec<Message>,

    /// The tool catalog the model may request from.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDeclaration>,

    /// Maximum tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// One complete response from the model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendResponse {
    /// The assistant's content blocks, in response order.
    pub content: Vec<ContentBlock>,

    /// Backend-reported stop reason, if any (e.g. "end_turn", "tool_use").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

impl BackendResponse {
    /// Whether the response contains any tool-call blocks.
    pub fn has_tool_calls(&self) -> bool {
        self.content
            .iter()
            .any(|b| matches!(b, ContentBlock::ToolCall { .. }))
    }
}

/// The model backend trait.
///
/// Implementations own their transport, authentication, and response parsing.
/// One call per loop iteration; the loop never retries.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// A human-readable name for this backend (e.g. "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get the complete assistant turn.
    async fn complete(
        &self,
        request: &BackendRequest,
    ) -> std::result::Result<BackendResponse, BackendError>;
}
