//! Anthropic Messages API backend.
//!
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System briefing as a top-level field
//! - Native tool use with `tool_use` / `tool_result` content blocks
//! - Base64 image blocks for submission photos

use async_trait::async_trait;
use gradepilot_core::backend::{BackendRequest, BackendResponse, ModelBackend, ToolDeclaration};
use gradepilot_core::error::BackendError;
use gradepilot_core::message::{ContentBlock, Message, Role};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic native Messages API backend.
pub struct AnthropicBackend {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicBackend {
    /// Create a new backend handle. Construct once at process start and
    /// share by reference; the loop never builds its own.
    pub fn new(api_key: impl Into<String>) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .map_err(|e| BackendError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            name: "anthropic".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Use a custom base URL (testing, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Convert domain messages to Anthropic API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|msg| ApiMessage {
                role: match msg.role {
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                },
                content: msg.content.iter().map(to_api_block).collect(),
            })
            .collect()
    }

    fn to_api_tools(tools: &[ToolDeclaration]) -> Vec<ApiTool> {
        tools
            .iter()
            .map(|t| ApiTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.input_schema.clone(),
            })
            .collect()
    }

    /// Convert an API response into domain content blocks.
    fn parse_response(api: ApiResponse) -> Result<BackendResponse, BackendError> {
        let mut content = Vec::with_capacity(api.content.len());
        for block in api.content {
            match block {
                ApiResponseBlock::Text { text } => content.push(ContentBlock::Text { text }),
                ApiResponseBlock::ToolUse { id, name, input } => {
                    content.push(ContentBlock::ToolCall { id, name, input })
                }
                ApiResponseBlock::Other => {
                    // Thinking and future block types carry nothing the loop
                    // dispatches on.
                }
            }
        }
        Ok(BackendResponse {
            content,
            stop_reason: api.stop_reason,
        })
    }
}

fn to_api_block(block: &ContentBlock) -> serde_json::Value {
    match block {
        ContentBlock::Text { text } => serde_json::json!({
            "type": "text",
            "text": text,
        }),
        ContentBlock::Image { media_type, data } => serde_json::json!({
            "type": "image",
            "source": {
                "type": "base64",
                "media_type": media_type,
                "data": data,
            },
        }),
        ContentBlock::ToolCall { id, name, input } => serde_json::json!({
            "type": "tool_use",
            "id": id,
            "name": name,
            "input": input,
        }),
        ContentBlock::ToolResult { call_id, output } => serde_json::json!({
            "type": "tool_result",
            "tool_use_id": call_id,
            "content": output,
        }),
    }
}

#[async_trait]
impl ModelBackend for AnthropicBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        let url = format!("{}/v1/messages", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "system": request.system,
            "messages": Self::to_api_messages(&request.messages),
            "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        });
        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        debug!(backend = "anthropic", model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 429 {
            return Err(BackendError::RateLimited { retry_after_secs: 5 });
        }
        if status == 401 || status == 403 {
            return Err(BackendError::AuthenticationFailed(
                "Invalid Anthropic API key".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Anthropic API error");
            return Err(BackendError::Api {
                status_code: status,
                message: error_body,
            });
        }

        let api_resp: ApiResponse = response
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        Self::parse_response(api_resp)
    }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct ApiTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiResponseBlock>,

    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_and_tool_use_blocks() {
        let api: ApiResponse = serde_json::from_str(
            r#"{
                "content": [
                    {"type": "text", "text": "Fetching your courses."},
                    {"type": "tool_use", "id": "toolu_1", "name": "fetch_courses", "input": {}}
                ],
                "stop_reason": "tool_use"
            }"#,
        )
        .unwrap();

        let response = AnthropicBackend::parse_response(api).unwrap();
        assert_eq!(response.content.len(), 2);
        assert!(response.has_tool_calls());
        match &response.content[1] {
            ContentBlock::ToolCall { id, name, .. } => {
                assert_eq!(id, "toolu_1");
                assert_eq!(name, "fetch_courses");
            }
            other => panic!("expected tool_call, got {other:?}"),
        }
        assert_eq!(response.stop_reason.as_deref(), Some("tool_use"));
    }

    #[test]
    fn unknown_response_blocks_are_skipped() {
        let api: ApiResponse = serde_json::from_str(
            r#"{
                "content": [
                    {"type": "thinking", "thinking": "hmm"},
                    {"type": "text", "text": "Done."}
                ],
                "stop_reason": "end_turn"
            }"#,
        )
        .unwrap();
        let response = AnthropicBackend::parse_response(api).unwrap();
        assert_eq!(response.content, vec![ContentBlock::text("Done.")]);
    }

    #[test]
    fn image_block_converts_to_base64_source() {
        let block = to_api_block(&ContentBlock::Image {
            media_type: "image/png".into(),
            data: "aGVsbG8=".into(),
        });
        assert_eq!(block["type"], "image");
        assert_eq!(block["source"]["type"], "base64");
        assert_eq!(block["source"]["media_type"], "image/png");
    }

    #[test]
    fn tool_result_converts_to_tool_use_id() {
        let block = to_api_block(&ContentBlock::ToolResult {
            call_id: "toolu_1".into(),
            output: "[]".into(),
        });
        assert_eq!(block["type"], "tool_result");
        assert_eq!(block["tool_use_id"], "toolu_1");
        assert_eq!(block["content"], "[]");
    }

    #[test]
    fn roles_map_to_wire_names() {
        let messages = vec![
            Message::text(Role::User, "hi"),
            Message::text(Role::Assistant, "hello"),
        ];
        let api = AnthropicBackend::to_api_messages(&messages);
        assert_eq!(api[0].role, "user");
        assert_eq!(api[1].role, "assistant");
    }
}
