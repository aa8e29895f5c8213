//! The completion signal — the only way the loop terminates early with a
//! caller-supplied outcome.
//!
//! The handler does no external work: it echoes its arguments back as the
//! payload and raises the completion flag. The loop parses the payload into
//! the final result.

use crate::{Tool, ToolContext, ToolOutput};
use async_trait::async_trait;
use gradepilot_core::error::ToolError;

pub struct CompleteTaskTool;

#[async_trait]
impl Tool for CompleteTaskTool {
    fn name(&self) -> &str {
        "complete_task"
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        _ctx: &ToolContext,
    ) -> std::result::Result<ToolOutput, ToolError> {
        Ok(ToolOutput {
            output: input.to_string(),
            is_completion: true,
        })
    }
}

/// Parse a completion payload into `(success, notes)`.
///
/// `success` is accepted as a JSON bool or the strings "true"/"false"
/// (models emit both); anything else counts as failure. Missing notes
/// become the empty string.
pub fn parse_outcome(payload: &str) -> (bool, String) {
    let value: serde_json::Value = serde_json::from_str(payload).unwrap_or_default();
    let success = match &value["success"] {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    };
    let notes = value["notes"].as_str().unwrap_or_default().to_string();
    (success, notes)
}
