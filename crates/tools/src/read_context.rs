//! State introspection — lets the model query the task and session context
//! as structured data instead of re-deriving it from the briefing text.

use crate::{Tool, ToolContext, ToolOutput};
use async_trait::async_trait;
use gradepilot_core::error::ToolError;

pub struct ReadContextTool;

#[async_trait]
impl Tool for ReadContextTool {
    fn name(&self) -> &str {
        "read_context"
    }

    async fn execute(
        &self,
        _input: serde_json::Value,
        ctx: &ToolContext,
    ) -> std::result::Result<ToolOutput, ToolError> {
        let view = serde_json::json!({
            "task": ctx.task,
            "session": ctx.session,
        });
        Ok(ToolOutput::text(view.to_string()))
    }
}
