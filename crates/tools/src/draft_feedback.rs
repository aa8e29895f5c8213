//! Structured feedback drafting over the `FeedbackDrafter` boundary.
//!
//! The session's grade map rides along automatically so the draft reflects
//! what the teacher has already scored.

use crate::{str_arg, Tool, ToolContext, ToolOutput};
use async_trait::async_trait;
use gradepilot_core::error::ToolError;
use gradepilot_core::feedback::FeedbackDrafter;
use std::sync::Arc;

pub struct DraftFeedbackTool {
    drafter: Arc<dyn FeedbackDrafter>,
}

impl DraftFeedbackTool {
    pub fn new(drafter: Arc<dyn FeedbackDrafter>) -> Self {
        Self { drafter }
    }
}

#[async_trait]
impl Tool for DraftFeedbackTool {
    fn name(&self) -> &str {
        "draft_feedback"
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        ctx: &ToolContext,
    ) -> std::result::Result<ToolOutput, ToolError> {
        let submission_text = str_arg(&input, "submission_text")?;
        let rubric_notes = input["rubric_notes"].as_str();

        let draft = self
            .drafter
            .draft(submission_text, &ctx.session.grades, rubric_notes)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: e.to_string(),
            })?;

        let payload = serde_json::to_string(&draft)
            .map_err(|e| ToolError::InvalidArguments(format!("Unserializable draft: {e}")))?;
        Ok(ToolOutput::text(payload))
    }
}
