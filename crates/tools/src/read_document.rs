//! Document text extraction over the `ContentExtractor` boundary.

use crate::{str_arg, Tool, ToolContext, ToolOutput};
use async_trait::async_trait;
use gradepilot_core::error::ToolError;
use gradepilot_core::extract::{ContentExtractor, DocumentType};
use std::sync::Arc;

pub struct ReadDocumentTool {
    extractor: Arc<dyn ContentExtractor>,
}

impl ReadDocumentTool {
    pub fn new(extractor: Arc<dyn ContentExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl Tool for ReadDocumentTool {
    fn name(&self) -> &str {
        "read_document"
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        _ctx: &ToolContext,
    ) -> std::result::Result<ToolOutput, ToolError> {
        let file_ref = str_arg(&input, "file_ref")?;
        let raw_type = str_arg(&input, "content_type")?;
        let content_type = DocumentType::parse(raw_type).map_err(|e| {
            ToolError::InvalidArguments(e.to_string())
        })?;

        let text = self
            .extractor
            .extract(file_ref, content_type)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: e.to_string(),
            })?;

        Ok(ToolOutput::text(text))
    }
}
