//! Student history tools over the `HistoryStore` boundary.
//!
//! Reads and writes are whole-record. Course and student ids fall back to
//! the session context when the model omits them.

use crate::{Tool, ToolContext, ToolOutput};
use async_trait::async_trait;
use chrono::Utc;
use gradepilot_core::error::ToolError;
use gradepilot_core::history::{HistoryStore, StudentHistory};
use std::sync::Arc;
use tracing::debug;

/// Resolve an id from the input payload or the session context.
fn resolve_id<'a>(
    input: &'a serde_json::Value,
    key: &str,
    session_value: Option<&'a str>,
) -> std::result::Result<&'a str, ToolError> {
    input[key]
        .as_str()
        .filter(|s| !s.is_empty())
        .or(session_value)
        .ok_or_else(|| {
            ToolError::InvalidArguments(format!(
                "Missing '{key}' and no value selected in the session"
            ))
        })
}

fn storage_failure(tool_name: &str, e: gradepilot_core::error::HistoryError) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: tool_name.into(),
        reason: e.to_string(),
    }
}

pub struct GetStudentHistoryTool {
    store: Arc<dyn HistoryStore>,
}

impl GetStudentHistoryTool {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for GetStudentHistoryTool {
    fn name(&self) -> &str {
        "get_student_history"
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        ctx: &ToolContext,
    ) -> std::result::Result<ToolOutput, ToolError> {
        let course_id = resolve_id(&input, "course_id", ctx.session.course_id.as_deref())?;
        let student_id = resolve_id(&input, "student_id", ctx.session.student_id.as_deref())?;

        let record = self
            .store
            .get(course_id, student_id)
            .await
            .map_err(|e| storage_failure(self.name(), e))?;

        let payload = match record {
            Some(history) => serde_json::to_string(&history)
                .map_err(|e| ToolError::InvalidArguments(format!("Unserializable record: {e}")))?,
            None => serde_json::json!({
                "course_id": course_id,
                "student_id": student_id,
                "competencies": {},
                "note": "No history recorded yet",
            })
            .to_string(),
        };
        Ok(ToolOutput::text(payload))
    }
}

pub struct RecordStudentGradesTool {
    store: Arc<dyn HistoryStore>,
}

impl RecordStudentGradesTool {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for RecordStudentGradesTool {
    fn name(&self) -> &str {
        "record_student_grades"
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        ctx: &ToolContext,
    ) -> std::result::Result<ToolOutput, ToolError> {
        let course_id = resolve_id(&input, "course_id", ctx.session.course_id.as_deref())?;
        let student_id = resolve_id(&input, "student_id", ctx.session.student_id.as_deref())?;
        let grades = input["grades"]
            .as_object()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'grades' object".into()))?;

        let mut record = self
            .store
            .get(course_id, student_id)
            .await
            .map_err(|e| storage_failure(self.name(), e))?
            .unwrap_or_else(|| StudentHistory::new(course_id, student_id));

        let now = Utc::now();
        for (competency, grade) in grades {
            let grade = grade.as_str().ok_or_else(|| {
                ToolError::InvalidArguments(format!("Grade for '{competency}' is not a string"))
            })?;
            record.record(competency, grade, now);
        }

        debug!(course_id, student_id, count = grades.len(), "Recorded grades");

        let payload = serde_json::to_string(&record)
            .map_err(|e| ToolError::InvalidArguments(format!("Unserializable record: {e}")))?;
        self.store
            .put(record)
            .await
            .map_err(|e| storage_failure(self.name(), e))?;
        Ok(ToolOutput::text(payload))
    }
}
