//! LMS-backed tools: course/assignment/submission reads and grade/comment
//! writes. Each handler holds an injected `LmsClient` and turns its results
//! into serialized payloads; LMS failures surface as `ExecutionFailed` and
//! are folded into error payloads by the dispatcher.

use crate::{str_arg, Tool, ToolContext, ToolOutput};
use async_trait::async_trait;
use gradepilot_core::error::ToolError;
use gradepilot_core::lms::LmsClient;
use std::sync::Arc;
use tracing::info;

fn lms_failure(tool_name: &str, e: gradepilot_core::error::LmsError) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: tool_name.into(),
        reason: e.to_string(),
    }
}

fn serialize<T: serde::Serialize>(value: &T) -> std::result::Result<String, ToolError> {
    serde_json::to_string(value)
        .map_err(|e| ToolError::InvalidArguments(format!("Unserializable result: {e}")))
}

pub struct FetchCoursesTool {
    lms: Arc<dyn LmsClient>,
}

impl FetchCoursesTool {
    pub fn new(lms: Arc<dyn LmsClient>) -> Self {
        Self { lms }
    }
}

#[async_trait]
impl Tool for FetchCoursesTool {
    fn name(&self) -> &str {
        "fetch_courses"
    }

    async fn execute(
        &self,
        _input: serde_json::Value,
        _ctx: &ToolContext,
    ) -> std::result::Result<ToolOutput, ToolError> {
        let courses = self
            .lms
            .list_courses()
            .await
            .map_err(|e| lms_failure(self.name(), e))?;
        Ok(ToolOutput::text(serialize(&courses)?))
    }
}

pub struct FetchAssignmentsTool {
    lms: Arc<dyn LmsClient>,
}

impl FetchAssignmentsTool {
    pub fn new(lms: Arc<dyn LmsClient>) -> Self {
        Self { lms }
    }
}

#[async_trait]
impl Tool for FetchAssignmentsTool {
    fn name(&self) -> &str {
        "fetch_assignments"
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        _ctx: &ToolContext,
    ) -> std::result::Result<ToolOutput, ToolError> {
        let course_id = str_arg(&input, "course_id")?;
        let assignments = self
            .lms
            .list_assignments(course_id)
            .await
            .map_err(|e| lms_failure(self.name(), e))?;
        Ok(ToolOutput::text(serialize(&assignments)?))
    }
}

pub struct FetchSubmissionsTool {
    lms: Arc<dyn LmsClient>,
}

impl FetchSubmissionsTool {
    pub fn new(lms: Arc<dyn LmsClient>) -> Self {
        Self { lms }
    }
}

#[async_trait]
impl Tool for FetchSubmissionsTool {
    fn name(&self) -> &str {
        "fetch_submissions"
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        _ctx: &ToolContext,
    ) -> std::result::Result<ToolOutput, ToolError> {
        let course_id = str_arg(&input, "course_id")?;
        let assignment_id = str_arg(&input, "assignment_id")?;
        let submissions = self
            .lms
            .list_submissions(course_id, assignment_id)
            .await
            .map_err(|e| lms_failure(self.name(), e))?;
        Ok(ToolOutput::text(serialize(&submissions)?))
    }
}

pub struct PostGradeTool {
    lms: Arc<dyn LmsClient>,
}

impl PostGradeTool {
    pub fn new(lms: Arc<dyn LmsClient>) -> Self {
        Self { lms }
    }
}

#[async_trait]
impl Tool for PostGradeTool {
    fn name(&self) -> &str {
        "post_grade"
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        _ctx: &ToolContext,
    ) -> std::result::Result<ToolOutput, ToolError> {
        let course_id = str_arg(&input, "course_id")?;
        let assignment_id = str_arg(&input, "assignment_id")?;
        let student_id = str_arg(&input, "student_id")?;
        let grade = str_arg(&input, "grade")?;

        self.lms
            .post_grade(course_id, assignment_id, student_id, grade)
            .await
            .map_err(|e| lms_failure(self.name(), e))?;

        info!(student_id, grade, "Posted grade to LMS");
        Ok(ToolOutput::text(
            serde_json::json!({
                "posted": true,
                "student_id": student_id,
                "grade": grade,
            })
            .to_string(),
        ))
    }
}

pub struct PostCommentTool {
    lms: Arc<dyn LmsClient>,
}

impl PostCommentTool {
    pub fn new(lms: Arc<dyn LmsClient>) -> Self {
        Self { lms }
    }
}

#[async_trait]
impl Tool for PostCommentTool {
    fn name(&self) -> &str {
        "post_comment"
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        _ctx: &ToolContext,
    ) -> std::result::Result<ToolOutput, ToolError> {
        let course_id = str_arg(&input, "course_id")?;
        let assignment_id = str_arg(&input, "assignment_id")?;
        let student_id = str_arg(&input, "student_id")?;
        let comment = str_arg(&input, "comment")?;

        self.lms
            .post_comment(course_id, assignment_id, student_id, comment)
            .await
            .map_err(|e| lms_failure(self.name(), e))?;

        info!(student_id, "Posted comment to LMS");
        Ok(ToolOutput::text(
            serde_json::json!({
                "posted": true,
                "student_id": student_id,
            })
            .to_string(),
        ))
    }
}
