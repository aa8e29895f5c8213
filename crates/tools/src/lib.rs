//! Tool catalog, dispatcher, and built-in tool handlers for GradePilot.
//!
//! Tools are what the model may request during a grading loop: fetch courses
//! and submissions, read documents, draft feedback, post grades, query
//! history, and signal completion.
//!
//! The dispatcher is deliberately infallible: unknown names and handler
//! failures become error-shaped payloads the model can see and adapt to,
//! never raised errors. The only control-flow signal a dispatch carries is
//! the completion flag.

pub mod catalog;
pub mod complete_task;
pub mod draft_feedback;
pub mod history_tools;
pub mod lms_tools;
pub mod read_context;
pub mod read_document;

use async_trait::async_trait;
use gradepilot_core::backend::ToolDeclaration;
use gradepilot_core::error::ToolError;
use gradepilot_core::extract::ContentExtractor;
use gradepilot_core::feedback::FeedbackDrafter;
use gradepilot_core::history::HistoryStore;
use gradepilot_core::lms::LmsClient;
use gradepilot_core::task::{SessionContext, TaskType};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

pub use catalog::catalog;

/// The per-invocation state snapshot handlers may read.
///
/// Built once per loop invocation alongside the briefing; read-only for the
/// lifetime of the invocation.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub task: TaskType,
    pub session: SessionContext,
}

/// What a handler returns on success.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Serialized payload fed back to the model as a tool result.
    pub output: String,

    /// True only for the designated completion tool.
    pub is_completion: bool,
}

impl ToolOutput {
    /// A plain, non-terminating payload.
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_completion: false,
        }
    }
}

/// The core Tool trait.
///
/// Declarations (description, input schema) live in the static catalog;
/// handlers carry only their name and behavior, and the registry is validated
/// against the catalog at startup.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (must match a catalog declaration).
    fn name(&self) -> &str;

    /// Execute the tool with the given input and invocation context.
    async fn execute(
        &self,
        input: serde_json::Value,
        ctx: &ToolContext,
    ) -> std::result::Result<ToolOutput, ToolError>;
}

/// The outcome of one dispatch, as seen by the loop.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub output: String,
    pub is_completion: bool,
}

/// Serialize an error message into the payload shape the model sees.
fn error_payload(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

/// A registry of tool handlers, keyed by name.
///
/// The grading loop uses this to:
/// 1. Get the declared catalog to send to the model
/// 2. Dispatch tool calls the model requests
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
    declarations: Vec<ToolDeclaration>,
}

impl ToolRegistry {
    pub fn new(declarations: Vec<ToolDeclaration>) -> Self {
        Self {
            tools: HashMap::new(),
            declarations,
        }
    }

    /// Register a handler. Replaces any existing handler with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a handler by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// The declared catalog (what the model is told it may call).
    pub fn declarations(&self) -> &[ToolDeclaration] {
        &self.declarations
    }

    /// List all registered handler names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Check handlers against the declared catalog in both directions.
    ///
    /// Fails fast at startup: a declared tool with no handler means the model
    /// can request something we cannot run; a handler with no declaration is
    /// dead weight the model can never reach.
    pub fn validate_catalog(&self) -> std::result::Result<(), ToolError> {
        let mut undeclared: Vec<&str> = self
            .tools
            .keys()
            .filter(|n| !self.declarations.iter().any(|d| &d.name == *n))
            .map(|s| s.as_str())
            .collect();
        let mut unhandled: Vec<&str> = self
            .declarations
            .iter()
            .filter(|d| !self.tools.contains_key(&d.name))
            .map(|d| d.name.as_str())
            .collect();
        undeclared.sort_unstable();
        unhandled.sort_unstable();

        if undeclared.is_empty() && unhandled.is_empty() {
            return Ok(());
        }
        let mut parts = Vec::new();
        if !unhandled.is_empty() {
            parts.push(format!("declared without handler: {}", unhandled.join(", ")));
        }
        if !undeclared.is_empty() {
            parts.push(format!("handler without declaration: {}", undeclared.join(", ")));
        }
        Err(ToolError::CatalogMismatch(parts.join("; ")))
    }

    /// Execute a requested tool by name.
    ///
    /// Infallible by contract: unknown names and handler errors are folded
    /// into error-shaped payloads with `is_completion = false`, so the model
    /// observes the failure as a tool result and the loop never aborts.
    pub async fn dispatch(
        &self,
        name: &str,
        input: serde_json::Value,
        ctx: &ToolContext,
    ) -> Dispatch {
        let Some(tool) = self.tools.get(name) else {
            warn!(tool = name, "Dispatch requested for unknown tool");
            return Dispatch {
                output: error_payload(&ToolError::Unknown(name.to_string()).to_string()),
                is_completion: false,
            };
        };

        match tool.execute(input, ctx).await {
            Ok(out) => Dispatch {
                output: out.output,
                is_completion: out.is_completion,
            },
            Err(e) => {
                warn!(tool = name, error = %e, "Tool execution failed");
                Dispatch {
                    output: error_payload(&e.to_string()),
                    is_completion: false,
                }
            }
        }
    }
}

/// The external collaborators the built-in handlers need.
#[derive(Clone)]
pub struct ToolDeps {
    pub lms: Arc<dyn LmsClient>,
    pub extractor: Arc<dyn ContentExtractor>,
    pub drafter: Arc<dyn FeedbackDrafter>,
    pub history: Arc<dyn HistoryStore>,
}

/// Create the default registry with every catalog tool wired to its handler.
///
/// The result always passes `validate_catalog`; a unit test keeps that honest
/// when tools are added.
pub fn default_registry(deps: ToolDeps) -> ToolRegistry {
    let mut registry = ToolRegistry::new(catalog());
    registry.register(Box::new(complete_task::CompleteTaskTool));
    registry.register(Box::new(read_context::ReadContextTool));
    registry.register(Box::new(lms_tools::FetchCoursesTool::new(deps.lms.clone())));
    registry.register(Box::new(lms_tools::FetchAssignmentsTool::new(deps.lms.clone())));
    registry.register(Box::new(lms_tools::FetchSubmissionsTool::new(deps.lms.clone())));
    registry.register(Box::new(lms_tools::PostGradeTool::new(deps.lms.clone())));
    registry.register(Box::new(lms_tools::PostCommentTool::new(deps.lms)));
    registry.register(Box::new(read_document::ReadDocumentTool::new(deps.extractor)));
    registry.register(Box::new(draft_feedback::DraftFeedbackTool::new(deps.drafter)));
    registry.register(Box::new(history_tools::GetStudentHistoryTool::new(
        deps.history.clone(),
    )));
    registry.register(Box::new(history_tools::RecordStudentGradesTool::new(
        deps.history,
    )));
    registry
}

/// Pull a required string argument out of a tool input payload.
pub(crate) fn str_arg<'a>(
    input: &'a serde_json::Value,
    key: &str,
) -> std::result::Result<&'a str, ToolError> {
    input[key]
        .as_str()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_ctx() -> ToolContext {
        ToolContext {
            task: TaskType::Custom,
            session: SessionContext::default(),
        }
    }

    /// A handler that always fails, for dispatcher tests.
    struct BrokenTool;

    #[async_trait]
    impl Tool for BrokenTool {
        fn name(&self) -> &str {
            "broken"
        }
        async fn execute(
            &self,
            _input: serde_json::Value,
            _ctx: &ToolContext,
        ) -> std::result::Result<ToolOutput, ToolError> {
            Err(ToolError::ExecutionFailed {
                tool_name: "broken".into(),
                reason: "wires crossed".into(),
            })
        }
    }

    #[tokio::test]
    async fn unknown_tool_degrades_to_error_payload() {
        let registry = ToolRegistry::new(vec![]);
        let dispatch = registry
            .dispatch("does_not_exist", serde_json::json!({}), &empty_ctx())
            .await;
        assert!(!dispatch.is_completion);
        assert!(dispatch.output.contains("Unknown tool: does_not_exist"));
        let parsed: serde_json::Value = serde_json::from_str(&dispatch.output).unwrap();
        assert!(parsed["error"].is_string());
    }

    #[tokio::test]
    async fn handler_failure_degrades_to_error_payload() {
        let mut registry = ToolRegistry::new(vec![]);
        registry.register(Box::new(BrokenTool));
        let dispatch = registry
            .dispatch("broken", serde_json::json!({}), &empty_ctx())
            .await;
        assert!(!dispatch.is_completion);
        assert!(dispatch.output.contains("wires crossed"));
    }

    #[test]
    fn validation_flags_declared_without_handler() {
        let registry = ToolRegistry::new(catalog());
        let err = registry.validate_catalog().unwrap_err();
        assert!(matches!(err, ToolError::CatalogMismatch(_)));
        assert!(err.to_string().contains("declared without handler"));
        assert!(err.to_string().contains("complete_task"));
    }

    #[test]
    fn validation_flags_handler_without_declaration() {
        let mut registry = ToolRegistry::new(vec![]);
        registry.register(Box::new(BrokenTool));
        let err = registry.validate_catalog().unwrap_err();
        assert!(err.to_string().contains("handler without declaration"));
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn missing_string_arg_is_invalid_arguments() {
        let err = str_arg(&serde_json::json!({}), "course_id").unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(err.to_string().contains("course_id"));
    }

    // --- No-op collaborators for registry wiring tests ---

    struct NoopLms;

    #[async_trait]
    impl LmsClient for NoopLms {
        async fn list_courses(
            &self,
        ) -> Result<Vec<gradepilot_core::lms::Course>, gradepilot_core::error::LmsError> {
            Ok(vec![])
        }
        async fn list_assignments(
            &self,
            _course_id: &str,
        ) -> Result<Vec<gradepilot_core::lms::Assignment>, gradepilot_core::error::LmsError>
        {
            Ok(vec![])
        }
        async fn list_submissions(
            &self,
            _course_id: &str,
            _assignment_id: &str,
        ) -> Result<Vec<gradepilot_core::lms::Submission>, gradepilot_core::error::LmsError>
        {
            Ok(vec![])
        }
        async fn post_grade(
            &self,
            _course_id: &str,
            _assignment_id: &str,
            _student_id: &str,
            _grade: &str,
        ) -> Result<(), gradepilot_core::error::LmsError> {
            Ok(())
        }
        async fn post_comment(
            &self,
            _course_id: &str,
            _assignment_id: &str,
            _student_id: &str,
            _comment: &str,
        ) -> Result<(), gradepilot_core::error::LmsError> {
            Ok(())
        }
    }

    struct NoopExtractor;

    #[async_trait]
    impl ContentExtractor for NoopExtractor {
        async fn extract(
            &self,
            _file_ref: &str,
            _content_type: gradepilot_core::extract::DocumentType,
        ) -> Result<String, gradepilot_core::error::ExtractError> {
            Ok(String::new())
        }
    }

    struct NoopDrafter;

    #[async_trait]
    impl FeedbackDrafter for NoopDrafter {
        async fn draft(
            &self,
            _submission_text: &str,
            _grades: &std::collections::BTreeMap<String, String>,
            _rubric_notes: Option<&str>,
        ) -> Result<gradepilot_core::feedback::FeedbackDraft, gradepilot_core::error::BackendError>
        {
            Ok(gradepilot_core::feedback::FeedbackDraft::default())
        }
    }

    struct NoopHistory;

    #[async_trait]
    impl HistoryStore for NoopHistory {
        async fn get(
            &self,
            _course_id: &str,
            _student_id: &str,
        ) -> Result<
            Option<gradepilot_core::history::StudentHistory>,
            gradepilot_core::error::HistoryError,
        > {
            Ok(None)
        }
        async fn put(
            &self,
            _record: gradepilot_core::history::StudentHistory,
        ) -> Result<(), gradepilot_core::error::HistoryError> {
            Ok(())
        }
    }

    fn noop_deps() -> ToolDeps {
        ToolDeps {
            lms: Arc::new(NoopLms),
            extractor: Arc::new(NoopExtractor),
            drafter: Arc::new(NoopDrafter),
            history: Arc::new(NoopHistory),
        }
    }

    #[test]
    fn default_registry_covers_the_catalog() {
        let registry = default_registry(noop_deps());
        registry.validate_catalog().unwrap();
        assert_eq!(registry.names().len(), catalog().len());
    }

    #[tokio::test]
    async fn completion_dispatch_raises_the_flag() {
        let registry = default_registry(noop_deps());
        let dispatch = registry
            .dispatch(
                "complete_task",
                serde_json::json!({"success": "true", "notes": "done"}),
                &empty_ctx(),
            )
            .await;
        assert!(dispatch.is_completion);
        assert!(dispatch.output.contains("done"));
    }
}
