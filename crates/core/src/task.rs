//! Task types, session context, and invocation input/output value objects.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The high-level goal a loop invocation is instructed to pursue.
///
/// Selects which instruction block the briefing builder appends.
/// Unrecognized wire values fall back to `Custom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    GenerateFeedback,
    SurfaceHighlights,
    PostGrades,
    AnalyzeTrends,
    GenerateAllFeedback,
    #[serde(other)]
    Custom,
}

impl TaskType {
    /// The wire name of this task type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenerateFeedback => "generate_feedback",
            Self::SurfaceHighlights => "surface_highlights",
            Self::PostGrades => "post_grades",
            Self::AnalyzeTrends => "analyze_trends",
            Self::GenerateAllFeedback => "generate_all_feedback",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A few-shot example pairing a submission excerpt with the feedback the
/// teacher actually wrote for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackExample {
    pub submission_excerpt: String,
    pub feedback: String,
}

/// A snapshot of the teacher's session at invocation time.
///
/// Every field is optional; absent fields are rendered as explicit
/// placeholders by the briefing builder, never silently dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,

    /// Competency name → grade value. Ordered so the briefing renders
    /// deterministically.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub grades: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_notes: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub style_rules: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feedback_examples: Vec<FeedbackExample>,
}

/// A base64-encoded image attached to the invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAttachment {
    pub media_type: String,
    pub data: String,
}

/// One loop invocation's input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopRequest {
    pub task: TaskType,

    pub user_message: String,

    #[serde(default)]
    pub session: SessionContext,

    /// Override for the iteration bound (default 10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_attachments: Vec<ImageAttachment>,
}

impl LoopRequest {
    /// A minimal request with just a task and a message.
    pub fn new(task: TaskType, user_message: impl Into<String>) -> Self {
        Self {
            task,
            user_message: user_message.into(),
            session: SessionContext::default(),
            max_iterations: None,
            image_attachments: Vec::new(),
        }
    }
}

/// The terminal outcome of one blocking loop invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopResult {
    /// Whether the invocation ended in a success state.
    pub success: bool,

    /// The final text (model text turn, or completion notes).
    pub result: String,

    /// Every tool name dispatched, in exact call order, duplicates allowed.
    pub tools_used: Vec<String>,

    /// Model calls made; always at least 1 unless the backend never answered.
    pub iterations: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
