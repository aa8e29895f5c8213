//! FeedbackDrafter trait — the secondary model call producing structured
//! feedback from a submission, grades, and rubric context.

use crate::error::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A structured feedback draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackDraft {
    pub summary: String,

    #[serde(default)]
    pub strengths: Vec<String>,

    #[serde(default)]
    pub growth_areas: Vec<String>,

    #[serde(default)]
    pub next_steps: Vec<String>,
}

/// Drafts feedback for one submission. Implemented over the model backend;
/// declared here so tool handlers can be tested against a stub.
#[async_trait]
pub trait FeedbackDrafter: Send + Sync {
    async fn draft(
        &self,
        submission_text: &str,
        grades: &BTreeMap<String, String>,
        rubric_notes: Option<&str>,
    ) -> std::result::Result<FeedbackDraft, BackendError>;
}
