//! FeedbackDrafter over the Anthropic backend — one structured secondary
//! call, no tools, no loop.

use async_trait::async_trait;
use gradepilot_core::backend::{BackendRequest, ModelBackend};
use gradepilot_core::error::BackendError;
use gradepilot_core::feedback::{FeedbackDraft, FeedbackDrafter};
use gradepilot_core::message::{Message, Role};
use std::collections::BTreeMap;
use tracing::debug;

use crate::anthropic::AnthropicBackend;

const DRAFTER_SYSTEM: &str = "\
You draft feedback for a student submission. Respond with a single JSON object \
and nothing else: {\"summary\": string, \"strengths\": [string], \
\"growth_areas\": [string], \"next_steps\": [string]}. Be specific and kind.";

const DRAFTER_MODEL: &str = "claude-sonnet-4-5";
const DRAFTER_MAX_TOKENS: u32 = 1024;

/// Pull the first JSON object out of a model reply. Models sometimes wrap
/// JSON in prose or code fences.
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn build_prompt(
    submission_text: &str,
    grades: &BTreeMap<String, String>,
    rubric_notes: Option<&str>,
) -> String {
    let mut prompt = String::from("Submission:\n");
    prompt.push_str(submission_text);
    prompt.push_str("\n\nGrades:\n");
    if grades.is_empty() {
        prompt.push_str("None yet\n");
    } else {
        for (competency, grade) in grades {
            prompt.push_str(&format!("- {competency}: {grade}\n"));
        }
    }
    prompt.push_str("\nRubric notes: ");
    prompt.push_str(rubric_notes.unwrap_or("None"));
    prompt
}

#[async_trait]
impl FeedbackDrafter for AnthropicBackend {
    async fn draft(
        &self,
        submission_text: &str,
        grades: &BTreeMap<String, String>,
        rubric_notes: Option<&str>,
    ) -> Result<FeedbackDraft, BackendError> {
        let request = BackendRequest {
            model: DRAFTER_MODEL.into(),
            system: DRAFTER_SYSTEM.into(),
            messages: vec![Message::text(
                Role::User,
                build_prompt(submission_text, grades, rubric_notes),
            )],
            tools: vec![],
            max_tokens: Some(DRAFTER_MAX_TOKENS),
        };

        let response = self.complete(&request).await?;
        let text: String = response
            .content
            .iter()
            .filter_map(|b| match b {
                gradepilot_core::message::ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();

        let json = extract_json(&text).ok_or_else(|| {
            BackendError::MalformedResponse("Drafter reply contained no JSON object".into())
        })?;

        debug!(len = json.len(), "Parsing feedback draft");
        serde_json::from_str(json)
            .map_err(|e| BackendError::MalformedResponse(format!("Bad draft JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_json_from_fenced_reply() {
        let reply = "Here you go:\n```json\n{\"summary\": \"solid work\"}\n```";
        let json = extract_json(reply).unwrap();
        let draft: FeedbackDraft = serde_json::from_str(json).unwrap();
        assert_eq!(draft.summary, "solid work");
        assert!(draft.strengths.is_empty());
    }

    #[test]
    fn no_json_yields_none() {
        assert!(extract_json("no braces here").is_none());
        assert!(extract_json("} backwards {").is_none());
    }

    #[test]
    fn prompt_renders_grades_and_rubric() {
        let mut grades = BTreeMap::new();
        grades.insert("writing".to_string(), "meets".to_string());
        let prompt = build_prompt("My essay", &grades, Some("focus on evidence"));
        assert!(prompt.contains("- writing: meets"));
        assert!(prompt.contains("Rubric notes: focus on evidence"));
    }

    #[test]
    fn prompt_uses_placeholders_when_empty() {
        let prompt = build_prompt("My essay", &BTreeMap::new(), None);
        assert!(prompt.contains("None yet"));
        assert!(prompt.contains("Rubric notes: None"));
    }
}
