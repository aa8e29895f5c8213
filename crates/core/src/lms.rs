//! LmsClient trait — the boundary to the learning-management system.
//!
//! Tool handlers consume this; pagination, token refresh, and transport
//! details belong to the implementation behind it.

use crate::error::LmsError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A course the teacher can grade in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
}

/// An assignment within a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<String>,
}

/// A student submission for an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub student_id: String,
    pub student_name: String,

    /// Reference to the submitted artifact (file id, URL), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_ref: Option<String>,

    /// Declared content type of the artifact (pdf, docx, google_doc, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// The LMS boundary. Each call returns data or a descriptive error; the
/// grading loop only ever sees these results serialized into tool payloads.
#[async_trait]
pub trait LmsClient: Send + Sync {
    async fn list_courses(&self) -> std::result::Result<Vec<Course>, LmsError>;

    async fn list_assignments(
        &self,
        course_id: &str,
    ) -> std::result::Result<Vec<Assignment>, LmsError>;

    async fn list_submissions(
        &self,
        course_id: &str,
        assignment_id: &str,
    ) -> std::result::Result<Vec<Submission>, LmsError>;

    async fn post_grade(
        &self,
        course_id: &str,
        assignment_id: &str,
        student_id: &str,
        grade: &str,
    ) -> std::result::Result<(), LmsError>;

    async fn post_comment(
        &self,
        course_id: &str,
        assignment_id: &str,
        student_id: &str,
        comment: &str,
    ) -> std::result::Result<(), LmsError>;
}
