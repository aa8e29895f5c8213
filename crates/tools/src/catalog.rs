//! The static tool catalog — pure data.
//!
//! One declaration per callable tool: name, model-facing description, and the
//! JSON Schema of its input. The registry is validated against this list at
//! startup in both directions.

use gradepilot_core::backend::ToolDeclaration;
use serde_json::json;

/// The full declared catalog.
pub fn catalog() -> Vec<ToolDeclaration> {
    vec![
        ToolDeclaration {
            name: "complete_task".into(),
            description: "Signal that the requested task is finished. Call this exactly once, \
                          when you are done (or certain you cannot finish). Nothing runs after it."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "success": {
                        "type": "string",
                        "enum": ["true", "false"],
                        "description": "Whether the task was completed successfully"
                    },
                    "notes": {
                        "type": "string",
                        "description": "Outcome summary shown to the teacher"
                    }
                },
                "required": ["success", "notes"]
            }),
        },
        ToolDeclaration {
            name: "read_context".into(),
            description: "Read the current task and session context (selected course, \
                          assignment, student, grades, preferences) as JSON."
                .into(),
            input_schema: json!({ "type": "object", "properties": {} }),
        },
        ToolDeclaration {
            name: "fetch_courses".into(),
            description: "List the teacher's courses from the LMS.".into(),
            input_schema: json!({ "type": "object", "properties": {} }),
        },
        ToolDeclaration {
            name: "fetch_assignments".into(),
            description: "List the assignments in a course.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "course_id": { "type": "string" }
                },
                "required": ["course_id"]
            }),
        },
        ToolDeclaration {
            name: "fetch_submissions".into(),
            description: "List the student submissions for an assignment.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "course_id": { "type": "string" },
                    "assignment_id": { "type": "string" }
                },
                "required": ["course_id", "assignment_id"]
            }),
        },
        ToolDeclaration {
            name: "post_grade".into(),
            description: "Post a competency grade for one student to the LMS.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "course_id": { "type": "string" },
                    "assignment_id": { "type": "string" },
                    "student_id": { "type": "string" },
                    "grade": {
                        "type": "string",
                        "enum": ["beginning", "approaching", "meets", "exceeds"]
                    }
                },
                "required": ["course_id", "assignment_id", "student_id", "grade"]
            }),
        },
        ToolDeclaration {
            name: "post_comment".into(),
            description: "Post a feedback comment for one student to the LMS.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "course_id": { "type": "string" },
                    "assignment_id": { "type": "string" },
                    "student_id": { "type": "string" },
                    "comment": { "type": "string" }
                },
                "required": ["course_id", "assignment_id", "student_id", "comment"]
            }),
        },
        ToolDeclaration {
            name: "read_document".into(),
            description: "Extract the plain text of a submitted document.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_ref": {
                        "type": "string",
                        "description": "File reference from a submission"
                    },
                    "content_type": {
                        "type": "string",
                        "enum": ["pdf", "docx", "google_doc", "google_slides", "text"]
                    }
                },
                "required": ["file_ref", "content_type"]
            }),
        },
        ToolDeclaration {
            name: "draft_feedback".into(),
            description: "Draft structured feedback (summary, strengths, growth areas, next \
                          steps) for a submission, using the session's grades and rubric notes."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "submission_text": { "type": "string" },
                    "rubric_notes": { "type": "string" }
                },
                "required": ["submission_text"]
            }),
        },
        ToolDeclaration {
            name: "get_student_history".into(),
            description: "Read a student's per-competency grade history and trends. Falls back \
                          to the session's course and student when ids are omitted."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "course_id": { "type": "string" },
                    "student_id": { "type": "string" }
                }
            }),
        },
        ToolDeclaration {
            name: "record_student_grades".into(),
            description: "Append grades to a student's competency history and recompute trends. \
                          Falls back to the session's course and student when ids are omitted."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "course_id": { "type": "string" },
                    "student_id": { "type": "string" },
                    "grades": {
                        "type": "object",
                        "description": "Competency name to grade value",
                        "additionalProperties": { "type": "string" }
                    }
                },
                "required": ["grades"]
            }),
        },
    ]
}
