//! Briefing assembly — the system-level text sent to the model.
//!
//! Pure function of the task type and session context: persona block,
//! task-specific instruction block, and a full session snapshot. Absent
//! fields render as explicit placeholders so the model always sees the same
//! briefing shape. Built once per invocation and reused for every turn.
//!
//! # Determinism
//!
//! Identical inputs always produce identical briefings. No random or
//! time-dependent content.

use gradepilot_core::task::{SessionContext, TaskType};

const PERSONA: &str = "\
You are GradePilot, a grading assistant for teachers using competency-based grading.

Guidelines:
- Grades are one of: beginning, approaching, meets, exceeds.
- Feedback is specific, warm, and addressed to the student by name when known.
- Never invent grades, submissions, or student work; fetch what you need with tools.
- Follow the teacher's style rules and feedback examples when present.
- When the task is finished (or cannot be finished), call complete_task.";

/// The numbered instruction block for one task type.
fn task_instructions(task: TaskType) -> &'static str {
    match task {
        TaskType::GenerateFeedback => {
            "Task: generate feedback for the selected student.\n\
             1. Read the submission with read_document (fetch_submissions first if needed).\n\
             2. Draft feedback with draft_feedback, using the session grades.\n\
             3. Adjust the draft to the teacher's style rules and examples.\n\
             4. Call complete_task with the finished feedback in notes."
        }
        TaskType::SurfaceHighlights => {
            "Task: surface notable moments across submissions.\n\
             1. Fetch the submissions for the selected assignment.\n\
             2. Read each submission and pick 2-4 standout excerpts (strong or concerning).\n\
             3. For each highlight, name the student, quote briefly, and say why it matters.\n\
             4. Call complete_task with the highlights in notes."
        }
        TaskType::PostGrades => {
            "Task: post the session's grades to the LMS.\n\
             1. Confirm course, assignment, and student from the context.\n\
             2. Post each competency grade with post_grade.\n\
             3. Record the grades to history with record_student_grades.\n\
             4. Call complete_task summarizing what was posted."
        }
        TaskType::AnalyzeTrends => {
            "Task: analyze the selected student's progress.\n\
             1. Read the grade history with get_student_history.\n\
             2. Describe per-competency trends in plain language for the teacher.\n\
             3. Flag competencies that are declining or stuck.\n\
             4. Call complete_task with the analysis in notes."
        }
        TaskType::GenerateAllFeedback => {
            "Task: generate feedback for every submission in the assignment.\n\
             1. Fetch all submissions with fetch_submissions.\n\
             2. For each: read the document, draft feedback, post it with post_comment.\n\
             3. Keep a running list of students handled and any failures.\n\
             4. Call complete_task with that list in notes."
        }
        TaskType::Custom => {
            "Task: follow the teacher's request in the message below.\n\
             1. Use read_context and the fetch tools to gather what you need.\n\
             2. Do the work step by step; prefer tools over assumptions.\n\
             3. Call complete_task when done."
        }
    }
}

/// Pick the emoji marker for a grade value.
fn grade_emoji(grade: &str) -> &'static str {
    match grade.to_ascii_lowercase().as_str() {
        "exceeds" | "4" => "🌟",
        "meets" | "3" => "✅",
        "approaching" | "2" => "🟡",
        "beginning" | "1" => "🔴",
        _ => "📊",
    }
}

fn labeled(label: &str, value: Option<&str>) -> String {
    format!("{label}: {}\n", value.unwrap_or("Not selected"))
}

/// Render the session snapshot. Every field appears; nothing is silently
/// omitted.
fn session_snapshot(session: &SessionContext) -> String {
    let mut out = String::from("## Session\n");
    out.push_str(&labeled(
        "Course",
        session
            .course_name
            .as_deref()
            .or(session.course_id.as_deref()),
    ));
    out.push_str(&labeled("Course ID", session.course_id.as_deref()));
    out.push_str(&labeled(
        "Assignment",
        session
            .assignment_name
            .as_deref()
            .or(session.assignment_id.as_deref()),
    ));
    out.push_str(&labeled("Assignment ID", session.assignment_id.as_deref()));
    out.push_str(&labeled(
        "Student",
        session
            .student_name
            .as_deref()
            .or(session.student_id.as_deref()),
    ));
    out.push_str(&labeled("Student ID", session.student_id.as_deref()));

    out.push_str("\nGrades so far:\n");
    if session.grades.is_empty() {
        out.push_str("None\n");
    } else {
        for (competency, grade) in &session.grades {
            out.push_str(&format!("{} {competency}: {grade}\n", grade_emoji(grade)));
        }
    }

    out.push_str("\nTeacher notes: ");
    out.push_str(session.teacher_notes.as_deref().unwrap_or("None"));
    out.push('\n');

    out.push_str("\nStyle rules:\n");
    if session.style_rules.is_empty() {
        out.push_str("None\n");
    } else {
        for rule in &session.style_rules {
            out.push_str(&format!("- {rule}\n"));
        }
    }

    out.push_str("\nFeedback examples:\n");
    if session.feedback_examples.is_empty() {
        out.push_str("None\n");
    } else {
        for (i, example) in session.feedback_examples.iter().enumerate() {
            out.push_str(&format!(
                "{}. Submission excerpt: {}\n   Teacher's feedback: {}\n",
                i + 1,
                example.submission_excerpt,
                example.feedback
            ));
        }
    }

    out
}

/// Build the full briefing for one invocation.
pub fn build_briefing(task: TaskType, session: &SessionContext) -> String {
    format!(
        "{PERSONA}\n\n{}\n\n{}",
        task_instructions(task),
        session_snapshot(session)
    )
}
