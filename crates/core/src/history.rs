//! HistoryStore trait — per-student competency grade history.
//!
//! Records are keyed by (course id, student id) and read/written whole; no
//! partial-update API is exposed to the loop.

use crate::error::HistoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Direction of a student's recent grades within one competency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Steady,
    Declining,
    Unknown,
}

/// One recorded grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeEntry {
    pub grade: String,
    pub recorded_at: DateTime<Utc>,
}

/// The grade history and derived trend for one competency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyRecord {
    pub entries: Vec<GradeEntry>,
    pub trend: Trend,
}

impl Default for CompetencyRecord {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            trend: Trend::Unknown,
        }
    }
}

/// The whole history record for one student in one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentHistory {
    pub course_id: String,
    pub student_id: String,

    /// Competency name → recorded history. Ordered for stable serialization.
    #[serde(default)]
    pub competencies: BTreeMap<String, CompetencyRecord>,
}

impl StudentHistory {
    pub fn new(course_id: impl Into<String>, student_id: impl Into<String>) -> Self {
        Self {
            course_id: course_id.into(),
            student_id: student_id.into(),
            competencies: BTreeMap::new(),
        }
    }

    /// Append a grade to a competency and recompute its trend.
    pub fn record(&mut self, competency: &str, grade: impl Into<String>, at: DateTime<Utc>) {
        let rec = self.competencies.entry(competency.to_string()).or_default();
        rec.entries.push(GradeEntry {
            grade: grade.into(),
            recorded_at: at,
        });
        rec.trend = compute_trend(&rec.entries);
    }
}

/// Rank a grade value on the four-level competency scale.
///
/// Unrecognized grades rank as None and are skipped by trend computation.
fn grade_rank(grade: &str) -> Option<u8> {
    match grade.to_ascii_lowercase().as_str() {
        "beginning" | "1" => Some(1),
        "approaching" | "2" => Some(2),
        "meets" | "3" => Some(3),
        "exceeds" | "4" => Some(4),
        _ => None,
    }
}

/// Derive a trend from the last two rankable entries.
fn compute_trend(entries: &[GradeEntry]) -> Trend {
    let ranked: Vec<u8> = entries.iter().filter_map(|e| grade_rank(&e.grade)).collect();
    match ranked.as_slice() {
        [] | [_] => Trend::Unknown,
        [.., a, b] => match b.cmp(a) {
            std::cmp::Ordering::Greater => Trend::Improving,
            std::cmp::Ordering::Equal => Trend::Steady,
            std::cmp::Ordering::Less => Trend::Declining,
        },
    }
}

/// The student history boundary: whole-record reads and writes only.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn get(
        &self,
        course_id: &str,
        student_id: &str,
    ) -> std::result::Result<Option<StudentHistory>, HistoryError>;

    async fn put(&self, record: StudentHistory) -> std::result::Result<(), HistoryError>;
}
