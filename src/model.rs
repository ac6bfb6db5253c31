use crate::error::CoreError;
use crate::grid::SlotGrid;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    Create,
    Progress,
    Summary,
    Finish,
}

impl CourseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CourseStatus::Create => "create",
            CourseStatus::Progress => "progress",
            CourseStatus::Summary => "summary",
            CourseStatus::Finish => "finish",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw {
            "create" => Ok(CourseStatus::Create),
            "progress" => Ok(CourseStatus::Progress),
            "summary" => Ok(CourseStatus::Summary),
            "finish" => Ok(CourseStatus::Finish),
            other => Err(CoreError::Internal(format!(
                "unknown course status {other:?}"
            ))),
        }
    }
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An attendance sheet takes check-ins while `Progress`; `End` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetStatus {
    Progress,
    End,
}

impl SheetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SheetStatus::Progress => "progress",
            SheetStatus::End => "end",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw {
            "progress" => Ok(SheetStatus::Progress),
            "end" => Ok(SheetStatus::End),
            other => Err(CoreError::Internal(format!(
                "unknown attendance status {other:?}"
            ))),
        }
    }
}

/// One weekday of meetings for a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTime {
    pub day: String,
    pub time: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub status: CourseStatus,
    pub subject_id: String,
    pub instructor_id: String,
    pub name: String,
    pub credit: i64,
    pub year: String,
    pub term: String,
    pub student_ids: Vec<String>,
    pub location_id: Option<String>,
    pub class_id: Option<String>,
    pub date_time: Vec<DateTime>,
    pub class_year: String,
    pub class_room: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub student_id: String,
    pub score_work_get: f64,
    pub score_work_full: f64,
    pub score_mid_get: f64,
    pub score_mid_full: f64,
    pub score_final_get: f64,
    pub score_final_full: f64,
    pub grade: f64,
    pub all_date_count: i64,
    pub attend_count: i64,
    pub absent_count: i64,
    pub late_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: String,
    pub course_id: String,
    pub student_data: Vec<StudentSummary>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreKind {
    Work,
    Midterm,
    Final,
}

impl ScoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreKind::Work => "work",
            ScoreKind::Midterm => "midterm",
            ScoreKind::Final => "final",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw {
            "work" => Ok(ScoreKind::Work),
            "midterm" => Ok(ScoreKind::Midterm),
            "final" => Ok(ScoreKind::Final),
            _ => Err(CoreError::validation("type is invalid")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub student_id: String,
    pub score_get: Option<f64>,
    /// "" until graded, then "normal" or "late".
    pub status: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub id: String,
    pub course_id: String,
    pub kind: ScoreKind,
    pub name: String,
    pub score_full: f64,
    pub entries: Vec<ScoreEntry>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
    pub student_id: String,
    /// "", "attend", "absent" or "late".
    pub status: String,
    pub time: String,
    pub check_by: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: String,
    pub course_id: String,
    pub date: String,
    pub late_cutoff: String,
    pub status: SheetStatus,
    pub entries: Vec<AttendanceEntry>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Term {
    pub id: String,
    pub year: String,
    pub term: String,
    pub closed: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub code: String,
    pub building_name: String,
    pub floor: String,
    pub room: String,
    pub active: bool,
    pub grid: SlotGrid,
    pub grid_version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassData {
    pub id: String,
    pub class_year: String,
    pub class_room: String,
    pub advisor_id: Option<String>,
    pub finished: bool,
    pub year: String,
    pub term: String,
    pub student_ids: Vec<String>,
    pub grid: SlotGrid,
    pub grid_version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub category: String,
    pub credit: i64,
    pub class_year: String,
    pub instructor_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseTeaches {
    pub year: String,
    pub term: String,
    pub course_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherProfile {
    pub id: String,
    pub name: String,
    pub subject_id: Option<String>,
    pub course_teaches: Vec<CourseTeaches>,
    pub grid: SlotGrid,
    pub grid_version: i64,
}

impl TeacherProfile {
    pub fn teaches_in(&self, year: &str, term: &str) -> bool {
        self.course_teaches
            .iter()
            .any(|c| c.year == year && c.term == term)
    }
}

/// A student's result for one course, as folded into their profile.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResult {
    pub id: String,
    pub grade: f64,
    pub score_work_get: f64,
    pub score_work_full: f64,
    pub score_mid_get: f64,
    pub score_mid_full: f64,
    pub score_final_get: f64,
    pub score_final_full: f64,
    pub credit: i64,
    pub all_date_count: i64,
    pub attend_count: i64,
    pub absent_count: i64,
    pub late_count: i64,
}

impl CourseResult {
    pub fn empty(course_id: &str) -> Self {
        Self {
            id: course_id.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermScore {
    pub year: String,
    pub term: String,
    pub gpa: f64,
    pub term_credit: i64,
    pub course_list: Vec<CourseResult>,
}

impl TermScore {
    pub fn empty(year: &str, term: &str) -> Self {
        Self {
            year: year.to_string(),
            term: term.to_string(),
            gpa: 0.0,
            term_credit: 0,
            course_list: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub id: String,
    pub name: String,
    pub class_id: Option<String>,
    pub gpa: f64,
    pub all_credit: i64,
    pub term_scores: Vec<TermScore>,
}

impl StudentProfile {
    pub fn has_term(&self, year: &str, term: &str) -> bool {
        self.term_scores
            .iter()
            .any(|t| t.year == year && t.term == term)
    }

    pub fn term_mut(&mut self, year: &str, term: &str) -> Option<&mut TermScore> {
        self.term_scores
            .iter_mut()
            .find(|t| t.year == year && t.term == term)
    }
}

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
