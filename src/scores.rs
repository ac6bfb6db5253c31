use crate::error::{CoreError, CoreResult};
use crate::lifecycle::require_status;
use crate::model::{now_rfc3339, CourseStatus, Score, ScoreEntry, ScoreKind};
use crate::repo;
use rusqlite::Connection;

/// Add a graded item to a running course with an empty entry per student.
pub fn create_score(
    conn: &Connection,
    course_id: &str,
    name: &str,
    kind: ScoreKind,
    score_full: f64,
) -> CoreResult<Score> {
    let course = repo::get_course(conn, course_id)?
        .ok_or_else(|| CoreError::not_found("course"))?;
    require_status(&course, CourseStatus::Progress)?;

    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::validation("name is required"));
    }
    if !score_full.is_finite() || score_full <= 0.0 {
        return Err(CoreError::validation("scoreFull must be greater than 0"));
    }
    if repo::get_score_by_name(conn, course_id, name)?.is_some() {
        return Err(CoreError::AlreadyExists(format!("score {name:?}")));
    }
    if kind != ScoreKind::Work && repo::course_has_score_kind(conn, course_id, kind)? {
        return Err(CoreError::AlreadyExists(format!("{} score", kind.as_str())));
    }

    let now = now_rfc3339();
    let score = Score {
        id: uuid::Uuid::new_v4().to_string(),
        course_id: course_id.to_string(),
        kind,
        name: name.to_string(),
        score_full,
        entries: course
            .student_ids
            .iter()
            .map(|s| ScoreEntry {
                student_id: s.clone(),
                score_get: None,
                status: String::new(),
                updated_at: now.clone(),
            })
            .collect(),
        created_at: now.clone(),
        updated_at: now,
    };
    repo::insert_score(conn, &score)?;
    tracing::info!(course_id, name, kind = kind.as_str(), "score created");
    Ok(score)
}

/// Record one student's mark for a named score.
pub fn set_student_score(
    conn: &Connection,
    course_id: &str,
    name: &str,
    student_id: &str,
    score_get: f64,
    status: &str,
) -> CoreResult<Score> {
    let course = repo::get_course(conn, course_id)?
        .ok_or_else(|| CoreError::not_found("course"))?;
    require_status(&course, CourseStatus::Progress)?;
    if status != "normal" && status != "late" {
        return Err(CoreError::validation("status must be normal or late"));
    }
    let mut score = repo::get_score_by_name(conn, course_id, name.trim())?
        .ok_or_else(|| CoreError::not_found("score"))?;
    if !score_get.is_finite() || score_get < 0.0 || score_get > score.score_full {
        return Err(CoreError::validation(format!(
            "scoreGet must be between 0 and {}",
            score.score_full
        )));
    }
    let now = now_rfc3339();
    let entry = score
        .entries
        .iter_mut()
        .find(|e| e.student_id == student_id)
        .ok_or_else(|| CoreError::not_found("student in score"))?;
    entry.score_get = Some(score_get);
    entry.status = status.to_string();
    entry.updated_at = now.clone();
    score.updated_at = now;
    repo::update_score_entries(conn, &score)?;
    tracing::debug!(course_id, name = %score.name, student_id, "score recorded");
    Ok(score)
}

pub fn list_scores(conn: &Connection, course_id: &str) -> CoreResult<Vec<Score>> {
    if repo::get_course(conn, course_id)?.is_none() {
        return Err(CoreError::not_found("course"));
    }
    repo::list_scores(conn, course_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::grid::SlotGrid;
    use crate::model::{Course, Subject, TeacherProfile};

    fn seed(conn: &Connection, status: CourseStatus) {
        repo::insert_subject(
            conn,
            &Subject {
                id: "ENG1".to_string(),
                name: "English".to_string(),
                category: "core".to_string(),
                credit: 1,
                class_year: "1".to_string(),
                instructor_ids: vec!["T1".to_string()],
            },
        )
        .expect("subject");
        repo::insert_teacher(
            conn,
            &TeacherProfile {
                id: "T1".to_string(),
                name: "Teacher".to_string(),
                subject_id: None,
                course_teaches: Vec::new(),
                grid: SlotGrid::new(),
                grid_version: 0,
            },
        )
        .expect("teacher");
        repo::insert_course(
            conn,
            &Course {
                id: "c1".to_string(),
                status,
                subject_id: "ENG1".to_string(),
                instructor_id: "T1".to_string(),
                name: "English-2566-1".to_string(),
                credit: 1,
                year: "2566".to_string(),
                term: "1".to_string(),
                student_ids: vec!["S1".to_string()],
                location_id: None,
                class_id: None,
                date_time: Vec::new(),
                class_year: "1".to_string(),
                class_room: "1".to_string(),
                created_at: String::new(),
                updated_at: String::new(),
            },
        )
        .expect("course");
    }

    #[test]
    fn entries_are_precreated_and_marks_are_bounded() {
        let conn = db::open_in_memory().expect("db");
        seed(&conn, CourseStatus::Progress);
        let s = create_score(&conn, "c1", "quiz 1", ScoreKind::Work, 10.0).expect("create");
        assert_eq!(s.entries.len(), 1);
        assert_eq!(s.entries[0].score_get, None);

        assert!(matches!(
            set_student_score(&conn, "c1", "quiz 1", "S1", 11.0, "normal"),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            set_student_score(&conn, "c1", "quiz 1", "S1", 5.0, "excused"),
            Err(CoreError::Validation(_))
        ));
        let s = set_student_score(&conn, "c1", "quiz 1", "S1", 10.0, "late").expect("set");
        assert_eq!(s.entries[0].score_get, Some(10.0));
        assert_eq!(s.entries[0].status, "late");
    }

    #[test]
    fn names_and_exam_kinds_are_unique_per_course() {
        let conn = db::open_in_memory().expect("db");
        seed(&conn, CourseStatus::Progress);
        create_score(&conn, "c1", "mid", ScoreKind::Midterm, 30.0).expect("mid");
        assert!(matches!(
            create_score(&conn, "c1", "mid", ScoreKind::Work, 5.0),
            Err(CoreError::AlreadyExists(_))
        ));
        assert!(matches!(
            create_score(&conn, "c1", "mid 2", ScoreKind::Midterm, 5.0),
            Err(CoreError::AlreadyExists(_))
        ));
        create_score(&conn, "c1", "hw1", ScoreKind::Work, 5.0).expect("work");
        create_score(&conn, "c1", "hw2", ScoreKind::Work, 5.0).expect("more work");
        assert_eq!(list_scores(&conn, "c1").expect("list").len(), 3);
    }

    #[test]
    fn scores_need_a_running_course() {
        let conn = db::open_in_memory().expect("db");
        seed(&conn, CourseStatus::Create);
        assert!(matches!(
            create_score(&conn, "c1", "hw", ScoreKind::Work, 5.0),
            Err(CoreError::InvalidStatusTransition { .. })
        ));
    }
}
