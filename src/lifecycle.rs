//! Course creation and the course status machine.
//!
//! `create -> progress -> summary -> finish`, with `summary -> progress` as
//! the only backward edge.

use crate::allocator::{self, Booking, OwnershipMismatch};
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::grading;
use crate::model::{
    now_rfc3339, Course, CourseResult, CourseStatus, CourseSummary, CourseTeaches, DateTime,
    TermScore,
};
use crate::repo;
use crate::terms;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseEvent {
    ChangeToProgress,
    SummaryCourse,
    ChangeReverseSummary,
    ChangeToFinish,
}

impl CourseEvent {
    pub fn parse(raw: &str) -> CoreResult<Self> {
        match raw.trim() {
            "ChangeToProgress" => Ok(CourseEvent::ChangeToProgress),
            "SummaryCourse" => Ok(CourseEvent::SummaryCourse),
            "ChangeReverseSummary" => Ok(CourseEvent::ChangeReverseSummary),
            "ChangeToFinish" | "FinishCourse" => Ok(CourseEvent::ChangeToFinish),
            other => Err(CoreError::validation(format!("event {other:?} is invalid"))),
        }
    }

    fn from_to(self) -> (CourseStatus, CourseStatus) {
        match self {
            CourseEvent::ChangeToProgress => (CourseStatus::Create, CourseStatus::Progress),
            CourseEvent::SummaryCourse => (CourseStatus::Progress, CourseStatus::Summary),
            CourseEvent::ChangeReverseSummary => (CourseStatus::Summary, CourseStatus::Progress),
            CourseEvent::ChangeToFinish => (CourseStatus::Summary, CourseStatus::Finish),
        }
    }
}

pub fn require_status(course: &Course, expected: CourseStatus) -> CoreResult<()> {
    if course.status == expected {
        Ok(())
    } else {
        Err(CoreError::InvalidStatusTransition {
            what: "course",
            from: course.status.to_string(),
            expected: expected.to_string(),
        })
    }
}

/// Status reached by applying `event` to a course in `from`.
pub fn next_status(from: CourseStatus, event: CourseEvent) -> CoreResult<CourseStatus> {
    let (expected, to) = event.from_to();
    if from != expected {
        return Err(CoreError::InvalidStatusTransition {
            what: "course",
            from: from.to_string(),
            expected: expected.to_string(),
        });
    }
    Ok(to)
}

fn check_references(course: &Course) -> CoreResult<()> {
    let present = |v: Option<&str>| v.is_some_and(|s| !s.trim().is_empty());
    if course.subject_id.trim().is_empty()
        || course.instructor_id.trim().is_empty()
        || !present(course.location_id.as_deref())
        || !present(course.class_id.as_deref())
    {
        return Err(CoreError::precondition(format!(
            "course {} is missing a subject, instructor, location or class",
            course.id
        )));
    }
    Ok(())
}

pub struct NewCourse {
    pub subject_id: String,
    pub instructor_id: String,
    pub class_id: String,
    /// Location id or location code.
    pub location: String,
    pub date_time: Vec<DateTime>,
}

/// Create a course for the open term and reserve its meeting slots.
pub fn create_course(conn: &Connection, config: &Config, new: &NewCourse) -> CoreResult<Course> {
    let term = terms::current(conn)?;

    let subject = repo::get_subject(conn, &new.subject_id)?
        .ok_or_else(|| CoreError::not_found("subject"))?;
    if !subject.instructor_ids.iter().any(|i| i == &new.instructor_id) {
        return Err(CoreError::validation("instructor does not teach this subject"));
    }
    let class = repo::get_class(conn, &new.class_id)?
        .ok_or_else(|| CoreError::not_found("class"))?;
    if class.finished {
        return Err(CoreError::precondition(format!("class {} is finished", class.id)));
    }
    let location = match repo::get_location(conn, &new.location)? {
        Some(l) => l,
        None => repo::get_location_by_code(conn, &new.location)?
            .ok_or_else(|| CoreError::not_found("location"))?,
    };
    if repo::course_exists_for_subject_class(conn, &subject.id, &class.id)? {
        return Err(CoreError::AlreadyExists("course".to_string()));
    }
    if new.date_time.is_empty() {
        return Err(CoreError::validation("dateTime is required"));
    }
    if repo::get_teacher(conn, &new.instructor_id)?.is_none() {
        return Err(CoreError::not_found("teacher profile"));
    }

    let now = now_rfc3339();
    let mut course = Course {
        id: uuid::Uuid::new_v4().to_string(),
        status: CourseStatus::Create,
        subject_id: subject.id.clone(),
        instructor_id: new.instructor_id.clone(),
        name: format!("{}-{}-{}", subject.name, term.year, term.term),
        credit: subject.credit,
        year: term.year.clone(),
        term: term.term.clone(),
        student_ids: class.student_ids.clone(),
        location_id: Some(location.id.clone()),
        class_id: Some(class.id.clone()),
        date_time: Vec::new(),
        class_year: class.class_year.clone(),
        class_room: class.class_room.clone(),
        created_at: now.clone(),
        updated_at: now,
    };

    let booking = Booking {
        course_id: &course.id,
        class_id: &class.id,
        teacher_id: &new.instructor_id,
        location_id: &location.id,
        requested: &new.date_time,
    };
    let template = course.clone();
    let meetings = allocator::reserve_persisted(conn, config.allocation_retries, &booking, |tx, meetings| {
        let mut c = template.clone();
        c.date_time = meetings.to_vec();
        repo::insert_course(tx, &c)?;

        let mut teacher = repo::get_teacher(tx, &c.instructor_id)?
            .ok_or_else(|| CoreError::not_found("teacher profile"))?;
        match teacher
            .course_teaches
            .iter_mut()
            .find(|t| t.year == c.year && t.term == c.term)
        {
            Some(entry) => entry.course_ids.push(c.id.clone()),
            None => teacher.course_teaches.push(CourseTeaches {
                year: c.year.clone(),
                term: c.term.clone(),
                course_ids: vec![c.id.clone()],
            }),
        }
        repo::update_teacher_courses(tx, &teacher)?;

        for student_id in &c.student_ids {
            let Some(mut student) = repo::get_student(tx, student_id)? else {
                tracing::warn!(course_id = %c.id, student_id = %student_id, "enrolled student has no profile");
                continue;
            };
            if !student.has_term(&c.year, &c.term) {
                student.term_scores.push(TermScore::empty(&c.year, &c.term));
            }
            if let Some(ts) = student.term_mut(&c.year, &c.term) {
                if !ts.course_list.iter().any(|r| r.id == c.id) {
                    ts.course_list.push(CourseResult::empty(&c.id));
                }
            }
            repo::update_student(tx, &student)?;
        }
        Ok(())
    })?;
    course.date_time = meetings;

    tracing::info!(
        course_id = %course.id,
        subject_id = %course.subject_id,
        class_id = %class.id,
        term = %format!("{}/{}", course.year, course.term),
        "course created"
    );
    Ok(course)
}

/// Outcome of a status change.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub course: Course,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<CourseSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ownership_mismatches: Vec<OwnershipMismatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profiles_updated: Option<usize>,
}

/// Fold grades, release the location and mark the course finished, all on
/// the caller's connection or transaction.
pub fn finish_in(conn: &Connection, course: &mut Course) -> CoreResult<(usize, Vec<OwnershipMismatch>)> {
    course.status = next_status(course.status, CourseEvent::ChangeToFinish)?;
    let folded = grading::fold_course(conn, course)?;
    let mismatches = allocator::release_location(conn, course)?;
    course.updated_at = now_rfc3339();
    repo::update_course_status(conn, course)?;
    Ok((folded, mismatches))
}

pub fn change_status(conn: &Connection, course_id: &str, event: CourseEvent) -> CoreResult<Transition> {
    let mut course = repo::get_course(conn, course_id)?
        .ok_or_else(|| CoreError::not_found("course"))?;
    let from = course.status;
    let to = next_status(from, event)?;

    let mut out = Transition {
        course: course.clone(),
        summary: None,
        ownership_mismatches: Vec::new(),
        profiles_updated: None,
    };
    match event {
        CourseEvent::ChangeToProgress => {
            course.status = to;
            course.updated_at = now_rfc3339();
            repo::update_course_status(conn, &course)?;
        }
        CourseEvent::ChangeReverseSummary => {
            check_references(&course)?;
            course.status = to;
            course.updated_at = now_rfc3339();
            repo::update_course_status(conn, &course)?;
        }
        CourseEvent::SummaryCourse => {
            let tx = conn.unchecked_transaction()?;
            let summary = grading::summarize_course(&tx, &course)?;
            course.status = to;
            course.updated_at = now_rfc3339();
            repo::update_course_status(&tx, &course)?;
            tx.commit()?;
            out.summary = Some(summary);
        }
        CourseEvent::ChangeToFinish => {
            let tx = conn.unchecked_transaction()?;
            let (folded, mismatches) = finish_in(&tx, &mut course)?;
            tx.commit()?;
            out.ownership_mismatches = mismatches;
            out.profiles_updated = Some(folded);
        }
    }
    tracing::info!(course_id = %course.id, from = %from, to = %course.status, "course status changed");
    out.course = course;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::grid::SlotGrid;
    use crate::model::{ClassData, Location, StudentProfile, Subject, TeacherProfile};

    fn seed(conn: &Connection) {
        terms::open_term(conn, "2566", "1").expect("term");
        repo::insert_subject(
            conn,
            &Subject {
                id: "MATH1".to_string(),
                name: "Math".to_string(),
                category: "core".to_string(),
                credit: 3,
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
                subject_id: Some("MATH1".to_string()),
                course_teaches: Vec::new(),
                grid: SlotGrid::new(),
                grid_version: 0,
            },
        )
        .expect("teacher");
        repo::insert_location(
            conn,
            &Location {
                id: "L1".to_string(),
                code: "B1-101".to_string(),
                building_name: "B1".to_string(),
                floor: "1".to_string(),
                room: "101".to_string(),
                active: true,
                grid: SlotGrid::new(),
                grid_version: 0,
            },
        )
        .expect("location");
        repo::insert_class(
            conn,
            &ClassData {
                id: "C1".to_string(),
                class_year: "1".to_string(),
                class_room: "1".to_string(),
                advisor_id: None,
                finished: false,
                year: "2566".to_string(),
                term: "1".to_string(),
                student_ids: vec!["S1".to_string()],
                grid: SlotGrid::new(),
                grid_version: 0,
            },
        )
        .expect("class");
        repo::insert_student(
            conn,
            &StudentProfile {
                id: "S1".to_string(),
                name: "Student".to_string(),
                class_id: Some("C1".to_string()),
                gpa: 0.0,
                all_credit: 0,
                term_scores: vec![TermScore::empty("2566", "1")],
            },
        )
        .expect("student");
    }

    fn new_course(times: &[&str]) -> NewCourse {
        NewCourse {
            subject_id: "MATH1".to_string(),
            instructor_id: "T1".to_string(),
            class_id: "C1".to_string(),
            location: "B1-101".to_string(),
            date_time: vec![DateTime {
                day: "monday".to_string(),
                time: times.iter().map(|t| t.to_string()).collect(),
            }],
        }
    }

    #[test]
    fn events_only_fire_from_their_source_status() {
        use CourseEvent::*;
        use CourseStatus::*;
        assert_eq!(next_status(Create, ChangeToProgress).expect("ok"), Progress);
        assert_eq!(next_status(Progress, SummaryCourse).expect("ok"), Summary);
        assert_eq!(next_status(Summary, ChangeReverseSummary).expect("ok"), Progress);
        assert_eq!(next_status(Summary, ChangeToFinish).expect("ok"), Finish);

        for (from, ev) in [
            (Create, SummaryCourse),
            (Create, ChangeToFinish),
            (Progress, ChangeToFinish),
            (Finish, ChangeReverseSummary),
            (Finish, ChangeToProgress),
        ] {
            assert!(matches!(
                next_status(from, ev),
                Err(CoreError::InvalidStatusTransition { .. })
            ));
        }
        assert!(CourseEvent::parse("Bogus").is_err());
        assert_eq!(CourseEvent::parse("FinishCourse").expect("alias"), ChangeToFinish);
    }

    #[test]
    fn create_course_reserves_and_links_everything() {
        let conn = db::open_in_memory().expect("db");
        seed(&conn);
        let course = create_course(&conn, &Config::default(), &new_course(&["08:30", "09:00"]))
            .expect("create");

        assert_eq!(course.name, "Math-2566-1");
        assert_eq!(course.credit, 3);
        assert_eq!(course.student_ids, vec!["S1".to_string()]);
        assert_eq!(course.location_id.as_deref(), Some("L1"));

        let loc = repo::get_location(&conn, "L1").expect("q").expect("loc");
        assert_eq!(loc.grid.owner("monday", "08:30"), Some(course.id.as_str()));
        assert_eq!(loc.grid_version, 1);
        let teacher = repo::get_teacher(&conn, "T1").expect("q").expect("teacher");
        assert_eq!(teacher.course_teaches[0].course_ids, vec![course.id.clone()]);
        assert_eq!(teacher.grid.occupied_count(), 2);
        let student = repo::get_student(&conn, "S1").expect("q").expect("student");
        assert_eq!(student.term_scores[0].course_list[0].id, course.id);
    }

    #[test]
    fn duplicate_subject_class_pair_is_rejected() {
        let conn = db::open_in_memory().expect("db");
        seed(&conn);
        create_course(&conn, &Config::default(), &new_course(&["08:30"])).expect("first");
        let e = create_course(&conn, &Config::default(), &new_course(&["10:00"])).expect_err("dup");
        assert!(matches!(e, CoreError::AlreadyExists(_)));
    }

    #[test]
    fn full_lifecycle_folds_grades_and_releases_location() {
        let conn = db::open_in_memory().expect("db");
        seed(&conn);
        let course = create_course(&conn, &Config::default(), &new_course(&["08:30"])).expect("create");

        change_status(&conn, &course.id, CourseEvent::ChangeToProgress).expect("progress");
        let e = change_status(&conn, &course.id, CourseEvent::ChangeToFinish).expect_err("too early");
        assert!(matches!(e, CoreError::InvalidStatusTransition { .. }));

        let summarized = change_status(&conn, &course.id, CourseEvent::SummaryCourse).expect("summary");
        assert_eq!(summarized.course.status, CourseStatus::Summary);
        assert_eq!(summarized.summary.expect("summary").student_data.len(), 1);

        let finished = change_status(&conn, &course.id, CourseEvent::ChangeToFinish).expect("finish");
        assert_eq!(finished.course.status, CourseStatus::Finish);
        assert_eq!(finished.profiles_updated, Some(1));
        assert!(finished.ownership_mismatches.is_empty());

        let loc = repo::get_location(&conn, "L1").expect("q").expect("loc");
        assert_eq!(loc.grid.occupied_count(), 0);
        let class = repo::get_class(&conn, "C1").expect("q").expect("class");
        assert_eq!(class.grid.owner("monday", "08:30"), Some(course.id.as_str()));
        let student = repo::get_student(&conn, "S1").expect("q").expect("student");
        assert_eq!(student.all_credit, 3);
    }

    #[test]
    fn create_requires_an_open_term() {
        let conn = db::open_in_memory().expect("db");
        let e = create_course(&conn, &Config::default(), &new_course(&["08:30"])).expect_err("no term");
        assert!(matches!(e, CoreError::NoOpenTerm));
    }
}
