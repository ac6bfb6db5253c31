//! End-of-term rollover.
//!
//! Every precondition is checked before the first write. The writes then run
//! in a single transaction, so a failure part-way leaves the workspace as it
//! was.

use crate::allocator::OwnershipMismatch;
use crate::config::{ClassYearAdvance, Config};
use crate::error::{CoreError, CoreResult};
use crate::grid::SlotGrid;
use crate::lifecycle;
use crate::model::{now_rfc3339, ClassData, CourseStatus, CourseTeaches, Term, TermScore};
use crate::repo::{self, RolloverRun};
use crate::terms;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseMismatch {
    pub course_id: String,
    #[serde(flatten)]
    pub cell: OwnershipMismatch,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RolloverReport {
    pub run_id: String,
    pub closed_term: Term,
    pub opened_term: Term,
    pub courses_finished: usize,
    pub classes_rolled: usize,
    pub classes_graduated: usize,
    pub teachers_rolled: usize,
    pub student_terms_added: usize,
    pub ownership_mismatches: Vec<CourseMismatch>,
}

/// Next rung of the class-year ladder; `None` once a class graduates.
pub fn advance_class_year(class_year: &str) -> CoreResult<Option<String>> {
    match class_year.trim() {
        "1" => Ok(Some("2".to_string())),
        "2" => Ok(Some("3".to_string())),
        "3" => Ok(Some("4".to_string())),
        "4" => Ok(Some("5".to_string())),
        "5" => Ok(Some("6".to_string())),
        "6" => Ok(None),
        other => Err(CoreError::precondition(format!(
            "class year {other:?} is not on the ladder"
        ))),
    }
}

enum ClassPlan {
    Graduate(ClassData),
    Roll(ClassData),
}

fn plan_classes(conn: &Connection, config: &Config, next: &(String, String)) -> CoreResult<Vec<ClassPlan>> {
    let advance = match config.class_year_advance {
        ClassYearAdvance::NewYear => next.1 == "1",
        ClassYearAdvance::EveryTerm => true,
    };
    let mut plans = Vec::new();
    for mut class in repo::list_unfinished_classes(conn)? {
        if class.year == next.0 && class.term == next.1 {
            continue;
        }
        if advance {
            match advance_class_year(&class.class_year)? {
                Some(y) => class.class_year = y,
                None => {
                    class.finished = true;
                    plans.push(ClassPlan::Graduate(class));
                    continue;
                }
            }
        }
        class.year = next.0.clone();
        class.term = next.1.clone();
        class.grid = SlotGrid::new();
        plans.push(ClassPlan::Roll(class));
    }
    Ok(plans)
}

/// Close the open term, finish its summarized courses, move classes and
/// teachers onto the next term and open it.
pub fn end_term(conn: &Connection, config: &Config) -> CoreResult<RolloverReport> {
    let started_at = now_rfc3339();
    let open = terms::current(conn)?;

    let courses = repo::list_courses_by_term(conn, &open.year, &open.term)?;
    let blocking: Vec<String> = courses
        .iter()
        .filter(|c| !matches!(c.status, CourseStatus::Summary | CourseStatus::Finish))
        .map(|c| c.id.clone())
        .collect();
    if !blocking.is_empty() {
        tracing::warn!(term = %format!("{}/{}", open.year, open.term), blocking = blocking.len(), "rollover blocked");
        return Err(CoreError::CoursesNotFinished {
            course_ids: blocking,
        });
    }
    let mut to_finish = Vec::new();
    for course in courses {
        if course.status != CourseStatus::Summary {
            continue;
        }
        if repo::get_summary(conn, &course.id)?.is_none() {
            return Err(CoreError::precondition(format!(
                "course {} is in summary without a course summary",
                course.id
            )));
        }
        to_finish.push(course);
    }
    let next = terms::next_term(&open.year, &open.term)?;
    if repo::find_term(conn, &next.0, &next.1)?.is_some() {
        return Err(CoreError::precondition(format!(
            "term {}/{} already exists",
            next.0, next.1
        )));
    }
    let class_plans = plan_classes(conn, config, &next)?;

    let run_id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!("rollover", run_id = %run_id, from = %format!("{}/{}", open.year, open.term), to = %format!("{}/{}", next.0, next.1));
    let _guard = span.enter();

    let tx = conn.unchecked_transaction()?;

    let mut ownership_mismatches = Vec::new();
    for course in &mut to_finish {
        let (_, mismatches) = lifecycle::finish_in(&tx, course)?;
        ownership_mismatches.extend(mismatches.into_iter().map(|cell| CourseMismatch {
            course_id: course.id.clone(),
            cell,
        }));
    }

    let now = now_rfc3339();
    repo::close_term(&tx, &open.id, &now)?;
    let mut closed_term = open.clone();
    closed_term.closed = true;
    closed_term.updated_at = now.clone();

    let mut classes_rolled = 0;
    let mut classes_graduated = 0;
    let mut student_terms_added = 0;
    for plan in &class_plans {
        match plan {
            ClassPlan::Graduate(class) => {
                repo::update_class(&tx, class)?;
                classes_graduated += 1;
            }
            ClassPlan::Roll(class) => {
                repo::update_class(&tx, class)?;
                classes_rolled += 1;
                for student_id in &class.student_ids {
                    let Some(mut student) = repo::get_student(&tx, student_id)? else {
                        tracing::warn!(class_id = %class.id, student_id = %student_id, "class lists a student without a profile");
                        continue;
                    };
                    if student.has_term(&next.0, &next.1) {
                        continue;
                    }
                    student.term_scores.push(TermScore::empty(&next.0, &next.1));
                    repo::update_student(&tx, &student)?;
                    student_terms_added += 1;
                }
            }
        }
    }

    let mut teachers_rolled = 0;
    for mut teacher in repo::list_teachers(&tx)? {
        if teacher.teaches_in(&next.0, &next.1) {
            continue;
        }
        teacher.grid = SlotGrid::new();
        teacher.course_teaches.push(CourseTeaches {
            year: next.0.clone(),
            term: next.1.clone(),
            course_ids: Vec::new(),
        });
        repo::update_teacher(&tx, &teacher)?;
        teachers_rolled += 1;
    }

    let opened_term = Term {
        id: uuid::Uuid::new_v4().to_string(),
        year: next.0.clone(),
        term: next.1.clone(),
        closed: false,
        created_at: now.clone(),
        updated_at: now,
    };
    repo::insert_term(&tx, &opened_term)?;

    let finished_at = now_rfc3339();
    repo::insert_rollover_run(
        &tx,
        &RolloverRun {
            id: &run_id,
            from: (&open.year, &open.term),
            to: (&next.0, &next.1),
            courses_finished: to_finish.len(),
            classes_rolled,
            classes_graduated,
            teachers_rolled,
            student_terms_added,
            started_at: &started_at,
            finished_at: &finished_at,
        },
    )?;
    tx.commit()?;

    tracing::info!(
        courses_finished = to_finish.len(),
        classes_rolled,
        classes_graduated,
        teachers_rolled,
        student_terms_added,
        mismatches = ownership_mismatches.len(),
        "term rolled over"
    );
    Ok(RolloverReport {
        run_id,
        closed_term,
        opened_term,
        courses_finished: to_finish.len(),
        classes_rolled,
        classes_graduated,
        teachers_rolled,
        student_terms_added,
        ownership_mismatches,
    })
}
