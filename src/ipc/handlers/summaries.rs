use crate::config::Config;
use crate::error::CoreError;
use crate::ipc::error::HandlerErr;
use crate::ipc::handlers::courses::load_course;
use crate::ipc::helpers::{get_optional_str, get_required_str, role, to_json, with_db, Op};
use crate::ipc::types::{AppState, Request};
use crate::lifecycle::{self, CourseEvent};
use crate::repo;
use crate::role::Role;
use rusqlite::Connection;
use serde_json::json;

fn summary_run(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let course = load_course(conn, &req.params, "courseId")?;
    role(req)?.require_course_staff(&course.instructor_id)?;
    let outcome = lifecycle::change_status(conn, &course.id, CourseEvent::SummaryCourse)?;
    to_json(&outcome)
}

fn summary_get(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let course = load_course(conn, &req.params, "courseId")?;
    let caller = role(req)?;
    let mut summary = repo::get_summary(conn, &course.id)?
        .ok_or_else(|| CoreError::not_found("course summary"))?;
    match caller {
        Role::Student(id) if course.student_ids.contains(&id) => {
            summary.student_data.retain(|s| s.student_id == id);
        }
        other => other.require_course_staff(&course.instructor_id)?,
    }
    Ok(json!({ "summary": to_json(&summary)? }))
}

/// A student's transcript entry for one term.
fn summary_student(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student_id = match role(req)? {
        Role::Student(id) => id,
        Role::Admin => get_optional_str(&req.params, "studentId")
            .ok_or_else(|| HandlerErr::bad_params("missing studentId"))?,
        Role::Teacher(_) | Role::Server => {
            return Err(CoreError::Unauthorized("not permission".to_string()).into())
        }
    };
    let year = get_required_str(&req.params, "year")?;
    let term = get_required_str(&req.params, "term")?;
    let profile = repo::get_student(conn, &student_id)?
        .ok_or_else(|| CoreError::not_found("student profile"))?;
    let term_score = profile
        .term_scores
        .iter()
        .find(|t| t.year == year && t.term == term)
        .ok_or_else(|| CoreError::not_found(format!("term {year}/{term} for student")))?;
    Ok(json!({
        "studentId": profile.id,
        "gpa": profile.gpa,
        "allCredit": profile.all_credit,
        "termScore": to_json(term_score)?,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let op: Op = match req.method.as_str() {
        "summary.run" => summary_run,
        "summary.get" => summary_get,
        "summary.student" => summary_student,
        _ => return None,
    };
    Some(with_db(state, req, op))
}
