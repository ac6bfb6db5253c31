use crate::config::Config;
use crate::ipc::error::HandlerErr;
use crate::ipc::handlers::courses::load_course;
use crate::ipc::helpers::{get_required_f64, get_required_str, role, to_json, with_db, Op};
use crate::ipc::types::{AppState, Request};
use crate::model::ScoreKind;
use crate::role::Role;
use crate::scores;
use rusqlite::Connection;
use serde_json::json;

fn scores_create(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let course = load_course(conn, &req.params, "courseId")?;
    role(req)?.require_course_staff(&course.instructor_id)?;
    let kind = ScoreKind::parse(&get_required_str(&req.params, "type")?)?;
    let score = scores::create_score(
        conn,
        &course.id,
        &get_required_str(&req.params, "name")?,
        kind,
        get_required_f64(&req.params, "scoreFull")?,
    )?;
    Ok(json!({ "scoreId": score.id, "score": to_json(&score)? }))
}

fn scores_set_student(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let course = load_course(conn, &req.params, "courseId")?;
    role(req)?.require_course_staff(&course.instructor_id)?;
    let score = scores::set_student_score(
        conn,
        &course.id,
        &get_required_str(&req.params, "name")?,
        &get_required_str(&req.params, "studentId")?,
        get_required_f64(&req.params, "scoreGet")?,
        &get_required_str(&req.params, "status")?,
    )?;
    Ok(json!({ "score": to_json(&score)? }))
}

fn scores_list(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let course = load_course(conn, &req.params, "courseId")?;
    let mut list = scores::list_scores(conn, &course.id)?;
    match role(req)? {
        Role::Student(id) if course.student_ids.contains(&id) => {
            for score in &mut list {
                score.entries.retain(|e| e.student_id == id);
            }
        }
        other => other.require_course_staff(&course.instructor_id)?,
    }
    Ok(json!({ "scores": to_json(&list)? }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let op: Op = match req.method.as_str() {
        "scores.create" => scores_create,
        "scores.setStudent" => scores_set_student,
        "scores.list" => scores_list,
        _ => return None,
    };
    Some(with_db(state, req, op))
}
