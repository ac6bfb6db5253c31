use crate::config::Config;
use crate::error::CoreError;
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{get_required, get_required_str, role, to_json, with_db, Op};
use crate::ipc::types::{AppState, Request};
use crate::lifecycle::{self, CourseEvent, NewCourse};
use crate::model::{Course, DateTime};
use crate::repo;
use crate::role::Role;
use rusqlite::Connection;
use serde_json::json;

pub(super) fn load_course(conn: &Connection, params: &serde_json::Value, key: &str) -> Result<Course, HandlerErr> {
    let id = get_required_str(params, key)?;
    Ok(repo::get_course(conn, &id)?.ok_or_else(|| CoreError::not_found("course"))?)
}

fn courses_create(conn: &Connection, config: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    role(req)?.require_admin()?;
    let new = NewCourse {
        subject_id: get_required_str(&req.params, "subjectId")?,
        instructor_id: get_required_str(&req.params, "instructorId")?,
        class_id: get_required_str(&req.params, "classId")?,
        location: get_required_str(&req.params, "locationId")?,
        date_time: get_required::<Vec<DateTime>>(&req.params, "dateTime")?,
    };
    let course = lifecycle::create_course(conn, config, &new)?;
    Ok(json!({ "courseId": course.id, "course": to_json(&course)? }))
}

fn change(conn: &Connection, req: &Request, id_key: &str, event: CourseEvent) -> Result<serde_json::Value, HandlerErr> {
    let course = load_course(conn, &req.params, id_key)?;
    role(req)?.require_course_staff(&course.instructor_id)?;
    let outcome = lifecycle::change_status(conn, &course.id, event)?;
    to_json(&outcome)
}

fn courses_change_status(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let event = CourseEvent::parse(&get_required_str(&req.params, "event")?)?;
    change(conn, req, "id", event)
}

fn courses_finish(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    change(conn, req, "id", CourseEvent::ChangeToFinish)
}

fn courses_get(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    role(req)?;
    let course = load_course(conn, &req.params, "courseId")?;
    Ok(json!({ "course": to_json(&course)? }))
}

fn courses_list_by_term(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let caller = role(req)?;
    let year = get_required_str(&req.params, "year")?;
    let term = get_required_str(&req.params, "term")?;
    let all = repo::list_courses_by_term(conn, &year, &term)?;
    let visible: Vec<Course> = match &caller {
        Role::Admin => all,
        Role::Teacher(id) => all.into_iter().filter(|c| &c.instructor_id == id).collect(),
        Role::Student(id) => all.into_iter().filter(|c| c.student_ids.contains(id)).collect(),
        Role::Server => return Err(CoreError::Unauthorized("not permission".to_string()).into()),
    };
    Ok(json!({ "courses": to_json(&visible)? }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let op: Op = match req.method.as_str() {
        "courses.create" => courses_create,
        "courses.changeStatus" => courses_change_status,
        "courses.finish" => courses_finish,
        "courses.get" => courses_get,
        "courses.listByTerm" => courses_list_by_term,
        _ => return None,
    };
    Some(with_db(state, req, op))
}
