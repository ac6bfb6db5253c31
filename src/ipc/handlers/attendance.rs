use crate::attendance;
use crate::config::Config;
use crate::ipc::error::HandlerErr;
use crate::ipc::handlers::courses::load_course;
use crate::ipc::helpers::{get_optional_str, get_required_str, role, to_json, with_db, Op};
use crate::ipc::types::{AppState, Request};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde_json::json;

fn parse_at(params: &serde_json::Value) -> Result<DateTime<Utc>, HandlerErr> {
    match get_optional_str(params, "at") {
        None => Ok(Utc::now()),
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|_| HandlerErr::bad_params("at must be an RFC3339 timestamp")),
    }
}

fn attendance_open(conn: &Connection, config: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let course = load_course(conn, &req.params, "courseId")?;
    role(req)?.require_course_staff(&course.instructor_id)?;
    let date = get_required_str(&req.params, "date")?;
    let minutes = match req.params.get("lateAfterMinutes") {
        None | Some(serde_json::Value::Null) => config.default_late_after_minutes,
        Some(v) => v
            .as_i64()
            .ok_or_else(|| HandlerErr::bad_params("lateAfterMinutes must be an integer"))?,
    };
    let sheet = attendance::open(conn, &course.id, &date, minutes, Utc::now())?;
    Ok(json!({ "attendanceId": sheet.id, "attendance": to_json(&sheet)? }))
}

fn attendance_check(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let course = load_course(conn, &req.params, "courseId")?;
    role(req)?.require_attendance_taker(&course.instructor_id)?;
    let sheet = attendance::check(
        conn,
        &course.id,
        &get_required_str(&req.params, "date")?,
        &get_required_str(&req.params, "studentId")?,
        &get_required_str(&req.params, "checkBy")?,
        parse_at(&req.params)?,
    )?;
    Ok(json!({ "attendance": to_json(&sheet)? }))
}

fn attendance_set_status(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let course = load_course(conn, &req.params, "courseId")?;
    role(req)?.require_course_staff(&course.instructor_id)?;
    let sheet = attendance::set_status(
        conn,
        &course.id,
        &get_required_str(&req.params, "date")?,
        &get_required_str(&req.params, "studentId")?,
        &get_required_str(&req.params, "status")?,
    )?;
    Ok(json!({ "attendance": to_json(&sheet)? }))
}

fn attendance_end(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let course = load_course(conn, &req.params, "courseId")?;
    role(req)?.require_course_staff(&course.instructor_id)?;
    let sheet = attendance::end(
        conn,
        &course.id,
        &get_required_str(&req.params, "date")?,
        parse_at(&req.params)?,
    )?;
    Ok(json!({ "attendance": to_json(&sheet)? }))
}

fn attendance_list(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let course = load_course(conn, &req.params, "courseId")?;
    role(req)?.require_course_staff(&course.instructor_id)?;
    let sheets = attendance::list(conn, &course.id)?;
    Ok(json!({ "attendance": to_json(&sheets)? }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let op: Op = match req.method.as_str() {
        "attendance.open" => attendance_open,
        "attendance.check" => attendance_check,
        "attendance.setStatus" => attendance_set_status,
        "attendance.end" => attendance_end,
        "attendance.list" => attendance_list,
        _ => return None,
    };
    Some(with_db(state, req, op))
}
