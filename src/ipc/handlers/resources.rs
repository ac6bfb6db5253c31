use crate::config::Config;
use crate::error::CoreError;
use crate::grid::SlotGrid;
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{
    get_optional_str, get_required, get_required_str, role, to_json, with_db, Op,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{
    ClassData, CourseTeaches, Location, StudentProfile, Subject, TeacherProfile, TermScore,
};
use crate::repo;
use crate::terms;
use rusqlite::Connection;
use serde_json::json;

fn locations_create(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    role(req)?.require_admin()?;
    let code = get_required_str(&req.params, "code")?;
    let building_name = get_required_str(&req.params, "buildingName")?;
    let floor = get_required_str(&req.params, "floor")?;
    let room = get_required_str(&req.params, "room")?;
    if repo::get_location_by_code(conn, &code)?.is_some() {
        return Err(CoreError::AlreadyExists(format!("location {code}")).into());
    }
    let location = Location {
        id: uuid::Uuid::new_v4().to_string(),
        code,
        building_name,
        floor,
        room,
        active: true,
        grid: SlotGrid::new(),
        grid_version: 0,
    };
    repo::insert_location(conn, &location)?;
    tracing::info!(location_id = %location.id, code = %location.code, "location created");
    Ok(json!({ "locationId": location.id, "location": to_json(&location)? }))
}

fn locations_get(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    role(req)?;
    let id = get_required_str(&req.params, "locationId")?;
    let location = repo::get_location(conn, &id)?.ok_or_else(|| CoreError::not_found("location"))?;
    Ok(json!({ "location": to_json(&location)? }))
}

fn classes_create(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    role(req)?.require_admin()?;
    let term = terms::current(conn)?;
    let room = repo::count_classes_in_year(conn, "1")? + 1;
    let class = ClassData {
        id: uuid::Uuid::new_v4().to_string(),
        class_year: "1".to_string(),
        class_room: room.to_string(),
        advisor_id: None,
        finished: false,
        year: term.year,
        term: term.term,
        student_ids: Vec::new(),
        grid: SlotGrid::new(),
        grid_version: 0,
    };
    repo::insert_class(conn, &class)?;
    tracing::info!(class_id = %class.id, class_room = %class.class_room, "class created");
    Ok(json!({ "classId": class.id, "class": to_json(&class)? }))
}

fn classes_get(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    role(req)?;
    let id = get_required_str(&req.params, "classId")?;
    let class = repo::get_class(conn, &id)?.ok_or_else(|| CoreError::not_found("class"))?;
    Ok(json!({ "class": to_json(&class)? }))
}

fn classes_set_advisor(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    role(req)?.require_admin()?;
    let id = get_required_str(&req.params, "classId")?;
    let advisor_id = get_required_str(&req.params, "advisorId")?;
    let mut class = repo::get_class(conn, &id)?.ok_or_else(|| CoreError::not_found("class"))?;
    if repo::get_teacher(conn, &advisor_id)?.is_none() {
        return Err(CoreError::not_found("teacher profile").into());
    }
    class.advisor_id = Some(advisor_id);
    let updated = repo::update_class(conn, &class)?;
    Ok(json!({ "updated": updated }))
}

fn subjects_create(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    role(req)?.require_admin()?;
    let id = get_required_str(&req.params, "subjectId")?;
    let credit: i64 = get_required(&req.params, "credit")?;
    if credit < 0 {
        return Err(HandlerErr::bad_params("credit must not be negative"));
    }
    if repo::get_subject(conn, &id)?.is_some() {
        return Err(CoreError::AlreadyExists(format!("subject {id}")).into());
    }
    let subject = Subject {
        id,
        name: get_required_str(&req.params, "name")?,
        category: get_optional_str(&req.params, "category").unwrap_or_default(),
        credit,
        class_year: get_required_str(&req.params, "classYear")?,
        instructor_ids: get_required(&req.params, "instructorIds")?,
    };
    repo::insert_subject(conn, &subject)?;
    Ok(json!({ "subjectId": subject.id, "subject": to_json(&subject)? }))
}

fn teachers_create(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    role(req)?.require_admin()?;
    let id = get_required_str(&req.params, "profileId")?;
    if repo::get_teacher(conn, &id)?.is_some() {
        return Err(CoreError::AlreadyExists(format!("teacher profile {id}")).into());
    }
    let course_teaches = match repo::open_term(conn)? {
        Some(t) => vec![CourseTeaches {
            year: t.year,
            term: t.term,
            course_ids: Vec::new(),
        }],
        None => Vec::new(),
    };
    let teacher = TeacherProfile {
        id,
        name: get_required_str(&req.params, "name")?,
        subject_id: get_optional_str(&req.params, "subjectId"),
        course_teaches,
        grid: SlotGrid::new(),
        grid_version: 0,
    };
    repo::insert_teacher(conn, &teacher)?;
    Ok(json!({ "profileId": teacher.id, "teacher": to_json(&teacher)? }))
}

fn teachers_get(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    role(req)?;
    let id = get_required_str(&req.params, "profileId")?;
    let teacher = repo::get_teacher(conn, &id)?.ok_or_else(|| CoreError::not_found("teacher profile"))?;
    Ok(json!({ "teacher": to_json(&teacher)? }))
}

fn students_create(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    role(req)?.require_admin()?;
    let id = get_required_str(&req.params, "profileId")?;
    let name = get_required_str(&req.params, "name")?;
    let class_id = get_required_str(&req.params, "classId")?;
    if repo::get_student(conn, &id)?.is_some() {
        return Err(CoreError::AlreadyExists(format!("student profile {id}")).into());
    }
    let mut class = repo::get_class(conn, &class_id)?.ok_or_else(|| CoreError::not_found("class"))?;
    if class.finished {
        return Err(CoreError::precondition(format!("class {} is finished", class.id)).into());
    }

    let student = StudentProfile {
        id: id.clone(),
        name,
        class_id: Some(class.id.clone()),
        gpa: 0.0,
        all_credit: 0,
        term_scores: vec![TermScore::empty(&class.year, &class.term)],
    };
    let tx = conn.unchecked_transaction().map_err(CoreError::from)?;
    repo::insert_student(&tx, &student)?;
    if !class.student_ids.contains(&id) {
        class.student_ids.push(id);
        repo::update_class(&tx, &class)?;
    }
    tx.commit().map_err(CoreError::from)?;
    Ok(json!({ "profileId": student.id, "student": to_json(&student)? }))
}

fn students_get(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let caller = role(req)?;
    let id = get_required_str(&req.params, "profileId")?;
    if let crate::role::Role::Student(own) = &caller {
        if own != &id {
            return Err(CoreError::Unauthorized("not permission".to_string()).into());
        }
    }
    let student = repo::get_student(conn, &id)?.ok_or_else(|| CoreError::not_found("student profile"))?;
    Ok(json!({ "student": to_json(&student)? }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let op: Op = match req.method.as_str() {
        "locations.create" => locations_create,
        "locations.get" => locations_get,
        "classes.create" => classes_create,
        "classes.get" => classes_get,
        "classes.setAdvisor" => classes_set_advisor,
        "subjects.create" => subjects_create,
        "teachers.create" => teachers_create,
        "teachers.get" => teachers_get,
        "students.create" => students_create,
        "students.get" => students_get,
        _ => return None,
    };
    Some(with_db(state, req, op))
}
