//! Per-meeting attendance sheets and check-in.

use crate::error::{CoreError, CoreResult};
use crate::lifecycle::require_status;
use crate::model::{now_rfc3339, Attendance, AttendanceEntry, Course, CourseStatus, SheetStatus};
use crate::repo;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use rusqlite::Connection;

fn weekday_name(d: Weekday) -> &'static str {
    match d {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

fn running_course(conn: &Connection, course_id: &str) -> CoreResult<Course> {
    let course = repo::get_course(conn, course_id)?
        .ok_or_else(|| CoreError::not_found("course"))?;
    require_status(&course, CourseStatus::Progress)?;
    Ok(course)
}

fn parse_date(date: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| CoreError::validation("date must be YYYY-MM-DD"))
}

fn load_sheet(conn: &Connection, course_id: &str, date: &str) -> CoreResult<Attendance> {
    let date = parse_date(date)?.format("%Y-%m-%d").to_string();
    repo::get_attendance(conn, course_id, &date)?
        .ok_or_else(|| CoreError::not_found("attendance"))
}

fn load_open_sheet(conn: &Connection, course_id: &str, date: &str) -> CoreResult<Attendance> {
    let sheet = load_sheet(conn, course_id, date)?;
    if sheet.status != SheetStatus::Progress {
        return Err(CoreError::InvalidStatusTransition {
            what: "attendance",
            from: sheet.status.as_str().to_string(),
            expected: SheetStatus::Progress.as_str().to_string(),
        });
    }
    Ok(sheet)
}

/// Open the sheet for one meeting date. Students checking in after
/// `now + late_after_minutes` are marked late.
pub fn open(
    conn: &Connection,
    course_id: &str,
    date: &str,
    late_after_minutes: i64,
    now: DateTime<Utc>,
) -> CoreResult<Attendance> {
    let course = running_course(conn, course_id)?;
    let day = parse_date(date)?;
    let weekday = weekday_name(day.weekday());
    if !course.date_time.iter().any(|dt| dt.day == weekday) {
        return Err(CoreError::InvalidDay(weekday.to_string()));
    }
    if late_after_minutes < 0 {
        return Err(CoreError::validation("lateAfterMinutes must not be negative"));
    }
    let date = day.format("%Y-%m-%d").to_string();
    if repo::get_attendance(conn, course_id, &date)?.is_some() {
        return Err(CoreError::AlreadyExists(format!("attendance for {date}")));
    }

    let stamp = now.to_rfc3339();
    let sheet = Attendance {
        id: uuid::Uuid::new_v4().to_string(),
        course_id: course_id.to_string(),
        date,
        late_cutoff: (now + Duration::minutes(late_after_minutes)).to_rfc3339(),
        status: SheetStatus::Progress,
        entries: course
            .student_ids
            .iter()
            .map(|s| AttendanceEntry {
                student_id: s.clone(),
                status: String::new(),
                time: String::new(),
                check_by: String::new(),
                updated_at: stamp.clone(),
            })
            .collect(),
        created_at: stamp.clone(),
        updated_at: stamp,
    };
    repo::insert_attendance(conn, &sheet)?;
    tracing::info!(course_id, date = %sheet.date, cutoff = %sheet.late_cutoff, "attendance opened");
    Ok(sheet)
}

/// Check a student in at `at`: attend up to the cutoff, late afterwards.
pub fn check(
    conn: &Connection,
    course_id: &str,
    date: &str,
    student_id: &str,
    check_by: &str,
    at: DateTime<Utc>,
) -> CoreResult<Attendance> {
    if check_by != "teacher" && check_by != "server" {
        return Err(CoreError::validation("checkBy must be teacher or server"));
    }
    running_course(conn, course_id)?;
    let mut sheet = load_open_sheet(conn, course_id, date)?;
    let cutoff = DateTime::parse_from_rfc3339(&sheet.late_cutoff)
        .map_err(|e| CoreError::Internal(format!("stored late cutoff: {e}")))?
        .with_timezone(&Utc);
    let status = if at <= cutoff { "attend" } else { "late" };
    let stamp = at.to_rfc3339();

    let entry = sheet
        .entries
        .iter_mut()
        .find(|e| e.student_id == student_id)
        .ok_or_else(|| CoreError::not_found("student in attendance"))?;
    entry.status = status.to_string();
    entry.time = stamp.clone();
    entry.check_by = check_by.to_string();
    entry.updated_at = stamp.clone();
    sheet.updated_at = stamp;
    repo::update_attendance_entries(conn, &sheet)?;
    tracing::debug!(course_id, date = %sheet.date, student_id, status, check_by, "student checked in");
    Ok(sheet)
}

/// Teacher override of a student's status for one meeting.
pub fn set_status(
    conn: &Connection,
    course_id: &str,
    date: &str,
    student_id: &str,
    status: &str,
) -> CoreResult<Attendance> {
    if !matches!(status, "attend" | "absent" | "late") {
        return Err(CoreError::validation("status must be attend, absent or late"));
    }
    running_course(conn, course_id)?;
    let mut sheet = load_open_sheet(conn, course_id, date)?;
    let now = now_rfc3339();
    let entry = sheet
        .entries
        .iter_mut()
        .find(|e| e.student_id == student_id)
        .ok_or_else(|| CoreError::not_found("student in attendance"))?;
    entry.status = status.to_string();
    entry.check_by = "teacher".to_string();
    entry.updated_at = now.clone();
    sheet.updated_at = now;
    repo::update_attendance_entries(conn, &sheet)?;
    Ok(sheet)
}

/// Close a sheet: everyone still unchecked is marked absent by the server.
pub fn end(conn: &Connection, course_id: &str, date: &str, at: DateTime<Utc>) -> CoreResult<Attendance> {
    running_course(conn, course_id)?;
    let mut sheet = load_open_sheet(conn, course_id, date)?;
    let stamp = at.to_rfc3339();
    let mut marked = 0;
    for entry in sheet.entries.iter_mut().filter(|e| e.status.is_empty()) {
        entry.status = "absent".to_string();
        entry.time = stamp.clone();
        entry.check_by = "server".to_string();
        entry.updated_at = stamp.clone();
        marked += 1;
    }
    sheet.status = SheetStatus::End;
    sheet.updated_at = stamp;
    repo::update_attendance_entries(conn, &sheet)?;
    tracing::info!(course_id, date = %sheet.date, marked_absent = marked, "attendance ended");
    Ok(sheet)
}

pub fn list(conn: &Connection, course_id: &str) -> CoreResult<Vec<Attendance>> {
    if repo::get_course(conn, course_id)?.is_none() {
        return Err(CoreError::not_found("course"));
    }
    repo::list_attendance(conn, course_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::model::{DateTime as Meeting, Subject, TeacherProfile};
    use crate::grid::SlotGrid;
    use chrono::TimeZone;

    fn seed_running_course(conn: &Connection) {
        repo::insert_subject(
            conn,
            &Subject {
                id: "SCI1".to_string(),
                name: "Science".to_string(),
                category: "core".to_string(),
                credit: 2,
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
                status: CourseStatus::Progress,
                subject_id: "SCI1".to_string(),
                instructor_id: "T1".to_string(),
                name: "Science-2566-1".to_string(),
                credit: 2,
                year: "2566".to_string(),
                term: "1".to_string(),
                student_ids: vec!["S1".to_string(), "S2".to_string()],
                location_id: None,
                class_id: None,
                date_time: vec![Meeting {
                    day: "monday".to_string(),
                    time: vec!["08:30".to_string()],
                }],
                class_year: "1".to_string(),
                class_room: "1".to_string(),
                created_at: String::new(),
                updated_at: String::new(),
            },
        )
        .expect("course");
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, 5, h, m, 0).single().expect("time")
    }

    #[test]
    fn check_in_is_attend_until_cutoff_then_late() {
        let conn = db::open_in_memory().expect("db");
        seed_running_course(&conn);
        // 2023-06-05 is a Monday.
        open(&conn, "c1", "2023-06-05", 15, at(8, 30)).expect("open");

        let sheet = check(&conn, "c1", "2023-06-05", "S1", "server", at(8, 45)).expect("check");
        assert_eq!(sheet.entries[0].status, "attend");
        let sheet = check(&conn, "c1", "2023-06-05", "S2", "teacher", at(8, 46)).expect("check");
        assert_eq!(sheet.entries[1].status, "late");
        assert_eq!(sheet.entries[1].check_by, "teacher");
    }

    #[test]
    fn open_rejects_non_meeting_days_and_duplicates() {
        let conn = db::open_in_memory().expect("db");
        seed_running_course(&conn);
        assert!(matches!(
            open(&conn, "c1", "2023-06-06", 15, at(8, 30)),
            Err(CoreError::InvalidDay(_))
        ));
        assert!(matches!(
            open(&conn, "c1", "05/06/2023", 15, at(8, 30)),
            Err(CoreError::Validation(_))
        ));
        open(&conn, "c1", "2023-06-05", 15, at(8, 30)).expect("open");
        assert!(matches!(
            open(&conn, "c1", "2023-06-05", 15, at(8, 30)),
            Err(CoreError::AlreadyExists(_))
        ));
    }

    #[test]
    fn check_by_must_be_known() {
        let conn = db::open_in_memory().expect("db");
        seed_running_course(&conn);
        open(&conn, "c1", "2023-06-05", 15, at(8, 30)).expect("open");
        assert!(matches!(
            check(&conn, "c1", "2023-06-05", "S1", "camera", at(8, 31)),
            Err(CoreError::Validation(_))
        ));
        let sheet = set_status(&conn, "c1", "2023-06-05", "S1", "absent").expect("set");
        assert_eq!(sheet.entries[0].status, "absent");
    }

    #[test]
    fn ended_sheet_marks_unchecked_students_absent() {
        let conn = db::open_in_memory().expect("db");
        seed_running_course(&conn);
        open(&conn, "c1", "2023-06-05", 15, at(8, 30)).expect("open");
        check(&conn, "c1", "2023-06-05", "S1", "server", at(8, 40)).expect("check");

        let sheet = end(&conn, "c1", "2023-06-05", at(10, 0)).expect("end");
        assert_eq!(sheet.status, SheetStatus::End);
        assert_eq!(sheet.entries[0].status, "attend");
        assert_eq!(sheet.entries[1].status, "absent");
        assert_eq!(sheet.entries[1].check_by, "server");

        for result in [
            check(&conn, "c1", "2023-06-05", "S2", "server", at(10, 5)),
            set_status(&conn, "c1", "2023-06-05", "S2", "attend"),
            end(&conn, "c1", "2023-06-05", at(10, 5)),
        ] {
            assert!(matches!(
                result,
                Err(CoreError::InvalidStatusTransition { what: "attendance", .. })
            ));
        }

        let course = repo::get_course(&conn, "c1").expect("load").expect("course");
        let sheets = list(&conn, "c1").expect("list");
        assert_eq!(sheets[0].status, SheetStatus::End);
        let rows = crate::grading::summarize(&course, &[], &sheets);
        assert_eq!((rows[0].attend_count, rows[0].absent_count, rows[0].late_count), (1, 0, 0));
        assert_eq!((rows[1].attend_count, rows[1].absent_count, rows[1].late_count), (0, 1, 0));
    }
}
