//! Typed load/save for every persisted entity.
//!
//! Nested document fields (grids, id lists, per-student entries) live in JSON
//! text columns. Grids carry a `grid_version` that every grid write bumps so
//! the allocator can detect a concurrent writer.

use crate::error::CoreResult;
use crate::grid::SlotGrid;
use crate::model::{
    Attendance, AttendanceEntry, ClassData, Course, CourseStatus, CourseSummary, CourseTeaches,
    DateTime, Location, Score, ScoreEntry, ScoreKind, SheetStatus, StudentProfile, StudentSummary,
    Subject, TeacherProfile, Term, TermScore,
};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;

fn json_col<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn bool_col(row: &Row, idx: usize) -> rusqlite::Result<bool> {
    Ok(row.get::<_, i64>(idx)? != 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridTable {
    Locations,
    Classes,
    Teachers,
}

impl GridTable {
    fn table(self) -> &'static str {
        match self {
            GridTable::Locations => "locations",
            GridTable::Classes => "classes",
            GridTable::Teachers => "teachers",
        }
    }
}

/// Compare-and-swap a grid. Returns false when the stored version moved.
pub fn cas_grid(
    conn: &Connection,
    table: GridTable,
    id: &str,
    grid: &SlotGrid,
    expected_version: i64,
) -> CoreResult<bool> {
    let sql = format!(
        "UPDATE {} SET grid = ?, grid_version = grid_version + 1, updated_at = ?
         WHERE id = ? AND grid_version = ?",
        table.table()
    );
    let changed = conn.execute(
        &sql,
        (
            serde_json::to_string(grid)?,
            crate::model::now_rfc3339(),
            id,
            expected_version,
        ),
    )?;
    Ok(changed == 1)
}

// ---------------------------------------------------------------------------
// terms

const TERM_COLS: &str = "id, year, term, closed, created_at, updated_at";

fn term_from_row(r: &Row) -> rusqlite::Result<Term> {
    Ok(Term {
        id: r.get(0)?,
        year: r.get(1)?,
        term: r.get(2)?,
        closed: bool_col(r, 3)?,
        created_at: r.get(4)?,
        updated_at: r.get(5)?,
    })
}

pub fn insert_term(conn: &Connection, t: &Term) -> CoreResult<()> {
    conn.execute(
        "INSERT INTO terms(id, year, term, closed, created_at, updated_at) VALUES(?, ?, ?, ?, ?, ?)",
        (
            &t.id,
            &t.year,
            &t.term,
            t.closed as i64,
            &t.created_at,
            &t.updated_at,
        ),
    )?;
    Ok(())
}

pub fn open_term(conn: &Connection) -> CoreResult<Option<Term>> {
    let sql = format!("SELECT {TERM_COLS} FROM terms WHERE closed = 0");
    Ok(conn.query_row(&sql, [], term_from_row).optional()?)
}

pub fn find_term(conn: &Connection, year: &str, term: &str) -> CoreResult<Option<Term>> {
    let sql = format!("SELECT {TERM_COLS} FROM terms WHERE year = ? AND term = ?");
    Ok(conn.query_row(&sql, (year, term), term_from_row).optional()?)
}

pub fn list_terms(conn: &Connection) -> CoreResult<Vec<Term>> {
    let sql = format!("SELECT {TERM_COLS} FROM terms ORDER BY rowid");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], term_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn close_term(conn: &Connection, id: &str, updated_at: &str) -> CoreResult<usize> {
    Ok(conn.execute(
        "UPDATE terms SET closed = 1, updated_at = ? WHERE id = ? AND closed = 0",
        (updated_at, id),
    )?)
}

// ---------------------------------------------------------------------------
// locations

const LOCATION_COLS: &str = "id, code, building_name, floor, room, active, grid, grid_version";

fn location_from_row(r: &Row) -> rusqlite::Result<Location> {
    Ok(Location {
        id: r.get(0)?,
        code: r.get(1)?,
        building_name: r.get(2)?,
        floor: r.get(3)?,
        room: r.get(4)?,
        active: bool_col(r, 5)?,
        grid: json_col(r, 6)?,
        grid_version: r.get(7)?,
    })
}

pub fn insert_location(conn: &Connection, l: &Location) -> CoreResult<()> {
    let now = crate::model::now_rfc3339();
    conn.execute(
        "INSERT INTO locations(id, code, building_name, floor, room, active, grid, grid_version, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            &l.id,
            &l.code,
            &l.building_name,
            &l.floor,
            &l.room,
            l.active as i64,
            serde_json::to_string(&l.grid)?,
            l.grid_version,
            &now,
            &now,
        ],
    )?;
    Ok(())
}

pub fn get_location(conn: &Connection, id: &str) -> CoreResult<Option<Location>> {
    let sql = format!("SELECT {LOCATION_COLS} FROM locations WHERE id = ?");
    Ok(conn.query_row(&sql, [id], location_from_row).optional()?)
}

pub fn get_location_by_code(conn: &Connection, code: &str) -> CoreResult<Option<Location>> {
    let sql = format!("SELECT {LOCATION_COLS} FROM locations WHERE code = ?");
    Ok(conn.query_row(&sql, [code], location_from_row).optional()?)
}

// ---------------------------------------------------------------------------
// classes

const CLASS_COLS: &str =
    "id, class_year, class_room, advisor_id, finished, year, term, student_ids, grid, grid_version";

fn class_from_row(r: &Row) -> rusqlite::Result<ClassData> {
    Ok(ClassData {
        id: r.get(0)?,
        class_year: r.get(1)?,
        class_room: r.get(2)?,
        advisor_id: r.get(3)?,
        finished: bool_col(r, 4)?,
        year: r.get(5)?,
        term: r.get(6)?,
        student_ids: json_col(r, 7)?,
        grid: json_col(r, 8)?,
        grid_version: r.get(9)?,
    })
}

pub fn insert_class(conn: &Connection, c: &ClassData) -> CoreResult<()> {
    let now = crate::model::now_rfc3339();
    conn.execute(
        "INSERT INTO classes(id, class_year, class_room, advisor_id, finished, year, term, student_ids, grid, grid_version, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            &c.id,
            &c.class_year,
            &c.class_room,
            &c.advisor_id,
            c.finished as i64,
            &c.year,
            &c.term,
            serde_json::to_string(&c.student_ids)?,
            serde_json::to_string(&c.grid)?,
            c.grid_version,
            &now,
            &now,
        ],
    )?;
    Ok(())
}

pub fn get_class(conn: &Connection, id: &str) -> CoreResult<Option<ClassData>> {
    let sql = format!("SELECT {CLASS_COLS} FROM classes WHERE id = ?");
    Ok(conn.query_row(&sql, [id], class_from_row).optional()?)
}

pub fn list_unfinished_classes(conn: &Connection) -> CoreResult<Vec<ClassData>> {
    let sql = format!("SELECT {CLASS_COLS} FROM classes WHERE finished = 0 ORDER BY class_year, class_room");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], class_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_classes_in_year(conn: &Connection, class_year: &str) -> CoreResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM classes WHERE class_year = ?",
        [class_year],
        |r| r.get(0),
    )?)
}

/// Full save of a class row; bumps the grid version.
pub fn update_class(conn: &Connection, c: &ClassData) -> CoreResult<usize> {
    Ok(conn.execute(
        "UPDATE classes SET class_year = ?, class_room = ?, advisor_id = ?, finished = ?, year = ?, term = ?,
           student_ids = ?, grid = ?, grid_version = grid_version + 1, updated_at = ?
         WHERE id = ?",
        rusqlite::params![
            &c.class_year,
            &c.class_room,
            &c.advisor_id,
            c.finished as i64,
            &c.year,
            &c.term,
            serde_json::to_string(&c.student_ids)?,
            serde_json::to_string(&c.grid)?,
            crate::model::now_rfc3339(),
            &c.id,
        ],
    )?)
}

// ---------------------------------------------------------------------------
// subjects

fn subject_from_row(r: &Row) -> rusqlite::Result<Subject> {
    Ok(Subject {
        id: r.get(0)?,
        name: r.get(1)?,
        category: r.get(2)?,
        credit: r.get(3)?,
        class_year: r.get(4)?,
        instructor_ids: json_col(r, 5)?,
    })
}

pub fn insert_subject(conn: &Connection, s: &Subject) -> CoreResult<()> {
    conn.execute(
        "INSERT INTO subjects(id, name, category, credit, class_year, instructor_ids) VALUES(?, ?, ?, ?, ?, ?)",
        (
            &s.id,
            &s.name,
            &s.category,
            s.credit,
            &s.class_year,
            serde_json::to_string(&s.instructor_ids)?,
        ),
    )?;
    Ok(())
}

pub fn get_subject(conn: &Connection, id: &str) -> CoreResult<Option<Subject>> {
    Ok(conn
        .query_row(
            "SELECT id, name, category, credit, class_year, instructor_ids FROM subjects WHERE id = ?",
            [id],
            subject_from_row,
        )
        .optional()?)
}

// ---------------------------------------------------------------------------
// teachers

const TEACHER_COLS: &str = "id, name, subject_id, course_teaches, grid, grid_version";

fn teacher_from_row(r: &Row) -> rusqlite::Result<TeacherProfile> {
    Ok(TeacherProfile {
        id: r.get(0)?,
        name: r.get(1)?,
        subject_id: r.get(2)?,
        course_teaches: json_col::<Vec<CourseTeaches>>(r, 3)?,
        grid: json_col(r, 4)?,
        grid_version: r.get(5)?,
    })
}

pub fn insert_teacher(conn: &Connection, t: &TeacherProfile) -> CoreResult<()> {
    let now = crate::model::now_rfc3339();
    conn.execute(
        "INSERT INTO teachers(id, name, subject_id, course_teaches, grid, grid_version, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            &t.id,
            &t.name,
            &t.subject_id,
            serde_json::to_string(&t.course_teaches)?,
            serde_json::to_string(&t.grid)?,
            t.grid_version,
            &now,
            &now,
        ],
    )?;
    Ok(())
}

pub fn get_teacher(conn: &Connection, id: &str) -> CoreResult<Option<TeacherProfile>> {
    let sql = format!("SELECT {TEACHER_COLS} FROM teachers WHERE id = ?");
    Ok(conn.query_row(&sql, [id], teacher_from_row).optional()?)
}

pub fn list_teachers(conn: &Connection) -> CoreResult<Vec<TeacherProfile>> {
    let sql = format!("SELECT {TEACHER_COLS} FROM teachers ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], teacher_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Saves the teaching list only; the grid is written through `cas_grid`.
pub fn update_teacher_courses(conn: &Connection, t: &TeacherProfile) -> CoreResult<usize> {
    Ok(conn.execute(
        "UPDATE teachers SET course_teaches = ?, updated_at = ? WHERE id = ?",
        (
            serde_json::to_string(&t.course_teaches)?,
            crate::model::now_rfc3339(),
            &t.id,
        ),
    )?)
}

/// Full save of a teacher row; bumps the grid version.
pub fn update_teacher(conn: &Connection, t: &TeacherProfile) -> CoreResult<usize> {
    Ok(conn.execute(
        "UPDATE teachers SET name = ?, subject_id = ?, course_teaches = ?, grid = ?,
           grid_version = grid_version + 1, updated_at = ?
         WHERE id = ?",
        rusqlite::params![
            &t.name,
            &t.subject_id,
            serde_json::to_string(&t.course_teaches)?,
            serde_json::to_string(&t.grid)?,
            crate::model::now_rfc3339(),
            &t.id,
        ],
    )?)
}

// ---------------------------------------------------------------------------
// students

const STUDENT_COLS: &str = "id, name, class_id, gpa, all_credit, term_scores";

fn student_from_row(r: &Row) -> rusqlite::Result<StudentProfile> {
    Ok(StudentProfile {
        id: r.get(0)?,
        name: r.get(1)?,
        class_id: r.get(2)?,
        gpa: r.get(3)?,
        all_credit: r.get(4)?,
        term_scores: json_col::<Vec<TermScore>>(r, 5)?,
    })
}

pub fn insert_student(conn: &Connection, s: &StudentProfile) -> CoreResult<()> {
    let now = crate::model::now_rfc3339();
    conn.execute(
        "INSERT INTO students(id, name, class_id, gpa, all_credit, term_scores, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            &s.id,
            &s.name,
            &s.class_id,
            s.gpa,
            s.all_credit,
            serde_json::to_string(&s.term_scores)?,
            &now,
            &now,
        ],
    )?;
    Ok(())
}

pub fn get_student(conn: &Connection, id: &str) -> CoreResult<Option<StudentProfile>> {
    let sql = format!("SELECT {STUDENT_COLS} FROM students WHERE id = ?");
    Ok(conn.query_row(&sql, [id], student_from_row).optional()?)
}

pub fn update_student(conn: &Connection, s: &StudentProfile) -> CoreResult<usize> {
    Ok(conn.execute(
        "UPDATE students SET name = ?, class_id = ?, gpa = ?, all_credit = ?, term_scores = ?, updated_at = ?
         WHERE id = ?",
        rusqlite::params![
            &s.name,
            &s.class_id,
            s.gpa,
            s.all_credit,
            serde_json::to_string(&s.term_scores)?,
            crate::model::now_rfc3339(),
            &s.id,
        ],
    )?)
}

// ---------------------------------------------------------------------------
// courses

const COURSE_COLS: &str = "id, status, subject_id, instructor_id, name, credit, year, term, student_ids,
    location_id, class_id, date_time, class_year, class_room, created_at, updated_at";

fn course_from_row(r: &Row) -> rusqlite::Result<Course> {
    let status: String = r.get(1)?;
    let status = CourseStatus::parse(&status)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
    Ok(Course {
        id: r.get(0)?,
        status,
        subject_id: r.get(2)?,
        instructor_id: r.get(3)?,
        name: r.get(4)?,
        credit: r.get(5)?,
        year: r.get(6)?,
        term: r.get(7)?,
        student_ids: json_col(r, 8)?,
        location_id: r.get(9)?,
        class_id: r.get(10)?,
        date_time: json_col::<Vec<DateTime>>(r, 11)?,
        class_year: r.get(12)?,
        class_room: r.get(13)?,
        created_at: r.get(14)?,
        updated_at: r.get(15)?,
    })
}

pub fn insert_course(conn: &Connection, c: &Course) -> CoreResult<()> {
    conn.execute(
        "INSERT INTO courses(id, status, subject_id, instructor_id, name, credit, year, term, student_ids,
           location_id, class_id, date_time, class_year, class_room, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            &c.id,
            c.status.as_str(),
            &c.subject_id,
            &c.instructor_id,
            &c.name,
            c.credit,
            &c.year,
            &c.term,
            serde_json::to_string(&c.student_ids)?,
            &c.location_id,
            &c.class_id,
            serde_json::to_string(&c.date_time)?,
            &c.class_year,
            &c.class_room,
            &c.created_at,
            &c.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_course(conn: &Connection, id: &str) -> CoreResult<Option<Course>> {
    let sql = format!("SELECT {COURSE_COLS} FROM courses WHERE id = ?");
    Ok(conn.query_row(&sql, [id], course_from_row).optional()?)
}

pub fn list_courses_by_term(conn: &Connection, year: &str, term: &str) -> CoreResult<Vec<Course>> {
    let sql = format!("SELECT {COURSE_COLS} FROM courses WHERE year = ? AND term = ? ORDER BY created_at, rowid");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map((year, term), course_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn course_exists_for_subject_class(
    conn: &Connection,
    subject_id: &str,
    class_id: &str,
) -> CoreResult<bool> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM courses WHERE subject_id = ? AND class_id = ? LIMIT 1",
            (subject_id, class_id),
            |r| r.get::<_, i64>(0),
        )
        .optional()?
        .is_some())
}

pub fn update_course_status(conn: &Connection, c: &Course) -> CoreResult<usize> {
    Ok(conn.execute(
        "UPDATE courses SET status = ?, updated_at = ? WHERE id = ?",
        (c.status.as_str(), &c.updated_at, &c.id),
    )?)
}

// ---------------------------------------------------------------------------
// course summaries

pub fn get_summary(conn: &Connection, course_id: &str) -> CoreResult<Option<CourseSummary>> {
    Ok(conn
        .query_row(
            "SELECT id, course_id, student_data, created_at, updated_at FROM course_summaries WHERE course_id = ?",
            [course_id],
            |r| {
                Ok(CourseSummary {
                    id: r.get(0)?,
                    course_id: r.get(1)?,
                    student_data: json_col::<Vec<StudentSummary>>(r, 2)?,
                    created_at: r.get(3)?,
                    updated_at: r.get(4)?,
                })
            },
        )
        .optional()?)
}

pub fn upsert_summary(conn: &Connection, s: &CourseSummary) -> CoreResult<()> {
    conn.execute(
        "INSERT INTO course_summaries(id, course_id, student_data, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?)
         ON CONFLICT(course_id) DO UPDATE SET
           student_data = excluded.student_data,
           updated_at = excluded.updated_at",
        (
            &s.id,
            &s.course_id,
            serde_json::to_string(&s.student_data)?,
            &s.created_at,
            &s.updated_at,
        ),
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// scores

const SCORE_COLS: &str = "id, course_id, kind, name, score_full, entries, created_at, updated_at";

fn score_from_row(r: &Row) -> rusqlite::Result<Score> {
    let kind: String = r.get(2)?;
    let kind = ScoreKind::parse(&kind)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    Ok(Score {
        id: r.get(0)?,
        course_id: r.get(1)?,
        kind,
        name: r.get(3)?,
        score_full: r.get(4)?,
        entries: json_col::<Vec<ScoreEntry>>(r, 5)?,
        created_at: r.get(6)?,
        updated_at: r.get(7)?,
    })
}

pub fn insert_score(conn: &Connection, s: &Score) -> CoreResult<()> {
    conn.execute(
        "INSERT INTO scores(id, course_id, kind, name, score_full, entries, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            &s.id,
            &s.course_id,
            s.kind.as_str(),
            &s.name,
            s.score_full,
            serde_json::to_string(&s.entries)?,
            &s.created_at,
            &s.updated_at,
        ],
    )?;
    Ok(())
}

pub fn list_scores(conn: &Connection, course_id: &str) -> CoreResult<Vec<Score>> {
    let sql = format!("SELECT {SCORE_COLS} FROM scores WHERE course_id = ? ORDER BY created_at, rowid");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([course_id], score_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_score_by_name(conn: &Connection, course_id: &str, name: &str) -> CoreResult<Option<Score>> {
    let sql = format!("SELECT {SCORE_COLS} FROM scores WHERE course_id = ? AND name = ?");
    Ok(conn.query_row(&sql, (course_id, name), score_from_row).optional()?)
}

pub fn course_has_score_kind(conn: &Connection, course_id: &str, kind: ScoreKind) -> CoreResult<bool> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM scores WHERE course_id = ? AND kind = ? LIMIT 1",
            (course_id, kind.as_str()),
            |r| r.get::<_, i64>(0),
        )
        .optional()?
        .is_some())
}

pub fn update_score_entries(conn: &Connection, s: &Score) -> CoreResult<usize> {
    Ok(conn.execute(
        "UPDATE scores SET entries = ?, updated_at = ? WHERE id = ?",
        (serde_json::to_string(&s.entries)?, &s.updated_at, &s.id),
    )?)
}

// ---------------------------------------------------------------------------
// attendance

const ATTENDANCE_COLS: &str = "id, course_id, date, late_cutoff, status, entries, created_at, updated_at";

fn attendance_from_row(r: &Row) -> rusqlite::Result<Attendance> {
    let status: String = r.get(4)?;
    let status = SheetStatus::parse(&status)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    Ok(Attendance {
        id: r.get(0)?,
        course_id: r.get(1)?,
        date: r.get(2)?,
        late_cutoff: r.get(3)?,
        status,
        entries: json_col::<Vec<AttendanceEntry>>(r, 5)?,
        created_at: r.get(6)?,
        updated_at: r.get(7)?,
    })
}

pub fn insert_attendance(conn: &Connection, a: &Attendance) -> CoreResult<()> {
    conn.execute(
        "INSERT INTO attendance(id, course_id, date, late_cutoff, status, entries, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &a.id,
            &a.course_id,
            &a.date,
            &a.late_cutoff,
            a.status.as_str(),
            serde_json::to_string(&a.entries)?,
            &a.created_at,
            &a.updated_at,
        ),
    )?;
    Ok(())
}

pub fn get_attendance(conn: &Connection, course_id: &str, date: &str) -> CoreResult<Option<Attendance>> {
    let sql = format!("SELECT {ATTENDANCE_COLS} FROM attendance WHERE course_id = ? AND date = ?");
    Ok(conn
        .query_row(&sql, (course_id, date), attendance_from_row)
        .optional()?)
}

pub fn list_attendance(conn: &Connection, course_id: &str) -> CoreResult<Vec<Attendance>> {
    let sql = format!("SELECT {ATTENDANCE_COLS} FROM attendance WHERE course_id = ? ORDER BY date");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([course_id], attendance_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn update_attendance_entries(conn: &Connection, a: &Attendance) -> CoreResult<usize> {
    Ok(conn.execute(
        "UPDATE attendance SET status = ?, entries = ?, updated_at = ? WHERE id = ?",
        (a.status.as_str(), serde_json::to_string(&a.entries)?, &a.updated_at, &a.id),
    )?)
}

// ---------------------------------------------------------------------------
// rollover runs

pub struct RolloverRun<'a> {
    pub id: &'a str,
    pub from: (&'a str, &'a str),
    pub to: (&'a str, &'a str),
    pub courses_finished: usize,
    pub classes_rolled: usize,
    pub classes_graduated: usize,
    pub teachers_rolled: usize,
    pub student_terms_added: usize,
    pub started_at: &'a str,
    pub finished_at: &'a str,
}

pub fn insert_rollover_run(conn: &Connection, run: &RolloverRun<'_>) -> CoreResult<()> {
    conn.execute(
        "INSERT INTO rollover_runs(id, from_year, from_term, to_year, to_term, courses_finished,
           classes_rolled, classes_graduated, teachers_rolled, student_terms_added, started_at, finished_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            run.id,
            run.from.0,
            run.from.1,
            run.to.0,
            run.to.1,
            run.courses_finished as i64,
            run.classes_rolled as i64,
            run.classes_graduated as i64,
            run.teachers_rolled as i64,
            run.student_terms_added as i64,
            run.started_at,
            run.finished_at,
        ],
    )?;
    Ok(())
}
