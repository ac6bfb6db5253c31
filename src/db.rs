use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("registrar.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    init_schema(&conn)?;
    Ok(conn)
}

#[cfg(test)]
pub fn open_in_memory() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS terms(
            id TEXT PRIMARY KEY,
            year TEXT NOT NULL,
            term TEXT NOT NULL,
            closed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(year, term)
        )",
        [],
    )?;
    // At most one open term at any time.
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_terms_single_open ON terms(closed) WHERE closed = 0",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS locations(
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            building_name TEXT NOT NULL,
            floor TEXT NOT NULL,
            room TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            grid TEXT NOT NULL,
            grid_version INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS classes(
            id TEXT PRIMARY KEY,
            class_year TEXT NOT NULL,
            class_room TEXT NOT NULL,
            advisor_id TEXT,
            finished INTEGER NOT NULL DEFAULT 0,
            year TEXT NOT NULL,
            term TEXT NOT NULL,
            student_ids TEXT NOT NULL,
            grid TEXT NOT NULL,
            grid_version INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_classes_finished ON classes(finished)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            credit INTEGER NOT NULL,
            class_year TEXT NOT NULL,
            instructor_ids TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teachers(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            subject_id TEXT,
            course_teaches TEXT NOT NULL,
            grid TEXT NOT NULL,
            grid_version INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            class_id TEXT,
            gpa REAL NOT NULL DEFAULT 0,
            all_credit INTEGER NOT NULL DEFAULT 0,
            term_scores TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(class_id) REFERENCES classes(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_class ON students(class_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses(
            id TEXT PRIMARY KEY,
            status TEXT NOT NULL,
            subject_id TEXT NOT NULL,
            instructor_id TEXT NOT NULL,
            name TEXT NOT NULL,
            credit INTEGER NOT NULL,
            year TEXT NOT NULL,
            term TEXT NOT NULL,
            student_ids TEXT NOT NULL,
            location_id TEXT,
            class_id TEXT,
            date_time TEXT NOT NULL,
            class_year TEXT NOT NULL,
            class_room TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(subject_id) REFERENCES subjects(id),
            FOREIGN KEY(instructor_id) REFERENCES teachers(id),
            FOREIGN KEY(location_id) REFERENCES locations(id),
            FOREIGN KEY(class_id) REFERENCES classes(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_courses_year_term ON courses(year, term)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_courses_subject_class ON courses(subject_id, class_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS course_summaries(
            id TEXT PRIMARY KEY,
            course_id TEXT NOT NULL UNIQUE,
            student_data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(course_id) REFERENCES courses(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS scores(
            id TEXT PRIMARY KEY,
            course_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            name TEXT NOT NULL,
            score_full REAL NOT NULL,
            entries TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(course_id) REFERENCES courses(id),
            UNIQUE(course_id, name)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_scores_course ON scores(course_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance(
            id TEXT PRIMARY KEY,
            course_id TEXT NOT NULL,
            date TEXT NOT NULL,
            late_cutoff TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'progress',
            entries TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(course_id) REFERENCES courses(id),
            UNIQUE(course_id, date)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_course ON attendance(course_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS rollover_runs(
            id TEXT PRIMARY KEY,
            from_year TEXT NOT NULL,
            from_term TEXT NOT NULL,
            to_year TEXT NOT NULL,
            to_term TEXT NOT NULL,
            courses_finished INTEGER NOT NULL,
            classes_rolled INTEGER NOT NULL,
            classes_graduated INTEGER NOT NULL,
            teachers_rolled INTEGER NOT NULL,
            student_terms_added INTEGER NOT NULL,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}
