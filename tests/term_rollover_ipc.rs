use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_registrard");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn registrard");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
    actor: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
        "actor": actor,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
    actor: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params, actor);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .map(|e| e.to_string())
            .unwrap_or_default()
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

fn admin() -> serde_json::Value {
    json!({ "role": "admin" })
}

fn teacher(id: &str) -> serde_json::Value {
    json!({ "role": "teacher", "profileId": id })
}

fn student(id: &str) -> serde_json::Value {
    json!({ "role": "student", "profileId": id })
}

fn seed_course(
    si: &mut ChildStdin,
    rd: &mut BufReader<ChildStdout>,
    workspace: &std::path::Path,
) -> (String, String) {
    request_ok(si, rd, "s1", "workspace.select", json!({ "path": workspace.to_string_lossy() }), json!(null));
    request_ok(si, rd, "s2", "terms.open", json!({ "year": "2566", "term": "2" }), admin());
    let loc = request_ok(
        si,
        rd,
        "s3",
        "locations.create",
        json!({ "code": "GYM", "buildingName": "Sport", "floor": "1", "room": "G" }),
        admin(),
    );
    let class = request_ok(si, rd, "s4", "classes.create", json!({}), admin());
    let class_id = class["classId"].as_str().expect("classId").to_string();
    request_ok(si, rd, "s5", "teachers.create", json!({ "profileId": "T1", "name": "Coach" }), admin());
    request_ok(
        si,
        rd,
        "s6",
        "subjects.create",
        json!({
            "subjectId": "PE1",
            "name": "PE",
            "category": "health",
            "credit": 1,
            "classYear": "1",
            "instructorIds": ["T1"]
        }),
        admin(),
    );
    request_ok(
        si,
        rd,
        "s7",
        "students.create",
        json!({ "profileId": "S1", "name": "S1", "classId": class_id }),
        admin(),
    );
    let created = request_ok(
        si,
        rd,
        "s8",
        "courses.create",
        json!({
            "subjectId": "PE1",
            "instructorId": "T1",
            "classId": class_id,
            "locationId": loc["locationId"],
            "dateTime": [{ "day": "thursday", "time": ["14:00"] }]
        }),
        admin(),
    );
    let course_id = created["courseId"].as_str().expect("courseId").to_string();
    request_ok(
        si,
        rd,
        "s9",
        "courses.changeStatus",
        json!({ "id": course_id, "event": "ChangeToProgress" }),
        teacher("T1"),
    );
    (course_id, class_id)
}

#[test]
fn end_term_waits_for_summaries_then_rolls_everything_forward() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let (si, rd) = (&mut stdin, &mut reader);
    let (course_id, class_id) = seed_course(si, rd, workspace.path());

    let blocked = request(si, rd, "1", "terms.end", json!({}), admin());
    assert_eq!(error_code(&blocked), "courses_not_finished");
    assert_eq!(blocked["error"]["details"]["courseIds"], json!([course_id]));
    let still = request_ok(si, rd, "2", "terms.current", json!({}), json!(null));
    assert_eq!(still["term"]["term"], "2");

    request_ok(si, rd, "3", "summary.run", json!({ "courseId": course_id }), teacher("T1"));
    let report = request_ok(si, rd, "4", "terms.end", json!({}), admin());
    assert!(report["runId"].as_str().is_some_and(|s| !s.is_empty()));
    assert_eq!(report["coursesFinished"], 1);
    assert_eq!(report["classesRolled"], 1);
    assert_eq!(report["closedTerm"]["closed"], true);
    assert_eq!(report["openedTerm"]["year"], "2567");
    assert_eq!(report["openedTerm"]["term"], "1");

    let current = request_ok(si, rd, "5", "terms.current", json!({}), json!(null));
    assert_eq!(current["term"]["year"], "2567");
    let listed = request_ok(si, rd, "6", "terms.list", json!({}), json!(null));
    assert_eq!(listed["terms"].as_array().map(|a| a.len()), Some(2));

    let course = request_ok(si, rd, "7", "courses.get", json!({ "courseId": course_id }), admin());
    assert_eq!(course["course"]["status"], "finish");
    let class = request_ok(si, rd, "8", "classes.get", json!({ "classId": class_id }), admin());
    assert_eq!(class["class"]["classYear"], "2");
    assert_eq!(class["class"]["year"], "2567");
    let student_row = request_ok(si, rd, "9", "students.get", json!({ "profileId": "S1" }), admin());
    let terms: Vec<String> = student_row["student"]["termScores"]
        .as_array()
        .expect("termScores")
        .iter()
        .map(|t| format!("{}/{}", t["year"].as_str().unwrap_or(""), t["term"].as_str().unwrap_or("")))
        .collect();
    assert_eq!(terms, vec!["2566/2".to_string(), "2567/1".to_string()]);
    let teacher_row = request_ok(si, rd, "10", "teachers.get", json!({ "profileId": "T1" }), admin());
    let teaches = teacher_row["teacher"]["courseTeaches"].as_array().expect("courseTeaches");
    assert_eq!(teaches.last().map(|t| t["year"].clone()), Some(json!("2567")));

    let mine = request_ok(
        si,
        rd,
        "11",
        "courses.listByTerm",
        json!({ "year": "2566", "term": "2" }),
        student("S1"),
    );
    assert_eq!(mine["courses"].as_array().map(|a| a.len()), Some(1));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn end_term_without_open_term_fails() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let (si, rd) = (&mut stdin, &mut reader);
    request_ok(si, rd, "1", "workspace.select", json!({ "path": workspace.path().to_string_lossy() }), json!(null));
    let resp = request(si, rd, "2", "terms.end", json!({}), admin());
    assert_eq!(error_code(&resp), "no_open_term");
    drop(stdin);
    let _ = child.wait();
}

#[test]
fn workspace_config_controls_class_year_policy() {
    let workspace = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        workspace.path().join("registrard.toml"),
        "class_year_advance = \"every_term\"\n",
    )
    .expect("write config");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let (si, rd) = (&mut stdin, &mut reader);
    request_ok(si, rd, "1", "workspace.select", json!({ "path": workspace.path().to_string_lossy() }), json!(null));
    request_ok(si, rd, "2", "terms.open", json!({ "year": "2566", "term": "1" }), admin());
    let class = request_ok(si, rd, "3", "classes.create", json!({}), admin());
    let class_id = class["classId"].as_str().expect("classId").to_string();
    request_ok(si, rd, "4", "terms.end", json!({}), admin());
    let class = request_ok(si, rd, "5", "classes.get", json!({ "classId": class_id }), admin());
    assert_eq!(class["class"]["classYear"], "2");
    assert_eq!(class["class"]["term"], "2");
    drop(stdin);
    let _ = child.wait();
}

#[test]
fn malformed_config_keeps_workspace_closed() {
    let workspace = tempfile::tempdir().expect("tempdir");
    std::fs::write(workspace.path().join("registrard.toml"), "allocation_retries = 0\n").expect("write config");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let (si, rd) = (&mut stdin, &mut reader);
    let resp = request(si, rd, "1", "workspace.select", json!({ "path": workspace.path().to_string_lossy() }), json!(null));
    assert_eq!(error_code(&resp), "config_invalid");
    let after = request(si, rd, "2", "terms.list", json!({}), json!(null));
    assert_eq!(error_code(&after), "no_workspace");
    drop(stdin);
    let _ = child.wait();
}
