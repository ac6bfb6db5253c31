//! Course summaries and the student transcript fold.

use crate::error::{CoreError, CoreResult};
use crate::model::{
    now_rfc3339, Attendance, Course, CourseResult, CourseSummary, Score, ScoreKind,
    StudentProfile, StudentSummary, TermScore,
};
use crate::repo;
use rusqlite::Connection;

/// Grade points for a total out of 100. Lower bounds are inclusive.
pub fn grade_point(total: f64) -> f64 {
    const LADDER: [(f64, f64); 7] = [
        (80.0, 4.0),
        (75.0, 3.5),
        (70.0, 3.0),
        (65.0, 2.5),
        (60.0, 2.0),
        (55.0, 1.5),
        (50.0, 1.0),
    ];
    LADDER
        .iter()
        .find(|(floor, _)| total >= *floor)
        .map(|(_, gp)| *gp)
        .unwrap_or(0.0)
}

fn student_get(score: &Score, student_id: &str) -> f64 {
    score
        .entries
        .iter()
        .find(|e| e.student_id == student_id)
        .and_then(|e| e.score_get)
        .unwrap_or(0.0)
}

#[derive(Default)]
struct Tally {
    attend: i64,
    absent: i64,
    late: i64,
}

fn tally_attendance(records: &[Attendance], student_id: &str) -> Tally {
    let mut t = Tally::default();
    for rec in records {
        let Some(entry) = rec.entries.iter().find(|e| e.student_id == student_id) else {
            continue;
        };
        match entry.status.as_str() {
            "attend" => t.attend += 1,
            "absent" => t.absent += 1,
            // Unchecked and unknown statuses count as late.
            _ => t.late += 1,
        }
    }
    t
}

/// Per-student summaries for every enrolled student of `course`.
pub fn summarize(course: &Course, scores: &[Score], attendance: &[Attendance]) -> Vec<StudentSummary> {
    let full_of = |kind: ScoreKind| -> f64 {
        scores
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.score_full)
            .sum()
    };
    let mid_full = full_of(ScoreKind::Midterm);
    let final_full = full_of(ScoreKind::Final);
    let work_full_raw = full_of(ScoreKind::Work);
    let work_full = 100.0 - mid_full - final_full;

    course
        .student_ids
        .iter()
        .map(|student_id| {
            let get_of = |kind: ScoreKind| -> f64 {
                scores
                    .iter()
                    .filter(|s| s.kind == kind)
                    .map(|s| student_get(s, student_id))
                    .sum()
            };
            let work_get_raw = get_of(ScoreKind::Work);
            let mid_get = get_of(ScoreKind::Midterm);
            let final_get = get_of(ScoreKind::Final);
            let work_get = if work_full_raw == 0.0 {
                0.0
            } else {
                work_full * work_get_raw / work_full_raw
            };
            let total = work_get + mid_get + final_get;
            let tally = tally_attendance(attendance, student_id);

            StudentSummary {
                student_id: student_id.clone(),
                score_work_get: work_get,
                score_work_full: work_full,
                score_mid_get: mid_get,
                score_mid_full: mid_full,
                score_final_get: final_get,
                score_final_full: final_full,
                grade: grade_point(total),
                all_date_count: attendance.len() as i64,
                attend_count: tally.attend,
                absent_count: tally.absent,
                late_count: tally.late,
            }
        })
        .collect()
}

fn recompute_term(term: &mut TermScore) {
    let weighted: f64 = term
        .course_list
        .iter()
        .map(|c| c.grade * c.credit as f64)
        .sum();
    term.gpa = if term.term_credit == 0 {
        0.0
    } else {
        weighted / term.term_credit as f64
    };
}

fn recompute_profile(profile: &mut StudentProfile) {
    let weighted: f64 = profile
        .term_scores
        .iter()
        .map(|t| t.gpa * t.term_credit as f64)
        .sum();
    profile.gpa = if profile.all_credit == 0 {
        0.0
    } else {
        weighted / profile.all_credit as f64
    };
}

/// Write one course result into the student's transcript and recompute the
/// term and cumulative GPA. Folding the same result again is a no-op.
pub fn fold_into_profile(profile: &mut StudentProfile, course: &Course, summary: &StudentSummary) {
    if !profile.has_term(&course.year, &course.term) {
        profile
            .term_scores
            .push(TermScore::empty(&course.year, &course.term));
    }
    let mut all_credit = profile.all_credit;
    if let Some(term) = profile.term_mut(&course.year, &course.term) {
        let idx = match term.course_list.iter().position(|c| c.id == course.id) {
            Some(i) => i,
            None => {
                term.course_list.push(CourseResult::empty(&course.id));
                term.course_list.len() - 1
            }
        };
        let previous_credit = term.course_list[idx].credit;
        if previous_credit != 0 {
            term.term_credit -= previous_credit;
            all_credit -= previous_credit;
        }

        term.course_list[idx] = CourseResult {
            id: course.id.clone(),
            grade: summary.grade,
            score_work_get: summary.score_work_get,
            score_work_full: summary.score_work_full,
            score_mid_get: summary.score_mid_get,
            score_mid_full: summary.score_mid_full,
            score_final_get: summary.score_final_get,
            score_final_full: summary.score_final_full,
            credit: course.credit,
            all_date_count: summary.all_date_count,
            attend_count: summary.attend_count,
            absent_count: summary.absent_count,
            late_count: summary.late_count,
        };
        term.term_credit += course.credit;
        all_credit += course.credit;
        recompute_term(term);
    }
    profile.all_credit = all_credit;
    recompute_profile(profile);
}

/// Summarize `course` from its stored scores and attendance and replace the
/// stored summary.
pub fn summarize_course(conn: &Connection, course: &Course) -> CoreResult<CourseSummary> {
    let scores = repo::list_scores(conn, &course.id)?;
    let attendance = repo::list_attendance(conn, &course.id)?;
    let student_data = summarize(course, &scores, &attendance);
    let now = now_rfc3339();
    let summary = match repo::get_summary(conn, &course.id)? {
        Some(existing) => CourseSummary {
            student_data,
            updated_at: now,
            ..existing
        },
        None => CourseSummary {
            id: uuid::Uuid::new_v4().to_string(),
            course_id: course.id.clone(),
            student_data,
            created_at: now.clone(),
            updated_at: now,
        },
    };
    repo::upsert_summary(conn, &summary)?;
    tracing::info!(
        course_id = %course.id,
        students = summary.student_data.len(),
        scores = scores.len(),
        attendance_days = attendance.len(),
        "course summarized"
    );
    Ok(summary)
}

/// Fold a summarized course into every listed student's profile. Returns the
/// number of profiles written.
pub fn fold_course(conn: &Connection, course: &Course) -> CoreResult<usize> {
    let summary = repo::get_summary(conn, &course.id)?.ok_or_else(|| {
        CoreError::precondition(format!("course {} has no summary", course.id))
    })?;
    let mut written = 0;
    for row in &summary.student_data {
        let mut profile = repo::get_student(conn, &row.student_id)?
            .ok_or_else(|| CoreError::not_found(format!("student {}", row.student_id)))?;
        fold_into_profile(&mut profile, course, row);
        written += repo::update_student(conn, &profile)?;
    }
    tracing::debug!(course_id = %course.id, written, "grades folded into profiles");
    Ok(written)
}
