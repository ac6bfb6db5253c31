//! Slot allocation across the class, teacher and location calendars.
//!
//! A reservation is checked against all three grids before any cell is
//! marked, so a rejected request leaves every grid exactly as it was.

use crate::error::{CoreError, CoreResult, Resource};
use crate::grid::SlotGrid;
use crate::model::{ClassData, Course, DateTime, Location, TeacherProfile};
use crate::repo::{self, GridTable};
use rusqlite::{Connection, ErrorCode, Transaction, TransactionBehavior};
use serde::Serialize;
use std::collections::HashSet;

/// The three calendars a course occupies.
pub struct Calendars<'a> {
    pub class: &'a mut SlotGrid,
    pub teacher: &'a mut SlotGrid,
    pub location: &'a mut SlotGrid,
}

/// A cell that could not be released because another course (or nobody)
/// holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipMismatch {
    pub day: String,
    pub time: String,
    pub owner: Option<String>,
}

fn normalize(requested: &[DateTime]) -> CoreResult<Vec<DateTime>> {
    if requested.is_empty() {
        return Err(CoreError::validation("dateTime is required"));
    }
    let mut seen_days = HashSet::new();
    let mut out = Vec::with_capacity(requested.len());
    for dt in requested {
        let day = dt.day.trim().to_string();
        if day.is_empty() {
            return Err(CoreError::validation("day is required"));
        }
        if !seen_days.insert(day.clone()) {
            return Err(CoreError::validation(format!("day {day} is listed twice")));
        }
        if dt.time.is_empty() {
            return Err(CoreError::validation(format!("time is required for {day}")));
        }
        let mut seen_times = HashSet::new();
        let mut times = Vec::with_capacity(dt.time.len());
        for t in &dt.time {
            let t = t.trim().to_string();
            if !seen_times.insert(t.clone()) {
                return Err(CoreError::validation(format!("time {t} is listed twice for {day}")));
            }
            times.push(t);
        }
        out.push(DateTime { day, time: times });
    }
    Ok(out)
}

fn check_free(grid: &SlotGrid, resource: Resource, day: &str, time: &str) -> CoreResult<()> {
    match grid.slot(day, time) {
        Some(slot) if slot.status => Err(CoreError::SlotConflict {
            resource,
            day: day.to_string(),
            time: time.to_string(),
        }),
        Some(_) => Ok(()),
        None => Err(CoreError::InvalidTime {
            day: day.to_string(),
            time: time.to_string(),
        }),
    }
}

/// One full pass over a single calendar, so every class problem is reported
/// before any teacher problem, and every teacher problem before location.
fn check_all(grid: &SlotGrid, resource: Resource, meetings: &[DateTime]) -> CoreResult<()> {
    for dt in meetings {
        if grid.day(&dt.day).is_none() {
            return Err(CoreError::InvalidDay(dt.day.clone()));
        }
        for time in &dt.time {
            check_free(grid, resource, &dt.day, time)?;
        }
    }
    Ok(())
}

/// Reserve every requested cell for `course_id` in all three calendars.
///
/// Returns the trimmed meeting list. On error no grid is modified.
pub fn reserve(
    course_id: &str,
    cal: Calendars<'_>,
    requested: &[DateTime],
) -> CoreResult<Vec<DateTime>> {
    let meetings = normalize(requested)?;

    check_all(cal.class, Resource::Class, &meetings)?;
    check_all(cal.teacher, Resource::Teacher, &meetings)?;
    check_all(cal.location, Resource::Location, &meetings)?;

    for dt in &meetings {
        for time in &dt.time {
            for grid in [&mut *cal.class, &mut *cal.teacher, &mut *cal.location] {
                if let Some(slot) = grid.slot_mut(&dt.day, time) {
                    slot.occupy(course_id);
                }
            }
        }
    }
    Ok(meetings)
}

/// Clear the cells of `meetings` that `course_id` still owns.
pub fn release(grid: &mut SlotGrid, course_id: &str, meetings: &[DateTime]) -> Vec<OwnershipMismatch> {
    let mut mismatches = Vec::new();
    for dt in meetings {
        for time in &dt.time {
            if let Some(slot) = grid
                .slot_mut(&dt.day, time)
                .filter(|s| s.is_owned_by(course_id))
            {
                slot.clear();
                continue;
            }
            mismatches.push(OwnershipMismatch {
                day: dt.day.clone(),
                time: time.clone(),
                owner: grid.owner(&dt.day, time).map(str::to_string),
            });
        }
    }
    mismatches
}

/// Resources a new course reserves against.
pub struct Booking<'a> {
    pub course_id: &'a str,
    pub class_id: &'a str,
    pub teacher_id: &'a str,
    pub location_id: &'a str,
    pub requested: &'a [DateTime],
}

/// Current rows behind a booking, read outside any write lock.
struct Snapshot {
    class: ClassData,
    teacher: TeacherProfile,
    location: Location,
}

fn load_snapshot(conn: &Connection, booking: &Booking<'_>) -> CoreResult<Snapshot> {
    Ok(Snapshot {
        class: repo::get_class(conn, booking.class_id)?
            .ok_or_else(|| CoreError::not_found("class"))?,
        teacher: repo::get_teacher(conn, booking.teacher_id)?
            .ok_or_else(|| CoreError::not_found("teacher profile"))?,
        location: repo::get_location(conn, booking.location_id)?
            .ok_or_else(|| CoreError::not_found("location"))?,
    })
}

fn is_busy(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _)
            if matches!(f.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

/// Read the three grids, reserve, then compare-and-swap them back under an
/// immediate write transaction. `on_commit` runs in that transaction with the
/// validated meeting list. A moved `grid_version` or a busy database rolls
/// back and starts over, up to `attempts` times.
pub fn reserve_persisted<F>(
    conn: &Connection,
    attempts: u32,
    booking: &Booking<'_>,
    on_commit: F,
) -> CoreResult<Vec<DateTime>>
where
    F: FnMut(&Transaction<'_>, &[DateTime]) -> CoreResult<()>,
{
    reserve_with_loader(conn, attempts, booking, load_snapshot, on_commit)
}

fn reserve_with_loader<L, F>(
    conn: &Connection,
    attempts: u32,
    booking: &Booking<'_>,
    mut load: L,
    mut on_commit: F,
) -> CoreResult<Vec<DateTime>>
where
    L: FnMut(&Connection, &Booking<'_>) -> CoreResult<Snapshot>,
    F: FnMut(&Transaction<'_>, &[DateTime]) -> CoreResult<()>,
{
    for attempt in 1..=attempts.max(1) {
        let Snapshot {
            mut class,
            mut teacher,
            mut location,
        } = load(conn, booking)?;

        let meetings = reserve(
            booking.course_id,
            Calendars {
                class: &mut class.grid,
                teacher: &mut teacher.grid,
                location: &mut location.grid,
            },
            booking.requested,
        )?;
        debug_assert!(class.grid.is_consistent() && teacher.grid.is_consistent() && location.grid.is_consistent());

        let tx = match Transaction::new_unchecked(conn, TransactionBehavior::Immediate) {
            Ok(tx) => tx,
            Err(e) if is_busy(&e) => {
                tracing::warn!(course_id = booking.course_id, attempt, "workspace busy, retrying reservation");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let swapped = repo::cas_grid(&tx, GridTable::Classes, &class.id, &class.grid, class.grid_version)?
            && repo::cas_grid(&tx, GridTable::Teachers, &teacher.id, &teacher.grid, teacher.grid_version)?
            && repo::cas_grid(&tx, GridTable::Locations, &location.id, &location.grid, location.grid_version)?;
        if !swapped {
            tracing::warn!(course_id = booking.course_id, attempt, "grid version moved, retrying reservation");
            drop(tx);
            continue;
        }

        on_commit(&tx, &meetings)?;
        tx.commit()?;
        tracing::debug!(course_id = booking.course_id, attempt, "slots reserved");
        return Ok(meetings);
    }
    Err(CoreError::ConcurrentModification(format!(
        "slot grids for course {}",
        booking.course_id
    )))
}

/// Release a course's cells in its location grid. Runs on the caller's
/// connection or transaction.
pub fn release_location(conn: &Connection, course: &Course) -> CoreResult<Vec<OwnershipMismatch>> {
    let Some(location_id) = course.location_id.as_deref() else {
        return Ok(Vec::new());
    };
    let Some(mut location) = repo::get_location(conn, location_id)? else {
        tracing::warn!(course_id = %course.id, location_id, "location missing on release");
        return Ok(Vec::new());
    };
    let mismatches = release(&mut location.grid, &course.id, &course.date_time);
    for m in &mismatches {
        tracing::warn!(
            course_id = %course.id,
            location_id,
            day = %m.day,
            time = %m.time,
            owner = ?m.owner,
            "location cell not owned by course"
        );
    }
    if !repo::cas_grid(conn, GridTable::Locations, &location.id, &location.grid, location.grid_version)? {
        return Err(CoreError::ConcurrentModification(format!("location {location_id}")));
    }
    tracing::debug!(
        course_id = %course.id,
        location_id,
        still_occupied = location.grid.occupied_count(),
        "location released"
    );
    Ok(mismatches)
}
