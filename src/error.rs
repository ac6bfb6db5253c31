use serde_json::json;
use thiserror::Error;

/// Grid that rejected a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Class,
    Teacher,
    Location,
}

impl Resource {
    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Class => "class",
            Resource::Teacher => "teacher",
            Resource::Location => "location",
        }
    }
}

/// Failures raised by the scheduling, grading and rollover core.
///
/// Validation and lookup failures are always raised before anything is
/// written; storage failures surface as `Internal`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("{what} status invalid: is {from}, expected {expected}")]
    InvalidStatusTransition {
        what: &'static str,
        from: String,
        expected: String,
    },

    #[error("{day} {time} is already used in this {}", .resource.as_str())]
    SlotConflict {
        resource: Resource,
        day: String,
        time: String,
    },

    #[error("day {0} is invalid")]
    InvalidDay(String),

    #[error("time {time} is invalid for {day}")]
    InvalidTime { day: String, time: String },

    #[error("{0}")]
    PreconditionFailed(String),

    #[error("no open academic term")]
    NoOpenTerm,

    #[error("{} course(s) in the term are not summarized or finished", .course_ids.len())]
    CoursesNotFinished { course_ids: Vec<String> },

    #[error("{0} was modified concurrently; retry the request")]
    ConcurrentModification(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        CoreError::NotFound(what.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        CoreError::PreconditionFailed(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "bad_params",
            CoreError::NotFound(_) => "not_found",
            CoreError::AlreadyExists(_) => "already_exists",
            CoreError::InvalidStatusTransition { .. } => "invalid_status_transition",
            CoreError::SlotConflict { .. } => "slot_conflict",
            CoreError::InvalidDay(_) => "invalid_day",
            CoreError::InvalidTime { .. } => "invalid_time",
            CoreError::PreconditionFailed(_) => "precondition_failed",
            CoreError::NoOpenTerm => "no_open_term",
            CoreError::CoursesNotFinished { .. } => "courses_not_finished",
            CoreError::ConcurrentModification(_) => "concurrent_modification",
            CoreError::Unauthorized(_) => "unauthorized",
            CoreError::Internal(_) => "internal",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            CoreError::InvalidStatusTransition { from, expected, .. } => {
                Some(json!({ "from": from, "expected": expected }))
            }
            CoreError::SlotConflict {
                resource,
                day,
                time,
            } => Some(json!({ "resource": resource.as_str(), "day": day, "time": time })),
            CoreError::InvalidTime { day, time } => Some(json!({ "day": day, "time": time })),
            CoreError::CoursesNotFinished { course_ids } => {
                Some(json!({ "courseIds": course_ids }))
            }
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(e: rusqlite::Error) -> Self {
        CoreError::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Internal(e.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
