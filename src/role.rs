use crate::error::CoreError;
use serde::Deserialize;

/// Caller identity as resolved by the (external) auth layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    #[serde(default)]
    pub profile_id: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Admin,
    Teacher(String),
    Student(String),
    /// Attendance devices and other trusted automation.
    Server,
}

impl Role {
    pub fn from_actor(actor: Option<&Actor>) -> Result<Role, CoreError> {
        let Some(actor) = actor else {
            return Err(CoreError::Unauthorized("missing actor".to_string()));
        };
        let profile_id = actor.profile_id.trim().to_string();
        match actor.role.trim() {
            "admin" => Ok(Role::Admin),
            "server" => Ok(Role::Server),
            "teacher" | "student" if profile_id.is_empty() => Err(CoreError::Unauthorized(
                "actor profileId is required".to_string(),
            )),
            "teacher" => Ok(Role::Teacher(profile_id)),
            "student" => Ok(Role::Student(profile_id)),
            other => Err(CoreError::Unauthorized(format!("role {other:?} is invalid"))),
        }
    }

    pub fn require_admin(&self) -> Result<(), CoreError> {
        match self {
            Role::Admin => Ok(()),
            Role::Teacher(_) | Role::Student(_) | Role::Server => {
                Err(CoreError::Unauthorized("not permission".to_string()))
            }
        }
    }

    /// Admins manage every course; a teacher only the courses they teach.
    pub fn require_course_staff(&self, instructor_id: &str) -> Result<(), CoreError> {
        match self {
            Role::Admin => Ok(()),
            Role::Teacher(id) if id == instructor_id => Ok(()),
            Role::Teacher(_) | Role::Student(_) | Role::Server => {
                Err(CoreError::Unauthorized("not permission".to_string()))
            }
        }
    }

    /// Like `require_course_staff` but also lets attendance devices in.
    pub fn require_attendance_taker(&self, instructor_id: &str) -> Result<(), CoreError> {
        match self {
            Role::Server => Ok(()),
            _ => self.require_course_staff(instructor_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: &str, id: &str) -> Actor {
        Actor {
            profile_id: id.to_string(),
            role: role.to_string(),
        }
    }

    #[test]
    fn parses_known_roles() {
        assert_eq!(Role::from_actor(Some(&actor("admin", ""))).expect("role"), Role::Admin);
        assert_eq!(
            Role::from_actor(Some(&actor("teacher", "T1"))).expect("role"),
            Role::Teacher("T1".to_string())
        );
        assert!(Role::from_actor(Some(&actor("teacher", " "))).is_err());
        assert!(Role::from_actor(Some(&actor("parent", "P1"))).is_err());
        assert!(Role::from_actor(None).is_err());
    }

    #[test]
    fn teachers_only_manage_their_own_courses() {
        let t = Role::Teacher("T1".to_string());
        assert!(t.require_course_staff("T1").is_ok());
        assert!(t.require_course_staff("T2").is_err());
        assert!(t.require_admin().is_err());
        assert!(Role::Server.require_attendance_taker("T1").is_ok());
        assert!(Role::Student("S1".to_string())
            .require_attendance_taker("T1")
            .is_err());
    }
}
