//! Registry of academic terms. Exactly one term is open at a time.

use crate::error::{CoreError, CoreResult};
use crate::model::{now_rfc3339, Term};
use crate::repo;
use rusqlite::Connection;

fn validate_year(year: &str) -> CoreResult<i64> {
    year.trim()
        .parse::<i64>()
        .ok()
        .filter(|y| *y > 0)
        .ok_or_else(|| CoreError::validation(format!("year {year:?} is invalid")))
}

/// The term that follows `(year, term)`: "1" goes to "2" of the same year,
/// "2" goes to "1" of the next year.
pub fn next_term(year: &str, term: &str) -> CoreResult<(String, String)> {
    let y = year
        .trim()
        .parse::<i64>()
        .map_err(|_| CoreError::precondition(format!("open term year {year:?} is not numeric")))?;
    match term.trim() {
        "1" => Ok((y.to_string(), "2".to_string())),
        "2" => Ok(((y + 1).to_string(), "1".to_string())),
        other => Err(CoreError::precondition(format!("term {other:?} is invalid"))),
    }
}

/// Open the very first term of a workspace, or a term after a manual close.
pub fn open_term(conn: &Connection, year: &str, term: &str) -> CoreResult<Term> {
    validate_year(year)?;
    let term = term.trim();
    if term != "1" && term != "2" {
        return Err(CoreError::validation("term must be \"1\" or \"2\""));
    }
    let year = year.trim();
    if let Some(open) = repo::open_term(conn)? {
        return Err(CoreError::precondition(format!(
            "term {}/{} is still open",
            open.year, open.term
        )));
    }
    if repo::find_term(conn, year, term)?.is_some() {
        return Err(CoreError::AlreadyExists(format!("term {year}/{term}")));
    }
    let now = now_rfc3339();
    let t = Term {
        id: uuid::Uuid::new_v4().to_string(),
        year: year.to_string(),
        term: term.to_string(),
        closed: false,
        created_at: now.clone(),
        updated_at: now,
    };
    repo::insert_term(conn, &t)?;
    tracing::info!(year = %t.year, term = %t.term, "term opened");
    Ok(t)
}

pub fn current(conn: &Connection) -> CoreResult<Term> {
    repo::open_term(conn)?.ok_or(CoreError::NoOpenTerm)
}

pub fn list(conn: &Connection) -> CoreResult<Vec<Term>> {
    repo::list_terms(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn next_term_walks_the_academic_year() {
        assert_eq!(
            next_term("2566", "1").expect("next"),
            ("2566".to_string(), "2".to_string())
        );
        assert_eq!(
            next_term("2566", "2").expect("next"),
            ("2567".to_string(), "1".to_string())
        );
        assert!(matches!(
            next_term("2566", "3"),
            Err(CoreError::PreconditionFailed(_))
        ));
        assert!(next_term("abc", "1").is_err());
    }

    #[test]
    fn only_one_term_may_be_open() {
        let conn = db::open_in_memory().expect("db");
        assert!(matches!(current(&conn), Err(CoreError::NoOpenTerm)));

        let t = open_term(&conn, "2566", "1").expect("open");
        assert_eq!(current(&conn).expect("current"), t);
        assert!(matches!(
            open_term(&conn, "2566", "2"),
            Err(CoreError::PreconditionFailed(_))
        ));
        assert_eq!(list(&conn).expect("list").len(), 1);
    }

    #[test]
    fn bad_term_values_are_rejected() {
        let conn = db::open_in_memory().expect("db");
        assert!(matches!(
            open_term(&conn, "2566", "3"),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            open_term(&conn, "", "1"),
            Err(CoreError::Validation(_))
        ));
    }
}
