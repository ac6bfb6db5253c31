use crate::config::Config;
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{get_required_str, role, to_json, with_db, Op};
use crate::ipc::types::{AppState, Request};
use crate::rollover;
use crate::terms;
use rusqlite::Connection;
use serde_json::json;

fn terms_open(conn: &Connection, _: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    role(req)?.require_admin()?;
    let year = get_required_str(&req.params, "year")?;
    let term = get_required_str(&req.params, "term")?;
    let t = terms::open_term(conn, &year, &term)?;
    Ok(json!({ "term": to_json(&t)? }))
}

fn terms_current(conn: &Connection, _: &Config, _: &Request) -> Result<serde_json::Value, HandlerErr> {
    let t = terms::current(conn)?;
    Ok(json!({ "term": to_json(&t)? }))
}

fn terms_list(conn: &Connection, _: &Config, _: &Request) -> Result<serde_json::Value, HandlerErr> {
    let all = terms::list(conn)?;
    Ok(json!({ "terms": to_json(&all)? }))
}

fn terms_end(conn: &Connection, config: &Config, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    role(req)?.require_admin()?;
    let report = rollover::end_term(conn, config)?;
    to_json(&report)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let op: Op = match req.method.as_str() {
        "terms.open" => terms_open,
        "terms.current" => terms_current,
        "terms.list" => terms_list,
        "terms.end" => terms_end,
        _ => return None,
    };
    Some(with_db(state, req, op))
}
