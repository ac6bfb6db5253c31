use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::role::Role;

pub type Op = fn(&Connection, &Config, &Request) -> Result<serde_json::Value, HandlerErr>;

/// Run `op` against the open workspace and wrap its outcome in a response.
pub fn with_db(state: &AppState, req: &Request, op: Op) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match op(conn, &state.config, req) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn role(req: &Request) -> Result<Role, HandlerErr> {
    Ok(Role::from_actor(req.actor.as_ref())?)
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {key}")))
}

pub fn get_optional_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn get_required_f64(params: &serde_json::Value, key: &str) -> Result<f64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {key}")))
}

pub fn get_required<T: DeserializeOwned>(params: &serde_json::Value, key: &str) -> Result<T, HandlerErr> {
    let Some(raw) = params.get(key) else {
        return Err(HandlerErr::bad_params(format!("missing {key}")));
    };
    serde_json::from_value(raw.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid {key}: {e}")))
}

pub fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, HandlerErr> {
    Ok(serde_json::to_value(value)?)
}
