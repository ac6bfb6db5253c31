use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::config::Config;
use crate::role::Actor;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub actor: Option<Actor>,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub config: Config,
}
