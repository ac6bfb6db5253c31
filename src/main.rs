mod allocator;
mod attendance;
mod config;
mod db;
mod error;
mod grading;
mod grid;
mod ipc;
mod lifecycle;
mod model;
mod repo;
mod role;
mod rollover;
mod scores;
mod terms;

use std::io::{self, BufRead, Write};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logs go to stderr; stdout carries one JSON response per line.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("registrard=info"));
    let json = std::env::var("REGISTRARD_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn main() {
    init_tracing();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "registrard started");

    let mut state = ipc::AppState {
        workspace: None,
        db: None,
        config: config::Config::default(),
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to echo back.
                tracing::warn!(error = %e, "unparsable request line");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{resp}");
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    tracing::info!("stdin closed, shutting down");
}
