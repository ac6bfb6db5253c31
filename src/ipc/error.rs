use serde_json::json;

use crate::error::CoreError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        HandlerErr {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<CoreError> for HandlerErr {
    fn from(e: CoreError) -> Self {
        if let CoreError::Internal(msg) = &e {
            tracing::error!(error = %msg, "request failed");
        }
        HandlerErr {
            code: e.code(),
            details: e.details(),
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for HandlerErr {
    fn from(e: serde_json::Error) -> Self {
        CoreError::from(e).into()
    }
}
