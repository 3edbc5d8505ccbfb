//! JSON bodies of the agent-execution endpoint (`POST /execute`).
//!
//! Shared by the sidecar that serves it and the backend that calls it for
//! remote agents.

use serde::{Deserialize, Serialize};

/// A prompt for one agent run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub input: String,
    #[serde(rename = "apiKey", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// The reply: either the agent's combined output or an error message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecuteReply {
    pub fn output(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            output: None,
            error: Some(message.into()),
        }
    }
}

/// Health check body of the sidecar's `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case_api_key() {
        let req = ExecuteRequest {
            input: "list files".into(),
            api_key: Some("sk-test".into()),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["input"], "list files");
        assert_eq!(json["apiKey"], "sk-test");
    }

    #[test]
    fn request_without_key() {
        let req: ExecuteRequest = serde_json::from_str(r#"{"input":"hi"}"#).unwrap();
        assert_eq!(req.api_key, None);
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"input":"hi"}"#);
    }

    #[test]
    fn reply_shapes() {
        assert_eq!(
            serde_json::to_string(&ExecuteReply::output("done")).unwrap(),
            r#"{"output":"done"}"#
        );
        assert_eq!(
            serde_json::to_string(&ExecuteReply::error("No API key")).unwrap(),
            r#"{"error":"No API key"}"#
        );
        let reply: ExecuteReply = serde_json::from_str(r#"{"output":"x","extra":1}"#).unwrap();
        assert_eq!(reply.output.as_deref(), Some("x"));
    }
}
