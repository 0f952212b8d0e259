//! Transcript logging over HTTP.
//!
//! The endpoint takes `{"conversation": ..., "evaluation": ...}` and answers
//! `{"status": "success"}` or `{"status": <other>, "message": ...}`.

use async_trait::async_trait;
use gloo_net::http::Request;
use serde::{Deserialize, Serialize};

use chat_core::ports::LogPort;
use chat_types::LogError;

/// `LogPort` backed by a single HTTP POST per submission
pub struct HttpLogSink {
    endpoint: String,
}

impl HttpLogSink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LogPayload<'a> {
    pub conversation: &'a str,
    pub evaluation: &'a str,
}

#[derive(Debug, Deserialize)]
struct LogResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

#[async_trait(?Send)]
impl LogPort for HttpLogSink {
    async fn submit(&self, transcript: &str, evaluation: &str) -> Result<(), LogError> {
        let payload = LogPayload {
            conversation: transcript,
            evaluation,
        };

        let response = Request::post(&self.endpoint)
            .json(&payload)
            .map_err(|e| LogError::Transport(e.to_string()))?
            .send()
            .await
            .map_err(|e| LogError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LogError::Transport(e.to_string()))?;

        log::debug!("Log endpoint answered HTTP {}", status);
        interpret_log_response(status, &body)
    }
}

/// Decide the outcome of a logging call from its status code and body.
pub fn interpret_log_response(status: u16, body: &str) -> Result<(), LogError> {
    if !(200..300).contains(&status) {
        return Err(LogError::Transport(format!("HTTP {}", status)));
    }

    let data: LogResponse = serde_json::from_str(body)
        .map_err(|e| LogError::Transport(format!("unreadable response: {}", e)))?;

    if data.status == "success" {
        Ok(())
    } else {
        Err(LogError::Rejected(
            data.message.unwrap_or_else(|| "unknown error".to_string()),
        ))
    }
}
