//! Error types for remote backend operations.

use thiserror::Error;

/// Errors that can occur while talking to the catalog or map server.
///
/// No retry is attempted at this level; failures propagate to the
/// orchestration boundary where they are surfaced to the user.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    /// Transport failure: no response was received at all
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// The response body could not be interpreted
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Builds a `Server` error, extracting the human-readable message from a
    /// JSON `detail` or `message` field when the body carries one.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("detail")
                    .or_else(|| v.get("message"))
                    .map(|m| match m {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
            })
            .unwrap_or_else(|| {
                let text = String::from_utf8_lossy(body);
                if text.trim().is_empty() {
                    "request failed".to_string()
                } else {
                    text.into_owned()
                }
            });
        Self::Server { status, message }
    }
}
