//! Chat Backend Traits
//!
//! Wire types and the trait the Conductor talks to. Implementations handle
//! transport details; the Conductor only sees a reply or a [`BackendError`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::messages::{FeedbackChoice, MessageId};

/// Body of `POST /api/chat`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's (trimmed) text
    pub message: String,
}

impl ChatRequest {
    /// Create a request for `message`
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Successful body of `POST /api/chat`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Reply text (unformatted)
    pub message: String,
    /// Server-assigned interaction id
    pub id: MessageId,
    /// Server-side creation time, if sent (informational only)
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Body of `POST /api/feedback`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackReport {
    /// Reply the feedback is about
    pub id: MessageId,
    /// The user's choice
    pub feedback: FeedbackChoice,
}

/// Failures talking to the chat service
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection, TLS or timeout failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server answered with a non-success status
    #[error("server returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, for the log
        body: String,
    },
    /// The body could not be decoded
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    /// The configured endpoint is not a valid URL
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
    /// The request task ended without producing a result
    #[error("request task ended without a result")]
    Interrupted,
}

/// Chat backend trait
///
/// Implement this to put the Conductor in front of a different transport.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Backend name, for logs
    fn name(&self) -> &str;

    /// Send a user message and wait for the complete reply
    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply, BackendError>;

    /// Report feedback on a reply; the response body is returned for logging only
    async fn send_feedback(
        &self,
        report: &FeedbackReport,
    ) -> Result<serde_json::Value, BackendError>;
}
