//! HTTP Backend Implementation
//!
//! Talks to the chat service over JSON/HTTP with `reqwest`. Both endpoints
//! are plain request/response calls; any non-2xx status is an error and the
//! body is kept for the log.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use super::traits::{BackendError, ChatBackend, ChatReply, ChatRequest, FeedbackReport};
use crate::config::WidgetConfig;

/// Chat service client
#[derive(Clone, Debug)]
pub struct HttpBackend {
    /// Resolved `/api/chat` URL
    chat_url: Url,
    /// Resolved `/api/feedback` URL
    feedback_url: Url,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend for a service root using the default endpoint paths
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        Self::with_paths(base_url, "/api/chat", "/api/feedback", None)
    }

    /// Create from the widget configuration
    pub fn from_config(config: &WidgetConfig) -> Result<Self, BackendError> {
        Self::with_paths(
            &config.base_url,
            &config.chat_path,
            &config.feedback_path,
            config.request_timeout(),
        )
    }

    /// Create with explicit endpoint paths and an optional request timeout
    ///
    /// Paths starting with `/` replace the base URL's path.
    pub fn with_paths(
        base_url: &str,
        chat_path: &str,
        feedback_path: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, BackendError> {
        let base = Url::parse(base_url)
            .map_err(|e| BackendError::InvalidUrl(format!("{base_url}: {e}")))?;
        let join = |path: &str| {
            base.join(path)
                .map_err(|e| BackendError::InvalidUrl(format!("{base_url} + {path}: {e}")))
        };

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            chat_url: join(chat_path)?,
            feedback_url: join(feedback_path)?,
            http_client: builder.build()?,
        })
    }

    /// Resolved chat endpoint
    #[must_use]
    pub fn chat_url(&self) -> &Url {
        &self.chat_url
    }

    /// Resolved feedback endpoint
    #[must_use]
    pub fn feedback_url(&self) -> &Url {
        &self.feedback_url
    }

    /// POST `body` as JSON and return the raw success body
    async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &Url,
        body: &T,
    ) -> Result<Vec<u8>, BackendError> {
        let response = self.http_client.post(url.clone()).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    fn name(&self) -> &str {
        "HTTP"
    }

    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply, BackendError> {
        let body = self.post_json(&self.chat_url, request).await?;
        let reply: ChatReply = serde_json::from_slice(&body)?;
        tracing::debug!(
            id = %reply.id,
            server_timestamp = reply.timestamp.as_deref().unwrap_or("-"),
            chars = reply.message.len(),
            "Chat reply received"
        );
        Ok(reply)
    }

    async fn send_feedback(
        &self,
        report: &FeedbackReport,
    ) -> Result<serde_json::Value, BackendError> {
        let body = self.post_json(&self.feedback_url, report).await?;
        if body.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_slice(&body)?)
    }
}
