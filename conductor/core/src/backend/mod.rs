//! Chat Endpoint Integration
//!
//! Access to the remote chat service through a common trait, so the
//! Conductor can be driven by the real HTTP endpoints or by a test double.
//!
//! # Endpoints
//!
//! - `POST /api/chat` - send a user message, receive `{ message, id }`
//! - `POST /api/feedback` - report `{ id, feedback }` for a reply
//!
//! # Usage
//!
//! ```ignore
//! use chatline_core::backend::{ChatBackend, ChatRequest, HttpBackend};
//!
//! let backend = HttpBackend::new("http://127.0.0.1:5000")?;
//! let reply = backend.send_chat(&ChatRequest::new("Any remote roles?")).await?;
//! ```

mod http;
mod traits;

pub use http::HttpBackend;
pub use traits::{BackendError, ChatBackend, ChatReply, ChatRequest, FeedbackReport};
