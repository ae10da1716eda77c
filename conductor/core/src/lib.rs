//! Chatline Core - Headless Message Pipeline for the chatline widget
//!
//! This crate provides the message pipeline of an embeddable chat widget,
//! independent of whatever draws it. It can drive a browser widget, a
//! terminal, or run headless for testing.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Chat Surfaces                           │
//! │        ┌──────────────┐   ┌───────────┐   ┌──────────────┐       │
//! │        │ Browser (DOM)│   │  Console  │   │   Headless   │       │
//! │        └──────┬───────┘   └─────┬─────┘   └──────┬───────┘       │
//! │               └─────────────────┴────────────────┘               │
//! │                    SurfaceEvent (up)                             │
//! │                  ConductorMessage (down)                         │
//! └───────────────────────────────┼──────────────────────────────────┘
//!                                 │
//! ┌───────────────────────────────┼──────────────────────────────────┐
//! │                         CHATLINE CORE                            │
//! │  ┌────────────────────────────┴───────────────────────────────┐  │
//! │  │                        Conductor                           │  │
//! │  │  ┌────────────┐ ┌───────────┐ ┌──────────┐ ┌────────────┐  │  │
//! │  │  │Conversation│ │  Request  │ │ Feedback │ │  Renderer  │  │  │
//! │  │  │   Store    │ │ Lifecycle │ │Controller│ │ +Formatter │  │  │
//! │  │  └────────────┘ └─────┬─────┘ └────┬─────┘ └────────────┘  │  │
//! │  └────────────────────────┼────────────┼──────────────────────┘  │
//! │                           └─────┬──────┘                         │
//! │                           ChatBackend (HTTP)                     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Conductor`]: Owns the conversation and handles surface events
//! - [`ConductorMessage`]: Directives sent from the Conductor to the surface
//! - [`SurfaceEvent`]: Events sent from the surface to the Conductor
//! - [`ConversationStore`]: Ordered log of the session's messages
//! - [`RequestLifecycle`]: Single-flight chat request state machine
//! - [`HttpBackend`]: Client for the chat and feedback endpoints
//!
//! # Quick Start
//!
//! ```ignore
//! use chatline_core::{Conductor, HttpBackend, SurfaceEvent, WidgetConfig};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (tx, mut rx) = mpsc::channel(100);
//!
//!     let config = WidgetConfig::default();
//!     let backend = HttpBackend::from_config(&config)?;
//!     let mut conductor = Conductor::new(backend, config, tx);
//!
//!     conductor.start().await?;
//!     conductor.handle_event(SurfaceEvent::Connected).await?;
//!
//!     conductor
//!         .handle_event(SurfaceEvent::Submit { input: "Show me remote jobs".into() })
//!         .await?;
//!     conductor.wait_pending().await;
//!
//!     while let Ok(msg) = rx.try_recv() {
//!         // Apply the directive to the surface
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`backend`]: Chat service abstraction and the HTTP implementation
//! - [`conductor`]: Main Conductor struct
//! - [`config`]: Widget configuration (TOML file, environment, overrides)
//! - [`events`]: Events from the surface to the Conductor
//! - [`feedback`]: Feedback recording and reporting
//! - [`formatter`]: Reply text to escaped markup
//! - [`lifecycle`]: Chat request state machine
//! - [`messages`]: Directives from the Conductor to the surface
//! - [`render`]: Message to display element projection
//! - [`security`]: Input validation
//! - [`store`]: Conversation store
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on a DOM, terminal or any other
//! UI framework. Markup is produced only by [`formatter`] and [`render`].

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod conductor;
pub mod config;
pub mod events;
pub mod feedback;
pub mod formatter;
pub mod lifecycle;
pub mod messages;
pub mod render;
pub mod security;
pub mod store;

// Re-exports for convenience
pub use backend::{BackendError, ChatBackend, ChatReply, ChatRequest, FeedbackReport, HttpBackend};
pub use conductor::Conductor;
pub use events::{Key, SurfaceEvent};
pub use feedback::FeedbackController;
pub use formatter::{format, Markup};
pub use lifecycle::{LifecycleState, LocalIdGenerator, RequestLifecycle, StaleResponsePolicy};
pub use messages::{
    ConductorMessage, FeedbackChoice, MessageId, MessageOrigin, MessageRole, NotifyLevel,
};
pub use render::{FeedbackControls, MessageElement, Renderer};
pub use security::{InputValidator, SubmitRejection};
pub use store::{ConversationStore, Message};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, WidgetConfig,
};
