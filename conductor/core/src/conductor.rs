//! Conductor - The Message Pipeline Core
//!
//! The Conductor owns the conversation and wires surface events to the
//! pipeline stages:
//! - Input validation and the single-flight chat request
//! - Conversation store and rendering
//! - Feedback recording and reporting
//! - Thread, input and scroll directives for the surface
//!
//! # Design Philosophy
//!
//! The Conductor is surface-agnostic. It doesn't know whether it is driving a
//! browser widget, a terminal or a test harness. It communicates through:
//! - `ConductorMessage`: Directives sent TO the surface
//! - `SurfaceEvent`: Events received FROM the surface
//!
//! Every handler takes `&mut self`; the only concurrent work is the chat
//! request and the feedback reports, which run on their own tasks and are
//! reconciled here.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::backend::ChatBackend;
use crate::config::WidgetConfig;
use crate::events::{Key, SurfaceEvent};
use crate::feedback::FeedbackController;
use crate::lifecycle::{Completion, LifecycleState, RequestLifecycle};
use crate::messages::{ConductorMessage, FeedbackChoice, MessageId, NotifyLevel};
use crate::render::Renderer;
use crate::security::{InputValidator, SubmitRejection};
use crate::store::ConversationStore;

/// The Conductor - headless chat widget core
pub struct Conductor<B: ChatBackend> {
    /// Configuration
    config: WidgetConfig,
    /// Chat service
    backend: Arc<B>,
    /// Conversation for this session
    store: ConversationStore,
    /// Outstanding chat request, if any
    lifecycle: RequestLifecycle,
    /// Feedback recording and reporting
    feedback: FeedbackController<B>,
    /// Message to element projection
    renderer: Renderer,
    /// Input validator for submissions
    input_validator: InputValidator,
    /// Channel to send directives to the surface
    tx: mpsc::Sender<ConductorMessage>,
}

impl<B: ChatBackend + 'static> Conductor<B> {
    /// Create a new Conductor with the given backend
    pub fn new(backend: B, config: WidgetConfig, tx: mpsc::Sender<ConductorMessage>) -> Self {
        let backend = Arc::new(backend);
        let lifecycle =
            RequestLifecycle::new(config.apology_message.clone(), config.stale_response_policy);

        Self {
            store: ConversationStore::with_time_format(config.time_format.clone()),
            feedback: FeedbackController::new(Arc::clone(&backend)),
            input_validator: InputValidator::new(config.max_message_chars),
            renderer: Renderer::new(),
            lifecycle,
            backend,
            config,
            tx,
        }
    }

    /// Get current request state
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Get the conversation
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Get the configuration
    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Whether a chat request is outstanding
    pub fn is_sending(&self) -> bool {
        self.lifecycle.is_sending()
    }

    /// Start the Conductor
    ///
    /// Seeds the conversation with the welcome entry, which every later clear
    /// keeps.
    pub async fn start(&mut self) -> anyhow::Result<()> {
        if self.store.is_empty() {
            self.store
                .append_local(self.config.welcome_message.clone(), MessageId::welcome());
        }

        tracing::info!(backend = self.backend.name(), "Conductor started");
        self.set_state(LifecycleState::Idle).await;
        self.send(ConductorMessage::FocusInput).await;
        Ok(())
    }

    /// Handle an event from the surface
    pub async fn handle_event(&mut self, event: SurfaceEvent) -> anyhow::Result<()> {
        match event {
            SurfaceEvent::Connected => {
                self.send(ConductorMessage::Suggestions {
                    items: self.config.suggestions.clone(),
                })
                .await;
                self.send(ConductorMessage::ResetThread {
                    elements: self.renderer.render_all(self.store.messages()),
                })
                .await;
                self.send(ConductorMessage::State {
                    state: self.state(),
                })
                .await;
                self.send(ConductorMessage::SubmitEnabled {
                    enabled: !self.is_sending(),
                })
                .await;
                self.send(ConductorMessage::TypingIndicator {
                    visible: self.is_sending(),
                })
                .await;
                self.send(ConductorMessage::ScrollToLatest).await;
                self.send(ConductorMessage::FocusInput).await;
            }

            SurfaceEvent::Submit { input } => {
                let _ = self.submit(&input).await;
            }

            SurfaceEvent::KeyPressed { key, shift, input } => {
                if SurfaceEvent::is_submit_key(key, shift) {
                    let _ = self.submit(&input).await;
                } else if key == Key::Enter {
                    tracing::trace!("Shift+Enter left to the surface");
                }
            }

            SurfaceEvent::SuggestionClicked { text } => {
                self.send(ConductorMessage::SetInput { text: text.clone() })
                    .await;
                let _ = self.submit(&text).await;
            }

            SurfaceEvent::ClearClicked => {
                self.clear().await;
            }

            SurfaceEvent::FeedbackClicked { message_id, choice } => {
                self.handle_feedback(&message_id, choice).await;
            }

            SurfaceEvent::QuitRequested => {
                self.shutdown().await?;
            }
        }

        Ok(())
    }

    /// Submit the input text
    ///
    /// Returns the rejection when nothing was sent. Empty input and input
    /// arriving while a reply is pending are dropped silently; anything else
    /// rejected is reported to the surface as a warning.
    pub async fn submit(&mut self, raw: &str) -> Result<(), SubmitRejection> {
        let result = if self.lifecycle.is_sending() {
            Err(SubmitRejection::Busy)
        } else {
            self.input_validator.validate_message(raw)
        };

        let text = match result {
            Ok(text) => text,
            Err(rejection) => {
                if rejection.is_silent() {
                    tracing::debug!(reason = %rejection, "Submit ignored");
                } else {
                    tracing::warn!(reason = %rejection, "Rejected user message");
                    self.notify(NotifyLevel::Warning, &format!("Invalid message: {rejection}"))
                        .await;
                }
                return Err(rejection);
            }
        };

        let element = self.renderer.render(self.store.append_user(text.clone()));
        self.send(ConductorMessage::AppendMessage { element }).await;
        self.send(ConductorMessage::ClearInput).await;

        self.lifecycle
            .start(Arc::clone(&self.backend), text, self.store.generation());
        self.set_state(LifecycleState::Sending).await;
        self.send(ConductorMessage::TypingIndicator { visible: true })
            .await;
        self.send(ConductorMessage::SubmitEnabled { enabled: false })
            .await;
        self.send(ConductorMessage::ScrollToLatest).await;

        Ok(())
    }

    /// Poll for the chat reply
    ///
    /// Call this regularly from the surface loop.
    /// Returns true if a reply (or failure) was processed.
    pub async fn poll_pending(&mut self) -> bool {
        match self.lifecycle.try_complete() {
            Some(completion) => {
                self.settle(completion).await;
                true
            }
            None => false,
        }
    }

    /// Wait for the outstanding chat reply, if any, and process it
    ///
    /// Returns true if a reply (or failure) was processed.
    pub async fn wait_pending(&mut self) -> bool {
        match self.lifecycle.wait_complete().await {
            Some(completion) => {
                self.settle(completion).await;
                true
            }
            None => false,
        }
    }

    /// Reconcile a finished request into the thread and re-enable input
    async fn settle(&mut self, completion: Completion) {
        let settlement = self.lifecycle.settle(completion, &mut self.store);

        self.set_state(settlement.state).await;
        if let Some(ref reason) = settlement.failure {
            self.notify(NotifyLevel::Error, &format!("Chat request failed: {reason}"))
                .await;
        }
        self.send(ConductorMessage::TypingIndicator { visible: false })
            .await;
        if let Some(ref message) = settlement.appended {
            let element = self.renderer.render(message);
            self.send(ConductorMessage::AppendMessage { element }).await;
        }

        self.lifecycle.finish();
        self.set_state(LifecycleState::Idle).await;
        self.send(ConductorMessage::SubmitEnabled { enabled: true })
            .await;
        self.send(ConductorMessage::ScrollToLatest).await;
    }

    /// Clear the conversation down to the welcome entry
    pub async fn clear(&mut self) {
        self.store.reset_preserving_first();
        tracing::info!(pending = self.is_sending(), "Conversation cleared");

        self.send(ConductorMessage::ResetThread {
            elements: self.renderer.render_all(self.store.messages()),
        })
        .await;
        self.send(ConductorMessage::FocusInput).await;
        self.send(ConductorMessage::ScrollToLatest).await;
    }

    /// Record feedback on a reply
    pub async fn handle_feedback(&mut self, message_id: &MessageId, choice: FeedbackChoice) {
        if self.feedback.submit(&mut self.store, message_id, choice) {
            self.send(ConductorMessage::FeedbackSelection {
                message_id: message_id.clone(),
                selected: choice,
            })
            .await;
        }
    }

    /// Wait for every dispatched feedback report to finish
    pub async fn flush_feedback(&mut self) {
        self.feedback.flush().await;
    }

    /// Shut down the Conductor
    ///
    /// Outstanding feedback reports are allowed to finish; a pending chat
    /// reply is abandoned.
    pub async fn shutdown(&mut self) -> anyhow::Result<()> {
        if self.is_sending() {
            tracing::info!("Shutting down with a chat reply still pending");
        }
        self.flush_feedback().await;

        self.send(ConductorMessage::Quit {
            message: Some("Goodbye!".to_string()),
        })
        .await;

        Ok(())
    }

    /// Set state and notify the surface
    async fn set_state(&self, state: LifecycleState) {
        tracing::debug!(state = ?state, "Lifecycle state");
        self.send(ConductorMessage::State { state }).await;
    }

    /// Send notification
    async fn notify(&self, level: NotifyLevel, message: &str) {
        self.send(ConductorMessage::Notify {
            level,
            message: message.to_string(),
        })
        .await;
    }

    /// Send a directive to the surface
    async fn send(&self, msg: ConductorMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}
