//! Feedback Controller
//!
//! Records a helpful / not-helpful choice on an assistant reply and reports
//! it to the chat service. The store and the visible selection change
//! immediately; the report is fire-and-forget on its own task. A failed
//! report is logged and never retried, and the selection stays as clicked.
//!
//! Entries that only exist on this side (the welcome entry, apologies for
//! failed requests) carry ids the service has never seen. They take no
//! feedback, so nothing is recorded or reported for them.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::backend::{ChatBackend, FeedbackReport};
use crate::messages::{FeedbackChoice, MessageId};
use crate::store::ConversationStore;

/// Records feedback and dispatches reports
pub struct FeedbackController<B: ChatBackend> {
    backend: Arc<B>,
    /// Reports not yet known to be finished
    in_flight: Vec<JoinHandle<()>>,
}

impl<B: ChatBackend + 'static> FeedbackController<B> {
    /// Create a controller reporting through `backend`
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            in_flight: Vec::new(),
        }
    }

    /// Record `choice` for `id` and report it
    ///
    /// Returns false, and does nothing else, when the store has no server
    /// reply with this id.
    pub fn submit(
        &mut self,
        store: &mut ConversationStore,
        id: &MessageId,
        choice: FeedbackChoice,
    ) -> bool {
        if !store.set_feedback(id, choice) {
            tracing::debug!(id = %id, "Feedback for unknown or local message ignored");
            return false;
        }

        self.in_flight.retain(|handle| !handle.is_finished());

        let backend = Arc::clone(&self.backend);
        let report = FeedbackReport {
            id: id.clone(),
            feedback: choice,
        };
        self.in_flight.push(tokio::spawn(async move {
            match backend.send_feedback(&report).await {
                Ok(response) => {
                    tracing::debug!(id = %report.id, response = %response, "Feedback recorded");
                }
                Err(e) => {
                    tracing::warn!(id = %report.id, error = %e, "Feedback report failed");
                }
            }
        }));
        true
    }

    /// Number of reports that may still be running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.in_flight.iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every dispatched report to finish
    pub async fn flush(&mut self) {
        let handles = std::mem::take(&mut self.in_flight);
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Feedback task did not complete");
            }
        }
    }
}
