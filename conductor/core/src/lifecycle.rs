//! Request Lifecycle
//!
//! Drives one chat request at a time through
//! `Idle -> Sending -> {Succeeded, Failed} -> Idle`.
//!
//! The network call runs on its own task and reports back through a oneshot
//! channel, so the owner stays free to handle other events (a clear, a
//! feedback click) while the reply is outstanding. The owner collects the
//! outcome with [`RequestLifecycle::try_complete`] or
//! [`RequestLifecycle::wait_complete`] and reconciles it into the store with
//! [`RequestLifecycle::settle`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::backend::{BackendError, ChatBackend, ChatReply, ChatRequest};
use crate::messages::{MessageId, ERROR_ID_PREFIX};
use crate::store::{ConversationStore, Message};

/// Request lifecycle states
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// No request outstanding; submissions are accepted
    Idle,
    /// A request is outstanding; submissions are rejected
    Sending,
    /// The reply arrived and is being displayed
    Succeeded,
    /// The request failed and the apology is being displayed
    Failed,
}

/// What to do with a reply to a request issued before the conversation was cleared
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleResponsePolicy {
    /// Discard it; the cleared thread stays clean
    #[default]
    Drop,
    /// Append it to the cleared thread anyway
    Append,
}

/// Synthesizes ids for apology replies
///
/// Ids are `error-<n>` where `n` is the current Unix time in milliseconds,
/// bumped when needed so that every id is strictly greater than the last.
#[derive(Clone, Debug, Default)]
pub struct LocalIdGenerator {
    last: u64,
}

impl LocalIdGenerator {
    /// Create a generator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unique local id
    pub fn next_id(&mut self) -> MessageId {
        let value = now_ms().max(self.last + 1);
        self.last = value;
        MessageId::new(format!("{ERROR_ID_PREFIX}{value}"))
    }
}

/// Result of a finished chat request
#[derive(Debug)]
pub struct Completion {
    /// Reply or failure
    pub result: Result<ChatReply, BackendError>,
    /// Store generation when the request was issued
    pub generation: u64,
    /// Time from issue to completion
    pub elapsed: Duration,
}

/// How a completion was reconciled into the store
#[derive(Clone, Debug)]
pub struct Settlement {
    /// `Succeeded` or `Failed`
    pub state: LifecycleState,
    /// The appended assistant message, unless the reply was dropped as stale
    pub appended: Option<Message>,
    /// Why the request failed, for `Failed` settlements
    pub failure: Option<String>,
}

/// The outstanding request
#[derive(Debug)]
struct PendingRequest {
    generation: u64,
    started: Instant,
    rx: oneshot::Receiver<Result<ChatReply, BackendError>>,
}

/// Single-flight chat request state machine
#[derive(Debug)]
pub struct RequestLifecycle {
    state: LifecycleState,
    pending: Option<PendingRequest>,
    error_ids: LocalIdGenerator,
    apology: String,
    stale_policy: StaleResponsePolicy,
}

impl RequestLifecycle {
    /// Create an idle lifecycle
    pub fn new(apology: impl Into<String>, stale_policy: StaleResponsePolicy) -> Self {
        Self {
            state: LifecycleState::Idle,
            pending: None,
            error_ids: LocalIdGenerator::new(),
            apology: apology.into(),
            stale_policy,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether a request is outstanding
    #[must_use]
    pub fn is_sending(&self) -> bool {
        self.state == LifecycleState::Sending
    }

    /// Issue the chat request for `text` on a background task
    ///
    /// `generation` is the store generation at issue time. Must only be called
    /// when not already sending.
    pub fn start<B: ChatBackend + 'static>(&mut self, backend: Arc<B>, text: String, generation: u64) {
        debug_assert!(!self.is_sending(), "chat request issued while one is pending");

        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let result = backend.send_chat(&ChatRequest::new(text)).await;
            // The receiver is gone only if the owner was dropped.
            let _ = tx.send(result);
        });

        self.pending = Some(PendingRequest {
            generation,
            started: Instant::now(),
            rx,
        });
        self.state = LifecycleState::Sending;
        tracing::debug!(generation, "Chat request issued");
    }

    /// Take the outcome if the request has finished, without waiting
    pub fn try_complete(&mut self) -> Option<Completion> {
        let pending = self.pending.as_mut()?;
        let result = match pending.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => Err(BackendError::Interrupted),
        };
        self.take_completion(result)
    }

    /// Wait for the outstanding request to finish
    ///
    /// Returns `None` immediately when nothing is outstanding.
    pub async fn wait_complete(&mut self) -> Option<Completion> {
        let pending = self.pending.as_mut()?;
        let result = match (&mut pending.rx).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Interrupted),
        };
        self.take_completion(result)
    }

    /// Reconcile a completion into the store
    ///
    /// Success appends the reply under its server id; failure appends the
    /// apology as a local entry under a fresh `error-` id. A reply to a
    /// request issued before the store was reset is handled per the stale
    /// response policy.
    pub fn settle(&mut self, completion: Completion, store: &mut ConversationStore) -> Settlement {
        let stale = completion.generation != store.generation();
        let elapsed_ms = u64::try_from(completion.elapsed.as_millis()).unwrap_or(u64::MAX);

        let (state, text, id, failure) = match completion.result {
            Ok(reply) => {
                tracing::debug!(id = %reply.id, elapsed_ms, "Chat request succeeded");
                (LifecycleState::Succeeded, reply.message, reply.id, None)
            }
            Err(error) => {
                tracing::warn!(error = %error, elapsed_ms, "Chat request failed");
                let id = self.error_ids.next_id();
                (LifecycleState::Failed, self.apology.clone(), id, Some(error.to_string()))
            }
        };
        self.state = state;

        if stale && self.stale_policy == StaleResponsePolicy::Drop {
            tracing::debug!(
                id = %id,
                issued_generation = completion.generation,
                current_generation = store.generation(),
                "Dropping reply to a cleared conversation"
            );
            return Settlement {
                state,
                appended: None,
                failure,
            };
        }

        let appended = if failure.is_some() {
            store.append_local(text, id)
        } else {
            store.append_assistant(text, id)
        };
        Settlement {
            state,
            appended: Some(appended.clone()),
            failure,
        }
    }

    /// Return to `Idle` after a settlement has been displayed
    pub fn finish(&mut self) {
        if matches!(self.state, LifecycleState::Succeeded | LifecycleState::Failed) {
            self.state = LifecycleState::Idle;
        }
    }

    fn take_completion(&mut self, result: Result<ChatReply, BackendError>) -> Option<Completion> {
        let pending = self.pending.take()?;
        Some(Completion {
            result,
            generation: pending.generation,
            elapsed: pending.started.elapsed(),
        })
    }
}

/// Get current timestamp in milliseconds
fn now_ms() -> u64 {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    u64::try_from(millis).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FeedbackReport;
    use crate::messages::{MessageOrigin, MessageRole};

    struct EchoBackend;

    #[async_trait::async_trait]
    impl ChatBackend for EchoBackend {
        fn name(&self) -> &str {
            "Echo"
        }

        async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply, BackendError> {
            Ok(ChatReply {
                message: format!("echo: {}", request.message),
                id: MessageId::new("srv-1"),
                timestamp: None,
            })
        }

        async fn send_feedback(
            &self,
            _report: &FeedbackReport,
        ) -> Result<serde_json::Value, BackendError> {
            Ok(serde_json::Value::Null)
        }
    }

    fn failed(generation: u64) -> Completion {
        Completion {
            result: Err(BackendError::Status {
                status: 500,
                body: "boom".to_string(),
            }),
            generation,
            elapsed: Duration::from_millis(3),
        }
    }

    #[test]
    fn test_local_ids_strictly_increase() {
        let mut ids = LocalIdGenerator::new();
        let a = ids.next_id();
        let b = ids.next_id();
        let c = ids.next_id();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert!([&a, &b, &c].iter().all(|id| id.as_str().starts_with(ERROR_ID_PREFIX)));
        let value = |id: &MessageId| id.as_str()[ERROR_ID_PREFIX.len()..].parse::<u64>().unwrap();
        assert!(value(&a) < value(&b) && value(&b) < value(&c));
    }

    #[tokio::test]
    async fn test_success_path() {
        let mut lifecycle = RequestLifecycle::new("sorry", StaleResponsePolicy::Drop);
        let mut store = ConversationStore::new();
        assert_eq!(lifecycle.state(), LifecycleState::Idle);

        lifecycle.start(Arc::new(EchoBackend), "hi".to_string(), store.generation());
        assert!(lifecycle.is_sending());

        let completion = lifecycle.wait_complete().await.unwrap();
        let settlement = lifecycle.settle(completion, &mut store);
        assert_eq!(settlement.state, LifecycleState::Succeeded);
        assert_eq!(lifecycle.state(), LifecycleState::Succeeded);

        let appended = settlement.appended.unwrap();
        assert_eq!(appended.role(), MessageRole::Assistant);
        assert_eq!(appended.content(), "echo: hi");
        assert_eq!(appended.id(), Some(&MessageId::new("srv-1")));
        assert_eq!(appended.origin(), MessageOrigin::Server);
        assert!(settlement.failure.is_none());

        lifecycle.finish();
        assert_eq!(lifecycle.state(), LifecycleState::Idle);
        assert!(lifecycle.wait_complete().await.is_none());
    }

    #[test]
    fn test_failures_get_distinct_local_ids() {
        let mut lifecycle = RequestLifecycle::new("sorry", StaleResponsePolicy::Drop);
        let mut store = ConversationStore::new();

        let settlement = lifecycle.settle(failed(0), &mut store);
        assert!(settlement.failure.unwrap().contains("500"));
        let first = settlement.appended.unwrap();
        lifecycle.finish();
        let second = lifecycle.settle(failed(0), &mut store).appended.unwrap();

        assert_eq!(first.content(), "sorry");
        assert_eq!(second.content(), "sorry");
        assert_ne!(first.id(), second.id());
        assert_eq!(first.origin(), MessageOrigin::Local);
        assert!(!first.accepts_feedback());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_stale_reply_dropped_by_default() {
        let mut lifecycle = RequestLifecycle::new("sorry", StaleResponsePolicy::Drop);
        let mut store = ConversationStore::new();
        store.reset();

        let settlement = lifecycle.settle(failed(0), &mut store);
        assert_eq!(settlement.state, LifecycleState::Failed);
        assert!(settlement.appended.is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_stale_reply_appended_when_configured() {
        let mut lifecycle = RequestLifecycle::new("sorry", StaleResponsePolicy::Append);
        let mut store = ConversationStore::new();
        store.reset();

        let settlement = lifecycle.settle(failed(0), &mut store);
        assert!(settlement.appended.is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_try_complete_without_request() {
        let mut lifecycle = RequestLifecycle::new("sorry", StaleResponsePolicy::Drop);
        assert!(lifecycle.try_complete().is_none());
    }
}
