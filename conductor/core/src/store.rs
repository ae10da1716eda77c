//! Conversation Store
//!
//! The ordered log of turns exchanged in the current session. Insertion order
//! is display order. Entries are never removed one by one and their content
//! never changes after creation; the only mutation is the feedback left on an
//! assistant reply, and the only way to shrink the log is a reset.
//!
//! Every reset bumps [`ConversationStore::generation`], which lets a request
//! that was issued before the reset recognise that its reply is stale.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::messages::{FeedbackChoice, MessageId, MessageOrigin, MessageRole};

/// Display time format used when none is configured
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M";

/// One conversation turn
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: Option<MessageId>,
    role: MessageRole,
    origin: MessageOrigin,
    content: String,
    timestamp: String,
    feedback: Option<FeedbackChoice>,
}

impl Message {
    /// Identifier (absent for user turns)
    #[must_use]
    pub fn id(&self) -> Option<&MessageId> {
        self.id.as_ref()
    }

    /// Who sent this turn
    #[must_use]
    pub fn role(&self) -> MessageRole {
        self.role
    }

    /// Where the turn came from
    #[must_use]
    pub fn origin(&self) -> MessageOrigin {
        self.origin
    }

    /// Whether the turn takes feedback: only replies under a server-assigned id do
    #[must_use]
    pub fn accepts_feedback(&self) -> bool {
        self.origin == MessageOrigin::Server
    }

    /// Original, unformatted text
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Local display time assigned at creation
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Current feedback selection
    #[must_use]
    pub fn feedback(&self) -> Option<FeedbackChoice> {
        self.feedback
    }
}

/// Ordered, append-only log of the session's messages
#[derive(Clone, Debug)]
pub struct ConversationStore {
    messages: Vec<Message>,
    generation: u64,
    time_format: String,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    /// Create an empty store using the default time format
    #[must_use]
    pub fn new() -> Self {
        Self::with_time_format(DEFAULT_TIME_FORMAT)
    }

    /// Create an empty store with a `chrono` strftime format for timestamps
    pub fn with_time_format(time_format: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            generation: 0,
            time_format: time_format.into(),
        }
    }

    /// Append a user turn stamped with the current local time
    pub fn append_user(&mut self, text: impl Into<String>) -> &Message {
        self.push(None, MessageRole::User, MessageOrigin::User, text.into())
    }

    /// Append a chat service reply under its server id
    ///
    /// The raw text is kept; formatting happens at render time.
    pub fn append_assistant(&mut self, text: impl Into<String>, id: MessageId) -> &Message {
        self.push(Some(id), MessageRole::Assistant, MessageOrigin::Server, text.into())
    }

    /// Append an assistant turn synthesized on this side under a local id
    pub fn append_local(&mut self, text: impl Into<String>, id: MessageId) -> &Message {
        self.push(Some(id), MessageRole::Assistant, MessageOrigin::Local, text.into())
    }

    /// Remove every entry
    pub fn reset(&mut self) {
        self.messages.clear();
        self.generation += 1;
        tracing::debug!(generation = self.generation, "Conversation reset");
    }

    /// Remove every entry except the first one
    pub fn reset_preserving_first(&mut self) {
        self.messages.truncate(1);
        self.generation += 1;
        tracing::debug!(
            generation = self.generation,
            retained = self.messages.len(),
            "Conversation reset, first entry retained"
        );
    }

    /// Record feedback on a server reply, overwriting any earlier choice
    ///
    /// Returns false if no server reply has this id. Local entries never take
    /// feedback, even when their id equals a server id.
    pub fn set_feedback(&mut self, id: &MessageId, choice: FeedbackChoice) -> bool {
        match self
            .messages
            .iter_mut()
            .find(|m| m.accepts_feedback() && m.id.as_ref() == Some(id))
        {
            Some(message) => {
                message.feedback = Some(choice);
                true
            }
            None => false,
        }
    }

    /// Get an entry by id
    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id.as_ref() == Some(id))
    }

    /// All entries in display order
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The first entry
    #[must_use]
    pub fn first(&self) -> Option<&Message> {
        self.messages.first()
    }

    /// The latest entry
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the store has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of resets so far
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn push(
        &mut self,
        id: Option<MessageId>,
        role: MessageRole,
        origin: MessageOrigin,
        content: String,
    ) -> &Message {
        let index = self.messages.len();
        self.messages.push(Message {
            id,
            role,
            origin,
            content,
            timestamp: display_time(&self.time_format),
            feedback: None,
        });
        &self.messages[index]
    }
}

/// Current local time rendered with `format`, falling back to the default on a bad format
fn display_time(format: &str) -> String {
    let now = chrono::Local::now();
    let mut out = String::new();
    if write!(out, "{}", now.format(format)).is_err() || out.is_empty() {
        out.clear();
        // The default format is always valid.
        let _ = write!(out, "{}", now.format(DEFAULT_TIME_FORMAT));
    }
    out
}
