//! Conductor Messages
//!
//! Messages sent from the Conductor to the chat surface. These are the only
//! ways the message pipeline touches the presentation layer: inserting
//! rendered elements, toggling the pending indicator, moving the input focus
//! and keeping the thread scrolled to the latest entry.
//!
//! # Design Philosophy
//!
//! The surface is a dumb renderer. It never formats text, never decides what
//! a reply looks like and never talks to the chat endpoint. Everything it
//! shows arrives here already escaped and formatted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lifecycle::LifecycleState;
use crate::render::MessageElement;

/// Prefix marking an identifier synthesized on the client after a failed request
pub const ERROR_ID_PREFIX: &str = "error-";

/// Identifier of the welcome entry that survives a clear
pub const WELCOME_ID: &str = "welcome";

/// Messages from Conductor to the chat surface
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ConductorMessage {
    // ============================================
    // Thread Directives
    // ============================================
    /// Append a rendered message to the end of the thread
    AppendMessage {
        /// The element to insert
        element: MessageElement,
    },

    /// Replace the whole thread with the given elements (used by clear and reconnect)
    ResetThread {
        /// Elements that remain visible, in display order
        elements: Vec<MessageElement>,
    },

    /// Scroll the thread container to its maximum offset
    ScrollToLatest,

    /// Show or hide the typing indicator
    TypingIndicator {
        /// Whether the indicator should be visible
        visible: bool,
    },

    /// Mark one feedback affordance of a message as selected, deselecting the other
    FeedbackSelection {
        /// Message the feedback belongs to
        message_id: MessageId,
        /// The selected choice
        selected: FeedbackChoice,
    },

    // ============================================
    // Input Directives
    // ============================================
    /// Empty the text input
    ClearInput,

    /// Replace the text input's value
    SetInput {
        /// New input value
        text: String,
    },

    /// Move keyboard focus to the text input
    FocusInput,

    /// Enable or disable submission while a request is outstanding
    SubmitEnabled {
        /// Whether the surface should accept a submit
        enabled: bool,
    },

    /// Suggestion controls to offer
    Suggestions {
        /// Visible text of each suggestion, which is also what gets submitted
        items: Vec<String>,
    },

    // ============================================
    // System Messages
    // ============================================
    /// Request lifecycle state change
    State {
        /// The new state
        state: LifecycleState,
    },

    /// Operator-facing notification (never part of the thread)
    Notify {
        /// Notification level
        level: NotifyLevel,
        /// Message content
        message: String,
    },

    /// Request surface to quit
    Quit {
        /// Optional goodbye message
        message: Option<String>,
    },
}

/// Message identifier
///
/// Assigned by the chat server for replies, or synthesized locally for the
/// welcome entry and for apology replies after a failed request. The two
/// sources may produce equal strings; whether an id is known to the server is
/// recorded on the message as its [`MessageOrigin`], never read from the id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Wrap an identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier of the welcome entry
    #[must_use]
    pub fn welcome() -> Self {
        Self(WELCOME_ID.to_string())
    }

    /// Borrow the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User input
    User,
    /// Chat assistant
    Assistant,
}

impl MessageRole {
    /// CSS class of the thread entry for this role
    #[must_use]
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::User => "user-message",
            Self::Assistant => "bot-message",
        }
    }
}

/// Where a message came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageOrigin {
    /// Typed by the user
    User,
    /// Reply from the chat service, under the id the service assigned
    Server,
    /// Synthesized on this side (the welcome entry, apologies); the service never saw its id
    Local,
}

/// Feedback a user can leave on an assistant reply
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedbackChoice {
    /// The reply helped
    #[serde(rename = "helpful")]
    Helpful,
    /// The reply did not help
    #[serde(rename = "not-helpful")]
    NotHelpful,
}

impl FeedbackChoice {
    /// Both choices, in the order their affordances are displayed
    pub const ALL: [FeedbackChoice; 2] = [FeedbackChoice::Helpful, FeedbackChoice::NotHelpful];

    /// Wire value, as sent to the feedback endpoint
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Helpful => "helpful",
            Self::NotHelpful => "not-helpful",
        }
    }

    /// Button label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Helpful => "Helpful",
            Self::NotHelpful => "Not helpful",
        }
    }

    /// Parse a wire value
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "helpful" => Some(Self::Helpful),
            "not-helpful" => Some(Self::NotHelpful),
            _ => None,
        }
    }
}

impl fmt::Display for FeedbackChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Something the user did was refused
    Warning,
    /// The chat service failed
    Error,
}
