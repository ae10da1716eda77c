//! Surface Events
//!
//! Events sent from the chat surface to the Conductor. The surface reports
//! what the user did (submitted the form, pressed a key, clicked a control)
//! and the Conductor decides what it means.

use serde::{Deserialize, Serialize};

use crate::messages::{FeedbackChoice, MessageId};

/// Events from the chat surface to the Conductor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceEvent {
    /// Surface attached (or re-attached) and needs the current thread
    Connected,

    /// The input form was submitted
    Submit {
        /// Raw value of the text input
        input: String,
    },

    /// A key was pressed inside the text input
    KeyPressed {
        /// Which key
        key: Key,
        /// Whether Shift was held
        shift: bool,
        /// Raw value of the text input at the time of the key press
        input: String,
    },

    /// A suggestion control was clicked
    SuggestionClicked {
        /// Visible text of the suggestion
        text: String,
    },

    /// The clear control was clicked
    ClearClicked,

    /// A feedback affordance was clicked
    FeedbackClicked {
        /// Message the affordance belongs to
        message_id: MessageId,
        /// Which affordance
        choice: FeedbackChoice,
    },

    /// User requested quit
    QuitRequested,
}

/// Keys the Conductor cares about
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    /// Enter / Return
    Enter,
    /// Anything else
    Other,
}

impl SurfaceEvent {
    /// Whether this key press should submit the form
    ///
    /// Enter submits; Shift+Enter inserts a newline and is left to the surface.
    #[must_use]
    pub fn is_submit_key(key: Key, shift: bool) -> bool {
        key == Key::Enter && !shift
    }
}
