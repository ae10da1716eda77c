//! Input Validation
//!
//! User text enters the pipeline here before anything is appended to the
//! conversation or sent to the chat endpoint. Whitespace-only input is
//! silently dropped; oversized input and stray control characters are
//! rejected with a reason the surface can show.

use thiserror::Error;

/// Why a submission was not accepted
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SubmitRejection {
    /// Nothing left after trimming; ignored without feedback
    #[error("message is empty")]
    Empty,
    /// A request is already outstanding
    #[error("a reply is still pending")]
    Busy,
    /// Longer than the configured limit
    #[error("message too long: {chars} characters (max: {max})")]
    TooLong {
        /// Characters in the trimmed message
        chars: usize,
        /// Configured maximum
        max: usize,
    },
    /// Contains control characters other than newline, tab and carriage return
    #[error("message contains invalid control characters")]
    ControlCharacters,
}

impl SubmitRejection {
    /// Whether the user should be told about this rejection
    #[must_use]
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Empty | Self::Busy)
    }
}

/// Validates raw input from the surface
#[derive(Clone, Debug)]
pub struct InputValidator {
    /// Maximum characters after trimming (0 = unlimited)
    max_chars: usize,
}

impl InputValidator {
    /// Create a validator with a character limit (0 = unlimited)
    #[must_use]
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Trim and validate a message, returning the text to send
    pub fn validate_message(&self, raw: &str) -> Result<String, SubmitRejection> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SubmitRejection::Empty);
        }

        let chars = trimmed.chars().count();
        if self.max_chars > 0 && chars > self.max_chars {
            return Err(SubmitRejection::TooLong {
                chars,
                max: self.max_chars,
            });
        }

        if trimmed
            .chars()
            .any(|c| c.is_control() && c != '\n' && c != '\t' && c != '\r')
        {
            return Err(SubmitRejection::ControlCharacters);
        }

        Ok(trimmed.to_string())
    }
}
