//! Console Surface
//!
//! Applies Conductor directives to a line-oriented terminal. Thread entries
//! are printed as the widget's HTML fragments (or a compact `[time] who:
//! markup` line); status changes are printed as `*` lines. Directives that
//! only make sense for a graphical input field (focus, clearing the field)
//! have nothing to do here.

use std::io::{self, Write};

use chatline_core::{
    ConductorMessage, LifecycleState, MessageElement, MessageId, MessageRole, NotifyLevel,
};

/// Terminal rendering of the chat thread
pub struct ConsoleSurface<W: Write> {
    out: W,
    /// Print full HTML fragments instead of compact lines
    html: bool,
    suggestions: Vec<String>,
    submit_enabled: bool,
    /// Latest reply that accepts feedback
    last_rateable: Option<MessageId>,
    quit: bool,
}

impl<W: Write> ConsoleSurface<W> {
    /// Create a surface writing to `out`
    pub fn new(out: W, html: bool) -> Self {
        Self {
            out,
            html,
            suggestions: Vec::new(),
            submit_enabled: true,
            last_rateable: None,
            quit: false,
        }
    }

    /// Whether the Conductor currently accepts a submit
    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    /// Whether the Conductor asked the surface to quit
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Text of the n-th suggestion (1-based)
    pub fn suggestion(&self, n: usize) -> Option<&str> {
        n.checked_sub(1)
            .and_then(|i| self.suggestions.get(i))
            .map(String::as_str)
    }

    /// Latest reply that accepts feedback
    pub fn last_rateable(&self) -> Option<&MessageId> {
        self.last_rateable.as_ref()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print a status line
    pub fn status(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "* {text}")
    }

    /// Print free text as-is
    pub fn print(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    /// Apply one directive
    pub fn apply(&mut self, msg: ConductorMessage) -> io::Result<()> {
        match msg {
            ConductorMessage::AppendMessage { element } => {
                self.write_element(&element)?;
            }

            ConductorMessage::ResetThread { elements } => {
                writeln!(self.out, "* ---")?;
                self.last_rateable = None;
                for element in &elements {
                    self.write_element(element)?;
                }
            }

            ConductorMessage::ScrollToLatest => {
                self.out.flush()?;
            }

            ConductorMessage::TypingIndicator { visible } => {
                if visible {
                    self.status("typing...")?;
                }
            }

            ConductorMessage::FeedbackSelection {
                message_id,
                selected,
            } => {
                self.status(&format!("feedback on {message_id}: {}", selected.label()))?;
            }

            ConductorMessage::ClearInput | ConductorMessage::FocusInput => {}

            ConductorMessage::SetInput { text } => {
                writeln!(self.out, "> {text}")?;
            }

            ConductorMessage::SubmitEnabled { enabled } => {
                self.submit_enabled = enabled;
            }

            ConductorMessage::Suggestions { items } => {
                for (i, item) in items.iter().enumerate() {
                    self.status(&format!("/suggest {}: {item}", i + 1))?;
                }
                self.suggestions = items;
            }

            ConductorMessage::State { state } => {
                if state == LifecycleState::Failed {
                    tracing::debug!("Chat request failed; apology shown");
                }
            }

            ConductorMessage::Notify { level, message } => {
                let prefix = match level {
                    NotifyLevel::Warning => "!",
                    NotifyLevel::Error => "!!",
                };
                writeln!(self.out, "{prefix} {message}")?;
            }

            ConductorMessage::Quit { message } => {
                if let Some(message) = message {
                    self.status(&message)?;
                }
                self.quit = true;
                self.out.flush()?;
            }
        }
        Ok(())
    }

    fn write_element(&mut self, element: &MessageElement) -> io::Result<()> {
        if let Some(ref controls) = element.feedback {
            self.last_rateable = Some(controls.message_id.clone());
        }

        if self.html {
            return writeln!(self.out, "{}", element.to_html());
        }

        let who = match element.role {
            MessageRole::User => "you",
            MessageRole::Assistant => "bot",
        };
        write!(self.out, "[{}] {who}: {}", element.timestamp, element.body)?;
        if let Some(ref controls) = element.feedback {
            write!(self.out, "  (id {})", controls.message_id)?;
        }
        writeln!(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatline_core::{ConversationStore, FeedbackChoice, Renderer};
    use pretty_assertions::assert_eq;

    fn output(surface: ConsoleSurface<Vec<u8>>) -> String {
        String::from_utf8(surface.out).unwrap()
    }

    #[test]
    fn test_compact_lines() {
        let mut store = ConversationStore::with_time_format("12:00");
        let renderer = Renderer::new();
        let user = renderer.render(store.append_user("hi & bye"));
        let reply = renderer.render(store.append_assistant("hello", MessageId::new("srv-1")));

        let mut surface = ConsoleSurface::new(Vec::new(), false);
        surface.apply(ConductorMessage::AppendMessage { element: user }).unwrap();
        surface.apply(ConductorMessage::AppendMessage { element: reply }).unwrap();

        assert_eq!(surface.last_rateable(), Some(&MessageId::new("srv-1")));
        assert_eq!(
            output(surface),
            "[12:00] you: hi &amp; bye\n[12:00] bot: hello  (id srv-1)\n"
        );
    }

    #[test]
    fn test_html_mode_prints_fragment() {
        let mut store = ConversationStore::new();
        let element = Renderer::new().render(store.append_assistant("hi", MessageId::new("srv-1")));
        let expected = element.to_html();

        let mut surface = ConsoleSurface::new(Vec::new(), true);
        surface.apply(ConductorMessage::AppendMessage { element }).unwrap();
        assert_eq!(output(surface), format!("{expected}\n"));
    }

    #[test]
    fn test_suggestions_and_submit_state() {
        let mut surface = ConsoleSurface::new(Vec::new(), false);
        surface
            .apply(ConductorMessage::Suggestions {
                items: vec!["Remote jobs".to_string(), "Events".to_string()],
            })
            .unwrap();
        surface
            .apply(ConductorMessage::SubmitEnabled { enabled: false })
            .unwrap();

        assert_eq!(surface.suggestion(2), Some("Events"));
        assert_eq!(surface.suggestion(0), None);
        assert_eq!(surface.suggestion(3), None);
        assert!(!surface.submit_enabled());
    }

    #[test]
    fn test_reset_forgets_rateable_reply() {
        let mut store = ConversationStore::new();
        let renderer = Renderer::new();
        let welcome = renderer.render(store.append_local("Welcome", MessageId::welcome()));
        let reply = renderer.render(store.append_assistant("answer", MessageId::new("srv-1")));

        let mut surface = ConsoleSurface::new(Vec::new(), false);
        surface.apply(ConductorMessage::AppendMessage { element: reply }).unwrap();
        surface
            .apply(ConductorMessage::ResetThread {
                elements: vec![welcome],
            })
            .unwrap();
        assert_eq!(surface.last_rateable(), None);
    }

    #[test]
    fn test_feedback_and_quit() {
        let mut surface = ConsoleSurface::new(Vec::new(), false);
        surface
            .apply(ConductorMessage::FeedbackSelection {
                message_id: MessageId::new("srv-1"),
                selected: FeedbackChoice::Helpful,
            })
            .unwrap();
        surface
            .apply(ConductorMessage::Quit {
                message: Some("Goodbye!".to_string()),
            })
            .unwrap();
        assert!(surface.should_quit());
        assert_eq!(
            output(surface),
            format!(
                "* feedback on srv-1: {}\n* Goodbye!\n",
                FeedbackChoice::Helpful.label()
            )
        );
    }
}
