//! Message Rendering
//!
//! Projects [`Message`]s from the store into [`MessageElement`]s, the unit
//! the surface inserts into the thread. An element carries the formatted
//! body, the display time and, for replies from the chat service, the two
//! feedback affordances. [`MessageElement::to_html`] writes the element out as the
//! widget's HTML fragment; every value that came from outside (ids, times)
//! is escaped on the way.

use serde::{Deserialize, Serialize};

use crate::formatter::{self, escape_html, Markup};
use crate::messages::{FeedbackChoice, MessageId, MessageRole};
use crate::store::Message;

/// A thread entry ready for display
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageElement {
    /// Message id, if the turn has one
    pub id: Option<MessageId>,
    /// Who sent the turn
    pub role: MessageRole,
    /// Formatted, escaped body
    pub body: Markup,
    /// Display time
    pub timestamp: String,
    /// Feedback affordances (server replies only)
    pub feedback: Option<FeedbackControls>,
}

/// The pair of feedback affordances under an assistant reply
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackControls {
    /// Message the affordances report on
    pub message_id: MessageId,
    /// Currently selected affordance
    pub selected: Option<FeedbackChoice>,
}

impl FeedbackControls {
    /// Whether the affordance for `choice` is marked selected
    #[must_use]
    pub fn is_selected(&self, choice: FeedbackChoice) -> bool {
        self.selected == Some(choice)
    }
}

/// Builds display elements from stored messages
#[derive(Clone, Copy, Debug, Default)]
pub struct Renderer;

impl Renderer {
    /// Create a renderer
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Project one message into an element
    #[must_use]
    pub fn render(&self, message: &Message) -> MessageElement {
        let feedback = match message.id() {
            Some(id) if message.accepts_feedback() => Some(FeedbackControls {
                message_id: id.clone(),
                selected: message.feedback(),
            }),
            _ => None,
        };

        MessageElement {
            id: message.id().cloned(),
            role: message.role(),
            body: formatter::format(message.content()),
            timestamp: message.timestamp().to_string(),
            feedback,
        }
    }

    /// Project every message, in order
    #[must_use]
    pub fn render_all(&self, messages: &[Message]) -> Vec<MessageElement> {
        messages.iter().map(|m| self.render(m)).collect()
    }
}

impl MessageElement {
    /// Write the element as the widget's HTML fragment
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut html = format!(
            r#"<div class="chat-message {}"><div class="message-content"><div class="message-bubble">{}</div><div class="message-time">{}</div>"#,
            self.role.css_class(),
            self.body,
            escape_html(&self.timestamp),
        );

        if let Some(ref controls) = self.feedback {
            html.push_str(&format!(
                r#"<div class="message-feedback" data-message-id="{}">"#,
                escape_html(controls.message_id.as_str())
            ));
            for choice in FeedbackChoice::ALL {
                let class = if controls.is_selected(choice) {
                    "feedback-btn selected"
                } else {
                    "feedback-btn"
                };
                html.push_str(&format!(
                    r#"<button class="{class}" data-feedback="{}">{}</button>"#,
                    choice.as_str(),
                    choice.label()
                ));
            }
            html.push_str("</div>");
        }

        html.push_str("</div></div>");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ConversationStore;

    #[test]
    fn test_user_message_has_no_feedback() {
        let mut store = ConversationStore::new();
        let element = Renderer::new().render(store.append_user("hi <b>there</b>"));
        assert_eq!(element.role, MessageRole::User);
        assert!(element.feedback.is_none());
        assert_eq!(element.body.as_str(), "hi &lt;b&gt;there&lt;/b&gt;");
    }

    #[test]
    fn test_assistant_reply_is_formatted_with_feedback() {
        let mut store = ConversationStore::new();
        let element = Renderer::new().render(
            store.append_assistant("Try:\n- https://jobs.example", MessageId::new("srv-1")),
        );
        assert!(element.body.as_str().contains("<ul><li><a href=\"https://jobs.example\""));
        let controls = element.feedback.unwrap();
        assert_eq!(controls.message_id, MessageId::new("srv-1"));
        assert_eq!(controls.selected, None);
    }

    #[test]
    fn test_welcome_has_no_feedback() {
        let mut store = ConversationStore::new();
        let element = Renderer::new().render(store.append_local("Hello!", MessageId::welcome()));
        assert!(element.feedback.is_none());
    }

    #[test]
    fn test_apology_has_no_feedback() {
        let mut store = ConversationStore::new();
        let element =
            Renderer::new().render(store.append_local("sorry", MessageId::new("error-123")));
        assert!(element.feedback.is_none());
        assert!(!element.to_html().contains("feedback-btn"));
    }

    #[test]
    fn test_server_reply_keeps_feedback_whatever_its_id() {
        let mut store = ConversationStore::new();
        let renderer = Renderer::new();
        for id in ["welcome", "error-123"] {
            let element = renderer.render(store.append_assistant("answer", MessageId::new(id)));
            assert_eq!(element.feedback.unwrap().message_id, MessageId::new(id));
        }
    }

    #[test]
    fn test_html_marks_exactly_one_selected_button() {
        let mut store = ConversationStore::new();
        let id = MessageId::new("srv-1");
        store.append_assistant("answer", id.clone());
        store.set_feedback(&id, FeedbackChoice::Helpful);
        store.set_feedback(&id, FeedbackChoice::NotHelpful);

        let html = Renderer::new().render(store.get(&id).unwrap()).to_html();
        assert_eq!(html.matches("feedback-btn selected").count(), 1);
        assert!(html.contains(r#"<button class="feedback-btn selected" data-feedback="not-helpful">"#));
        assert!(html.contains(r#"data-message-id="srv-1""#));
    }

    #[test]
    fn test_html_escapes_message_id() {
        let mut store = ConversationStore::new();
        let element = Renderer::new().render(
            store.append_assistant("answer", MessageId::new(r#"x"><script>"#)),
        );
        let html = element.to_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("x&quot;&gt;&lt;script&gt;"));
    }
}
