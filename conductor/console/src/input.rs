//! Line Input
//!
//! Turns stdin lines into surface events. Plain text is a message (Enter
//! submits it); a trailing `\` continues the message on the next line, the
//! terminal's stand-in for Shift+Enter. Lines starting with `/` are commands.

use chatline_core::{FeedbackChoice, Key, MessageId, SurfaceEvent};

/// What a completed input line asks for
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Forward to the Conductor as-is
    Event(SurfaceEvent),
    /// Click the n-th suggestion (1-based)
    Suggest(usize),
    /// Rate a reply; without an id, the latest rateable reply
    Feedback {
        /// Reply to rate
        id: Option<MessageId>,
        /// Choice to record
        choice: FeedbackChoice,
    },
    /// Print the command list
    Help,
    /// Not a known command
    Unknown(String),
}

impl Command {
    /// Whether carrying this out would submit a message to the chat service
    pub fn submits(&self) -> bool {
        matches!(
            self,
            Command::Suggest(_)
                | Command::Event(SurfaceEvent::Submit { .. })
                | Command::Event(SurfaceEvent::KeyPressed { .. })
        )
    }
}

/// Command list shown by `/help`
pub const HELP: &str = "\
Type a message and press Enter to send it. End a line with \\ to continue on the next one.
  /suggest N          send suggestion N
  /helpful [ID]       mark a reply helpful (default: latest)
  /not-helpful [ID]   mark a reply not helpful (default: latest)
  /clear              clear the conversation
  /quit               exit";

/// Accumulates continuation lines into one message
#[derive(Debug, Default)]
pub struct LineReader {
    pending: Option<String>,
}

impl LineReader {
    /// Create a reader
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a continued message is being collected
    pub fn is_continuing(&self) -> bool {
        self.pending.is_some()
    }

    /// Feed one line; returns a command once a complete input is available
    pub fn feed(&mut self, line: &str) -> Option<Command> {
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(head) = line.strip_suffix('\\') {
            let buffer = self.pending.get_or_insert_with(String::new);
            buffer.push_str(head);
            buffer.push('\n');
            return None;
        }

        match self.pending.take() {
            Some(mut buffer) => {
                buffer.push_str(line);
                Some(submit(buffer))
            }
            None => Some(parse_line(line)),
        }
    }
}

/// Parse a single complete line
pub fn parse_line(line: &str) -> Command {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return submit(line.to_string());
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    match name {
        "clear" => Command::Event(SurfaceEvent::ClearClicked),
        "quit" | "exit" => Command::Event(SurfaceEvent::QuitRequested),
        "help" | "?" => Command::Help,
        "suggest" => match arg.and_then(|n| n.parse::<usize>().ok()) {
            Some(n) if n > 0 => Command::Suggest(n),
            _ => Command::Unknown(trimmed.to_string()),
        },
        _ => match FeedbackChoice::parse(name) {
            Some(choice) => Command::Feedback {
                id: arg.map(MessageId::new),
                choice,
            },
            None => Command::Unknown(trimmed.to_string()),
        },
    }
}

/// Enter in the input field
fn submit(input: String) -> Command {
    Command::Event(SurfaceEvent::KeyPressed {
        key: Key::Enter,
        shift: false,
        input,
    })
}
