use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    Agent,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::User => f.write_str("user"),
            Origin::Agent => f.write_str("agent"),
        }
    }
}

/// One line of the conversation. Immutable once appended to a [`MessageLog`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    text: String,
    origin: Origin,
    position: usize,
}

impl ChatEntry {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Zero-based index in the log, which is also the display order.
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Append-only record of the session's conversation.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: Vec<ChatEntry>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, text: String, origin: Origin) -> &ChatEntry {
        let position = self.entries.len();
        self.entries.push(ChatEntry {
            text,
            origin,
            position,
        });
        &self.entries[position]
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
