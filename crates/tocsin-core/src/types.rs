// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Tocsin bot.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Chat-platform identifier of a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Chat-platform identifier of a conversation (DM, group, or channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

/// Identifier of a discussion thread inside a forum-style chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub i32);

/// Opaque identifier of an alarm or maintenance record.
///
/// Either a tracker ticket key (`FA-123`) or a short local token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Points at a message that was delivered, so it can be referenced later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat: ChatId,
    pub message_id: i32,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of external collaborator behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Chat,
    Tracker,
}

// --- Chat types ---

/// Something a user did in a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    pub user: UserId,
    /// Conversation the event came from; replies go here.
    pub chat: ChatId,
    pub kind: ChatEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEventKind {
    /// Free text, including `/commands`.
    Text(String),
    /// An inline button press carrying its callback payload.
    Button {
        data: String,
        /// The message the button was attached to, if the transport knows it.
        message: Option<MessageRef>,
    },
}

impl ChatEvent {
    pub fn text(user: UserId, chat: ChatId, text: impl Into<String>) -> Self {
        Self {
            user,
            chat,
            kind: ChatEventKind::Text(text.into()),
        }
    }

    pub fn button(user: UserId, chat: ChatId, data: impl Into<String>) -> Self {
        Self {
            user,
            chat,
            kind: ChatEventKind::Button {
                data: data.into(),
                message: None,
            },
        }
    }
}

/// A single inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    /// Callback payload delivered back as [`ChatEventKind::Button`].
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Rows of inline buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// One button per row.
    pub fn column(buttons: impl IntoIterator<Item = Button>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    /// All buttons on a single row.
    pub fn row(buttons: impl IntoIterator<Item = Button>) -> Self {
        Self {
            rows: vec![buttons.into_iter().collect()],
        }
    }

    pub fn push_row(mut self, row: Vec<Button>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

/// A message to be delivered through the chat transport.
///
/// `text` is HTML-formatted; dynamic content must already be escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat: ChatId,
    pub text: String,
    pub thread: Option<ThreadId>,
    pub keyboard: Option<Keyboard>,
}

impl OutboundMessage {
    pub fn new(chat: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat,
            text: text.into(),
            thread: None,
            keyboard: None,
        }
    }

    pub fn in_thread(mut self, thread: ThreadId) -> Self {
        self.thread = Some(thread);
        self
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

// --- Tracker types ---

/// Fields submitted when opening a failure ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub summary: String,
    pub description: String,
    pub level: Option<String>,
    pub service: Option<String>,
    pub influence: Option<String>,
    /// When the failure started, in local time.
    pub started_at: Option<chrono::NaiveDateTime>,
}

/// A ticket successfully created in the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    pub key: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_transparently() {
        assert_eq!(serde_json::to_string(&UserId(42)).unwrap(), "42");
        assert_eq!(
            serde_json::to_string(&RecordId::from("FA-7")).unwrap(),
            "\"FA-7\""
        );
        let thread: ThreadId = serde_json::from_str("17").unwrap();
        assert_eq!(thread, ThreadId(17));
    }

    #[test]
    fn keyboard_builders() {
        let kb = Keyboard::column([Button::new("a", "1"), Button::new("b", "2")]);
        assert_eq!(kb.rows.len(), 2);
        let kb = Keyboard::row([Button::new("a", "1"), Button::new("b", "2")])
            .push_row(vec![Button::new("c", "3")]);
        assert_eq!(kb.rows.len(), 2);
        assert_eq!(kb.buttons().count(), 3);
    }

    #[test]
    fn outbound_builder_sets_thread_and_keyboard() {
        let msg = OutboundMessage::new(ChatId(-100), "hi")
            .in_thread(ThreadId(5))
            .with_keyboard(Keyboard::default());
        assert_eq!(msg.thread, Some(ThreadId(5)));
        assert!(msg.keyboard.is_some());
    }

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;
        for variant in [AdapterType::Chat, AdapterType::Tracker] {
            let parsed = AdapterType::from_str(&variant.to_string()).unwrap();
            assert_eq!(parsed, variant);
        }
    }
}
