// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update routing and conversion into [`ChatEvent`]s.
//!
//! Text is accepted from private chats only; the bot never converses in
//! groups or channels. Button presses are accepted wherever the button was
//! shown, since the bot only attaches buttons to its own private replies.

use teloxide::types::{CallbackQuery, ChatKind, Message};
use tocsin_core::types::{ChatEvent, ChatEventKind};
use tocsin_core::{ChatId, MessageRef, UserId};

/// Checks whether the message is from a private (DM) chat.
///
/// Group, supergroup, and channel messages return `false`.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Converts a text message into a [`ChatEvent`].
///
/// Returns `None` for messages without a sender or without text
/// (stickers, photos and the like).
pub fn text_event(msg: &Message) -> Option<ChatEvent> {
    let user = msg.from.as_ref()?;
    let text = msg.text()?;
    Some(ChatEvent::text(
        UserId(user.id.0 as i64),
        ChatId(msg.chat.id.0),
        text,
    ))
}

/// Converts an inline button press into a [`ChatEvent`].
///
/// Replies go to the chat that showed the button, falling back to the
/// presser's private chat when Telegram no longer has the message.
pub fn button_event(query: &CallbackQuery) -> Option<ChatEvent> {
    let data = query.data.clone()?;
    let user = UserId(query.from.id.0 as i64);
    let message = query.message.as_ref().map(|m| MessageRef {
        chat: ChatId(m.chat().id.0),
        message_id: m.id().0,
    });
    let chat = message.map(|m| m.chat).unwrap_or(ChatId(user.0));
    Some(ChatEvent {
        user,
        chat,
        kind: ChatEventKind::Button { data, message },
    })
}
