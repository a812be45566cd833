// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTML and keyboard helpers for the Telegram Bot API.
//!
//! Messages are sent with the HTML parse mode. When Telegram rejects the
//! markup the transport resends a plain-text copy produced by [`strip_html`].

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tocsin_core::types::Keyboard;

/// Telegram's limit on message text, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Telegram's limit on forum topic names, in characters.
pub const MAX_TOPIC_CHARS: usize = 128;

/// Converts a transport-neutral keyboard into inline buttons.
pub fn inline_keyboard(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.data.clone()))
            .collect::<Vec<_>>()
    }))
}

/// Removes tags and decodes the entities the formatter emits.
pub fn strip_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

/// Cuts `text` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tocsin_core::types::Button;

    #[test]
    fn keyboard_rows_are_preserved() {
        let keyboard = Keyboard::row([
            Button::new("🕒 Extend", "reminder_extend"),
            Button::new("✅ Stop", "reminder_stop"),
        ])
        .push_row(vec![Button::new("❌ Cancel", "cancel")]);
        let markup = inline_keyboard(&keyboard);
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        assert_eq!(markup.inline_keyboard[1][0].text, "❌ Cancel");
    }

    #[test]
    fn strip_html_removes_tags_and_entities() {
        let html = "🚨 <b>Incident</b>\n• <b>ID:</b> <code>FA-1</code> &lt;mail&gt; &amp; co";
        assert_eq!(strip_html(html), "🚨 Incident\n• ID: FA-1 <mail> & co");
    }

    #[test]
    fn strip_html_keeps_link_text() {
        let html = r#"<a href="https://jira.test/browse/FA-1">FA-1</a>"#;
        assert_eq!(strip_html(html), "FA-1");
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ааааа", 3), "аа…");
        assert_eq!(truncate(&"x".repeat(200), MAX_TOPIC_CHARS).chars().count(), 128);
    }
}
