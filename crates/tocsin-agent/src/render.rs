// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompts and keyboards for the interactive flows.

use tocsin_config::model::CatalogConfig;
use tocsin_core::types::{Button, Keyboard, OutboundMessage};
use tocsin_core::{AlarmRecord, ChatId, MaintenanceRecord};

use crate::callbacks;
use crate::format::{self, escape_html};
use crate::timeparse::DISPLAY_FORMAT;
use crate::workflow::{Problem, Prompt};

/// Text plus optional inline keyboard, not yet addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Rendered {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }

    pub fn to(self, chat: ChatId) -> OutboundMessage {
        let msg = OutboundMessage::new(chat, self.text);
        match self.keyboard {
            Some(keyboard) => msg.with_keyboard(keyboard),
            None => msg,
        }
    }
}

fn cancel_button() -> Button {
    Button::new(callbacks::CANCEL_LABEL, callbacks::CANCEL)
}

fn cancel_keyboard() -> Keyboard {
    Keyboard::row([cancel_button()])
}

fn catalog_keyboard(entries: &[String], prefix: &str) -> Keyboard {
    Keyboard::column(
        entries
            .iter()
            .enumerate()
            .map(|(i, entry)| Button::new(entry.clone(), format!("{prefix}{i}"))),
    )
    .push_row(vec![cancel_button()])
}

pub fn wizard_prompt(prompt: &Prompt, catalog: &CatalogConfig) -> Rendered {
    match prompt {
        Prompt::ChooseType => Rendered::with_keyboard(
            "What would you like to post?",
            Keyboard::column([
                Button::new("🚨 Incident", callbacks::TYPE_ALARM),
                Button::new("🔧 Maintenance", callbacks::TYPE_MAINTENANCE),
                Button::new("💬 Message", callbacks::TYPE_BROADCAST),
            ])
            .push_row(vec![cancel_button()]),
        ),
        Prompt::Title => Rendered::with_keyboard("📝 Enter a short title:", cancel_keyboard()),
        Prompt::Description => {
            Rendered::with_keyboard("📄 Describe what is happening:", cancel_keyboard())
        }
        Prompt::Level => Rendered::with_keyboard(
            "📊 Choose the incident level:",
            catalog_keyboard(&catalog.levels, callbacks::LEVEL_PREFIX),
        ),
        Prompt::Service => Rendered::with_keyboard(
            "🛠 Choose the affected service:",
            catalog_keyboard(&catalog.services, callbacks::SERVICE_PREFIX),
        ),
        Prompt::FixTime => Rendered::with_keyboard(
            "⏰ When will it be fixed?\n• an exact time, e.g. «15:00»\n• or a delay, e.g. «1 hour», «30 minutes»",
            cancel_keyboard(),
        ),
        Prompt::StartTime => Rendered::with_keyboard(
            "🕒 When does the maintenance start?\n• e.g. «27.05.2025 14:00»",
            cancel_keyboard(),
        ),
        Prompt::EndTime => Rendered::with_keyboard(
            "⌛ When does it end?\n• e.g. «27.05.2025 16:00»",
            cancel_keyboard(),
        ),
        Prompt::UnavailableServices => Rendered::with_keyboard(
            "🔌 What will be unavailable during the maintenance?",
            cancel_keyboard(),
        ),
        Prompt::MessageText => {
            Rendered::with_keyboard("💬 Enter the message text:", cancel_keyboard())
        }
        Prompt::Preview(submission) => Rendered::with_keyboard(
            format::preview(submission),
            Keyboard::row([
                Button::new("✅ Send", callbacks::CONFIRM_SEND),
                Button::new("❌ Cancel", callbacks::CONFIRM_CANCEL),
            ]),
        ),
    }
}

fn problem_hint(problem: Problem) -> &'static str {
    match problem {
        Problem::NotUnderstood => "⚠️ Please use the buttons below.",
        Problem::EmptyText => "⚠️ This cannot be empty.",
        Problem::BadTime => "⚠️ I could not read that time.",
        Problem::FixTimeNotInFuture => "⚠️ The fix time must be in the future.",
        Problem::EndNotAfterStart => "⚠️ The end must be after the start.",
        Problem::UnknownChoice => "⚠️ Please pick one of the options.",
    }
}

/// Re-asks the current question with a hint about what went wrong.
pub fn wizard_retry(prompt: &Prompt, problem: Problem, catalog: &CatalogConfig) -> Rendered {
    let mut rendered = wizard_prompt(prompt, catalog);
    rendered.text = format!("{}\n\n{}", problem_hint(problem), rendered.text);
    rendered
}

pub fn choose_record(alarms: &[AlarmRecord], works: &[MaintenanceRecord]) -> Rendered {
    if alarms.is_empty() && works.is_empty() {
        return Rendered::text("📭 You have no active incidents or maintenance windows.");
    }
    let buttons = alarms
        .iter()
        .map(|a| {
            Button::new(
                format!("🚨 {}: {}", a.id, a.issue),
                format!("{}{}", callbacks::SELECT_ALARM_PREFIX, a.id),
            )
        })
        .chain(works.iter().map(|w| {
            Button::new(
                format!("🔧 {}: {}", w.id, w.title),
                format!("{}{}", callbacks::SELECT_MAINTENANCE_PREFIX, w.id),
            )
        }));
    Rendered::with_keyboard(
        "Choose an event:",
        Keyboard::column(buttons).push_row(vec![cancel_button()]),
    )
}

fn action_keyboard() -> Keyboard {
    Keyboard::row([
        Button::new("✅ Stop", callbacks::ACTION_STOP),
        Button::new("🕒 Extend", callbacks::ACTION_EXTEND),
    ])
    .push_row(vec![cancel_button()])
}

pub fn alarm_actions(alarm: &AlarmRecord) -> Rendered {
    Rendered::with_keyboard(
        format!(
            "🚨 <code>{}</code> {}\nFix by: {}\nChoose an action:",
            escape_html(alarm.id.as_str()),
            escape_html(&alarm.issue),
            alarm.fix_by().format(DISPLAY_FORMAT)
        ),
        action_keyboard(),
    )
}

pub fn maintenance_actions(work: &MaintenanceRecord) -> Rendered {
    Rendered::with_keyboard(
        format!(
            "🔧 <code>{}</code> {}\nEnds: {}\nChoose an action:",
            escape_html(work.id.as_str()),
            escape_html(&work.title),
            work.end().format(DISPLAY_FORMAT)
        ),
        action_keyboard(),
    )
}

pub fn extension_options() -> Rendered {
    Rendered::with_keyboard(
        "How long should the incident be extended?",
        Keyboard::row([
            Button::new("+30 min", callbacks::EXTEND_30_MIN),
            Button::new("+1 hour", callbacks::EXTEND_1_HOUR),
        ])
        .push_row(vec![Button::new(callbacks::CANCEL_LABEL, callbacks::EXTEND_CANCEL)]),
    )
}

pub fn new_end_time(work: &MaintenanceRecord) -> Rendered {
    Rendered::with_keyboard(
        format!(
            "⌛ Enter the new end time (currently {}):\n• e.g. «27.05.2025 18:00», «18:00» or «2 hours»",
            work.end().format(DISPLAY_FORMAT)
        ),
        cancel_keyboard(),
    )
}

pub fn reminder_keyboard() -> Keyboard {
    Keyboard::row([
        Button::new("🕒 Extend", callbacks::REMINDER_EXTEND),
        Button::new("✅ Stop", callbacks::REMINDER_STOP),
    ])
}

pub fn help(is_admin: bool) -> Rendered {
    let mut text = String::from(
        "👋 I track service incidents and maintenance windows.\n\n/alarm_list - current events\n/help - this message",
    );
    if is_admin {
        text.push_str(
            "\n/new_message - report an incident, announce maintenance or post a message\n/manage - stop or extend your events\n/cancel - abandon the current action",
        );
    }
    Rendered::text(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::Prompt;

    #[test]
    fn catalog_prompts_number_their_buttons() {
        let catalog = CatalogConfig {
            levels: vec!["Minor".into(), "Major".into()],
            ..CatalogConfig::default()
        };
        let rendered = wizard_prompt(&Prompt::Level, &catalog);
        let data: Vec<_> = rendered
            .keyboard
            .unwrap()
            .buttons()
            .map(|b| b.data.clone())
            .collect();
        assert_eq!(data, vec!["lvl_0", "lvl_1", "cancel"]);
    }

    #[test]
    fn retry_prefixes_hint() {
        let rendered = wizard_retry(&Prompt::FixTime, Problem::BadTime, &CatalogConfig::default());
        assert!(rendered.text.starts_with("⚠️ I could not read that time."));
        assert!(rendered.text.contains("1 hour"));
    }

    #[test]
    fn help_hides_admin_commands() {
        assert!(!help(false).text.contains("/new_message"));
        assert!(help(true).text.contains("/manage"));
    }

    #[test]
    fn empty_manage_list_has_no_keyboard() {
        let rendered = choose_record(&[], &[]);
        assert!(rendered.keyboard.is_none());
    }
}
