// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTML text for channel announcements and direct notices.
//!
//! Every user-supplied value goes through [`escape_html`] before it is
//! embedded, since messages are sent with HTML parse mode.

use tocsin_core::{AgeNotice, AlarmRecord, MaintenanceRecord};

use crate::timeparse::DISPLAY_FORMAT;
use crate::workflow::Submission;

/// Escapes the characters Telegram's HTML mode treats as markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

fn ticket_line(alarm: &AlarmRecord) -> String {
    match &alarm.ticket_url {
        Some(url) => format!(
            "• <b>Ticket:</b> <a href=\"{}\">{}</a>\n",
            escape_html(url),
            escape_html(alarm.id.as_str())
        ),
        None => format!("• <b>ID:</b> <code>{}</code>\n", escape_html(alarm.id.as_str())),
    }
}

/// Full alarm card posted into the discussion thread.
pub fn alarm_discussion(alarm: &AlarmRecord, conference_link: Option<&str>) -> String {
    let mut text = format!(
        "🚨 <b>Service incident</b>\n{}• <b>Service:</b> {}\n• <b>Level:</b> {}\n• <b>Problem:</b> {}\n• <b>Description:</b> {}\n• <b>Fix by:</b> {}\n",
        ticket_line(alarm),
        escape_html(&alarm.service),
        escape_html(&alarm.level),
        escape_html(&alarm.issue),
        escape_html(&alarm.description),
        alarm.fix_by().format(DISPLAY_FORMAT),
    );
    if let Some(link) = conference_link {
        text.push_str(&format!("• <i>Conference: {}</i>\n", escape_html(link)));
    }
    text
}

/// Public alarm announcement for the alarm channel.
pub fn alarm_created(alarm: &AlarmRecord) -> String {
    format!(
        "🚨 <b>Service incident</b>\n• <b>ID:</b> <code>{}</code>\n• <b>Problem:</b> {}\n• <b>Service:</b> {}\n• <b>Fix by:</b> {}\n• <i>We are already working on it. Thank you for your patience!</i>",
        escape_html(alarm.id.as_str()),
        escape_html(&alarm.issue),
        escape_html(&alarm.service),
        alarm.fix_by().format(DISPLAY_FORMAT),
    )
}

pub fn alarm_extended(alarm: &AlarmRecord) -> String {
    format!(
        "🔄 <b>Incident extended</b>\n• <b>ID:</b> <code>{}</code>\n• <b>Problem:</b> {}\n• <b>New fix time:</b> {}",
        escape_html(alarm.id.as_str()),
        escape_html(&alarm.issue),
        alarm.fix_by().format(DISPLAY_FORMAT),
    )
}

pub fn alarm_resolved(alarm: &AlarmRecord) -> String {
    format!(
        "✅ <b>Incident resolved</b>\n• <b>ID:</b> <code>{}</code>\n• <b>Problem:</b> {}\n• <b>Raised:</b> {}",
        escape_html(alarm.id.as_str()),
        escape_html(&alarm.issue),
        alarm.created_at().format(DISPLAY_FORMAT),
    )
}

pub fn maintenance_created(work: &MaintenanceRecord) -> String {
    format!(
        "🔧 <b>Planned maintenance</b>\n• <b>ID:</b> <code>{}</code>\n• <b>Title:</b> {}\n• <b>Description:</b> {}\n• <b>Start:</b> {}\n• <b>End:</b> {}\n• <b>Unavailable:</b> {}\n• <i>Thank you for your understanding!</i>",
        escape_html(work.id.as_str()),
        escape_html(&work.title),
        escape_html(&work.description),
        work.start().format(DISPLAY_FORMAT),
        work.end().format(DISPLAY_FORMAT),
        escape_html(&work.unavailable_services),
    )
}

pub fn maintenance_extended(work: &MaintenanceRecord) -> String {
    format!(
        "🔄 <b>Maintenance extended</b>\n• <b>ID:</b> <code>{}</code>\n• <b>Title:</b> {}\n• <b>New end:</b> {}",
        escape_html(work.id.as_str()),
        escape_html(&work.title),
        work.end().format(DISPLAY_FORMAT),
    )
}

pub fn maintenance_resolved(work: &MaintenanceRecord) -> String {
    format!(
        "✅ <b>Maintenance finished</b>\n• <b>ID:</b> <code>{}</code>\n• <b>Title:</b> {}",
        escape_html(work.id.as_str()),
        escape_html(&work.title),
    )
}

/// Direct message to the alarm owner shortly before the deadline.
pub fn reminder(alarm: &AlarmRecord) -> String {
    format!(
        "⚠️ Incident <code>{}</code> ({}) is due at {}.\nExtend it?",
        escape_html(alarm.id.as_str()),
        escape_html(&alarm.issue),
        alarm.fix_by().format(DISPLAY_FORMAT),
    )
}

/// Notice posted once an alarm has been open for `hours`.
pub fn age_notice(alarm: &AlarmRecord, notice: AgeNotice, hours: u64) -> String {
    let ask = match notice {
        AgeNotice::ResolveRequested => "should be resolved",
        AgeNotice::ExtendRequested | AgeNotice::None => "should be extended",
    };
    format!(
        "⏳ Incident <code>{}</code> ({}) has been open for over {hours} hours and {ask}.",
        escape_html(alarm.id.as_str()),
        escape_html(&alarm.issue),
    )
}

pub fn broadcast(text: &str) -> String {
    format!("💬 <b>Message from administrator:</b>\n{}", escape_html(text))
}

/// Name of the discussion thread opened for an alarm.
pub fn thread_title(alarm: &AlarmRecord) -> String {
    let short: String = alarm.issue.chars().take(20).collect();
    format!("🔥{} {short}...", alarm.id)
}

/// Preview shown before the user confirms a submission.
pub fn preview(submission: &Submission) -> String {
    let body = match submission {
        Submission::Alarm { details, fix_by } => format!(
            "🚨 <b>Incident</b>\n• <b>Title:</b> {}\n• <b>Description:</b> {}\n• <b>Level:</b> {}\n• <b>Service:</b> {}\n• <b>Fix by:</b> {}",
            escape_html(&details.issue),
            escape_html(&details.description),
            escape_html(&details.level),
            escape_html(&details.service),
            fix_by.format(DISPLAY_FORMAT),
        ),
        Submission::Maintenance {
            details,
            start,
            end,
        } => format!(
            "🔧 <b>Maintenance</b>\n• <b>Title:</b> {}\n• <b>Description:</b> {}\n• <b>Start:</b> {}\n• <b>End:</b> {}\n• <b>Unavailable:</b> {}",
            escape_html(&details.title),
            escape_html(&details.description),
            start.format(DISPLAY_FORMAT),
            end.format(DISPLAY_FORMAT),
            escape_html(&details.unavailable_services),
        ),
        Submission::Broadcast { text } => broadcast(text),
    };
    format!("📄 <b>Preview:</b>\n{body}")
}
