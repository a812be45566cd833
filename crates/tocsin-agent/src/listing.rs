// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Paginated `/alarm_list` view of everything currently open.

use tocsin_core::types::{Button, Keyboard};
use tocsin_core::{AlarmRecord, MaintenanceRecord};

use crate::callbacks;
use crate::format::escape_html;
use crate::render::Rendered;
use crate::timeparse::DISPLAY_FORMAT;

pub const PAGE_SIZE: usize = 5;

fn alarm_entry(alarm: &AlarmRecord) -> String {
    format!(
        "🚨 <code>{}</code> {}\n   {} · fix by {}",
        escape_html(alarm.id.as_str()),
        escape_html(&alarm.issue),
        escape_html(&alarm.service),
        alarm.fix_by().format(DISPLAY_FORMAT)
    )
}

fn maintenance_entry(work: &MaintenanceRecord) -> String {
    format!(
        "🔧 <code>{}</code> {}\n   {} – {}",
        escape_html(work.id.as_str()),
        escape_html(&work.title),
        work.start().format(DISPLAY_FORMAT),
        work.end().format(DISPLAY_FORMAT)
    )
}

/// Renders page `page` (zero-based, clamped to the last page).
pub fn render_page(alarms: &[AlarmRecord], works: &[MaintenanceRecord], page: usize) -> Rendered {
    let entries: Vec<String> = alarms
        .iter()
        .map(alarm_entry)
        .chain(works.iter().map(maintenance_entry))
        .collect();
    if entries.is_empty() {
        return Rendered::text("✅ No active incidents or maintenance windows.");
    }

    let pages = entries.len().div_ceil(PAGE_SIZE);
    let page = page.min(pages - 1);
    let body = entries
        .iter()
        .skip(page * PAGE_SIZE)
        .take(PAGE_SIZE)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n\n");
    let text = format!("📋 <b>Current events</b> (page {}/{pages})\n\n{body}", page + 1);

    let mut nav = Vec::new();
    if page > 0 {
        nav.push(Button::new(
            "◀️ Back",
            format!("{}{}", callbacks::PAGE_PREFIX, page - 1),
        ));
    }
    if page + 1 < pages {
        nav.push(Button::new(
            "Next ▶️",
            format!("{}{}", callbacks::PAGE_PREFIX, page + 1),
        ));
    }
    if nav.is_empty() {
        Rendered::text(text)
    } else {
        Rendered::with_keyboard(text, Keyboard::row(nav))
    }
}

/// Extracts the page number from a pager button payload.
pub fn page_from_callback(data: &str) -> Option<usize> {
    data.strip_prefix(callbacks::PAGE_PREFIX)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use tocsin_core::{AlarmDetails, UserId};

    fn alarms(n: usize) -> Vec<AlarmRecord> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        (0..n)
            .map(|i| {
                AlarmRecord::new(
                    format!("A{i}").as_str().into(),
                    AlarmDetails {
                        issue: format!("issue {i}"),
                        description: String::new(),
                        service: "Email".into(),
                        level: "Minor".into(),
                    },
                    UserId(1),
                    base + Duration::hours(1),
                    base,
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn empty_list() {
        let page = render_page(&[], &[], 0);
        assert!(page.text.contains("No active"));
        assert!(page.keyboard.is_none());
    }

    #[test]
    fn pages_of_five_with_navigation() {
        let list = alarms(12);
        let first = render_page(&list, &[], 0);
        assert!(first.text.contains("page 1/3"));
        assert!(first.text.contains("A4") && !first.text.contains("A5"));
        let data: Vec<_> = first.keyboard.unwrap().buttons().map(|b| b.data.clone()).collect();
        assert_eq!(data, vec!["alarm_list_page_1"]);

        let middle = render_page(&list, &[], 1);
        assert_eq!(middle.keyboard.unwrap().buttons().count(), 2);

        let clamped = render_page(&list, &[], 99);
        assert!(clamped.text.contains("page 3/3"));
        assert!(clamped.text.contains("A11"));
    }

    #[test]
    fn single_page_has_no_keyboard() {
        let page = render_page(&alarms(3), &[], 0);
        assert!(page.keyboard.is_none());
    }

    #[test]
    fn parses_pager_payload() {
        assert_eq!(page_from_callback("alarm_list_page_3"), Some(3));
        assert_eq!(page_from_callback("alarm_list_page_"), None);
        assert_eq!(page_from_callback("select_alarm_1"), None);
    }
}
