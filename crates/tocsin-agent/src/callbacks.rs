// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Button payloads shared by the wizard, the manage flow and the renderer.

pub const CANCEL: &str = "cancel";

pub const TYPE_ALARM: &str = "message_type_alarm";
pub const TYPE_MAINTENANCE: &str = "message_type_maintenance";
pub const TYPE_BROADCAST: &str = "message_type_regular";

pub const LEVEL_PREFIX: &str = "lvl_";
pub const SERVICE_PREFIX: &str = "svc_";

pub const CONFIRM_SEND: &str = "confirm_send";
pub const CONFIRM_CANCEL: &str = "confirm_cancel";

pub const SELECT_ALARM_PREFIX: &str = "select_alarm_";
pub const SELECT_MAINTENANCE_PREFIX: &str = "select_maintenance_";
pub const ACTION_STOP: &str = "action_stop";
pub const ACTION_EXTEND: &str = "action_extend";
pub const EXTEND_30_MIN: &str = "extend_30_min";
pub const EXTEND_1_HOUR: &str = "extend_1_hour";
pub const EXTEND_CANCEL: &str = "extend_cancel";

pub const REMINDER_EXTEND: &str = "reminder_extend";
pub const REMINDER_STOP: &str = "reminder_stop";

pub const PAGE_PREFIX: &str = "alarm_list_page_";

/// Text of the cancel button, also accepted when typed.
pub const CANCEL_LABEL: &str = "❌ Cancel";

/// Returns the catalog entry selected by `data` (`<prefix><index>`).
pub fn catalog_choice<'a>(data: &str, prefix: &str, catalog: &'a [String]) -> Option<&'a str> {
    let index: usize = data.strip_prefix(prefix)?.parse().ok()?;
    catalog.get(index).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_choice_by_index() {
        let levels = vec!["Minor".to_string(), "Major".to_string()];
        assert_eq!(catalog_choice("lvl_1", LEVEL_PREFIX, &levels), Some("Major"));
        assert_eq!(catalog_choice("lvl_2", LEVEL_PREFIX, &levels), None);
        assert_eq!(catalog_choice("svc_0", LEVEL_PREFIX, &levels), None);
        assert_eq!(catalog_choice("lvl_x", LEVEL_PREFIX, &levels), None);
    }
}
