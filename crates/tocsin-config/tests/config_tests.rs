// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Tocsin configuration system.

use tocsin_config::diagnostic::ConfigError;
use tocsin_config::{load_and_validate_str, load_config_from_str};

#[test]
fn full_config_deserializes() {
    let toml = r#"
[bot]
name = "ops-bot"
log_level = "debug"

[telegram]
bot_token = "123:ABC"
alarm_channel_id = -1001234
discussion_channel_id = -1005678
admin_ids = [11, 12]
superadmin_ids = [99]

[tracker]
base_url = "https://jira.example.com"
token = "pat"
project_key = "OPS"
timeout_secs = 5
resolve_transition = "31"

[storage]
state_path = "/tmp/tocsin/state.json"

[escalation]
poll_interval_secs = 30
reminder_lead_secs = 600

[catalog]
levels = ["Minor", "Major"]
services = ["Email"]
conference_link = "https://meet.example.com/war-room"
"#;

    let config = load_and_validate_str(toml).expect("valid config");
    assert_eq!(config.bot.name, "ops-bot");
    assert_eq!(config.telegram.alarm_channel_id, Some(-1001234));
    assert_eq!(config.telegram.discussion_channel_id, Some(-1005678));
    assert_eq!(config.telegram.admin_ids, vec![11, 12]);
    assert_eq!(config.tracker.project_key, "OPS");
    assert_eq!(config.tracker.issue_type, "Failure");
    assert_eq!(config.tracker.resolve_transition.as_deref(), Some("31"));
    assert_eq!(config.tracker.create_wait_secs, 5);
    assert_eq!(config.storage.state_path, "/tmp/tocsin/state.json");
    assert_eq!(config.escalation.reminder_lead_secs, 600);
    assert_eq!(config.escalation.resolve_after_hours, 48);
    assert_eq!(config.catalog.levels, vec!["Minor", "Major"]);
    assert_eq!(
        config.catalog.conference_link.as_deref(),
        Some("https://meet.example.com/war-room")
    );
}

#[test]
fn empty_input_yields_defaults() {
    let config = load_config_from_str("").expect("defaults");
    assert_eq!(config.bot.name, "tocsin");
    assert!(config.telegram.bot_token.is_none());
    assert!(config.tracker.base_url.is_none());
}

#[test]
fn misspelled_key_gets_suggestion() {
    let toml = r#"
[escalation]
pol_interval_secs = 10
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, suggestion: Some(s), .. }
            if key == "pol_interval_secs" && s == "poll_interval_secs"
    )));
}

#[test]
fn unknown_section_is_rejected() {
    let errors = load_and_validate_str("[database]\npath = \"x\"\n").unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::UnknownKey { key, .. } if key == "database")));
}

#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[telegram]
alarm_channel_id = "not-a-number"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("alarm_channel_id"))));
}

#[test]
fn semantic_errors_surface_after_parse() {
    let toml = r#"
[escalation]
extend_after_hours = 72
resolve_after_hours = 48
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("resolve_after_hours"))));
}
