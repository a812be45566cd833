// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde cannot express: positive intervals, ordered
//! escalation thresholds, usable tracker URLs, non-empty catalogs.

use crate::diagnostic::ConfigError;
use crate::model::TocsinConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns every problem found rather than stopping at the first.
pub fn validate_config(config: &TocsinConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.bot.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "bot.log_level `{}` must be one of {}",
            config.bot.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.storage.state_path.trim().is_empty() {
        errors.push(ConfigError::validation("storage.state_path must not be empty"));
    }

    let esc = &config.escalation;
    if esc.poll_interval_secs == 0 {
        errors.push(ConfigError::validation(
            "escalation.poll_interval_secs must be greater than 0",
        ));
    }
    if esc.reminder_lead_secs == 0 {
        errors.push(ConfigError::validation(
            "escalation.reminder_lead_secs must be greater than 0",
        ));
    }
    if esc.age_notices && esc.extend_after_hours >= esc.resolve_after_hours {
        errors.push(ConfigError::validation(format!(
            "escalation.extend_after_hours ({}) must be less than escalation.resolve_after_hours ({})",
            esc.extend_after_hours, esc.resolve_after_hours
        )));
    }

    if let Some(url) = config.tracker.base_url.as_deref() {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(ConfigError::validation(format!(
                "tracker.base_url `{url}` must start with http:// or https://"
            )));
        }
        if config.tracker.token.as_deref().is_none_or(|t| t.trim().is_empty()) {
            errors.push(ConfigError::validation(
                "tracker.token is required when tracker.base_url is set",
            ));
        }
    }
    if config.tracker.timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "tracker.timeout_secs must be greater than 0",
        ));
    }
    if config.tracker.create_wait_secs == 0 {
        errors.push(ConfigError::validation(
            "tracker.create_wait_secs must be greater than 0",
        ));
    }
    if config
        .tracker
        .resolve_transition
        .as_deref()
        .is_some_and(|t| t.trim().is_empty())
    {
        errors.push(ConfigError::validation(
            "tracker.resolve_transition must not be blank",
        ));
    }

    if config.catalog.levels.is_empty() {
        errors.push(ConfigError::validation("catalog.levels must not be empty"));
    }
    if config.catalog.services.is_empty() {
        errors.push(ConfigError::validation("catalog.services must not be empty"));
    }
    for (section, list) in [
        ("catalog.levels", &config.catalog.levels),
        ("catalog.services", &config.catalog.services),
    ] {
        if list.iter().any(|s| s.trim().is_empty()) {
            errors.push(ConfigError::validation(format!(
                "{section} must not contain blank entries"
            )));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks needed only when actually connecting to Telegram.
pub fn validate_for_serve(config: &TocsinConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = match validate_config(config) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    if config
        .telegram
        .bot_token
        .as_deref()
        .is_none_or(|t| t.trim().is_empty())
    {
        errors.push(ConfigError::MissingKey {
            key: "telegram.bot_token".to_string(),
        });
    }
    if config.telegram.alarm_channel_id.is_none() {
        errors.push(ConfigError::MissingKey {
            key: "telegram.alarm_channel_id".to_string(),
        });
    }
    if config.telegram.admin_ids.is_empty() && config.telegram.superadmin_ids.is_empty() {
        errors.push(ConfigError::validation(
            "telegram.admin_ids or telegram.superadmin_ids must list at least one user",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
