// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tocsin.toml` > `~/.config/tocsin/tocsin.toml` > `/etc/tocsin/tocsin.toml`
//! with environment variable overrides via `TOCSIN_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::TocsinConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/tocsin/tocsin.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "tocsin.toml";

/// Sections whose env keys are split at the first underscore.
const ENV_SECTIONS: &[&str] = &[
    "bot",
    "telegram",
    "tracker",
    "storage",
    "escalation",
    "catalog",
];

/// Path of the per-user config file, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tocsin/tocsin.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tocsin/tocsin.toml` (system-wide)
/// 3. `~/.config/tocsin/tocsin.toml` (user XDG config)
/// 4. `./tocsin.toml` (local directory)
/// 5. `TOCSIN_*` environment variables
pub fn load_config() -> Result<TocsinConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<TocsinConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TocsinConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TocsinConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TocsinConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TocsinConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Environment provider mapping `TOCSIN_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `TOCSIN_TELEGRAM_BOT_TOKEN` is `telegram.bot_token`.
fn env_provider() -> Env {
    Env::prefixed("TOCSIN_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_only_at_section() {
        assert_eq!(map_env_key("telegram_bot_token"), "telegram.bot_token");
        assert_eq!(
            map_env_key("escalation_poll_interval_secs"),
            "escalation.poll_interval_secs"
        );
        assert_eq!(map_env_key("storage_state_path"), "storage.state_path");
        assert_eq!(map_env_key("TRACKER_BASE_URL"), "tracker.base_url");
        assert_eq!(map_env_key("unknown_key"), "unknown_key");
    }

    #[test]
    fn env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
[telegram]
bot_token = "from-file"
alarm_channel_id = -1001
"#,
            )?;
            jail.set_env("TOCSIN_TELEGRAM_BOT_TOKEN", "from-env");
            jail.set_env("TOCSIN_ESCALATION_POLL_INTERVAL_SECS", "5");

            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.telegram.bot_token.as_deref(), Some("from-env"));
            assert_eq!(config.telegram.alarm_channel_id, Some(-1001));
            assert_eq!(config.escalation.poll_interval_secs, 5);
            Ok(())
        });
    }

    #[test]
    fn local_file_is_picked_up() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                LOCAL_CONFIG_PATH,
                r#"
[storage]
state_path = "/var/lib/tocsin/state.json"
"#,
            )?;
            let config = load_config()?;
            assert_eq!(config.storage.state_path, "/var/lib/tocsin/state.json");
            Ok(())
        });
    }
}
