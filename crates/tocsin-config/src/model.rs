// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Tocsin incident bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};
use tocsin_core::StaticRoles;

/// Top-level Tocsin configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section is optional and defaults sensibly.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TocsinConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram bot, channel, and role settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Issue tracker (Jira) settings.
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// State snapshot settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Reminder and age-notice thresholds.
    #[serde(default)]
    pub escalation: EscalationConfig,

    /// Problem levels and services offered in the wizard.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl TocsinConfig {
    /// Builds the role lists used for admin and superadmin checks.
    pub fn roles(&self) -> StaticRoles {
        StaticRoles::new(
            self.telegram.admin_ids.iter().copied(),
            self.telegram.superadmin_ids.iter().copied(),
        )
    }
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name used in logs.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_bot_name() -> String {
    "tocsin".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required by `serve`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Public channel receiving alarm and maintenance announcements.
    #[serde(default)]
    pub alarm_channel_id: Option<i64>,

    /// Forum chat where a discussion thread is opened per alarm.
    #[serde(default)]
    pub discussion_channel_id: Option<i64>,

    /// Users allowed to create and manage records.
    #[serde(default)]
    pub admin_ids: Vec<i64>,

    /// Users who see and manage every record.
    #[serde(default)]
    pub superadmin_ids: Vec<i64>,

    /// Upper bound for a single Bot API call.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            alarm_channel_id: None,
            discussion_channel_id: None,
            admin_ids: Vec::new(),
            superadmin_ids: Vec::new(),
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

fn default_send_timeout_secs() -> u64 {
    30
}

/// Jira issue tracker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    /// Jira base URL. `None` disables ticket creation.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Personal access token sent as a bearer token.
    #[serde(default)]
    pub token: Option<String>,

    /// Project receiving failure tickets.
    #[serde(default = "default_project_key")]
    pub project_key: String,

    /// Issue type name for failure tickets.
    #[serde(default = "default_issue_type")]
    pub issue_type: String,

    /// Request timeout in seconds.
    #[serde(default = "default_tracker_timeout_secs")]
    pub timeout_secs: u64,

    /// Custom field holding the problem level.
    #[serde(default = "default_level_field")]
    pub level_field: String,

    /// Custom field holding the affected service.
    #[serde(default = "default_service_field")]
    pub service_field: String,

    /// Custom field holding the failure start time.
    #[serde(default = "default_start_time_field")]
    pub start_time_field: String,

    /// Custom field holding the business influence.
    #[serde(default = "default_influence_field")]
    pub influence_field: String,

    /// Influence value submitted with every ticket.
    #[serde(default = "default_influence")]
    pub default_influence: String,

    /// UTC offset appended to local start times, e.g. `+0300`.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,

    /// How long a new alarm waits for its ticket before taking a local id.
    #[serde(default = "default_create_wait_secs")]
    pub create_wait_secs: u64,

    /// Workflow transition applied to the ticket when its alarm is stopped.
    /// `None` leaves the ticket open.
    #[serde(default)]
    pub resolve_transition: Option<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            project_key: default_project_key(),
            issue_type: default_issue_type(),
            timeout_secs: default_tracker_timeout_secs(),
            level_field: default_level_field(),
            service_field: default_service_field(),
            start_time_field: default_start_time_field(),
            influence_field: default_influence_field(),
            default_influence: default_influence(),
            utc_offset: default_utc_offset(),
            create_wait_secs: default_create_wait_secs(),
            resolve_transition: None,
        }
    }
}

fn default_project_key() -> String {
    "FA".to_string()
}

fn default_issue_type() -> String {
    "Failure".to_string()
}

fn default_tracker_timeout_secs() -> u64 {
    10
}

fn default_level_field() -> String {
    "customfield_13117".to_string()
}

fn default_service_field() -> String {
    "customfield_13937".to_string()
}

fn default_start_time_field() -> String {
    "customfield_13119".to_string()
}

fn default_influence_field() -> String {
    "customfield_17107".to_string()
}

fn default_influence() -> String {
    "Clients".to_string()
}

fn default_utc_offset() -> String {
    "+0300".to_string()
}

fn default_create_wait_secs() -> u64 {
    5
}

/// State snapshot configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path of the JSON snapshot file.
    #[serde(default = "default_state_path")]
    pub state_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
        }
    }
}

fn default_state_path() -> String {
    "data/state.json".to_string()
}

/// Escalation scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EscalationConfig {
    /// Seconds between scans of the live alarms.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// How long before the fix time the owner is reminded.
    #[serde(default = "default_reminder_lead_secs")]
    pub reminder_lead_secs: u64,

    /// Alarm age after which a "should be extended" notice is posted.
    #[serde(default = "default_extend_after_hours")]
    pub extend_after_hours: u64,

    /// Alarm age after which a "should be resolved" notice is posted.
    #[serde(default = "default_resolve_after_hours")]
    pub resolve_after_hours: u64,

    /// Post the age notices at all.
    #[serde(default = "default_true")]
    pub age_notices: bool,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            reminder_lead_secs: default_reminder_lead_secs(),
            extend_after_hours: default_extend_after_hours(),
            resolve_after_hours: default_resolve_after_hours(),
            age_notices: default_true(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_reminder_lead_secs() -> u64 {
    300
}

fn default_extend_after_hours() -> u64 {
    24
}

fn default_resolve_after_hours() -> u64 {
    48
}

fn default_true() -> bool {
    true
}

/// Choices offered while describing an alarm.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Problem levels, offered as buttons.
    #[serde(default = "default_levels")]
    pub levels: Vec<String>,

    /// Affected services, offered as buttons.
    #[serde(default = "default_services")]
    pub services: Vec<String>,

    /// Incident call link appended to discussion-thread posts.
    #[serde(default)]
    pub conference_link: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            levels: default_levels(),
            services: default_services(),
            conference_link: None,
        }
    }
}

fn default_levels() -> Vec<String> {
    [
        "Service slowdown",
        "Full service outage",
        "Partial service outage",
        "Service malfunction",
        "Potential service outage",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_services() -> Vec<String> {
    [
        "Email",
        "VPN",
        "Website",
        "Telephony",
        "Payments",
        "Jira",
        "Confluence",
        "Mobile app",
        "Other",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
