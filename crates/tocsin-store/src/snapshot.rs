// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk snapshot document.
//!
//! One JSON object with three maps: `active_alarms`, `active_maintenances`,
//! and `user_states`, each keyed by id. Timestamps are ISO-8601 local times.
//! Decoding is lenient: unknown keys are ignored and an entry that fails to
//! decode is dropped on its own without affecting its neighbours.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tocsin_core::record::UNSPECIFIED_SERVICES;
use tocsin_core::{
    AgeNotice, AlarmDetails, AlarmRecord, ChatId, MaintenanceDetails, MaintenanceRecord,
    MessageRef, RecordId, ThreadId, UserId,
};
use tracing::warn;

use crate::store::ReminderSession;

/// `user_states` tag for a pending reminder reply.
const REMINDER_STATE: &str = "reminder";

/// Serialized form of the whole store.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub active_alarms: BTreeMap<String, AlarmEntry>,
    #[serde(default)]
    pub active_maintenances: BTreeMap<String, MaintenanceEntry>,
    #[serde(default)]
    pub user_states: BTreeMap<String, UserStateEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmEntry {
    pub issue: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub level: String,
    pub fix_time: String,
    pub user_id: i64,
    pub created_at: String,
    #[serde(default)]
    pub reminded: bool,
    #[serde(default)]
    pub age_notice: AgeNotice,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceEntry {
    #[serde(default)]
    pub title: String,
    pub description: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "unspecified_services")]
    pub unavailable_services: String,
    pub user_id: i64,
    pub created_at: String,
}

fn unspecified_services() -> String {
    UNSPECIFIED_SERVICES.to_string()
}

/// Reduced projection of a per-user interaction: enough to route a reply
/// to a reminder after a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStateEntry {
    pub state: String,
    #[serde(default)]
    pub alarm_id: Option<String>,
    #[serde(default)]
    pub issue: Option<String>,
    #[serde(default)]
    pub chat_id: Option<i64>,
    #[serde(default)]
    pub message_id: Option<i32>,
}

/// Records recovered from a snapshot plus a count of what was skipped.
#[derive(Debug, Default)]
pub struct Decoded {
    pub alarms: Vec<AlarmRecord>,
    pub maintenances: Vec<MaintenanceRecord>,
    pub reminders: Vec<ReminderSession>,
    pub dropped: usize,
}

/// Formats a timestamp the way the snapshot stores it.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

/// Parses a stored timestamp. Accepts naive ISO-8601 with `T` or a space,
/// with or without seconds, and RFC 3339 with an offset (kept as wall time).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = raw.parse::<NaiveDateTime>() {
        return Some(ts);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_local())
}

impl AlarmEntry {
    pub fn from_record(record: &AlarmRecord) -> Self {
        Self {
            issue: record.issue.clone(),
            description: record.description.clone(),
            service: record.service.clone(),
            level: record.level.clone(),
            fix_time: format_timestamp(record.fix_by()),
            user_id: record.owner.0,
            created_at: format_timestamp(record.created_at()),
            reminded: record.is_reminded(),
            age_notice: record.age_notice(),
            ticket_url: record.ticket_url.clone(),
            thread_id: record.thread.map(|t| t.0),
        }
    }

    fn into_record(self, id: &str) -> Result<AlarmRecord, String> {
        let fix_by = parse_timestamp(&self.fix_time)
            .ok_or_else(|| format!("unparsable fix_time `{}`", self.fix_time))?;
        let created_at = parse_timestamp(&self.created_at)
            .ok_or_else(|| format!("unparsable created_at `{}`", self.created_at))?;
        let details = AlarmDetails {
            issue: self.issue,
            description: self.description,
            service: self.service,
            level: self.level,
        };
        let mut record = AlarmRecord::new(id.into(), details, UserId(self.user_id), fix_by, created_at)
            .map_err(|e| e.to_string())?
            .with_flags(self.reminded, self.age_notice);
        record.ticket_url = self.ticket_url;
        record.thread = self.thread_id.map(ThreadId);
        Ok(record)
    }
}

impl MaintenanceEntry {
    pub fn from_record(record: &MaintenanceRecord) -> Self {
        Self {
            title: record.title.clone(),
            description: record.description.clone(),
            start_time: format_timestamp(record.start()),
            end_time: format_timestamp(record.end()),
            unavailable_services: record.unavailable_services.clone(),
            user_id: record.owner.0,
            created_at: format_timestamp(record.created_at()),
        }
    }

    fn into_record(self, id: &str) -> Result<MaintenanceRecord, String> {
        let start = parse_timestamp(&self.start_time)
            .ok_or_else(|| format!("unparsable start_time `{}`", self.start_time))?;
        let end = parse_timestamp(&self.end_time)
            .ok_or_else(|| format!("unparsable end_time `{}`", self.end_time))?;
        let created_at = parse_timestamp(&self.created_at)
            .ok_or_else(|| format!("unparsable created_at `{}`", self.created_at))?;
        let details = MaintenanceDetails {
            title: self.title,
            description: self.description,
            unavailable_services: self.unavailable_services,
        };
        MaintenanceRecord::new(id.into(), details, UserId(self.user_id), start, end, created_at)
            .map_err(|e| e.to_string())
    }
}

/// Key of a reminder entry under `user_states`: `<user id>:<alarm id>`.
///
/// Older snapshots keyed entries by the bare user id; both forms load.
pub fn user_state_key(session: &ReminderSession) -> String {
    format!("{}:{}", session.user.0, session.alarm_id.as_str())
}

impl UserStateEntry {
    pub fn from_session(session: &ReminderSession, issue: Option<String>) -> Self {
        Self {
            state: REMINDER_STATE.to_string(),
            alarm_id: Some(session.alarm_id.0.clone()),
            issue,
            chat_id: Some(session.chat.0),
            message_id: session.prompt.map(|m| m.message_id),
        }
    }

    fn into_session(self, user_key: &str) -> Result<ReminderSession, String> {
        let user_part = user_key.split_once(':').map_or(user_key, |(user, _)| user);
        let user = user_part
            .parse::<i64>()
            .map(UserId)
            .map_err(|e| format!("bad user id `{user_key}`: {e}"))?;
        if self.state != REMINDER_STATE {
            return Err(format!("state `{}` is not resumable", self.state));
        }
        let alarm_id = self.alarm_id.ok_or("missing alarm_id")?;
        // Reminders are sent as DMs, so the user id doubles as the chat id.
        let chat = ChatId(self.chat_id.unwrap_or(user.0));
        Ok(ReminderSession {
            user,
            alarm_id: RecordId(alarm_id),
            chat,
            prompt: self.message_id.map(|message_id| MessageRef { chat, message_id }),
        })
    }
}

/// Decodes a snapshot document, dropping individual bad entries.
///
/// Fails only if `raw` is not a JSON object at all.
pub fn decode(raw: &str) -> Result<Decoded, serde_json::Error> {
    let doc: serde_json::Map<String, Value> = serde_json::from_str(raw)?;
    let mut out = Decoded::default();

    for (id, value) in section(&doc, "active_alarms") {
        match serde_json::from_value::<AlarmEntry>(value.clone())
            .map_err(|e| e.to_string())
            .and_then(|entry| entry.into_record(id))
        {
            Ok(record) => out.alarms.push(record),
            Err(reason) => {
                warn!(alarm_id = id.as_str(), reason = %reason, "dropping alarm from snapshot");
                out.dropped += 1;
            }
        }
    }

    for (id, value) in section(&doc, "active_maintenances") {
        match serde_json::from_value::<MaintenanceEntry>(value.clone())
            .map_err(|e| e.to_string())
            .and_then(|entry| entry.into_record(id))
        {
            Ok(record) => out.maintenances.push(record),
            Err(reason) => {
                warn!(maintenance_id = id.as_str(), reason = %reason, "dropping maintenance from snapshot");
                out.dropped += 1;
            }
        }
    }

    for (user, value) in section(&doc, "user_states") {
        let session = serde_json::from_value::<UserStateEntry>(value.clone())
            .map_err(|e| e.to_string())
            .and_then(|entry| entry.into_session(user));
        match session {
            Ok(s) if out.alarms.iter().any(|a| a.id == s.alarm_id) => out.reminders.push(s),
            Ok(s) => {
                warn!(user_id = user.as_str(), alarm_id = %s.alarm_id, "dropping reminder session for missing alarm");
                out.dropped += 1;
            }
            Err(reason) => {
                warn!(user_id = user.as_str(), reason = %reason, "dropping user state from snapshot");
                out.dropped += 1;
            }
        }
    }

    Ok(out)
}

fn section<'a>(
    doc: &'a serde_json::Map<String, Value>,
    key: &str,
) -> impl Iterator<Item = (&'a String, &'a Value)> {
    match doc.get(key) {
        Some(Value::Object(map)) => Some(map.iter()),
        Some(_) => {
            warn!(section = key, "snapshot section is not an object, ignoring");
            None
        }
        None => None,
    }
    .into_iter()
    .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn timestamp_formats() {
        assert_eq!(format_timestamp(at(10, 0)), "2024-01-01T10:00:00");
        assert_eq!(parse_timestamp("2024-01-01T10:00:00"), Some(at(10, 0)));
        assert_eq!(parse_timestamp("2024-01-01 10:00:00"), Some(at(10, 0)));
        assert_eq!(parse_timestamp("2024-01-01T10:00"), Some(at(10, 0)));
        let fractional = parse_timestamp("2024-01-01T10:00:00.250000").unwrap();
        assert_eq!(fractional.and_utc().timestamp_subsec_millis(), 250);
        assert_eq!(parse_timestamp("2024-01-01T10:00:00+03:00"), Some(at(10, 0)));
        assert_eq!(parse_timestamp("tomorrow-ish"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn decodes_legacy_minimal_alarm() {
        let raw = r#"{
            "active_alarms": {
                "FA-9": {"issue": "DB down", "fix_time": "2024-01-01T11:00:00",
                         "user_id": 7, "created_at": "2024-01-01T10:00:00"}
            }
        }"#;
        let decoded = decode(raw).unwrap();
        assert_eq!(decoded.alarms.len(), 1);
        let alarm = &decoded.alarms[0];
        assert_eq!(alarm.id.as_str(), "FA-9");
        assert_eq!(alarm.fix_by(), at(11, 0));
        assert!(!alarm.is_reminded());
        assert!(decoded.maintenances.is_empty());
        assert_eq!(decoded.dropped, 0);
    }

    #[test]
    fn bad_entries_are_dropped_individually() {
        let raw = r#"{
            "active_alarms": {
                "ok": {"issue": "a", "fix_time": "2024-01-01T11:00:00", "user_id": 1, "created_at": "2024-01-01T10:00:00"},
                "bad-time": {"issue": "b", "fix_time": "soon", "user_id": 1, "created_at": "2024-01-01T10:00:00"},
                "missing-owner": {"issue": "c", "fix_time": "2024-01-01T11:00:00", "created_at": "2024-01-01T10:00:00"}
            },
            "active_maintenances": {
                "m1": {"description": "d", "start_time": "2024-01-01T12:00:00", "end_time": "2024-01-01T11:00:00",
                       "user_id": 1, "created_at": "2024-01-01T10:00:00"}
            },
            "some_future_key": 5
        }"#;
        let decoded = decode(raw).unwrap();
        assert_eq!(decoded.alarms.len(), 1);
        assert_eq!(decoded.alarms[0].id.as_str(), "ok");
        assert!(decoded.maintenances.is_empty());
        assert_eq!(decoded.dropped, 3);
    }

    #[test]
    fn reminder_sessions_require_live_alarm() {
        let raw = r#"{
            "active_alarms": {
                "A1": {"issue": "a", "fix_time": "2024-01-01T11:00:00", "user_id": 5, "created_at": "2024-01-01T10:00:00", "reminded": true}
            },
            "user_states": {
                "5": {"state": "reminder", "alarm_id": "A1", "chat_id": 5, "message_id": 77},
                "6": {"state": "reminder", "alarm_id": "gone"},
                "7": {"state": "ENTER_TITLE"},
                "x": {"state": "reminder", "alarm_id": "A1"}
            }
        }"#;
        let decoded = decode(raw).unwrap();
        assert_eq!(decoded.reminders.len(), 1);
        let session = &decoded.reminders[0];
        assert_eq!(session.user, UserId(5));
        assert_eq!(session.prompt.map(|p| p.message_id), Some(77));
        assert!(decoded.alarms[0].is_reminded());
        assert_eq!(decoded.dropped, 3);
    }

    #[test]
    fn reminder_keys_carry_user_and_alarm() {
        let raw = r#"{
            "active_alarms": {
                "A1": {"issue": "a", "fix_time": "2024-01-01T11:00:00", "user_id": 5, "created_at": "2024-01-01T10:00:00", "reminded": true},
                "A2": {"issue": "b", "fix_time": "2024-01-01T11:00:00", "user_id": 5, "created_at": "2024-01-01T10:00:00", "reminded": true}
            },
            "user_states": {
                "5:A1": {"state": "reminder", "alarm_id": "A1", "chat_id": 5, "message_id": 77},
                "5:A2": {"state": "reminder", "alarm_id": "A2", "chat_id": 5, "message_id": 78}
            }
        }"#;
        let decoded = decode(raw).unwrap();
        assert_eq!(decoded.reminders.len(), 2);
        assert!(decoded.reminders.iter().all(|s| s.user == UserId(5)));
        assert_eq!(user_state_key(&decoded.reminders[0]), "5:A1");
        assert_eq!(decoded.dropped, 0);
    }

    #[test]
    fn non_object_document_is_an_error() {
        assert!(decode("[1, 2]").is_err());
        assert!(decode("{not json").is_err());
    }
}
