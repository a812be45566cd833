// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live alarm and maintenance records.
//!
//! Timestamps are naive local wall-clock times, the same clock users type
//! times in. Constructors and mutators reject values that would break the
//! ordering invariants, so a record held by the store is always coherent.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::TocsinError;
use crate::types::{RecordId, ThreadId, UserId};

/// How far an unresolved alarm has progressed through the age notices.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AgeNotice {
    #[default]
    None,
    /// The "should be extended" notice has been posted.
    ExtendRequested,
    /// The "should be resolved" notice has been posted.
    ResolveRequested,
}

/// User-supplied description of an alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmDetails {
    pub issue: String,
    pub description: String,
    pub service: String,
    pub level: String,
}

/// An active incident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmRecord {
    pub id: RecordId,
    pub issue: String,
    pub description: String,
    pub service: String,
    pub level: String,
    pub owner: UserId,
    /// Browse URL of the tracker ticket, absent for local fallback ids.
    pub ticket_url: Option<String>,
    /// Discussion thread opened for this alarm.
    pub thread: Option<ThreadId>,
    fix_by: NaiveDateTime,
    created_at: NaiveDateTime,
    reminded: bool,
    age_notice: AgeNotice,
}

impl AlarmRecord {
    /// Creates a new alarm. `fix_by` must not precede `created_at`.
    pub fn new(
        id: RecordId,
        details: AlarmDetails,
        owner: UserId,
        fix_by: NaiveDateTime,
        created_at: NaiveDateTime,
    ) -> Result<Self, TocsinError> {
        if fix_by < created_at {
            return Err(TocsinError::Validation(format!(
                "alarm {id}: fix time {fix_by} is before creation time {created_at}"
            )));
        }
        Ok(Self {
            id,
            issue: details.issue,
            description: details.description,
            service: details.service,
            level: details.level,
            owner,
            ticket_url: None,
            thread: None,
            fix_by,
            created_at,
            reminded: false,
            age_notice: AgeNotice::None,
        })
    }

    pub fn fix_by(&self) -> NaiveDateTime {
        self.fix_by
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn is_reminded(&self) -> bool {
        self.reminded
    }

    pub fn age_notice(&self) -> AgeNotice {
        self.age_notice
    }

    /// Restores escalation flags read back from a snapshot.
    pub fn with_flags(mut self, reminded: bool, age_notice: AgeNotice) -> Self {
        self.reminded = reminded;
        self.age_notice = age_notice;
        self
    }

    /// Moves the target resolution time and re-arms the reminder.
    pub fn extend_to(&mut self, fix_by: NaiveDateTime) -> Result<(), TocsinError> {
        if fix_by < self.created_at {
            return Err(TocsinError::Validation(format!(
                "alarm {}: new fix time {fix_by} is before creation time {}",
                self.id, self.created_at
            )));
        }
        self.fix_by = fix_by;
        self.reminded = false;
        Ok(())
    }

    /// Pushes the target resolution time forward by `delta`.
    pub fn extend_by(&mut self, delta: Duration) -> Result<(), TocsinError> {
        if delta <= Duration::zero() {
            return Err(TocsinError::Validation(format!(
                "alarm {}: extension must be positive",
                self.id
            )));
        }
        self.extend_to(self.fix_by + delta)
    }

    /// True once `now` is within `lead` of the fix time and no reminder has fired.
    pub fn reminder_due(&self, now: NaiveDateTime, lead: Duration) -> bool {
        !self.reminded && now >= self.fix_by - lead
    }

    /// Marks the reminder as sent. Returns false if it already was.
    pub fn mark_reminded(&mut self) -> bool {
        !std::mem::replace(&mut self.reminded, true)
    }

    /// Advances the age notice stage. Returns false if `stage` was already reached.
    pub fn advance_age_notice(&mut self, stage: AgeNotice) -> bool {
        if stage <= self.age_notice {
            return false;
        }
        self.age_notice = stage;
        true
    }

    /// Hours elapsed since the alarm was raised.
    pub fn age(&self, now: NaiveDateTime) -> Duration {
        now - self.created_at
    }
}

/// A planned maintenance window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceRecord {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    pub unavailable_services: String,
    pub owner: UserId,
    start: NaiveDateTime,
    end: NaiveDateTime,
    created_at: NaiveDateTime,
}

/// User-supplied description of a maintenance window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceDetails {
    pub title: String,
    pub description: String,
    pub unavailable_services: String,
}

/// Placeholder stored when no impacted services were given.
pub const UNSPECIFIED_SERVICES: &str = "not specified";

impl MaintenanceRecord {
    /// Creates a maintenance window. `end` must be strictly after `start`.
    pub fn new(
        id: RecordId,
        details: MaintenanceDetails,
        owner: UserId,
        start: NaiveDateTime,
        end: NaiveDateTime,
        created_at: NaiveDateTime,
    ) -> Result<Self, TocsinError> {
        check_window(&id, start, end)?;
        let unavailable_services = if details.unavailable_services.trim().is_empty() {
            UNSPECIFIED_SERVICES.to_string()
        } else {
            details.unavailable_services
        };
        Ok(Self {
            id,
            title: details.title,
            description: details.description,
            unavailable_services,
            owner,
            start,
            end,
            created_at,
        })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    /// Moves the end of the window. The record is unchanged on error.
    pub fn reschedule_end(&mut self, end: NaiveDateTime) -> Result<(), TocsinError> {
        check_window(&self.id, self.start, end)?;
        self.end = end;
        Ok(())
    }
}

fn check_window(id: &RecordId, start: NaiveDateTime, end: NaiveDateTime) -> Result<(), TocsinError> {
    if end <= start {
        return Err(TocsinError::Validation(format!(
            "maintenance {id}: end {end} must be after start {start}"
        )));
    }
    Ok(())
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

    fn details() -> AlarmDetails {
        AlarmDetails {
            issue: "DB down".into(),
            description: "replica lag".into(),
            service: "Email".into(),
            level: "Full service outage".into(),
        }
    }

    fn alarm() -> AlarmRecord {
        AlarmRecord::new("FA-1".into(), details(), UserId(1), at(11, 0), at(10, 0)).unwrap()
    }

    #[test]
    fn alarm_rejects_fix_time_before_creation() {
        let err = AlarmRecord::new("x".into(), details(), UserId(1), at(9, 0), at(10, 0));
        assert!(matches!(err, Err(TocsinError::Validation(_))));
    }

    #[test]
    fn reminder_due_within_lead_window() {
        let a = alarm();
        let lead = Duration::minutes(5);
        assert!(!a.reminder_due(at(10, 54), lead));
        assert!(a.reminder_due(at(10, 55), lead));
        assert!(a.reminder_due(at(10, 56), lead));
    }

    #[test]
    fn mark_reminded_only_transitions_once() {
        let mut a = alarm();
        assert!(a.mark_reminded());
        assert!(!a.mark_reminded());
        assert!(!a.reminder_due(at(10, 57), Duration::minutes(5)));
    }

    #[test]
    fn extension_rearms_reminder() {
        let mut a = alarm();
        a.mark_reminded();
        a.extend_by(Duration::minutes(30)).unwrap();
        assert_eq!(a.fix_by(), at(11, 30));
        assert!(!a.is_reminded());
        assert!(a.reminder_due(at(11, 26), Duration::minutes(5)));
    }

    #[test]
    fn extension_rejects_non_positive_delta() {
        let mut a = alarm();
        assert!(a.extend_by(Duration::zero()).is_err());
        assert_eq!(a.fix_by(), at(11, 0));
    }

    #[test]
    fn age_notice_stages_advance_monotonically() {
        let mut a = alarm();
        assert!(a.advance_age_notice(AgeNotice::ExtendRequested));
        assert!(!a.advance_age_notice(AgeNotice::ExtendRequested));
        assert!(a.advance_age_notice(AgeNotice::ResolveRequested));
        assert!(!a.advance_age_notice(AgeNotice::ExtendRequested));
        assert_eq!(a.age_notice(), AgeNotice::ResolveRequested);
    }

    #[test]
    fn maintenance_requires_end_after_start() {
        let d = MaintenanceDetails {
            title: "Upgrade".into(),
            description: "Postgres 16".into(),
            unavailable_services: String::new(),
        };
        let err = MaintenanceRecord::new("m1".into(), d.clone(), UserId(1), at(10, 0), at(9, 0), at(8, 0));
        assert!(err.is_err());
        let equal = MaintenanceRecord::new("m1".into(), d.clone(), UserId(1), at(10, 0), at(10, 0), at(8, 0));
        assert!(equal.is_err());

        let mut m =
            MaintenanceRecord::new("m1".into(), d, UserId(1), at(10, 0), at(12, 0), at(8, 0)).unwrap();
        assert_eq!(m.unavailable_services, UNSPECIFIED_SERVICES);
        assert!(m.reschedule_end(at(9, 0)).is_err());
        assert_eq!(m.end(), at(12, 0));
        m.reschedule_end(at(13, 0)).unwrap();
        assert_eq!(m.end(), at(13, 0));
    }

    #[test]
    fn age_notice_strings() {
        assert_eq!(AgeNotice::ExtendRequested.to_string(), "extend_requested");
        assert_eq!(
            serde_json::to_string(&AgeNotice::ResolveRequested).unwrap(),
            "\"resolve_requested\""
        );
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_positive_extension_keeps_fix_after_creation(mins in 1i64..100_000) {
                let mut a = alarm();
                a.mark_reminded();
                a.extend_by(Duration::minutes(mins)).unwrap();
                prop_assert!(a.fix_by() >= a.created_at());
                prop_assert!(!a.is_reminded());
            }
        }
    }
}
