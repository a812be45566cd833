// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The live state store.
//!
//! All map mutations, reminder claims, and the read pass of [`StateStore::save`]
//! go through one mutex, so readers see either the state before a mutation or
//! after it. File writes happen outside that mutex under a separate save lock
//! that keeps snapshots landing on disk in the order they were taken.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use tocsin_core::{
    AgeNotice, AlarmRecord, Authorizer, ChatId, MaintenanceRecord, MessageRef, RecordId,
    TocsinError, UserId,
};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::snapshot::{self, AlarmEntry, MaintenanceEntry, Snapshot, UserStateEntry};

/// A reminder awaiting the owner's "extend" or "stop" reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderSession {
    pub user: UserId,
    pub alarm_id: RecordId,
    /// Chat the reminder was sent to.
    pub chat: ChatId,
    /// The reminder message itself, when delivery succeeded.
    pub prompt: Option<MessageRef>,
}

/// Which records a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    All,
    OwnedBy(UserId),
}

impl Visibility {
    /// Superadmins see everything; everyone else sees their own records.
    pub fn for_user(user: UserId, auth: &dyn Authorizer) -> Self {
        if auth.is_superadmin(user) {
            Self::All
        } else {
            Self::OwnedBy(user)
        }
    }

    fn admits(self, owner: UserId) -> bool {
        match self {
            Self::All => true,
            Self::OwnedBy(user) => user == owner,
        }
    }
}

/// How [`StateStore::load`] found the snapshot file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Read and decoded (possibly with dropped entries).
    Loaded,
    /// No file yet; starting empty.
    Missing,
    /// Unreadable or not JSON; starting empty.
    Corrupt,
}

/// Summary of a load, for logging at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub outcome: LoadOutcome,
    pub alarms: usize,
    pub maintenances: usize,
    pub reminders: usize,
    pub dropped: usize,
}

impl LoadReport {
    fn empty(outcome: LoadOutcome) -> Self {
        Self {
            outcome,
            alarms: 0,
            maintenances: 0,
            reminders: 0,
            dropped: 0,
        }
    }
}

#[derive(Debug, Default)]
struct LiveState {
    alarms: BTreeMap<RecordId, AlarmRecord>,
    maintenances: BTreeMap<RecordId, MaintenanceRecord>,
    reminders: BTreeMap<RecordId, ReminderSession>,
}

impl LiveState {
    fn to_snapshot(&self) -> Snapshot {
        let mut snap = Snapshot::default();
        for (id, alarm) in &self.alarms {
            snap.active_alarms
                .insert(id.0.clone(), AlarmEntry::from_record(alarm));
        }
        for (id, work) in &self.maintenances {
            snap.active_maintenances
                .insert(id.0.clone(), MaintenanceEntry::from_record(work));
        }
        for session in self.reminders.values() {
            let issue = self.alarms.get(&session.alarm_id).map(|a| a.issue.clone());
            snap.user_states.insert(
                snapshot::user_state_key(session),
                UserStateEntry::from_session(session, issue),
            );
        }
        snap
    }
}

/// Owns every live alarm, maintenance window, and pending reminder reply.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    state: Mutex<LiveState>,
    save_lock: Mutex<()>,
}

impl StateStore {
    /// Creates an empty store persisting to `path`. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(LiveState::default()),
            save_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // --- alarms ---

    /// Inserts or replaces an alarm.
    pub async fn upsert_alarm(&self, alarm: AlarmRecord) {
        debug!(alarm_id = %alarm.id, "upserting alarm");
        self.state.lock().await.alarms.insert(alarm.id.clone(), alarm);
    }

    /// Removes an alarm and any reminder session pointing at it.
    pub async fn remove_alarm(&self, id: &RecordId) -> Option<AlarmRecord> {
        let mut state = self.state.lock().await;
        let removed = state.alarms.remove(id);
        if removed.is_some() {
            state.reminders.retain(|_, s| s.alarm_id != *id);
            debug!(alarm_id = %id, "alarm removed");
        }
        removed
    }

    pub async fn get_alarm(&self, id: &RecordId) -> Option<AlarmRecord> {
        self.state.lock().await.alarms.get(id).cloned()
    }

    /// Alarms visible under `filter`, ordered by fix time.
    pub async fn list_alarms(&self, filter: Visibility) -> Vec<AlarmRecord> {
        let state = self.state.lock().await;
        let mut alarms: Vec<_> = state
            .alarms
            .values()
            .filter(|a| filter.admits(a.owner))
            .cloned()
            .collect();
        alarms.sort_by_key(|a| (a.fix_by(), a.id.clone()));
        alarms
    }

    /// Alarms the user may manage.
    pub async fn user_active_alarms(&self, user: UserId, auth: &dyn Authorizer) -> Vec<AlarmRecord> {
        self.list_alarms(Visibility::for_user(user, auth)).await
    }

    /// Applies `f` to a copy of the alarm and commits it only if `f` succeeds.
    pub async fn update_alarm<T>(
        &self,
        id: &RecordId,
        f: impl FnOnce(&mut AlarmRecord) -> Result<T, TocsinError>,
    ) -> Result<(T, AlarmRecord), TocsinError> {
        let mut state = self.state.lock().await;
        let current = state.alarms.get(id).ok_or_else(|| TocsinError::NotFound {
            kind: "alarm",
            id: id.0.clone(),
        })?;
        let mut updated = current.clone();
        let out = f(&mut updated)?;
        state.alarms.insert(id.clone(), updated.clone());
        Ok((out, updated))
    }

    /// Marks every alarm whose reminder is due and returns them.
    ///
    /// The flag flips under the store lock, so concurrent scans cannot both
    /// claim the same alarm.
    pub async fn claim_due_reminders(&self, now: NaiveDateTime, lead: Duration) -> Vec<AlarmRecord> {
        let mut state = self.state.lock().await;
        state
            .alarms
            .values_mut()
            .filter(|a| a.reminder_due(now, lead))
            .filter_map(|a| a.mark_reminded().then(|| a.clone()))
            .collect()
    }

    /// Advances age notices for alarms older than the thresholds.
    ///
    /// An alarm crossing both thresholds between scans gets only the later notice.
    pub async fn claim_age_notices(
        &self,
        now: NaiveDateTime,
        extend_after: Duration,
        resolve_after: Duration,
    ) -> Vec<(AlarmRecord, AgeNotice)> {
        let mut state = self.state.lock().await;
        let mut claimed = Vec::new();
        for alarm in state.alarms.values_mut() {
            let age = alarm.age(now);
            let stage = if age >= resolve_after {
                AgeNotice::ResolveRequested
            } else if age >= extend_after {
                AgeNotice::ExtendRequested
            } else {
                continue;
            };
            if alarm.advance_age_notice(stage) {
                claimed.push((alarm.clone(), stage));
            }
        }
        claimed
    }

    // --- maintenance ---

    pub async fn upsert_maintenance(&self, work: MaintenanceRecord) {
        debug!(maintenance_id = %work.id, "upserting maintenance");
        self.state
            .lock()
            .await
            .maintenances
            .insert(work.id.clone(), work);
    }

    pub async fn remove_maintenance(&self, id: &RecordId) -> Option<MaintenanceRecord> {
        self.state.lock().await.maintenances.remove(id)
    }

    pub async fn get_maintenance(&self, id: &RecordId) -> Option<MaintenanceRecord> {
        self.state.lock().await.maintenances.get(id).cloned()
    }

    /// Maintenance windows visible under `filter`, ordered by start.
    pub async fn list_maintenances(&self, filter: Visibility) -> Vec<MaintenanceRecord> {
        let state = self.state.lock().await;
        let mut works: Vec<_> = state
            .maintenances
            .values()
            .filter(|m| filter.admits(m.owner))
            .cloned()
            .collect();
        works.sort_by_key(|m| (m.start(), m.id.clone()));
        works
    }

    pub async fn user_active_maintenances(
        &self,
        user: UserId,
        auth: &dyn Authorizer,
    ) -> Vec<MaintenanceRecord> {
        self.list_maintenances(Visibility::for_user(user, auth)).await
    }

    /// Applies `f` to a copy of the window and commits it only if `f` succeeds.
    pub async fn update_maintenance<T>(
        &self,
        id: &RecordId,
        f: impl FnOnce(&mut MaintenanceRecord) -> Result<T, TocsinError>,
    ) -> Result<(T, MaintenanceRecord), TocsinError> {
        let mut state = self.state.lock().await;
        let current = state
            .maintenances
            .get(id)
            .ok_or_else(|| TocsinError::NotFound {
                kind: "maintenance",
                id: id.0.clone(),
            })?;
        let mut updated = current.clone();
        let out = f(&mut updated)?;
        state.maintenances.insert(id.clone(), updated.clone());
        Ok((out, updated))
    }

    // --- reminder sessions ---

    /// Remembers a pending reminder reply. Refused if the alarm is already gone.
    ///
    /// Each alarm has at most one pending reminder; a newer one replaces it.
    pub async fn record_reminder_session(&self, session: ReminderSession) -> bool {
        let mut state = self.state.lock().await;
        if !state.alarms.contains_key(&session.alarm_id) {
            debug!(alarm_id = %session.alarm_id, "alarm gone, not recording reminder session");
            return false;
        }
        state.reminders.insert(session.alarm_id.clone(), session);
        true
    }

    /// The pending reminder for one alarm.
    pub async fn reminder_for(&self, alarm_id: &RecordId) -> Option<ReminderSession> {
        self.state.lock().await.reminders.get(alarm_id).cloned()
    }

    /// Every pending reminder owned by `user`, ordered by alarm id.
    pub async fn reminders_of(&self, user: UserId) -> Vec<ReminderSession> {
        let state = self.state.lock().await;
        state
            .reminders
            .values()
            .filter(|s| s.user == user)
            .cloned()
            .collect()
    }

    /// Removes and returns the reminder a reply from `user` answers.
    ///
    /// A reply naming the pressed message must match that reminder's prompt.
    /// Reminders restored without a prompt, and replies without a message,
    /// are matched only when the user has exactly one candidate.
    pub async fn claim_reminder_reply(
        &self,
        user: UserId,
        pressed: Option<MessageRef>,
    ) -> Option<ReminderSession> {
        let mut state = self.state.lock().await;
        let exact = pressed.and_then(|pressed| {
            state
                .reminders
                .values()
                .find(|s| s.user == user && s.prompt == Some(pressed))
        });
        let alarm_id = match exact {
            Some(session) => session.alarm_id.clone(),
            None => {
                let mut candidates = state
                    .reminders
                    .values()
                    .filter(|s| s.user == user && (pressed.is_none() || s.prompt.is_none()));
                match (candidates.next(), candidates.next()) {
                    (Some(only), None) => only.alarm_id.clone(),
                    _ => return None,
                }
            }
        };
        state.reminders.remove(&alarm_id)
    }

    /// Number of live alarms and maintenance windows.
    pub async fn counts(&self) -> (usize, usize) {
        let state = self.state.lock().await;
        (state.alarms.len(), state.maintenances.len())
    }

    // --- persistence ---

    /// Writes the whole state to the snapshot file atomically.
    ///
    /// The snapshot is built under the store lock; serialization and I/O run
    /// after it is released.
    pub async fn save(&self) -> Result<(), TocsinError> {
        let _ordered = self.save_lock.lock().await;
        let snapshot = self.state.lock().await.to_snapshot();
        let bytes = serde_json::to_vec_pretty(&snapshot).map_err(TocsinError::storage)?;

        write_atomic(&self.path, &bytes).await.map_err(|e| {
            error!(path = %self.path.display(), error = %e, "failed to save state");
            TocsinError::storage(e)
        })?;

        info!(
            alarms = snapshot.active_alarms.len(),
            maintenances = snapshot.active_maintenances.len(),
            sessions = snapshot.user_states.len(),
            "state saved"
        );
        Ok(())
    }

    /// Saves, logging instead of returning the error. Memory stays authoritative.
    pub async fn save_or_log(&self) {
        if let Err(e) = self.save().await {
            warn!(error = %e, "state not persisted, continuing with in-memory state");
        }
    }

    /// Replaces the live state with the snapshot file's contents.
    ///
    /// Never fails: a missing file or an undecodable document leaves the store
    /// empty, and bad individual entries are skipped.
    pub async fn load(&self) -> LoadReport {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no state file found, starting empty");
                *self.state.lock().await = LiveState::default();
                return LoadReport::empty(LoadOutcome::Missing);
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "failed to read state file, starting empty");
                *self.state.lock().await = LiveState::default();
                return LoadReport::empty(LoadOutcome::Corrupt);
            }
        };

        let decoded = match snapshot::decode(&raw) {
            Ok(decoded) => decoded,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "state file is not valid JSON, starting empty");
                *self.state.lock().await = LiveState::default();
                return LoadReport::empty(LoadOutcome::Corrupt);
            }
        };

        let report = LoadReport {
            outcome: LoadOutcome::Loaded,
            alarms: decoded.alarms.len(),
            maintenances: decoded.maintenances.len(),
            reminders: decoded.reminders.len(),
            dropped: decoded.dropped,
        };

        let fresh = LiveState {
            alarms: decoded.alarms.into_iter().map(|a| (a.id.clone(), a)).collect(),
            maintenances: decoded
                .maintenances
                .into_iter()
                .map(|m| (m.id.clone(), m))
                .collect(),
            reminders: decoded
                .reminders
                .into_iter()
                .map(|s| (s.alarm_id.clone(), s))
                .collect(),
        };
        *self.state.lock().await = fresh;

        info!(
            alarms = report.alarms,
            maintenances = report.maintenances,
            sessions = report.reminders,
            dropped = report.dropped,
            "state loaded"
        );
        report
    }

    /// Clears everything and persists an empty snapshot.
    pub async fn reset(&self) -> Result<(), TocsinError> {
        *self.state.lock().await = LiveState::default();
        self.save().await
    }
}

/// Writes `bytes` to a sibling temp file, syncs it, then renames it over `path`.
async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(&tmp, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tocsin_core::{AlarmDetails, MaintenanceDetails, StaticRoles};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn alarm(id: &str, owner: i64) -> AlarmRecord {
        AlarmRecord::new(
            id.into(),
            AlarmDetails {
                issue: format!("issue {id}"),
                description: "desc".into(),
                service: "Email".into(),
                level: "Full service outage".into(),
            },
            UserId(owner),
            at(11, 0),
            at(10, 0),
        )
        .unwrap()
    }

    fn work(id: &str, owner: i64) -> MaintenanceRecord {
        MaintenanceRecord::new(
            id.into(),
            MaintenanceDetails {
                title: "Upgrade".into(),
                description: "kernel".into(),
                unavailable_services: "VPN".into(),
            },
            UserId(owner),
            at(12, 0),
            at(14, 0),
            at(10, 0),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn owner_filter_and_superadmin_view() {
        let store = StateStore::new("unused.json");
        store.upsert_alarm(alarm("A", 1)).await;
        store.upsert_alarm(alarm("B", 2)).await;
        store.upsert_maintenance(work("M", 2)).await;

        let roles = StaticRoles::new([1, 2], [9]);
        assert_eq!(store.user_active_alarms(UserId(1), &roles).await.len(), 1);
        assert_eq!(store.user_active_alarms(UserId(9), &roles).await.len(), 2);
        assert!(store.user_active_maintenances(UserId(1), &roles).await.is_empty());
        assert_eq!(store.user_active_maintenances(UserId(9), &roles).await.len(), 1);
    }

    #[tokio::test]
    async fn failed_update_leaves_record_untouched() {
        let store = StateStore::new("unused.json");
        store.upsert_maintenance(work("M", 1)).await;
        let res = store
            .update_maintenance(&"M".into(), |m| m.reschedule_end(at(11, 0)))
            .await;
        assert!(res.is_err());
        assert_eq!(store.get_maintenance(&"M".into()).await.unwrap().end(), at(14, 0));

        let missing = store.update_alarm(&"nope".into(), |_| Ok(())).await;
        assert!(matches!(missing, Err(TocsinError::NotFound { kind: "alarm", .. })));
    }

    #[tokio::test]
    async fn reminders_are_claimed_once() {
        let store = StateStore::new("unused.json");
        store.upsert_alarm(alarm("A", 1)).await;
        let lead = Duration::minutes(5);
        assert!(store.claim_due_reminders(at(10, 54), lead).await.is_empty());
        assert_eq!(store.claim_due_reminders(at(10, 56), lead).await.len(), 1);
        assert!(store.claim_due_reminders(at(10, 56), lead).await.is_empty());
        assert!(store.claim_due_reminders(at(10, 57), lead).await.is_empty());
    }

    #[tokio::test]
    async fn age_notices_fire_once_per_stage() {
        let store = StateStore::new("unused.json");
        store.upsert_alarm(alarm("A", 1)).await;
        let (d24, d48) = (Duration::hours(24), Duration::hours(48));
        let day_later = at(10, 0) + Duration::hours(25);
        let claimed = store.claim_age_notices(day_later, d24, d48).await;
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].1, AgeNotice::ExtendRequested);
        assert!(store.claim_age_notices(day_later, d24, d48).await.is_empty());

        let two_days_later = at(10, 0) + Duration::hours(49);
        let claimed = store.claim_age_notices(two_days_later, d24, d48).await;
        assert_eq!(claimed[0].1, AgeNotice::ResolveRequested);
        assert!(store.claim_age_notices(two_days_later, d24, d48).await.is_empty());
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn corrupt_snapshot_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json at all").unwrap();
        let report = StateStore::new(&path).load().await;
        assert_eq!(report.outcome, LoadOutcome::Corrupt);
        assert!(logs_contain("state file is not valid JSON"));
    }

    #[tokio::test]
    async fn removing_alarm_drops_its_reminder_session() {
        let store = StateStore::new("unused.json");
        store.upsert_alarm(alarm("A", 1)).await;
        let session = ReminderSession {
            user: UserId(1),
            alarm_id: "A".into(),
            chat: ChatId(1),
            prompt: None,
        };
        assert!(store.record_reminder_session(session.clone()).await);
        store.remove_alarm(&"A".into()).await;
        assert!(store.reminder_for(&"A".into()).await.is_none());
        assert!(!store.record_reminder_session(session).await);
    }

    fn pending(user: i64, alarm_id: &str, message_id: Option<i32>) -> ReminderSession {
        ReminderSession {
            user: UserId(user),
            alarm_id: alarm_id.into(),
            chat: ChatId(user),
            prompt: message_id.map(|message_id| MessageRef {
                chat: ChatId(user),
                message_id,
            }),
        }
    }

    #[tokio::test]
    async fn one_owner_keeps_a_reminder_per_alarm() {
        let store = StateStore::new("unused.json");
        store.upsert_alarm(alarm("A", 1)).await;
        store.upsert_alarm(alarm("B", 1)).await;
        assert!(store.record_reminder_session(pending(1, "A", Some(10))).await);
        assert!(store.record_reminder_session(pending(1, "B", Some(11))).await);
        assert_eq!(store.reminders_of(UserId(1)).await.len(), 2);

        let pressed = |message_id| Some(MessageRef { chat: ChatId(1), message_id });
        let claimed = store.claim_reminder_reply(UserId(1), pressed(10)).await.unwrap();
        assert_eq!(claimed.alarm_id.as_str(), "A");
        assert!(store.claim_reminder_reply(UserId(1), pressed(10)).await.is_none());
        assert!(store.reminder_for(&"B".into()).await.is_some());

        // Another user cannot answer someone else's reminder.
        assert!(store.claim_reminder_reply(UserId(2), pressed(11)).await.is_none());
    }

    #[tokio::test]
    async fn reply_without_message_needs_a_single_candidate() {
        let store = StateStore::new("unused.json");
        store.upsert_alarm(alarm("A", 1)).await;
        store.upsert_alarm(alarm("B", 1)).await;
        store.record_reminder_session(pending(1, "A", None)).await;
        store.record_reminder_session(pending(1, "B", Some(11))).await;
        assert!(store.claim_reminder_reply(UserId(1), None).await.is_none());

        store.remove_alarm(&"B".into()).await;
        let claimed = store.claim_reminder_reply(UserId(1), None).await.unwrap();
        assert_eq!(claimed.alarm_id.as_str(), "A");
    }

    #[tokio::test]
    async fn newer_reminder_for_the_same_alarm_replaces_the_old_prompt() {
        let store = StateStore::new("unused.json");
        store.upsert_alarm(alarm("A", 1)).await;
        store.record_reminder_session(pending(1, "A", Some(10))).await;
        store.record_reminder_session(pending(1, "A", Some(20))).await;

        let old = Some(MessageRef { chat: ChatId(1), message_id: 10 });
        assert!(store.claim_reminder_reply(UserId(1), old).await.is_none());
        assert_eq!(store.reminders_of(UserId(1)).await.len(), 1);
    }
}
