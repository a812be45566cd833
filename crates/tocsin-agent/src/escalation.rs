// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background escalation: pre-deadline reminders and age notices.
//!
//! Each scan claims due alarms in the store first and only then talks to the
//! chat transport, so a reminder is sent at most once even if delivery fails.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tocsin_config::model::EscalationConfig;
use tocsin_core::{AgeNotice, ChatId, Clock};
use tocsin_store::{ReminderSession, StateStore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dispatch::NotificationDispatcher;

/// What one scan did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub reminders_sent: usize,
    pub reminders_failed: usize,
    pub notices_sent: usize,
}

pub struct EscalationScheduler {
    store: Arc<StateStore>,
    dispatcher: Arc<NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    config: EscalationConfig,
}

impl EscalationScheduler {
    pub fn new(
        store: Arc<StateStore>,
        dispatcher: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
        config: EscalationConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            clock,
            config,
        }
    }

    fn lead(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.config.reminder_lead_secs as i64)
    }

    fn stage_hours(&self, notice: AgeNotice) -> u64 {
        match notice {
            AgeNotice::ResolveRequested => self.config.resolve_after_hours,
            _ => self.config.extend_after_hours,
        }
    }

    /// Runs one pass at `now`. Per-alarm failures are logged and skipped.
    pub async fn scan_once(&self, now: NaiveDateTime) -> ScanReport {
        let mut report = ScanReport::default();

        let due = self.store.claim_due_reminders(now, self.lead()).await;
        let claimed_any = !due.is_empty();
        for alarm in due {
            let target = ChatId(alarm.owner.0);
            match self.dispatcher.announce_reminder(&alarm, target).await {
                Ok(prompt) => {
                    report.reminders_sent += 1;
                    let recorded = self
                        .store
                        .record_reminder_session(ReminderSession {
                            user: alarm.owner,
                            alarm_id: alarm.id.clone(),
                            chat: target,
                            prompt: Some(prompt),
                        })
                        .await;
                    if !recorded {
                        debug!(alarm_id = %alarm.id, "alarm closed while reminder was in flight");
                    }
                    info!(alarm_id = %alarm.id, user_id = %alarm.owner, "reminder sent");
                }
                Err(e) => {
                    report.reminders_failed += 1;
                    error!(alarm_id = %alarm.id, user_id = %alarm.owner, error = %e, "failed to send reminder");
                }
            }
        }

        let mut notices = Vec::new();
        if self.config.age_notices {
            notices = self
                .store
                .claim_age_notices(
                    now,
                    chrono::Duration::hours(self.config.extend_after_hours as i64),
                    chrono::Duration::hours(self.config.resolve_after_hours as i64),
                )
                .await;
        }
        let noticed_any = !notices.is_empty();
        for (alarm, notice) in notices {
            let hours = self.stage_hours(notice);
            match self.dispatcher.announce_age_notice(&alarm, notice, hours).await {
                Ok(()) => {
                    report.notices_sent += 1;
                    info!(alarm_id = %alarm.id, ?notice, "age notice sent");
                }
                Err(e) => {
                    warn!(alarm_id = %alarm.id, ?notice, error = %e, "failed to send age notice");
                }
            }
        }

        if claimed_any || noticed_any {
            self.store.save_or_log().await;
        }
        report
    }

    /// Scans on a fixed interval until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let period = Duration::from_secs(self.config.poll_interval_secs.max(1));
        let mut interval = tokio::time::interval(period);
        // Skip the immediate first tick.
        interval.tick().await;
        info!(interval_secs = period.as_secs(), "escalation scheduler started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let report = self.scan_once(self.clock.now()).await;
                    if report != ScanReport::default() {
                        debug!(?report, "escalation scan finished");
                    }
                }
                _ = cancel.cancelled() => {
                    info!("escalation scheduler shutting down");
                    break;
                }
            }
        }
    }
}
