// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Committing wizard submissions and applying manage actions.

use chrono::NaiveDateTime;
use tocsin_core::types::NewIssue;
use tocsin_core::{
    AlarmDetails, AlarmRecord, ChatId, MaintenanceDetails, MaintenanceRecord, MessageRef, RecordId,
    TocsinError, TrackerError, UserId,
};
use tracing::{debug, error, info, warn};

use crate::callbacks;
use crate::dispatch::RecordRef;
use crate::format::escape_html;
use crate::manage::{Action, ManageFlow};
use crate::render;
use crate::session::Session;
use crate::timeparse::DISPLAY_FORMAT;
use crate::workflow::Submission;
use crate::{ALREADY_CLOSED, BotLoop, NO_RIGHTS, OUTDATED};

const ANNOUNCE_FAILED: &str =
    "⚠️ Saved, but the channel announcement could not be delivered.";

/// Short local token used when the tracker cannot issue a key.
fn short_token() -> String {
    uuid::Uuid::new_v4().simple().to_string().chars().take(4).collect()
}

impl BotLoop {
    pub(crate) async fn commit(
        &mut self,
        user: UserId,
        chat: ChatId,
        submission: Submission,
        now: NaiveDateTime,
    ) -> Result<(), TocsinError> {
        match submission {
            Submission::Alarm { details, fix_by } => {
                self.commit_alarm(user, chat, details, fix_by, now).await
            }
            Submission::Maintenance {
                details,
                start,
                end,
            } => {
                self.commit_maintenance(user, chat, details, start, end, now)
                    .await
            }
            Submission::Broadcast { text } => {
                self.dispatcher.broadcast(&text).await?;
                info!(user_id = %user, "broadcast posted");
                self.reply_text(chat, "✅ Message sent.").await
            }
        }
    }

    /// Picks a local id that no live alarm uses.
    async fn fallback_alarm_id(&self) -> RecordId {
        loop {
            let id = RecordId::from(short_token());
            if self.store.get_alarm(&id).await.is_none() {
                return id;
            }
        }
    }

    async fn commit_alarm(
        &mut self,
        user: UserId,
        chat: ChatId,
        details: AlarmDetails,
        fix_by: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<(), TocsinError> {
        let issue = NewIssue {
            summary: details.issue.clone(),
            description: details.description.clone(),
            level: Some(details.level.clone()),
            service: Some(details.service.clone()),
            influence: None,
            started_at: Some(now),
        };

        let created = tokio::time::timeout(self.ticket_wait, self.tracker.create_issue(&issue))
            .await
            .unwrap_or(Err(TrackerError::Timeout));
        let (id, ticket_url) = match created {
            Ok(created) => {
                info!(key = %created.key, "tracker ticket created");
                (RecordId::from(created.key), Some(created.url))
            }
            Err(TrackerError::Disabled) => {
                let id = self.fallback_alarm_id().await;
                info!(alarm_id = %id, "tracker disabled, using local alarm id");
                (id, None)
            }
            Err(e) => {
                let id = self.fallback_alarm_id().await;
                warn!(alarm_id = %id, error = %e, "ticket creation failed, falling back to local alarm id");
                (id, None)
            }
        };

        let mut alarm = AlarmRecord::new(id, details, user, fix_by, now)?;
        alarm.ticket_url = ticket_url;
        self.store.upsert_alarm(alarm.clone()).await;
        self.store.save_or_log().await;
        info!(alarm_id = %alarm.id, user_id = %user, "alarm registered");

        let mut announced = true;
        if let Err(e) = self.dispatcher.announce_created(RecordRef::Alarm(&alarm)).await {
            error!(alarm_id = %alarm.id, error = %e, "failed to announce alarm");
            announced = false;
        }

        match self.dispatcher.open_discussion(&alarm).await {
            Ok(Some(thread)) => {
                let stored = self
                    .store
                    .update_alarm(&alarm.id, |a| {
                        a.thread = Some(thread);
                        Ok(())
                    })
                    .await;
                match stored {
                    Ok(_) => self.store.save_or_log().await,
                    Err(e) => debug!(alarm_id = %alarm.id, error = %e, "alarm closed before thread was stored"),
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(alarm_id = %alarm.id, error = %e, "failed to open discussion thread");
            }
        }

        let mut text = format!(
            "✅ Incident registered! ID: <code>{}</code>",
            escape_html(alarm.id.as_str())
        );
        match &alarm.ticket_url {
            Some(url) => text.push_str(&format!("\n🔗 {}", escape_html(url))),
            None => text.push_str("\nℹ️ No tracker ticket was created."),
        }
        if !announced {
            text.push_str(&format!("\n{ANNOUNCE_FAILED}"));
        }
        self.reply_text(chat, &text).await
    }

    async fn commit_maintenance(
        &mut self,
        user: UserId,
        chat: ChatId,
        details: MaintenanceDetails,
        start: NaiveDateTime,
        end: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<(), TocsinError> {
        let id = loop {
            let id = RecordId::from(short_token());
            if self.store.get_maintenance(&id).await.is_none() {
                break id;
            }
        };
        let work = MaintenanceRecord::new(id, details, user, start, end, now)?;
        self.store.upsert_maintenance(work.clone()).await;
        self.store.save_or_log().await;
        info!(maintenance_id = %work.id, user_id = %user, "maintenance registered");

        let mut text = format!(
            "✅ Maintenance registered! ID: <code>{}</code>",
            escape_html(work.id.as_str())
        );
        if let Err(e) = self
            .dispatcher
            .announce_created(RecordRef::Maintenance(&work))
            .await
        {
            error!(maintenance_id = %work.id, error = %e, "failed to announce maintenance");
            text.push_str(&format!("\n{ANNOUNCE_FAILED}"));
        }
        self.reply_text(chat, &text).await
    }

    /// Best-effort note on the alarm's tracker ticket.
    async fn note_on_ticket(&self, alarm: &AlarmRecord, body: &str) {
        if alarm.ticket_url.is_none() {
            return;
        }
        if let Err(e) = self.tracker.add_comment(alarm.id.as_str(), body).await {
            warn!(alarm_id = %alarm.id, error = %e, "failed to comment on tracker ticket");
        }
    }

    /// Best-effort close of the alarm's ticket with the configured transition.
    async fn close_ticket(&self, alarm: &AlarmRecord) {
        let Some(transition) = self.resolve_transition.as_deref() else {
            return;
        };
        if alarm.ticket_url.is_none() {
            return;
        }
        match self.tracker.transition(alarm.id.as_str(), transition).await {
            Ok(()) => debug!(alarm_id = %alarm.id, transition, "tracker ticket closed"),
            Err(e) => warn!(alarm_id = %alarm.id, error = %e, "failed to close tracker ticket"),
        }
    }

    /// Applies a manage action. Returns whether the flow is finished.
    pub(crate) async fn apply(
        &mut self,
        user: UserId,
        chat: ChatId,
        action: Action,
        now: NaiveDateTime,
    ) -> Result<bool, TocsinError> {
        match action {
            Action::StopAlarm(id) => {
                let Some(alarm) = self.store.get_alarm(&id).await else {
                    self.reply_text(chat, ALREADY_CLOSED).await?;
                    return Ok(true);
                };
                if !self.can_manage(user, alarm.owner) {
                    self.reply_text(chat, NO_RIGHTS).await?;
                    return Ok(true);
                }
                let Some(alarm) = self.store.remove_alarm(&id).await else {
                    self.reply_text(chat, ALREADY_CLOSED).await?;
                    return Ok(true);
                };
                self.store.save_or_log().await;
                info!(alarm_id = %id, user_id = %user, "alarm resolved");
                if let Err(e) = self.dispatcher.announce_resolved(RecordRef::Alarm(&alarm)).await {
                    error!(alarm_id = %id, error = %e, "failed to announce resolution");
                }
                let note = format!("Resolved at {}", now.format(DISPLAY_FORMAT));
                self.note_on_ticket(&alarm, &note).await;
                self.close_ticket(&alarm).await;
                self.reply_text(
                    chat,
                    &format!("✅ Incident <code>{}</code> closed.", escape_html(id.as_str())),
                )
                .await?;
            }
            Action::ExtendAlarm(id, delta) => {
                let Some(current) = self.store.get_alarm(&id).await else {
                    self.reply_text(chat, ALREADY_CLOSED).await?;
                    return Ok(true);
                };
                if !self.can_manage(user, current.owner) {
                    self.reply_text(chat, NO_RIGHTS).await?;
                    return Ok(true);
                }
                let alarm = match self.store.update_alarm(&id, |a| a.extend_by(delta)).await {
                    Ok(((), alarm)) => alarm,
                    Err(TocsinError::NotFound { .. }) => {
                        self.reply_text(chat, ALREADY_CLOSED).await?;
                        return Ok(true);
                    }
                    Err(e) => return Err(e),
                };
                self.store.save_or_log().await;
                info!(alarm_id = %id, fix_by = %alarm.fix_by(), "alarm extended");
                if let Err(e) = self.dispatcher.announce_extended(RecordRef::Alarm(&alarm)).await {
                    error!(alarm_id = %id, error = %e, "failed to announce extension");
                }
                let until = alarm.fix_by().format(DISPLAY_FORMAT).to_string();
                self.note_on_ticket(&alarm, &format!("Fix time moved to {until}"))
                    .await;
                self.reply_text(
                    chat,
                    &format!(
                        "🕒 Incident <code>{}</code> extended until {until}.",
                        escape_html(id.as_str())
                    ),
                )
                .await?;
            }
            Action::StopMaintenance(id) => {
                let Some(work) = self.store.get_maintenance(&id).await else {
                    self.reply_text(chat, ALREADY_CLOSED).await?;
                    return Ok(true);
                };
                if !self.can_manage(user, work.owner) {
                    self.reply_text(chat, NO_RIGHTS).await?;
                    return Ok(true);
                }
                let Some(work) = self.store.remove_maintenance(&id).await else {
                    self.reply_text(chat, ALREADY_CLOSED).await?;
                    return Ok(true);
                };
                self.store.save_or_log().await;
                info!(maintenance_id = %id, user_id = %user, "maintenance finished");
                if let Err(e) = self
                    .dispatcher
                    .announce_resolved(RecordRef::Maintenance(&work))
                    .await
                {
                    error!(maintenance_id = %id, error = %e, "failed to announce maintenance end");
                }
                self.reply_text(
                    chat,
                    &format!("✅ Maintenance <code>{}</code> finished.", escape_html(id.as_str())),
                )
                .await?;
            }
            Action::RescheduleMaintenance(id, end) => {
                let Some(current) = self.store.get_maintenance(&id).await else {
                    self.reply_text(chat, ALREADY_CLOSED).await?;
                    return Ok(true);
                };
                if !self.can_manage(user, current.owner) {
                    self.reply_text(chat, NO_RIGHTS).await?;
                    return Ok(true);
                }
                let work = match self
                    .store
                    .update_maintenance(&id, |m| m.reschedule_end(end))
                    .await
                {
                    Ok(((), work)) => work,
                    Err(TocsinError::Validation(reason)) => {
                        debug!(maintenance_id = %id, %reason, "new end time rejected");
                        let mut rendered = render::new_end_time(&current);
                        rendered.text =
                            format!("⚠️ The end must be after the start.\n\n{}", rendered.text);
                        self.reply(chat, rendered).await?;
                        return Ok(false);
                    }
                    Err(TocsinError::NotFound { .. }) => {
                        self.reply_text(chat, ALREADY_CLOSED).await?;
                        return Ok(true);
                    }
                    Err(e) => return Err(e),
                };
                self.store.save_or_log().await;
                info!(maintenance_id = %id, end = %work.end(), "maintenance rescheduled");
                if let Err(e) = self
                    .dispatcher
                    .announce_extended(RecordRef::Maintenance(&work))
                    .await
                {
                    error!(maintenance_id = %id, error = %e, "failed to announce new end time");
                }
                self.reply_text(
                    chat,
                    &format!(
                        "🕒 Maintenance <code>{}</code> now ends {}.",
                        escape_html(id.as_str()),
                        work.end().format(DISPLAY_FORMAT)
                    ),
                )
                .await?;
            }
        }
        Ok(true)
    }

    /// Handles the "extend" and "stop" buttons under a reminder.
    pub(crate) async fn on_reminder_reply(
        &mut self,
        user: UserId,
        chat: ChatId,
        data: &str,
        pressed: Option<MessageRef>,
    ) -> Result<(), TocsinError> {
        let Some(pending) = self.store.claim_reminder_reply(user, pressed).await else {
            debug!(user_id = %user, ?pressed, "reply to a superseded or unknown reminder");
            return self.reply_text(chat, OUTDATED).await;
        };

        let Some(alarm) = self.store.get_alarm(&pending.alarm_id).await else {
            self.store.save_or_log().await;
            return self.reply_text(chat, ALREADY_CLOSED).await;
        };

        match data {
            callbacks::REMINDER_STOP => {
                let now = self.clock.now();
                self.apply(user, chat, Action::StopAlarm(alarm.id), now)
                    .await
                    .map(|_| ())
            }
            _ => {
                self.store.save_or_log().await;
                self.sessions
                    .begin(user, Session::Manage(ManageFlow::extending(alarm.id)));
                self.reply(chat, render::extension_options()).await.map(|_| ())
            }
        }
    }
}
