// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification dispatcher: turns records into chat messages.
//!
//! Every call reports failure to its caller, which logs it. Nothing here
//! retries; one attempt per notification.

use std::sync::Arc;
use std::time::Duration;

use tocsin_config::TocsinConfig;
use tocsin_core::types::OutboundMessage;
use tocsin_core::{
    AgeNotice, AlarmRecord, ChatId, ChatTransport, MaintenanceRecord, MessageRef, ThreadId,
    TocsinError,
};
use tracing::{debug, warn};

use crate::format;
use crate::render;

/// A live record of either kind.
#[derive(Debug, Clone, Copy)]
pub enum RecordRef<'a> {
    Alarm(&'a AlarmRecord),
    Maintenance(&'a MaintenanceRecord),
}

/// Where and how notifications are delivered.
#[derive(Debug, Clone)]
pub struct Channels {
    pub alarm: ChatId,
    pub discussion: Option<ChatId>,
    pub conference_link: Option<String>,
    pub send_timeout: Duration,
}

impl Channels {
    pub fn from_config(config: &TocsinConfig) -> Result<Self, TocsinError> {
        let alarm = config
            .telegram
            .alarm_channel_id
            .ok_or_else(|| TocsinError::Config("telegram.alarm_channel_id is required".into()))?;
        Ok(Self {
            alarm: ChatId(alarm),
            discussion: config.telegram.discussion_channel_id.map(ChatId),
            conference_link: config.catalog.conference_link.clone(),
            send_timeout: Duration::from_secs(config.telegram.send_timeout_secs),
        })
    }
}

pub struct NotificationDispatcher {
    chat: Arc<dyn ChatTransport>,
    channels: Channels,
}

impl NotificationDispatcher {
    pub fn new(chat: Arc<dyn ChatTransport>, channels: Channels) -> Self {
        Self { chat, channels }
    }

    pub fn channels(&self) -> &Channels {
        &self.channels
    }

    /// Sends one message, bounded by the configured timeout.
    pub async fn send(&self, msg: OutboundMessage) -> Result<MessageRef, TocsinError> {
        let duration = self.channels.send_timeout;
        tokio::time::timeout(duration, self.chat.send(msg))
            .await
            .map_err(|_| TocsinError::Timeout { duration })?
    }

    /// Posts into the alarm's discussion thread, if it has one.
    async fn post_to_thread(&self, alarm: &AlarmRecord, text: String) {
        let (Some(discussion), Some(thread)) = (self.channels.discussion, alarm.thread) else {
            return;
        };
        let msg = OutboundMessage::new(discussion, text).in_thread(thread);
        if let Err(e) = self.send(msg).await {
            warn!(alarm_id = %alarm.id, error = %e, "failed to post into discussion thread");
        }
    }

    /// Public announcement of a new record in the alarm channel.
    pub async fn announce_created(&self, record: RecordRef<'_>) -> Result<MessageRef, TocsinError> {
        let text = match record {
            RecordRef::Alarm(alarm) => format::alarm_created(alarm),
            RecordRef::Maintenance(work) => format::maintenance_created(work),
        };
        let sent = self.send(OutboundMessage::new(self.channels.alarm, text)).await?;
        debug!(message_id = sent.message_id, "creation announced");
        Ok(sent)
    }

    /// Opens a discussion thread for a new alarm and posts its full card there.
    ///
    /// Returns `None` when no discussion channel is configured.
    pub async fn open_discussion(
        &self,
        alarm: &AlarmRecord,
    ) -> Result<Option<ThreadId>, TocsinError> {
        let Some(discussion) = self.channels.discussion else {
            return Ok(None);
        };
        let title = format::thread_title(alarm);
        let duration = self.channels.send_timeout;
        let thread = tokio::time::timeout(
            duration,
            self.chat.create_discussion_thread(discussion, &title),
        )
        .await
        .map_err(|_| TocsinError::Timeout { duration })??;

        let card = format::alarm_discussion(alarm, self.channels.conference_link.as_deref());
        self.send(OutboundMessage::new(discussion, card).in_thread(thread))
            .await?;
        debug!(alarm_id = %alarm.id, thread = thread.0, "discussion thread opened");
        Ok(Some(thread))
    }

    pub async fn announce_extended(&self, record: RecordRef<'_>) -> Result<(), TocsinError> {
        let text = match record {
            RecordRef::Alarm(alarm) => {
                let text = format::alarm_extended(alarm);
                self.post_to_thread(alarm, text.clone()).await;
                text
            }
            RecordRef::Maintenance(work) => format::maintenance_extended(work),
        };
        self.send(OutboundMessage::new(self.channels.alarm, text))
            .await
            .map(|_| ())
    }

    pub async fn announce_resolved(&self, record: RecordRef<'_>) -> Result<(), TocsinError> {
        let text = match record {
            RecordRef::Alarm(alarm) => {
                let text = format::alarm_resolved(alarm);
                self.post_to_thread(alarm, text.clone()).await;
                text
            }
            RecordRef::Maintenance(work) => format::maintenance_resolved(work),
        };
        self.send(OutboundMessage::new(self.channels.alarm, text))
            .await
            .map(|_| ())
    }

    /// Asks `target` whether to extend or stop the alarm.
    pub async fn announce_reminder(
        &self,
        alarm: &AlarmRecord,
        target: ChatId,
    ) -> Result<MessageRef, TocsinError> {
        let msg = OutboundMessage::new(target, format::reminder(alarm))
            .with_keyboard(render::reminder_keyboard());
        self.send(msg).await
    }

    /// Posts an age notice into the alarm's thread, or the alarm channel without one.
    pub async fn announce_age_notice(
        &self,
        alarm: &AlarmRecord,
        notice: AgeNotice,
        hours: u64,
    ) -> Result<(), TocsinError> {
        let text = format::age_notice(alarm, notice, hours);
        let msg = match (self.channels.discussion, alarm.thread) {
            (Some(discussion), Some(thread)) => OutboundMessage::new(discussion, text).in_thread(thread),
            _ => OutboundMessage::new(self.channels.alarm, text),
        };
        self.send(msg).await.map(|_| ())
    }

    /// Posts an administrator message to the alarm channel.
    pub async fn broadcast(&self, text: &str) -> Result<MessageRef, TocsinError> {
        self.send(OutboundMessage::new(self.channels.alarm, format::broadcast(text)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_require_alarm_channel() {
        let mut config = TocsinConfig::default();
        assert!(matches!(
            Channels::from_config(&config),
            Err(TocsinError::Config(_))
        ));
        config.telegram.alarm_channel_id = Some(-100);
        config.telegram.discussion_channel_id = Some(-200);
        let channels = Channels::from_config(&config).unwrap();
        assert_eq!(channels.alarm, ChatId(-100));
        assert_eq!(channels.discussion, Some(ChatId(-200)));
        assert_eq!(channels.send_timeout, Duration::from_secs(30));
    }
}
