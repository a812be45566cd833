// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete bot with mock adapters, a manual
//! clock and a snapshot file in a temp directory. Events are fed straight
//! into [`BotLoop::handle_event`]; escalation scans run on demand.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tocsin_agent::{BotLoop, EscalationScheduler, ScanReport};
use tocsin_config::TocsinConfig;
use tocsin_core::types::{ChatEvent, ChatEventKind, OutboundMessage};
use tocsin_core::{ChatId, Clock, MessageRef, TocsinError, TrackerError, UserId};
use tocsin_store::StateStore;

use crate::clock::ManualClock;
use crate::mock_chat::MockChat;
use crate::mock_tracker::MockTracker;

pub const ALARM_CHANNEL: ChatId = ChatId(-1001);
pub const DISCUSSION_CHANNEL: ChatId = ChatId(-1002);
/// May create and manage their own records.
pub const ADMIN: UserId = UserId(100);
/// A second admin, for ownership checks.
pub const OTHER_ADMIN: UserId = UserId(101);
/// Sees and manages everything.
pub const SUPERADMIN: UserId = UserId(200);
/// No privileges at all.
pub const OUTSIDER: UserId = UserId(300);

/// Private chat with `user`; replies land here.
pub fn dm(user: UserId) -> ChatId {
    ChatId(user.0)
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    now: Option<NaiveDateTime>,
    tracker_failure: Option<TrackerError>,
    discussion: bool,
    age_notices: bool,
    resolve_transition: Option<String>,
    ticket_wait_secs: Option<u64>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            now: None,
            tracker_failure: None,
            discussion: true,
            age_notices: true,
            resolve_transition: None,
            ticket_wait_secs: None,
        }
    }

    /// Start the manual clock at `now` (default 2024-01-01 10:00).
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    /// Make every tracker call fail with `error`.
    pub fn with_tracker_failure(mut self, error: TrackerError) -> Self {
        self.tracker_failure = Some(error);
        self
    }

    /// Leave the discussion channel unconfigured.
    pub fn without_discussion(mut self) -> Self {
        self.discussion = false;
        self
    }

    /// Turn off 24h/48h age notices.
    pub fn without_age_notices(mut self) -> Self {
        self.age_notices = false;
        self
    }

    /// Close tickets with `transition` when their alarm is stopped.
    pub fn with_resolve_transition(mut self, transition: &str) -> Self {
        self.resolve_transition = Some(transition.to_string());
        self
    }

    /// Bound how long a new alarm waits for its ticket.
    pub fn with_ticket_wait_secs(mut self, secs: u64) -> Self {
        self.ticket_wait_secs = Some(secs);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, TocsinError> {
        let temp_dir = tempfile::TempDir::new().map_err(TocsinError::storage)?;
        let state_path = temp_dir.path().join("state.json");

        let mut config = TocsinConfig::default();
        config.storage.state_path = state_path.to_string_lossy().to_string();
        config.telegram.alarm_channel_id = Some(ALARM_CHANNEL.0);
        config.telegram.discussion_channel_id = self.discussion.then_some(DISCUSSION_CHANNEL.0);
        config.telegram.admin_ids = vec![ADMIN.0, OTHER_ADMIN.0];
        config.telegram.superadmin_ids = vec![SUPERADMIN.0];
        config.catalog.conference_link = Some("https://meet.test/room".into());
        config.escalation.age_notices = self.age_notices;
        config.tracker.resolve_transition = self.resolve_transition;
        if let Some(secs) = self.ticket_wait_secs {
            config.tracker.create_wait_secs = secs;
        }

        let clock = Arc::new(match self.now {
            Some(now) => ManualClock::new(now),
            None => ManualClock::at(2024, 1, 1, 10, 0),
        });
        let chat = Arc::new(MockChat::new());
        let tracker = Arc::new(match self.tracker_failure {
            Some(error) => MockTracker::failing(error),
            None => MockTracker::new(),
        });
        let store = Arc::new(StateStore::new(state_path.clone()));

        let bot = BotLoop::new(
            chat.clone(),
            store.clone(),
            tracker.clone(),
            Arc::new(config.roles()),
            clock.clone(),
            &config,
        )?;
        let scheduler = EscalationScheduler::new(
            store.clone(),
            bot.dispatcher(),
            clock.clone(),
            config.escalation.clone(),
        );

        Ok(TestHarness {
            chat,
            tracker,
            clock,
            store,
            bot,
            scheduler,
            config,
            state_path,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    /// The mock chat transport.
    pub chat: Arc<MockChat>,
    /// The mock issue tracker.
    pub tracker: Arc<MockTracker>,
    /// The clock shared by the bot and the scheduler.
    pub clock: Arc<ManualClock>,
    /// State store persisting into the temp directory.
    pub store: Arc<StateStore>,
    /// The bot under test.
    pub bot: BotLoop,
    /// Escalation scheduler sharing the bot's dispatcher.
    pub scheduler: EscalationScheduler,
    /// Tocsin configuration.
    pub config: TocsinConfig,
    /// Snapshot file location.
    pub state_path: PathBuf,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// `user` types `text` in their private chat.
    pub async fn send_text(&mut self, user: UserId, text: &str) -> Result<(), TocsinError> {
        self.bot
            .handle_event(ChatEvent::text(user, dm(user), text))
            .await
    }

    /// `user` presses a button carrying `data` in their private chat.
    pub async fn press(&mut self, user: UserId, data: &str) -> Result<(), TocsinError> {
        self.bot
            .handle_event(ChatEvent::button(user, dm(user), data))
            .await
    }

    /// `user` presses a button attached to a specific message.
    pub async fn press_on(
        &mut self,
        user: UserId,
        data: &str,
        message: MessageRef,
    ) -> Result<(), TocsinError> {
        self.bot
            .handle_event(ChatEvent {
                user,
                chat: dm(user),
                kind: ChatEventKind::Button {
                    data: data.to_string(),
                    message: Some(message),
                },
            })
            .await
    }

    /// Runs one escalation scan at the clock's current time.
    pub async fn scan(&self) -> ScanReport {
        self.scheduler.scan_once(self.clock.now()).await
    }

    /// Latest message the bot sent to `user` privately.
    pub async fn last_reply(&self, user: UserId) -> Option<OutboundMessage> {
        self.chat.last_sent_to(dm(user)).await
    }

    /// Messages posted to the alarm channel.
    pub async fn channel_posts(&self) -> Vec<OutboundMessage> {
        self.chat.sent_to(ALARM_CHANNEL).await
    }

    /// Messages posted to the discussion channel.
    pub async fn discussion_posts(&self) -> Vec<OutboundMessage> {
        self.chat.sent_to(DISCUSSION_CHANNEL).await
    }
}
