// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Tocsin bot loop and the logic around it.
//!
//! [`BotLoop`] receives chat events one at a time, routes commands and button
//! presses into the per-user wizard or manage flow, and commits the results
//! to the state store. The [`EscalationScheduler`] runs beside it, sharing
//! the store and the notification dispatcher.

mod actions;
pub mod callbacks;
pub mod dispatch;
pub mod escalation;
pub mod format;
pub mod listing;
pub mod manage;
pub mod render;
pub mod session;
pub mod shutdown;
pub mod timeparse;
pub mod workflow;

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tocsin_config::TocsinConfig;
use tocsin_config::model::CatalogConfig;
use tocsin_core::types::{ChatEvent, ChatEventKind};
use tocsin_core::{
    Authorizer, ChatId, ChatTransport, Clock, MessageRef, TicketTracker, TocsinError, UserId,
};
use tocsin_store::{StateStore, Visibility};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use dispatch::{Channels, NotificationDispatcher, RecordRef};
pub use escalation::{EscalationScheduler, ScanReport};
pub use session::{Session, SessionRegistry};
pub use shutdown::install_signal_handler;

use crate::manage::{ManageFlow, ManagePrompt, ManageStep};
use crate::render::Rendered;
use crate::workflow::{Input, Step, StepContext, Wizard};

const NO_RIGHTS: &str = "⛔ You do not have permission to do that.";
const CANCELLED: &str = "❌ Cancelled. Nothing was saved.";
const NOTHING_TO_CANCEL: &str = "Nothing to cancel.";
const OUTDATED: &str = "⌛ This button is outdated.";
const ALREADY_CLOSED: &str = "ℹ️ This event is already closed.";
const FAILURE: &str = "⚠️ Something went wrong. Please start again with /new_message or /manage.";

/// Event-driven core: one step per inbound chat event.
pub struct BotLoop {
    chat: Arc<dyn ChatTransport>,
    store: Arc<StateStore>,
    tracker: Arc<dyn TicketTracker>,
    auth: Arc<dyn Authorizer>,
    clock: Arc<dyn Clock>,
    dispatcher: Arc<NotificationDispatcher>,
    catalog: CatalogConfig,
    sessions: SessionRegistry,
    /// Bound on waiting for a new ticket while other users' events queue up.
    ticket_wait: Duration,
    resolve_transition: Option<String>,
}

impl BotLoop {
    pub fn new(
        chat: Arc<dyn ChatTransport>,
        store: Arc<StateStore>,
        tracker: Arc<dyn TicketTracker>,
        auth: Arc<dyn Authorizer>,
        clock: Arc<dyn Clock>,
        config: &TocsinConfig,
    ) -> Result<Self, TocsinError> {
        let channels = Channels::from_config(config)?;
        let dispatcher = Arc::new(NotificationDispatcher::new(chat.clone(), channels));
        Ok(Self {
            chat,
            store,
            tracker,
            auth,
            clock,
            dispatcher,
            catalog: config.catalog.clone(),
            sessions: SessionRegistry::new(),
            ticket_wait: Duration::from_secs(config.tracker.create_wait_secs),
            resolve_transition: config.tracker.resolve_transition.clone(),
        })
    }

    /// The dispatcher shared with the escalation scheduler.
    pub fn dispatcher(&self) -> Arc<NotificationDispatcher> {
        self.dispatcher.clone()
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Handles events until `cancel` fires or the transport closes.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), TocsinError> {
        info!("bot loop running");

        loop {
            tokio::select! {
                event = self.chat.receive() => {
                    match event {
                        Ok(event) => {
                            if let Err(e) = self.handle_event(event).await {
                                error!(error = %e, "failed to handle chat event");
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "chat receive error");
                            if e.to_string().contains("closed") {
                                break;
                            }
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping bot loop");
                    break;
                }
            }
        }

        info!(open_sessions = self.sessions.len(), "bot loop stopped");
        Ok(())
    }

    /// Processes a single event.
    ///
    /// On failure the user's session is cleared and they are told to start
    /// over; the error is returned for logging.
    pub async fn handle_event(&mut self, event: ChatEvent) -> Result<(), TocsinError> {
        let (user, chat) = (event.user, event.chat);
        let outcome = match event.kind {
            ChatEventKind::Text(text) => self.on_text(user, chat, text.trim()).await,
            ChatEventKind::Button { data, message } => {
                self.on_button(user, chat, &data, message).await
            }
        };
        if outcome.is_err() {
            self.sessions.end(user);
            if let Err(e) = self.reply(chat, Rendered::text(FAILURE)).await {
                warn!(user_id = %user, error = %e, "failed to report failure to user");
            }
        }
        outcome
    }

    async fn reply(&self, chat: ChatId, rendered: Rendered) -> Result<MessageRef, TocsinError> {
        self.dispatcher.send(rendered.to(chat)).await
    }

    async fn reply_text(&self, chat: ChatId, text: &str) -> Result<(), TocsinError> {
        self.reply(chat, Rendered::text(text)).await.map(|_| ())
    }

    fn can_manage(&self, user: UserId, owner: UserId) -> bool {
        user == owner || self.auth.is_superadmin(user)
    }

    async fn on_text(&mut self, user: UserId, chat: ChatId, text: &str) -> Result<(), TocsinError> {
        if let Some(command) = text.strip_prefix('/') {
            // Group chats append the bot name: /manage@tocsin_bot
            let command = command
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .split('@')
                .next()
                .unwrap_or_default();
            return self.on_command(user, chat, command).await;
        }
        if text == callbacks::CANCEL_LABEL {
            return self.cancel(user, chat).await;
        }
        if self.sessions.is_active(user) {
            return self.advance_session(user, chat, Input::Text(text)).await;
        }
        debug!(user_id = %user, "ignoring text outside of a session");
        Ok(())
    }

    async fn on_command(
        &mut self,
        user: UserId,
        chat: ChatId,
        command: &str,
    ) -> Result<(), TocsinError> {
        debug!(user_id = %user, command, "command received");
        match command {
            "start" | "help" => {
                self.reply(chat, render::help(self.auth.is_admin(user))).await?;
            }
            "cancel" => return self.cancel(user, chat).await,
            "alarm_list" => self.show_listing(chat, 0).await?,
            "new_message" => {
                if !self.auth.is_admin(user) {
                    return self.reply_text(chat, NO_RIGHTS).await;
                }
                let wizard = Wizard::new();
                let prompt = wizard.prompt();
                self.sessions.begin(user, Session::Wizard(wizard));
                self.reply(chat, render::wizard_prompt(&prompt, &self.catalog))
                    .await?;
            }
            "manage" => {
                if !self.auth.is_admin(user) {
                    return self.reply_text(chat, NO_RIGHTS).await;
                }
                let alarms = self.store.user_active_alarms(user, &*self.auth).await;
                let works = self.store.user_active_maintenances(user, &*self.auth).await;
                if alarms.is_empty() && works.is_empty() {
                    self.sessions.end(user);
                } else {
                    self.sessions.begin(user, Session::Manage(ManageFlow::new()));
                }
                self.reply(chat, render::choose_record(&alarms, &works)).await?;
            }
            _ => {
                self.reply_text(chat, "Unknown command. Try /help.").await?;
            }
        }
        Ok(())
    }

    async fn on_button(
        &mut self,
        user: UserId,
        chat: ChatId,
        data: &str,
        message: Option<MessageRef>,
    ) -> Result<(), TocsinError> {
        if data == callbacks::CANCEL {
            return self.cancel(user, chat).await;
        }
        if let Some(page) = listing::page_from_callback(data) {
            return self.show_listing(chat, page).await;
        }
        if data == callbacks::REMINDER_EXTEND || data == callbacks::REMINDER_STOP {
            return self.on_reminder_reply(user, chat, data, message).await;
        }
        if self.sessions.is_active(user) {
            return self.advance_session(user, chat, Input::Choice(data)).await;
        }
        debug!(user_id = %user, data, "button pressed without a session");
        self.reply_text(chat, OUTDATED).await
    }

    async fn cancel(&mut self, user: UserId, chat: ChatId) -> Result<(), TocsinError> {
        match self.sessions.end(user) {
            Some(_) => {
                debug!(user_id = %user, "session cancelled");
                self.reply_text(chat, CANCELLED).await
            }
            None => self.reply_text(chat, NOTHING_TO_CANCEL).await,
        }
    }

    async fn show_listing(&self, chat: ChatId, page: usize) -> Result<(), TocsinError> {
        let alarms = self.store.list_alarms(Visibility::All).await;
        let works = self.store.list_maintenances(Visibility::All).await;
        self.reply(chat, listing::render_page(&alarms, &works, page))
            .await
            .map(|_| ())
    }

    /// Feeds one input to the user's active flow.
    async fn advance_session(
        &mut self,
        user: UserId,
        chat: ChatId,
        input: Input<'_>,
    ) -> Result<(), TocsinError> {
        let now = self.clock.now();
        let Some(session) = self.sessions.get_mut(user) else {
            return Ok(());
        };
        match session {
            Session::Wizard(wizard) => {
                let ctx = StepContext {
                    now,
                    levels: &self.catalog.levels,
                    services: &self.catalog.services,
                };
                let step = wizard.step(input, &ctx);
                self.on_wizard_step(user, chat, step, now).await
            }
            Session::Manage(flow) => {
                let step = flow.step(input, now);
                self.on_manage_step(user, chat, step, now).await
            }
        }
    }

    async fn on_wizard_step(
        &mut self,
        user: UserId,
        chat: ChatId,
        step: Step,
        now: NaiveDateTime,
    ) -> Result<(), TocsinError> {
        match step {
            Step::Ask(prompt) => {
                self.reply(chat, render::wizard_prompt(&prompt, &self.catalog))
                    .await?;
            }
            Step::Retry { prompt, problem } => {
                debug!(user_id = %user, %problem, "wizard input rejected");
                self.reply(chat, render::wizard_retry(&prompt, problem, &self.catalog))
                    .await?;
            }
            Step::Cancelled => {
                self.sessions.end(user);
                self.reply_text(chat, CANCELLED).await?;
            }
            Step::Submit(submission) => {
                self.sessions.end(user);
                self.commit(user, chat, submission, now).await?;
            }
        }
        Ok(())
    }

    async fn on_manage_step(
        &mut self,
        user: UserId,
        chat: ChatId,
        step: ManageStep,
        now: NaiveDateTime,
    ) -> Result<(), TocsinError> {
        match step {
            ManageStep::Ask(prompt) => self.show_manage_prompt(user, chat, &prompt, None).await,
            ManageStep::Retry(prompt) => {
                debug!(user_id = %user, ?prompt, "manage input rejected");
                let hint = match prompt {
                    ManagePrompt::NewEndTime(_) => "⚠️ I could not read that time.",
                    ManagePrompt::ExtensionOptions(_) => {
                        "⚠️ Use the buttons or type a delay such as «2 hours»."
                    }
                    _ => "⚠️ Please use the buttons below.",
                };
                self.show_manage_prompt(user, chat, &prompt, Some(hint)).await
            }
            ManageStep::Cancelled => {
                self.sessions.end(user);
                self.reply_text(chat, CANCELLED).await
            }
            ManageStep::Apply(action) => {
                if self.apply(user, chat, action, now).await? {
                    self.sessions.end(user);
                }
                Ok(())
            }
        }
    }

    /// Renders a manage prompt against the current store contents.
    ///
    /// A record that vanished or belongs to someone else ends the session.
    async fn show_manage_prompt(
        &mut self,
        user: UserId,
        chat: ChatId,
        prompt: &ManagePrompt,
        hint: Option<&str>,
    ) -> Result<(), TocsinError> {
        let rendered = match prompt {
            ManagePrompt::ChooseRecord => {
                let alarms = self.store.user_active_alarms(user, &*self.auth).await;
                let works = self.store.user_active_maintenances(user, &*self.auth).await;
                Some(render::choose_record(&alarms, &works))
            }
            ManagePrompt::AlarmActions(id) => self
                .store
                .get_alarm(id)
                .await
                .filter(|a| self.can_manage(user, a.owner))
                .map(|a| render::alarm_actions(&a)),
            ManagePrompt::ExtensionOptions(id) => self
                .store
                .get_alarm(id)
                .await
                .filter(|a| self.can_manage(user, a.owner))
                .map(|_| render::extension_options()),
            ManagePrompt::MaintenanceActions(id) => self
                .store
                .get_maintenance(id)
                .await
                .filter(|m| self.can_manage(user, m.owner))
                .map(|m| render::maintenance_actions(&m)),
            ManagePrompt::NewEndTime(id) => self
                .store
                .get_maintenance(id)
                .await
                .filter(|m| self.can_manage(user, m.owner))
                .map(|m| render::new_end_time(&m)),
        };

        let Some(mut rendered) = rendered else {
            self.sessions.end(user);
            return self.reply_text(chat, ALREADY_CLOSED).await;
        };
        if let Some(hint) = hint {
            rendered.text = format!("{hint}\n\n{}", rendered.text);
        }
        self.reply(chat, rendered).await.map(|_| ())
    }
}
