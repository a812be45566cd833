// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram chat transport for Tocsin.
//!
//! Implements [`ChatTransport`] for the Telegram Bot API via teloxide,
//! providing long polling, inline keyboards, HTML formatting and forum
//! topics for per-incident discussion threads.

pub mod handler;
pub mod markup;

use async_trait::async_trait;
use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId as TgChatId, MessageId as TgMessageId, ParseMode, ThreadId as TgThreadId,
};
use tocsin_config::model::TelegramConfig;
use tocsin_core::TocsinError;
use tocsin_core::traits::{ChatTransport, PluginAdapter};
use tocsin_core::types::{
    AdapterType, ChatEvent, ChatId, HealthStatus, MessageRef, OutboundMessage, ThreadId,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::markup::{MAX_MESSAGE_CHARS, MAX_TOPIC_CHARS};

/// Telegram transport implementing [`ChatTransport`].
///
/// Text from private chats and every inline button press are forwarded to
/// the bot loop through a bounded queue.
pub struct TelegramTransport {
    bot: Bot,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<ChatEvent>>,
    inbound_tx: mpsc::Sender<ChatEvent>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramTransport {
    /// Creates a new Telegram transport.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, TocsinError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            TocsinError::Config("telegram.bot_token is required to serve".into())
        })?;

        if token.is_empty() {
            return Err(TocsinError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let bot = Bot::new(token);
        let (inbound_tx, inbound_rx) = mpsc::channel(100);

        Ok(Self {
            bot,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    async fn deliver(
        &self,
        msg: &OutboundMessage,
        text: String,
        html: bool,
    ) -> Result<Message, RequestError> {
        let mut request = self.bot.send_message(TgChatId(msg.chat.0), text);
        if html {
            request = request.parse_mode(ParseMode::Html);
        }
        if let Some(thread) = msg.thread {
            request = request.message_thread_id(TgThreadId(TgMessageId(thread.0)));
        }
        if let Some(keyboard) = &msg.keyboard {
            request = request.reply_markup(markup::inline_keyboard(keyboard));
        }
        request.await
    }
}

impl Drop for TelegramTransport {
    fn drop(&mut self) {
        if let Some(handle) = self.polling_handle.take() {
            handle.abort();
        }
    }
}

fn chat_error(context: &str, e: RequestError) -> TocsinError {
    TocsinError::Chat {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl PluginAdapter for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Chat
    }

    async fn health_check(&self) -> Result<HealthStatus, TocsinError> {
        // Check if the bot token is valid by calling getMe.
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), TocsinError> {
        debug!("Telegram transport shutting down");
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn connect(&mut self) -> Result<(), TocsinError> {
        if self.polling_handle.is_some() {
            return Ok(()); // Already connected
        }

        let bot = self.bot.clone();
        let message_tx = self.inbound_tx.clone();
        let button_tx = self.inbound_tx.clone();

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let messages = Update::filter_message().endpoint(move |msg: Message| {
                let tx = message_tx.clone();
                async move {
                    if !handler::is_dm(&msg) {
                        debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                        return respond(());
                    }
                    match handler::text_event(&msg) {
                        Some(event) => {
                            if tx.send(event).await.is_err() {
                                warn!("inbound channel closed, dropping message");
                            }
                        }
                        None => {
                            debug!(msg_id = msg.id.0, "ignoring unsupported message type");
                        }
                    }
                    respond(())
                }
            });

            let buttons =
                Update::filter_callback_query().endpoint(move |bot: Bot, query: CallbackQuery| {
                    let tx = button_tx.clone();
                    async move {
                        // Stops the client-side spinner; the reply comes as a message.
                        if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
                            debug!(error = %e, "failed to answer callback query");
                        }
                        if let Some(event) = handler::button_event(&query) {
                            if tx.send(event).await.is_err() {
                                warn!("inbound channel closed, dropping button press");
                            }
                        }
                        respond(())
                    }
                });

            let handler = dptree::entry().branch(messages).branch(buttons);

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {}) // Silently ignore other updates
                .build()
                .dispatch()
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageRef, TocsinError> {
        let text = markup::truncate(&msg.text, MAX_MESSAGE_CHARS);

        let sent = match self.deliver(&msg, text.clone(), true).await {
            Ok(sent) => sent,
            Err(e) if e.to_string().contains("can't parse entities") => {
                warn!(error = %e, "HTML rejected, sending as plain text");
                self.deliver(&msg, markup::strip_html(&text), false)
                    .await
                    .map_err(|e| chat_error("failed to send message", e))?
            }
            Err(e) => return Err(chat_error("failed to send message", e)),
        };

        Ok(MessageRef {
            chat: ChatId(sent.chat.id.0),
            message_id: sent.id.0,
        })
    }

    async fn create_discussion_thread(
        &self,
        chat: ChatId,
        title: &str,
    ) -> Result<ThreadId, TocsinError> {
        let topic = self
            .bot
            .create_forum_topic(TgChatId(chat.0), markup::truncate(title, MAX_TOPIC_CHARS))
            .await
            .map_err(|e| chat_error("failed to create forum topic", e))?;
        debug!(chat_id = chat.0, thread_id = topic.thread_id.0.0, "forum topic created");
        Ok(ThreadId(topic.thread_id.0.0))
    }

    async fn receive(&self) -> Result<ChatEvent, TocsinError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| TocsinError::Chat {
            message: "Telegram inbound channel closed".into(),
            source: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.map(String::from),
            ..TelegramConfig::default()
        }
    }

    #[test]
    fn new_requires_bot_token() {
        assert!(matches!(
            TelegramTransport::new(&config(None)),
            Err(TocsinError::Config(_))
        ));
    }

    #[test]
    fn new_rejects_empty_token() {
        assert!(TelegramTransport::new(&config(Some(""))).is_err());
    }

    #[test]
    fn new_accepts_valid_token() {
        let token = "123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11";
        assert!(TelegramTransport::new(&config(Some(token))).is_ok());
    }

    #[test]
    fn plugin_adapter_metadata() {
        let transport = TelegramTransport::new(&config(Some("test:token"))).unwrap();
        assert_eq!(transport.name(), "telegram");
        assert_eq!(transport.version(), semver::Version::new(0, 1, 0));
        assert_eq!(transport.adapter_type(), AdapterType::Chat);
    }

    #[test]
    fn chat_error_keeps_context() {
        let err = chat_error(
            "failed to send message",
            RequestError::Api(teloxide::ApiError::BotBlocked),
        );
        assert!(err.is_chat());
        assert!(err.to_string().contains("failed to send message"));
    }
}
