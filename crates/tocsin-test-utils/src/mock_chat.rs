// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat transport for deterministic testing.
//!
//! `MockChat` implements `ChatTransport` with injectable inbound events
//! and captured outbound messages and threads for assertion in tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use tocsin_core::TocsinError;
use tocsin_core::traits::adapter::PluginAdapter;
use tocsin_core::traits::chat::ChatTransport;
use tocsin_core::types::{
    AdapterType, ChatEvent, ChatId, HealthStatus, MessageRef, OutboundMessage, ThreadId,
};

/// A mock chat transport for testing.
///
/// Provides two queues:
/// - **inbound**: Events injected via `inject_event()` are returned by `receive()`
/// - **sent**: Messages passed to `send()` are captured and retrievable via `sent_messages()`
pub struct MockChat {
    inbound: Arc<Mutex<VecDeque<ChatEvent>>>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    threads: Arc<Mutex<Vec<(ChatId, String)>>>,
    notify: Arc<Notify>,
    next_id: AtomicI32,
    failing: AtomicBool,
    closed: AtomicBool,
}

impl MockChat {
    /// Create a new mock chat with empty queues.
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            threads: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            next_id: AtomicI32::new(1),
            failing: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Inject an inbound event into the receive queue.
    pub async fn inject_event(&self, event: ChatEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// Make every `send()` and thread creation fail until switched back.
    pub fn fail_sends(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Once the queue drains, `receive()` reports the transport as closed.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Get all messages that were sent through `send()`.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Messages delivered to one chat, in order.
    pub async fn sent_to(&self, chat: ChatId) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.chat == chat)
            .cloned()
            .collect()
    }

    /// The most recent message delivered to `chat`.
    pub async fn last_sent_to(&self, chat: ChatId) -> Option<OutboundMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|m| m.chat == chat)
            .cloned()
    }

    /// Get the count of sent messages.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Clear all sent messages.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    /// Discussion threads opened so far, as `(chat, title)`.
    pub async fn threads(&self) -> Vec<(ChatId, String)> {
        self.threads.lock().await.clone()
    }

    fn check_failing(&self) -> Result<(), TocsinError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TocsinError::Chat {
                message: "mock send failure".into(),
                source: None,
            });
        }
        Ok(())
    }
}

impl Default for MockChat {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChat {
    fn name(&self) -> &str {
        "mock-chat"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Chat
    }

    async fn health_check(&self) -> Result<HealthStatus, TocsinError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TocsinError> {
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for MockChat {
    async fn connect(&mut self) -> Result<(), TocsinError> {
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageRef, TocsinError> {
        self.check_failing()?;
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let chat = msg.chat;
        self.sent.lock().await.push(msg);
        Ok(MessageRef { chat, message_id })
    }

    async fn create_discussion_thread(
        &self,
        chat: ChatId,
        title: &str,
    ) -> Result<ThreadId, TocsinError> {
        self.check_failing()?;
        let mut threads = self.threads.lock().await;
        threads.push((chat, title.to_string()));
        Ok(ThreadId(threads.len() as i32))
    }

    async fn receive(&self) -> Result<ChatEvent, TocsinError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
            }
            if self.closed.load(Ordering::SeqCst) {
                return Err(TocsinError::Chat {
                    message: "mock inbound channel closed".into(),
                    source: None,
                });
            }
            // Wait for notification that a new event was injected
            self.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tocsin_core::UserId;

    #[tokio::test]
    async fn receive_returns_injected_events_in_order() {
        let chat = MockChat::new();
        chat.inject_event(ChatEvent::text(UserId(1), ChatId(1), "first"))
            .await;
        chat.inject_event(ChatEvent::button(UserId(1), ChatId(1), "second"))
            .await;

        let first = chat.receive().await.unwrap();
        let second = chat.receive().await.unwrap();
        assert_eq!(first, ChatEvent::text(UserId(1), ChatId(1), "first"));
        assert_eq!(second, ChatEvent::button(UserId(1), ChatId(1), "second"));
    }

    #[tokio::test]
    async fn send_captures_and_numbers_messages() {
        let chat = MockChat::new();
        let a = chat.send(OutboundMessage::new(ChatId(5), "a")).await.unwrap();
        let b = chat.send(OutboundMessage::new(ChatId(6), "b")).await.unwrap();
        assert_ne!(a.message_id, b.message_id);
        assert_eq!(chat.sent_count().await, 2);
        assert_eq!(chat.sent_to(ChatId(5)).await.len(), 1);
        assert_eq!(chat.last_sent_to(ChatId(6)).await.unwrap().text, "b");

        chat.clear_sent().await;
        assert_eq!(chat.sent_count().await, 0);
    }

    #[tokio::test]
    async fn failure_mode_rejects_sends() {
        let chat = MockChat::new();
        chat.fail_sends(true);
        assert!(chat.send(OutboundMessage::new(ChatId(5), "a")).await.is_err());
        assert!(chat.create_discussion_thread(ChatId(5), "t").await.is_err());
        chat.fail_sends(false);
        assert!(chat.send(OutboundMessage::new(ChatId(5), "a")).await.is_ok());
        assert_eq!(chat.sent_count().await, 1);
    }

    #[tokio::test]
    async fn receive_waits_for_injection() {
        let chat = Arc::new(MockChat::new());
        let chat_clone = chat.clone();

        tokio::spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
            chat_clone
                .inject_event(ChatEvent::text(UserId(1), ChatId(1), "delayed"))
                .await;
        });

        let received = tokio::time::timeout(tokio::time::Duration::from_secs(2), chat.receive())
            .await
            .expect("receive timed out")
            .unwrap();
        assert_eq!(received, ChatEvent::text(UserId(1), ChatId(1), "delayed"));
    }

    #[tokio::test]
    async fn closed_transport_reports_closed() {
        let chat = MockChat::new();
        chat.close();
        let err = chat.receive().await.unwrap_err();
        assert!(err.to_string().contains("closed"));
    }
}
