// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat transport trait for messaging platform integrations.

use async_trait::async_trait;

use crate::error::TocsinError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChatEvent, ChatId, MessageRef, OutboundMessage, ThreadId};

/// Bidirectional chat integration.
///
/// Delivers formatted messages (optionally into a thread, optionally with
/// inline buttons) and yields text and button events correlated to a user.
#[async_trait]
pub trait ChatTransport: PluginAdapter {
    /// Starts receiving updates from the platform.
    async fn connect(&mut self) -> Result<(), TocsinError>;

    /// Sends a message and returns a reference to the delivered copy.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageRef, TocsinError>;

    /// Opens a discussion thread named `title` inside `chat`.
    async fn create_discussion_thread(
        &self,
        chat: ChatId,
        title: &str,
    ) -> Result<ThreadId, TocsinError>;

    /// Waits for the next inbound event.
    async fn receive(&self) -> Result<ChatEvent, TocsinError>;
}
