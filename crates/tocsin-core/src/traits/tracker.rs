// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Issue tracker trait.

use async_trait::async_trait;

use crate::error::TrackerError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CreatedIssue, NewIssue};

/// REST-style issue tracker used to open failure tickets.
#[async_trait]
pub trait TicketTracker: PluginAdapter {
    /// Opens a new ticket and returns its key and browse URL.
    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue, TrackerError>;

    /// Appends a comment to a ticket.
    async fn add_comment(&self, key: &str, body: &str) -> Result<(), TrackerError>;

    /// Applies a workflow transition to a ticket, e.g. to close it.
    async fn transition(&self, key: &str, transition_id: &str) -> Result<(), TrackerError>;
}
