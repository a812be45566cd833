// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the collaborators around the incident tracker.
//!
//! Network-facing adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod auth;
pub mod chat;
pub mod tracker;

pub use adapter::PluginAdapter;
pub use auth::{Authorizer, StaticRoles};
pub use chat::ChatTransport;
pub use tracker::TicketTracker;
