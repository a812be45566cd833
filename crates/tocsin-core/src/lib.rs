// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tocsin incident bot.
//!
//! This crate provides the record types, trait definitions, and error types
//! shared by the store, the workflow, and the adapters. Chat and tracker
//! integrations implement traits defined here.

pub mod clock;
pub mod error;
pub mod record;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use clock::{Clock, SystemClock};
pub use error::{TocsinError, TrackerError};
pub use record::{AgeNotice, AlarmDetails, AlarmRecord, MaintenanceDetails, MaintenanceRecord};
pub use types::{AdapterType, ChatId, HealthStatus, MessageRef, RecordId, ThreadId, UserId};

pub use traits::{Authorizer, ChatTransport, PluginAdapter, StaticRoles, TicketTracker};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_traits_are_exported() {
        // Compiles only if every trait is reachable from the crate root.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_chat_transport<T: ChatTransport>() {}
        fn _assert_ticket_tracker<T: TicketTracker>() {}
        fn _assert_authorizer<T: Authorizer>() {}
        fn _assert_clock<T: Clock>() {}
    }

    #[test]
    fn system_clock_advances() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn health_status_variants() {
        let degraded = HealthStatus::Degraded("slow".into());
        assert_ne!(degraded, HealthStatus::Healthy);
        assert_ne!(HealthStatus::Unhealthy("down".into()), HealthStatus::Healthy);
    }
}
