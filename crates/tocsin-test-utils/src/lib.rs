// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tocsin integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without Telegram or Jira.
//!
//! # Components
//!
//! - [`MockChat`] - Mock chat transport with event injection and capture
//! - [`MockTracker`] - Mock issue tracker with a switchable failure mode
//! - [`ManualClock`] - Clock that only moves when told to
//! - [`TestHarness`] - Bot loop and scheduler wired to all of the above

pub mod clock;
pub mod harness;
pub mod mock_chat;
pub mod mock_tracker;

pub use clock::ManualClock;
pub use harness::TestHarness;
pub use mock_chat::MockChat;
pub use mock_tracker::MockTracker;
