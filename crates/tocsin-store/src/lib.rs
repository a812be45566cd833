// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! State store for the Tocsin incident bot.
//!
//! Holds the live alarm and maintenance maps plus pending reminder replies,
//! and persists them as a single JSON document replaced atomically on save.

pub mod snapshot;
pub mod store;

pub use store::{LoadOutcome, LoadReport, ReminderSession, StateStore, Visibility};
