// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user interactive sessions.
//!
//! A user has at most one session. Starting a new flow replaces whatever
//! the user was doing before; nothing from the old session is kept.

use std::collections::HashMap;

use tocsin_core::UserId;
use tracing::debug;

use crate::manage::ManageFlow;
use crate::workflow::Wizard;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Wizard(Wizard),
    Manage(ManageFlow),
}

impl Session {
    fn label(&self) -> &'static str {
        match self {
            Self::Wizard(_) => "wizard",
            Self::Manage(_) => "manage",
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<UserId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `session` for `user`, returning the one it replaced.
    pub fn begin(&mut self, user: UserId, session: Session) -> Option<Session> {
        let label = session.label();
        let previous = self.sessions.insert(user, session);
        if let Some(old) = &previous {
            debug!(user_id = %user, discarded = old.label(), started = label, "session replaced");
        }
        previous
    }

    pub fn get_mut(&mut self, user: UserId) -> Option<&mut Session> {
        self.sessions.get_mut(&user)
    }

    pub fn end(&mut self, user: UserId) -> Option<Session> {
        self.sessions.remove(&user)
    }

    pub fn is_active(&self, user: UserId) -> bool {
        self.sessions.contains_key(&user)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
