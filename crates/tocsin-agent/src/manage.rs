// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stop and extend flow for live records.
//!
//! Entered through `/manage` (pick a record, then an action) or straight
//! at the extension step from a reminder reply. Like the wizard it is pure
//! and hands back an [`Action`] for the caller to apply.

use chrono::{Duration, NaiveDateTime};
use tocsin_core::RecordId;
use tracing::debug;

use crate::callbacks;
use crate::timeparse::{parse_duration, parse_window_time};
use crate::workflow::Input;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManageState {
    ChoosingRecord,
    AlarmAction(RecordId),
    AlarmExtension(RecordId),
    MaintenanceAction(RecordId),
    MaintenanceEnd(RecordId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagePrompt {
    ChooseRecord,
    AlarmActions(RecordId),
    ExtensionOptions(RecordId),
    MaintenanceActions(RecordId),
    NewEndTime(RecordId),
}

/// A change the caller should apply to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    StopAlarm(RecordId),
    ExtendAlarm(RecordId, Duration),
    StopMaintenance(RecordId),
    RescheduleMaintenance(RecordId, NaiveDateTime),
}

impl Action {
    pub fn record_id(&self) -> &RecordId {
        match self {
            Self::StopAlarm(id)
            | Self::ExtendAlarm(id, _)
            | Self::StopMaintenance(id)
            | Self::RescheduleMaintenance(id, _) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManageStep {
    Ask(ManagePrompt),
    Retry(ManagePrompt),
    Cancelled,
    Apply(Action),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManageFlow {
    state: ManageState,
}

impl Default for ManageFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl ManageFlow {
    pub fn new() -> Self {
        Self {
            state: ManageState::ChoosingRecord,
        }
    }

    /// Starts directly at the extension step for `alarm`.
    pub fn extending(alarm: RecordId) -> Self {
        Self {
            state: ManageState::AlarmExtension(alarm),
        }
    }

    pub fn state(&self) -> &ManageState {
        &self.state
    }

    pub fn prompt(&self) -> ManagePrompt {
        match &self.state {
            ManageState::ChoosingRecord => ManagePrompt::ChooseRecord,
            ManageState::AlarmAction(id) => ManagePrompt::AlarmActions(id.clone()),
            ManageState::AlarmExtension(id) => ManagePrompt::ExtensionOptions(id.clone()),
            ManageState::MaintenanceAction(id) => ManagePrompt::MaintenanceActions(id.clone()),
            ManageState::MaintenanceEnd(id) => ManagePrompt::NewEndTime(id.clone()),
        }
    }

    pub fn step(&mut self, input: Input<'_>, now: NaiveDateTime) -> ManageStep {
        use ManageState as S;

        let next = match (&self.state, input) {
            (_, Input::Cancel) | (S::AlarmExtension(_), Input::Choice(callbacks::EXTEND_CANCEL)) => {
                return ManageStep::Cancelled;
            }
            (S::ChoosingRecord, Input::Choice(data)) => {
                if let Some(id) = data.strip_prefix(callbacks::SELECT_ALARM_PREFIX) {
                    S::AlarmAction(id.into())
                } else if let Some(id) = data.strip_prefix(callbacks::SELECT_MAINTENANCE_PREFIX) {
                    S::MaintenanceAction(id.into())
                } else {
                    return ManageStep::Retry(self.prompt());
                }
            }
            (S::AlarmAction(id), Input::Choice(callbacks::ACTION_STOP)) => {
                return ManageStep::Apply(Action::StopAlarm(id.clone()));
            }
            (S::AlarmAction(id), Input::Choice(callbacks::ACTION_EXTEND)) => {
                S::AlarmExtension(id.clone())
            }
            (S::AlarmExtension(id), Input::Choice(callbacks::EXTEND_30_MIN)) => {
                return ManageStep::Apply(Action::ExtendAlarm(id.clone(), Duration::minutes(30)));
            }
            (S::AlarmExtension(id), Input::Choice(callbacks::EXTEND_1_HOUR)) => {
                return ManageStep::Apply(Action::ExtendAlarm(id.clone(), Duration::hours(1)));
            }
            (S::AlarmExtension(id), Input::Text(text)) => match parse_duration(text) {
                Some(delta) => return ManageStep::Apply(Action::ExtendAlarm(id.clone(), delta)),
                None => return ManageStep::Retry(self.prompt()),
            },
            (S::MaintenanceAction(id), Input::Choice(callbacks::ACTION_STOP)) => {
                return ManageStep::Apply(Action::StopMaintenance(id.clone()));
            }
            (S::MaintenanceAction(id), Input::Choice(callbacks::ACTION_EXTEND)) => {
                S::MaintenanceEnd(id.clone())
            }
            (S::MaintenanceEnd(id), Input::Text(text)) => match parse_window_time(text, now) {
                Some(end) => {
                    return ManageStep::Apply(Action::RescheduleMaintenance(id.clone(), end));
                }
                None => return ManageStep::Retry(self.prompt()),
            },
            _ => return ManageStep::Retry(self.prompt()),
        };

        debug!(from = ?self.state, to = ?next, "manage flow advanced");
        self.state = next;
        ManageStep::Ask(self.prompt())
    }
}
