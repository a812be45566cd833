// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The record-creation wizard.
//!
//! One [`Wizard`] per user walks through a fixed sequence of questions:
//!
//! ```text
//! SelectingType -> EnterTitle -> EnterDescription -> EnterLevel -> EnterService -> EnterFixTime
//!                                                 \-> EnterStartTime -> EnterEndTime -> EnterUnavailableServices
//!               -> EnterMessageText
//!                                                            ... -> Confirmation -> submit | cancel
//! ```
//!
//! The wizard is pure: it never touches the store, the tracker or the chat.
//! [`Wizard::step`] consumes one input and says what to do next; the caller
//! renders prompts and commits a [`Submission`].

use chrono::NaiveDateTime;
use strum::Display;
use tocsin_core::{AlarmDetails, MaintenanceDetails};
use tracing::debug;

use crate::callbacks::{self, catalog_choice};
use crate::timeparse::{parse_fix_time, parse_window_time};

/// Where a wizard currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum WizardState {
    SelectingType,
    EnterTitle,
    EnterDescription,
    EnterLevel,
    EnterService,
    EnterFixTime,
    EnterStartTime,
    EnterEndTime,
    EnterUnavailableServices,
    EnterMessageText,
    Confirmation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftKind {
    Alarm,
    Maintenance,
    Broadcast,
}

/// Fields collected so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub kind: Option<DraftKind>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub level: Option<String>,
    pub service: Option<String>,
    pub fix_by: Option<NaiveDateTime>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub unavailable_services: Option<String>,
    pub message_text: Option<String>,
}

/// A completed draft, ready to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Alarm {
        details: AlarmDetails,
        fix_by: NaiveDateTime,
    },
    Maintenance {
        details: MaintenanceDetails,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    Broadcast {
        text: String,
    },
}

impl Draft {
    /// Assembles a submission if every field the kind needs is present.
    pub fn submission(&self) -> Option<Submission> {
        match self.kind? {
            DraftKind::Alarm => Some(Submission::Alarm {
                details: AlarmDetails {
                    issue: self.title.clone()?,
                    description: self.description.clone()?,
                    service: self.service.clone()?,
                    level: self.level.clone()?,
                },
                fix_by: self.fix_by?,
            }),
            DraftKind::Maintenance => Some(Submission::Maintenance {
                details: MaintenanceDetails {
                    title: self.title.clone()?,
                    description: self.description.clone()?,
                    unavailable_services: self.unavailable_services.clone()?,
                },
                start: self.start?,
                end: self.end?,
            }),
            DraftKind::Broadcast => Some(Submission::Broadcast {
                text: self.message_text.clone()?,
            }),
        }
    }
}

/// One user action fed to the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    Text(&'a str),
    /// Payload of a pressed button.
    Choice(&'a str),
    Cancel,
}

/// The question to put to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    ChooseType,
    Title,
    Description,
    Level,
    Service,
    FixTime,
    StartTime,
    EndTime,
    UnavailableServices,
    MessageText,
    Preview(Submission),
}

/// Why an input was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Problem {
    NotUnderstood,
    EmptyText,
    BadTime,
    FixTimeNotInFuture,
    EndNotAfterStart,
    UnknownChoice,
}

/// Result of feeding one input to the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Moved on; ask the next question.
    Ask(Prompt),
    /// Stayed in place; ask again.
    Retry { prompt: Prompt, problem: Problem },
    /// The user gave up. Nothing was collected for good.
    Cancelled,
    /// The user confirmed a complete draft.
    Submit(Submission),
}

/// Values the wizard reads but does not own.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub now: NaiveDateTime,
    pub levels: &'a [String],
    pub services: &'a [String],
}

/// A single user's creation wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wizard {
    state: WizardState,
    draft: Draft,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            state: WizardState::SelectingType,
            draft: Draft::default(),
        }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// The question matching the current state.
    pub fn prompt(&self) -> Prompt {
        match self.state {
            WizardState::SelectingType => Prompt::ChooseType,
            WizardState::EnterTitle => Prompt::Title,
            WizardState::EnterDescription => Prompt::Description,
            WizardState::EnterLevel => Prompt::Level,
            WizardState::EnterService => Prompt::Service,
            WizardState::EnterFixTime => Prompt::FixTime,
            WizardState::EnterStartTime => Prompt::StartTime,
            WizardState::EnterEndTime => Prompt::EndTime,
            WizardState::EnterUnavailableServices => Prompt::UnavailableServices,
            WizardState::EnterMessageText => Prompt::MessageText,
            WizardState::Confirmation => self
                .draft
                .submission()
                .map_or(Prompt::ChooseType, Prompt::Preview),
        }
    }

    /// Applies one input. This is the only place the wizard changes state.
    pub fn step(&mut self, input: Input<'_>, ctx: &StepContext<'_>) -> Step {
        use WizardState as S;

        let (Input::Text(_) | Input::Choice(_)) = input else {
            debug!(state = %self.state, "wizard cancelled");
            return Step::Cancelled;
        };

        match (self.state, input) {
            (S::SelectingType, Input::Choice(data)) => {
                let (kind, next) = match data {
                    callbacks::TYPE_ALARM => (DraftKind::Alarm, S::EnterTitle),
                    callbacks::TYPE_MAINTENANCE => (DraftKind::Maintenance, S::EnterTitle),
                    callbacks::TYPE_BROADCAST => (DraftKind::Broadcast, S::EnterMessageText),
                    _ => return self.retry(Problem::UnknownChoice),
                };
                self.draft.kind = Some(kind);
                self.advance(next)
            }
            (S::EnterTitle, Input::Text(text)) => match non_empty(text) {
                Some(title) => {
                    self.draft.title = Some(title);
                    self.advance(S::EnterDescription)
                }
                None => self.retry(Problem::EmptyText),
            },
            (S::EnterDescription, Input::Text(text)) => match non_empty(text) {
                Some(description) => {
                    self.draft.description = Some(description);
                    let next = if self.draft.kind == Some(DraftKind::Maintenance) {
                        S::EnterStartTime
                    } else {
                        S::EnterLevel
                    };
                    self.advance(next)
                }
                None => self.retry(Problem::EmptyText),
            },
            (S::EnterLevel, input) => match pick(input, callbacks::LEVEL_PREFIX, ctx.levels) {
                Some(level) => {
                    self.draft.level = Some(level);
                    self.advance(S::EnterService)
                }
                None => self.retry(Problem::UnknownChoice),
            },
            (S::EnterService, input) => match pick(input, callbacks::SERVICE_PREFIX, ctx.services) {
                Some(service) => {
                    self.draft.service = Some(service);
                    self.advance(S::EnterFixTime)
                }
                None => self.retry(Problem::UnknownChoice),
            },
            (S::EnterFixTime, Input::Text(text)) => match parse_fix_time(text, ctx.now) {
                Some(fix_by) if fix_by > ctx.now => {
                    self.draft.fix_by = Some(fix_by);
                    self.advance(S::Confirmation)
                }
                Some(_) => self.retry(Problem::FixTimeNotInFuture),
                None => self.retry(Problem::BadTime),
            },
            (S::EnterStartTime, Input::Text(text)) => match parse_window_time(text, ctx.now) {
                Some(start) => {
                    self.draft.start = Some(start);
                    self.advance(S::EnterEndTime)
                }
                None => self.retry(Problem::BadTime),
            },
            (S::EnterEndTime, Input::Text(text)) => {
                match (parse_window_time(text, ctx.now), self.draft.start) {
                    (Some(end), Some(start)) if end > start => {
                        self.draft.end = Some(end);
                        self.advance(S::EnterUnavailableServices)
                    }
                    (Some(_), _) => self.retry(Problem::EndNotAfterStart),
                    (None, _) => self.retry(Problem::BadTime),
                }
            }
            (S::EnterUnavailableServices, Input::Text(text)) => match non_empty(text) {
                Some(services) => {
                    self.draft.unavailable_services = Some(services);
                    self.advance(S::Confirmation)
                }
                None => self.retry(Problem::EmptyText),
            },
            (S::EnterMessageText, Input::Text(text)) => match non_empty(text) {
                Some(body) => {
                    self.draft.message_text = Some(body);
                    self.advance(S::Confirmation)
                }
                None => self.retry(Problem::EmptyText),
            },
            (S::Confirmation, Input::Choice(callbacks::CONFIRM_SEND)) => self.confirm(ctx.now),
            (S::Confirmation, Input::Choice(callbacks::CONFIRM_CANCEL)) => Step::Cancelled,
            _ => self.retry(Problem::NotUnderstood),
        }
    }

    fn confirm(&mut self, now: NaiveDateTime) -> Step {
        match self.draft.submission() {
            Some(Submission::Alarm { fix_by, .. }) if fix_by <= now => {
                // Lingered on the preview past the deadline; ask for a new one.
                self.draft.fix_by = None;
                self.state = WizardState::EnterFixTime;
                self.retry(Problem::FixTimeNotInFuture)
            }
            Some(submission) => Step::Submit(submission),
            None => Step::Cancelled,
        }
    }

    fn advance(&mut self, next: WizardState) -> Step {
        debug!(from = %self.state, to = %next, "wizard advanced");
        self.state = next;
        Step::Ask(self.prompt())
    }

    fn retry(&self, problem: Problem) -> Step {
        debug!(state = %self.state, problem = %problem, "wizard input rejected");
        Step::Retry {
            prompt: self.prompt(),
            problem,
        }
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Resolves a catalog pick from a button or from the typed entry name.
fn pick(input: Input<'_>, prefix: &str, catalog: &[String]) -> Option<String> {
    match input {
        Input::Choice(data) => catalog_choice(data, prefix, catalog).map(str::to_string),
        Input::Text(text) => {
            let wanted = text.trim().to_lowercase();
            catalog
                .iter()
                .find(|entry| entry.to_lowercase() == wanted)
                .cloned()
        }
        Input::Cancel => None,
    }
}
