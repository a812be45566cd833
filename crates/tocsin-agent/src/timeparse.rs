// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Free-text time parsing for chat input.
//!
//! Users type deadlines the way they would say them: `15:30`, `1 hour`,
//! `через 2 часа`, `1,5 h`. Every parser here returns `None` on input it
//! does not understand so the caller can re-prompt.

use std::sync::LazyLock;

use chrono::{Duration, NaiveDateTime, NaiveTime};
use regex::Regex;

/// Format used when showing timestamps to users and for full date input.
pub const DISPLAY_FORMAT: &str = "%d.%m.%Y %H:%M";

static CLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[:.](\d{2})$").unwrap());

static RELATIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)\s*([^\d\s.,]+)").unwrap());

/// Longest accepted relative duration.
const MAX_RELATIVE_DAYS: f64 = 366.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Minutes,
    Hours,
    Days,
}

impl Unit {
    fn from_word(word: &str) -> Option<Self> {
        let word = word.to_lowercase();
        let w = word.as_str();
        if matches!(w, "m" | "м") || w.starts_with("min") || w.starts_with("мин") {
            Some(Self::Minutes)
        } else if matches!(w, "h" | "ч")
            || w.starts_with("hour")
            || w.starts_with("hr")
            || w.starts_with("час")
        {
            Some(Self::Hours)
        } else if matches!(w, "d" | "д")
            || w.starts_with("day")
            || w.starts_with("дн")
            || w.starts_with("ден")
            || w.starts_with("сут")
        {
            Some(Self::Days)
        } else {
            None
        }
    }

    fn seconds(self) -> f64 {
        match self {
            Self::Minutes => 60.0,
            Self::Hours => 3_600.0,
            Self::Days => 86_400.0,
        }
    }
}

/// Parses a wall-clock `HH:MM` relative to `now`.
///
/// A time that is not after `now` means the same time tomorrow.
pub fn parse_clock(input: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let caps = CLOCK.captures(input.trim())?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let today = now.date().and_time(time);
    if today > now {
        Some(today)
    } else {
        Some(today + Duration::days(1))
    }
}

/// Parses a relative phrase such as `30 minutes`, `1.5 hours` or `через 2 дня`.
///
/// The first `<number> <unit>` pair with a recognised unit wins. Zero,
/// negative and absurdly long durations are rejected.
pub fn parse_duration(input: &str) -> Option<Duration> {
    RELATIVE.captures_iter(input).find_map(|caps| {
        let unit = Unit::from_word(&caps[2])?;
        let value: f64 = caps[1].replace(',', ".").parse().ok()?;
        if !value.is_finite() || value <= 0.0 {
            return None;
        }
        let seconds = value * unit.seconds();
        if seconds > MAX_RELATIVE_DAYS * Unit::Days.seconds() {
            return None;
        }
        Some(Duration::milliseconds((seconds * 1_000.0).round() as i64))
    })
}

/// Resolves an alarm fix time: `HH:MM` first, then a relative phrase.
pub fn parse_fix_time(input: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    parse_clock(input, now).or_else(|| parse_duration(input).map(|d| now + d))
}

/// Resolves a maintenance boundary: full `dd.mm.yyyy HH:MM`, or anything
/// [`parse_fix_time`] accepts.
pub fn parse_window_time(input: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(input.trim(), DISPLAY_FORMAT)
        .ok()
        .or_else(|| parse_fix_time(input, now))
}
