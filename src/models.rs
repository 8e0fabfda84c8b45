// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Data Models
//!
//! Core data structures shared across the crate: the normalized activity
//! record, the per-invocation context snapshot, and the recommendation
//! output contract.
//!
//! ## Design Principles
//!
//! - **Explicit optionality**: fields that are sometimes absent
//!   (`confidence`, `average_speed`) are `Option`s, not open-ended maps
//! - **Immutable values**: nothing is mutated after construction; every
//!   invocation recomputes from scratch
//! - **Stable schema**: serialized field names are the de facto contract
//!   other layers (cache, export) must preserve

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// One completed run, normalized from the provider's representation
///
/// Records are ordered newest-first by the producing [`ActivitySource`];
/// all "recent N" sampling in the analysis layer relies on that ordering.
///
/// [`ActivitySource`]: crate::providers::ActivitySource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Calendar date of the run (local, no time component)
    pub date: NaiveDate,
    /// Local clock time the run started, `HH:MM`
    pub start_time: String,
    /// Local start hour 0-23, duplicated from `start_time` for fast bucketing
    pub start_hour: u8,
    /// Full weekday name derived from `date`
    pub weekday: String,
    /// Total duration in whole minutes
    pub duration_minutes: u32,
    /// Distance in kilometers, rounded to 2 decimal places
    pub distance_km: f64,
    /// Average speed in km/h, when the source provides it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_speed: Option<f64>,
}

/// Snapshot of "now" used as input to recommendation logic
///
/// Constructed per invocation and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Full weekday name for today
    pub today: String,
    /// Current local clock time, `HH:MM`
    pub time_now: String,
    /// Whole days since the most recent activity (0 when there are none)
    pub last_run_days_ago: u32,
}

impl Context {
    /// Build a context with explicit values
    pub fn new(today: impl Into<String>, time_now: impl Into<String>, last_run_days_ago: u32) -> Self {
        Self {
            today: today.into(),
            time_now: time_now.into(),
            last_run_days_ago,
        }
    }

    /// Capture the current local time and the gap since the newest activity
    ///
    /// Expects `activities` to be ordered newest-first. A future-dated
    /// newest activity clamps the gap at zero.
    pub fn capture(activities: &[ActivityRecord]) -> Self {
        let now = Local::now();
        let last_run_days_ago = activities
            .first()
            .map(|a| (now.date_naive() - a.date).num_days().max(0) as u32)
            .unwrap_or(0);

        Self {
            today: now.format("%A").to_string(),
            time_now: now.format("%H:%M").to_string(),
            last_run_days_ago,
        }
    }
}

/// Effort level for a recommended session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Easy,
    Moderate,
    Hard,
}

impl Intensity {
    /// Lowercase label matching the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Moderate => "moderate",
            Self::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Intensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The engine's sole output: one suggested session for today
///
/// Produced by both the rule-based and AI paths with an identical structure.
/// `model` identifies the origin: a model name, or the literal fallback
/// identifiers `rule-based` / `default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Suggested start time, `HH:MM` or `H:MM AM|PM`, prefixed with
    /// `tomorrow ` when the suggested hour has already passed today
    pub time: String,
    /// Suggested duration in minutes
    pub duration: u32,
    /// Suggested effort level
    pub intensity: Intensity,
    /// Short data-derived observation
    pub insight: String,
    /// Short encouragement
    pub motivation: String,
    /// Confidence in [0, 1]; rule-based path only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// True iff the generative model produced this recommendation
    #[serde(default)]
    pub ai_used: bool,
    /// Model name, `rule-based`, or `default`
    pub model: String,
}

/// The five-field shape the model is asked to emit
///
/// Parsed from the raw completion text, then tagged with origin metadata by
/// the coach to form a full [`Recommendation`].
#[derive(Debug, Clone, Deserialize)]
pub struct ModelRecommendation {
    pub time: String,
    pub duration: u32,
    pub intensity: Intensity,
    pub insight: String,
    pub motivation: String,
}

impl ModelRecommendation {
    /// Promote a parsed model response into the full output contract
    pub fn into_recommendation(self, model: impl Into<String>) -> Recommendation {
        Recommendation {
            time: self.time,
            duration: self.duration,
            intensity: self.intensity,
            insight: self.insight,
            motivation: self.motivation,
            confidence: None,
            ai_used: true,
            model: model.into(),
        }
    }
}

/// Result of the weekly pattern analysis operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyInsights {
    /// Up to 3 human-readable observations
    pub insights: Vec<String>,
    /// True iff the generative model produced the insights
    #[serde(default)]
    pub ai_used: bool,
    /// Model name or `rule-based`; absent when no analysis ran at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Full weekday name for a date, e.g. `"Tuesday"`
pub fn weekday_name(date: NaiveDate) -> String {
    // chrono's %A formatting without going through a DateTime
    match date.weekday() {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
    .to_string()
}
