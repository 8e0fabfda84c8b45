// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Intelligence Module
//!
//! Pattern analysis and recommendation generation over running history.
//!
//! This module includes:
//! - Descriptive statistics over recent activities (time-of-day, weekly
//!   frequency, performance aggregates)
//! - A deterministic rule-based recommendation engine
//! - An AI coach that wraps the rule-based engine as its fallback
//!
//! All analysis is pure over its input: no I/O, no shared state, and every
//! operation degrades to documented defaults on empty input.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod analyzer;
pub mod coach;
pub mod recommendation_engine;

pub use analyzer::PatternAnalyzer;
pub use coach::AiCoach;
pub use recommendation_engine::RecommendationEngine;

/// One of the five fixed time-of-day buckets used for distribution analysis
///
/// Variant order is the canonical band order; ties in band comparisons
/// resolve toward the earlier band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBand {
    EarlyMorning, // [0, 6)
    Morning,      // [6, 12)
    Afternoon,    // [12, 17)
    Evening,      // [17, 21)
    Night,        // [21, 24)
}

impl TimeBand {
    /// Bucket a start hour into its band
    pub fn from_hour(hour: u8) -> Self {
        match hour {
            0..=5 => Self::EarlyMorning,
            6..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=20 => Self::Evening,
            _ => Self::Night,
        }
    }

    /// Snake-case label matching the serialized form
    pub fn label(&self) -> &'static str {
        match self {
            Self::EarlyMorning => "early_morning",
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
        }
    }
}

/// Time-of-day statistics over recent activities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePatterns {
    /// Most frequent exact start hour, formatted `HH:00`
    pub most_common_time: String,
    /// Occurrence count per band; bands with zero occurrences are absent
    pub time_distribution: BTreeMap<TimeBand, usize>,
}

impl TimePatterns {
    /// Band with the highest count, resolving ties toward the earlier band
    ///
    /// Empty distribution defaults to [`TimeBand::Evening`].
    pub fn dominant_band(&self) -> TimeBand {
        let mut best: Option<(TimeBand, usize)> = None;
        for (&band, &count) in &self.time_distribution {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((band, count));
            }
        }
        best.map(|(band, _)| band).unwrap_or(TimeBand::Evening)
    }
}

/// Weekly frequency statistics over recent activities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPattern {
    /// Top 3 weekdays by run count, most frequent first
    pub favorite_days: Vec<String>,
    /// Estimated runs per week over the observed date span
    pub runs_per_week: u32,
    /// Run count per weekday present in the input
    pub day_counts: BTreeMap<String, usize>,
}

/// Aggregate performance metrics over recent activities
///
/// Only produced for non-empty input; an absent value is the "no metrics
/// available" case callers must handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_distance_km: f64,
    pub total_time_hours: f64,
    /// Mean pace in minutes per kilometer; 0 when total distance is 0
    pub average_pace_min_per_km: f64,
    pub average_distance_km: f64,
    pub average_duration_min: u32,
    pub longest_run_km: f64,
    pub total_runs: usize,
}

/// The fixed statistics bundle consumed by the recommendation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPatterns {
    pub time_patterns: TimePatterns,
    pub avg_duration: u32,
    pub weekly_pattern: WeeklyPattern,
}

impl TrainingPatterns {
    /// Compute the full statistics bundle for a newest-first activity slice
    pub fn analyze(activities: &[crate::models::ActivityRecord]) -> Self {
        let analyzer = PatternAnalyzer::new();
        Self {
            time_patterns: analyzer.analyze_time_patterns(activities),
            avg_duration: analyzer.calculate_avg_duration(activities),
            weekly_pattern: analyzer.detect_weekly_pattern(activities),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(TimeBand::from_hour(0), TimeBand::EarlyMorning);
        assert_eq!(TimeBand::from_hour(5), TimeBand::EarlyMorning);
        assert_eq!(TimeBand::from_hour(6), TimeBand::Morning);
        assert_eq!(TimeBand::from_hour(11), TimeBand::Morning);
        assert_eq!(TimeBand::from_hour(12), TimeBand::Afternoon);
        assert_eq!(TimeBand::from_hour(16), TimeBand::Afternoon);
        assert_eq!(TimeBand::from_hour(17), TimeBand::Evening);
        assert_eq!(TimeBand::from_hour(20), TimeBand::Evening);
        assert_eq!(TimeBand::from_hour(21), TimeBand::Night);
        assert_eq!(TimeBand::from_hour(23), TimeBand::Night);
    }

    #[test]
    fn test_band_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(TimeBand::EarlyMorning).unwrap(),
            "early_morning"
        );
        assert_eq!(serde_json::to_value(TimeBand::Night).unwrap(), "night");
    }

    #[test]
    fn test_dominant_band_tie_breaks_toward_earlier() {
        let mut dist = BTreeMap::new();
        dist.insert(TimeBand::Morning, 3);
        dist.insert(TimeBand::Evening, 3);
        let patterns = TimePatterns {
            most_common_time: "07:00".to_string(),
            time_distribution: dist,
        };
        assert_eq!(patterns.dominant_band(), TimeBand::Morning);
    }

    #[test]
    fn test_dominant_band_empty_defaults_to_evening() {
        let patterns = TimePatterns {
            most_common_time: "18:00".to_string(),
            time_distribution: BTreeMap::new(),
        };
        assert_eq!(patterns.dominant_band(), TimeBand::Evening);
    }
}
