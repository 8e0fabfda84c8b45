// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Deterministic rule-based recommendation engine
//!
//! No I/O, no randomness: identical `(patterns, context)` input always
//! yields an identical recommendation.

use crate::models::{Context, Intensity, Recommendation};

use super::TrainingPatterns;

/// Hour component of an `HH:MM` string; 0 when unparsable
fn parse_hour(time: &str) -> u32 {
    time.split(':')
        .next()
        .and_then(|h| h.parse().ok())
        .unwrap_or(0)
}

/// Rule-based generator of the day's suggested session
pub struct RecommendationEngine;

impl RecommendationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Produce a recommendation from analyzed patterns and current context
    ///
    /// The candidate time is always the most common historical start time;
    /// confidence annotates whether today is a favorite day (0.8) or not
    /// (0.6). A candidate hour already behind the current hour is pushed to
    /// tomorrow. Duration scaling truncates to a whole minute.
    pub fn generate_rule_based_recommendation(
        &self,
        patterns: &TrainingPatterns,
        context: &Context,
    ) -> Recommendation {
        let current_hour = parse_hour(&context.time_now);
        let is_favorite_day = patterns.weekly_pattern.favorite_days.contains(&context.today);

        let most_common_time = &patterns.time_patterns.most_common_time;
        let confidence = if is_favorite_day { 0.8 } else { 0.6 };

        let time = if parse_hour(most_common_time) < current_hour {
            format!("tomorrow {most_common_time}")
        } else {
            most_common_time.clone()
        };

        let insight = format!(
            "You typically run {} times per week, mostly in the {} around {}",
            patterns.weekly_pattern.runs_per_week,
            patterns.time_patterns.dominant_band().label(),
            most_common_time,
        );

        let motivation = if is_favorite_day {
            format!("{} is one of your favorite running days - stay consistent!", context.today)
        } else {
            let usual: Vec<&str> = patterns
                .weekly_pattern
                .favorite_days
                .iter()
                .take(2)
                .map(String::as_str)
                .collect();
            format!("Mix it up today! Your usual days are {}", usual.join(", "))
        };

        let (intensity, duration) = if context.last_run_days_ago > 3 {
            (Intensity::Easy, (patterns.avg_duration as f64 * 0.8) as u32)
        } else if context.last_run_days_ago == 0 {
            (Intensity::Easy, (patterns.avg_duration as f64 * 0.7) as u32)
        } else {
            (Intensity::Moderate, patterns.avg_duration)
        };

        Recommendation {
            time,
            duration,
            intensity,
            insight,
            motivation,
            confidence: Some(confidence),
            ai_used: false,
            model: "rule-based".to_string(),
        }
    }

    /// Static time-of-day-aware suggestion for athletes with no history
    pub fn default_recommendation(&self, context: &Context) -> Recommendation {
        let current_hour = parse_hour(&context.time_now);

        let time = if current_hour < 12 {
            "7:00 AM"
        } else if current_hour < 17 {
            "6:00 PM"
        } else {
            "tomorrow 7:00 AM"
        };

        Recommendation {
            time: time.to_string(),
            duration: 30,
            intensity: Intensity::Moderate,
            insight: "Start with a comfortable 30-minute run".to_string(),
            motivation: "Every journey begins with a single step!".to_string(),
            confidence: None,
            ai_used: false,
            model: "default".to_string(),
        }
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new()
    }
}
