// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Descriptive statistics over running history
//!
//! Every operation is a pure function of its input slice and degrades to a
//! documented default on empty input rather than failing. Rounding is
//! nearest with halves away from zero (`f64::round`); mode computations
//! break ties by first-encountered input order.

use std::collections::BTreeMap;

use crate::models::{ActivityRecord, WeeklyInsights};

use super::{PerformanceMetrics, TimeBand, TimePatterns, WeeklyPattern};

/// Round to one decimal place
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Pure statistics component over activity history
pub struct PatternAnalyzer;

impl PatternAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Bucket start hours into time-of-day bands and find the most frequent
    /// exact hour
    ///
    /// Empty input defaults to `18:00` with an empty distribution.
    pub fn analyze_time_patterns(&self, activities: &[ActivityRecord]) -> TimePatterns {
        if activities.is_empty() {
            return TimePatterns {
                most_common_time: "18:00".to_string(),
                time_distribution: BTreeMap::new(),
            };
        }

        let mut hour_counts = [0usize; 24];
        let mut time_distribution: BTreeMap<TimeBand, usize> = BTreeMap::new();
        for activity in activities {
            let hour = (activity.start_hour % 24) as usize;
            hour_counts[hour] += 1;
            *time_distribution.entry(TimeBand::from_hour(activity.start_hour)).or_insert(0) += 1;
        }

        // Stable mode: scanning in input order keeps the first-encountered
        // hour on ties.
        let mut most_common_hour = 18u8;
        let mut best_count = 0usize;
        for activity in activities {
            let count = hour_counts[(activity.start_hour % 24) as usize];
            if count > best_count {
                best_count = count;
                most_common_hour = activity.start_hour;
            }
        }

        TimePatterns {
            most_common_time: format!("{most_common_hour:02}:00"),
            time_distribution,
        }
    }

    /// Mean duration in minutes, rounded; empty input defaults to 30
    pub fn calculate_avg_duration(&self, activities: &[ActivityRecord]) -> u32 {
        if activities.is_empty() {
            return 30;
        }

        let total: u64 = activities.iter().map(|a| a.duration_minutes as u64).sum();
        (total as f64 / activities.len() as f64).round() as u32
    }

    /// Weekday frequency and estimated runs per week
    ///
    /// `runs_per_week` divides the run count by the observed date span in
    /// weeks, where the span is `(max date - min date) + 1` days. Empty
    /// input defaults to Tuesday/Thursday at 3 runs per week.
    pub fn detect_weekly_pattern(&self, activities: &[ActivityRecord]) -> WeeklyPattern {
        if activities.is_empty() {
            return WeeklyPattern {
                favorite_days: vec!["Tuesday".to_string(), "Thursday".to_string()],
                runs_per_week: 3,
                day_counts: BTreeMap::new(),
            };
        }

        // Counted in first-encountered order so the stable sort below keeps
        // that order on ties.
        let mut ordered_counts: Vec<(String, usize)> = Vec::new();
        for activity in activities {
            match ordered_counts.iter_mut().find(|(day, _)| *day == activity.weekday) {
                Some((_, count)) => *count += 1,
                None => ordered_counts.push((activity.weekday.clone(), 1)),
            }
        }

        let mut sorted = ordered_counts.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        let favorite_days: Vec<String> = sorted.into_iter().take(3).map(|(day, _)| day).collect();

        let min_date = activities.iter().map(|a| a.date).min().unwrap_or_default();
        let max_date = activities.iter().map(|a| a.date).max().unwrap_or_default();
        let span_days = (max_date - min_date).num_days() + 1;
        let runs_per_week = if span_days > 0 {
            let weeks = span_days as f64 / 7.0;
            (activities.len() as f64 / weeks).round() as u32
        } else {
            activities.len() as u32
        };

        WeeklyPattern {
            favorite_days,
            runs_per_week,
            day_counts: ordered_counts.into_iter().collect(),
        }
    }

    /// Aggregate distance, time, and pace metrics; `None` on empty input
    pub fn calculate_performance_metrics(&self, activities: &[ActivityRecord]) -> Option<PerformanceMetrics> {
        if activities.is_empty() {
            return None;
        }

        let total_distance: f64 = activities.iter().map(|a| a.distance_km).sum();
        let total_minutes: u64 = activities.iter().map(|a| a.duration_minutes as u64).sum();

        let average_pace = if total_distance > 0.0 {
            total_minutes as f64 / total_distance
        } else {
            0.0
        };

        let count = activities.len();
        let longest = activities.iter().map(|a| a.distance_km).fold(0.0f64, f64::max);

        Some(PerformanceMetrics {
            total_distance_km: round1(total_distance),
            total_time_hours: round1(total_minutes as f64 / 60.0),
            average_pace_min_per_km: round1(average_pace),
            average_distance_km: round1(total_distance / count as f64),
            average_duration_min: (total_minutes as f64 / count as f64).round() as u32,
            longest_run_km: round1(longest),
            total_runs: count,
        })
    }

    /// Compose up to 3 human-readable observations from the metrics above
    ///
    /// Always rule-based; this is the last-resort fallback for the weekly
    /// analysis operation.
    pub fn generate_weekly_insights(&self, activities: &[ActivityRecord]) -> WeeklyInsights {
        let metrics = self.calculate_performance_metrics(activities);
        let pattern = self.detect_weekly_pattern(activities);

        let mut insights = Vec::new();

        if let Some(metrics) = &metrics {
            insights.push(format!(
                "You've completed {} runs totaling {:.1}km in {:.1} hours",
                metrics.total_runs, metrics.total_distance_km, metrics.total_time_hours
            ));
        }

        if !pattern.favorite_days.is_empty() {
            let days: Vec<&str> = pattern.favorite_days.iter().take(2).map(String::as_str).collect();
            insights.push(format!(
                "Your most consistent running days are {}",
                days.join(" and ")
            ));
        }

        if let Some(metrics) = &metrics {
            if metrics.average_pace_min_per_km > 0.0 {
                let pace = metrics.average_pace_min_per_km;
                let mins = pace as u32;
                let secs = ((pace - mins as f64) * 60.0) as u32;
                insights.push(format!("Your average pace is {mins}:{secs:02} per kilometer"));
            }
        }

        insights.truncate(3);

        WeeklyInsights {
            insights,
            ai_used: false,
            model: Some("rule-based".to_string()),
        }
    }
}

impl Default for PatternAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn run(date: &str, hour: u8, minute: u8, duration: u32, distance: f64) -> ActivityRecord {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        ActivityRecord {
            date,
            start_time: format!("{hour:02}:{minute:02}"),
            start_hour: hour,
            weekday: crate::models::weekday_name(date),
            duration_minutes: duration,
            distance_km: distance,
            average_speed: None,
        }
    }

    /// Three weeks of runs, newest first: Tuesdays at 06:xx and Thursdays
    /// at 18:xx, plus one Saturday long run.
    fn sample_history() -> Vec<ActivityRecord> {
        vec![
            run("2024-01-20", 9, 30, 60, 12.0), // Saturday
            run("2024-01-18", 18, 5, 40, 7.5),  // Thursday
            run("2024-01-16", 6, 45, 35, 6.0),  // Tuesday
            run("2024-01-11", 18, 0, 45, 8.0),  // Thursday
            run("2024-01-09", 6, 30, 30, 5.5),  // Tuesday
            run("2024-01-04", 18, 10, 42, 7.8), // Thursday
            run("2024-01-02", 6, 50, 33, 6.2),  // Tuesday
        ]
    }

    #[test]
    fn test_time_patterns_empty_defaults() {
        let analyzer = PatternAnalyzer::new();
        let patterns = analyzer.analyze_time_patterns(&[]);
        assert_eq!(patterns.most_common_time, "18:00");
        assert!(patterns.time_distribution.is_empty());
    }

    #[test]
    fn test_band_counts_sum_to_input_length() {
        let analyzer = PatternAnalyzer::new();
        let activities = sample_history();
        let patterns = analyzer.analyze_time_patterns(&activities);
        let total: usize = patterns.time_distribution.values().sum();
        assert_eq!(total, activities.len());
    }

    #[test]
    fn test_most_common_hour() {
        let analyzer = PatternAnalyzer::new();
        let patterns = analyzer.analyze_time_patterns(&sample_history());
        // 18:00 appears three times, 06:00 three times; 18 is encountered
        // first in the newest-first input after the strict-greater scan.
        assert_eq!(patterns.most_common_time, "18:00");
        assert_eq!(patterns.time_distribution[&TimeBand::Evening], 3);
        assert_eq!(patterns.time_distribution[&TimeBand::Morning], 4);
    }

    #[test]
    fn test_most_common_hour_tie_breaks_first_encountered() {
        let analyzer = PatternAnalyzer::new();
        let activities = vec![
            run("2024-01-10", 7, 0, 30, 5.0),
            run("2024-01-09", 19, 0, 30, 5.0),
            run("2024-01-08", 7, 0, 30, 5.0),
            run("2024-01-07", 19, 0, 30, 5.0),
        ];
        let patterns = analyzer.analyze_time_patterns(&activities);
        assert_eq!(patterns.most_common_time, "07:00");
    }

    #[test]
    fn test_avg_duration_empty_is_30() {
        let analyzer = PatternAnalyzer::new();
        assert_eq!(analyzer.calculate_avg_duration(&[]), 30);
    }

    #[test]
    fn test_avg_duration_rounds_mean() {
        let analyzer = PatternAnalyzer::new();
        let activities = vec![
            run("2024-01-03", 7, 0, 30, 5.0),
            run("2024-01-02", 7, 0, 31, 5.0),
            run("2024-01-01", 7, 0, 31, 5.0),
        ];
        // mean 30.666... rounds to 31
        assert_eq!(analyzer.calculate_avg_duration(&activities), 31);
    }

    #[test]
    fn test_weekly_pattern_empty_defaults() {
        let analyzer = PatternAnalyzer::new();
        let pattern = analyzer.detect_weekly_pattern(&[]);
        assert_eq!(pattern.favorite_days, vec!["Tuesday", "Thursday"]);
        assert_eq!(pattern.runs_per_week, 3);
        assert!(pattern.day_counts.is_empty());
    }

    #[test]
    fn test_favorite_days_bounded_and_subset() {
        let analyzer = PatternAnalyzer::new();
        let activities = sample_history();
        let pattern = analyzer.detect_weekly_pattern(&activities);

        assert!(pattern.favorite_days.len() <= 3);
        for day in &pattern.favorite_days {
            assert!(activities.iter().any(|a| &a.weekday == day), "{day} not in input");
        }
        // Thursday and Tuesday each have 3 runs; Thursday is encountered
        // first in the newest-first input (after the Saturday one-off).
        assert_eq!(pattern.favorite_days[0], "Thursday");
        assert_eq!(pattern.favorite_days[1], "Tuesday");
        assert_eq!(pattern.favorite_days[2], "Saturday");
    }

    #[test]
    fn test_runs_per_week_over_span() {
        let analyzer = PatternAnalyzer::new();
        // 7 runs over a 19-day span: 7 / (19/7) = 2.58 -> 3
        let pattern = analyzer.detect_weekly_pattern(&sample_history());
        assert_eq!(pattern.runs_per_week, 3);
    }

    #[test]
    fn test_runs_per_week_single_day_span() {
        let analyzer = PatternAnalyzer::new();
        let activities = vec![run("2024-01-02", 7, 0, 30, 5.0), run("2024-01-02", 18, 0, 20, 3.0)];
        // span is 1 day -> 2 / (1/7) = 14
        let pattern = analyzer.detect_weekly_pattern(&activities);
        assert_eq!(pattern.runs_per_week, 14);
    }

    #[test]
    fn test_performance_metrics_empty_is_none() {
        let analyzer = PatternAnalyzer::new();
        assert!(analyzer.calculate_performance_metrics(&[]).is_none());
    }

    #[test]
    fn test_performance_metrics_values() {
        let analyzer = PatternAnalyzer::new();
        let activities = vec![
            run("2024-01-03", 7, 0, 30, 5.0),
            run("2024-01-01", 7, 0, 60, 10.0),
        ];
        let metrics = analyzer.calculate_performance_metrics(&activities).unwrap();

        assert_eq!(metrics.total_runs, 2);
        assert_eq!(metrics.total_distance_km, 15.0);
        assert_eq!(metrics.total_time_hours, 1.5);
        assert_eq!(metrics.average_pace_min_per_km, 6.0);
        assert_eq!(metrics.average_distance_km, 7.5);
        assert_eq!(metrics.average_duration_min, 45);
        assert_eq!(metrics.longest_run_km, 10.0);
    }

    #[test]
    fn test_pace_zero_when_no_distance() {
        let analyzer = PatternAnalyzer::new();
        let activities = vec![run("2024-01-01", 7, 0, 30, 0.0)];
        let metrics = analyzer.calculate_performance_metrics(&activities).unwrap();
        assert_eq!(metrics.average_pace_min_per_km, 0.0);
    }

    #[test]
    fn test_weekly_insights_rule_based() {
        let analyzer = PatternAnalyzer::new();
        let insights = analyzer.generate_weekly_insights(&sample_history());

        assert!(insights.insights.len() <= 3);
        assert!(!insights.ai_used);
        assert_eq!(insights.model.as_deref(), Some("rule-based"));
        assert!(insights.insights[0].contains("7 runs"));
        assert!(insights.insights[1].contains("Thursday and Tuesday"));
    }

    #[test]
    fn test_weekly_insights_pace_format() {
        let analyzer = PatternAnalyzer::new();
        // 33 minutes over 6.0 km: 5.5 min/km -> "5:30 per kilometer"
        let activities = vec![run("2024-01-01", 7, 0, 33, 6.0)];
        let insights = analyzer.generate_weekly_insights(&activities);
        assert!(insights
            .insights
            .iter()
            .any(|i| i.contains("5:30 per kilometer")));
    }
}
