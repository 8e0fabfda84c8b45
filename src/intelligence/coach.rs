// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! AI coach: model-backed recommendations with mandatory fallback
//!
//! Wraps the rule-based engine behind a best-effort generative-model call.
//! Model failures are logged and recovered locally; no error from the AI
//! path ever reaches the caller. Each invocation makes at most one model
//! call and never retries.

use tracing::{debug, warn};

use crate::config::CoachConfig;
use crate::constants::defaults;
use crate::llm::{ModelClient, OpenRouterClient};
use crate::models::{ActivityRecord, Context, Intensity, ModelRecommendation, Recommendation, WeeklyInsights};

use super::{PatternAnalyzer, RecommendationEngine, TrainingPatterns};

const DAILY_SYSTEM_PROMPT: &str =
    "You are a concise running coach. Analyze patterns and give ONE recommendation.";
const WEEKLY_SYSTEM_PROMPT: &str = "You are a running coach analyzing training patterns.";

/// How many recent runs are shown to the model
const PROMPT_ACTIVITY_LIMIT: usize = 10;

/// Expected shape of a weekly-analysis model response
#[derive(Debug, serde::Deserialize)]
struct InsightsPayload {
    insights: Vec<String>,
}

/// Generative-model-backed coach with a rule-based fallback
pub struct AiCoach {
    client: Option<Box<dyn ModelClient>>,
    model: String,
    fallback_to_rules: bool,
    analyzer: PatternAnalyzer,
    engine: RecommendationEngine,
}

impl AiCoach {
    /// Build a coach over an explicit model client (or none)
    pub fn new(client: Option<Box<dyn ModelClient>>, model: impl Into<String>, fallback_to_rules: bool) -> Self {
        Self {
            client,
            model: model.into(),
            fallback_to_rules,
            analyzer: PatternAnalyzer::new(),
            engine: RecommendationEngine::new(),
        }
    }

    /// Build a coach from configuration
    ///
    /// Without an API key no client is constructed and every operation
    /// short-circuits to its fallback without attempting a call.
    pub fn from_config(config: &CoachConfig) -> Self {
        let client: Option<Box<dyn ModelClient>> = config
            .api_key
            .as_ref()
            .map(|key| Box::new(OpenRouterClient::new(key, &config.model)) as Box<dyn ModelClient>);

        Self::new(client, &config.model, config.fallback_to_rules)
    }

    /// True when a model client is configured
    pub fn ai_available(&self) -> bool {
        self.client.is_some()
    }

    /// Produce today's recommendation, preferring the model when available
    ///
    /// Expects `activities` newest-first. Every path terminates in a valid
    /// recommendation; see the module docs for the fallback policy.
    pub async fn get_daily_recommendation(
        &self,
        activities: &[ActivityRecord],
        context: &Context,
    ) -> Recommendation {
        if activities.is_empty() {
            return self.engine.default_recommendation(context);
        }

        let Some(client) = &self.client else {
            debug!("no model credentials configured, skipping AI call");
            return if self.fallback_to_rules {
                self.rule_based(activities, context)
            } else {
                self.engine.default_recommendation(context)
            };
        };

        let prompt = Self::build_daily_prompt(activities, context);
        match client
            .complete(
                &prompt,
                DAILY_SYSTEM_PROMPT,
                defaults::RECOMMENDATION_TEMPERATURE,
                defaults::RECOMMENDATION_MAX_TOKENS,
            )
            .await
        {
            Ok(content) => match serde_json::from_str::<ModelRecommendation>(&content) {
                Ok(parsed) => parsed.into_recommendation(&self.model),
                Err(_) if self.fallback_to_rules => self.rule_based(activities, context),
                Err(_) => self.parse_text_response(&content),
            },
            Err(err) => {
                warn!("AI API error: {err}");
                if self.fallback_to_rules {
                    self.rule_based(activities, context)
                } else {
                    self.engine.default_recommendation(context)
                }
            }
        }
    }

    /// Ask the model for 3 insights over a day-grouped training summary
    ///
    /// Falls back to the rule-based weekly insights on any failure; this
    /// operation has no way to disable that fallback.
    pub async fn analyze_weekly_patterns(&self, activities: &[ActivityRecord]) -> WeeklyInsights {
        if activities.is_empty() {
            return WeeklyInsights {
                insights: vec!["No activity data available".to_string()],
                ai_used: false,
                model: None,
            };
        }

        let Some(client) = &self.client else {
            debug!("no model credentials configured, using rule-based insights");
            return self.analyzer.generate_weekly_insights(activities);
        };

        let prompt = Self::build_weekly_prompt(activities);
        match client
            .complete(
                &prompt,
                WEEKLY_SYSTEM_PROMPT,
                defaults::ANALYSIS_TEMPERATURE,
                defaults::ANALYSIS_MAX_TOKENS,
            )
            .await
        {
            Ok(content) => match serde_json::from_str::<InsightsPayload>(&content) {
                Ok(payload) => WeeklyInsights {
                    insights: payload.insights,
                    ai_used: true,
                    model: Some(self.model.clone()),
                },
                Err(_) => WeeklyInsights {
                    insights: vec![content.chars().take(200).collect()],
                    ai_used: true,
                    model: Some(self.model.clone()),
                },
            },
            Err(err) => {
                warn!("Weekly analysis error: {err}");
                self.analyzer.generate_weekly_insights(activities)
            }
        }
    }

    /// Analyze and delegate to the deterministic engine
    fn rule_based(&self, activities: &[ActivityRecord], context: &Context) -> Recommendation {
        let patterns = TrainingPatterns::analyze(activities);
        self.engine.generate_rule_based_recommendation(&patterns, context)
    }

    /// Heuristic extraction when the model answers in free text
    ///
    /// Only reached with fallback disabled: keeps the AI tag but fills the
    /// structure from keyword detection and fixed defaults.
    fn parse_text_response(&self, text: &str) -> Recommendation {
        let lowered = text.to_lowercase();
        let time = if lowered.contains("morning") {
            "7:00 AM"
        } else {
            "6:00 PM"
        };

        Recommendation {
            time: time.to_string(),
            duration: 30,
            intensity: Intensity::Moderate,
            insight: text.chars().take(100).collect(),
            motivation: "Keep pushing forward!".to_string(),
            confidence: None,
            ai_used: true,
            model: self.model.clone(),
        }
    }

    /// Compact prompt: the 10 most recent runs plus today's context
    fn build_daily_prompt(activities: &[ActivityRecord], context: &Context) -> String {
        let runs_summary: Vec<String> = activities
            .iter()
            .take(PROMPT_ACTIVITY_LIMIT)
            .map(|run| {
                let day: String = run.weekday.chars().take(3).collect();
                format!(
                    "{day} {} - {}min, {}km",
                    run.start_time, run.duration_minutes, run.distance_km
                )
            })
            .collect();

        format!(
            "Recent runs (newest first):\n{}\n\n\
             Today: {} {}\n\
             Last run: {} days ago\n\n\
             REQUIRED OUTPUT (JSON only):\n\
             {{\n  \"time\": \"HH:MM\",\n  \"duration\": minutes,\n  \
             \"intensity\": \"easy/moderate/hard\",\n  \
             \"insight\": \"data-driven pattern observation\",\n  \
             \"motivation\": \"brief encouragement\"\n}}",
            runs_summary.join("\n"),
            context.today,
            context.time_now,
            context.last_run_days_ago,
        )
    }

    /// Day-grouped summary with up to 3 samples per weekday
    fn build_weekly_prompt(activities: &[ActivityRecord]) -> String {
        let mut by_day: Vec<(String, Vec<String>)> = Vec::new();
        for run in activities {
            let sample = format!("{}min/{}km", run.duration_minutes, run.distance_km);
            match by_day.iter_mut().find(|(day, _)| *day == run.weekday) {
                Some((_, runs)) => runs.push(sample),
                None => by_day.push((run.weekday.clone(), vec![sample])),
            }
        }

        let summary: Vec<String> = by_day
            .into_iter()
            .map(|(day, runs)| {
                let shown: Vec<&str> = runs.iter().take(3).map(String::as_str).collect();
                format!("{day}: {}", shown.join(", "))
            })
            .collect();

        format!(
            "Analyze this runner's weekly patterns:\n{}\n\n\
             Provide 3 specific insights about their training patterns, \
             consistency, and areas for improvement.\n\
             Format: JSON array of strings under \"insights\" key.",
            summary.join("\n"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ModelError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Scripted client returning a fixed outcome and counting calls
    struct ScriptedClient {
        response: Option<String>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedClient {
        fn success(response: &str) -> (Box<dyn ModelClient>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let client = Box::new(Self {
                response: Some(response.to_string()),
                calls: Arc::clone(&calls),
            });
            (client, calls)
        }

        fn failure() -> (Box<dyn ModelClient>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let client = Box::new(Self {
                response: None,
                calls: Arc::clone(&calls),
            });
            (client, calls)
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedClient {
        async fn complete(&self, _: &str, _: &str, _: f32, _: u32) -> Result<String, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Some(text) => Ok(text.clone()),
                None => Err(ModelError::Api {
                    status: 500,
                    body: "backend exploded".to_string(),
                }),
            }
        }
    }

    fn run(date: &str, hour: u8, duration: u32, distance: f64) -> ActivityRecord {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        ActivityRecord {
            date,
            start_time: format!("{hour:02}:00"),
            start_hour: hour,
            weekday: crate::models::weekday_name(date),
            duration_minutes: duration,
            distance_km: distance,
            average_speed: Some(10.0),
        }
    }

    fn sample_history() -> Vec<ActivityRecord> {
        vec![
            run("2024-01-18", 18, 40, 7.5),
            run("2024-01-16", 6, 35, 6.0),
            run("2024-01-11", 18, 45, 8.0),
            run("2024-01-09", 6, 30, 5.5),
        ]
    }

    #[tokio::test]
    async fn test_no_activities_returns_default_without_calling_model() {
        let (client, calls) = ScriptedClient::success("{}");
        let coach = AiCoach::new(Some(client), "test/model", true);
        let context = Context::new("Monday", "09:00", 0);

        let rec = coach.get_daily_recommendation(&[], &context).await;

        assert_eq!(rec.model, "default");
        assert!(!rec.ai_used);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_valid_json_response_is_tagged_ai() {
        let (client, _) = ScriptedClient::success(
            r#"{"time":"06:30","duration":40,"intensity":"easy","insight":"You favor mornings","motivation":"Nice streak"}"#,
        );
        let coach = AiCoach::new(Some(client), "test/model", true);
        let context = Context::new("Tuesday", "09:00", 1);

        let rec = coach.get_daily_recommendation(&sample_history(), &context).await;

        assert!(rec.ai_used);
        assert_eq!(rec.model, "test/model");
        assert_eq!(rec.time, "06:30");
        assert_eq!(rec.duration, 40);
        assert_eq!(rec.intensity, Intensity::Easy);
        assert_eq!(rec.confidence, None);
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_to_rules() {
        let (client, _) = ScriptedClient::failure();
        let coach = AiCoach::new(Some(client), "test/model", true);
        let context = Context::new("Tuesday", "09:00", 1);
        let activities = sample_history();

        let rec = coach.get_daily_recommendation(&activities, &context).await;

        // Must be exactly what the rule-based engine produces directly.
        let patterns = TrainingPatterns::analyze(&activities);
        let expected = RecommendationEngine::new().generate_rule_based_recommendation(&patterns, &context);
        assert_eq!(rec, expected);
        assert!(!rec.ai_used);
        assert_eq!(rec.model, "rule-based");
    }

    #[tokio::test]
    async fn test_model_failure_without_fallback_returns_default() {
        let (client, _) = ScriptedClient::failure();
        let coach = AiCoach::new(Some(client), "test/model", false);
        let context = Context::new("Tuesday", "22:00", 1);

        let rec = coach.get_daily_recommendation(&sample_history(), &context).await;

        assert_eq!(rec.model, "default");
        assert_eq!(rec.time, "tomorrow 7:00 AM");
    }

    #[tokio::test]
    async fn test_text_response_uses_rules_when_fallback_enabled() {
        let (client, _) = ScriptedClient::success("Just run whenever you feel like it");
        let coach = AiCoach::new(Some(client), "test/model", true);
        let context = Context::new("Tuesday", "09:00", 1);

        let rec = coach.get_daily_recommendation(&sample_history(), &context).await;
        assert_eq!(rec.model, "rule-based");
        assert!(!rec.ai_used);
    }

    #[tokio::test]
    async fn test_text_response_heuristic_when_fallback_disabled() {
        let (client, _) = ScriptedClient::success("I think mornings are best for you");
        let coach = AiCoach::new(Some(client), "test/model", false);
        let context = Context::new("Tuesday", "09:00", 1);

        let rec = coach.get_daily_recommendation(&sample_history(), &context).await;

        assert!(rec.ai_used);
        assert_eq!(rec.time, "7:00 AM");
        assert_eq!(rec.duration, 30);
        assert_eq!(rec.intensity, Intensity::Moderate);
        assert_eq!(rec.insight, "I think mornings are best for you");
    }

    #[tokio::test]
    async fn test_no_client_short_circuits_to_rules() {
        let coach = AiCoach::new(None, "test/model", true);
        let context = Context::new("Tuesday", "09:00", 1);

        let rec = coach.get_daily_recommendation(&sample_history(), &context).await;
        assert_eq!(rec.model, "rule-based");
    }

    #[tokio::test]
    async fn test_no_client_without_fallback_returns_default() {
        let coach = AiCoach::new(None, "test/model", false);
        let context = Context::new("Tuesday", "09:00", 1);

        let rec = coach.get_daily_recommendation(&sample_history(), &context).await;
        assert_eq!(rec.model, "default");
    }

    #[tokio::test]
    async fn test_weekly_analysis_parses_insights_json() {
        let (client, _) =
            ScriptedClient::success(r#"{"insights":["You run twice a week","Mostly evenings","Add a long run"]}"#);
        let coach = AiCoach::new(Some(client), "test/model", true);

        let result = coach.analyze_weekly_patterns(&sample_history()).await;

        assert!(result.ai_used);
        assert_eq!(result.model.as_deref(), Some("test/model"));
        assert_eq!(result.insights.len(), 3);
    }

    #[tokio::test]
    async fn test_weekly_analysis_text_response_is_truncated() {
        let long_text = "x".repeat(300);
        let (client, _) = ScriptedClient::success(&long_text);
        let coach = AiCoach::new(Some(client), "test/model", true);

        let result = coach.analyze_weekly_patterns(&sample_history()).await;

        assert!(result.ai_used);
        assert_eq!(result.insights.len(), 1);
        assert_eq!(result.insights[0].chars().count(), 200);
    }

    #[tokio::test]
    async fn test_weekly_analysis_failure_falls_back_unconditionally() {
        let (client, _) = ScriptedClient::failure();
        // fallback_to_rules disabled has no effect on weekly analysis
        let coach = AiCoach::new(Some(client), "test/model", false);

        let result = coach.analyze_weekly_patterns(&sample_history()).await;

        assert!(!result.ai_used);
        assert_eq!(result.model.as_deref(), Some("rule-based"));
        assert!(!result.insights.is_empty());
    }

    #[tokio::test]
    async fn test_weekly_analysis_empty_history() {
        let (client, calls) = ScriptedClient::success("{}");
        let coach = AiCoach::new(Some(client), "test/model", true);

        let result = coach.analyze_weekly_patterns(&[]).await;

        assert_eq!(result.insights, vec!["No activity data available"]);
        assert!(!result.ai_used);
        assert!(result.model.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_daily_prompt_limits_to_ten_runs() {
        let mut activities = Vec::new();
        for day in 1..=14 {
            activities.push(run(&format!("2024-01-{day:02}"), 7, 30, 5.0));
        }
        let context = Context::new("Monday", "09:00", 1);
        let prompt = AiCoach::build_daily_prompt(&activities, &context);

        let run_lines = prompt.lines().filter(|l| l.contains("min,")).count();
        assert_eq!(run_lines, 10);
        assert!(prompt.contains("REQUIRED OUTPUT (JSON only)"));
        assert!(prompt.contains("Last run: 1 days ago"));
    }

    #[test]
    fn test_weekly_prompt_groups_by_day() {
        let activities = vec![
            run("2024-01-16", 6, 35, 6.0),  // Tuesday
            run("2024-01-11", 18, 45, 8.0), // Thursday
            run("2024-01-09", 6, 30, 5.5),  // Tuesday
        ];
        let prompt = AiCoach::build_weekly_prompt(&activities);

        assert!(prompt.contains("Tuesday: 35min/6km, 30min/5.5km"));
        assert!(prompt.contains("Thursday: 45min/8km"));
    }
}
