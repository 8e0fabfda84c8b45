// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Command-line interface for the running coach

use anyhow::{bail, Context as _, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::time::Duration;
use tracing::info;

use running_coach::cache::CacheManager;
use running_coach::config::Config;
use running_coach::intelligence::{AiCoach, PatternAnalyzer, RecommendationEngine, TrainingPatterns};
use running_coach::models::{ActivityRecord, Context, Recommendation};
use running_coach::providers::{strava, ActivitySource, StravaProvider};

/// How long the setup flow waits for the browser redirect
const OAUTH_CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Parser, Debug)]
#[command(author, version, about = "AI running coach - daily recommendations from your Strava history")]
struct Args {
    /// Path to an alternate config file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Authorize with Strava (one-time)
    Setup,
    /// Get today's recommendation
    Recommend {
        /// Skip the AI and use rule-based analysis only
        #[arg(long)]
        no_ai: bool,
    },
    /// Weekly pattern analysis
    Analyze,
    /// Show connection and cache status
    Status,
    /// Clear cached data
    ClearCache,
    /// Export cached data to a file
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ExportFormat {
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    running_coach::logging::init_from_env()?;

    let args = Args::parse();
    let config = Config::load(args.config.clone())?;

    match args.command {
        Command::Setup => setup(&config).await,
        Command::Recommend { no_ai } => recommend(&config, !no_ai).await,
        Command::Analyze => analyze(&config).await,
        Command::Status => status(&config),
        Command::ClearCache => {
            cache_manager(&config).clear()?;
            println!("Cache cleared");
            Ok(())
        }
        Command::Export { format } => export(&config, format),
    }
}

fn cache_manager(config: &Config) -> CacheManager {
    CacheManager::with_default_path(config.coach.cache_duration_hours)
}

/// One-time Strava OAuth flow through a local callback listener
async fn setup(config: &Config) -> Result<()> {
    println!("Running Coach setup");
    println!("{}", "=".repeat(50));

    if !config.strava.is_configured() {
        bail!("Missing Strava credentials. Set STRAVA_CLIENT_ID and STRAVA_CLIENT_SECRET");
    }
    if config.coach.api_key.is_none() {
        println!("No OpenRouter API key found - recommendations will be rule-based only");
    }

    let provider = StravaProvider::from_config(&config.strava)?;
    let (auth_url, state) = provider.authorization_url()?;

    let redirect = url::Url::parse(config.strava.redirect_uri()).context("Invalid redirect URI")?;
    let port = redirect.port().unwrap_or(8080);

    println!("\nOpen this URL in your browser to authorize:");
    println!("\n  {auth_url}\n");
    println!("Waiting for authorization...");

    let code = strava::wait_for_callback(port, state, OAUTH_CALLBACK_TIMEOUT).await?;
    provider.exchange_code(&code).await?;

    println!("Setup complete. You can now run `running-coach recommend`.");
    Ok(())
}

/// Fetch activities, preferring a still-valid cache
async fn fetch_activities(config: &Config) -> Result<(Vec<ActivityRecord>, bool)> {
    let cache = cache_manager(config);
    if let Some(entry) = cache.load() {
        info!("Using cached activity data");
        return Ok((entry.activities, true));
    }

    info!("Fetching fresh data from Strava");
    let provider = StravaProvider::from_config(&config.strava)?;
    let activities = provider
        .fetch_recent(config.coach.max_activities)
        .await
        .context("Failed to fetch Strava data. Try running `running-coach setup` again")?;

    Ok((activities, false))
}

async fn recommend(config: &Config, use_ai: bool) -> Result<()> {
    println!("Today's running recommendation");
    println!("{}", "=".repeat(50));

    let cache = cache_manager(config);

    let (activities, recommendation, from_cache) = match cache.load() {
        Some(entry) if entry.recommendation.is_some() => {
            let recommendation = entry.recommendation.unwrap();
            (entry.activities, recommendation, true)
        }
        _ => {
            let (activities, _) = fetch_activities(config).await?;
            let context = Context::capture(&activities);

            let recommendation = if use_ai {
                let coach = AiCoach::from_config(&config.coach);
                coach.get_daily_recommendation(&activities, &context).await
            } else {
                // Rule-based only, no AI path at all
                if activities.is_empty() {
                    RecommendationEngine::new().default_recommendation(&context)
                } else {
                    let patterns = TrainingPatterns::analyze(&activities);
                    RecommendationEngine::new().generate_rule_based_recommendation(&patterns, &context)
                }
            };

            cache.save(&activities, Some(&recommendation))?;
            (activities, recommendation, false)
        }
    };

    display_recommendation(&recommendation, &activities, from_cache);
    Ok(())
}

async fn analyze(config: &Config) -> Result<()> {
    println!("Weekly pattern analysis");
    println!("{}", "=".repeat(50));

    let (activities, _) = fetch_activities(config).await?;

    let coach = AiCoach::from_config(&config.coach);
    let insights = coach.analyze_weekly_patterns(&activities).await;

    let analyzer = PatternAnalyzer::new();
    if let Some(metrics) = analyzer.calculate_performance_metrics(&activities) {
        println!("\nPerformance summary ({} runs analyzed):", activities.len());
        println!("  Total distance: {} km", metrics.total_distance_km);
        println!("  Total time: {} hours", metrics.total_time_hours);
        println!("  Average pace: {:.1} min/km", metrics.average_pace_min_per_km);
        println!(
            "  Average run: {} km in {} minutes",
            metrics.average_distance_km, metrics.average_duration_min
        );
    } else {
        println!("\nNo activities to summarize yet.");
    }

    println!("\nInsights:");
    for (i, insight) in insights.insights.iter().enumerate() {
        println!("  {}. {insight}", i + 1);
    }

    if insights.ai_used {
        println!("\nAnalysis by: {}", insights.model.as_deref().unwrap_or("AI"));
    } else {
        println!("\nAnalysis: rule-based");
    }

    Ok(())
}

fn status(config: &Config) -> Result<()> {
    println!("Running Coach status");
    println!("{}", "=".repeat(50));

    let connected = StravaProvider::from_config(&config.strava)
        .map(|p| p.is_connected())
        .unwrap_or(false);
    println!("Strava connected: {}", if connected { "yes" } else { "no" });
    println!(
        "AI configured: {}",
        if config.coach.api_key.is_some() {
            "yes"
        } else {
            "no (rule-based only)"
        }
    );
    println!("Model: {}", config.coach.model);

    match cache_manager(config).load() {
        Some(entry) => println!("Cache valid: yes (expires in {} hours)", entry.hours_left()),
        None => println!("Cache valid: no"),
    }

    Ok(())
}

fn export(config: &Config, format: ExportFormat) -> Result<()> {
    let entry = cache_manager(config)
        .load()
        .context("No data to export. Run `running-coach recommend` first")?;

    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    match format {
        ExportFormat::Json => {
            let filename = format!("running_data_{timestamp}.json");
            std::fs::write(&filename, serde_json::to_string_pretty(&entry)?)?;
            println!("Data exported to {filename}");
        }
    }

    Ok(())
}

fn display_recommendation(recommendation: &Recommendation, activities: &[ActivityRecord], from_cache: bool) {
    let analyzer = PatternAnalyzer::new();

    if !activities.is_empty() {
        let recent = &activities[..activities.len().min(10)];
        let pattern = analyzer.detect_weekly_pattern(activities);
        let time_patterns = analyzer.analyze_time_patterns(activities);

        println!("\nQuick analysis:");
        let usual: Vec<&str> = pattern.favorite_days.iter().take(2).map(String::as_str).collect();
        println!("  - You typically run {}", usual.join(", "));
        if let Some(metrics) = analyzer.calculate_performance_metrics(recent) {
            println!("  - Average duration: {} minutes", metrics.average_duration_min);
        }
        println!("  - Best performance: around {}", time_patterns.most_common_time);
    }

    println!("\nToday's recommendation:");
    println!("  Time:      {}", recommendation.time);
    println!("  Duration:  {} minutes", recommendation.duration);
    println!("  Intensity: {} pace", recommendation.intensity);

    println!("\nInsight: \"{}\"", recommendation.insight);
    println!("Motivation: \"{}\"", recommendation.motivation);

    if from_cache {
        println!("\nUsing cached data (saves API calls)");
    }

    if recommendation.ai_used {
        println!("Powered by: {}", recommendation.model);
    } else {
        println!("Analysis: rule-based (no AI)");
    }
}
