// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Running Coach
//!
//! An AI-powered running coach that turns Strava activity history into a
//! single actionable daily recommendation: when to run, for how long, and at
//! what intensity.
//!
//! ## Features
//!
//! - **Pattern analysis**: time-of-day, weekly frequency, and performance
//!   statistics over recent runs
//! - **Rule-based recommendations**: deterministic engine that works with
//!   zero external dependencies
//! - **AI coaching**: optional LLM-backed recommendations via OpenRouter,
//!   with mandatory fallback to the rule-based engine
//! - **Strava integration**: OAuth2 authentication and activity retrieval
//! - **Response caching**: TTL-based cache to conserve API quota
//!
//! ## Architecture
//!
//! The crate follows a modular architecture:
//! - **Providers**: activity sources (Strava) normalized to a common model
//! - **Intelligence**: pattern analyzer, recommendation engine, AI coach
//! - **LLM**: model client abstraction and OpenRouter implementation
//! - **Cache**: TTL-based persistence of fetched data and recommendations
//! - **Config**: configuration management and persistence
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use running_coach::intelligence::AiCoach;
//! use running_coach::models::Context;
//! use running_coach::providers::{ActivitySource, StravaProvider};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = running_coach::config::Config::load(None)?;
//!
//!     let provider = StravaProvider::from_config(&config.strava)?;
//!     let activities = provider.fetch_recent(config.coach.max_activities).await?;
//!
//!     let context = Context::capture(&activities);
//!     let coach = AiCoach::from_config(&config.coach);
//!     let recommendation = coach.get_daily_recommendation(&activities, &context).await;
//!
//!     println!("Run at {} for {} minutes", recommendation.time, recommendation.duration);
//!     Ok(())
//! }
//! ```

/// Activity source implementations (Strava)
pub mod providers;

/// Common data models for activities, context, and recommendations
pub mod models;

/// Configuration management and persistence
pub mod config;

/// Application constants and default values
pub mod constants;

/// Language-model client abstraction and OpenRouter implementation
pub mod llm;

/// Pattern analysis and recommendation generation
pub mod intelligence;

/// TTL-based cache for activity data and recommendations
pub mod cache;

/// Production logging and structured output
pub mod logging;
