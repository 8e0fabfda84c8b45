// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Constants Module
//!
//! Application constants and default configuration values. Defaults can be
//! overridden through the configuration file or environment variables.

/// Strava API endpoints
pub mod strava {
    /// Strava REST API base URL
    pub const API_BASE: &str = "https://www.strava.com/api/v3";

    /// Strava OAuth authorization endpoint
    pub const AUTH_URL: &str = "https://www.strava.com/oauth/authorize";

    /// Strava OAuth token endpoint
    pub const TOKEN_URL: &str = "https://www.strava.com/oauth/token";

    /// OAuth scope required to read all activities
    pub const OAUTH_SCOPE: &str = "activity:read_all";

    /// Default local redirect URI for the OAuth callback listener
    pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/callback";
}

/// OpenRouter API endpoints and attribution headers
pub mod openrouter {
    /// OpenRouter API base URL
    pub const API_BASE: &str = "https://openrouter.ai/api/v1";

    /// Referer header sent with every completion request
    pub const HTTP_REFERER: &str = "https://github.com/running-coach";

    /// Application title header sent with every completion request
    pub const APP_TITLE: &str = "Running Coach";
}

/// Default values for the coaching configuration surface
pub mod defaults {
    /// Free-tier model used when none is configured
    pub const MODEL: &str = "meta-llama/llama-3.1-8b-instruct:free";

    /// Fall back to the rule-based engine when the model call fails
    pub const FALLBACK_TO_RULES: bool = true;

    /// Maximum number of recent activities pulled into the analysis window
    pub const MAX_ACTIVITIES_TO_ANALYZE: usize = 15;

    /// Cache validity in hours
    pub const CACHE_DURATION_HOURS: u64 = 24;

    /// Sampling temperature for recommendation requests
    pub const RECOMMENDATION_TEMPERATURE: f32 = 0.2;

    /// Token budget for recommendation requests
    pub const RECOMMENDATION_MAX_TOKENS: u32 = 200;

    /// Sampling temperature for weekly pattern analysis
    pub const ANALYSIS_TEMPERATURE: f32 = 0.3;

    /// Token budget for weekly pattern analysis
    pub const ANALYSIS_MAX_TOKENS: u32 = 150;
}

/// Data files persisted under the platform data directory
pub mod files {
    /// Subdirectory under the platform data dir
    pub const APP_DIR: &str = "running-coach";

    /// OAuth token storage
    pub const TOKENS_FILE: &str = "tokens.json";

    /// Cached activities and recommendation
    pub const CACHE_FILE: &str = "cache.json";
}
