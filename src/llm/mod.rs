// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Language-model client abstraction
//!
//! The coach only ever inspects the returned completion text; everything
//! else about the request/response cycle stays behind [`ModelClient`].
//! Failures are a typed result, never an exception crossing the AI/rule
//! boundary.

use async_trait::async_trait;
use thiserror::Error;

pub mod openrouter;

pub use openrouter::OpenRouterClient;

/// Failure modes of a completion request
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no API key configured")]
    MissingCredentials,

    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("model returned an empty response")]
    EmptyResponse,
}

/// Single blocking request/response against a generative model
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Request a completion and return the raw response text
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, ModelError>;
}
