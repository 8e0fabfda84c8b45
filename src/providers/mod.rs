// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Activity sources
//!
//! A source delivers normalized, newest-first running activities. An `Err`
//! from [`ActivitySource::fetch_recent`] means the source could not be
//! consulted at all and the caller must halt; an empty `Ok` is a valid
//! answer that downstream analysis handles with documented defaults.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::ActivityRecord;

pub mod strava;

pub use strava::StravaProvider;

/// Source of normalized running activities
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Fetch up to `limit` recent runs, ordered newest-first
    async fn fetch_recent(&self, limit: usize) -> Result<Vec<ActivityRecord>>;
}
