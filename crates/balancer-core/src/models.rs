//! Data model for split configurations and parsed video URLs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Traffic-split configuration driving the CDN/origin decision.
///
/// Ratios are relative weights: `cdn_ratio = 9, origin_ratio = 1` sends nine
/// of every ten requests to the CDN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitConfig {
    pub cdn_host: String,
    pub cdn_ratio: u32,
    pub origin_ratio: u32,
    pub is_active: bool,
}

impl SplitConfig {
    /// Length of one round-robin cycle.
    pub fn total_ratio(&self) -> u64 {
        u64::from(self.cdn_ratio) + u64::from(self.origin_ratio)
    }
}

/// Persisted configuration record. At most one record is active at a time;
/// the repository enforces this on create/activate.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigRecord {
    pub id: i32,
    pub cdn_host: String,
    pub cdn_ratio: u32,
    pub origin_ratio: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ConfigRecord {
    /// The split configuration carried by this record.
    pub fn split_config(&self) -> SplitConfig {
        SplitConfig {
            cdn_host: self.cdn_host.clone(),
            cdn_ratio: self.cdn_ratio,
            origin_ratio: self.origin_ratio,
            is_active: self.is_active,
        }
    }
}

/// Fields for creating a new configuration record.
#[derive(Debug, Clone, Deserialize)]
pub struct NewConfig {
    pub cdn_host: String,
    pub cdn_ratio: u32,
    pub origin_ratio: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial update; unset fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigPatch {
    pub cdn_host: Option<String>,
    pub cdn_ratio: Option<u32>,
    pub origin_ratio: Option<u32>,
    pub is_active: Option<bool>,
}

/// Routing-relevant fields extracted from a video URL. Derived immutably,
/// never persisted; the raw input string is kept separately by the caller
/// for the origin fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVideoUrl {
    /// Leading hostname label, e.g. `s1` for `s1.origin-cluster`.
    pub server: String,
    /// URL path, e.g. `/video/1488/xcg2djHckad.m3u8`.
    pub path: String,
    pub hostname: String,
}
