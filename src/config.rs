//! Series configuration.

use serde::{Deserialize, Serialize};

use crate::resolver::Interval;

/// Environment override for the default region set: a comma-separated list
/// of region identifiers.
pub const REGIONS_ENV: &str = "TIMESHARD_REGIONS";

pub const DEFAULT_MAX_CONCURRENCY: usize = 100;

/// Configuration for a [`TimeSeries`](crate::TimeSeries).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Partition name prefix; partitions are named `"{prefix}-{bucket}"`.
    pub prefix: String,

    /// Bucketing interval.
    /// Default: monthly
    #[serde(default = "default_interval")]
    pub interval: Interval,

    /// Regions partitions are replicated to at creation time.
    /// Default: the `TIMESHARD_REGIONS` environment list, else empty
    /// (empty means the adapter's default region).
    #[serde(default)]
    pub regions: Vec<String>,

    /// Ceiling on simultaneously in-flight store operations during fan-out.
    /// Default: 100
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl SeriesConfig {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            interval: Interval::Monthly,
            regions: regions_from_env().unwrap_or_default(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    pub fn regions(mut self, regions: Vec<String>) -> Self {
        self.regions = regions;
        self
    }

    pub fn max_concurrency(mut self, ceiling: usize) -> Self {
        self.max_concurrency = ceiling;
        self
    }
}

/// Region list from `TIMESHARD_REGIONS`, if set and non-empty.
pub fn regions_from_env() -> Option<Vec<String>> {
    let raw = std::env::var(REGIONS_ENV).ok()?;
    let regions: Vec<String> = raw
        .split(',')
        .map(|region| region.trim().to_string())
        .filter(|region| !region.is_empty())
        .collect();
    if regions.is_empty() {
        None
    } else {
        Some(regions)
    }
}

fn default_interval() -> Interval {
    Interval::Monthly
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}
