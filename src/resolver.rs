//! Partition name resolution.
//!
//! Maps timestamps and time ranges to the partition names that cover them,
//! under a configurable calendar bucketing interval. Bucket strings are
//! lexicographically monotonic in time, so sorting partition names sorts
//! partitions by the time window they cover.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const HOUR_MS: u64 = 3_600_000;
const DAY_MS: u64 = 86_400_000;

/// Calendar bucketing interval for partition naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Yearly,
    Monthly,
    Weekly,
    Daily,
    Hourly,
}

impl Interval {
    /// Parse an interval from its lowercase name.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInterval`: the string is not one of the five
    ///   recognized intervals.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "yearly" => Ok(Interval::Yearly),
            "monthly" => Ok(Interval::Monthly),
            "weekly" => Ok(Interval::Weekly),
            "daily" => Ok(Interval::Daily),
            "hourly" => Ok(Interval::Hourly),
            _ => Err(Error::InvalidInterval(format!(
                "{s} (expected yearly, monthly, weekly, daily, or hourly)"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Yearly => "yearly",
            Interval::Monthly => "monthly",
            Interval::Weekly => "weekly",
            Interval::Daily => "daily",
            Interval::Hourly => "hourly",
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves timestamps to partition names under a fixed prefix and interval.
///
/// Pure computation: performs no I/O and has no failure modes.
///
/// # Example
///
/// ```
/// use timeshard::{Interval, PartitionResolver};
///
/// let resolver = PartitionResolver::new("metrics", Interval::Monthly);
/// assert_eq!(resolver.partition_for(1_577_836_800_000), "metrics-2020-01");
/// ```
#[derive(Debug, Clone)]
pub struct PartitionResolver {
    prefix: String,
    interval: Interval,
}

impl PartitionResolver {
    pub fn new(prefix: impl Into<String>, interval: Interval) -> Self {
        Self {
            prefix: prefix.into(),
            interval,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Partition name covering the given timestamp (UTC).
    pub fn partition_for(&self, timestamp_ms: u64) -> String {
        format!("{}-{}", self.prefix, self.bucket(timestamp_ms))
    }

    /// Every partition name touched by `[start_ms, end_ms]`, each at most once.
    ///
    /// Walks bucket boundaries from the start and always includes the bucket
    /// containing `end_ms`, so a half-open boundary walk cannot drop the
    /// final partition. The result is unordered; callers impose ordering.
    pub fn partitions_for_range(&self, start_ms: u64, end_ms: u64) -> Vec<String> {
        let mut names = Vec::new();
        let mut cursor = start_ms;
        while cursor <= end_ms {
            names.push(self.partition_for(cursor));
            let next = self.next_bucket_start(cursor);
            if next <= cursor {
                break;
            }
            cursor = next;
        }
        let last = self.partition_for(end_ms);
        if !names.contains(&last) {
            names.push(last);
        }
        names
    }

    /// Calendar bucket string for a timestamp, per the configured interval.
    fn bucket(&self, timestamp_ms: u64) -> String {
        let days = timestamp_ms / DAY_MS;
        let (year, month, day) = days_to_ymd(days);
        match self.interval {
            Interval::Yearly => format!("{year:04}"),
            Interval::Monthly => format!("{year:04}-{month:02}"),
            Interval::Weekly => {
                // Week of year, Sunday-start, 00-based: days before the
                // year's first Sunday fall in week 00.
                let yday = day_of_year(year, month, day);
                let wday = (days + 4) % 7; // 1970-01-01 was a Thursday
                let week = (yday + 7 - wday) / 7;
                format!("{year:04}-week-{week:02}")
            }
            Interval::Daily => format!("{year:04}-{month:02}-{day:02}"),
            Interval::Hourly => {
                let hour = (timestamp_ms / HOUR_MS) % 24;
                format!("{year:04}-{month:02}-{day:02}-hour-{hour:02}")
            }
        }
    }

    /// Timestamp of the first instant of the bucket after the one containing
    /// `timestamp_ms`.
    ///
    /// Weekly buckets restart at Jan 1, so the next boundary is whichever
    /// comes first: the next Sunday or the next year.
    fn next_bucket_start(&self, timestamp_ms: u64) -> u64 {
        let days = timestamp_ms / DAY_MS;
        let (year, month, _) = days_to_ymd(days);
        match self.interval {
            Interval::Hourly => (timestamp_ms / HOUR_MS + 1) * HOUR_MS,
            Interval::Daily => (days + 1) * DAY_MS,
            Interval::Weekly => {
                let wday = (days + 4) % 7;
                let next_sunday = days + (7 - wday);
                let next_jan1 = ymd_to_days(year + 1, 1, 1);
                next_sunday.min(next_jan1) * DAY_MS
            }
            Interval::Monthly => {
                let (next_year, next_month) = if month == 12 {
                    (year + 1, 1)
                } else {
                    (year, month + 1)
                };
                ymd_to_days(next_year, next_month, 1) * DAY_MS
            }
            Interval::Yearly => ymd_to_days(year + 1, 1, 1) * DAY_MS,
        }
    }
}

fn is_leap_year(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_months(year: u64) -> [u64; 12] {
    if is_leap_year(year) {
        [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    } else {
        [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    }
}

/// Convert days since the Unix epoch to (year, month, day).
fn days_to_ymd(mut days: u64) -> (u64, u64, u64) {
    let mut year = 1970;
    loop {
        let days_in_year = if is_leap_year(year) { 366 } else { 365 };
        if days < days_in_year {
            break;
        }
        days -= days_in_year;
        year += 1;
    }

    let mut month = 1;
    for days_in_month in days_in_months(year) {
        if days < days_in_month {
            break;
        }
        days -= days_in_month;
        month += 1;
    }

    (year, month, days + 1)
}

/// Convert (year, month, day) to days since the Unix epoch.
fn ymd_to_days(year: u64, month: u64, day: u64) -> u64 {
    let mut days = 0;
    for y in 1970..year {
        days += if is_leap_year(y) { 366 } else { 365 };
    }
    for m in 1..month {
        days += days_in_months(year)[(m - 1) as usize];
    }
    days + day - 1
}

/// Day of year, 0-based.
fn day_of_year(year: u64, month: u64, day: u64) -> u64 {
    let mut yday = 0;
    for m in 1..month {
        yday += days_in_months(year)[(m - 1) as usize];
    }
    yday + day - 1
}
