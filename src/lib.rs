//! Time-sharded series storage over partitioned key-value tables.
//!
//! A logical, unbounded time series is sharded across physical partitions
//! named by calendar bucket (`"{prefix}-2020-01"`, ...). The
//! [`PartitionResolver`] maps timestamps and ranges to partition names, a
//! [`Store`] adapter abstracts the backing hash/range key-value store, and
//! [`TimeSeries`] fans reads and writes out across the partition × tag
//! product, merging and re-limiting results and lazily creating partitions
//! on first write.
//!
//! ```
//! use std::sync::Arc;
//! use timeshard::{Interval, MemoryStore, Order, SeriesConfig, TimeSeries};
//!
//! let config = SeriesConfig::new("metrics").interval(Interval::Daily);
//! let series = TimeSeries::new(Arc::new(MemoryStore::new()), config);
//!
//! series.put("host1:cpu", 1_700_000_000_000, 0.75)?;
//!
//! let tags = vec!["host1:cpu".to_string()];
//! let latest = series.latest(&tags)?;
//! assert!(latest["host1:cpu"].is_some());
//! # Ok::<(), timeshard::Error>(())
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod resolver;
pub mod series;
pub mod store;

pub use codec::{Value, WireValue};
pub use config::SeriesConfig;
pub use error::{Error, Result};
pub use resolver::{Interval, PartitionResolver};
pub use series::{Order, TimeSeries};
pub use store::{CreateOutcome, MemoryStore, Point, Store};
