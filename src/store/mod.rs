//! Store adapter boundary.
//!
//! The backing key-value store is an external collaborator. This module pins
//! down the minimum capability set the orchestrator needs from it: idempotent
//! partition creation, a bounded readiness wait, keyed writes, range queries,
//! and partition listing. Concrete wire protocols live behind [`Store`]
//! implementations; [`MemoryStore`] is the in-process reference.

mod memory;

pub use memory::MemoryStore;

use crate::codec::Value;
use crate::error::Result;

/// One sample in a series: `(tag, timestamp_ms)` is the uniqueness key
/// within a partition, and writing it again overwrites the prior value.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub tag: String,
    pub timestamp_ms: u64,
    pub value: Value,
}

impl Point {
    pub fn new(tag: impl Into<String>, timestamp_ms: u64, value: impl Into<Value>) -> Self {
        Self {
            tag: tag.into(),
            timestamp_ms,
            value: value.into(),
        }
    }
}

/// Outcome of a partition creation attempt.
///
/// `AlreadyExists` and `InProgress` are not failures: creation is idempotent
/// and concurrent creators converge on the same ready partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
    InProgress,
}

/// Capability interface over the backing store.
///
/// Implementations must be shareable across the orchestrator's worker
/// threads, hence `Send + Sync`.
pub trait Store: Send + Sync {
    /// Create a partition replicated to `regions`, or observe that it
    /// already exists or is mid-creation. Never a hard failure for a
    /// concurrent creator. An empty region set means the adapter's default
    /// region.
    fn create_partition(&self, name: &str, regions: &[String]) -> Result<CreateOutcome>;

    /// Block until the partition is queryable and writable.
    ///
    /// Polls with a fixed delay up to a fixed attempt budget; exhausting the
    /// budget fails with `Error::PartitionNotReady`.
    fn await_ready(&self, name: &str) -> Result<()>;

    /// Write one point.
    ///
    /// # Errors
    ///
    /// - `Error::PartitionNotFound`: the partition does not exist
    /// - `Error::PartitionBusy`: the partition is mid-provisioning
    fn put(&self, name: &str, point: &Point) -> Result<()>;

    /// Write a batch of points. Not atomic: partial application on failure
    /// is acceptable, but the failure must surface. Same error modes as
    /// [`Store::put`].
    fn put_many(&self, name: &str, points: &[Point]) -> Result<()>;

    /// Points for `tag` with timestamps in `[start_ms, end_ms]`, ordered by
    /// timestamp per `ascending`, at most `limit` of them when `limit > 0`.
    ///
    /// A missing partition is an empty result, not an error: it usually
    /// means the caller asked about a window that predates any data. Any
    /// backend pagination is resolved internally; callers receive the fully
    /// materialized sequence.
    fn query_range(
        &self,
        name: &str,
        tag: &str,
        start_ms: u64,
        end_ms: u64,
        limit: usize,
        ascending: bool,
    ) -> Result<Vec<Point>>;

    /// Names of all partitions whose name starts with `prefix`.
    fn list_partitions(&self, prefix: &str) -> Result<Vec<String>>;

    /// Region writes land in when the caller configures none.
    fn default_region(&self) -> String;
}
