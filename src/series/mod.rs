//! Series orchestration.
//!
//! [`TimeSeries`] composes the partition resolver with a [`Store`] adapter:
//! reads fan out across the partition × tag product and merge back under the
//! caller's limit, writes lazily create the partition they land in. The
//! store is passed in and owned here; there is no process-wide client.

mod fanout;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::codec::Value;
use crate::config::SeriesConfig;
use crate::error::{Error, Result};
use crate::resolver::PartitionResolver;
use crate::store::{CreateOutcome, Point, Store};

/// Result ordering for range queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

/// Partitions known to exist, sorted ascending.
///
/// Appended by the create path, replaced wholesale by a full listing. Only a
/// full listing primes it: a cache holding nothing but our own creations
/// would hide partitions written by earlier processes from the query path.
#[derive(Default)]
struct KnownPartitions {
    names: Vec<String>,
    primed: bool,
}

/// A logical, unbounded time series sharded across time-bucketed partitions.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use timeshard::{Interval, MemoryStore, Order, SeriesConfig, TimeSeries};
///
/// let config = SeriesConfig::new("metrics").interval(Interval::Daily);
/// let series = TimeSeries::new(Arc::new(MemoryStore::new()), config);
///
/// series.put("host1:cpu", 1_700_000_000_000, 0.75)?;
/// let tags = vec!["host1:cpu".to_string()];
/// let results = series.query(
///     &tags,
///     1_699_900_000_000,
///     1_700_000_000_000,
///     0,
///     Order::Descending,
/// )?;
/// assert_eq!(results["host1:cpu"].len(), 1);
/// # Ok::<(), timeshard::Error>(())
/// ```
pub struct TimeSeries {
    store: Arc<dyn Store>,
    resolver: PartitionResolver,
    config: SeriesConfig,
    known: RwLock<KnownPartitions>,
}

impl TimeSeries {
    pub fn new(store: Arc<dyn Store>, config: SeriesConfig) -> Self {
        let resolver = PartitionResolver::new(config.prefix.clone(), config.interval);
        Self {
            store,
            resolver,
            config,
            known: RwLock::new(KnownPartitions::default()),
        }
    }

    pub fn resolver(&self) -> &PartitionResolver {
        &self.resolver
    }

    pub fn config(&self) -> &SeriesConfig {
        &self.config
    }

    /// Query each tag over `[start_ms, end_ms]`.
    ///
    /// One `query_range` per (partition, tag) pair is dispatched through the
    /// bounded pool; each tag's results are concatenated in partition-name
    /// order, which is globally timestamp-ordered because buckets do not
    /// overlap and names sort like timestamps. Per-partition limits
    /// over-fetch by up to `(partitions - 1) × limit`, so the merged
    /// sequence is re-truncated to `limit`. Tags with no data map to empty
    /// vectors, never an error.
    pub fn query(
        &self,
        tags: &[String],
        start_ms: u64,
        end_ms: u64,
        limit: usize,
        order: Order,
    ) -> Result<HashMap<String, Vec<Point>>> {
        if tags.is_empty() {
            return Ok(HashMap::new());
        }

        let mut names = self.resolver.partitions_for_range(start_ms, end_ms);
        {
            // Skip partitions never written. Only an optimization: querying
            // a nonexistent partition is defined to return empty.
            let known = self.known.read().expect("known partitions lock poisoned");
            if known.primed {
                names.retain(|name| known.names.binary_search(name).is_ok());
            }
        }
        names.sort();
        let ascending = matches!(order, Order::Ascending);
        if !ascending {
            names.reverse();
        }

        log::debug!(
            "query fan-out: {} partitions x {} tags, limit {}, {:?}",
            names.len(),
            tags.len(),
            limit,
            order
        );

        let mut jobs = Vec::with_capacity(names.len() * tags.len());
        for name in &names {
            for tag in tags {
                jobs.push((name.clone(), tag.clone()));
            }
        }
        let store = Arc::clone(&self.store);
        let results = fanout::run_bounded(
            jobs,
            self.config.max_concurrency,
            "query-worker",
            move |(name, tag): (String, String)| {
                store.query_range(&name, &tag, start_ms, end_ms, limit, ascending)
            },
        )?;

        let mut resp: HashMap<String, Vec<Point>> =
            tags.iter().map(|tag| (tag.clone(), Vec::new())).collect();
        // Jobs were generated partition-major, so walking results in index
        // order extends each tag in partition order.
        for (index, result) in results.into_iter().enumerate() {
            let tag = &tags[index % tags.len()];
            if let Some(points) = resp.get_mut(tag) {
                points.extend(result?);
            }
        }
        if limit > 0 {
            for points in resp.values_mut() {
                points.truncate(limit);
            }
        }
        Ok(resp)
    }

    /// Write one point, creating its partition on first use.
    ///
    /// A missing partition triggers exactly one create-await-retry cycle; a
    /// busy partition triggers exactly one await-retry cycle. Any further
    /// failure propagates.
    pub fn put(&self, tag: &str, timestamp_ms: u64, value: impl Into<Value>) -> Result<()> {
        let name = self.resolver.partition_for(timestamp_ms);
        let point = Point::new(tag, timestamp_ms, value);
        self.write_with_create(&name, || self.store.put(&name, &point))
    }

    /// Write a batch, grouped by target partition.
    ///
    /// Groups are written independently: one group failing neither rolls
    /// back nor blocks the others. The first failure is returned after every
    /// group has been attempted; later failures are logged.
    pub fn put_batch(&self, points: Vec<Point>) -> Result<()> {
        let mut groups: BTreeMap<String, Vec<Point>> = BTreeMap::new();
        for point in points {
            let name = self.resolver.partition_for(point.timestamp_ms);
            groups.entry(name).or_default().push(point);
        }

        let mut first_failure = None;
        for (name, group) in groups {
            log::info!("writing {} points to {}", group.len(), name);
            if let Err(err) = self.write_with_create(&name, || self.store.put_many(&name, &group)) {
                log::warn!("batch write to {name} failed: {err}");
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
            }
        }
        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Most recent point per tag, across all partitions under the prefix.
    ///
    /// Partitions are listed and scanned most-recent-first; each tag's scan
    /// chain stops at its first hit and chains run concurrently through the
    /// bounded pool. A tag with no data anywhere maps to `None`.
    pub fn latest(&self, tags: &[String]) -> Result<HashMap<String, Option<Point>>> {
        if tags.is_empty() {
            return Ok(HashMap::new());
        }

        let mut names = self.store.list_partitions(&self.config.prefix)?;
        names.sort();
        {
            let mut known = self.known.write().expect("known partitions lock poisoned");
            known.names = names.clone();
            known.primed = true;
        }
        names.reverse();

        let names = Arc::new(names);
        let store = Arc::clone(&self.store);
        let results = fanout::run_bounded(
            tags.to_vec(),
            self.config.max_concurrency,
            "latest-worker",
            move |tag: String| -> Result<Option<Point>> {
                for name in names.iter() {
                    let mut points = store.query_range(name, &tag, 0, u64::MAX, 1, false)?;
                    if let Some(point) = points.pop() {
                        return Ok(Some(point));
                    }
                }
                Ok(None)
            },
        )?;

        let mut resp = HashMap::with_capacity(tags.len());
        for (tag, result) in tags.iter().zip(results) {
            resp.insert(tag.clone(), result?);
        }
        Ok(resp)
    }

    /// Re-list partitions under the prefix and prime the known-partitions
    /// cache with them.
    ///
    /// Until primed (here or by [`TimeSeries::latest`]), `query` fans out to
    /// every candidate partition the resolver names. A primed cache can go
    /// stale if another writer creates partitions; re-prime to pick those up.
    pub fn refresh_partitions(&self) -> Result<Vec<String>> {
        let mut names = self.store.list_partitions(&self.config.prefix)?;
        names.sort();
        let mut known = self.known.write().expect("known partitions lock poisoned");
        known.names = names.clone();
        known.primed = true;
        Ok(names)
    }

    /// Bounded write retry: create-and-await once on a missing partition,
    /// await once on a busy one, then propagate.
    fn write_with_create<F>(&self, name: &str, attempt: F) -> Result<()>
    where
        F: Fn() -> Result<()>,
    {
        let mut created = false;
        let mut waited = false;
        loop {
            match attempt() {
                Ok(()) => return Ok(()),
                Err(Error::PartitionNotFound(_)) if !created => {
                    self.ensure_partition(name)?;
                    created = true;
                }
                Err(Error::PartitionBusy(_)) if !waited => {
                    self.store.await_ready(name)?;
                    waited = true;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Create a partition (idempotently) and wait until it is ready.
    fn ensure_partition(&self, name: &str) -> Result<()> {
        let regions = self.regions();
        match self.store.create_partition(name, &regions)? {
            CreateOutcome::Created => {
                log::info!("created partition {name} (regions: {regions:?})");
            }
            CreateOutcome::AlreadyExists | CreateOutcome::InProgress => {
                log::debug!("partition {name} already exists or is being created");
            }
        }
        self.store.await_ready(name)?;

        let mut known = self.known.write().expect("known partitions lock poisoned");
        if let Err(position) = known.names.binary_search(&name.to_string()) {
            known.names.insert(position, name.to_string());
        }
        Ok(())
    }

    /// Configured region set, falling back to the adapter's default region.
    fn regions(&self) -> Vec<String> {
        if self.config.regions.is_empty() {
            vec![self.store.default_region()]
        } else {
            self.config.regions.clone()
        }
    }
}
