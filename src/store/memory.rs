//! In-memory store.
//!
//! Reference implementation of the [`Store`](crate::Store) contract. Rows are
//! held in wire form so the value codec runs on every write and read, and
//! partition provisioning can be slowed down (`provisioning_polls`) to
//! exercise the busy/not-ready paths the way a real backend would.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use crate::codec::{self, WireValue};
use crate::error::{Error, Result};
use crate::store::{CreateOutcome, Point, Store};

const DEFAULT_REGION: &str = "local";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Creating { polls_left: u32 },
    Ready,
}

struct Partition {
    status: Status,
    regions: Vec<String>,
    // tag -> timestamp -> wire value; last write wins on the same key
    rows: HashMap<String, BTreeMap<u64, WireValue>>,
    create_calls: u32,
}

/// In-memory [`Store`] with simulated provisioning.
///
/// Fresh partitions start `Creating` and become `Ready` after
/// `provisioning_polls` readiness polls (default 0: ready immediately). The
/// readiness wait is the same bounded delay-times-attempts shape a real
/// adapter would use, just with a short default delay.
pub struct MemoryStore {
    inner: Mutex<HashMap<String, Partition>>,
    provisioning_polls: u32,
    poll_delay: Duration,
    max_poll_attempts: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            provisioning_polls: 0,
            poll_delay: Duration::from_millis(2),
            max_poll_attempts: 30,
        }
    }

    /// Number of readiness polls before a fresh partition becomes ready.
    pub fn provisioning_polls(mut self, polls: u32) -> Self {
        self.provisioning_polls = polls;
        self
    }

    /// Delay between readiness polls.
    pub fn poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    /// Maximum readiness polls per `await_ready` call.
    pub fn poll_budget(mut self, max_attempts: u32) -> Self {
        self.max_poll_attempts = max_attempts;
        self
    }

    /// Region set recorded when the named partition was created.
    pub fn region_set(&self, name: &str) -> Option<Vec<String>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        inner.get(name).map(|p| p.regions.clone())
    }

    /// All partition names, sorted.
    pub fn partition_names(&self) -> Vec<String> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let mut names: Vec<String> = inner.keys().cloned().collect();
        names.sort();
        names
    }

    /// How many times `create_partition` was called for the named partition.
    pub fn create_calls(&self, name: &str) -> u32 {
        let inner = self.inner.lock().expect("store lock poisoned");
        inner.get(name).map(|p| p.create_calls).unwrap_or(0)
    }

    /// Insert a partition that is already ready, bypassing the configured
    /// provisioning delay. Test setup helper.
    pub fn warm_partition(&self, name: &str) {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.entry(name.to_string()).or_insert_with(|| Partition {
            status: Status::Ready,
            regions: vec![DEFAULT_REGION.to_string()],
            rows: HashMap::new(),
            create_calls: 0,
        });
        if let Some(partition) = inner.get_mut(name) {
            partition.status = Status::Ready;
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn create_partition(&self, name: &str, regions: &[String]) -> Result<CreateOutcome> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        if let Some(partition) = inner.get_mut(name) {
            partition.create_calls += 1;
            return Ok(match partition.status {
                Status::Creating { .. } => CreateOutcome::InProgress,
                Status::Ready => CreateOutcome::AlreadyExists,
            });
        }

        let regions = if regions.is_empty() {
            vec![DEFAULT_REGION.to_string()]
        } else {
            regions.to_vec()
        };
        log::info!("creating partition {name} (regions: {regions:?})");
        let status = if self.provisioning_polls == 0 {
            Status::Ready
        } else {
            Status::Creating {
                polls_left: self.provisioning_polls,
            }
        };
        inner.insert(
            name.to_string(),
            Partition {
                status,
                regions,
                rows: HashMap::new(),
                create_calls: 1,
            },
        );
        Ok(CreateOutcome::Created)
    }

    fn await_ready(&self, name: &str) -> Result<()> {
        for attempt in 0..self.max_poll_attempts {
            {
                let mut inner = self.inner.lock().expect("store lock poisoned");
                // A partition that is not visible yet keeps polling: a
                // concurrent creator may be about to insert it.
                if let Some(partition) = inner.get_mut(name) {
                    match partition.status {
                        Status::Ready => return Ok(()),
                        Status::Creating { polls_left } => {
                            let polls_left = polls_left.saturating_sub(1);
                            if polls_left == 0 {
                                partition.status = Status::Ready;
                                return Ok(());
                            }
                            partition.status = Status::Creating { polls_left };
                        }
                    }
                }
            }
            if attempt + 1 < self.max_poll_attempts {
                std::thread::sleep(self.poll_delay);
            }
        }
        Err(Error::PartitionNotReady(name.to_string()))
    }

    fn put(&self, name: &str, point: &Point) -> Result<()> {
        self.put_many(name, std::slice::from_ref(point))
    }

    fn put_many(&self, name: &str, points: &[Point]) -> Result<()> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let partition = inner
            .get_mut(name)
            .ok_or_else(|| Error::PartitionNotFound(name.to_string()))?;
        if let Status::Creating { .. } = partition.status {
            return Err(Error::PartitionBusy(name.to_string()));
        }
        for point in points {
            let raw = codec::encode_point(point);
            partition
                .rows
                .entry(raw.tag)
                .or_default()
                .insert(point.timestamp_ms, raw.value);
        }
        Ok(())
    }

    fn query_range(
        &self,
        name: &str,
        tag: &str,
        start_ms: u64,
        end_ms: u64,
        limit: usize,
        ascending: bool,
    ) -> Result<Vec<Point>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let partition = match inner.get(name) {
            Some(partition) if partition.status == Status::Ready => partition,
            // Missing or still provisioning: defined as no data.
            _ => return Ok(Vec::new()),
        };
        let rows = match partition.rows.get(tag) {
            Some(rows) => rows,
            None => return Ok(Vec::new()),
        };

        let mut points = Vec::new();
        let in_range = rows.range(start_ms..=end_ms);
        let mut push = |(&timestamp_ms, wire): (&u64, &WireValue)| -> Result<bool> {
            points.push(Point {
                tag: tag.to_string(),
                timestamp_ms,
                value: codec::decode(wire)?,
            });
            Ok(limit > 0 && points.len() >= limit)
        };
        if ascending {
            for entry in in_range {
                if push(entry)? {
                    break;
                }
            }
        } else {
            for entry in in_range.rev() {
                if push(entry)? {
                    break;
                }
            }
        }
        Ok(points)
    }

    fn list_partitions(&self, prefix: &str) -> Result<Vec<String>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let mut names: Vec<String> = inner
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect();
        names.sort();
        Ok(names)
    }

    fn default_region(&self) -> String {
        DEFAULT_REGION.to_string()
    }
}
