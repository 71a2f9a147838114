use std::sync::Arc;
use std::time::Duration;

use timeshard::{
    Error, Interval, MemoryStore, Order, Point, SeriesConfig, TimeSeries, Value,
};

// 2020-01-01T00:00:00Z
const START_2020: u64 = 1_577_836_800_000;

fn yearly_series(store: Arc<MemoryStore>) -> TimeSeries {
    let config = SeriesConfig::new("t")
        .interval(Interval::Yearly)
        .regions(vec!["us-east-1".to_string(), "eu-west-1".to_string()]);
    TimeSeries::new(store, config)
}

#[test]
fn put_creates_missing_partition_once_and_retries() {
    let store = Arc::new(MemoryStore::new());
    let series = yearly_series(Arc::clone(&store));

    series.put("x", 100, 3.5).expect("put against missing partition");

    // Exactly one create call, and the value survives the wire round trip.
    assert_eq!(store.create_calls("t-1970"), 1);
    let tags = vec!["x".to_string()];
    let resp = series
        .query(&tags, 0, 1000, 0, Order::Ascending)
        .expect("query back");
    assert_eq!(resp["x"], vec![Point::new("x", 100, 3.5)]);
}

#[test]
fn put_waits_out_provisioning_before_writing() {
    let store = Arc::new(
        MemoryStore::new()
            .provisioning_polls(3)
            .poll_delay(Duration::from_millis(1)),
    );
    let series = yearly_series(Arc::clone(&store));

    // First put finds no partition, creates it, waits through the simulated
    // provisioning, and retries exactly once.
    series.put("x", START_2020, 1).expect("put through provisioning");
    let latest = series.latest(&["x".to_string()]).expect("latest");
    assert_eq!(latest["x"], Some(Point::new("x", START_2020, 1)));
}

#[test]
fn put_surfaces_exhausted_poll_budget() {
    let store = Arc::new(
        MemoryStore::new()
            .provisioning_polls(1000)
            .poll_budget(2)
            .poll_delay(Duration::from_millis(1)),
    );
    let series = yearly_series(store);

    let err = series.put("x", START_2020, 1).unwrap_err();
    assert!(matches!(err, Error::PartitionNotReady(_)), "got {err}");
}

#[test]
fn put_records_replication_regions_at_creation() {
    let store = Arc::new(MemoryStore::new());
    let series = yearly_series(Arc::clone(&store));
    series.put("x", START_2020, 1).expect("put");
    assert_eq!(
        store.region_set("t-2020"),
        Some(vec!["us-east-1".to_string(), "eu-west-1".to_string()])
    );
}

#[test]
fn concurrent_writers_converge_on_one_partition() {
    let store = Arc::new(
        MemoryStore::new()
            .provisioning_polls(2)
            .poll_delay(Duration::from_millis(1)),
    );
    let series = Arc::new(yearly_series(Arc::clone(&store)));

    let mut handles = Vec::new();
    for i in 0..8u64 {
        let series = Arc::clone(&series);
        handles.push(std::thread::spawn(move || {
            series.put("x", START_2020 + i, i as i64).expect("concurrent put");
        }));
    }
    for handle in handles {
        handle.join().expect("writer thread");
    }

    assert_eq!(store.partition_names(), vec!["t-2020".to_string()]);
    let tags = vec!["x".to_string()];
    let resp = series
        .query(&tags, START_2020, START_2020 + 10, 0, Order::Ascending)
        .expect("query");
    assert_eq!(resp["x"].len(), 8);
}

#[test]
fn put_batch_writes_groups_independently() {
    // Pre-create t-2019 so its group succeeds; t-2020 cannot finish
    // provisioning within the poll budget, so its group fails. The failure
    // must surface without blocking the healthy group.
    let store = Arc::new(
        MemoryStore::new()
            .provisioning_polls(1000)
            .poll_budget(2)
            .poll_delay(Duration::from_millis(1)),
    );
    store.warm_partition("t-2019");
    let series = yearly_series(Arc::clone(&store));

    let err = series
        .put_batch(vec![
            Point::new("x", 1_577_836_799_999, 1), // t-2019
            Point::new("x", START_2020, 2),        // t-2020, will fail
        ])
        .unwrap_err();
    assert!(matches!(err, Error::PartitionNotReady(_)), "got {err}");

    // The 2019 group landed despite the 2020 failure.
    let tags = vec!["x".to_string()];
    let resp = series
        .query(&tags, 0, 1_577_836_799_999, 0, Order::Ascending)
        .expect("query");
    assert_eq!(resp["x"], vec![Point::new("x", 1_577_836_799_999, 1)]);
}

#[test]
fn put_batch_splits_across_bucket_boundary() {
    let store = Arc::new(MemoryStore::new());
    let series = yearly_series(Arc::clone(&store));

    series
        .put_batch(vec![
            Point::new("x", 1_577_836_799_999, 1.25),
            Point::new("x", START_2020, 2.25),
        ])
        .expect("batch across boundary");

    assert_eq!(
        store.partition_names(),
        vec!["t-2019".to_string(), "t-2020".to_string()]
    );
    let tags = vec!["x".to_string()];
    let resp = series
        .query(&tags, 0, START_2020, 0, Order::Ascending)
        .expect("query");
    let values: Vec<Value> = resp["x"].iter().map(|p| p.value).collect();
    assert_eq!(values, vec![Value::Float(1.25), Value::Float(2.25)]);
}
