use std::sync::Arc;

use timeshard::{Interval, MemoryStore, Order, Point, SeriesConfig, TimeSeries, Value};

const DAY_MS: u64 = 86_400_000;
// 2020-01-01T00:00:00Z
const START_2020: u64 = 1_577_836_800_000;

fn daily_series(store: Arc<MemoryStore>) -> TimeSeries {
    let config = SeriesConfig::new("t")
        .interval(Interval::Daily)
        .regions(vec!["us-east-1".to_string()]);
    TimeSeries::new(store, config)
}

#[test]
fn query_merges_partitions_in_timestamp_order() {
    let store = Arc::new(MemoryStore::new());
    let series = daily_series(store);

    // Three points on three consecutive days: three partitions.
    series.put("x", START_2020 + 100, 1).expect("put day 1");
    series.put("x", START_2020 + DAY_MS + 100, 2).expect("put day 2");
    series
        .put("x", START_2020 + 2 * DAY_MS + 100, 3)
        .expect("put day 3");

    let tags = vec!["x".to_string()];
    let asc = series
        .query(&tags, START_2020, START_2020 + 3 * DAY_MS, 0, Order::Ascending)
        .expect("ascending query");
    let values: Vec<Value> = asc["x"].iter().map(|p| p.value).collect();
    assert_eq!(
        values,
        vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]
    );

    let desc = series
        .query(&tags, START_2020, START_2020 + 3 * DAY_MS, 0, Order::Descending)
        .expect("descending query");
    let values: Vec<Value> = desc["x"].iter().map(|p| p.value).collect();
    assert_eq!(
        values,
        vec![Value::Integer(3), Value::Integer(2), Value::Integer(1)]
    );
}

#[test]
fn query_retruncates_after_per_partition_limits() {
    let store = Arc::new(MemoryStore::new());
    let series = daily_series(store);

    // Four partitions, three points each: a per-partition limit of 3 would
    // over-fetch up to 12 rows without the post-merge truncation.
    for day in 0..4u64 {
        for i in 0..3u64 {
            series
                .put("x", START_2020 + day * DAY_MS + i, (day * 10 + i) as i64)
                .expect("put");
        }
    }

    let tags = vec!["x".to_string()];
    let resp = series
        .query(&tags, START_2020, START_2020 + 4 * DAY_MS, 3, Order::Descending)
        .expect("limited query");
    assert_eq!(resp["x"].len(), 3);
    // Most recent three, newest first.
    let values: Vec<Value> = resp["x"].iter().map(|p| p.value).collect();
    assert_eq!(
        values,
        vec![Value::Integer(32), Value::Integer(31), Value::Integer(30)]
    );
}

#[test]
fn query_limit_one_desc_returns_single_most_recent_row() {
    let store = Arc::new(MemoryStore::new());
    let series = daily_series(store);

    // Three existing partitions each holding one row.
    for day in 0..3u64 {
        series
            .put("x", START_2020 + day * DAY_MS, day as i64)
            .expect("put");
    }

    // Prime the cache so the whole-history query fans out to the three
    // partitions that actually exist.
    series.refresh_partitions().expect("refresh");

    let tags = vec!["x".to_string()];
    let resp = series
        .query(&tags, 0, START_2020 + 3 * DAY_MS, 1, Order::Descending)
        .expect("query");
    assert_eq!(resp["x"].len(), 1);
    assert_eq!(resp["x"][0].value, Value::Integer(2));
}

#[test]
fn query_with_no_partitions_returns_empty_per_tag() {
    let store = Arc::new(MemoryStore::new());
    let series = daily_series(store);

    let tags = vec!["x".to_string(), "y".to_string()];
    let resp = series
        .query(&tags, START_2020 - 10 * DAY_MS, START_2020, 10, Order::Descending)
        .expect("query over nothing");
    assert_eq!(resp.len(), 2);
    assert!(resp["x"].is_empty());
    assert!(resp["y"].is_empty());
}

#[test]
fn query_keeps_tags_separate() {
    let store = Arc::new(MemoryStore::new());
    let series = daily_series(store);

    series.put("x", START_2020 + 1, 1.5).expect("put x");
    series.put("y", START_2020 + 2, 2.5).expect("put y");
    series
        .put("y", START_2020 + DAY_MS + 3, 3.5)
        .expect("put y day 2");

    let tags = vec!["x".to_string(), "y".to_string()];
    let resp = series
        .query(&tags, START_2020, START_2020 + 2 * DAY_MS, 0, Order::Ascending)
        .expect("query");
    assert_eq!(resp["x"].len(), 1);
    assert_eq!(resp["y"].len(), 2);
    assert_eq!(resp["x"][0].value, Value::Float(1.5));
    assert_eq!(resp["y"][1].value, Value::Float(3.5));
}

#[test]
fn query_respects_small_concurrency_ceiling() {
    let store = Arc::new(MemoryStore::new());
    let config = SeriesConfig::new("t")
        .interval(Interval::Daily)
        .regions(vec!["us-east-1".to_string()])
        .max_concurrency(2);
    let series = TimeSeries::new(store, config);

    let mut batch = Vec::new();
    for day in 0..10u64 {
        batch.push(Point::new("x", START_2020 + day * DAY_MS, day as i64));
        batch.push(Point::new("y", START_2020 + day * DAY_MS, day as i64));
    }
    series.put_batch(batch).expect("batch");

    // 10 partitions x 2 tags = 20 jobs behind a ceiling of 2.
    let tags = vec!["x".to_string(), "y".to_string()];
    let resp = series
        .query(&tags, START_2020, START_2020 + 10 * DAY_MS, 0, Order::Ascending)
        .expect("query");
    assert_eq!(resp["x"].len(), 10);
    assert_eq!(resp["y"].len(), 10);
    let stamps: Vec<u64> = resp["x"].iter().map(|p| p.timestamp_ms).collect();
    let mut sorted = stamps.clone();
    sorted.sort();
    assert_eq!(stamps, sorted);
}
