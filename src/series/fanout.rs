//! Bounded worker pool for fan-out dispatch.
//!
//! One pool run per orchestrator call: jobs queue behind a fixed worker
//! ceiling, workers are real threads (the dominant cost is backend network
//! latency), and results come back tagged with their job index so callers
//! merge in dispatch order rather than parsing routing keys.

use std::collections::VecDeque;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use crate::error::{Error, Result};

/// Run `f` over every job with at most `ceiling` worker threads in flight.
///
/// Results are returned in job order. A worker that panics surfaces as
/// `Error::Backend` rather than a missing slot.
pub(crate) fn run_bounded<T, R, F>(jobs: Vec<T>, ceiling: usize, label: &str, f: F) -> Result<Vec<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
{
    let total = jobs.len();
    if total == 0 {
        return Ok(Vec::new());
    }
    let worker_count = ceiling.max(1).min(total);

    let queue: Arc<Mutex<VecDeque<(usize, T)>>> =
        Arc::new(Mutex::new(jobs.into_iter().enumerate().collect()));
    let (tx, rx) = mpsc::channel::<(usize, R)>();
    let f = Arc::new(f);

    let mut handles = Vec::with_capacity(worker_count);
    for worker_id in 0..worker_count {
        let queue = Arc::clone(&queue);
        let tx = tx.clone();
        let f = Arc::clone(&f);
        let handle = thread::Builder::new()
            .name(format!("{label}-{worker_id}"))
            .spawn(move || loop {
                let job = queue.lock().expect("job queue poisoned").pop_front();
                match job {
                    Some((index, job)) => {
                        let _ = tx.send((index, f(job)));
                    }
                    None => break,
                }
            })
            .map_err(|e| Error::Backend(format!("failed to spawn {label} thread: {e}")))?;
        handles.push(handle);
    }
    drop(tx);

    let mut indexed: Vec<(usize, R)> = Vec::with_capacity(total);
    while let Ok(result) = rx.recv() {
        indexed.push(result);
    }
    for handle in handles {
        let _ = handle.join();
    }

    if indexed.len() != total {
        return Err(Error::Backend(format!("{label} worker panicked")));
    }
    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, result)| result).collect())
}
