//! Bounded fan-out and per-call deadlines.

use futures::future::join_all;
use std::future::Future;
use std::time::Duration;

use crate::error::{LogError, LogResult};

/// Runs work in sequential batches of at most `batch_size` concurrent futures.
///
/// A batch must settle completely before the next one starts.
#[derive(Debug, Clone, Copy)]
pub struct BatchRunner {
    batch_size: usize,
}

impl BatchRunner {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Apply `f` to every item; results keep input order.
    pub async fn run<I, F, Fut>(&self, items: I, mut f: F) -> Vec<Fut::Output>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future,
    {
        let mut items = items.into_iter();
        let mut results = Vec::new();
        loop {
            let batch: Vec<Fut> = items.by_ref().take(self.batch_size).map(&mut f).collect();
            if batch.is_empty() {
                break;
            }
            results.extend(join_all(batch).await);
        }
        results
    }
}

/// Await `fut`, failing with `LogError::Timeout` once `limit` elapses.
pub async fn with_deadline<T>(
    limit: Duration,
    operation: &str,
    fut: impl Future<Output = LogResult<T>>,
) -> LogResult<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, secs = limit.as_secs(), "call deadline exceeded");
            Err(LogError::Timeout {
                operation: operation.to_string(),
                secs: limit.as_secs(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn preserves_order() {
        let runner = BatchRunner::new(3);
        let out = runner.run(1..=7, |n| async move { n * 10 }).await;
        assert_eq!(out, vec![10, 20, 30, 40, 50, 60, 70]);
    }

    #[tokio::test]
    async fn caps_concurrency() {
        let runner = BatchRunner::new(5);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        runner
            .run(0..23, |_| {
                let active = active.clone();
                let peak = peak.clone();
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .await;

        assert_eq!(peak.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn batches_do_not_overlap() {
        let runner = BatchRunner::new(2);
        let events = Arc::new(Mutex::new(Vec::new()));

        runner
            .run(0..4, |n| {
                let events = events.clone();
                async move {
                    events.lock().unwrap().push(format!("start {n}"));
                    // The first item of each batch finishes last.
                    let wait = if n % 2 == 0 { 20 } else { 1 };
                    tokio::time::sleep(Duration::from_millis(wait)).await;
                    events.lock().unwrap().push(format!("end {n}"));
                }
            })
            .await;

        let events = events.lock().unwrap().clone();
        let end_0 = events.iter().position(|e| e == "end 0").unwrap();
        let start_2 = events.iter().position(|e| e == "start 2").unwrap();
        assert!(end_0 < start_2, "second batch started early: {events:?}");
    }

    #[tokio::test]
    async fn zero_batch_size_is_clamped() {
        assert_eq!(BatchRunner::new(0).batch_size(), 1);
        let out = BatchRunner::new(0).run(vec!["a", "b"], |s| async move { s }).await;
        assert_eq!(out, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn deadline_expires() {
        let result: LogResult<()> = with_deadline(Duration::from_millis(5), "slow", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(LogError::Timeout { .. })));
    }

    #[tokio::test]
    async fn deadline_passes_result_through() {
        let result = with_deadline(Duration::from_secs(1), "fast", async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
