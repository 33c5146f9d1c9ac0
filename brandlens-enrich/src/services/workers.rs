//! Bounded worker pool
//!
//! One pool abstraction drives every pipeline phase: items are processed with
//! at most `max_workers` in flight, results arrive in completion order, and a
//! cancelled token stops not-yet-started items. An item mapping to `None`
//! (duplicate, cancelled) simply drops out of the output.

use futures::stream::{self, StreamExt};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Run `f` over `items` with bounded concurrency
///
/// Each in-flight item counts as one slot regardless of how many sub-fetches
/// it performs internally. Output order is completion order.
pub async fn run_bounded<I, T, F, Fut>(
    items: Vec<I>,
    max_workers: usize,
    cancel: &CancellationToken,
    f: F,
) -> Vec<T>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    stream::iter(items)
        .map(|item| {
            let work = f(item);
            async move {
                if cancel.is_cancelled() {
                    return None;
                }
                work.await
            }
        })
        .buffer_unordered(max_workers.max(1))
        .filter_map(|result| async move { result })
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn processes_every_item() {
        let cancel = CancellationToken::new();
        let results = run_bounded((0..25).collect(), 4, &cancel, |i: usize| async move {
            Some(i * 2)
        })
        .await;

        assert_eq!(results.len(), 25);
        let sum: usize = results.iter().sum();
        assert_eq!(sum, (0..25).map(|i: usize| i * 2).sum::<usize>());
    }

    #[tokio::test]
    async fn never_exceeds_the_worker_bound() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let results = run_bounded((0..30).collect(), 4, &cancel, |i: usize| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            async move {
                let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(current, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Some(i)
            }
        })
        .await;

        assert_eq!(results.len(), 30);
        assert!(
            peak.load(Ordering::SeqCst) <= 4,
            "peak concurrency was {}",
            peak.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn none_results_are_filtered_out() {
        let cancel = CancellationToken::new();
        let results = run_bounded((0..10).collect(), 3, &cancel, |i: usize| async move {
            if i % 2 == 0 {
                Some(i)
            } else {
                None
            }
        })
        .await;

        assert_eq!(results.len(), 5);
    }

    #[tokio::test]
    async fn cancellation_skips_unstarted_items() {
        let started = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let results = run_bounded((0..50).collect(), 4, &cancel, |i: usize| {
            let started = Arc::clone(&started);
            async move {
                started.fetch_add(1, Ordering::SeqCst);
                Some(i)
            }
        })
        .await;

        assert!(results.is_empty());
        assert_eq!(started.load(Ordering::SeqCst), 0);
    }
}
