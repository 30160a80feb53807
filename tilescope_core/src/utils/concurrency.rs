//! Bounded concurrent fan-out that keeps every result.

use anyhow::Result;
use futures::future::join_all;
use std::{future::Future, sync::Arc};
use tokio::sync::Semaphore;

/// Default number of simultaneous downloads.
pub const DOWNLOAD_CONCURRENCY: usize = 5;

/// Runs `task` for every item with at most `limit` tasks in flight.
///
/// Results come back in input order, paired with their item. A failing task never
/// cancels its siblings, so callers can decide between partial success and failing
/// the whole batch. A `limit` of 0 is treated as 1.
pub async fn run_bounded<I, T, F, Fut>(items: Vec<I>, limit: usize, task: F) -> Vec<(I, Result<T>)>
where
	I: Clone,
	F: Fn(I) -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let semaphore = Arc::new(Semaphore::new(limit.max(1)));

	let futures = items.into_iter().map(|item| {
		let semaphore = semaphore.clone();
		let future = task(item.clone());
		async move {
			let result = match semaphore.acquire().await {
				Ok(_permit) => future.await,
				Err(e) => Err(e.into()),
			};
			(item, result)
		}
	});

	join_all(futures).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use anyhow::bail;
	use pretty_assertions::assert_eq;
	use std::{
		sync::atomic::{AtomicUsize, Ordering},
		time::Duration,
	};

	#[tokio::test(start_paused = true)]
	async fn never_exceeds_limit() {
		let running = Arc::new(AtomicUsize::new(0));
		let peak = Arc::new(AtomicUsize::new(0));

		let results = run_bounded((0..20).collect(), 5, |i: u32| {
			let running = running.clone();
			let peak = peak.clone();
			async move {
				let now = running.fetch_add(1, Ordering::SeqCst) + 1;
				peak.fetch_max(now, Ordering::SeqCst);
				tokio::time::sleep(Duration::from_millis(10)).await;
				running.fetch_sub(1, Ordering::SeqCst);
				Ok(i * 2)
			}
		})
		.await;

		assert_eq!(peak.load(Ordering::SeqCst), 5);
		let values: Vec<u32> = results.into_iter().map(|(_, r)| r.unwrap()).collect();
		assert_eq!(values, (0..20).map(|i| i * 2).collect::<Vec<_>>());
	}

	#[tokio::test]
	async fn failures_do_not_cancel_others() {
		let results = run_bounded(vec!["a", "bad", "c"], DOWNLOAD_CONCURRENCY, |name| async move {
			if name == "bad" {
				bail!("cannot fetch {name}");
			}
			Ok(name.len())
		})
		.await;

		assert_eq!(results.len(), 3);
		assert_eq!(results[0].0, "a");
		assert_eq!(results[0].1.as_ref().unwrap(), &1);
		assert_eq!(results[1].1.as_ref().unwrap_err().to_string(), "cannot fetch bad");
		assert_eq!(results[2].1.as_ref().unwrap(), &1);
	}

	#[tokio::test]
	async fn zero_limit_still_runs() {
		let results = run_bounded(vec![1, 2, 3], 0, |i: i32| async move { Ok(i) }).await;
		assert!(results.iter().all(|(_, r)| r.is_ok()));
	}

	#[tokio::test]
	async fn empty_input() {
		let results = run_bounded(Vec::<u8>::new(), 5, |i| async move { Ok(i) }).await;
		assert!(results.is_empty());
	}
}
