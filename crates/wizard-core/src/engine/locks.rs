//! Per-wizard locks.
//!
//! One async mutex per wizard id, held for the whole load, evaluate and
//! persist sequence. Different ids never contend.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use wizard_config::LockMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockBusy;

pub struct LockTable {
	locks: DashMap<String, Arc<Mutex<()>>>,
	mode: LockMode,
	wait: Duration,
}

impl LockTable {
	pub fn new(mode: LockMode, wait: Duration) -> Self {
		Self {
			locks: DashMap::new(),
			mode,
			wait,
		}
	}

	/// Takes the lock for `id`, released when the guard drops.
	///
	/// `fail_fast` gives up at once if the lock is held; `wait` gives up
	/// after the configured wait.
	pub async fn acquire(&self, id: &str) -> Result<OwnedMutexGuard<()>, LockBusy> {
		let lock = self.locks.entry(id.to_string()).or_default().clone();
		match self.mode {
			LockMode::FailFast => lock.try_lock_owned().map_err(|_| LockBusy),
			LockMode::Wait => tokio::time::timeout(self.wait, lock.lock_owned())
				.await
				.map_err(|_| LockBusy),
		}
	}

	/// Drops table entries nobody holds or waits for.
	pub fn prune(&self) -> usize {
		let before = self.locks.len();
		self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
		before - self.locks.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_fail_fast_rejects_second_holder() {
		let table = LockTable::new(LockMode::FailFast, Duration::from_millis(10));
		let held = table.acquire("a").await.unwrap();
		assert_eq!(table.acquire("a").await.err(), Some(LockBusy));
		assert!(table.acquire("b").await.is_ok());
		drop(held);
		assert!(table.acquire("a").await.is_ok());
	}

	#[tokio::test]
	async fn test_wait_mode_times_out() {
		let table = LockTable::new(LockMode::Wait, Duration::from_millis(20));
		let _held = table.acquire("a").await.unwrap();
		assert_eq!(table.acquire("a").await.err(), Some(LockBusy));
	}

	#[tokio::test]
	async fn test_prune_keeps_held_locks() {
		let table = LockTable::new(LockMode::FailFast, Duration::from_millis(10));
		let _held = table.acquire("a").await.unwrap();
		drop(table.acquire("b").await.unwrap());
		assert_eq!(table.prune(), 1);
		assert!(table.acquire("a").await.is_err());
	}
}
