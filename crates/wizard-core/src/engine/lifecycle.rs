//! Background maintenance for the wizard engine.

use super::WizardEngine;
use std::time::Duration;
use tokio::task::JoinHandle;

impl WizardEngine {
	/// Spawns the periodic task that drops expired storage entries and idle
	/// lock table entries. Abort the handle to stop it.
	pub fn spawn_maintenance(&self) -> JoinHandle<()> {
		let storage = self.storage.clone();
		let locks = self.locks.clone();
		let period = Duration::from_secs(self.config.storage.cleanup_interval_seconds.max(1));

		tokio::spawn(async move {
			let mut interval = tokio::time::interval(period);
			loop {
				interval.tick().await;
				match storage.cleanup_expired().await {
					Ok(count) if count > 0 => {
						tracing::debug!("Storage cleanup: removed {} expired entries", count);
					},
					Err(e) => {
						tracing::warn!("Storage cleanup failed: {}", e);
					},
					_ => {},
				}
				let pruned = locks.prune();
				if pruned > 0 {
					tracing::trace!(pruned, "Idle wizard locks dropped");
				}
			}
		})
	}
}
