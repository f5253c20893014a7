//! Final order records.
//!
//! When a wizard completes, its order summary is written once under the
//! `orders` namespace. Nothing else in the engine writes there.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use wizard_storage::{StorageError, StorageService};
use wizard_types::{current_timestamp, new_id, OrderSummary, StorageKey};

#[derive(Debug, Error)]
pub enum OrderRegistryError {
	#[error("Order not found: {0}")]
	NotFound(String),
	#[error("Storage error: {0}")]
	Storage(String),
}

/// A finalized order as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
	pub order_id: String,
	pub wizard_id: String,
	pub summary: OrderSummary,
	pub finalized_at: u64,
}

pub struct OrderRegistry {
	storage: Arc<StorageService>,
}

impl OrderRegistry {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Stores the order and returns its new id.
	pub async fn finalize_order(&self, summary: &OrderSummary) -> Result<String, OrderRegistryError> {
		let record = OrderRecord {
			order_id: new_id(),
			wizard_id: summary.wizard_id.clone(),
			summary: summary.clone(),
			finalized_at: current_timestamp(),
		};
		self.storage
			.store(StorageKey::Orders, &record.order_id, &record)
			.await
			.map_err(|e| OrderRegistryError::Storage(e.to_string()))?;

		tracing::info!(
			order_id = %record.order_id,
			receipt_number = %summary.order_info.receipt_number,
			items = summary.items.len(),
			total = %summary.totals.total,
			"Order finalized"
		);
		Ok(record.order_id)
	}

	pub async fn get_order(&self, order_id: &str) -> Result<OrderRecord, OrderRegistryError> {
		self.storage
			.retrieve(StorageKey::Orders, order_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => OrderRegistryError::NotFound(order_id.to_string()),
				other => OrderRegistryError::Storage(other.to_string()),
			})
	}
}
