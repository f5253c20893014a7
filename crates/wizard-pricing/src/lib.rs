//! Pricing collaborator for the order wizard.
//!
//! Prices a single draft item (base price times quantity plus percentage
//! modifiers) and whole orders (item subtotal, order-wide discount and
//! urgency surcharge). The wizard treats the pricing formula as opaque; it
//! only stores what this crate returns.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use wizard_types::{
	ConfigSchema, DiscountSelection, DraftItem, ImplementationRegistry, ItemPricing, OrderItem,
	OrderTotals, Urgency,
};

pub mod implementations {
	pub mod price_list;
}

#[derive(Debug, Error)]
pub enum PricingError {
	/// The input cannot be priced as given; shown to the operator.
	#[error("Validation error: {0}")]
	Validation(String),
	#[error("Price not found: {0}")]
	PriceNotFound(String),
	#[error("Internal error: {0}")]
	Internal(String),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

#[async_trait]
pub trait PricingInterface: Send + Sync {
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Prices one item. The same draft always yields the same pricing.
	async fn price_item(&self, draft: &DraftItem) -> Result<ItemPricing, PricingError>;

	/// Totals for the committed items with the order-wide adjustments.
	async fn price_order(
		&self,
		items: &[OrderItem],
		discount: Option<&DiscountSelection>,
		urgency: Urgency,
	) -> Result<OrderTotals, PricingError>;
}

pub type PricingFactory = fn(&toml::Value) -> Result<Box<dyn PricingInterface>, PricingError>;

pub trait PricingRegistry: ImplementationRegistry<Factory = PricingFactory> {}

pub fn get_all_implementations() -> Vec<(&'static str, PricingFactory)> {
	use implementations::price_list;

	vec![(price_list::Registry::NAME, price_list::Registry::factory())]
}

/// Routes pricing calls to the configured primary implementation.
pub struct PricingService {
	implementations: HashMap<String, Arc<dyn PricingInterface>>,
	primary: String,
}

impl PricingService {
	pub fn new(
		implementations: HashMap<String, Arc<dyn PricingInterface>>,
		primary: String,
	) -> Result<Self, PricingError> {
		if !implementations.contains_key(&primary) {
			return Err(PricingError::Configuration(format!(
				"Primary implementation '{}' not found in available implementations",
				primary
			)));
		}
		Ok(Self {
			implementations,
			primary,
		})
	}

	/// Wraps a single implementation as the primary.
	pub fn single(name: &str, implementation: Arc<dyn PricingInterface>) -> Self {
		Self {
			implementations: HashMap::from([(name.to_string(), implementation)]),
			primary: name.to_string(),
		}
	}

	fn primary(&self) -> Result<&Arc<dyn PricingInterface>, PricingError> {
		self.implementations.get(&self.primary).ok_or_else(|| {
			PricingError::Internal(format!(
				"Primary implementation '{}' not available",
				self.primary
			))
		})
	}

	pub async fn price_item(&self, draft: &DraftItem) -> Result<ItemPricing, PricingError> {
		self.primary()?.price_item(draft).await
	}

	pub async fn price_order(
		&self,
		items: &[OrderItem],
		discount: Option<&DiscountSelection>,
		urgency: Urgency,
	) -> Result<OrderTotals, PricingError> {
		self.primary()?.price_order(items, discount, urgency).await
	}
}
