//! Receipt collaborator: renders the final order summary into a printable
//! or machine-readable receipt.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use wizard_types::{
	ConfigSchema, ImplementationRegistry, OrderSummary, ReceiptArtifact, ReceiptConfig,
};

pub mod implementations {
	pub mod text;
}

#[derive(Debug, Error)]
pub enum ReceiptError {
	#[error("Rendering error: {0}")]
	Rendering(String),
	#[error("Validation error: {0}")]
	Validation(String),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

#[async_trait]
pub trait ReceiptInterface: Send + Sync {
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	async fn generate_receipt(
		&self,
		summary: &OrderSummary,
		config: &ReceiptConfig,
	) -> Result<ReceiptArtifact, ReceiptError>;
}

pub type ReceiptFactory = fn(&toml::Value) -> Result<Box<dyn ReceiptInterface>, ReceiptError>;

pub trait ReceiptRegistry: ImplementationRegistry<Factory = ReceiptFactory> {}

pub fn get_all_implementations() -> Vec<(&'static str, ReceiptFactory)> {
	use implementations::text;

	vec![(text::Registry::NAME, text::Registry::factory())]
}

pub struct ReceiptService {
	implementations: HashMap<String, Arc<dyn ReceiptInterface>>,
	primary: String,
}

impl ReceiptService {
	pub fn new(
		implementations: HashMap<String, Arc<dyn ReceiptInterface>>,
		primary: String,
	) -> Result<Self, ReceiptError> {
		if !implementations.contains_key(&primary) {
			return Err(ReceiptError::Configuration(format!(
				"Primary implementation '{}' not found in available implementations",
				primary
			)));
		}
		Ok(Self {
			implementations,
			primary,
		})
	}

	pub fn single(name: &str, implementation: Arc<dyn ReceiptInterface>) -> Self {
		Self {
			implementations: HashMap::from([(name.to_string(), implementation)]),
			primary: name.to_string(),
		}
	}

	pub async fn generate_receipt(
		&self,
		summary: &OrderSummary,
		config: &ReceiptConfig,
	) -> Result<ReceiptArtifact, ReceiptError> {
		let implementation = self.implementations.get(&self.primary).ok_or_else(|| {
			ReceiptError::Configuration(format!(
				"Primary implementation '{}' not available",
				self.primary
			))
		})?;
		implementation.generate_receipt(summary, config).await
	}
}
