//! Builder pattern for constructing wizard engines.
//!
//! Turns the configuration into running services: each pluggable section's
//! implementation tables are handed to the matching factory, and the loaded
//! implementations are wrapped in their services.

use crate::engine::{event_bus::EventBus, WizardEngine};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use wizard_clients::{ClientError, ClientLookupInterface, ClientService};
use wizard_config::{Config, ServiceConfig};
use wizard_legal::{LegalError, LegalService, SignatureInterface};
use wizard_pricing::{PricingError, PricingInterface, PricingService};
use wizard_receipt::{ReceiptError, ReceiptInterface, ReceiptService};
use wizard_storage::{StorageError, StorageInterface, StorageService};

/// Capacity of the engine's event bus.
const EVENT_BUS_CAPACITY: usize = 1000;

#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions for every pluggable component, keyed by
/// implementation name.
pub struct WizardFactories<SF, PF, CF, LF, RF> {
	pub storage_factories: HashMap<String, SF>,
	pub pricing_factories: HashMap<String, PF>,
	pub client_factories: HashMap<String, CF>,
	pub legal_factories: HashMap<String, LF>,
	pub receipt_factories: HashMap<String, RF>,
}

pub struct WizardBuilder {
	config: Config,
}

/// Creates every configured implementation of one component.
fn load_implementations<T, E, F>(
	component: &str,
	section: &ServiceConfig,
	factories: &HashMap<String, F>,
) -> Result<HashMap<String, Arc<T>>, BuilderError>
where
	T: ?Sized,
	E: fmt::Display,
	F: Fn(&toml::Value) -> Result<Box<T>, E>,
{
	let mut implementations = HashMap::new();
	for (name, config) in &section.implementations {
		let Some(factory) = factories.get(name) else {
			tracing::warn!(component, implementation = %name, "Unknown implementation, skipping");
			continue;
		};
		match factory(config) {
			Ok(implementation) => {
				let is_primary = &section.primary == name;
				tracing::info!(component, implementation = %name, enabled = %is_primary, "Loaded");
				implementations.insert(name.clone(), Arc::from(implementation));
			},
			Err(e) => {
				tracing::error!(
					component,
					implementation = %name,
					error = %e,
					"Failed to create implementation"
				);
				return Err(BuilderError::Config(format!(
					"Failed to create {} implementation '{}': {}",
					component, name, e
				)));
			},
		}
	}

	if implementations.is_empty() {
		return Err(BuilderError::MissingComponent(component.to_string()));
	}
	Ok(implementations)
}

impl WizardBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	pub fn build<SF, PF, CF, LF, RF>(
		self,
		factories: WizardFactories<SF, PF, CF, LF, RF>,
	) -> Result<WizardEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		PF: Fn(&toml::Value) -> Result<Box<dyn PricingInterface>, PricingError>,
		CF: Fn(&toml::Value) -> Result<Box<dyn ClientLookupInterface>, ClientError>,
		LF: Fn(&toml::Value) -> Result<Box<dyn SignatureInterface>, LegalError>,
		RF: Fn(&toml::Value) -> Result<Box<dyn ReceiptInterface>, ReceiptError>,
	{
		let primary_storage = &self.config.storage.primary;
		let storage_config = self
			.config
			.storage
			.implementations
			.get(primary_storage)
			.ok_or_else(|| {
				BuilderError::Config(format!(
					"Primary storage '{}' has no configuration",
					primary_storage
				))
			})?;
		let storage_factory = factories
			.storage_factories
			.get(primary_storage)
			.ok_or_else(|| BuilderError::MissingComponent(format!("storage '{}'", primary_storage)))?;
		let storage_backend = storage_factory(storage_config).map_err(|e| {
			tracing::error!(
				component = "storage",
				implementation = %primary_storage,
				error = %e,
				"Failed to create storage implementation"
			);
			BuilderError::Config(format!(
				"Failed to create storage implementation '{}': {}",
				primary_storage, e
			))
		})?;
		tracing::info!(component = "storage", implementation = %primary_storage, enabled = true, "Loaded");
		let storage = Arc::new(StorageService::new(storage_backend));

		let pricing = load_implementations("pricing", &self.config.pricing, &factories.pricing_factories)?;
		let pricing = PricingService::new(pricing, self.config.pricing.primary.clone())
			.map_err(|e| BuilderError::Config(e.to_string()))?;

		let clients = load_implementations("clients", &self.config.clients, &factories.client_factories)?;
		let clients = ClientService::new(clients, self.config.clients.primary.clone())
			.map_err(|e| BuilderError::Config(e.to_string()))?;

		let legal = load_implementations("legal", &self.config.legal, &factories.legal_factories)?;
		let legal = LegalService::new(legal, self.config.legal.primary.clone())
			.map_err(|e| BuilderError::Config(e.to_string()))?;

		let receipt = load_implementations("receipt", &self.config.receipt, &factories.receipt_factories)?;
		let receipt = ReceiptService::new(receipt, self.config.receipt.primary.clone())
			.map_err(|e| BuilderError::Config(e.to_string()))?;

		Ok(WizardEngine::new(
			self.config,
			storage,
			Arc::new(clients),
			Arc::new(pricing),
			Arc::new(legal),
			Arc::new(receipt),
			EventBus::new(EVENT_BUS_CAPACITY),
		))
	}
}
