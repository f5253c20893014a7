//! Fluent construction of `Config` values for tests.
//!
//! The default build uses in-memory storage and the reference collaborator
//! implementations, each with an empty implementation table.

use crate::{
	ApiConfig, Config, LockMode, ServiceConfig, StorageConfig, WizardConfig,
};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	wizard_id: String,
	max_items_per_order: usize,
	collaborator_timeout_ms: u64,
	lock_mode: LockMode,
	lock_wait_timeout_ms: u64,
	storage_primary: String,
	storage_config: toml::Value,
	pricing_config: toml::Value,
	clients_config: toml::Value,
	api: Option<ApiConfig>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

fn empty_table() -> toml::Value {
	toml::Value::Table(toml::map::Map::new())
}

fn single(name: &str, config: toml::Value) -> ServiceConfig {
	ServiceConfig {
		primary: name.to_string(),
		implementations: HashMap::from([(name.to_string(), config)]),
	}
}

impl ConfigBuilder {
	pub fn new() -> Self {
		Self {
			wizard_id: "test-wizard".to_string(),
			max_items_per_order: 50,
			collaborator_timeout_ms: 1_000,
			lock_mode: LockMode::FailFast,
			lock_wait_timeout_ms: 1_000,
			storage_primary: "memory".to_string(),
			storage_config: empty_table(),
			pricing_config: empty_table(),
			clients_config: empty_table(),
			api: None,
		}
	}

	pub fn wizard_id(mut self, id: impl Into<String>) -> Self {
		self.wizard_id = id.into();
		self
	}

	pub fn max_items_per_order(mut self, max: usize) -> Self {
		self.max_items_per_order = max;
		self
	}

	pub fn collaborator_timeout_ms(mut self, timeout: u64) -> Self {
		self.collaborator_timeout_ms = timeout;
		self
	}

	pub fn lock_mode(mut self, mode: LockMode) -> Self {
		self.lock_mode = mode;
		self
	}

	pub fn lock_wait_timeout_ms(mut self, timeout: u64) -> Self {
		self.lock_wait_timeout_ms = timeout;
		self
	}

	/// Selects the storage backend and its implementation table.
	pub fn storage(mut self, primary: impl Into<String>, config: toml::Value) -> Self {
		self.storage_primary = primary.into();
		self.storage_config = config;
		self
	}

	/// Implementation table for the `price_list` pricing implementation.
	pub fn pricing_config(mut self, config: toml::Value) -> Self {
		self.pricing_config = config;
		self
	}

	/// Implementation table for the `memory` client directory.
	pub fn clients_config(mut self, config: toml::Value) -> Self {
		self.clients_config = config;
		self
	}

	pub fn api(mut self, api: Option<ApiConfig>) -> Self {
		self.api = api;
		self
	}

	pub fn build(self) -> Config {
		Config {
			wizard: WizardConfig {
				id: self.wizard_id,
				max_items_per_order: self.max_items_per_order,
				collaborator_timeout_ms: self.collaborator_timeout_ms,
				lock_mode: self.lock_mode,
				lock_wait_timeout_ms: self.lock_wait_timeout_ms,
			},
			storage: StorageConfig {
				implementations: HashMap::from([(
					self.storage_primary.clone(),
					self.storage_config,
				)]),
				primary: self.storage_primary,
				cleanup_interval_seconds: 60,
			},
			pricing: single("price_list", self.pricing_config),
			clients: single("memory", self.clients_config),
			legal: single("basic", empty_table()),
			receipt: single("text", empty_table()),
			api: self.api,
		}
	}
}
