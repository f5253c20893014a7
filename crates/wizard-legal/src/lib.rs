//! Legal acceptance collaborator: records the client's signature on the
//! order terms.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use wizard_types::{ConfigSchema, ImplementationRegistry, SignaturePayload, SignatureRecord};

pub mod implementations {
	pub mod basic;
}

#[derive(Debug, Error)]
pub enum LegalError {
	#[error("Validation error: {0}")]
	Validation(String),
	#[error("Backend error: {0}")]
	Backend(String),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

#[async_trait]
pub trait SignatureInterface: Send + Sync {
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	async fn capture_signature(
		&self,
		payload: &SignaturePayload,
	) -> Result<SignatureRecord, LegalError>;
}

pub type SignatureFactory = fn(&toml::Value) -> Result<Box<dyn SignatureInterface>, LegalError>;

pub trait SignatureRegistry: ImplementationRegistry<Factory = SignatureFactory> {}

pub fn get_all_implementations() -> Vec<(&'static str, SignatureFactory)> {
	use implementations::basic;

	vec![(basic::Registry::NAME, basic::Registry::factory())]
}

pub struct LegalService {
	implementations: HashMap<String, Arc<dyn SignatureInterface>>,
	primary: String,
}

impl LegalService {
	pub fn new(
		implementations: HashMap<String, Arc<dyn SignatureInterface>>,
		primary: String,
	) -> Result<Self, LegalError> {
		if !implementations.contains_key(&primary) {
			return Err(LegalError::Configuration(format!(
				"Primary implementation '{}' not found in available implementations",
				primary
			)));
		}
		Ok(Self {
			implementations,
			primary,
		})
	}

	pub fn single(name: &str, implementation: Arc<dyn SignatureInterface>) -> Self {
		Self {
			implementations: HashMap::from([(name.to_string(), implementation)]),
			primary: name.to_string(),
		}
	}

	pub async fn capture_signature(
		&self,
		payload: &SignaturePayload,
	) -> Result<SignatureRecord, LegalError> {
		let implementation = self.implementations.get(&self.primary).ok_or_else(|| {
			LegalError::Backend(format!(
				"Primary implementation '{}' not available",
				self.primary
			))
		})?;
		implementation.capture_signature(payload).await
	}
}
