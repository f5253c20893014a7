//! Basic signature capture.
//!
//! Checks the payload and records a SHA3-256 digest of the signature data.
//! The signature image itself is not kept.

use crate::{LegalError, SignatureFactory, SignatureInterface, SignatureRegistry};
use async_trait::async_trait;
use sha3::{Digest, Sha3_256};
use wizard_types::{
	current_timestamp, new_id, ConfigSchema, Field, FieldType, ImplementationRegistry, Schema,
	SignaturePayload, SignatureRecord, ValidationError,
};

#[derive(Debug, Clone)]
pub struct BasicSignatureConfig {
	/// Shortest accepted signature data, in characters.
	pub min_signature_length: usize,
	pub require_signer_name: bool,
}

impl Default for BasicSignatureConfig {
	fn default() -> Self {
		Self {
			min_signature_length: 16,
			require_signer_name: false,
		}
	}
}

pub struct BasicSignature {
	config: BasicSignatureConfig,
}

impl BasicSignature {
	pub fn new(config: BasicSignatureConfig) -> Self {
		Self { config }
	}
}

#[async_trait]
impl SignatureInterface for BasicSignature {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(BasicSignatureSchema)
	}

	async fn capture_signature(
		&self,
		payload: &SignaturePayload,
	) -> Result<SignatureRecord, LegalError> {
		if !payload.terms_accepted {
			return Err(LegalError::Validation("Terms must be accepted".into()));
		}
		let data = payload
			.signature_data
			.as_deref()
			.map(str::trim)
			.filter(|data| !data.is_empty())
			.ok_or_else(|| LegalError::Validation("Signature required".into()))?;
		if data.chars().count() < self.config.min_signature_length {
			return Err(LegalError::Validation(format!(
				"Signature data shorter than {} characters",
				self.config.min_signature_length
			)));
		}
		let signer_name = payload
			.signer_name
			.as_deref()
			.map(str::trim)
			.filter(|name| !name.is_empty())
			.map(str::to_string);
		if self.config.require_signer_name && signer_name.is_none() {
			return Err(LegalError::Validation("Signer name required".into()));
		}

		let digest = hex::encode(Sha3_256::digest(data.as_bytes()));
		tracing::debug!(digest = %&digest[..12], "Signature captured");

		Ok(SignatureRecord {
			signature_id: new_id(),
			digest,
			signer_name,
			captured_at: current_timestamp(),
		})
	}
}

pub struct BasicSignatureSchema;

impl ConfigSchema for BasicSignatureSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(
			vec![],
			vec![
				Field::new(
					"min_signature_length",
					FieldType::Integer {
						min: Some(1),
						max: Some(1_000_000),
					},
				),
				Field::new("require_signer_name", FieldType::Boolean),
			],
		)
		.validate(config)
	}
}

pub fn create_signature(config: &toml::Value) -> Result<Box<dyn SignatureInterface>, LegalError> {
	BasicSignatureSchema
		.validate(config)
		.map_err(|e| LegalError::Configuration(e.to_string()))?;

	let defaults = BasicSignatureConfig::default();
	let config = BasicSignatureConfig {
		min_signature_length: config
			.get("min_signature_length")
			.and_then(|v| v.as_integer())
			.map(|v| v as usize)
			.unwrap_or(defaults.min_signature_length),
		require_signer_name: config
			.get("require_signer_name")
			.and_then(|v| v.as_bool())
			.unwrap_or(defaults.require_signer_name),
	};
	Ok(Box::new(BasicSignature::new(config)))
}

pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "basic";
	type Factory = SignatureFactory;

	fn factory() -> Self::Factory {
		create_signature
	}
}

impl SignatureRegistry for Registry {}
