//! Configuration for the order wizard service.
//!
//! Configuration is TOML. A file may pull in others with
//! `include = ["pricing.toml", ...]`; every top-level section must come from
//! exactly one file. `${VAR}` and `${VAR:-default}` are substituted from the
//! environment before parsing.
//!
//! Pluggable sections (`storage`, `pricing`, `clients`, `legal`, `receipt`)
//! name a `primary` implementation and carry one raw TOML table per
//! implementation under `implementations.<name>`; those tables are checked
//! against the implementation's own schema when the service is built.

#[cfg(feature = "testing")]
pub mod builders;
mod loader;

pub use loader::ConfigLoader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Configuration error: {0}")]
	Parse(String),
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// The default Display dumps the whole input; the message is enough.
		ConfigError::Parse(err.message().to_string())
	}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	pub wizard: WizardConfig,
	pub storage: StorageConfig,
	pub pricing: ServiceConfig,
	pub clients: ServiceConfig,
	pub legal: ServiceConfig,
	pub receipt: ServiceConfig,
	pub api: Option<ApiConfig>,
}

/// Behaviour of the wizard engine itself.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WizardConfig {
	/// Identifies this service instance in logs.
	pub id: String,
	/// Upper bound on committed items per order.
	#[serde(default = "default_max_items_per_order")]
	pub max_items_per_order: usize,
	/// Deadline for each collaborator call made by an action.
	#[serde(default = "default_collaborator_timeout_ms")]
	pub collaborator_timeout_ms: u64,
	/// What a request does when another request holds the same wizard.
	#[serde(default)]
	pub lock_mode: LockMode,
	/// Only used with `lock_mode = "wait"`.
	#[serde(default = "default_lock_wait_timeout_ms")]
	pub lock_wait_timeout_ms: u64,
}

/// Per-wizard lock policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LockMode {
	/// Refuse immediately with a retryable conflict.
	#[default]
	FailFast,
	/// Queue behind the holder for up to `lock_wait_timeout_ms`.
	Wait,
}

fn default_max_items_per_order() -> usize {
	50
}

fn default_collaborator_timeout_ms() -> u64 {
	5_000
}

fn default_lock_wait_timeout_ms() -> u64 {
	2_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	pub primary: String,
	pub implementations: HashMap<String, toml::Value>,
	/// How often expired sessions are swept.
	#[serde(default = "default_cleanup_interval_seconds")]
	pub cleanup_interval_seconds: u64,
}

fn default_cleanup_interval_seconds() -> u64 {
	3600
}

/// A collaborator section: which implementation to use and how each
/// configured implementation is set up.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	pub primary: String,
	pub implementations: HashMap<String, toml::Value>,
}

impl ServiceConfig {
	fn validate(&self, section: &str) -> Result<(), ConfigError> {
		if self.implementations.is_empty() {
			return Err(ConfigError::Validation(format!(
				"At least one {} implementation required",
				section
			)));
		}
		if !self.implementations.contains_key(&self.primary) {
			return Err(ConfigError::Validation(format!(
				"Primary {} '{}' not found in implementations",
				section, self.primary
			)));
		}
		Ok(())
	}
}

/// HTTP API server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	#[serde(default)]
	pub enabled: bool,
	#[serde(default = "default_api_host")]
	pub host: String,
	#[serde(default = "default_api_port")]
	pub port: u16,
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
	#[serde(default = "default_max_request_size")]
	pub max_request_size: usize,
	/// Seconds a client is told to wait after `WIZARD_BUSY`.
	#[serde(default = "default_busy_retry_after")]
	pub busy_retry_after_seconds: u64,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

fn default_api_timeout() -> u64 {
	30
}

fn default_max_request_size() -> usize {
	1024 * 1024
}

fn default_busy_retry_after() -> u64 {
	1
}

/// Substitutes `${VAR}` and `${VAR:-default}` from the environment.
///
/// A referenced variable that is unset and has no default is an error.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;
	for cap in re.captures_iter(input) {
		let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match (std::env::var(name.as_str()), cap.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					name.as_str()
				)))
			},
		};
		result.push_str(&input[last..whole.start()]);
		result.push_str(&value);
		last = whole.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads a configuration file, following its includes.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;

		let mut loader = ConfigLoader::new(base_dir);
		loader.load_config(file_name).await
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.wizard.id.trim().is_empty() {
			return Err(ConfigError::Validation("Wizard ID cannot be empty".into()));
		}
		if !(1..=500).contains(&self.wizard.max_items_per_order) {
			return Err(ConfigError::Validation(
				"max_items_per_order must be between 1 and 500".into(),
			));
		}
		if !(1..=300_000).contains(&self.wizard.collaborator_timeout_ms) {
			return Err(ConfigError::Validation(
				"collaborator_timeout_ms must be between 1 and 300000".into(),
			));
		}
		if self.wizard.lock_mode == LockMode::Wait
			&& !(1..=60_000).contains(&self.wizard.lock_wait_timeout_ms)
		{
			return Err(ConfigError::Validation(
				"lock_wait_timeout_ms must be between 1 and 60000 when lock_mode is 'wait'".into(),
			));
		}

		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}
		if self.storage.cleanup_interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"Storage cleanup_interval_seconds must be greater than 0".into(),
			));
		}
		if self.storage.cleanup_interval_seconds > 86400 {
			return Err(ConfigError::Validation(
				"Storage cleanup_interval_seconds cannot exceed 86400 (24 hours)".into(),
			));
		}

		self.pricing.validate("pricing")?;
		self.clients.validate("clients")?;
		self.legal.validate("legal")?;
		self.receipt.validate("receipt")?;

		if let Some(api) = self.api.as_ref().filter(|api| api.enabled) {
			if api.port == 0 {
				return Err(ConfigError::Validation("API port cannot be 0".into()));
			}
		}

		Ok(())
	}
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
pub(crate) const MINIMAL_CONFIG: &str = r#"
[wizard]
id = "test-wizard"

[storage]
primary = "memory"
[storage.implementations.memory]

[pricing]
primary = "price_list"
[pricing.implementations.price_list]

[clients]
primary = "memory"
[clients.implementations.memory]

[legal]
primary = "basic"
[legal.implementations.basic]

[receipt]
primary = "text"
[receipt.implementations.text]
"#;
