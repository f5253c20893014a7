//! Client directory collaborator.
//!
//! The wizard only needs to resolve a selected client id to a client record.
//! Search and creation are offered to the HTTP layer for the client
//! selection screen.

use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use wizard_types::{Client, ConfigSchema, ImplementationRegistry, NewClient};

pub mod implementations {
	pub mod memory;
}

#[derive(Debug, Error)]
pub enum ClientError {
	#[error("Client not found: {0}")]
	NotFound(String),
	#[error("Invalid client: {0}")]
	Invalid(String),
	#[error("Client with phone {0} already exists")]
	Duplicate(String),
	#[error("Backend error: {0}")]
	Backend(String),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

#[async_trait]
pub trait ClientLookupInterface: Send + Sync {
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	async fn find_client(&self, client_id: &str) -> Result<Client, ClientError>;

	/// Case-insensitive match on name, phone or email; at most `limit` results.
	async fn search_clients(&self, query: &str, limit: usize) -> Result<Vec<Client>, ClientError>;

	/// Registers a client that passed [`validate_new_client`]. The phone
	/// number identifies a client, so a second registration is `Duplicate`.
	async fn create_client(&self, client: NewClient) -> Result<Client, ClientError>;
}

const NAME_PATTERN: &str = r"^[\p{L}\s\-']{2,50}$";
const PHONE_PATTERN: &str = r"^\+?[0-9]{10,15}$";
const EMAIL_PATTERN: &str = r"^[A-Za-z0-9+_.-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$";

fn is_match(pattern: &str, value: &str) -> Result<bool, ClientError> {
	Regex::new(pattern)
		.map(|re| re.is_match(value))
		.map_err(|e| ClientError::Backend(format!("Regex error: {}", e)))
}

/// Trims the fields of a new client and checks names, phone and email.
pub fn validate_new_client(client: NewClient) -> Result<NewClient, ClientError> {
	let client = NewClient {
		first_name: client.first_name.trim().to_string(),
		last_name: client.last_name.trim().to_string(),
		phone: client.phone.trim().to_string(),
		email: client
			.email
			.map(|email| email.trim().to_string())
			.filter(|email| !email.is_empty()),
	};

	for (field, value) in [("first_name", &client.first_name), ("last_name", &client.last_name)] {
		if !is_match(NAME_PATTERN, value)? {
			return Err(ClientError::Invalid(format!(
				"{} must be 2-50 letters, spaces, hyphens or apostrophes",
				field
			)));
		}
	}
	if !is_match(PHONE_PATTERN, &client.phone)? {
		return Err(ClientError::Invalid(
			"phone must be 10-15 digits, optionally starting with +".into(),
		));
	}
	if let Some(email) = &client.email {
		if !is_match(EMAIL_PATTERN, email)? {
			return Err(ClientError::Invalid(format!("malformed email {}", email)));
		}
	}
	Ok(client)
}

pub type ClientLookupFactory =
	fn(&toml::Value) -> Result<Box<dyn ClientLookupInterface>, ClientError>;

pub trait ClientLookupRegistry: ImplementationRegistry<Factory = ClientLookupFactory> {}

pub fn get_all_implementations() -> Vec<(&'static str, ClientLookupFactory)> {
	use implementations::memory;

	vec![(memory::Registry::NAME, memory::Registry::factory())]
}

pub struct ClientService {
	implementations: HashMap<String, Arc<dyn ClientLookupInterface>>,
	primary: String,
}

impl ClientService {
	pub fn new(
		implementations: HashMap<String, Arc<dyn ClientLookupInterface>>,
		primary: String,
	) -> Result<Self, ClientError> {
		if !implementations.contains_key(&primary) {
			return Err(ClientError::Configuration(format!(
				"Primary implementation '{}' not found in available implementations",
				primary
			)));
		}
		Ok(Self {
			implementations,
			primary,
		})
	}

	pub fn single(name: &str, implementation: Arc<dyn ClientLookupInterface>) -> Self {
		Self {
			implementations: HashMap::from([(name.to_string(), implementation)]),
			primary: name.to_string(),
		}
	}

	fn primary(&self) -> Result<&Arc<dyn ClientLookupInterface>, ClientError> {
		self.implementations.get(&self.primary).ok_or_else(|| {
			ClientError::Backend(format!(
				"Primary implementation '{}' not available",
				self.primary
			))
		})
	}

	pub async fn find_client(&self, client_id: &str) -> Result<Client, ClientError> {
		self.primary()?.find_client(client_id).await
	}

	pub async fn search_clients(&self, query: &str, limit: usize) -> Result<Vec<Client>, ClientError> {
		self.primary()?.search_clients(query, limit).await
	}

	pub async fn create_client(&self, client: NewClient) -> Result<Client, ClientError> {
		let client = validate_new_client(client)?;
		self.primary()?.create_client(client).await
	}
}
