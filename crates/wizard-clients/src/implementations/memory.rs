//! In-memory client directory.
//!
//! Clients are listed in the implementation table; with no list a couple of
//! demo clients are seeded.
//!
//! ```toml
//! [[clients.implementations.memory.clients]]
//! id = "c-100"
//! first_name = "Iryna"
//! last_name = "Bondar"
//! phone = "+380671234567"
//! ```

use crate::{ClientError, ClientLookupFactory, ClientLookupInterface, ClientLookupRegistry};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use wizard_types::{
	new_id, Client, ConfigSchema, Field, FieldType, ImplementationRegistry, NewClient, Schema,
	ValidationError,
};

#[derive(Debug, Deserialize)]
struct MemoryClientsConfig {
	#[serde(default = "demo_clients")]
	clients: Vec<Client>,
}

fn demo_clients() -> Vec<Client> {
	vec![
		Client {
			id: "c-001".into(),
			first_name: "Olena".into(),
			last_name: "Koval".into(),
			phone: "+380501112233".into(),
			email: Some("olena.koval@example.com".into()),
		},
		Client {
			id: "c-002".into(),
			first_name: "Taras".into(),
			last_name: "Melnyk".into(),
			phone: "+380672223344".into(),
			email: None,
		},
	]
}

pub struct MemoryClientDirectory {
	clients: RwLock<BTreeMap<String, Client>>,
}

impl MemoryClientDirectory {
	pub fn new(clients: Vec<Client>) -> Self {
		Self {
			clients: RwLock::new(clients.into_iter().map(|c| (c.id.clone(), c)).collect()),
		}
	}

	/// Adds or replaces a client.
	pub async fn upsert(&self, client: Client) {
		self.clients.write().await.insert(client.id.clone(), client);
	}
}

#[async_trait]
impl ClientLookupInterface for MemoryClientDirectory {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryClientsSchema)
	}

	async fn find_client(&self, client_id: &str) -> Result<Client, ClientError> {
		self.clients
			.read()
			.await
			.get(client_id)
			.cloned()
			.ok_or_else(|| ClientError::NotFound(client_id.to_string()))
	}

	async fn search_clients(&self, query: &str, limit: usize) -> Result<Vec<Client>, ClientError> {
		let needle = query.trim().to_lowercase();
		let clients = self.clients.read().await;
		Ok(clients
			.values()
			.filter(|client| {
				needle.is_empty()
					|| client.full_name().to_lowercase().contains(&needle)
					|| client.phone.contains(&needle)
					|| client
						.email
						.as_deref()
						.is_some_and(|email| email.to_lowercase().contains(&needle))
			})
			.take(limit)
			.cloned()
			.collect())
	}

	async fn create_client(&self, client: NewClient) -> Result<Client, ClientError> {
		let mut clients = self.clients.write().await;
		if clients.values().any(|existing| existing.phone == client.phone) {
			return Err(ClientError::Duplicate(client.phone));
		}
		let created = Client {
			id: format!("c-{}", &new_id()[..8]),
			first_name: client.first_name,
			last_name: client.last_name,
			phone: client.phone,
			email: client.email,
		};
		clients.insert(created.id.clone(), created.clone());
		tracing::info!(client_id = %created.id, "Client created");
		Ok(created)
	}
}

pub struct MemoryClientsSchema;

impl ConfigSchema for MemoryClientsSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let client = Schema::new(
			vec![
				Field::new("id", FieldType::String),
				Field::new("first_name", FieldType::String),
				Field::new("last_name", FieldType::String),
				Field::new("phone", FieldType::String),
			],
			vec![Field::new("email", FieldType::String)],
		);
		Schema::new(
			vec![],
			vec![Field::new("clients", FieldType::Array(Box::new(FieldType::Table(client))))],
		)
		.validate(config)
	}
}

pub fn create_client_lookup(
	config: &toml::Value,
) -> Result<Box<dyn ClientLookupInterface>, ClientError> {
	MemoryClientsSchema
		.validate(config)
		.map_err(|e| ClientError::Configuration(e.to_string()))?;
	let parsed: MemoryClientsConfig = config
		.clone()
		.try_into()
		.map_err(|e: toml::de::Error| ClientError::Configuration(e.message().to_string()))?;
	tracing::debug!(clients = parsed.clients.len(), "Client directory loaded");
	Ok(Box::new(MemoryClientDirectory::new(parsed.clients)))
}

pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = ClientLookupFactory;

	fn factory() -> Self::Factory {
		create_client_lookup
	}
}

impl ClientLookupRegistry for Registry {}
