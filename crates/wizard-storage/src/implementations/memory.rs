//! In-memory storage backend.
//!
//! Values live in a map behind a tokio `RwLock`; a write replaces the whole
//! value under the write lock. Entries stored with a TTL are hidden once
//! expired and dropped by `cleanup_expired`.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use wizard_types::{ConfigSchema, ImplementationRegistry, Schema, ValidationError};

struct Entry {
	bytes: Vec<u8>,
	expires_at: Option<Instant>,
}

impl Entry {
	fn is_expired(&self, now: Instant) -> bool {
		self.expires_at.is_some_and(|at| now >= at)
	}
}

pub struct MemoryStorage {
	store: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self {
			store: Arc::new(RwLock::new(HashMap::new())),
		}
	}
}

impl Default for MemoryStorage {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let store = self.store.read().await;
		match store.get(key) {
			Some(entry) if !entry.is_expired(Instant::now()) => Ok(entry.bytes.clone()),
			_ => Err(StorageError::NotFound),
		}
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let expires_at = ttl
			.filter(|ttl| !ttl.is_zero())
			.map(|ttl| Instant::now() + ttl);
		let mut store = self.store.write().await;
		store.insert(
			key.to_string(),
			Entry {
				bytes: value,
				expires_at,
			},
		);
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		store.remove(key);
		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let store = self.store.read().await;
		Ok(store
			.get(key)
			.is_some_and(|entry| !entry.is_expired(Instant::now())))
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStorageSchema)
	}

	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		let now = Instant::now();
		let mut store = self.store.write().await;
		let before = store.len();
		store.retain(|_, entry| !entry.is_expired(now));
		Ok(before - store.len())
	}
}

pub struct MemoryStorageSchema;

impl ConfigSchema for MemoryStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Memory storage takes no configuration.
pub fn create_storage(_config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	Ok(Box::new(MemoryStorage::new()))
}

pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_basic_operations() {
		let storage = MemoryStorage::new();
		let key = "sessions:w-1";
		let value = b"{\"state\":\"INITIAL\"}".to_vec();

		storage.set_bytes(key, value.clone(), None).await.unwrap();
		assert_eq!(storage.get_bytes(key).await.unwrap(), value);
		assert!(storage.exists(key).await.unwrap());

		storage.delete(key).await.unwrap();
		assert!(!storage.exists(key).await.unwrap());
		assert!(matches!(
			storage.get_bytes(key).await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_overwrite_replaces_value() {
		let storage = MemoryStorage::new();
		storage.set_bytes("k", b"one".to_vec(), None).await.unwrap();
		storage.set_bytes("k", b"two".to_vec(), None).await.unwrap();
		assert_eq!(storage.get_bytes("k").await.unwrap(), b"two".to_vec());
	}

	#[tokio::test]
	async fn test_expired_entries_are_hidden_and_cleaned() {
		let storage = MemoryStorage::new();
		storage
			.set_bytes("short", b"x".to_vec(), Some(Duration::from_millis(10)))
			.await
			.unwrap();
		storage.set_bytes("long", b"y".to_vec(), None).await.unwrap();

		tokio::time::sleep(Duration::from_millis(30)).await;

		assert!(!storage.exists("short").await.unwrap());
		assert_eq!(storage.cleanup_expired().await.unwrap(), 1);
		assert!(storage.exists("long").await.unwrap());
	}

	#[test]
	fn test_schema_accepts_empty_table() {
		let config = toml::Value::Table(toml::map::Map::new());
		assert!(MemoryStorageSchema.validate(&config).is_ok());
	}
}
