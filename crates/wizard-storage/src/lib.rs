//! Storage for wizard sessions and finalized orders.
//!
//! Backends implement a small byte-oriented key/value trait with optional
//! TTL; [`StorageService`] layers namespaced keys and JSON serialization on
//! top of whichever backend the configuration selects.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;
use wizard_types::{ConfigSchema, ImplementationRegistry, StorageKey};

pub mod implementations {
	pub mod file;
	pub mod memory;
}

#[derive(Debug, Error)]
pub enum StorageError {
	#[error("Not found")]
	NotFound,
	#[error("Serialization error: {0}")]
	Serialization(String),
	#[error("Backend error: {0}")]
	Backend(String),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Key/value backend.
///
/// `set_bytes` must replace the stored value atomically: a concurrent or
/// later reader sees either the old bytes or the new bytes, never a mix.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores `value` under `key`. `None` TTL lets the backend apply its
	/// configured per-namespace default.
	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError>;

	/// Deleting an absent key is not an error.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Removes expired entries and returns how many were dropped.
	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		Ok(0)
	}
}

pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Every storage backend, keyed by configuration name.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Typed, namespaced access to a storage backend.
pub struct StorageService {
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(namespace: StorageKey, id: &str) -> String {
		format!("{}:{}", namespace.as_str(), id)
	}

	pub async fn store<T: Serialize>(
		&self,
		namespace: StorageKey,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		self.store_with_ttl(namespace, id, data, None).await
	}

	pub async fn store_with_ttl<T: Serialize>(
		&self,
		namespace: StorageKey,
		id: &str,
		data: &T,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend
			.set_bytes(&Self::key(namespace, id), bytes, ttl)
			.await
	}

	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: StorageKey,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.retrieve_bytes(namespace, id).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Raw stored bytes, without the backend's own framing.
	pub async fn retrieve_bytes(
		&self,
		namespace: StorageKey,
		id: &str,
	) -> Result<Vec<u8>, StorageError> {
		self.backend.get_bytes(&Self::key(namespace, id)).await
	}

	/// Like `store`, but fails with `NotFound` if nothing is stored yet.
	pub async fn update<T: Serialize>(
		&self,
		namespace: StorageKey,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		if !self.exists(namespace, id).await? {
			return Err(StorageError::NotFound);
		}
		self.store(namespace, id, data).await
	}

	pub async fn remove(&self, namespace: StorageKey, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&Self::key(namespace, id)).await
	}

	pub async fn exists(&self, namespace: StorageKey, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&Self::key(namespace, id)).await
	}

	pub async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		self.backend.cleanup_expired().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use implementations::memory::MemoryStorage;
	use serde::Deserialize;

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Note {
		text: String,
	}

	#[tokio::test]
	async fn test_namespaces_are_separate() {
		let storage = StorageService::new(Box::new(MemoryStorage::new()));
		let note = Note {
			text: "hello".into(),
		};
		storage.store(StorageKey::Sessions, "a", &note).await.unwrap();

		assert!(storage.exists(StorageKey::Sessions, "a").await.unwrap());
		assert!(!storage.exists(StorageKey::Orders, "a").await.unwrap());

		let loaded: Note = storage.retrieve(StorageKey::Sessions, "a").await.unwrap();
		assert_eq!(loaded, note);
	}

	#[tokio::test]
	async fn test_update_requires_existing_entry() {
		let storage = StorageService::new(Box::new(MemoryStorage::new()));
		let note = Note { text: "x".into() };
		let err = storage
			.update(StorageKey::Orders, "missing", &note)
			.await
			.unwrap_err();
		assert!(matches!(err, StorageError::NotFound));
	}

	#[tokio::test]
	async fn test_retrieve_corrupt_entry_is_serialization_error() {
		let backend = MemoryStorage::new();
		backend
			.set_bytes("sessions:bad", b"not json".to_vec(), None)
			.await
			.unwrap();
		let storage = StorageService::new(Box::new(backend));
		let err = storage
			.retrieve::<Note>(StorageKey::Sessions, "bad")
			.await
			.unwrap_err();
		assert!(matches!(err, StorageError::Serialization(_)));
	}
}
