//! Session persistence adapter.
//!
//! The only component that reads or writes wizard instances. Instances live
//! under the `sessions` storage namespace keyed by wizard id; retention is
//! the backend's `ttl_sessions`.

use std::sync::Arc;
use thiserror::Error;
use wizard_storage::{StorageError, StorageService};
use wizard_types::{StorageKey, WizardInstance};

#[derive(Debug, Error)]
pub enum SessionError {
	#[error("Wizard not found: {0}")]
	NotFound(String),
	#[error("Storage error: {0}")]
	Storage(String),
}

pub struct SessionStore {
	storage: Arc<StorageService>,
}

impl SessionStore {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	pub async fn load(&self, id: &str) -> Result<WizardInstance, SessionError> {
		self.storage
			.retrieve(StorageKey::Sessions, id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => SessionError::NotFound(id.to_string()),
				other => SessionError::Storage(other.to_string()),
			})
	}

	pub async fn save(&self, instance: &WizardInstance) -> Result<(), SessionError> {
		self.storage
			.store(StorageKey::Sessions, &instance.id, instance)
			.await
			.map_err(|e| SessionError::Storage(e.to_string()))
	}

	pub async fn exists(&self, id: &str) -> Result<bool, SessionError> {
		self.storage
			.exists(StorageKey::Sessions, id)
			.await
			.map_err(|e| SessionError::Storage(e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use wizard_storage::implementations::file::{FileStorage, TtlConfig};
	use wizard_storage::implementations::memory::MemoryStorage;
	use wizard_types::{Client, WizardState};

	fn memory_store() -> (SessionStore, Arc<StorageService>) {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		(SessionStore::new(storage.clone()), storage)
	}

	#[tokio::test]
	async fn test_missing_session_is_not_found() {
		let (sessions, _) = memory_store();
		assert!(matches!(
			sessions.load("nope").await,
			Err(SessionError::NotFound(id)) if id == "nope"
		));
		assert!(!sessions.exists("nope").await.unwrap());
	}

	#[tokio::test]
	async fn test_save_load_keeps_bytes_identical() {
		let dir = tempfile::tempdir().unwrap();
		let storage = Arc::new(StorageService::new(Box::new(FileStorage::new(
			dir.path().to_path_buf(),
			TtlConfig::default(),
		))));
		let sessions = SessionStore::new(storage.clone());

		let mut instance = WizardInstance::new("wz-1");
		instance.state = WizardState::OrderInitialization;
		instance.context.client = Some(Client {
			id: "c-001".into(),
			first_name: "Olena".into(),
			last_name: "Koval".into(),
			phone: "+380501112233".into(),
			email: None,
		});
		sessions.save(&instance).await.unwrap();
		let before = storage.retrieve_bytes(StorageKey::Sessions, "wz-1").await.unwrap();

		let loaded = sessions.load("wz-1").await.unwrap();
		assert_eq!(loaded, instance);
		sessions.save(&loaded).await.unwrap();
		let after = storage.retrieve_bytes(StorageKey::Sessions, "wz-1").await.unwrap();
		assert_eq!(before, after);
	}
}
