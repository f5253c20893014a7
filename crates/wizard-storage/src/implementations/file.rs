//! File-per-key storage backend.
//!
//! Each key maps to `<storage_path>/<key>.bin`, where `:` and path separators
//! in the key become `_`. A file starts with a fixed 64-byte header carrying
//! the expiry time, followed by the value bytes. Writes go to a uniquely
//! named temp file in the same directory which is then renamed over the
//! target, so readers never observe a partial value and two concurrent
//! writers never share a temp file.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncReadExt;
use wizard_types::{
	current_timestamp, ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, StorageKey,
	ValidationError,
};

/// Layout: magic (4) | version (2, LE) | expires_at (8, LE unix secs, 0 = never) | zero padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileHeader {
	expires_at: u64,
}

impl FileHeader {
	const MAGIC: &'static [u8; 4] = b"OWZS";
	const VERSION: u16 = 1;
	const SIZE: usize = 64;

	fn with_ttl(ttl: Duration) -> Self {
		let expires_at = if ttl.is_zero() {
			0
		} else {
			current_timestamp().saturating_add(ttl.as_secs().max(1))
		};
		Self { expires_at }
	}

	fn encode(&self) -> [u8; Self::SIZE] {
		let mut bytes = [0u8; Self::SIZE];
		bytes[0..4].copy_from_slice(Self::MAGIC);
		bytes[4..6].copy_from_slice(&Self::VERSION.to_le_bytes());
		bytes[6..14].copy_from_slice(&self.expires_at.to_le_bytes());
		bytes
	}

	fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
		if bytes.len() < Self::SIZE || &bytes[0..4] != Self::MAGIC {
			return Err(StorageError::Backend("Corrupt storage file header".into()));
		}
		let version = u16::from_le_bytes([bytes[4], bytes[5]]);
		if version > Self::VERSION {
			return Err(StorageError::Backend(format!(
				"Unsupported storage file version: {}",
				version
			)));
		}
		let mut expires = [0u8; 8];
		expires.copy_from_slice(&bytes[6..14]);
		Ok(Self {
			expires_at: u64::from_le_bytes(expires),
		})
	}

	fn is_expired(&self) -> bool {
		self.expires_at != 0 && current_timestamp() >= self.expires_at
	}
}

/// Default TTL per namespace, read from `ttl_<namespace>` keys (seconds).
#[derive(Debug, Clone, Default)]
pub struct TtlConfig {
	ttls: HashMap<StorageKey, Duration>,
}

impl TtlConfig {
	pub fn from_config(config: &toml::Value) -> Self {
		let ttls = StorageKey::all()
			.filter_map(|key| {
				config
					.get(format!("ttl_{}", key.as_str()))
					.and_then(|v| v.as_integer())
					.map(|secs| (key, Duration::from_secs(secs.max(0) as u64)))
			})
			.collect();
		Self { ttls }
	}

	/// TTL for a `<namespace>:<id>` key; zero (never expires) when unset.
	fn for_key(&self, key: &str) -> Duration {
		key.split(':')
			.next()
			.and_then(|ns| ns.parse::<StorageKey>().ok())
			.and_then(|ns| self.ttls.get(&ns).copied())
			.unwrap_or(Duration::ZERO)
	}
}

pub struct FileStorage {
	base_path: PathBuf,
	ttl_config: TtlConfig,
}

impl FileStorage {
	pub fn new(base_path: PathBuf, ttl_config: TtlConfig) -> Self {
		Self {
			base_path,
			ttl_config,
		}
	}

	fn path_for(&self, key: &str) -> PathBuf {
		let safe_key = key.replace(['/', '\\', ':'], "_");
		self.base_path.join(format!("{}.bin", safe_key))
	}

	async fn read_header(path: &PathBuf) -> std::io::Result<[u8; FileHeader::SIZE]> {
		let mut file = fs::File::open(path).await?;
		let mut buf = [0u8; FileHeader::SIZE];
		file.read_exact(&mut buf).await?;
		Ok(buf)
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let data = match fs::read(self.path_for(key)).await {
			Ok(data) => data,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(StorageError::NotFound)
			},
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let header = FileHeader::decode(&data)?;
		if header.is_expired() {
			return Err(StorageError::NotFound);
		}
		Ok(data[FileHeader::SIZE..].to_vec())
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		fs::create_dir_all(&self.base_path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		let ttl = ttl.unwrap_or_else(|| self.ttl_config.for_key(key));
		let mut contents = Vec::with_capacity(FileHeader::SIZE + value.len());
		contents.extend_from_slice(&FileHeader::with_ttl(ttl).encode());
		contents.extend_from_slice(&value);

		let path = self.path_for(key);
		let temp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
		fs::write(&temp_path, contents)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		if let Err(e) = fs::rename(&temp_path, &path).await {
			let _ = fs::remove_file(&temp_path).await;
			return Err(StorageError::Backend(e.to_string()));
		}
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		match fs::remove_file(self.path_for(key)).await {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		match Self::read_header(&self.path_for(key)).await {
			Ok(bytes) => Ok(FileHeader::decode(&bytes).is_ok_and(|h| !h.is_expired())),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
			Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}

	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		let mut entries = match fs::read_dir(&self.base_path).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut removed = 0;
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension().and_then(|ext| ext.to_str()) != Some("bin") {
				continue;
			}
			let header = match Self::read_header(&path).await {
				Ok(bytes) => FileHeader::decode(&bytes),
				Err(e) => {
					tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable storage file");
					continue;
				},
			};
			if header.is_ok_and(|h| h.is_expired()) {
				match fs::remove_file(&path).await {
					Ok(()) => removed += 1,
					Err(e) => {
						tracing::warn!(path = %path.display(), error = %e, "Failed to remove expired file")
					},
				}
			}
		}
		Ok(removed)
	}
}

pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let mut optional = vec![Field::new("storage_path", FieldType::String)];
		optional.extend(StorageKey::all().map(|key| {
			Field::new(
				format!("ttl_{}", key.as_str()),
				FieldType::Integer {
					min: Some(0),
					max: None,
				},
			)
		}));
		Schema::new(vec![], optional).validate(config)
	}
}

/// Configuration:
/// - `storage_path`: directory for the files (default `./data/storage`)
/// - `ttl_sessions`, `ttl_orders`: default TTL in seconds, 0 = keep forever
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/storage");

	Ok(Box::new(FileStorage::new(
		PathBuf::from(storage_path),
		TtlConfig::from_config(config),
	)))
}

pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;
	use tempfile::TempDir;

	fn storage_in(dir: &TempDir, ttl_sessions: Option<i64>) -> FileStorage {
		let mut table = toml::map::Map::new();
		if let Some(ttl) = ttl_sessions {
			table.insert("ttl_sessions".into(), toml::Value::Integer(ttl));
		}
		FileStorage::new(
			dir.path().to_path_buf(),
			TtlConfig::from_config(&toml::Value::Table(table)),
		)
	}

	#[tokio::test]
	async fn test_round_trip_and_delete() {
		let dir = TempDir::new().unwrap();
		let storage = storage_in(&dir, None);

		storage
			.set_bytes("sessions:abc", b"payload".to_vec(), None)
			.await
			.unwrap();
		assert!(dir.path().join("sessions_abc.bin").exists());
		assert_eq!(
			storage.get_bytes("sessions:abc").await.unwrap(),
			b"payload".to_vec()
		);
		assert!(storage.exists("sessions:abc").await.unwrap());

		storage.delete("sessions:abc").await.unwrap();
		assert!(!storage.exists("sessions:abc").await.unwrap());
		assert!(matches!(
			storage.get_bytes("sessions:abc").await,
			Err(StorageError::NotFound)
		));
		storage.delete("sessions:abc").await.unwrap();
	}

	#[tokio::test]
	async fn test_no_temp_files_left_behind() {
		let dir = TempDir::new().unwrap();
		let storage = storage_in(&dir, None);
		storage.set_bytes("orders:1", b"a".to_vec(), None).await.unwrap();
		storage.set_bytes("orders:1", b"b".to_vec(), None).await.unwrap();

		let mut names = Vec::new();
		let mut entries = fs::read_dir(dir.path()).await.unwrap();
		while let Some(entry) = entries.next_entry().await.unwrap() {
			names.push(entry.file_name().to_string_lossy().to_string());
		}
		assert_eq!(names, vec!["orders_1.bin".to_string()]);
	}

	#[tokio::test]
	async fn test_concurrent_writers_do_not_corrupt() {
		let dir = TempDir::new().unwrap();
		let storage = Arc::new(storage_in(&dir, None));

		let mut handles = Vec::new();
		for i in 0..8u8 {
			let storage = storage.clone();
			handles.push(tokio::spawn(async move {
				storage
					.set_bytes("sessions:same", vec![i; 4096], None)
					.await
			}));
		}
		for handle in handles {
			handle.await.unwrap().unwrap();
		}

		let value = storage.get_bytes("sessions:same").await.unwrap();
		assert_eq!(value.len(), 4096);
		assert!(value.iter().all(|b| *b == value[0]));
	}

	#[tokio::test]
	async fn test_namespace_ttl_applies() {
		let dir = TempDir::new().unwrap();
		let storage = storage_in(&dir, Some(3600));
		storage.set_bytes("sessions:x", b"x".to_vec(), None).await.unwrap();

		let raw = fs::read(dir.path().join("sessions_x.bin")).await.unwrap();
		let header = FileHeader::decode(&raw).unwrap();
		assert!(header.expires_at >= current_timestamp() + 3599);

		storage.set_bytes("orders:x", b"x".to_vec(), None).await.unwrap();
		let raw = fs::read(dir.path().join("orders_x.bin")).await.unwrap();
		assert_eq!(FileHeader::decode(&raw).unwrap().expires_at, 0);
	}

	#[tokio::test]
	async fn test_cleanup_removes_expired_files() {
		let dir = TempDir::new().unwrap();
		let storage = storage_in(&dir, None);

		let expired = FileHeader {
			expires_at: current_timestamp() - 10,
		};
		let mut contents = expired.encode().to_vec();
		contents.extend_from_slice(b"old");
		fs::write(dir.path().join("sessions_old.bin"), contents)
			.await
			.unwrap();
		storage.set_bytes("sessions:new", b"new".to_vec(), None).await.unwrap();

		assert!(matches!(
			storage.get_bytes("sessions:old").await,
			Err(StorageError::NotFound)
		));
		assert_eq!(storage.cleanup_expired().await.unwrap(), 1);
		assert!(storage.exists("sessions:new").await.unwrap());
	}

	#[test]
	fn test_schema_rejects_negative_ttl() {
		let config: toml::Value = toml::from_str("ttl_sessions = -1").unwrap();
		assert!(FileStorageSchema.validate(&config).is_err());
		let config: toml::Value =
			toml::from_str("storage_path = \"/tmp/x\"\nttl_orders = 0").unwrap();
		assert!(FileStorageSchema.validate(&config).is_ok());
	}
}
