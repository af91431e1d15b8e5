//! File-based storage backend implementation.
//!
//! This module stores each value as a file on the filesystem, providing
//! simple persistence without requiring external dependencies. Writes are
//! atomic via temp-file-and-rename; create-if-absent relies on the
//! filesystem's `create_new` semantics so two concurrent creates for the
//! same key cannot both succeed.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use fulfillment_types::ImplementationRegistry;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// File-based storage implementation.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
}

impl FileStorage {
	/// Creates a new FileStorage instance with the specified base path.
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Converts a storage key to a filesystem-safe file path.
	///
	/// Sanitizes the key by replacing problematic characters and
	/// appending a .json extension.
	fn get_file_path(&self, key: &str) -> PathBuf {
		let safe_key = key.replace(['/', ':'], "_");
		self.base_path.join(format!("{}.json", safe_key))
	}

	async fn ensure_base_dir(&self) -> Result<(), StorageError> {
		fs::create_dir_all(&self.base_path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key);

		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		self.ensure_base_dir().await?;
		let path = self.get_file_path(key);

		// Write atomically by writing to temp file then renaming
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}

	async fn create_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		self.ensure_base_dir().await?;
		let path = self.get_file_path(key);

		// create_new is the atomicity guarantee: the open fails if the file
		// already exists, even against a concurrent creator.
		let mut file = match fs::OpenOptions::new()
			.write(true)
			.create_new(true)
			.open(&path)
			.await
		{
			Ok(file) => file,
			Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
				return Err(StorageError::AlreadyExists)
			},
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		file.write_all(&value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		file.flush()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let path = self.get_file_path(key);
		Ok(path.exists())
	}
}

/// Registry entry for the file storage backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = crate::StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl crate::StorageRegistry for Registry {}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for file storage (default: "./data/storage")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/storage")
		.to_string();

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn storage() -> (TempDir, FileStorage) {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());
		(dir, storage)
	}

	#[tokio::test]
	async fn test_round_trip() {
		let (_dir, storage) = storage();

		storage
			.set_bytes("orders:o-1", b"{\"id\":\"o-1\"}".to_vec())
			.await
			.unwrap();
		let data = storage.get_bytes("orders:o-1").await.unwrap();
		assert_eq!(data, b"{\"id\":\"o-1\"}".to_vec());

		assert!(storage.exists("orders:o-1").await.unwrap());
		storage.delete("orders:o-1").await.unwrap();
		assert!(!storage.exists("orders:o-1").await.unwrap());
		assert!(matches!(
			storage.get_bytes("orders:o-1").await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_create_new_is_exclusive() {
		let (_dir, storage) = storage();

		storage
			.create_bytes("progress_index:o-1:warehouse", b"rec-1".to_vec())
			.await
			.unwrap();
		let second = storage
			.create_bytes("progress_index:o-1:warehouse", b"rec-2".to_vec())
			.await;
		assert!(matches!(second, Err(StorageError::AlreadyExists)));
	}

	#[tokio::test]
	async fn test_delete_missing_is_ok() {
		let (_dir, storage) = storage();
		storage.delete("orders:missing").await.unwrap();
	}
}
