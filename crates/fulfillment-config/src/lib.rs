//! Configuration module for the fulfillment tracking system.
//!
//! This module provides structures and utilities for managing configuration.
//! It supports loading configuration from TOML files and provides validation
//! to ensure all required configuration values are properly set.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the fulfillment engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration for the storage backend.
	pub storage: StorageConfig,
}

/// Configuration for the persistence layer.
///
/// The `primary` field names which implementation to use; backend-specific
/// settings live under `implementations.<name>` and are handed to the
/// matching factory as an opaque TOML section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Name of the storage implementation to use (e.g. "memory", "file").
	pub primary: String,
	/// Backend-specific configuration sections, keyed by implementation name.
	#[serde(default)]
	pub implementations: HashMap<String, toml::Value>,
}

impl StorageConfig {
	/// Returns the configuration section for the selected backend.
	///
	/// Backends without required settings may omit their section, in which
	/// case an empty table is returned.
	pub fn backend_config(&self) -> toml::Value {
		self.implementations
			.get(&self.primary)
			.cloned()
			.unwrap_or_else(|| toml::Value::Table(toml::map::Map::new()))
	}
}

impl Config {
	/// Loads configuration from a TOML file at the given path.
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path)?;
		Self::from_toml_str(&content)
	}

	/// Parses configuration from a TOML string.
	pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
		let config: Config = toml::from_str(content)?;
		config.validate()?;
		Ok(config)
	}

	/// Validates the configuration values.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.storage.primary.trim().is_empty() {
			return Err(ConfigError::Validation(
				"storage.primary must not be empty".to_string(),
			));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn parses_minimal_config() {
		let config = Config::from_toml_str(
			r#"
			[storage]
			primary = "memory"
			"#,
		)
		.unwrap();
		assert_eq!(config.storage.primary, "memory");
		// No section configured: the backend gets an empty table.
		assert!(config.storage.backend_config().as_table().unwrap().is_empty());
	}

	#[test]
	fn parses_backend_section() {
		let config = Config::from_toml_str(
			r#"
			[storage]
			primary = "file"

			[storage.implementations.file]
			storage_path = "/var/lib/fulfillment"
			"#,
		)
		.unwrap();
		let section = config.storage.backend_config();
		assert_eq!(
			section.get("storage_path").and_then(|v| v.as_str()),
			Some("/var/lib/fulfillment")
		);
	}

	#[test]
	fn rejects_empty_primary() {
		let result = Config::from_toml_str(
			r#"
			[storage]
			primary = ""
			"#,
		);
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}

	#[test]
	fn loads_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[storage]\nprimary = \"memory\"").unwrap();
		let config = Config::from_file(file.path()).unwrap();
		assert_eq!(config.storage.primary, "memory");
	}

	#[test]
	fn missing_storage_section_is_a_parse_error() {
		let result = Config::from_toml_str("");
		assert!(matches!(result, Err(ConfigError::Parse(_))));
	}
}
