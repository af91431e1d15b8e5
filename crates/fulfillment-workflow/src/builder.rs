//! Construction of the workflow service from configuration.
//!
//! Resolves the storage backend named in the configuration against the
//! registered implementations and wires up the coordinator.

use crate::event_bus::EventBus;
use crate::service::WorkflowService;
use fulfillment_config::Config;
use fulfillment_storage::{get_all_implementations, StorageError, StorageService};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during workflow service construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	/// The configuration names a storage backend that is not registered.
	#[error("Unknown storage backend: {0}")]
	UnknownBackend(String),
	/// The storage backend factory rejected its configuration.
	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),
}

/// Builds a workflow service using the storage backend from configuration.
pub fn build_workflow_service(config: &Config) -> Result<WorkflowService, BuilderError> {
	let backend_name = config.storage.primary.as_str();
	let factory = get_all_implementations()
		.into_iter()
		.find(|(name, _)| *name == backend_name)
		.map(|(_, factory)| factory)
		.ok_or_else(|| BuilderError::UnknownBackend(backend_name.to_string()))?;

	let backend = factory(&config.storage.backend_config())?;
	tracing::info!(component = "storage", implementation = %backend_name, "Loaded");

	let storage = Arc::new(StorageService::new(backend));
	Ok(WorkflowService::new(storage, EventBus::default()))
}
