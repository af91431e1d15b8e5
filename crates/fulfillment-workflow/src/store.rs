//! Store adapters for orders and progress records.
//!
//! These wrap the typed `StorageService` with domain-level operations and key
//! layout. Progress records are stored by id; a separate (order, stage) index
//! entry carries the one-record-per-stage uniqueness constraint via the
//! storage layer's atomic create-if-absent.

use crate::WorkflowError;
use chrono::Utc;
use fulfillment_storage::{StorageError, StorageService};
use fulfillment_types::{Order, OrderStatus, ProgressRecord, Stage, StagePayload, StorageKey};
use std::sync::Arc;

fn storage_err(e: StorageError) -> WorkflowError {
	WorkflowError::Storage(e.to_string())
}

/// Store adapter for order records.
pub struct OrderStore {
	storage: Arc<StorageService>,
}

impl OrderStore {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Fetches an order by id.
	pub async fn get(&self, order_id: &str) -> Result<Order, WorkflowError> {
		match self
			.storage
			.retrieve::<Order>(StorageKey::Orders.as_str(), order_id)
			.await
		{
			Ok(order) => Ok(order),
			Err(StorageError::NotFound) => Err(WorkflowError::OrderNotFound(order_id.to_string())),
			Err(e) => Err(storage_err(e)),
		}
	}

	/// Inserts a new order; fails if one already exists under the same id.
	pub async fn insert(&self, order: &Order) -> Result<(), WorkflowError> {
		match self
			.storage
			.create(StorageKey::Orders.as_str(), &order.id, order)
			.await
		{
			Ok(()) => Ok(()),
			Err(StorageError::AlreadyExists) => Err(WorkflowError::Conflict(format!(
				"order {} already exists",
				order.id
			))),
			Err(e) => Err(storage_err(e)),
		}
	}

	/// Overwrites the order's status, stamping `updated_at`.
	pub async fn update_status(
		&self,
		order_id: &str,
		status: OrderStatus,
	) -> Result<Order, WorkflowError> {
		let mut order = self.get(order_id).await?;
		order.status = status;
		order.updated_at = Utc::now();
		self.storage
			.update(StorageKey::Orders.as_str(), order_id, &order)
			.await
			.map_err(storage_err)?;
		Ok(order)
	}
}

/// Store adapter for progress records.
pub struct ProgressStore {
	storage: Arc<StorageService>,
}

impl ProgressStore {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	fn index_id(order_id: &str, stage: Stage) -> String {
		format!("{}:{}", order_id, stage)
	}

	/// Fetches a progress record by id.
	pub async fn get(&self, progress_id: &str) -> Result<ProgressRecord, WorkflowError> {
		match self
			.storage
			.retrieve::<ProgressRecord>(StorageKey::Progress.as_str(), progress_id)
			.await
		{
			Ok(record) => Ok(record),
			Err(StorageError::NotFound) => {
				Err(WorkflowError::ProgressNotFound(progress_id.to_string()))
			},
			Err(e) => Err(storage_err(e)),
		}
	}

	/// Finds the record for an (order, stage) pair, if any.
	pub async fn find(
		&self,
		order_id: &str,
		stage: Stage,
	) -> Result<Option<ProgressRecord>, WorkflowError> {
		let index_id = Self::index_id(order_id, stage);
		let record_id = match self
			.storage
			.retrieve::<String>(StorageKey::ProgressIndex.as_str(), &index_id)
			.await
		{
			Ok(id) => id,
			Err(StorageError::NotFound) => return Ok(None),
			Err(e) => return Err(storage_err(e)),
		};

		match self.get(&record_id).await {
			Ok(record) => Ok(Some(record)),
			Err(WorkflowError::ProgressNotFound(_)) => Err(WorkflowError::Storage(format!(
				"progress index for {} points at missing record {}",
				index_id, record_id
			))),
			Err(e) => Err(e),
		}
	}

	/// Returns all progress records for an order, in stage order.
	pub async fn find_all(&self, order_id: &str) -> Result<Vec<ProgressRecord>, WorkflowError> {
		let mut records = Vec::new();
		for stage in Stage::all() {
			if let Some(record) = self.find(order_id, stage).await? {
				records.push(record);
			}
		}
		Ok(records)
	}

	/// Persists a new record, enforcing the one-record-per-stage invariant.
	///
	/// The index entry is created first with create-if-absent semantics; a
	/// losing racer gets `WorkflowError::Conflict`. If storing the record
	/// body then fails, the index entry is rolled back so no dangling
	/// reservation is left behind.
	pub async fn create(&self, record: &ProgressRecord) -> Result<(), WorkflowError> {
		let index_id = Self::index_id(&record.order_id, record.stage);
		match self
			.storage
			.create(StorageKey::ProgressIndex.as_str(), &index_id, &record.id)
			.await
		{
			Ok(()) => {},
			Err(StorageError::AlreadyExists) => {
				return Err(WorkflowError::Conflict(format!(
					"a {} record already exists for order {}",
					record.stage, record.order_id
				)))
			},
			Err(e) => return Err(storage_err(e)),
		}

		if let Err(e) = self
			.storage
			.create(StorageKey::Progress.as_str(), &record.id, record)
			.await
		{
			if let Err(cleanup) = self
				.storage
				.remove(StorageKey::ProgressIndex.as_str(), &index_id)
				.await
			{
				tracing::warn!(
					index = %index_id,
					error = %cleanup,
					"Failed to roll back progress index after create failure"
				);
			}
			return Err(storage_err(e));
		}

		Ok(())
	}

	/// Replaces a record's payload wholesale, stamping `updated_at`.
	pub async fn update_payload(
		&self,
		progress_id: &str,
		payload: StagePayload,
	) -> Result<ProgressRecord, WorkflowError> {
		let mut record = self.get(progress_id).await?;
		record.payload = payload;
		record.updated_at = Some(Utc::now());
		self.storage
			.update(StorageKey::Progress.as_str(), progress_id, &record)
			.await
			.map_err(storage_err)?;
		Ok(record)
	}

	/// Removes a record and its uniqueness index entry.
	pub async fn delete(&self, progress_id: &str) -> Result<ProgressRecord, WorkflowError> {
		let record = self.get(progress_id).await?;
		self.storage
			.remove(StorageKey::Progress.as_str(), progress_id)
			.await
			.map_err(storage_err)?;
		self.storage
			.remove(
				StorageKey::ProgressIndex.as_str(),
				&Self::index_id(&record.order_id, record.stage),
			)
			.await
			.map_err(storage_err)?;
		Ok(record)
	}
}
