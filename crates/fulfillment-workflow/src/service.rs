//! Workflow coordinator facade.
//!
//! `WorkflowService` is the only component with side effects beyond the store
//! adapters: every stage mutation runs validate, prerequisite check, persist,
//! status re-derivation, and a fire-and-forget cache invalidation signal, in
//! that order. Each operation is transactional from the caller's point of
//! view; a rejection at any step leaves no partial record behind.

use crate::descriptor::descriptor;
use crate::event_bus::EventBus;
use crate::prerequisites::PrerequisiteChecker;
use crate::status::derive_status;
use crate::store::{OrderStore, ProgressStore};
use crate::WorkflowError;
use dashmap::DashMap;
use fulfillment_storage::StorageService;
use fulfillment_types::{
	CacheEvent, FulfillmentEvent, Order, OrderStatus, ProgressEvent, ProgressRecord,
	ProgressSummary, Stage,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;

/// Coordinates the staged progress workflow for orders.
pub struct WorkflowService {
	orders: OrderStore,
	progress: Arc<ProgressStore>,
	prerequisites: PrerequisiteChecker,
	event_bus: EventBus,
	/// Per-order locks serializing mutations so two concurrent stage writes
	/// cannot leave a stale derived status behind.
	order_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl WorkflowService {
	/// Creates a new workflow service on top of the given storage backend.
	pub fn new(storage: Arc<StorageService>, event_bus: EventBus) -> Self {
		let progress = Arc::new(ProgressStore::new(storage.clone()));
		Self {
			orders: OrderStore::new(storage),
			prerequisites: PrerequisiteChecker::new(progress.clone()),
			progress,
			event_bus,
			order_locks: DashMap::new(),
		}
	}

	/// Returns a subscription to the workflow event stream.
	pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<FulfillmentEvent> {
		self.event_bus.subscribe()
	}

	fn order_lock(&self, order_id: &str) -> Arc<Mutex<()>> {
		self.order_locks
			.entry(order_id.to_string())
			.or_insert_with(|| Arc::new(Mutex::new(())))
			.clone()
	}

	fn ensure_mutable(&self, order: &Order) -> Result<(), WorkflowError> {
		if order.status.is_terminal() {
			return Err(WorkflowError::TerminalState {
				order_id: order.id.clone(),
				status: order.status,
			});
		}
		Ok(())
	}

	fn invalidate_views(&self, order_id: &str) {
		self.event_bus
			.publish(FulfillmentEvent::Cache(CacheEvent::ViewsInvalidated {
				order_id: order_id.to_string(),
			}));
	}

	/// Re-derives and persists the order's status from the current records.
	///
	/// The derived value unconditionally overwrites the status field; callers
	/// gate on terminal states before any mutation reaches this point.
	async fn rederive_status(&self, order: &Order) -> Result<OrderStatus, WorkflowError> {
		let records = self.progress.find_all(&order.id).await?;
		let status = derive_status(&records);
		self.orders.update_status(&order.id, status).await?;
		if status != order.status {
			tracing::info!(order_id = %order.id, from = %order.status, to = %status, "Order status changed");
			self.event_bus
				.publish(FulfillmentEvent::Progress(ProgressEvent::StatusChanged {
					order_id: order.id.clone(),
					status,
				}));
		}
		Ok(status)
	}

	/// Creates a new pending order.
	pub async fn create_order(&self, order_id: &str) -> Result<Order, WorkflowError> {
		let order = Order::new(order_id);
		self.orders.insert(&order).await?;
		Ok(order)
	}

	/// Fetches an order by id.
	pub async fn get_order(&self, order_id: &str) -> Result<Order, WorkflowError> {
		self.orders.get(order_id).await
	}

	/// Records progress for a stage of an order.
	#[instrument(skip(self, payload), fields(order_id = %order_id, stage = %stage))]
	pub async fn create_stage_progress(
		&self,
		order_id: &str,
		stage: Stage,
		payload: serde_json::Value,
	) -> Result<ProgressRecord, WorkflowError> {
		let lock = self.order_lock(order_id);
		let _guard = lock.lock().await;

		let order = self.orders.get(order_id).await?;
		self.ensure_mutable(&order)?;

		let validated = (descriptor(stage).validate)(&payload)?;
		self.prerequisites.ensure_can_create(order_id, stage).await?;

		let record = ProgressRecord::new(order_id, validated);
		// The store's index create is the second line of defense: a racer
		// that slipped past the checker still surfaces as a conflict here.
		self.progress.create(&record).await?;

		self.rederive_status(&order).await?;
		self.event_bus
			.publish(FulfillmentEvent::Progress(ProgressEvent::StageRecorded {
				order_id: order_id.to_string(),
				stage,
			}));
		self.invalidate_views(order_id);

		tracing::info!(progress_id = %record.id, "Stage progress recorded");
		Ok(record)
	}

	/// Replaces the payload of an existing progress record.
	///
	/// The payload is validated against the record's existing stage.
	/// Ordering prerequisites are deliberately not re-checked: a stage once
	/// legitimately created may be edited without being re-gated.
	#[instrument(skip(self, payload), fields(progress_id = %progress_id))]
	pub async fn update_stage_progress(
		&self,
		progress_id: &str,
		payload: serde_json::Value,
	) -> Result<ProgressRecord, WorkflowError> {
		let existing = self.progress.get(progress_id).await?;
		let lock = self.order_lock(&existing.order_id);
		let _guard = lock.lock().await;
		// Re-read under the lock in case a concurrent delete won the race.
		let existing = self.progress.get(progress_id).await?;

		let order = self.orders.get(&existing.order_id).await?;
		self.ensure_mutable(&order)?;

		let validated = (descriptor(existing.stage).validate)(&payload)?;
		let updated = self.progress.update_payload(progress_id, validated).await?;

		self.rederive_status(&order).await?;
		self.event_bus
			.publish(FulfillmentEvent::Progress(ProgressEvent::StageUpdated {
				order_id: order.id.clone(),
				stage: updated.stage,
			}));
		self.invalidate_views(&order.id);

		Ok(updated)
	}

	/// Deletes a progress record if no later stage depends on it.
	#[instrument(skip(self), fields(progress_id = %progress_id))]
	pub async fn delete_stage_progress(&self, progress_id: &str) -> Result<(), WorkflowError> {
		let existing = self.progress.get(progress_id).await?;
		let lock = self.order_lock(&existing.order_id);
		let _guard = lock.lock().await;
		let existing = self.progress.get(progress_id).await?;

		let order = self.orders.get(&existing.order_id).await?;
		self.ensure_mutable(&order)?;

		self.prerequisites
			.ensure_can_delete(&existing.order_id, existing.stage)
			.await?;
		let removed = self.progress.delete(progress_id).await?;

		self.rederive_status(&order).await?;
		self.event_bus
			.publish(FulfillmentEvent::Progress(ProgressEvent::StageRemoved {
				order_id: order.id.clone(),
				stage: removed.stage,
			}));
		self.invalidate_views(&order.id);

		Ok(())
	}

	/// Reports per-stage completeness for an order.
	pub async fn stage_status(
		&self,
		order_id: &str,
	) -> Result<BTreeMap<Stage, bool>, WorkflowError> {
		self.orders.get(order_id).await?;
		let records = self.progress.find_all(order_id).await?;

		let mut status = BTreeMap::new();
		for stage in Stage::all() {
			let completed = records
				.iter()
				.find(|r| r.stage == stage)
				.map(|r| (descriptor(stage).is_complete)(&r.payload))
				.unwrap_or(false);
			status.insert(stage, completed);
		}
		Ok(status)
	}

	/// First stage in the fixed order that is not yet complete.
	pub async fn next_available_stage(
		&self,
		order_id: &str,
	) -> Result<Option<Stage>, WorkflowError> {
		let status = self.stage_status(order_id).await?;
		Ok(Stage::all().find(|stage| !status[stage]))
	}

	/// Aggregated progress view, derived purely from stage completeness.
	pub async fn progress_summary(&self, order_id: &str) -> Result<ProgressSummary, WorkflowError> {
		let status = self.stage_status(order_id).await?;
		let completed_stages: Vec<Stage> = Stage::all().filter(|stage| status[stage]).collect();
		let current_stage = completed_stages.last().copied();
		let next_stage = Stage::all().find(|stage| !status[stage]);
		let total = Stage::ORDERED.len();
		let percent_complete = (completed_stages.len() * 100 / total) as u8;

		Ok(ProgressSummary {
			is_fully_complete: completed_stages.len() == total,
			completed_stages,
			current_stage,
			next_stage,
			percent_complete,
		})
	}

	/// Explicitly completes an order. Irreversible.
	///
	/// Requires the order to be non-terminal and its yield result stage to
	/// be complete.
	#[instrument(skip(self), fields(order_id = %order_id))]
	pub async fn complete_order(&self, order_id: &str) -> Result<Order, WorkflowError> {
		let lock = self.order_lock(order_id);
		let _guard = lock.lock().await;

		let order = self.orders.get(order_id).await?;
		self.ensure_mutable(&order)?;

		let result_complete = self
			.progress
			.find(order_id, Stage::Result)
			.await?
			.map(|r| r.is_complete())
			.unwrap_or(false);
		if !result_complete {
			return Err(WorkflowError::Prerequisite(
				"Yield result must be recorded before completing the order".to_string(),
			));
		}

		let updated = self.orders.update_status(order_id, OrderStatus::Completed).await?;
		self.event_bus
			.publish(FulfillmentEvent::Progress(ProgressEvent::OrderCompleted {
				order_id: order_id.to_string(),
			}));
		self.invalidate_views(order_id);

		tracing::info!("Order completed");
		Ok(updated)
	}

	/// Explicitly cancels an order. Irreversible; blocks all subsequent
	/// stage mutation.
	#[instrument(skip(self), fields(order_id = %order_id))]
	pub async fn cancel_order(&self, order_id: &str) -> Result<Order, WorkflowError> {
		let lock = self.order_lock(order_id);
		let _guard = lock.lock().await;

		let order = self.orders.get(order_id).await?;
		self.ensure_mutable(&order)?;

		let updated = self.orders.update_status(order_id, OrderStatus::Cancelled).await?;
		self.event_bus
			.publish(FulfillmentEvent::Progress(ProgressEvent::OrderCancelled {
				order_id: order_id.to_string(),
			}));
		self.invalidate_views(order_id);

		tracing::info!("Order cancelled");
		Ok(updated)
	}
}
