//! Cross-stage gating rules.
//!
//! Decides whether a stage record may be created given the state of prior
//! stages, and whether one may be deleted without breaking stages that
//! depend on it. Read-only: all decisions come from the progress store
//! snapshot; nothing here mutates state.

use crate::store::ProgressStore;
use crate::WorkflowError;
use fulfillment_types::Stage;
use std::sync::Arc;

/// Checks ordering and delivery prerequisites against the progress store.
pub struct PrerequisiteChecker {
	progress: Arc<ProgressStore>,
}

impl PrerequisiteChecker {
	pub fn new(progress: Arc<ProgressStore>) -> Self {
		Self { progress }
	}

	/// Ensures a record for `stage` may be created for the order.
	///
	/// Rejects with `Conflict` if a record for the target stage already
	/// exists, and with `Prerequisite` if an earlier stage is missing,
	/// incomplete, or (for application) the goods have not been received.
	pub async fn ensure_can_create(
		&self,
		order_id: &str,
		stage: Stage,
	) -> Result<(), WorkflowError> {
		if self.progress.find(order_id, stage).await?.is_some() {
			return Err(WorkflowError::Conflict(format!(
				"a {} record already exists for order {}",
				stage, order_id
			)));
		}

		match stage {
			Stage::Warehouse => Ok(()),
			Stage::Shipping => {
				self.require_complete(order_id, Stage::Warehouse, "Warehouse must be completed before shipping")
					.await?;
				Ok(())
			},
			Stage::Applied => {
				let shipping = self
					.require_complete(
						order_id,
						Stage::Shipping,
						"Shipping must be completed before application",
					)
					.await?;
				if !shipping {
					return Err(WorkflowError::Prerequisite(
						"Goods must be received before application can start".to_string(),
					));
				}
				Ok(())
			},
			Stage::Result => {
				self.require_complete(
					order_id,
					Stage::Applied,
					"Application must be completed before recording a yield result",
				)
				.await?;
				Ok(())
			},
		}
	}

	/// Ensures a record for `stage` may be deleted for the order.
	///
	/// Deletion is forbidden while any strictly later stage has a record,
	/// so derived state never references a vanished prerequisite.
	pub async fn ensure_can_delete(
		&self,
		order_id: &str,
		stage: Stage,
	) -> Result<(), WorkflowError> {
		for later in Stage::all().filter(|s| s.index() > stage.index()) {
			if self.progress.find(order_id, later).await?.is_some() {
				return Err(WorkflowError::Conflict(format!(
					"cannot delete the {} record while a {} record exists for order {}",
					stage, later, order_id
				)));
			}
		}
		Ok(())
	}

	/// Requires that `stage` exists and is complete; returns whether the
	/// record is also marked delivered (meaningful for shipping only).
	async fn require_complete(
		&self,
		order_id: &str,
		stage: Stage,
		message: &str,
	) -> Result<bool, WorkflowError> {
		match self.progress.find(order_id, stage).await? {
			Some(record) if record.is_complete() => Ok(record.payload.is_delivered()),
			_ => Err(WorkflowError::Prerequisite(message.to_string())),
		}
	}
}
