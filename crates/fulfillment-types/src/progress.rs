//! Progress record and summary types.

use crate::{Stage, StagePayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The persisted payload capturing a single stage's state for one order.
///
/// At most one record exists per (order_id, stage) pair; the storage layer
/// enforces this with an atomic create-if-absent on the uniqueness index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
	/// Unique identifier for this record.
	pub id: String,
	/// The order this record belongs to.
	pub order_id: String,
	/// Which of the four stages this record captures.
	pub stage: Stage,
	/// Stage-specific data, replaced wholesale on update.
	pub payload: StagePayload,
	/// Timestamp when this record was created.
	pub created_at: DateTime<Utc>,
	/// Timestamp of the last update, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub updated_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
	/// Creates a new record with a fresh identifier for the payload's stage.
	pub fn new(order_id: impl Into<String>, payload: StagePayload) -> Self {
		Self {
			id: Uuid::new_v4().to_string(),
			order_id: order_id.into(),
			stage: payload.stage(),
			payload,
			created_at: Utc::now(),
			updated_at: None,
		}
	}

	/// Whether this record's stage counts as done.
	pub fn is_complete(&self) -> bool {
		self.payload.is_complete()
	}
}

/// Aggregated view of an order's progress, derived purely from the per-stage
/// completeness predicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
	/// Stages whose completeness predicate holds, in workflow order.
	pub completed_stages: Vec<Stage>,
	/// Most advanced complete stage, if any.
	pub current_stage: Option<Stage>,
	/// First incomplete stage in workflow order, if any remain.
	pub next_stage: Option<Stage>,
	/// Completed stages as a percentage of the four total.
	pub percent_complete: u8,
	/// True when all four stages are complete.
	pub is_fully_complete: bool,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_record_takes_stage_from_payload() {
		let record = ProgressRecord::new("order-1", StagePayload::Warehouse { status: true });
		assert_eq!(record.stage, Stage::Warehouse);
		assert_eq!(record.order_id, "order-1");
		assert!(record.updated_at.is_none());
		assert!(record.is_complete());
	}

	#[test]
	fn summary_serializes_camel_case() {
		let summary = ProgressSummary {
			completed_stages: vec![Stage::Warehouse],
			current_stage: Some(Stage::Warehouse),
			next_stage: Some(Stage::Shipping),
			percent_complete: 25,
			is_fully_complete: false,
		};
		let json = serde_json::to_value(&summary).unwrap();
		assert_eq!(json["percentComplete"], 25);
		assert_eq!(json["nextStage"], "shipping");
	}
}
