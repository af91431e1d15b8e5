//! Event types for inter-component communication.
//!
//! Events flow through a broadcast bus so read-side consumers (cached views,
//! audit trails) can react to workflow mutations without being awaited for
//! correctness.

use crate::{OrderStatus, Stage};
use serde::{Deserialize, Serialize};

/// Main event type encompassing all fulfillment events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FulfillmentEvent {
	/// Events from the workflow coordinator.
	Progress(ProgressEvent),
	/// Cache-invalidation signals for read-side views.
	Cache(CacheEvent),
}

/// Events related to stage progress and order lifecycle changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProgressEvent {
	/// A stage record was created for an order.
	StageRecorded { order_id: String, stage: Stage },
	/// A stage record's payload was replaced.
	StageUpdated { order_id: String, stage: Stage },
	/// A stage record was deleted.
	StageRemoved { order_id: String, stage: Stage },
	/// The order's derived status changed.
	StatusChanged {
		order_id: String,
		status: OrderStatus,
	},
	/// The order was explicitly completed.
	OrderCompleted { order_id: String },
	/// The order was explicitly cancelled.
	OrderCancelled { order_id: String },
}

/// Fire-and-forget signals for read-freshness, never for correctness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CacheEvent {
	/// Cached views for the given order are stale and must be rebuilt.
	ViewsInvalidated { order_id: String },
}
