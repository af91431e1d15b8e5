//! Order types for the fulfillment tracking system.
//!
//! An order is the aggregate whose lifecycle status is derived from the
//! progress recorded at each fulfillment stage. The status field is mutated
//! only through the workflow coordinator, never directly by stage operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate lifecycle status of an order.
///
/// `Pending`, `Warehouse`, `Shipped` and `Delivered` are produced by the
/// status deriver from the order's progress records. `Completed` and
/// `Cancelled` are terminal and reachable only through the explicit
/// transitions on the coordinator. `Applied` and `Amended` are legacy values
/// that remain representable in stored data but are never derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
	/// No stage has made meaningful progress yet.
	Pending,
	/// Goods released from the warehouse.
	Warehouse,
	/// Goods shipped, not yet received.
	Shipped,
	/// Goods received by the customer.
	Delivered,
	/// Legacy value, never produced by derivation.
	Applied,
	/// Explicitly completed; terminal.
	Completed,
	/// Explicitly cancelled; terminal.
	Cancelled,
	/// Legacy value, never produced by derivation.
	Amended,
}

impl OrderStatus {
	/// Returns true for statuses after which no stage mutation is permitted.
	pub fn is_terminal(&self) -> bool {
		matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
	}

	/// Returns the string representation of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Pending => "pending",
			OrderStatus::Warehouse => "warehouse",
			OrderStatus::Shipped => "shipped",
			OrderStatus::Delivered => "delivered",
			OrderStatus::Applied => "applied",
			OrderStatus::Completed => "completed",
			OrderStatus::Cancelled => "cancelled",
			OrderStatus::Amended => "amended",
		}
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A customer order tracked through the four fulfillment stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier for this order.
	pub id: String,
	/// Current aggregate lifecycle status.
	pub status: OrderStatus,
	/// Timestamp when this order was created.
	pub created_at: DateTime<Utc>,
	/// Timestamp when this order was last updated.
	pub updated_at: DateTime<Utc>,
}

impl Order {
	/// Creates a new pending order with the given identifier.
	pub fn new(id: impl Into<String>) -> Self {
		let now = Utc::now();
		Self {
			id: id.into(),
			status: OrderStatus::Pending,
			created_at: now,
			updated_at: now,
		}
	}
}
