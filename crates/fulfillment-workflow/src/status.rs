//! Pure derivation of the order's aggregate status.
//!
//! Evaluated as an ordered cascade over the order's progress records, most
//! advanced condition first. The function is pure and idempotent: the same
//! snapshot always yields the same status. `completed` and `cancelled` are
//! never derived here; they are set only by the explicit transitions on the
//! coordinator.

use fulfillment_types::{OrderStatus, ProgressRecord, Stage, StagePayload};

/// Derives the aggregate lifecycle status from an order's progress records.
pub fn derive_status(records: &[ProgressRecord]) -> OrderStatus {
	let find = |stage: Stage| records.iter().find(|r| r.stage == stage);

	if let Some(shipping) = find(Stage::Shipping) {
		if shipping.payload.is_delivered() {
			return OrderStatus::Delivered;
		}
		if let StagePayload::Shipping {
			status: true,
			date_shipping: Some(_),
			..
		} = shipping.payload
		{
			return OrderStatus::Shipped;
		}
	}

	if let Some(warehouse) = find(Stage::Warehouse) {
		if let StagePayload::Warehouse { status: true } = warehouse.payload {
			return OrderStatus::Warehouse;
		}
	}

	OrderStatus::Pending
}
