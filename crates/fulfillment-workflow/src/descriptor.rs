//! Static stage descriptor set.
//!
//! One descriptor per stage, mapping the closed tag set to its validator,
//! completeness predicate, and the human-readable prerequisite description
//! used in rejection messages. Kept as a lookup table rather than trait
//! objects so the stage set stays closed and exhaustively checkable.

use crate::validation;
use fulfillment_types::{Stage, StagePayload, ValidationError};
use serde_json::Value;

/// Per-stage behavior bundle.
pub struct StageDescriptor {
	/// The stage this descriptor belongs to.
	pub stage: Stage,
	/// Converts an untyped payload into a typed one, or rejects it.
	pub validate: fn(&Value) -> Result<StagePayload, ValidationError>,
	/// Decides whether a stage payload counts as done.
	pub is_complete: fn(&StagePayload) -> bool,
	/// What must hold before this stage may be created.
	pub prerequisite: &'static str,
}

static DESCRIPTORS: [StageDescriptor; 4] = [
	StageDescriptor {
		stage: Stage::Warehouse,
		validate: |v| validation::validate_payload(Stage::Warehouse, v),
		is_complete: StagePayload::is_complete,
		prerequisite: "none",
	},
	StageDescriptor {
		stage: Stage::Shipping,
		validate: |v| validation::validate_payload(Stage::Shipping, v),
		is_complete: StagePayload::is_complete,
		prerequisite: "Warehouse must be completed before shipping",
	},
	StageDescriptor {
		stage: Stage::Applied,
		validate: |v| validation::validate_payload(Stage::Applied, v),
		is_complete: StagePayload::is_complete,
		prerequisite: "Shipping must be completed and goods received before application",
	},
	StageDescriptor {
		stage: Stage::Result,
		validate: |v| validation::validate_payload(Stage::Result, v),
		is_complete: StagePayload::is_complete,
		prerequisite: "Application must be completed before recording a yield result",
	},
];

/// Looks up the descriptor for a stage.
pub fn descriptor(stage: Stage) -> &'static StageDescriptor {
	&DESCRIPTORS[stage.index()]
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn table_is_ordered_by_stage_index() {
		for (i, stage) in Stage::all().enumerate() {
			assert_eq!(descriptor(stage).stage, stage);
			assert_eq!(stage.index(), i);
		}
	}

	#[test]
	fn descriptor_dispatches_to_stage_validator() {
		let payload = (descriptor(Stage::Warehouse).validate)(&json!({ "status": true })).unwrap();
		assert_eq!(payload, StagePayload::Warehouse { status: true });

		// A warehouse-shaped payload is not valid for the applied stage.
		let mismatch = (descriptor(Stage::Applied).validate)(&json!({ "status": true }));
		assert!(mismatch.is_err());
	}

	#[test]
	fn completeness_goes_through_the_table() {
		let payload = StagePayload::Warehouse { status: false };
		assert!(!(descriptor(Stage::Warehouse).is_complete)(&payload));
	}
}
