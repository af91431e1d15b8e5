//! Stage identifiers and per-stage payload shapes.
//!
//! The four fulfillment stages form a fixed, closed, ordered set:
//! warehouse(0) < shipping(1) < applied(2) < result(3). Each stage carries a
//! distinct payload shape, modeled as a tagged union so the set stays closed
//! and exhaustively checkable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four fixed fulfillment stages, in workflow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
	/// Warehouse release of the goods.
	Warehouse,
	/// Shipping and physical delivery.
	Shipping,
	/// Field application of the product.
	Applied,
	/// Yield result reporting.
	Result,
}

impl Stage {
	/// All stages in their fixed workflow order.
	pub const ORDERED: [Stage; 4] = [Stage::Warehouse, Stage::Shipping, Stage::Applied, Stage::Result];

	/// Position of this stage in the fixed order, starting at zero.
	pub fn index(&self) -> usize {
		match self {
			Stage::Warehouse => 0,
			Stage::Shipping => 1,
			Stage::Applied => 2,
			Stage::Result => 3,
		}
	}

	/// The stage immediately before this one, if any.
	pub fn predecessor(&self) -> Option<Stage> {
		match self {
			Stage::Warehouse => None,
			_ => Some(Self::ORDERED[self.index() - 1]),
		}
	}

	/// Returns an iterator over all stages in workflow order.
	pub fn all() -> impl Iterator<Item = Self> {
		Self::ORDERED.into_iter()
	}

	/// Returns the string representation of the stage.
	pub fn as_str(&self) -> &'static str {
		match self {
			Stage::Warehouse => "warehouse",
			Stage::Shipping => "shipping",
			Stage::Applied => "applied",
			Stage::Result => "result",
		}
	}
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Stage {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"warehouse" => Ok(Self::Warehouse),
			"shipping" => Ok(Self::Shipping),
			"applied" => Ok(Self::Applied),
			"result" => Ok(Self::Result),
			_ => Err(()),
		}
	}
}

/// Stage-specific progress data, tagged by the stage it belongs to.
///
/// Payloads are replaced wholesale on update, never merged. The validator in
/// the workflow crate is the only producer of these values from untyped
/// input; once constructed, a payload satisfies its stage's field rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "lowercase")]
pub enum StagePayload {
	/// Warehouse release flag.
	Warehouse {
		/// Whether the goods have been released.
		status: bool,
	},
	/// Shipping progress and delivery dates.
	Shipping {
		/// Whether the goods have been shipped.
		status: bool,
		/// When the goods left the warehouse.
		#[serde(skip_serializing_if = "Option::is_none")]
		date_shipping: Option<DateTime<Utc>>,
		/// When the goods were received by the customer.
		#[serde(skip_serializing_if = "Option::is_none")]
		date_received: Option<DateTime<Utc>>,
	},
	/// Field application areas.
	Applied {
		/// Estimated application area, strictly positive.
		est_applied_area: f64,
		/// Actual application area, if measured.
		#[serde(skip_serializing_if = "Option::is_none")]
		actual_applied_area: Option<f64>,
	},
	/// Yield result report.
	Result {
		/// Whether a yield gain was observed.
		status: bool,
		/// Harvested amount, required when status is true.
		#[serde(skip_serializing_if = "Option::is_none")]
		yield_amount: Option<f64>,
	},
}

impl StagePayload {
	/// The stage this payload belongs to.
	pub fn stage(&self) -> Stage {
		match self {
			StagePayload::Warehouse { .. } => Stage::Warehouse,
			StagePayload::Shipping { .. } => Stage::Shipping,
			StagePayload::Applied { .. } => Stage::Applied,
			StagePayload::Result { .. } => Stage::Result,
		}
	}

	/// The per-stage completeness predicate.
	///
	/// A complete stage counts as "done" for prerequisite checks and for the
	/// progress summary. Note that a `result` payload is complete as soon as
	/// it exists, since its status field is mandatory.
	pub fn is_complete(&self) -> bool {
		match self {
			StagePayload::Warehouse { status } => *status,
			StagePayload::Shipping { status, .. } => *status,
			StagePayload::Applied { est_applied_area, .. } => *est_applied_area > 0.0,
			StagePayload::Result { .. } => true,
		}
	}

	/// True only for a shipping payload whose goods were physically received.
	pub fn is_delivered(&self) -> bool {
		matches!(
			self,
			StagePayload::Shipping {
				date_received: Some(_),
				..
			}
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stage_order_is_fixed() {
		assert!(Stage::Warehouse < Stage::Shipping);
		assert!(Stage::Shipping < Stage::Applied);
		assert!(Stage::Applied < Stage::Result);
		assert_eq!(Stage::Warehouse.predecessor(), None);
		assert_eq!(Stage::Result.predecessor(), Some(Stage::Applied));
		assert_eq!(Stage::all().count(), 4);
	}

	#[test]
	fn stage_round_trips_through_str() {
		for stage in Stage::all() {
			assert_eq!(stage.as_str().parse::<Stage>(), Ok(stage));
		}
		assert!("packaging".parse::<Stage>().is_err());
	}

	#[test]
	fn payload_tag_matches_stage() {
		let payload = StagePayload::Warehouse { status: true };
		let json = serde_json::to_value(&payload).unwrap();
		assert_eq!(json["stage"], "warehouse");
		assert_eq!(payload.stage(), Stage::Warehouse);
	}

	#[test]
	fn completeness_predicates() {
		assert!(StagePayload::Warehouse { status: true }.is_complete());
		assert!(!StagePayload::Warehouse { status: false }.is_complete());
		assert!(!StagePayload::Shipping {
			status: false,
			date_shipping: None,
			date_received: None,
		}
		.is_complete());
		assert!(StagePayload::Applied {
			est_applied_area: 10.0,
			actual_applied_area: None,
		}
		.is_complete());
		// A result record is complete as soon as it exists.
		assert!(StagePayload::Result {
			status: false,
			yield_amount: None,
		}
		.is_complete());
	}

	#[test]
	fn delivered_requires_received_date() {
		let shipped = StagePayload::Shipping {
			status: true,
			date_shipping: Some(Utc::now()),
			date_received: None,
		};
		assert!(!shipped.is_delivered());

		let received = StagePayload::Shipping {
			status: true,
			date_shipping: Some(Utc::now()),
			date_received: Some(Utc::now()),
		};
		assert!(received.is_delivered());
	}
}
