//! Per-stage payload validation.
//!
//! Callers submit a stage name and an untyped JSON payload; this module
//! converts it into a typed `StagePayload` or rejects it with a
//! field-attributed error. Validation is pure and stateless, fails fast, and
//! never partially accepts a payload.

use chrono::{DateTime, Utc};
use fulfillment_types::{Stage, StagePayload, ValidationError};
use serde_json::{Map, Value};

/// Maximum allowed deviation of the actual applied area from the estimate,
/// as a fraction of the estimate.
const MAX_AREA_DEVIATION: f64 = 0.5;

/// Validates an untyped payload against the rules of the given stage.
pub fn validate_payload(stage: Stage, payload: &Value) -> Result<StagePayload, ValidationError> {
	let fields = payload
		.as_object()
		.ok_or_else(|| ValidationError::Malformed(format!("expected an object, got {}", type_name(payload))))?;

	match stage {
		Stage::Warehouse => validate_warehouse(fields),
		Stage::Shipping => validate_shipping(fields),
		Stage::Applied => validate_applied(fields),
		Stage::Result => validate_result(fields),
	}
}

fn validate_warehouse(fields: &Map<String, Value>) -> Result<StagePayload, ValidationError> {
	reject_unknown(fields, Stage::Warehouse, &["status"])?;
	let status = required_bool(fields, "status")?;
	Ok(StagePayload::Warehouse { status })
}

fn validate_shipping(fields: &Map<String, Value>) -> Result<StagePayload, ValidationError> {
	reject_unknown(fields, Stage::Shipping, &["status", "date_shipping", "date_received"])?;
	let status = required_bool(fields, "status")?;
	let date_shipping = optional_datetime(fields, "date_shipping")?;
	let date_received = optional_datetime(fields, "date_received")?;

	if status && date_shipping.is_none() {
		return Err(ValidationError::MissingField("date_shipping".to_string()));
	}

	let now = Utc::now();
	for (field, date) in [("date_shipping", date_shipping), ("date_received", date_received)] {
		if let Some(date) = date {
			if date > now {
				return Err(ValidationError::InvalidValue {
					field: field.to_string(),
					message: "date must not be in the future".to_string(),
				});
			}
		}
	}

	if let (Some(shipped), Some(received)) = (date_shipping, date_received) {
		if received < shipped {
			return Err(ValidationError::InvalidValue {
				field: "date_received".to_string(),
				message: "must not be earlier than date_shipping".to_string(),
			});
		}
	}

	Ok(StagePayload::Shipping {
		status,
		date_shipping,
		date_received,
	})
}

fn validate_applied(fields: &Map<String, Value>) -> Result<StagePayload, ValidationError> {
	reject_unknown(fields, Stage::Applied, &["est_applied_area", "actual_applied_area"])?;
	let est_applied_area = required_number(fields, "est_applied_area")?;
	if est_applied_area <= 0.0 {
		return Err(ValidationError::InvalidValue {
			field: "est_applied_area".to_string(),
			message: "must be greater than zero".to_string(),
		});
	}

	let actual_applied_area = optional_number(fields, "actual_applied_area")?;
	if let Some(actual) = actual_applied_area {
		if actual < 0.0 {
			return Err(ValidationError::InvalidValue {
				field: "actual_applied_area".to_string(),
				message: "must not be negative".to_string(),
			});
		}
		if (actual - est_applied_area).abs() > est_applied_area * MAX_AREA_DEVIATION {
			return Err(ValidationError::InvalidValue {
				field: "actual_applied_area".to_string(),
				message: "deviates from the estimated area by more than 50%".to_string(),
			});
		}
	}

	Ok(StagePayload::Applied {
		est_applied_area,
		actual_applied_area,
	})
}

fn validate_result(fields: &Map<String, Value>) -> Result<StagePayload, ValidationError> {
	// The legacy enum-gated shape (yield_result = "gain" | "no_gain") is
	// deprecated and rejected here as an unknown field.
	reject_unknown(fields, Stage::Result, &["status", "yield_amount"])?;
	let status = required_bool(fields, "status")?;
	let yield_amount = optional_number(fields, "yield_amount")?;

	if let Some(amount) = yield_amount {
		if amount < 0.0 {
			return Err(ValidationError::InvalidValue {
				field: "yield_amount".to_string(),
				message: "must not be negative".to_string(),
			});
		}
	}

	if status && yield_amount.is_none() {
		return Err(ValidationError::MissingField("yield_amount".to_string()));
	}
	if !status {
		if let Some(amount) = yield_amount {
			if amount != 0.0 {
				return Err(ValidationError::InvalidValue {
					field: "yield_amount".to_string(),
					message: "must be absent or zero when status is false".to_string(),
				});
			}
		}
	}

	Ok(StagePayload::Result { status, yield_amount })
}

fn reject_unknown(
	fields: &Map<String, Value>,
	stage: Stage,
	allowed: &[&str],
) -> Result<(), ValidationError> {
	for key in fields.keys() {
		if !allowed.contains(&key.as_str()) {
			return Err(ValidationError::InvalidValue {
				field: key.clone(),
				message: format!("unexpected field for the {} stage", stage),
			});
		}
	}
	Ok(())
}

fn required_bool(fields: &Map<String, Value>, field: &str) -> Result<bool, ValidationError> {
	match fields.get(field) {
		None | Some(Value::Null) => Err(ValidationError::MissingField(field.to_string())),
		Some(Value::Bool(b)) => Ok(*b),
		Some(other) => Err(ValidationError::TypeMismatch {
			field: field.to_string(),
			expected: "boolean".to_string(),
			actual: type_name(other).to_string(),
		}),
	}
}

fn required_number(fields: &Map<String, Value>, field: &str) -> Result<f64, ValidationError> {
	optional_number(fields, field)?.ok_or_else(|| ValidationError::MissingField(field.to_string()))
}

fn optional_number(fields: &Map<String, Value>, field: &str) -> Result<Option<f64>, ValidationError> {
	match fields.get(field) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::Number(n)) => {
			let value = n.as_f64().ok_or_else(|| ValidationError::InvalidValue {
				field: field.to_string(),
				message: "not representable as a finite number".to_string(),
			})?;
			if !value.is_finite() {
				return Err(ValidationError::InvalidValue {
					field: field.to_string(),
					message: "must be a finite number".to_string(),
				});
			}
			Ok(Some(value))
		},
		Some(other) => Err(ValidationError::TypeMismatch {
			field: field.to_string(),
			expected: "number".to_string(),
			actual: type_name(other).to_string(),
		}),
	}
}

fn optional_datetime(
	fields: &Map<String, Value>,
	field: &str,
) -> Result<Option<DateTime<Utc>>, ValidationError> {
	match fields.get(field) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(s)) => {
			let parsed = DateTime::parse_from_rfc3339(s).map_err(|e| ValidationError::InvalidValue {
				field: field.to_string(),
				message: format!("not a valid RFC 3339 timestamp: {}", e),
			})?;
			Ok(Some(parsed.with_timezone(&Utc)))
		},
		Some(other) => Err(ValidationError::TypeMismatch {
			field: field.to_string(),
			expected: "RFC 3339 timestamp string".to_string(),
			actual: type_name(other).to_string(),
		}),
	}
}

fn type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;
	use serde_json::json;

	#[test]
	fn warehouse_requires_status() {
		let payload = validate_payload(Stage::Warehouse, &json!({ "status": true })).unwrap();
		assert_eq!(payload, StagePayload::Warehouse { status: true });

		let missing = validate_payload(Stage::Warehouse, &json!({}));
		assert_eq!(missing, Err(ValidationError::MissingField("status".to_string())));

		let wrong_type = validate_payload(Stage::Warehouse, &json!({ "status": "yes" }));
		assert!(matches!(wrong_type, Err(ValidationError::TypeMismatch { .. })));
	}

	#[test]
	fn non_object_payload_is_malformed() {
		let result = validate_payload(Stage::Warehouse, &json!([1, 2, 3]));
		assert!(matches!(result, Err(ValidationError::Malformed(_))));
	}

	#[test]
	fn unknown_field_is_rejected() {
		let result = validate_payload(Stage::Warehouse, &json!({ "status": true, "carrier": "acme" }));
		assert!(matches!(
			result,
			Err(ValidationError::InvalidValue { field, .. }) if field == "carrier"
		));
	}

	#[test]
	fn shipping_requires_date_when_shipped() {
		let result = validate_payload(Stage::Shipping, &json!({ "status": true }));
		assert_eq!(
			result,
			Err(ValidationError::MissingField("date_shipping".to_string()))
		);

		// Not yet shipped: no date needed.
		let pending = validate_payload(Stage::Shipping, &json!({ "status": false })).unwrap();
		assert!(!pending.is_complete());
	}

	#[test]
	fn shipping_rejects_future_dates() {
		let tomorrow = (Utc::now() + Duration::days(1)).to_rfc3339();
		let result = validate_payload(
			Stage::Shipping,
			&json!({ "status": true, "date_shipping": tomorrow }),
		);
		assert!(matches!(
			result,
			Err(ValidationError::InvalidValue { field, .. }) if field == "date_shipping"
		));
	}

	#[test]
	fn shipping_rejects_received_before_shipped() {
		let shipped = (Utc::now() - Duration::days(1)).to_rfc3339();
		let received = (Utc::now() - Duration::days(3)).to_rfc3339();
		let result = validate_payload(
			Stage::Shipping,
			&json!({ "status": true, "date_shipping": shipped, "date_received": received }),
		);
		assert!(matches!(
			result,
			Err(ValidationError::InvalidValue { field, .. }) if field == "date_received"
		));
	}

	#[test]
	fn shipping_accepts_delivery_dates() {
		let shipped = (Utc::now() - Duration::days(3)).to_rfc3339();
		let received = (Utc::now() - Duration::days(1)).to_rfc3339();
		let payload = validate_payload(
			Stage::Shipping,
			&json!({ "status": true, "date_shipping": shipped, "date_received": received }),
		)
		.unwrap();
		assert!(payload.is_complete());
		assert!(payload.is_delivered());
	}

	#[test]
	fn shipping_rejects_malformed_dates() {
		let result = validate_payload(
			Stage::Shipping,
			&json!({ "status": true, "date_shipping": "yesterday" }),
		);
		assert!(matches!(
			result,
			Err(ValidationError::InvalidValue { field, .. }) if field == "date_shipping"
		));
	}

	#[test]
	fn applied_requires_positive_estimate() {
		let zero = validate_payload(Stage::Applied, &json!({ "est_applied_area": 0.0 }));
		assert!(matches!(
			zero,
			Err(ValidationError::InvalidValue { field, .. }) if field == "est_applied_area"
		));

		let ok = validate_payload(Stage::Applied, &json!({ "est_applied_area": 12.5 })).unwrap();
		assert!(ok.is_complete());
	}

	#[test]
	fn applied_bounds_deviation_at_fifty_percent() {
		// 15.0 is exactly 50% above the estimate of 10.0: allowed.
		let at_bound = validate_payload(
			Stage::Applied,
			&json!({ "est_applied_area": 10.0, "actual_applied_area": 15.0 }),
		);
		assert!(at_bound.is_ok());

		let beyond = validate_payload(
			Stage::Applied,
			&json!({ "est_applied_area": 10.0, "actual_applied_area": 15.1 }),
		);
		assert!(matches!(
			beyond,
			Err(ValidationError::InvalidValue { field, .. }) if field == "actual_applied_area"
		));

		let below = validate_payload(
			Stage::Applied,
			&json!({ "est_applied_area": 10.0, "actual_applied_area": 4.9 }),
		);
		assert!(below.is_err());
	}

	#[test]
	fn applied_rejects_negative_actual() {
		let result = validate_payload(
			Stage::Applied,
			&json!({ "est_applied_area": 10.0, "actual_applied_area": -1.0 }),
		);
		assert!(matches!(
			result,
			Err(ValidationError::InvalidValue { field, .. }) if field == "actual_applied_area"
		));
	}

	#[test]
	fn result_requires_yield_amount_on_gain() {
		let missing = validate_payload(Stage::Result, &json!({ "status": true }));
		assert_eq!(
			missing,
			Err(ValidationError::MissingField("yield_amount".to_string()))
		);

		let ok = validate_payload(Stage::Result, &json!({ "status": true, "yield_amount": 50.0 }));
		assert!(ok.is_ok());
	}

	#[test]
	fn result_forbids_yield_amount_on_no_gain() {
		let nonzero = validate_payload(Stage::Result, &json!({ "status": false, "yield_amount": 5.0 }));
		assert!(matches!(
			nonzero,
			Err(ValidationError::InvalidValue { field, .. }) if field == "yield_amount"
		));

		// Zero is tolerated alongside a false status.
		let zero = validate_payload(Stage::Result, &json!({ "status": false, "yield_amount": 0.0 }));
		assert!(zero.is_ok());

		let absent = validate_payload(Stage::Result, &json!({ "status": false }));
		assert!(absent.is_ok());
	}

	#[test]
	fn result_rejects_legacy_enum_shape() {
		let result = validate_payload(
			Stage::Result,
			&json!({ "yield_result": "gain", "yield_amount": 50.0 }),
		);
		assert!(matches!(
			result,
			Err(ValidationError::InvalidValue { field, .. }) if field == "yield_result"
		));
	}
}
