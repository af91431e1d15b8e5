//! Payload validation error types.
//!
//! Stage payloads arrive as untyped JSON and are converted by the workflow
//! validator. Every rejection is attributed to a field so callers can render
//! precise user feedback instead of a generic failure.

use thiserror::Error;

/// Errors that can occur while validating a stage payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
	/// A required field is missing from the payload.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// A field is present but carries an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// A field has the wrong type.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
	/// The payload is not an object or cannot be deserialized at all.
	#[error("Malformed payload: {0}")]
	Malformed(String),
}
