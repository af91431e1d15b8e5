//! Staged progress workflow engine for order fulfillment.
//!
//! This crate decides (a) whether a stage's data is well-formed, (b) whether
//! a stage may be created given the state of prior stages, (c) what the
//! order's aggregate status becomes after any stage change, and (d) whether a
//! stage record may be deleted without breaking stages that depend on it.
//! The `WorkflowService` facade orchestrates validate, prerequisite check,
//! persist, status re-derivation, and cache invalidation signaling.

use fulfillment_types::{OrderStatus, ValidationError};
use thiserror::Error;

pub mod builder;
pub mod descriptor;
pub mod event_bus;
pub mod prerequisites;
pub mod service;
pub mod status;
pub mod store;
pub mod validation;

pub use builder::{build_workflow_service, BuilderError};
pub use descriptor::{descriptor, StageDescriptor};
pub use event_bus::EventBus;
pub use prerequisites::PrerequisiteChecker;
pub use service::WorkflowService;
pub use status::derive_status;
pub use store::{OrderStore, ProgressStore};
pub use validation::validate_payload;

/// Errors returned by the workflow engine.
///
/// Every rejection is typed so callers can distinguish "fix your input"
/// (validation) from "workflow state forbids this" (prerequisite, conflict,
/// terminal state). None of these are retried internally; only
/// `Storage` may represent a transient condition worth retrying upstream.
#[derive(Debug, Error)]
pub enum WorkflowError {
	/// The referenced order does not exist.
	#[error("Order not found: {0}")]
	OrderNotFound(String),
	/// The referenced progress record does not exist.
	#[error("Progress record not found: {0}")]
	ProgressNotFound(String),
	/// The payload failed a schema, range, or cross-field rule.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// An ordering or delivery gating rule is unmet.
	#[error("Prerequisite not met: {0}")]
	Prerequisite(String),
	/// A record already exists for the stage, or a delete is blocked by a
	/// dependent stage.
	#[error("Conflict: {0}")]
	Conflict(String),
	/// The order is completed or cancelled and forbids mutation.
	#[error("Order {order_id} is {status} and can no longer be modified")]
	TerminalState {
		order_id: String,
		status: OrderStatus,
	},
	/// The storage layer failed.
	#[error("Storage error: {0}")]
	Storage(String),
}
