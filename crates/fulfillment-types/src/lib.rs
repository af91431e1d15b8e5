//! Common types module for the fulfillment tracking system.
//!
//! This module defines the core data types and structures used throughout
//! the workflow engine. It provides a centralized location for shared types
//! to ensure consistency across all fulfillment components.

/// Event types for inter-component communication.
pub mod events;
/// Order types including the aggregate lifecycle status.
pub mod order;
/// Progress record and summary types.
pub mod progress;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Stage identifiers and stage payload shapes.
pub mod stage;
/// Storage types for managing persistent data.
pub mod storage;
/// Payload validation error types.
pub mod validation;

// Re-export all types for convenient access
pub use events::*;
pub use order::*;
pub use progress::*;
pub use registry::*;
pub use stage::*;
pub use storage::*;
pub use validation::*;
