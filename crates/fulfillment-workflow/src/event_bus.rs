//! Event bus for broadcasting workflow events.
//!
//! Read-side consumers subscribe to learn about stage mutations and cache
//! invalidations. Publishing is fire-and-forget: a bus with no subscribers is
//! not an error, and no workflow operation awaits its consumers.

use fulfillment_types::FulfillmentEvent;
use tokio::sync::broadcast;

/// Default channel capacity before slow subscribers start lagging.
const DEFAULT_CAPACITY: usize = 256;

/// Broadcast bus carrying typed workflow events.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<FulfillmentEvent>,
}

impl EventBus {
	/// Creates a new event bus with the given channel capacity.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Publishes an event to all current subscribers.
	///
	/// Returns the number of subscribers the event reached; zero subscribers
	/// is not a failure.
	pub fn publish(&self, event: FulfillmentEvent) -> usize {
		self.sender.send(event).unwrap_or(0)
	}

	/// Creates a new subscription to the event stream.
	pub fn subscribe(&self) -> broadcast::Receiver<FulfillmentEvent> {
		self.sender.subscribe()
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(DEFAULT_CAPACITY)
	}
}
