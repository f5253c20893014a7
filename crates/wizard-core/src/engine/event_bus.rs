//! Broadcast channel for engine notifications.
//!
//! Publishing never blocks; with no subscribers the event is dropped and
//! slow subscribers lose the oldest events once `capacity` is exceeded.

use tokio::sync::broadcast;
use wizard_types::EngineEvent;

#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
		self.sender.subscribe()
	}

	pub fn publish(
		&self,
		event: EngineEvent,
	) -> Result<usize, broadcast::error::SendError<EngineEvent>> {
		self.sender.send(event)
	}
}
