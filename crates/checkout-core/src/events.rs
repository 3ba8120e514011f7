//! Broadcast bus for wizard events.

use checkout_types::WizardEvent;
use tokio::sync::broadcast;

/// Fan-out channel for [`WizardEvent`]s.
///
/// Cloning the bus shares the underlying channel. Publishing with no
/// subscribers returns an error which callers are free to ignore.
#[derive(Debug, Clone)]
pub struct EventBus {
	sender: broadcast::Sender<WizardEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity.max(1));
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<WizardEvent> {
		self.sender.subscribe()
	}

	/// Returns the number of subscribers that received the event.
	pub fn publish(
		&self,
		event: WizardEvent,
	) -> Result<usize, broadcast::error::SendError<WizardEvent>> {
		self.sender.send(event)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use checkout_types::StepId;

	#[tokio::test]
	async fn test_subscribers_receive_in_order() {
		let bus = EventBus::new(8);
		let mut rx = bus.subscribe();

		bus.publish(WizardEvent::Advanced {
			from: StepId::Cart,
			to: StepId::Shipping,
		})
		.unwrap();
		bus.publish(WizardEvent::Reset).unwrap();

		assert_eq!(
			rx.recv().await.unwrap(),
			WizardEvent::Advanced {
				from: StepId::Cart,
				to: StepId::Shipping
			}
		);
		assert_eq!(rx.recv().await.unwrap(), WizardEvent::Reset);
	}

	#[test]
	fn test_publish_without_subscribers_errors() {
		let bus = EventBus::new(0);
		assert!(bus.publish(WizardEvent::Reset).is_err());
	}
}
