//! Event bus seam for verified webhook deliveries.

// self
use crate::{_prelude::*, webhook::WebhookEvent};

/// Boxed future returned by [`EventPublisher::publish`].
pub type PublishFuture<'a> = Pin<Box<dyn Future<Output = Result<(), PublishError>> + 'a + Send>>;

/// Receives webhook events that passed signature verification.
pub trait EventPublisher
where
	Self: Send + Sync,
{
	/// Publishes `event` under `event_name`.
	fn publish<'a>(&'a self, event_name: &'a str, event: WebhookEvent) -> PublishFuture<'a>;
}

/// Failure reported by an [`EventPublisher`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Event publication failed: {message}.")]
pub struct PublishError {
	/// Publisher-specific description.
	pub message: String,
}
impl PublishError {
	/// Creates an error from any message.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}
}

/// In-process publisher that records every event it receives.
#[derive(Clone, Debug, Default)]
pub struct MemoryPublisher(Arc<Mutex<Vec<(String, WebhookEvent)>>>);
impl MemoryPublisher {
	/// Snapshot of the recorded `(event_name, event)` pairs in publication order.
	pub fn events(&self) -> Vec<(String, WebhookEvent)> {
		self.0.lock().clone()
	}
}
impl EventPublisher for MemoryPublisher {
	fn publish<'a>(&'a self, event_name: &'a str, event: WebhookEvent) -> PublishFuture<'a> {
		Box::pin(async move {
			self.0.lock().push((event_name.to_owned(), event));

			Ok(())
		})
	}
}
