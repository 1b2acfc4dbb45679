//! Inbound SignNow webhooks: signature verification and event republication.
//!
//! A delivery is published as [`WEBHOOK_EVENT`] only when its `X-SignNow-Signature` header
//! carries a valid HMAC-SHA256 of the raw body under the configured webhook secret. Every
//! other delivery is dropped with a warning. Nothing about the outcome reaches the sender;
//! the optional axum route answers `200 OK` either way.

pub mod publish;
#[cfg(feature = "axum")] pub mod route;
pub mod signature;

pub use publish::*;
#[cfg(feature = "axum")] pub use route::*;
pub use signature::*;

// self
use crate::{
	_prelude::*,
	config::SignNowConfig,
	obs::{self, Operation, OperationOutcome, OperationSpan, obs_event},
	request,
};

/// Event name used for verified deliveries.
pub const WEBHOOK_EVENT: &str = "signnow:webhook";
/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "X-SignNow-Signature";
/// Path the webhook route listens on.
pub const WEBHOOK_PATH: &str = "/signnow";

/// Inbound webhook delivery as received.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
	/// Body bytes exactly as delivered.
	pub raw_body: Vec<u8>,
	/// Request headers; names keep the casing they arrived with.
	pub headers: BTreeMap<String, String>,
}
impl WebhookEvent {
	/// Creates an event from a raw body and headers.
	pub fn new(raw_body: impl Into<Vec<u8>>, headers: BTreeMap<String, String>) -> Self {
		Self { raw_body: raw_body.into(), headers }
	}

	/// Adds a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Looks up a header regardless of name casing.
	pub fn header(&self, name: &str) -> Option<&str> {
		request::find_header(&self.headers, name)
	}

	/// Signature header value, if present.
	pub fn signature(&self) -> Option<&str> {
		self.header(SIGNATURE_HEADER)
	}
}

/// Reasons a delivery fails authentication.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum WebhookError {
	/// No webhook secret is configured, so no delivery can be authenticated.
	#[error("Webhook secret key is not configured.")]
	MissingSecret,
	/// The webhook secret cannot key the HMAC.
	#[error("Webhook secret key is unusable.")]
	InvalidSecret,
	/// The delivery has no signature header or it is empty.
	#[error("Webhook delivery carries no signature.")]
	MissingSignature,
	/// The signature is neither hex nor base64.
	#[error("Webhook signature is not valid hex or base64.")]
	MalformedSignature,
	/// The signature does not match the body.
	#[error("Webhook signature does not match the payload.")]
	SignatureInvalid,
}

/// What happened to a delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WebhookOutcome {
	/// Verified and handed to the publisher.
	Published,
	/// Dropped because authentication failed.
	Rejected(WebhookError),
}

/// Verifies deliveries and republishes the authentic ones.
#[derive(Clone)]
pub struct WebhookIngress {
	verifier: Option<SignatureVerifier>,
	publisher: Arc<dyn EventPublisher>,
}
impl WebhookIngress {
	/// Creates an ingress keyed with the configured webhook secret.
	///
	/// Without a secret every delivery is rejected with [`WebhookError::MissingSecret`].
	pub fn new(config: &SignNowConfig, publisher: Arc<dyn EventPublisher>) -> Self {
		let verifier = config.webhook_secret_key.clone().map(SignatureVerifier::new);

		Self { verifier, publisher }
	}

	/// Authenticates `event` without publishing it.
	pub fn authenticate(&self, event: &WebhookEvent) -> Result<(), WebhookError> {
		let verifier = self.verifier.as_ref().ok_or(WebhookError::MissingSecret)?;
		let signature = event.signature().ok_or(WebhookError::MissingSignature)?;

		verifier.check(&event.raw_body, signature)
	}

	/// Verifies `event` and publishes it as [`WEBHOOK_EVENT`] on success.
	///
	/// Never fails: rejections and publisher errors are logged and absorbed.
	pub async fn handle(&self, event: WebhookEvent) -> WebhookOutcome {
		const OPERATION: Operation = Operation::Webhook;

		let span = OperationSpan::new(OPERATION, "deliver").with_route(WEBHOOK_PATH);

		obs::record_operation(OPERATION, OperationOutcome::Attempt);

		span.instrument(async move {
			if let Err(err) = self.authenticate(&event) {
				obs_event!(warn, error = %err, "Invalid signature for webhook.");
				obs::record_operation(OPERATION, OperationOutcome::Rejected);

				return WebhookOutcome::Rejected(err);
			}

			match self.publisher.publish(WEBHOOK_EVENT, event).await {
				Ok(()) => obs::record_operation(OPERATION, OperationOutcome::Success),
				Err(_err) => {
					obs_event!(error, error = %_err, "Webhook event could not be published.");
					obs::record_operation(OPERATION, OperationOutcome::Failure);
				},
			}

			WebhookOutcome::Published
		})
		.await
	}
}
impl Debug for WebhookIngress {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("WebhookIngress").field("verifier", &self.verifier).finish()
	}
}
