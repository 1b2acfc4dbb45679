//! Axum route serving [`WEBHOOK_PATH`].

// crates.io
use axum::{
	Router,
	body::Bytes,
	extract::State,
	http::{HeaderMap, StatusCode},
	routing::any,
};
// self
use crate::{
	_prelude::*,
	webhook::{WEBHOOK_PATH, WebhookEvent, WebhookIngress},
};

/// Router accepting deliveries for `ingress` on [`WEBHOOK_PATH`].
///
/// The route matches on path alone; every method reaches the same handler, so the reply
/// never depends on how a delivery was sent.
pub fn router(ingress: WebhookIngress) -> Router {
	Router::new().route(WEBHOOK_PATH, any(receive)).with_state(ingress)
}

async fn receive(
	State(ingress): State<WebhookIngress>,
	headers: HeaderMap,
	body: Bytes,
) -> StatusCode {
	let headers = headers
		.iter()
		.filter_map(|(name, value)| {
			value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
		})
		.collect::<BTreeMap<_, _>>();

	ingress.handle(WebhookEvent::new(body.to_vec(), headers)).await;

	StatusCode::OK
}
