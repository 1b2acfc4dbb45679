#![allow(dead_code)]

// std
use std::{sync::Arc, time::Duration};
// crates.io
use parking_lot::Mutex;
use serde_json::{Value, json};
use signnow_client::{
	auth::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TokenSecret},
	client::{SignNowClient, refresh::TOKEN_PATH},
	config::SignNowConfig,
	error::TransportError,
	http::{Callbacks, HttpResponse, HttpTransport, TransportFuture},
	request::{self, Method, RequestOptions},
	store::{MemoryStore, Sealing, SecretStore},
};

pub const BASE_URL: &str = "https://api.signnow.test";
pub const STATIC_REFRESH: &str = "static-refresh";

/// One request as the simulator saw it.
#[derive(Clone, Debug)]
pub struct RecordedCall {
	pub method: Method,
	pub path: String,
	pub url: Option<String>,
	pub authorization: Option<String>,
	pub headers: std::collections::BTreeMap<String, String>,
	pub params: std::collections::BTreeMap<String, Value>,
	pub body: Option<Value>,
	pub retry: bool,
}
impl RecordedCall {
	fn capture(method: Method, request: &RequestOptions) -> Self {
		Self {
			method,
			path: request.path.clone(),
			url: request.url.clone(),
			authorization: request.authorization.as_ref().and_then(|auth| auth.header_value()),
			headers: request.headers.clone(),
			params: request.params.clone(),
			body: request.body.clone(),
			retry: request.retry,
		}
	}

	pub fn header(&self, name: &str) -> Option<&str> {
		request::find_header(&self.headers, name)
	}

	pub fn body_field(&self, name: &str) -> Option<&str> {
		self.body.as_ref()?.get(name)?.as_str()
	}
}

#[derive(Debug, Default)]
struct SimState {
	accepted: Option<String>,
	generation: u32,
	calls: Vec<RecordedCall>,
	api_failure: Option<u16>,
	token_failure: Option<u16>,
	token_body: Option<Value>,
	reject_all: bool,
}

/// Scripted SignNow API.
///
/// API calls succeed only with the access token issued last; the token endpoint issues
/// `access-N`/`refresh-N` on its N-th call.
#[derive(Debug, Default)]
pub struct SignNowSimulator {
	state: Mutex<SimState>,
	refresh_delay: Option<Duration>,
}
impl SignNowSimulator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Accepts `token` until the next refresh.
	pub fn accepting(self, token: &str) -> Self {
		self.state.lock().accepted = Some(token.to_owned());

		self
	}

	pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
		self.refresh_delay = Some(delay);

		self
	}

	/// Every API call fails with `status`.
	pub fn failing_api(self, status: u16) -> Self {
		self.state.lock().api_failure = Some(status);

		self
	}

	/// The token endpoint fails with `status`.
	pub fn failing_token_endpoint(self, status: u16) -> Self {
		self.state.lock().token_failure = Some(status);

		self
	}

	/// The token endpoint answers `200` with `body`.
	pub fn token_body(self, body: Value) -> Self {
		self.state.lock().token_body = Some(body);

		self
	}

	/// Every API call is rejected with `401`, refreshed token or not.
	pub fn rejecting_all(self) -> Self {
		self.state.lock().reject_all = true;

		self
	}

	pub fn calls(&self) -> Vec<RecordedCall> {
		self.state.lock().calls.clone()
	}

	pub fn api_calls(&self) -> Vec<RecordedCall> {
		self.calls().into_iter().filter(|call| call.path != TOKEN_PATH).collect()
	}

	pub fn token_calls(&self) -> Vec<RecordedCall> {
		self.calls().into_iter().filter(|call| call.path == TOKEN_PATH).collect()
	}

	async fn token(&self) -> Result<HttpResponse, TransportError> {
		if let Some(delay) = self.refresh_delay {
			tokio::time::sleep(delay).await;
		}

		let mut state = self.state.lock();

		if let Some(status) = state.token_failure {
			return Err(TransportError::Status {
				status,
				body: r#"{"error":"invalid_grant"}"#.into(),
				retry_after: None,
			});
		}
		if let Some(body) = &state.token_body {
			return Ok(HttpResponse::new(200).with_json(body));
		}

		state.generation += 1;

		let access = format!("access-{}", state.generation);
		let refresh = format!("refresh-{}", state.generation);

		state.accepted = Some(access.clone());

		Ok(HttpResponse::new(200).with_json(&json!({
			"access_token": access,
			"refresh_token": refresh,
			"expires_in": 2592000,
			"token_type": "bearer",
		})))
	}

	fn api(&self, call: &RecordedCall) -> Result<HttpResponse, TransportError> {
		let state = self.state.lock();

		if let Some(status) = state.api_failure {
			return Err(TransportError::status_only(status));
		}

		let expected = state.accepted.as_ref().map(|token| format!("Bearer {token}"));

		if state.reject_all || expected.is_none() || call.authorization != expected {
			return Err(TransportError::Status {
				status: 401,
				body: r#"{"error":"invalid_token"}"#.into(),
				retry_after: None,
			});
		}

		Ok(HttpResponse::new(200).with_json(&json!({ "path": call.path })))
	}
}
impl HttpTransport for SignNowSimulator {
	fn send<'a>(
		&'a self,
		method: Method,
		request: &'a RequestOptions,
		callbacks: &'a Callbacks,
	) -> TransportFuture<'a> {
		Box::pin(async move {
			let call = RecordedCall::capture(method, request);

			self.state.lock().calls.push(call.clone());

			let result = if call.path == TOKEN_PATH { self.token().await } else { self.api(&call) };

			callbacks.notify(&result);

			result
		})
	}
}

pub fn config() -> SignNowConfig {
	SignNowConfig::new(BASE_URL).with_refresh_token(STATIC_REFRESH)
}

/// Store holding `access` and `refresh` sealed the way the client reads them.
pub async fn seeded_store(access: Option<&str>, refresh: Option<&str>) -> Arc<MemoryStore> {
	let store = Arc::new(MemoryStore::default());

	if let Some(access) = access {
		store
			.put(ACCESS_TOKEN_KEY, TokenSecret::new(access), Sealing::Encrypted)
			.await
			.expect("Seeding the access token should succeed.");
	}
	if let Some(refresh) = refresh {
		store
			.put(REFRESH_TOKEN_KEY, TokenSecret::new(refresh), Sealing::Encrypted)
			.await
			.expect("Seeding the refresh token should succeed.");
	}

	store
}

pub async fn stored(store: &MemoryStore, key: &str) -> Option<String> {
	store
		.get(key, Sealing::Encrypted)
		.await
		.expect("Store read should succeed.")
		.map(|secret| secret.expose().to_owned())
}

pub fn build_client(
	config: SignNowConfig,
	store: Arc<MemoryStore>,
	simulator: Arc<SignNowSimulator>,
) -> SignNowClient<SignNowSimulator> {
	SignNowClient::with_transport(config, store, simulator)
		.expect("Client configuration should be valid.")
}
