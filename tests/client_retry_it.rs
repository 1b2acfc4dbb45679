mod common;

// std
use std::{sync::Arc, time::Duration};
// crates.io
use parking_lot::Mutex;
use serde_json::{Value, json};
use signnow_client::{
	auth::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY},
	error::{ConfigError, Error, ErrorKind, RefreshError, TransportError},
	http::{Callbacks, HttpResponse, ResponseHandler},
	request::{
		APPLICATION_JSON, CONTENT_TYPE, FORM_URLENCODED, MULTIPART_FORM_DATA, Method,
		RequestOptions,
	},
};
// self
use common::{BASE_URL, STATIC_REFRESH, SignNowSimulator};

#[tokio::test]
async fn expired_token_is_refreshed_once_and_retried() {
	let simulator = Arc::new(SignNowSimulator::new().accepting("live"));
	let store = common::seeded_store(Some("stale"), Some("refresh-0")).await;
	let client = common::build_client(common::config(), store.clone(), simulator.clone());
	let response = client.get("/user", None).await.expect("Retry should succeed.");

	assert_eq!(response.status, 200);
	assert_eq!(response.json::<Value>().expect("Body should be JSON."), json!({ "path": "/user" }));

	let api_calls = simulator.api_calls();

	assert_eq!(api_calls.len(), 2);
	assert_eq!(api_calls[0].authorization.as_deref(), Some("Bearer stale"));
	assert!(!api_calls[0].retry);
	assert_eq!(api_calls[1].authorization.as_deref(), Some("Bearer access-1"));
	assert!(api_calls[1].retry);
	assert_eq!(api_calls[1].url.as_deref(), Some("https://api.signnow.test/user"));

	let token_calls = simulator.token_calls();

	assert_eq!(token_calls.len(), 1);
	assert_eq!(token_calls[0].method, Method::Post);
	assert_eq!(token_calls[0].url.as_deref(), Some("https://api.signnow.test/oauth2/token"));
	assert_eq!(token_calls[0].authorization, None);
	assert_eq!(token_calls[0].header(CONTENT_TYPE), Some(MULTIPART_FORM_DATA));
	assert_eq!(token_calls[0].header("accept"), Some(APPLICATION_JSON));
	assert_eq!(token_calls[0].body_field("grant_type"), Some("refresh_token"));
	assert_eq!(token_calls[0].body_field("refresh_token"), Some("refresh-0"));
	assert_eq!(token_calls[0].body_field("scope"), Some("*"));

	assert_eq!(common::stored(&store, ACCESS_TOKEN_KEY).await.as_deref(), Some("access-1"));
	assert_eq!(common::stored(&store, REFRESH_TOKEN_KEY).await.as_deref(), Some("refresh-1"));
	assert_eq!(client.refresh_metrics.upstream_calls(), 1);
	assert_eq!(client.refresh_metrics.refreshed(), 1);
}

#[tokio::test]
async fn second_rejection_is_returned_after_one_refresh() {
	let simulator = Arc::new(SignNowSimulator::new().accepting("live").rejecting_all());
	let store = common::seeded_store(Some("stale"), Some("refresh-0")).await;
	let client = common::build_client(common::config(), store, simulator.clone());
	let err = client.get("/user", None).await.expect_err("Second 401 should propagate.");

	assert_eq!(err.kind(), ErrorKind::AuthorizationExpired);
	assert_eq!(err.status(), Some(401));
	assert!(matches!(err, Error::Transport(TransportError::Status { status: 401, .. })));
	assert_eq!(simulator.api_calls().len(), 2);
	assert_eq!(simulator.token_calls().len(), 1);
}

#[tokio::test]
async fn other_failures_skip_refresh() {
	let simulator = Arc::new(SignNowSimulator::new().accepting("live").failing_api(503));
	let store = common::seeded_store(Some("live"), Some("refresh-0")).await;
	let client = common::build_client(common::config(), store, simulator.clone());
	let err = client.delete("/document/abc", None).await.expect_err("503 should propagate.");

	assert_eq!(err.kind(), ErrorKind::Transport);
	assert_eq!(err.status(), Some(503));
	assert_eq!(simulator.api_calls().len(), 1);
	assert!(simulator.token_calls().is_empty());
	assert_eq!(client.refresh_metrics.attempts(), 0);
}

#[tokio::test]
async fn retry_marked_descriptor_gets_no_second_attempt() {
	let simulator = Arc::new(SignNowSimulator::new().accepting("live"));
	let store = common::seeded_store(Some("stale"), Some("refresh-0")).await;
	let client = common::build_client(common::config(), store, simulator.clone());
	let options = client
		.configure(RequestOptions { retry: true, ..RequestOptions::new("/user") })
		.await
		.expect("Configuration should succeed.");
	let err = client
		.execute(Method::Get, options, &Callbacks::default())
		.await
		.expect_err("Retry-marked 401 should propagate.");

	assert_eq!(err.kind(), ErrorKind::AuthorizationExpired);
	assert!(simulator.token_calls().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_rejections_share_one_refresh() {
	let simulator = Arc::new(
		SignNowSimulator::new().accepting("live").with_refresh_delay(Duration::from_millis(25)),
	);
	let store = common::seeded_store(Some("stale"), Some("refresh-0")).await;
	let client = common::build_client(common::config(), store.clone(), simulator.clone());
	let mut tasks = Vec::new();

	for i in 0..8 {
		let client = client.clone();

		tasks.push(tokio::spawn(async move { client.get(format!("/document/{i}"), None).await }));
	}
	for task in tasks {
		let response =
			task.await.expect("Task should not panic.").expect("Every call should succeed.");

		assert_eq!(response.status, 200);
	}

	assert_eq!(simulator.token_calls().len(), 1);
	assert_eq!(client.refresh_metrics.upstream_calls(), 1);
	assert_eq!(
		client.refresh_metrics.refreshed() + client.refresh_metrics.reused(),
		client.refresh_metrics.attempts()
	);
	assert_eq!(common::stored(&store, ACCESS_TOKEN_KEY).await.as_deref(), Some("access-1"));
	assert_eq!(common::stored(&store, REFRESH_TOKEN_KEY).await.as_deref(), Some("refresh-1"));
	assert!(
		simulator
			.api_calls()
			.iter()
			.filter(|call| call.retry)
			.all(|call| call.authorization.as_deref() == Some("Bearer access-1"))
	);
}

#[tokio::test]
async fn cleared_tokens_fall_back_to_static_refresh_token() {
	let simulator = Arc::new(SignNowSimulator::new().accepting("live"));
	let store = common::seeded_store(Some("live"), Some("refresh-0")).await;
	let client = common::build_client(common::config(), store.clone(), simulator.clone());

	client.clear_tokens_from_storage().await.expect("Clearing should succeed.");

	assert!(!store.contains(ACCESS_TOKEN_KEY));
	assert!(!store.contains(REFRESH_TOKEN_KEY));

	client.get("/user", None).await.expect("Call should recover through refresh.");

	let api_calls = simulator.api_calls();
	let token_calls = simulator.token_calls();

	assert_eq!(api_calls[0].authorization, None);
	assert_eq!(token_calls.len(), 1);
	assert_eq!(token_calls[0].body_field("refresh_token"), Some(STATIC_REFRESH));
	assert_eq!(common::stored(&store, ACCESS_TOKEN_KEY).await.as_deref(), Some("access-1"));
}

#[tokio::test]
async fn blank_stored_refresh_token_falls_back_to_static() {
	let simulator = Arc::new(SignNowSimulator::new().accepting("live"));
	let store = common::seeded_store(Some("stale"), Some("  ")).await;
	let client = common::build_client(common::config(), store, simulator.clone());

	client.get("/user", None).await.expect("Call should recover through refresh.");

	assert_eq!(simulator.token_calls()[0].body_field("refresh_token"), Some(STATIC_REFRESH));
}

#[tokio::test]
async fn missing_refresh_token_is_a_config_error() {
	let simulator = Arc::new(SignNowSimulator::new().accepting("live"));
	let store = common::seeded_store(Some("stale"), None).await;
	let config = signnow_client::config::SignNowConfig::new(BASE_URL);
	let client = common::build_client(config, store, simulator.clone());
	let err = client.get("/user", None).await.expect_err("Refresh should be impossible.");

	assert!(matches!(err, Error::Config(ConfigError::MissingRefreshToken)));
	assert_eq!(err.kind(), ErrorKind::Config);
	assert!(simulator.token_calls().is_empty());
	assert_eq!(client.refresh_metrics.failures(), 1);

	let blank = signnow_client::config::SignNowConfig::new(BASE_URL).with_refresh_token("");
	let store = common::seeded_store(Some("stale"), None).await;
	let client = common::build_client(blank, store, simulator.clone());
	let err = client.get("/user", None).await.expect_err("Blank fallback should be ignored.");

	assert!(matches!(err, Error::Config(ConfigError::MissingRefreshToken)));
	assert!(simulator.token_calls().is_empty());
}

#[tokio::test]
async fn refresh_failure_is_fatal() {
	let simulator = Arc::new(SignNowSimulator::new().accepting("live").failing_token_endpoint(400));
	let store = common::seeded_store(Some("stale"), Some("revoked")).await;
	let client = common::build_client(common::config(), store.clone(), simulator.clone());
	let err = client.get("/user", None).await.expect_err("Refresh failure should propagate.");

	assert_eq!(err.kind(), ErrorKind::RefreshFailure);
	assert_eq!(err.status(), Some(400));
	assert_eq!(simulator.api_calls().len(), 1);
	assert_eq!(common::stored(&store, ACCESS_TOKEN_KEY).await.as_deref(), Some("stale"));
	assert_eq!(common::stored(&store, REFRESH_TOKEN_KEY).await.as_deref(), Some("revoked"));
}

#[tokio::test]
async fn malformed_token_body_is_a_refresh_failure() {
	let simulator = Arc::new(
		SignNowSimulator::new().accepting("live").token_body(json!({ "error": "unexpected" })),
	);
	let store = common::seeded_store(Some("stale"), Some("refresh-0")).await;
	let client = common::build_client(common::config(), store, simulator);
	let err = client.get("/user", None).await.expect_err("Malformed body should propagate.");

	assert!(matches!(err, Error::Refresh(RefreshError::MalformedResponse { status: 200, .. })));
}

#[tokio::test]
async fn explicit_refresh_always_reaches_token_endpoint() {
	let simulator = Arc::new(SignNowSimulator::new());
	let store = common::seeded_store(Some("live"), Some("refresh-0")).await;
	let client = common::build_client(common::config(), store.clone(), simulator.clone());

	client.refresh().await.expect("First refresh should succeed.");
	client.refresh().await.expect("Second refresh should succeed.");

	let token_calls = simulator.token_calls();

	assert_eq!(token_calls.len(), 2);
	assert_eq!(token_calls[1].body_field("refresh_token"), Some("refresh-1"));
	assert_eq!(common::stored(&store, ACCESS_TOKEN_KEY).await.as_deref(), Some("access-2"));
}

#[tokio::test]
async fn head_and_options_retry_after_refresh() {
	for method in [Method::Head, Method::Options] {
		let simulator = Arc::new(SignNowSimulator::new().accepting("live"));
		let store = common::seeded_store(Some("stale"), Some("refresh-0")).await;
		let client = common::build_client(common::config(), store, simulator.clone());
		let response = match method {
			Method::Head => client.head("/document/abc", None).await,
			_ => client.options("/document/abc", None).await,
		}
		.expect("Retried call should succeed.");
		let api_calls = simulator.api_calls();

		assert_eq!(response.status, 200);
		assert_eq!(api_calls.len(), 2);
		assert!(api_calls.iter().all(|call| call.method == method));
		assert_eq!(api_calls[0].authorization.as_deref(), Some("Bearer stale"));
		assert_eq!(api_calls[1].authorization.as_deref(), Some("Bearer access-1"));
		assert!(api_calls[1].retry);
		assert_eq!(simulator.token_calls().len(), 1);
	}
}

#[tokio::test]
async fn post_and_put_force_form_encoding() {
	let simulator = Arc::new(SignNowSimulator::new().accepting("live"));
	let store = common::seeded_store(Some("live"), None).await;
	let client = common::build_client(common::config(), store, simulator.clone());
	let descriptor = RequestOptions::new("/document")
		.with_header("content-type", "text/plain")
		.with_body(json!({ "name": "contract" }));

	client.post(descriptor, None).await.expect("POST should succeed.");
	client
		.put("/document/abc", Some(json!({ "name": "renamed" })))
		.await
		.expect("PUT should succeed.");
	client
		.patch("/document/abc", Some(json!({ "name": "patched" })))
		.await
		.expect("PATCH should succeed.");

	let calls = simulator.api_calls();

	assert_eq!(calls[0].header(CONTENT_TYPE), Some(FORM_URLENCODED));
	assert_eq!(
		calls[0].headers.keys().filter(|name| name.eq_ignore_ascii_case(CONTENT_TYPE)).count(),
		1
	);
	assert_eq!(calls[0].body, Some(json!({ "name": "contract" })));
	assert_eq!(calls[1].header(CONTENT_TYPE), Some(FORM_URLENCODED));
	assert_eq!(calls[1].body, Some(json!({ "name": "renamed" })));
	assert_eq!(calls[2].header(CONTENT_TYPE), Some(APPLICATION_JSON));
}

#[tokio::test]
async fn descriptor_options_keep_params_and_headers() {
	let simulator = Arc::new(SignNowSimulator::new().accepting("live"));
	let store = common::seeded_store(Some("live"), None).await;
	let client = common::build_client(common::config(), store, simulator.clone());

	client
		.get(
			"/user/documentsv2",
			Some(json!({
				"params": { "page": 2 },
				"headers": { "Accept": "text/csv", "X-Trace": "t-1" },
			})),
		)
		.await
		.expect("GET should succeed.");

	let call = &simulator.api_calls()[0];

	assert_eq!(call.path, "/user/documentsv2");
	assert_eq!(call.params.get("page"), Some(&json!(2)));
	assert_eq!(call.header("accept"), Some("text/csv"));
	assert_eq!(call.header("x-trace"), Some("t-1"));
	assert_eq!(call.header(CONTENT_TYPE), Some(APPLICATION_JSON));
	assert_eq!(call.body, None);
}

#[derive(Default)]
struct Outcomes(Mutex<Vec<String>>);
impl ResponseHandler for Outcomes {
	fn on_success(&self, response: &HttpResponse, data: Option<&Value>) {
		self.0.lock().push(format!("ok:{}:{}", response.status, data.cloned().unwrap_or_default()));
	}

	fn on_failure(&self, error: &TransportError, _: Option<&Value>) {
		self.0.lock().push(format!("err:{}", error.status().unwrap_or_default()));
	}
}

#[tokio::test]
async fn callbacks_follow_every_attempt() {
	let simulator = Arc::new(SignNowSimulator::new().accepting("live"));
	let store = common::seeded_store(Some("stale"), Some("refresh-0")).await;
	let client = common::build_client(common::config(), store, simulator);
	let outcomes = Arc::new(Outcomes::default());
	let callbacks = Callbacks::default().with_data(json!("ctx")).with_handler(outcomes.clone());

	client.send(Method::Get, "/user", None, &callbacks).await.expect("Retry should succeed.");

	// The refresh call goes out without the caller's callbacks.
	assert_eq!(*outcomes.0.lock(), vec!["err:401".to_owned(), "ok:200:\"ctx\"".to_owned()]);
}
