//! Transport primitives for SignNow API calls.
//!
//! [`HttpTransport`] is the client's only dependency on an HTTP stack. It receives a fully
//! configured [`RequestOptions`] and either returns the [`HttpResponse`] or a
//! [`TransportError`] whose [`status`](TransportError::status) is set whenever the failure
//! came from an HTTP response; the retry wrapper keys off that status. Implementations
//! must not retry on their own and must not impose timeouts the caller did not configure
//! on the underlying client.

// crates.io
#[cfg(feature = "reqwest")] use reqwest::{
	RequestBuilder,
	header::{AUTHORIZATION, HeaderMap, RETRY_AFTER},
	multipart::Form,
};
#[cfg(feature = "reqwest")] use time::{OffsetDateTime, format_description::well_known::Rfc2822};
// self
use crate::{
	_prelude::*,
	error::TransportError,
	request::{self, Method, RequestOptions},
};
#[cfg(feature = "reqwest")]
use crate::request::{CONTENT_TYPE, FORM_URLENCODED, MULTIPART_FORM_DATA};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks able to execute a configured [`RequestOptions`].
///
/// One generic entry point parameterized by [`Method`] covers every verb, so the retry
/// contract is enforced in exactly one place. Implementations must be
/// `Send + Sync + 'static` so a client can be shared across tasks.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Dispatches `request` once.
	///
	/// Non-success statuses must surface as [`TransportError::Status`]. `callbacks` are
	/// opaque to the client and forwarded unchanged on every attempt.
	fn send<'a>(
		&'a self,
		method: Method,
		request: &'a RequestOptions,
		callbacks: &'a Callbacks,
	) -> TransportFuture<'a>;
}

/// Response returned by a successful dispatch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers; repeated names keep the last value.
	pub headers: BTreeMap<String, String>,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Creates a response with `status` and an empty body.
	pub fn new(status: u16) -> Self {
		Self { status, ..Default::default() }
	}

	/// Replaces the body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = body.into();

		self
	}

	/// Serializes `value` as the body and marks it as JSON.
	pub fn with_json(mut self, value: &Value) -> Self {
		self.headers.insert(request::CONTENT_TYPE.into(), request::APPLICATION_JSON.into());
		self.body = value.to_string().into_bytes();

		self
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Body parsed as JSON with the failing path reported on error.
	pub fn json<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
	where
		T: serde::de::DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de)
	}

	/// Looks up a response header regardless of name casing.
	pub fn header(&self, name: &str) -> Option<&str> {
		request::find_header(&self.headers, name)
	}
}

/// Hooks a transport invokes after each dispatch.
pub trait ResponseHandler
where
	Self: Send + Sync,
{
	/// Called with every successful response.
	fn on_success(&self, response: &HttpResponse, data: Option<&Value>) {
		let _ = (response, data);
	}

	/// Called with every failed dispatch, including a `401` that will be retried.
	fn on_failure(&self, error: &TransportError, data: Option<&Value>) {
		let _ = (error, data);
	}
}

/// Caller-supplied callback data and handler, forwarded to the transport untouched.
#[derive(Clone, Default)]
pub struct Callbacks {
	/// Opaque value handed back to the handler.
	pub data: Option<Value>,
	/// Handler notified after each dispatch.
	pub handler: Option<Arc<dyn ResponseHandler>>,
}
impl Callbacks {
	/// Attaches callback data.
	pub fn with_data(mut self, data: Value) -> Self {
		self.data = Some(data);

		self
	}

	/// Attaches a handler.
	pub fn with_handler(mut self, handler: Arc<dyn ResponseHandler>) -> Self {
		self.handler = Some(handler);

		self
	}

	/// Notifies the handler, if any, of `result`.
	pub fn notify(&self, result: &Result<HttpResponse, TransportError>) {
		let Some(handler) = &self.handler else {
			return;
		};

		match result {
			Ok(response) => handler.on_success(response, self.data.as_ref()),
			Err(err) => handler.on_failure(err, self.data.as_ref()),
		}
	}
}
impl Debug for Callbacks {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Callbacks")
			.field("data", &self.data)
			.field("handler_set", &self.handler.is_some())
			.finish()
	}
}

/// [`HttpTransport`] backed by a shared [`ReqwestClient`].
///
/// Bodies are encoded from the descriptor's `Content-Type`: JSON by default, URL-encoded
/// forms for `application/x-www-form-urlencoded`, and multipart forms (with a generated
/// boundary) for `multipart/form-data`.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	fn build(
		&self,
		method: Method,
		request: &RequestOptions,
	) -> Result<RequestBuilder, TransportError> {
		let url = request.url.as_deref().ok_or_else(|| TransportError::Request {
			message: format!("descriptor for `{}` has no URL", request.path),
		})?;
		let content_type = request::find_header(&request.headers, CONTENT_TYPE)
			.map(request::media_type)
			.unwrap_or_default();
		let multipart = content_type == MULTIPART_FORM_DATA;
		let mut builder = self.0.request(method.into(), url);

		if !request.params.is_empty() {
			builder = builder.query(&request.query_pairs());
		}
		for (name, value) in &request.headers {
			// reqwest writes the multipart content type itself so the boundary matches.
			if multipart && name.eq_ignore_ascii_case(CONTENT_TYPE) {
				continue;
			}

			builder = builder.header(name.as_str(), value.as_str());
		}
		if let Some(header) = request.authorization.as_ref().and_then(|auth| auth.header_value()) {
			builder = builder.header(AUTHORIZATION, header);
		}
		if let Some(body) = &request.body {
			builder = encode_body(builder, &content_type, body)?;
		}

		Ok(builder)
	}

	async fn dispatch(
		&self,
		method: Method,
		request: &RequestOptions,
	) -> Result<HttpResponse, TransportError> {
		let response = self.build(method, request)?.send().await?;
		let status = response.status();
		let retry_after = parse_retry_after(response.headers());
		let headers = response
			.headers()
			.iter()
			.filter_map(|(name, value)| {
				value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
			})
			.collect();
		let body = response.bytes().await?.to_vec();

		if !status.is_success() {
			return Err(TransportError::Status {
				status: status.as_u16(),
				body: String::from_utf8_lossy(&body).into_owned(),
				retry_after,
			});
		}

		Ok(HttpResponse { status: status.as_u16(), headers, body })
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send<'a>(
		&'a self,
		method: Method,
		request: &'a RequestOptions,
		callbacks: &'a Callbacks,
	) -> TransportFuture<'a> {
		Box::pin(async move {
			let result = self.dispatch(method, request).await;

			callbacks.notify(&result);

			result
		})
	}
}

#[cfg(feature = "reqwest")]
fn encode_body(
	builder: RequestBuilder,
	content_type: &str,
	body: &Value,
) -> Result<RequestBuilder, TransportError> {
	match (content_type, body) {
		(FORM_URLENCODED, Value::Object(_)) => Ok(builder.form(&form_fields(body))),
		(MULTIPART_FORM_DATA, Value::Object(_)) => {
			let form = form_fields(body)
				.into_iter()
				.fold(Form::new(), |form, (name, value)| form.text(name, value));

			Ok(builder.multipart(form))
		},
		(MULTIPART_FORM_DATA, _) => Err(TransportError::Request {
			message: "multipart bodies must be JSON objects".into(),
		}),
		(_, Value::String(raw)) => Ok(builder.body(raw.clone())),
		(_, other) => Ok(builder.body(other.to_string())),
	}
}

#[cfg(feature = "reqwest")]
fn form_fields(body: &Value) -> Vec<(String, String)> {
	match body {
		Value::Object(map) =>
			map.iter().map(|(name, value)| (name.clone(), request::render_scalar(value))).collect(),
		_ => Vec::new(),
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
