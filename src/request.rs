//! Request descriptors, call-shape normalization, and the pure half of the configurator.
//!
//! Callers hand the client either a path plus loosely shaped options or a complete
//! [`RequestOptions`]. [`check_http_options`] folds both shapes into one descriptor, and
//! [`RequestOptions::configured`] stamps the URL, default headers, and bearer authorization
//! onto it right before dispatch.

pub mod headers;
pub mod method;

pub use headers::*;
pub use method::*;

// self
use crate::{
	_prelude::*,
	auth::{Authorization, TokenSecret},
	error::ConfigError,
};

/// Canonical request object consumed by [`crate::http::HttpTransport`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestOptions {
	/// Path appended to the configured base URL.
	pub path: String,
	/// Absolute URL derived from the base URL and `path` for the current attempt.
	pub url: Option<String>,
	/// Request headers; names compare case-insensitively.
	pub headers: BTreeMap<String, String>,
	/// Query string parameters.
	pub params: BTreeMap<String, Value>,
	/// Request payload, encoded according to `Content-Type`.
	pub body: Option<Value>,
	/// Authorization applied by the transport.
	pub authorization: Option<Authorization>,
	/// Marks the second and final dispatch after a `401`.
	pub retry: bool,
}
impl RequestOptions {
	/// Creates a descriptor for `path` with nothing else set.
	pub fn new(path: impl Into<String>) -> Self {
		Self { path: path.into(), ..Default::default() }
	}

	/// Sets the request payload.
	pub fn with_body(mut self, body: Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Adds or replaces a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers = merge_headers(&self.headers, &BTreeMap::from([(name.into(), value.into())]));

		self
	}

	/// Adds a query string parameter.
	pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.params.insert(name.into(), value.into());

		self
	}

	/// Produces the dispatch-ready descriptor.
	///
	/// Sets `url = base_url + path`, layers the JSON defaults under the caller's headers,
	/// and installs bearer authorization with `access_token`. Authorization is always
	/// rebuilt from the store read, so a retried descriptor can never carry the stale token
	/// of the attempt that failed.
	pub fn configured(mut self, base_url: &str, access_token: Option<TokenSecret>) -> Self {
		self.url = Some(format!("{base_url}{}", self.path));
		self.headers = merge_headers(&default_headers(), &self.headers);
		self.authorization = Some(Authorization::bearer(access_token));

		self
	}

	/// Query parameters rendered as strings.
	pub fn query_pairs(&self) -> Vec<(String, String)> {
		self.params.iter().map(|(name, value)| (name.clone(), render_scalar(value))).collect()
	}
}

/// First argument of an outbound call: a bare path or a complete descriptor.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestTarget {
	/// Path relative to the base URL.
	Path(String),
	/// Fully shaped descriptor; any second argument is ignored.
	Options(RequestOptions),
}
impl From<&str> for RequestTarget {
	fn from(value: &str) -> Self {
		Self::Path(value.to_owned())
	}
}
impl From<String> for RequestTarget {
	fn from(value: String) -> Self {
		Self::Path(value)
	}
}
impl From<&String> for RequestTarget {
	fn from(value: &String) -> Self {
		Self::Path(value.clone())
	}
}
impl From<RequestOptions> for RequestTarget {
	fn from(value: RequestOptions) -> Self {
		Self::Options(value)
	}
}

/// Folds the ergonomic call shapes into one [`RequestOptions`].
///
/// - A descriptor target is returned as is.
/// - Options carrying a truthy `path`, `params`, or `body` key are read as a descriptor whose
///   path is then replaced by the target path.
/// - Anything else becomes the body of a new descriptor for the target path.
///
/// An empty target path keeps whatever path the options carry.
pub fn check_http_options(
	target: impl Into<RequestTarget>,
	options: Option<Value>,
) -> Result<RequestOptions, ConfigError> {
	let path = match target.into() {
		RequestTarget::Options(descriptor) => return Ok(descriptor),
		RequestTarget::Path(path) => path,
	};
	let Some(options) = options else {
		return Ok(RequestOptions::new(path));
	};

	if path.is_empty() || looks_like_descriptor(&options) {
		let mut descriptor: RequestOptions = serde_path_to_error::deserialize(options)
			.map_err(|source| ConfigError::InvalidOptions { source })?;

		if !path.is_empty() {
			descriptor.path = path;
		}

		return Ok(descriptor);
	}

	Ok(RequestOptions::new(path).with_body(options))
}

fn looks_like_descriptor(options: &Value) -> bool {
	let Value::Object(map) = options else {
		return false;
	};

	["path", "params", "body"].iter().any(|key| map.get(*key).is_some_and(is_truthy))
}

fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(flag) => *flag,
		Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
		Value::String(text) => !text.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}

/// Renders a JSON scalar the way it appears in query strings and form fields.
pub(crate) fn render_scalar(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}
