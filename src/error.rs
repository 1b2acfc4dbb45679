//! Client-level error types shared across the outbound and refresh paths.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Outbound call failed; a `401` here has already consumed the retry budget.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token refresh failed; fatal to the call that triggered it.
	#[error(transparent)]
	Refresh(#[from] RefreshError),
}
impl Error {
	/// Classifies the error into the coarse kinds callers usually branch on.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Transport(err) if err.is_authorization_expired() =>
				ErrorKind::AuthorizationExpired,
			Self::Transport(_) => ErrorKind::Transport,
			Self::Refresh(_) => ErrorKind::RefreshFailure,
			Self::Storage(_) => ErrorKind::Storage,
			Self::Config(_) => ErrorKind::Config,
		}
	}

	/// HTTP status carried by the failure, when it originated from an HTTP response.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Transport(err) => err.status(),
			Self::Refresh(RefreshError::Transport(err)) => err.status(),
			_ => None,
		}
	}
}

/// Coarse classification returned by [`Error::kind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Non-`401` transport failure.
	Transport,
	/// `401` that survived the single refresh-and-retry cycle.
	AuthorizationExpired,
	/// The refresh upstream call (or persisting its result) failed.
	RefreshFailure,
	/// Secret store failure outside a refresh.
	Storage,
	/// Configuration or request-shape problem.
	Config,
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Configured API origin is not an absolute URL.
	#[error("SignNow base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Configured API origin uses an unsupported scheme.
	#[error("SignNow base URL must use http or https, got `{scheme}`.")]
	UnsupportedScheme {
		/// Scheme found in the configured URL.
		scheme: String,
	},
	/// Configuration document could not be parsed.
	#[error("Configuration is malformed.")]
	InvalidConfig {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Caller-supplied request options could not be read as a request descriptor.
	#[error("Request options are malformed.")]
	InvalidOptions {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Neither the store nor the configuration holds a refresh token.
	#[error("No refresh token is stored or configured.")]
	MissingRefreshToken,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures surfaced by [`crate::http::HttpTransport`] implementations.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Upstream answered with a non-success status.
	#[error("SignNow responded with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Response body, decoded lossily.
		body: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Request could not be assembled from the descriptor.
	#[error("Request could not be built: {message}.")]
	Request {
		/// Human-readable reason.
		message: String,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling SignNow.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Builds a status failure without body or retry hint.
	pub fn status_only(status: u16) -> Self {
		Self::Status { status, body: String::new(), retry_after: None }
	}

	/// HTTP status code, when the failure came from an HTTP response.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Returns `true` for exactly HTTP `401`.
	pub fn is_authorization_expired(&self) -> bool {
		self.status() == Some(401)
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_builder() {
			return Self::Request { message: e.to_string() };
		}

		Self::network(e)
	}
}

/// Failures raised while refreshing the token pair.
#[derive(Debug, ThisError)]
pub enum RefreshError {
	/// Token endpoint call failed (network or non-success status).
	#[error("Token endpoint call failed.")]
	Transport(#[source] TransportError),
	/// Token endpoint responded with a body that is not a token pair.
	#[error("Token endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Reading or persisting the token pair failed.
	#[error("Token pair could not be read or persisted.")]
	Storage(#[source] crate::store::StoreError),
}
