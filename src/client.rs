//! The SignNow client: verb entry points, request configuration, and token housekeeping.

pub mod execute;
pub mod refresh;

pub use refresh::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY},
	config::SignNowConfig,
	http::{Callbacks, HttpResponse, HttpTransport},
	lock::{LockRegistry, REFRESH_LOCK},
	obs::obs_event,
	request::{self, FORM_URLENCODED, Method, RequestOptions, RequestTarget},
	store::{Sealing, SecretStore},
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestTransport};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestSignNowClient = SignNowClient<ReqwestTransport>;

/// Authenticated adapter for the SignNow REST API.
///
/// Every verb normalizes its arguments, stamps the stored access token onto the request,
/// and dispatches through the retry wrapper: a `401` triggers one refresh of the token pair
/// followed by exactly one retry. The client holds no ambient state; tokens live in the
/// injected [`SecretStore`] and refreshes serialize on the injected [`LockRegistry`].
pub struct SignNowClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for API calls and token refreshes.
	pub transport: Arc<T>,
	/// Store holding the sealed token pair.
	pub store: Arc<dyn SecretStore>,
	/// API origin, webhook secret, and fallback refresh token.
	pub config: SignNowConfig,
	/// Named locks; share one registry between clients that share a store.
	pub locks: LockRegistry,
	/// Counters for refresh attempts and outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
}
impl<T> SignNowClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client over a caller-provided transport.
	pub fn with_transport(
		config: SignNowConfig,
		store: Arc<dyn SecretStore>,
		transport: impl Into<Arc<T>>,
	) -> Result<Self> {
		config.validate()?;

		Ok(Self {
			transport: transport.into(),
			store,
			config,
			locks: LockRegistry::default(),
			refresh_metrics: Default::default(),
		})
	}

	/// Replaces the lock registry, e.g. to serialize refreshes across several clients.
	pub fn with_locks(mut self, locks: LockRegistry) -> Self {
		self.locks = locks;

		self
	}

	/// Sends a `GET` request.
	pub async fn get(
		&self,
		target: impl Into<RequestTarget>,
		http_options: Option<Value>,
	) -> Result<HttpResponse> {
		self.send(Method::Get, target, http_options, &Callbacks::default()).await
	}

	/// Sends a `POST` request with a URL-encoded form content type.
	pub async fn post(
		&self,
		target: impl Into<RequestTarget>,
		http_options: Option<Value>,
	) -> Result<HttpResponse> {
		self.send(Method::Post, target, http_options, &Callbacks::default()).await
	}

	/// Sends a `PUT` request with a URL-encoded form content type.
	pub async fn put(
		&self,
		target: impl Into<RequestTarget>,
		http_options: Option<Value>,
	) -> Result<HttpResponse> {
		self.send(Method::Put, target, http_options, &Callbacks::default()).await
	}

	/// Sends a `PATCH` request.
	pub async fn patch(
		&self,
		target: impl Into<RequestTarget>,
		http_options: Option<Value>,
	) -> Result<HttpResponse> {
		self.send(Method::Patch, target, http_options, &Callbacks::default()).await
	}

	/// Sends a `DELETE` request.
	pub async fn delete(
		&self,
		target: impl Into<RequestTarget>,
		http_options: Option<Value>,
	) -> Result<HttpResponse> {
		self.send(Method::Delete, target, http_options, &Callbacks::default()).await
	}

	/// Sends a `HEAD` request.
	pub async fn head(
		&self,
		target: impl Into<RequestTarget>,
		http_options: Option<Value>,
	) -> Result<HttpResponse> {
		self.send(Method::Head, target, http_options, &Callbacks::default()).await
	}

	/// Sends an `OPTIONS` request.
	pub async fn options(
		&self,
		target: impl Into<RequestTarget>,
		http_options: Option<Value>,
	) -> Result<HttpResponse> {
		self.send(Method::Options, target, http_options, &Callbacks::default()).await
	}

	/// Full form of the verb helpers: normalize, configure, and execute with retry.
	///
	/// `POST` and `PUT` force `Content-Type: application/x-www-form-urlencoded` over any
	/// caller or default value.
	pub async fn send(
		&self,
		method: Method,
		target: impl Into<RequestTarget>,
		http_options: Option<Value>,
		callbacks: &Callbacks,
	) -> Result<HttpResponse> {
		let mut options = request::check_http_options(target, http_options)?;

		if method.forces_form_encoding() {
			obs_event!(debug, method = method.as_str(), "Forcing form content type.");

			options = options.with_header(request::CONTENT_TYPE, FORM_URLENCODED);
		}

		let options = self.configure(options).await?;

		self.execute(method, options, callbacks).await
	}

	/// Produces the dispatch-ready descriptor using the access token currently stored.
	pub async fn configure(&self, options: RequestOptions) -> Result<RequestOptions> {
		let access_token = self.store.get(ACCESS_TOKEN_KEY, Sealing::Encrypted).await?;

		obs_event!(debug, path = %options.path, retry = options.retry, "Configuring request.");

		Ok(options.configured(&self.config.base_url, access_token))
	}

	/// Removes both stored tokens unconditionally.
	///
	/// Runs under the refresh lock so it never interleaves with a pair being written. Later
	/// calls go out without a token and, on the resulting `401`, refresh with the configured
	/// static refresh token.
	pub async fn clear_tokens_from_storage(&self) -> Result<()> {
		obs_event!(warn, "Clearing tokens from storage.");

		self.locks
			.lock(REFRESH_LOCK, || async {
				self.store.remove(ACCESS_TOKEN_KEY).await?;
				self.store.remove(REFRESH_TOKEN_KEY).await?;

				Ok::<_, Error>(())
			})
			.await
	}
}
#[cfg(feature = "reqwest")]
impl SignNowClient<ReqwestTransport> {
	/// Creates a client that provisions its own reqwest transport.
	pub fn new(config: SignNowConfig, store: Arc<dyn SecretStore>) -> Result<Self> {
		let client = ReqwestClient::builder().build().map_err(ConfigError::from)?;

		Self::with_transport(config, store, ReqwestTransport::with_client(client))
	}
}
impl<T> Clone for SignNowClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			locks: self.locks.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
		}
	}
}
impl<T> Debug for SignNowClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignNowClient")
			.field("config", &self.config)
			.field("locks", &self.locks)
			.finish()
	}
}
