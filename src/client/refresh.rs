//! Token refresh under the named refresh lock.
//!
//! At most one refresh runs at a time per [`LockRegistry`](crate::lock::LockRegistry).
//! Callers that queued behind a refresh triggered by the same rejected token find a
//! different access token in the store once they acquire the lock and reuse it instead
//! of calling the token endpoint again. A successful refresh writes the new access and
//! refresh tokens in one [`SecretStore::put_all`](crate::store::SecretStore::put_all).

mod metrics;

pub use metrics::RefreshMetrics;

// crates.io
use serde_json::json;
// self
use crate::{
	_prelude::*,
	auth::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TokenResponse, TokenSecret},
	client::SignNowClient,
	error::{ConfigError, RefreshError},
	http::{Callbacks, HttpTransport},
	lock::REFRESH_LOCK,
	obs::{self, Operation, OperationOutcome, OperationSpan, obs_event},
	request::{
		ACCEPT, APPLICATION_JSON, CONTENT_TYPE, MULTIPART_FORM_DATA, Method, RequestOptions,
	},
	store::Sealing,
};

/// Token endpoint path appended to the base URL.
pub const TOKEN_PATH: &str = "/oauth2/token";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RefreshOutcome {
	Refreshed,
	Reused,
}

impl<T> SignNowClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Refreshes the token pair unconditionally under the refresh lock.
	pub async fn refresh(&self) -> Result<()> {
		self.refresh_guarded(None).await
	}

	/// Refresh triggered by a `401` for a request that carried `rejected`.
	///
	/// Skips the upstream call when the store already holds a different access token, which
	/// means another caller refreshed while this one waited for the lock.
	pub(crate) async fn refresh_after_rejection(
		&self,
		rejected: Option<TokenSecret>,
	) -> Result<()> {
		self.refresh_guarded(Some(rejected)).await
	}

	async fn refresh_guarded(&self, rejected: Option<Option<TokenSecret>>) -> Result<()> {
		const OPERATION: Operation = Operation::Refresh;

		let span = OperationSpan::new(OPERATION, "refresh").with_route(TOKEN_PATH);

		obs::record_operation(OPERATION, OperationOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let result = span
			.instrument(self.locks.lock(REFRESH_LOCK, || async move {
				if let Some(rejected) = rejected {
					let current = self
						.store
						.get(ACCESS_TOKEN_KEY, Sealing::Encrypted)
						.await
						.map_err(RefreshError::Storage)?;

					if current.is_some() && current != rejected {
						return Ok(RefreshOutcome::Reused);
					}
				}

				self.refresh_locked().await?;

				Ok::<_, Error>(RefreshOutcome::Refreshed)
			}))
			.await;

		match &result {
			Ok(RefreshOutcome::Refreshed) => {
				self.refresh_metrics.record_refreshed();
				obs::record_operation(OPERATION, OperationOutcome::Success);
			},
			Ok(RefreshOutcome::Reused) => {
				obs_event!(debug, "Token pair already rotated by a concurrent refresh.");
				self.refresh_metrics.record_reused();
				obs::record_operation(OPERATION, OperationOutcome::Reused);
			},
			Err(_err) => {
				obs_event!(warn, error = %_err, "Token refresh failed.");
				self.refresh_metrics.record_failure();
				obs::record_operation(OPERATION, OperationOutcome::Failure);
			},
		}

		result.map(|_| ())
	}

	async fn refresh_locked(&self) -> Result<()> {
		let stored = self
			.store
			.get(REFRESH_TOKEN_KEY, Sealing::Encrypted)
			.await
			.map_err(RefreshError::Storage)?
			.filter(|token| !token.is_blank());
		let refresh_token = match stored {
			Some(token) => token,
			None => self
				.config
				.refresh_token
				.clone()
				.filter(|token| !token.is_blank())
				.ok_or(ConfigError::MissingRefreshToken)?,
		};
		let request = self.token_request(&refresh_token);

		self.refresh_metrics.record_upstream_call();

		let response = self
			.transport
			.send(Method::Post, &request, &Callbacks::default())
			.await
			.map_err(|err| {
				if let Some(status) = err.status() {
					obs::record_http_status(Operation::Refresh, status);
				}

				RefreshError::Transport(err)
			})?;

		obs::record_http_status(Operation::Refresh, response.status);

		let payload: TokenResponse = response
			.json()
			.map_err(|source| RefreshError::MalformedResponse { source, status: response.status })?;
		let pair = payload.into_pair(refresh_token);

		self.store
			.put_all(pair.into_entries(), Sealing::Encrypted)
			.await
			.map_err(RefreshError::Storage)?;

		obs_event!(debug, "Stored refreshed token pair.");

		Ok(())
	}

	fn token_request(&self, refresh_token: &TokenSecret) -> RequestOptions {
		RequestOptions {
			path: TOKEN_PATH.into(),
			url: Some(self.config.url_for(TOKEN_PATH)),
			headers: BTreeMap::from([
				(ACCEPT.to_owned(), APPLICATION_JSON.to_owned()),
				(CONTENT_TYPE.to_owned(), MULTIPART_FORM_DATA.to_owned()),
			]),
			body: Some(json!({
				"grant_type": "refresh_token",
				"refresh_token": refresh_token.expose(),
				"scope": "*",
			})),
			..Default::default()
		}
	}
}
