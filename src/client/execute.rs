//! Retry wrapper: one refresh-and-retry cycle per logical call on `401`.
//!
//! Each call moves through at most two attempts. The initial attempt either succeeds,
//! fails for good, or fails with `401`; only the last case refreshes the token pair,
//! rebuilds the descriptor with `retry = true`, and dispatches once more. Whatever the
//! retry produces is final.

// self
use crate::{
	_prelude::*,
	client::SignNowClient,
	http::{Callbacks, HttpResponse, HttpTransport},
	obs::{self, Operation, OperationOutcome, OperationSpan, obs_event},
	request::{Method, RequestOptions},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Attempt {
	Initial,
	Retry,
}

impl<T> SignNowClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Dispatches a configured descriptor, refreshing and retrying once on `401`.
	///
	/// A descriptor already marked `retry` gets no further retry. Errors other than a
	/// first-attempt `401` are returned unchanged, as is the retry's own failure.
	pub async fn execute(
		&self,
		method: Method,
		options: RequestOptions,
		callbacks: &Callbacks,
	) -> Result<HttpResponse> {
		const OPERATION: Operation = Operation::Request;

		let span = OperationSpan::new(OPERATION, method.as_str()).with_route(&options.path);

		obs::record_operation(OPERATION, OperationOutcome::Attempt);

		let result = span.instrument(self.execute_bounded(method, options, callbacks)).await;

		match &result {
			Ok(_) => obs::record_operation(OPERATION, OperationOutcome::Success),
			Err(_) => obs::record_operation(OPERATION, OperationOutcome::Failure),
		}

		result
	}

	async fn execute_bounded(
		&self,
		method: Method,
		mut options: RequestOptions,
		callbacks: &Callbacks,
	) -> Result<HttpResponse> {
		let mut attempt = if options.retry { Attempt::Retry } else { Attempt::Initial };

		loop {
			let err = match self.transport.send(method, &options, callbacks).await {
				Ok(response) => {
					obs::record_http_status(Operation::Request, response.status);

					return Ok(response);
				},
				Err(err) => err,
			};

			if let Some(status) = err.status() {
				obs::record_http_status(Operation::Request, status);
			}

			if attempt == Attempt::Retry || !err.is_authorization_expired() {
				return Err(err.into());
			}

			obs_event!(info, path = %options.path, "Refreshing token for request.");
			obs::record_operation(Operation::Request, OperationOutcome::Retry);

			let rejected = options.authorization.take().and_then(|auth| auth.access_token);

			self.refresh_after_rejection(rejected).await?;

			options.retry = true;
			options = self.configure(options).await?;
			attempt = Attempt::Retry;
		}
	}
}
