//! SignNow API adapter: single-flight OAuth token refresh, one-shot retries on expired
//! authorization, and HMAC-verified webhook ingress.
//!
//! Outbound calls flow through [`client::SignNowClient`], which normalizes call shapes,
//! stamps the stored bearer token onto each request, and on a `401` performs exactly one
//! refresh-and-retry cycle. Concurrent refreshes are collapsed behind a named lock so the
//! upstream token endpoint sees a single request per token generation. Inbound callbacks
//! are authenticated by [`webhook::WebhookIngress`] and republished as internal events.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod lock;
pub mod obs;
pub mod request;
pub mod store;
pub mod webhook;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::Duration;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use serde_json;
#[cfg(test)] use {httpmock as _, tower as _};
