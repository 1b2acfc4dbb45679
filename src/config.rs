//! Connection settings for the SignNow API and its webhooks.

// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Settings consumed by [`crate::client::SignNowClient`] and [`crate::webhook::WebhookIngress`].
///
/// The serialized shape uses the keys `signnowBaseUrl`, `webhookSecretKey`, and
/// `refreshToken` so existing configuration documents load unchanged.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignNowConfig {
	/// API origin every request path is appended to, e.g. `https://api.signnow.com`.
	#[serde(rename = "signnowBaseUrl")]
	pub base_url: String,
	/// Shared HMAC secret for inbound webhook signatures.
	#[serde(default)]
	pub webhook_secret_key: Option<TokenSecret>,
	/// Static refresh token used when the store holds none.
	#[serde(default)]
	pub refresh_token: Option<TokenSecret>,
}
impl SignNowConfig {
	/// Creates a configuration for the given API origin.
	pub fn new(base_url: impl Into<String>) -> Self {
		Self { base_url: base_url.into(), webhook_secret_key: None, refresh_token: None }
	}

	/// Parses a JSON configuration document and validates it.
	pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_slice(bytes);
		let config: Self = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ConfigError::InvalidConfig { source })?;

		config.validate()?;

		Ok(config)
	}

	/// Sets the shared webhook secret.
	pub fn with_webhook_secret_key(mut self, secret: impl Into<TokenSecret>) -> Self {
		self.webhook_secret_key = Some(secret.into());

		self
	}

	/// Sets the static fallback refresh token.
	pub fn with_refresh_token(mut self, token: impl Into<TokenSecret>) -> Self {
		self.refresh_token = Some(token.into());

		self
	}

	/// Checks that the base URL is an absolute http(s) URL.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let url =
			Url::parse(&self.base_url).map_err(|source| ConfigError::InvalidBaseUrl { source })?;

		match url.scheme() {
			"http" | "https" => Ok(()),
			other => Err(ConfigError::UnsupportedScheme { scheme: other.to_owned() }),
		}
	}

	/// Absolute URL for `path`; the base URL and path are concatenated verbatim.
	pub fn url_for(&self, path: &str) -> String {
		format!("{}{path}", self.base_url)
	}
}
impl Debug for SignNowConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignNowConfig")
			.field("base_url", &self.base_url)
			.field("webhook_secret_key_set", &self.webhook_secret_key.is_some())
			.field("refresh_token_set", &self.refresh_token.is_some())
			.finish()
	}
}
