//! Authorization block attached to every request descriptor.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Authorization type label written by the configurator.
pub const OAUTH2: &str = "oauth2";
/// Header prefix written by the configurator.
pub const BEARER: &str = "Bearer";

/// How the transport should authorize a request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
	/// Authorization scheme label (always `oauth2` once configured).
	#[serde(rename = "type")]
	pub kind: String,
	/// Token read from the store; `None` once tokens have been cleared.
	#[serde(default)]
	pub access_token: Option<TokenSecret>,
	/// Prefix placed before the token in the `Authorization` header.
	pub header_prefix: String,
}
impl Authorization {
	/// OAuth 2.0 bearer authorization carrying `access_token`.
	pub fn bearer(access_token: Option<TokenSecret>) -> Self {
		Self { kind: OAUTH2.into(), access_token, header_prefix: BEARER.into() }
	}

	/// Rendered `Authorization` header value, or `None` without a token.
	pub fn header_value(&self) -> Option<String> {
		let token = self.access_token.as_ref()?;

		if self.header_prefix.is_empty() {
			Some(token.expose().to_owned())
		} else {
			Some(format!("{} {}", self.header_prefix, token.expose()))
		}
	}
}
