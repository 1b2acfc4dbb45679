//! The access/refresh token pair and the token endpoint payload that produces it.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Store key holding the current access token.
pub const ACCESS_TOKEN_KEY: &str = "signnow-access-token";
/// Store key holding the current refresh token.
pub const REFRESH_TOKEN_KEY: &str = "signnow-refresh-token";

/// Access and refresh token issued together by one refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenPair {
	/// Bearer token stamped onto outbound requests.
	pub access_token: TokenSecret,
	/// Secret exchanged for the next pair.
	pub refresh_token: TokenSecret,
}
impl TokenPair {
	/// Creates a pair from both secrets.
	pub fn new(
		access_token: impl Into<TokenSecret>,
		refresh_token: impl Into<TokenSecret>,
	) -> Self {
		Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
	}

	/// Store entries for the pair, keyed by [`ACCESS_TOKEN_KEY`] and [`REFRESH_TOKEN_KEY`].
	pub fn into_entries(self) -> Vec<(&'static str, TokenSecret)> {
		vec![(ACCESS_TOKEN_KEY, self.access_token), (REFRESH_TOKEN_KEY, self.refresh_token)]
	}
}

/// Successful body of the `/oauth2/token` refresh grant.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct TokenResponse {
	access_token: TokenSecret,
	#[serde(default)]
	refresh_token: Option<TokenSecret>,
}
impl TokenResponse {
	/// Builds the next pair; a response without a rotated refresh token keeps `current`.
	pub(crate) fn into_pair(self, current: TokenSecret) -> TokenPair {
		TokenPair {
			access_token: self.access_token,
			refresh_token: self.refresh_token.unwrap_or(current),
		}
	}
}
