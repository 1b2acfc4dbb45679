//! HMAC-SHA256 signatures over raw webhook payloads.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{_prelude::*, auth::TokenSecret, webhook::WebhookError};

type HmacSha256 = Hmac<Sha256>;

/// Optional prefix some senders put in front of a hex digest.
pub const SIGNATURE_PREFIX: &str = "sha256=";

const HEX_DIGEST_LEN: usize = 64;

/// Verifies webhook signatures with a shared secret.
#[derive(Clone)]
pub struct SignatureVerifier {
	secret: TokenSecret,
}
impl SignatureVerifier {
	/// Creates a verifier keyed with `secret`.
	pub fn new(secret: impl Into<TokenSecret>) -> Self {
		Self { secret: secret.into() }
	}

	/// Hex-encoded signature for `raw_body`.
	pub fn sign(&self, raw_body: &[u8]) -> Result<String, WebhookError> {
		let mut mac = self.mac()?;

		mac.update(raw_body);

		Ok(hex::encode(mac.finalize().into_bytes()))
	}

	/// Checks `signature` against `raw_body`, reporting why verification failed.
	///
	/// The digest comparison runs in constant time.
	pub fn check(&self, raw_body: &[u8], signature: &str) -> Result<(), WebhookError> {
		let expected = decode_signature(signature)?;
		let mut mac = self.mac()?;

		mac.update(raw_body);
		mac.verify_slice(&expected).map_err(|_| WebhookError::SignatureInvalid)
	}

	/// Returns `true` when `signature` is a valid signature of `raw_body`.
	pub fn verify(&self, raw_body: &[u8], signature: &str) -> bool {
		self.check(raw_body, signature).is_ok()
	}

	fn mac(&self) -> Result<HmacSha256, WebhookError> {
		HmacSha256::new_from_slice(self.secret.expose().as_bytes())
			.map_err(|_| WebhookError::InvalidSecret)
	}
}
impl Debug for SignatureVerifier {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignatureVerifier").field("secret", &self.secret).finish()
	}
}

/// Returns `true` when `signature` is the HMAC-SHA256 of `raw_body` under `secret`.
pub fn verify(raw_body: &[u8], signature: &str, secret: &TokenSecret) -> bool {
	SignatureVerifier::new(secret.clone()).verify(raw_body, signature)
}

/// Decodes a hex (optionally `sha256=`-prefixed) or standard base64 signature.
fn decode_signature(signature: &str) -> Result<Vec<u8>, WebhookError> {
	let trimmed = signature.trim();
	let raw = trimmed.strip_prefix(SIGNATURE_PREFIX).unwrap_or(trimmed);

	if raw.is_empty() {
		return Err(WebhookError::MissingSignature);
	}
	if raw.len() == HEX_DIGEST_LEN && raw.bytes().all(|b| b.is_ascii_hexdigit()) {
		return hex::decode(raw).map_err(|_| WebhookError::MalformedSignature);
	}

	STANDARD.decode(raw).map_err(|_| WebhookError::MalformedSignature)
}
