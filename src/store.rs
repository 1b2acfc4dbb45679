//! Secret store contract and the built-in in-memory implementation.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Boxed future returned by [`SecretStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Whether a value is stored sealed (encrypted at rest) or in the clear.
///
/// Reads must use the same sealing the value was written with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sealing {
	/// Stored as given.
	Plain,
	/// Encrypted on write, decrypted on read.
	Encrypted,
}

/// Opaque key-value storage for token secrets.
pub trait SecretStore
where
	Self: Send + Sync,
{
	/// Reads the value under `key`, if present.
	fn get<'a>(&'a self, key: &'a str, sealing: Sealing) -> StoreFuture<'a, Option<TokenSecret>>;

	/// Writes or replaces the value under `key`.
	fn put<'a>(&'a self, key: &'a str, value: TokenSecret, sealing: Sealing)
	-> StoreFuture<'a, ()>;

	/// Removes `key`; absent keys are not an error.
	fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;

	/// Writes every entry as one unit.
	///
	/// The default writes entries one by one. Backends shared with readers outside the
	/// refresh lock should override it so no reader observes a partially written set.
	fn put_all<'a>(
		&'a self,
		entries: Vec<(&'a str, TokenSecret)>,
		sealing: Sealing,
	) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			for (key, value) in entries {
				self.put(key, value, sealing).await?;
			}

			Ok(())
		})
	}
}

/// Error type produced by [`SecretStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Value was written with a different [`Sealing`] than the read requested.
	#[error("Key `{key}` is stored with a different sealing.")]
	SealingMismatch {
		/// Key that was read.
		key: String,
	},
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
