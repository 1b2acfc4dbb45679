//! Thread-safe in-memory [`SecretStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	store::{SecretStore, Sealing, StoreError, StoreFuture},
};

type SecretMap = Arc<RwLock<HashMap<String, SealedEntry>>>;

#[derive(Clone, Debug)]
struct SealedEntry {
	value: TokenSecret,
	sealing: Sealing,
}

/// Storage backend that keeps secrets in-process; `put_all` writes under one lock.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(SecretMap);
impl MemoryStore {
	/// Returns `true` when `key` holds a value.
	pub fn contains(&self, key: &str) -> bool {
		self.0.read().contains_key(key)
	}

	fn get_now(
		map: SecretMap,
		key: &str,
		sealing: Sealing,
	) -> Result<Option<TokenSecret>, StoreError> {
		match map.read().get(key) {
			None => Ok(None),
			Some(entry) if entry.sealing == sealing => Ok(Some(entry.value.clone())),
			Some(_) => Err(StoreError::SealingMismatch { key: key.to_owned() }),
		}
	}

	fn put_all_now(map: SecretMap, entries: Vec<(String, TokenSecret)>, sealing: Sealing) {
		let mut guard = map.write();

		for (key, value) in entries {
			guard.insert(key, SealedEntry { value, sealing });
		}
	}
}
impl SecretStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a str, sealing: Sealing) -> StoreFuture<'a, Option<TokenSecret>> {
		let map = self.0.clone();

		Box::pin(async move { Self::get_now(map, key, sealing) })
	}

	fn put<'a>(
		&'a self,
		key: &'a str,
		value: TokenSecret,
		sealing: Sealing,
	) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move {
			Self::put_all_now(map, vec![(key, value)], sealing);

			Ok(())
		})
	}

	fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().remove(key);

			Ok(())
		})
	}

	fn put_all<'a>(
		&'a self,
		entries: Vec<(&'a str, TokenSecret)>,
		sealing: Sealing,
	) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let entries = entries.into_iter().map(|(key, value)| (key.to_owned(), value)).collect();

		Box::pin(async move {
			Self::put_all_now(map, entries, sealing);

			Ok(())
		})
	}
}
