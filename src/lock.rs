//! Per-process named locks serializing critical sections across concurrent tasks.

// self
use crate::_prelude::*;

/// Lock name scoping one in-flight token refresh.
pub const REFRESH_LOCK: &str = "signnow-refresh-token";

/// Registry of async mutexes keyed by name, created on first use.
///
/// Clones share the same registry, so every client built from one registry serializes on
/// the same names. The guarantee is process-local.
#[derive(Clone, Debug, Default)]
pub struct LockRegistry(Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>);
impl LockRegistry {
	/// Runs `critical_section` while holding the lock called `name`.
	///
	/// Callers contending for the same name queue in FIFO order and run one at a time.
	pub async fn lock<F, Fut, T>(&self, name: &str, critical_section: F) -> T
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = T>,
	{
		let guard = self.guard(name);
		let _held = guard.lock().await;

		critical_section().await
	}

	/// Returns `true` while some task holds the lock called `name`.
	pub fn is_held(&self, name: &str) -> bool {
		self.0.lock().get(name).is_some_and(|guard| guard.try_lock().is_none())
	}

	fn guard(&self, name: &str) -> Arc<AsyncMutex<()>> {
		let mut guards = self.0.lock();

		guards.entry(name.to_owned()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}
}
