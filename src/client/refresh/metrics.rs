// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for refresh attempts.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	upstream_calls: AtomicU64,
	refreshed: AtomicU64,
	reused: AtomicU64,
	failure: AtomicU64,
}
impl RefreshMetrics {
	/// Returns the total number of refresh requests, including ones that reused a pair.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of calls that reached the token endpoint.
	pub fn upstream_calls(&self) -> u64 {
		self.upstream_calls.load(Ordering::Relaxed)
	}

	/// Returns the number of refreshes that stored a new pair.
	pub fn refreshed(&self) -> u64 {
		self.refreshed.load(Ordering::Relaxed)
	}

	/// Returns the number of waiters that found the pair already rotated.
	pub fn reused(&self) -> u64 {
		self.reused.load(Ordering::Relaxed)
	}

	/// Returns the number of failed refreshes.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_upstream_call(&self) {
		self.upstream_calls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refreshed(&self) {
		self.refreshed.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_reused(&self) {
		self.reused.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}
}
