//! Time source injected into the MFA push-poll loop.
//!
//! The verifier only ever asks "what time is it" and "wait this long", so swapping
//! [`SystemClock`] for [`ManualClock`] lets the 30-second push budget run in zero real time.

// self
use crate::{_prelude::*, BoxFuture};

/// Clock capability used by time-bounded loops.
pub trait Clock: Send + Sync {
	/// Current instant.
	fn now(&self) -> OffsetDateTime;

	/// Suspends the caller for `duration`. Negative durations return immediately.
	fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()>;
}

/// Wall clock backed by the tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}

	fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
		let duration = std::time::Duration::try_from(duration).unwrap_or_default();

		Box::pin(tokio::time::sleep(duration))
	}
}

/// Deterministic clock whose `sleep` advances time instantly.
#[derive(Debug)]
pub struct ManualClock {
	now: Mutex<OffsetDateTime>,
	sleeps: Mutex<Vec<Duration>>,
}
impl ManualClock {
	/// Starts the clock at `start`.
	pub fn new(start: OffsetDateTime) -> Self {
		Self { now: Mutex::new(start), sleeps: Mutex::default() }
	}

	/// Moves the clock forward without recording a sleep.
	pub fn advance(&self, duration: Duration) {
		*self.now.lock() += duration;
	}

	/// Every duration passed to [`Clock::sleep`], in call order.
	pub fn sleeps(&self) -> Vec<Duration> {
		self.sleeps.lock().clone()
	}
}
impl Default for ManualClock {
	fn default() -> Self {
		Self::new(OffsetDateTime::UNIX_EPOCH)
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.now.lock()
	}

	fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
		if duration.is_positive() {
			self.advance(duration);
		}

		self.sleeps.lock().push(duration);

		Box::pin(async {})
	}
}
