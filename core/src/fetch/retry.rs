use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounded exponential backoff for transient download failures.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Attempts made after the first one fails.
	#[serde(default = "RetryPolicy::default_max_retries")]
	pub max_retries: u32,
	#[serde(default = "RetryPolicy::default_initial_backoff_ms")]
	pub initial_backoff_ms: u64,
	#[serde(default = "RetryPolicy::default_max_backoff_ms")]
	pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_retries: Self::default_max_retries(),
			initial_backoff_ms: Self::default_initial_backoff_ms(),
			max_backoff_ms: Self::default_max_backoff_ms(),
		}
	}
}

impl RetryPolicy {
	fn default_max_retries() -> u32 {
		3
	}

	fn default_initial_backoff_ms() -> u64 {
		500
	}

	fn default_max_backoff_ms() -> u64 {
		8_000
	}

	/// Retries immediately; for tests and scripted transports.
	pub fn immediate(max_retries: u32) -> Self {
		Self {
			max_retries,
			initial_backoff_ms: 0,
			max_backoff_ms: 0,
		}
	}

	pub fn max_attempts(&self) -> u32 {
		self.max_retries.saturating_add(1)
	}

	/// Delay before retry number `retry` (1-based), doubling each time up to the cap.
	pub fn backoff(&self, retry: u32) -> Duration {
		let exponent = retry.saturating_sub(1).min(31);
		let delay = self
			.initial_backoff_ms
			.saturating_mul(1u64 << exponent)
			.min(self.max_backoff_ms);
		Duration::from_millis(delay)
	}

	/// [`Self::backoff`] plus up to a quarter of it again, so parallel downloads do not retry in lockstep.
	pub fn backoff_with_jitter(&self, retry: u32) -> Duration {
		let base = self.backoff(retry);
		let spread = base.as_millis() as u64 / 4;
		if spread == 0 {
			return base;
		}
		base + Duration::from_millis(rand::thread_rng().gen_range(0..=spread))
	}
}

#[cfg(test)]
mod retry {
	use super::*;

	#[test]
	fn doubles_until_capped() {
		let policy = RetryPolicy {
			max_retries: 10,
			initial_backoff_ms: 100,
			max_backoff_ms: 1_000,
		};
		let delays = (1..=6)
			.map(|retry| policy.backoff(retry).as_millis())
			.collect::<Vec<_>>();
		assert_eq!(delays, vec![100, 200, 400, 800, 1_000, 1_000]);
		assert_eq!(policy.max_attempts(), 11);
	}

	#[test]
	fn jitter_stays_in_bounds() {
		let policy = RetryPolicy::default();
		for retry in 1..=5 {
			let base = policy.backoff(retry);
			let jittered = policy.backoff_with_jitter(retry);
			assert!(jittered >= base);
			assert!(jittered <= base + base / 4);
		}
	}

	#[test]
	fn huge_retry_counts_do_not_overflow() {
		let policy = RetryPolicy::default();
		assert_eq!(policy.backoff(u32::MAX), Duration::from_millis(8_000));
		assert_eq!(RetryPolicy::immediate(u32::MAX).max_attempts(), u32::MAX);
	}
}
