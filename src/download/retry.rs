//! Throttle backoff policy for rate-limited fetches.
//!
//! The search service signals throttling with HTTP 403 (and sometimes 429).
//! A throttled request is retried after a long randomized wait; any other
//! failure is terminal and never retried.
//!
//! # Overview
//!
//! [`ThrottlePolicy`] decides, after each throttled attempt, whether to wait
//! and retry or to give up. The delay is `base_delay + uniform(0, max_jitter)`.
//! The attempt bound defaults to unbounded: a service that throttles forever
//! keeps the calling worker busy forever, which holds one pool slot for the
//! whole stall. Set [`ThrottlePolicy::with_max_attempts`] to cap it.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use citefetch_core::download::{ThrottleDecision, ThrottlePolicy};
//!
//! let policy = ThrottlePolicy::new(Duration::from_secs(1), Duration::ZERO)
//!     .with_max_attempts(Some(2));
//!
//! match policy.should_retry(1) {
//!     ThrottleDecision::Wait { delay, attempt } => {
//!         assert_eq!(delay, Duration::from_secs(1));
//!         assert_eq!(attempt, 2);
//!     }
//!     ThrottleDecision::GiveUp { .. } => unreachable!(),
//! }
//! assert!(matches!(policy.should_retry(2), ThrottleDecision::GiveUp { .. }));
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument};

use super::constants::{DEFAULT_THROTTLE_BASE_DELAY, DEFAULT_THROTTLE_MAX_JITTER};

/// Returns whether an HTTP status is a throttling signal.
#[must_use]
pub fn is_throttle_status(status: u16) -> bool {
    matches!(status, 403 | 429)
}

/// Decision after a throttled attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// Sleep, then retry the same request.
    Wait {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number the retry will be (1-indexed).
        attempt: u32,
    },

    /// Stop retrying.
    GiveUp {
        /// Human-readable reason.
        reason: String,
    },
}

/// Backoff configuration for throttled requests.
///
/// # Default Values
///
/// - `base_delay`: 500 seconds
/// - `max_jitter`: 500 seconds
/// - `max_attempts`: unbounded
#[derive(Debug, Clone)]
pub struct ThrottlePolicy {
    base_delay: Duration,
    max_jitter: Duration,
    /// Maximum attempts including the first. `None` retries forever.
    max_attempts: Option<u32>,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_THROTTLE_BASE_DELAY,
            max_jitter: DEFAULT_THROTTLE_MAX_JITTER,
            max_attempts: None,
        }
    }
}

impl ThrottlePolicy {
    /// Creates an unbounded policy with custom delays.
    #[must_use]
    pub fn new(base_delay: Duration, max_jitter: Duration) -> Self {
        Self {
            base_delay,
            max_jitter,
            max_attempts: None,
        }
    }

    /// Sets the attempt bound (including the first attempt, minimum 1).
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts.map(|n| n.max(1));
        self
    }

    /// Returns the configured attempt bound.
    #[must_use]
    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Returns the base delay.
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Decides what to do after throttled attempt number `attempt` (1-indexed).
    #[instrument(level = "debug", skip(self), fields(max_attempts = ?self.max_attempts))]
    pub fn should_retry(&self, attempt: u32) -> ThrottleDecision {
        if let Some(max) = self.max_attempts
            && attempt >= max
        {
            debug!(attempt, max, "throttle attempts exhausted");
            return ThrottleDecision::GiveUp {
                reason: format!("max attempts ({max}) exhausted"),
            };
        }

        ThrottleDecision::Wait {
            delay: self.base_delay + self.jitter(),
            attempt: attempt.saturating_add(1),
        }
    }

    fn jitter(&self) -> Duration {
        let max_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}
