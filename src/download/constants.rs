//! Constants for the download module (timeouts, throttle backoff).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout for PDF downloads (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default timeout for a single search query (5 minutes).
pub const SEARCH_TIMEOUT_SECS: u64 = 300;

/// Base wait after a throttling response.
pub const DEFAULT_THROTTLE_BASE_DELAY: Duration = Duration::from_secs(500);

/// Upper bound of the random jitter added to the throttle base wait.
pub const DEFAULT_THROTTLE_MAX_JITTER: Duration = Duration::from_secs(500);
