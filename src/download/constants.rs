//! Constants for the download module (timeouts, batch defaults).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes between reads for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default number of transfers allowed in flight at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Default wall-clock limit for a whole batch.
pub const DEFAULT_BATCH_DEADLINE: Duration = Duration::from_secs(60);
