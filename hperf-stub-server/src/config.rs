use std::time::Duration;

/// Delay applied to `GET /` when none is configured.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(5);

/// Upper bound for `GET /sleep/:ms`.
pub const MAX_SLEEP_MS: u64 = 60_000;

/// Body returned by `GET /`.
pub const HELLO_BODY: &str = "hello web\n";
