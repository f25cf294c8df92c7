use std::error::Error as StdError;

use serde::{Deserialize, Serialize};

/// Description of why a single request attempt did not complete normally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub message: String,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// Flatten `err` and its whole `source()` chain into one message, so the
    /// OS-level cause (e.g. "Connection refused (os error 111)") stays visible
    /// underneath client wrappers.
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        Self { message }
    }

    pub fn kind(&self) -> FailureKind {
        FailureKind::classify(&self.message)
    }
}

/// Failure classes reported by a run, in match priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    ConnRefused,
    ConnReset,
    ConnTimeout,
    FdUnavail,
    AddrUnavail,
    Other,
}

/// Ordered taxonomy; the first rule with a matching needle wins. Needles are lowercase.
const RULES: &[(FailureKind, &[&str])] = &[
    (FailureKind::ConnRefused, &["connection refused"]),
    (FailureKind::ConnReset, &["connection reset"]),
    (FailureKind::ConnTimeout, &["connection timed out", "operation timed out"]),
    (FailureKind::FdUnavail, &["no free file descriptors", "too many open files"]),
    (
        FailureKind::AddrUnavail,
        &[
            "no such host",
            "failed to lookup address",
            "name or service not known",
            "cannot assign requested address",
            "address not available",
        ],
    ),
];

impl FailureKind {
    /// Classify a failure message by case-insensitive substring match.
    pub fn classify(message: &str) -> Self {
        let message = message.to_lowercase();
        RULES
            .iter()
            .find(|(_, needles)| needles.iter().any(|n| message.contains(n)))
            .map(|(kind, _)| *kind)
            .unwrap_or(FailureKind::Other)
    }

    pub fn as_name(&self) -> &'static str {
        match self {
            FailureKind::ConnRefused => "conn-refused",
            FailureKind::ConnReset => "conn-reset",
            FailureKind::ConnTimeout => "conn-timeout",
            FailureKind::FdUnavail => "fd-unavail",
            FailureKind::AddrUnavail => "addr-unavail",
            FailureKind::Other => "other",
        }
    }
}

/// The result of one request attempt.
///
/// Executors produce outcomes with `index == 0`; the dispatcher assigns the real
/// slot with [`Outcome::at`] before handing it to the results.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub index: usize,
    /// Wall-clock duration of the attempt in milliseconds.
    pub elapsed_ms: f64,
    /// HTTP status, or 0 when no response was obtained.
    pub status: u16,
    pub failure: Option<Failure>,
    pub total_bytes: u64,
    pub body_bytes: u64,
    pub header_bytes: u64,
}

impl Outcome {
    /// A response that arrived. `total_bytes` is derived as header + body.
    pub fn response(elapsed_ms: f64, status: u16, header_bytes: u64, body_bytes: u64) -> Self {
        Self {
            index: 0,
            elapsed_ms,
            status,
            failure: None,
            total_bytes: header_bytes + body_bytes,
            body_bytes,
            header_bytes,
        }
    }

    /// An attempt that failed before any response was obtained.
    pub fn failed(elapsed_ms: f64, failure: Failure) -> Self {
        Self {
            index: 0,
            elapsed_ms,
            status: 0,
            failure: Some(failure),
            total_bytes: 0,
            body_bytes: 0,
            header_bytes: 0,
        }
    }

    pub fn with_failure(mut self, failure: Failure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn at(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}
