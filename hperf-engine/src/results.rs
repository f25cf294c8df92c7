use hperf_common::{Failure, FailureKind, HperfError, Outcome, Result, RunMode};
use serde::Serialize;

/// Lifecycle of a [`Results`]: outcomes are accepted until `finalize` runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultsState {
    #[default]
    Collecting,
    Finalized,
}

/// Latency summary in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatencyStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub median: f64,
    pub p85: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub code_1xx: usize,
    pub code_2xx: usize,
    pub code_3xx: usize,
    pub code_4xx: usize,
    pub code_5xx: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorCounts {
    pub total: usize,
    pub conn_refused: usize,
    pub conn_reset: usize,
    pub conn_timeout: usize,
    pub fd_unavail: usize,
    pub addr_unavail: usize,
    pub other: usize,
}

impl ErrorCounts {
    pub fn count(&self, kind: FailureKind) -> usize {
        match kind {
            FailureKind::ConnRefused => self.conn_refused,
            FailureKind::ConnReset => self.conn_reset,
            FailureKind::ConnTimeout => self.conn_timeout,
            FailureKind::FdUnavail => self.fd_unavail,
            FailureKind::AddrUnavail => self.addr_unavail,
            FailureKind::Other => self.other,
        }
    }

    fn bump(&mut self, kind: FailureKind) {
        let slot = match kind {
            FailureKind::ConnRefused => &mut self.conn_refused,
            FailureKind::ConnReset => &mut self.conn_reset,
            FailureKind::ConnTimeout => &mut self.conn_timeout,
            FailureKind::FdUnavail => &mut self.fd_unavail,
            FailureKind::AddrUnavail => &mut self.addr_unavail,
            FailureKind::Other => &mut self.other,
        };
        *slot += 1;
    }
}

/// Per-run collection of outcomes plus the statistics derived from them.
///
/// `took` and `codes` are sized to the requested count up front and indexed by
/// outcome index, so results are independent of arrival order. Derived fields
/// (`latency`, `status`, `errors`, `replies`) are only meaningful after
/// [`Results::finalize`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct Results {
    pub requested: usize,
    /// Outcomes recorded so far.
    pub received: usize,
    /// Recorded outcomes that completed without a failure.
    pub replies: usize,
    pub mode: Option<RunMode>,
    pub total_time_secs: f64,
    pub conn_per_sec: f64,
    /// Elapsed time of the first launched attempt (slot 0); `None` until a run completes.
    pub first_connect_ms: Option<f64>,

    /// Latency in milliseconds per slot; unreported slots stay 0.
    pub took: Vec<f64>,
    pub latency: LatencyStats,

    /// Status code per slot; 0 when no response was obtained.
    pub codes: Vec<u16>,
    pub status: StatusCounts,

    /// Failures in arrival order.
    pub failures: Vec<Failure>,
    pub errors: ErrorCounts,

    /// Byte lengths of the first response that reported a non-zero value for
    /// each field. These are a sample, not an average across responses.
    pub total_length: u64,
    pub content_length: u64,
    pub header_length: u64,

    state: ResultsState,
    #[serde(skip)]
    filled: Vec<bool>,
}

impl Results {
    pub fn new(requested: usize) -> Self {
        Self {
            requested,
            took: vec![0.0; requested],
            codes: vec![0; requested],
            filled: vec![false; requested],
            ..Self::default()
        }
    }

    pub fn state(&self) -> ResultsState {
        self.state
    }

    pub fn is_finalized(&self) -> bool {
        self.state == ResultsState::Finalized
    }

    /// Record one outcome into its slot.
    pub fn add(&mut self, outcome: Outcome) -> Result<()> {
        if self.is_finalized() {
            return Err(HperfError::AlreadyFinalized);
        }
        let index = outcome.index;
        if index >= self.requested {
            return Err(HperfError::IndexOutOfRange { index, requested: self.requested });
        }
        if self.filled[index] {
            return Err(HperfError::DuplicateIndex(index));
        }

        self.filled[index] = true;
        self.received += 1;
        self.took[index] = outcome.elapsed_ms;
        self.codes[index] = outcome.status;

        if let Some(failure) = outcome.failure {
            self.failures.push(failure);
        }

        if self.total_length == 0 {
            self.total_length = outcome.total_bytes;
        }
        if self.content_length == 0 {
            self.content_length = outcome.body_bytes;
        }
        if self.header_length == 0 {
            self.header_length = outcome.header_bytes;
        }
        Ok(())
    }

    /// Compute every derived field from the collected data.
    ///
    /// Safe to call more than once; each call recomputes from scratch. Slots that
    /// were never recorded count as zero-latency samples.
    pub fn finalize(&mut self) {
        if self.received < self.requested {
            tracing::warn!(
                received = self.received,
                requested = self.requested,
                "finalizing with missing outcomes; unreported slots count as 0 ms"
            );
        }

        let sorted = sorted_copy(&self.took);
        self.latency = LatencyStats {
            min: sorted.first().copied().unwrap_or(0.0),
            max: sorted.last().copied().unwrap_or(0.0),
            avg: mean(&sorted),
            median: median(&sorted),
            p85: percentile(&sorted, 85),
            p90: percentile(&sorted, 90),
            p95: percentile(&sorted, 95),
            p99: percentile(&sorted, 99),
        };

        self.status = StatusCounts::default();
        for &code in &self.codes {
            match code / 100 {
                1 => self.status.code_1xx += 1,
                2 => self.status.code_2xx += 1,
                3 => self.status.code_3xx += 1,
                4 => self.status.code_4xx += 1,
                5 => self.status.code_5xx += 1,
                _ => {}
            }
        }

        self.errors = ErrorCounts { total: self.failures.len(), ..ErrorCounts::default() };
        for failure in &self.failures {
            self.errors.bump(failure.kind());
        }

        self.replies = self.received - self.failures.len().min(self.received);
        self.state = ResultsState::Finalized;
    }

    /// Nearest-rank percentile over the current latency samples.
    pub fn calculate_pct(&self, pct: u32) -> f64 {
        percentile(&sorted_copy(&self.took), pct)
    }
}

fn sorted_copy(data: &[f64]) -> Vec<f64> {
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Median of an ascending slice: the middle element, or the mean of the two
/// middle elements for even lengths. Returns 0 for an empty slice.
pub fn median(sorted: &[f64]) -> f64 {
    let len = sorted.len();
    if len == 0 {
        return 0.0;
    }
    if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    } else {
        sorted[len / 2]
    }
}

/// Nearest-rank percentile of an ascending slice.
///
/// Uses rank `floor(len * pct / 100 + 0.5)` (1-based). A single sample is
/// returned as-is, two samples return the larger one, and the rank is clamped
/// into the slice otherwise. Returns 0 for an empty slice.
pub fn percentile(sorted: &[f64], pct: u32) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        2 => sorted[1],
        len => {
            let rank = (len as f64 * f64::from(pct) / 100.0 + 0.5).floor() as usize;
            sorted[rank.clamp(1, len) - 1]
        }
    }
}
