use std::fmt;

use hperf_common::RunConfig;

use crate::results::Results;

/// One-line summary of what is about to run.
pub fn render_header(config: &RunConfig) -> String {
    format!(
        "Running: Path={} NumConns={} Rate={} Verbose={}",
        config.target, config.connections, config.rate, config.verbose,
    )
}

/// httperf-style text report for finalized results.
pub fn render_report(results: &Results) -> String {
    Report(results).to_string()
}

pub struct Report<'a>(pub &'a Results);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        let l = &r.latency;
        let s = &r.status;
        let e = &r.errors;

        writeln!(
            f,
            "Total: requested {} replies {} test-duration {:.3}s",
            r.requested, r.replies, r.total_time_secs
        )?;
        writeln!(f)?;

        writeln!(f, "Connection rate: {:.3} conn/s", r.conn_per_sec)?;
        writeln!(
            f,
            "Connection time [ms]: min {:.2} avg {:.2} max {:.2} med {:.2}",
            l.min, l.avg, l.max, l.median
        )?;
        writeln!(
            f,
            "Connection time [ms]: 85th {:.2} 90th {:.2} 95th {:.2} 99th {:.2}",
            l.p85, l.p90, l.p95, l.p99
        )?;
        match r.first_connect_ms {
            Some(ms) => writeln!(f, "Connection time [ms]: connect {ms:.2}")?,
            None => writeln!(f, "Connection time [ms]: connect n/a")?,
        }
        writeln!(f)?;

        // Sizes come from the first response that reported them.
        writeln!(
            f,
            "Reply size [B]: content {} header/footer {} (total {})",
            r.content_length, r.header_length, r.total_length
        )?;
        writeln!(
            f,
            "Reply status: 1xx={} 2xx={} 3xx={} 4xx={} 5xx={}",
            s.code_1xx, s.code_2xx, s.code_3xx, s.code_4xx, s.code_5xx
        )?;
        writeln!(f)?;

        writeln!(
            f,
            "Errors: total {} conn-timeout {} conn-refused {} conn-reset {}",
            e.total, e.conn_timeout, e.conn_refused, e.conn_reset
        )?;
        writeln!(
            f,
            "Errors: fd-unavail {} addr-unavail {} other {}",
            e.fd_unavail, e.addr_unavail, e.other
        )
    }
}
