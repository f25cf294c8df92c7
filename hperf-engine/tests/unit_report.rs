use hperf_common::{Failure, Outcome, RunConfig};
use hperf_engine::report::{render_header, render_report};
use hperf_engine::Results;

fn finalized() -> Results {
    let mut r = Results::new(3);
    r.add(Outcome::response(100.0, 200, 120, 10).at(0)).unwrap();
    r.add(Outcome::response(200.0, 404, 100, 0).at(1)).unwrap();
    r.add(Outcome::failed(300.0, Failure::new("connection refused")).at(2)).unwrap();
    r.total_time_secs = 1.5;
    r.conn_per_sec = 2.0;
    r.first_connect_ms = Some(100.0);
    r.finalize();
    r
}

#[test]
fn test_header() {
    let mut c = RunConfig::new("http://localhost:9876", 10).with_rate(5.0);
    c.verbose = true;
    assert_eq!(
        render_header(&c),
        "Running: Path=http://localhost:9876 NumConns=10 Rate=5 Verbose=true"
    );
}

#[test]
fn test_report_lines() {
    let report = render_report(&finalized());
    for line in [
        "Total: requested 3 replies 2 test-duration 1.500s",
        "Connection rate: 2.000 conn/s",
        "Connection time [ms]: min 100.00 avg 200.00 max 300.00 med 200.00",
        "Connection time [ms]: 85th 300.00 90th 300.00 95th 300.00 99th 300.00",
        "Connection time [ms]: connect 100.00",
        "Reply size [B]: content 10 header/footer 120 (total 130)",
        "Reply status: 1xx=0 2xx=1 3xx=0 4xx=1 5xx=0",
        "Errors: total 1 conn-timeout 0 conn-refused 1 conn-reset 0",
        "Errors: fd-unavail 0 addr-unavail 0 other 0",
    ] {
        assert!(report.contains(line), "missing {line:?} in:\n{report}");
    }
}

#[test]
fn test_report_before_any_run() {
    let mut r = Results::new(1);
    r.finalize();
    let report = render_report(&r);
    assert!(report.contains("Connection time [ms]: connect n/a"));
    assert!(report.contains("Total: requested 1 replies 0"));
}
