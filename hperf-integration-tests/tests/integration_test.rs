use std::net::SocketAddr;
use std::time::Duration;

use hperf_common::{FailureKind, HperfError, RunConfig, RunMode};
use hperf_engine::Dispatcher;
use hperf_stub_server::{pick_free_ports, AppState, Server, ServerConfig};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;

const SERVER_READY_TIMEOUT: Duration = Duration::from_secs(60);

/// A stub server owned by one test; aborted when dropped.
struct StubServer {
    addr: SocketAddr,
    state: AppState,
    handle: JoinHandle<()>,
}

impl StubServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn start_server(delay: Duration) -> StubServer {
    let (ready_tx, ready_rx) = oneshot::channel();

    let server = Server::new(ServerConfig {
        address: "127.0.0.1:0".parse().unwrap(),
        delay,
    });
    let state = server.state();

    let handle = tokio::spawn(async move {
        server.run(ready_tx).await.expect("server failed");
    });

    let addr = timeout(SERVER_READY_TIMEOUT, ready_rx)
        .await
        .expect("server did not start within 60 seconds")
        .expect("server ready signal dropped");

    StubServer { addr, state, handle }
}

fn refused_target() -> String {
    let port = pick_free_ports(1).expect("free port")[0];
    format!("127.0.0.1:{port}")
}

#[tokio::test]
async fn test_series_against_live_server() {
    let server = start_server(Duration::from_millis(5)).await;

    let r = hperf_engine::series(RunConfig::new(server.url("/"), 10)).await.expect("valid config");

    assert_eq!(r.mode, Some(RunMode::Series));
    assert_eq!(r.took.len(), 10);
    assert_eq!(r.codes.len(), 10);
    assert!(r.took.iter().all(|&t| t > 0.0));
    assert_eq!(r.codes, vec![200; 10]);
    assert!(r.failures.is_empty());
    assert_eq!(r.status.code_2xx, 10);
    assert_eq!(r.replies, 10);
    assert_eq!(server.state.hits(), 10);
    assert_eq!(r.content_length, 10);
    assert!(r.header_length > 0);
    assert_eq!(r.total_length, r.header_length + r.content_length);
    assert!(r.first_connect_ms.is_some());
    assert!(r.latency.median > 0.0);
}

#[tokio::test]
async fn test_parallel_against_live_server() {
    let server = start_server(Duration::from_millis(5)).await;

    let r = hperf_engine::parallel(RunConfig::new(server.url("/"), 10)).await.expect("valid config");

    assert_eq!(r.mode, Some(RunMode::Parallel));
    assert_eq!(r.took.len(), 10);
    assert!(r.took.iter().all(|&t| t > 0.0));
    assert_eq!(r.codes, vec![200; 10]);
    assert!(r.failures.is_empty());
    assert_eq!(server.state.hits(), 10);
}

#[tokio::test]
async fn test_start_selects_mode_by_rate() {
    let server = start_server(Duration::from_millis(1)).await;

    for (rate, mode) in [(0.0, RunMode::Series), (-1.0, RunMode::Parallel), (5.5, RunMode::Parallel)] {
        let r = hperf_engine::start(RunConfig::new(server.url("/"), 5).with_rate(rate))
            .await
            .expect("valid config");
        assert_eq!(r.mode, Some(mode), "rate {rate}");
        assert_eq!(r.codes, vec![200; 5]);
    }
    assert_eq!(server.state.hits(), 15);
}

#[tokio::test]
async fn test_quick_run_and_siege() {
    let server = start_server(Duration::from_millis(1)).await;

    let quick = hperf_engine::quick_run(&server.url("/"), 5, 5.0).await.unwrap();
    assert_eq!(quick.took.len(), 5);
    assert!(quick.failures.is_empty());
    // Five launches at 5/s span at least 0.8 s.
    assert!(quick.total_time_secs >= 0.8, "total {}", quick.total_time_secs);

    let siege = hperf_engine::siege(&server.url("/"), 5).await.unwrap();
    assert_eq!(siege.mode, Some(RunMode::Parallel));
    assert_eq!(siege.codes, vec![200; 5]);
}

#[tokio::test]
async fn test_series_and_parallel_match_structurally() {
    let server = start_server(Duration::from_millis(2)).await;
    let config = RunConfig::new(server.url("/status/204"), 6);

    let series = hperf_engine::series(config.clone()).await.unwrap();
    let parallel = hperf_engine::parallel(config).await.unwrap();

    assert_eq!(series.requested, parallel.requested);
    assert_eq!(series.codes, parallel.codes);
    assert_eq!(series.status, parallel.status);
    assert!(series.took.iter().chain(parallel.took.iter()).all(|&t| t > 0.0));
}

#[tokio::test]
async fn test_status_codes_are_classified() {
    let server = start_server(Duration::ZERO).await;

    for (path, expected) in [("/status/404", 404u16), ("/status/503", 503), ("/status/302", 302)] {
        let r = hperf_engine::series(RunConfig::new(server.url(path), 3)).await.unwrap();
        assert_eq!(r.codes, vec![expected; 3]);
        assert!(r.failures.is_empty(), "non-2xx statuses are not failures");
    }

    let r = hperf_engine::series(RunConfig::new(server.url("/status/503"), 2)).await.unwrap();
    assert_eq!(r.status.code_5xx, 2);
    assert_eq!(r.status.code_2xx, 0);
}

#[tokio::test]
async fn test_connection_refused_is_recorded_not_fatal() {
    let target = refused_target();

    for rate in [0.0, -1.0] {
        let r = hperf_engine::start(RunConfig::new(target.clone(), 4).with_rate(rate)).await.unwrap();
        assert_eq!(r.requested, 4);
        assert_eq!(r.received, 4);
        assert_eq!(r.codes, vec![0; 4]);
        assert_eq!(r.errors.total, 4);
        assert_eq!(r.errors.conn_refused, 4, "failures: {:?}", r.failures);
        assert_eq!(r.errors.count(FailureKind::Other), 0);
        assert_eq!(r.replies, 0);
    }
}

#[tokio::test]
async fn test_timeout_bounds_hung_requests() {
    let server = start_server(Duration::ZERO).await;
    let mut config = RunConfig::new(server.url("/sleep/5000"), 3).with_rate(-1.0);
    config.timeout_ms = Some(100);

    let r = Dispatcher::new(config).unwrap().run().await;

    assert!(r.total_time_secs < 4.0, "total {}", r.total_time_secs);
    assert_eq!(r.errors.total, 3);
    assert_eq!(r.errors.conn_timeout, 3, "failures: {:?}", r.failures);
    assert_eq!(r.codes, vec![0; 3]);
}

#[tokio::test]
async fn test_connect_single_request() {
    let server = start_server(Duration::ZERO).await;

    let outcome = hperf_engine::connect(&server.url("/")).await.unwrap();
    assert_eq!(outcome.status, 200);
    assert_eq!(outcome.index, 0);
    assert!(outcome.is_success());
    assert_eq!(server.state.hits(), 1);
}

#[tokio::test]
async fn test_configuration_errors_fail_before_any_request() {
    let server = start_server(Duration::ZERO).await;

    assert_eq!(
        hperf_engine::start(RunConfig::new(server.url("/"), 0)).await.err(),
        Some(HperfError::ZeroConnections)
    );
    assert_eq!(
        hperf_engine::quick_run("", 5, 0.0).await.err(),
        Some(HperfError::EmptyTarget)
    );
    assert_eq!(server.state.hits(), 0);
}
