//! Dispatch and aggregation engine for the `hperf` HTTP load generator.
//!
//! A run issues a fixed number of GET requests against one target, either one
//! at a time ([`Dispatcher::series`]) or as concurrently launched tasks
//! ([`Dispatcher::parallel`]), and summarizes them into [`Results`].

use hperf_client::{ClientConfig, HttpExecutor, RequestExecutor};
use hperf_common::{Outcome, Result, RunConfig, Target};

pub mod dispatcher;
pub mod report;
pub mod results;

pub use dispatcher::Dispatcher;
pub use results::Results;

/// Validate `config` and run in the mode its rate selects.
pub async fn start(config: RunConfig) -> Result<Results> {
    Ok(Dispatcher::new(config)?.run().await)
}

/// Run with only the essential options.
pub async fn quick_run(target: &str, connections: usize, rate: f64) -> Result<Results> {
    start(RunConfig::new(target, connections).with_rate(rate)).await
}

/// Fire `connections` requests concurrently with no pacing.
pub async fn siege(target: &str, connections: usize) -> Result<Results> {
    parallel(RunConfig::new(target, connections)).await
}

/// Force a sequential run regardless of the configured rate.
pub async fn series(config: RunConfig) -> Result<Results> {
    Ok(Dispatcher::new(config)?.series().await)
}

/// Force a concurrent run; a positive rate still paces launches.
pub async fn parallel(config: RunConfig) -> Result<Results> {
    Ok(Dispatcher::new(config)?.parallel().await)
}

/// Make a single request and return its raw outcome.
pub async fn connect(target: &str) -> Result<Outcome> {
    let target = Target::parse(target)?;
    let executor = HttpExecutor::new(ClientConfig::default())?;
    Ok(executor.fetch(&target).await)
}
