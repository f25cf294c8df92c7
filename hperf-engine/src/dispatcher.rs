use std::sync::Arc;
use std::time::{Duration, Instant};

use hperf_client::{ClientConfig, HttpExecutor, RequestExecutor};
use hperf_common::{Failure, Outcome, Result, RunConfig, RunMode, Target};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinSet;

use crate::results::Results;

/// Executes a fixed number of request attempts against one target and collects
/// every outcome into a [`Results`].
pub struct Dispatcher {
    config: RunConfig,
    target: Target,
    executor: Arc<dyn RequestExecutor>,
    results: Results,
}

impl Dispatcher {
    /// Build a dispatcher that issues real HTTP GETs.
    pub fn new(config: RunConfig) -> Result<Self> {
        let executor = HttpExecutor::new(ClientConfig { timeout: config.timeout() })?;
        Self::with_executor(config, Arc::new(executor))
    }

    /// Build a dispatcher around any executor. Fails if `config` is invalid.
    pub fn with_executor(config: RunConfig, executor: Arc<dyn RequestExecutor>) -> Result<Self> {
        let target = config.validate()?;
        let results = Results::new(config.connections);
        Ok(Self { config, target, executor, results })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Run in the mode selected by the configured rate.
    pub async fn run(self) -> Results {
        match self.config.mode() {
            RunMode::Series => self.series().await,
            RunMode::Parallel => self.parallel().await,
        }
    }

    /// One attempt at a time, in index order.
    pub async fn series(mut self) -> Results {
        let start = Instant::now();
        let timeout = self.config.timeout();

        for index in 0..self.config.connections {
            let outcome = attempt(self.executor.as_ref(), &self.target, timeout).await.at(index);
            record(&mut self.results, outcome, self.config.verbose);
        }

        finish(self.results, start, RunMode::Series, self.config.verbose)
    }

    /// Launch every attempt as its own task, pacing launches when the rate is
    /// positive. Each producer hands its outcome to a paired collector task; the
    /// call returns once all of them have completed.
    pub async fn parallel(self) -> Results {
        let Dispatcher { config, target, executor, results } = self;
        let start = Instant::now();
        let pacing = config.pacing();
        let timeout = config.timeout();
        let verbose = config.verbose;

        let target = Arc::new(target);
        let shared = Arc::new(Mutex::new(results));
        let mut tasks = JoinSet::new();

        for index in 0..config.connections {
            if let Some(delay) = pacing.filter(|_| index > 0) {
                tokio::time::sleep(delay).await;
            }

            let (tx, rx) = oneshot::channel();

            let executor = Arc::clone(&executor);
            let target = Arc::clone(&target);
            tasks.spawn(async move {
                let outcome = attempt(executor.as_ref(), &target, timeout).await.at(index);
                // The receiver only disappears if its collector panicked.
                tx.send(outcome).ok();
            });

            let shared = Arc::clone(&shared);
            tasks.spawn(async move {
                if let Ok(outcome) = rx.await {
                    record(&mut *shared.lock().await, outcome, verbose);
                }
            });
        }
        tracing::debug!(
            launched = config.connections,
            launch_secs = start.elapsed().as_secs_f64(),
            "all attempts launched"
        );

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "request task did not complete");
            }
        }

        let results = std::mem::take(&mut *shared.lock().await);
        finish(results, start, RunMode::Parallel, verbose)
    }
}

/// Perform one attempt, converting an exceeded deadline into a failed outcome.
async fn attempt(executor: &dyn RequestExecutor, target: &Target, timeout: Option<Duration>) -> Outcome {
    let Some(limit) = timeout else {
        return executor.fetch(target).await;
    };

    let start = Instant::now();
    match tokio::time::timeout(limit, executor.fetch(target)).await {
        Ok(outcome) => outcome,
        Err(_) => Outcome::failed(
            start.elapsed().as_secs_f64() * 1_000.0,
            Failure::new(format!("connection timed out: no response within {} ms", limit.as_millis())),
        ),
    }
}

fn record(results: &mut Results, outcome: Outcome, verbose: bool) {
    if verbose {
        match &outcome.failure {
            Some(failure) => {
                tracing::info!(index = outcome.index, error = %failure.message, "responded with error")
            }
            None => tracing::info!(
                index = outcome.index,
                elapsed_ms = outcome.elapsed_ms,
                status = outcome.status,
                "responded"
            ),
        }
    }

    if let Err(e) = results.add(outcome) {
        tracing::warn!(error = %e, "outcome discarded");
    }
}

fn finish(mut results: Results, start: Instant, mode: RunMode, verbose: bool) -> Results {
    if verbose {
        tracing::info!(mode = mode.as_name(), "finalizing");
    }

    let total = start.elapsed().as_secs_f64();
    results.mode = Some(mode);
    results.total_time_secs = total;
    results.conn_per_sec = if total > 0.0 { results.requested as f64 / total } else { 0.0 };
    results.first_connect_ms = results.took.first().copied();
    results.finalize();
    results
}
