//! Load test for the catalog service's recipe-creation endpoint.
//!
//! Fires `requests` uploads with at most `workers` in flight, each carrying
//! a small text attachment, and reports latency over the successful ones.
//! Failed and timed-out requests are counted, never retried. The session is
//! not touched: the caller supplies the token.

#[cfg(test)]
#[path = "bench_test.rs"]
mod bench_test;

use std::time::{Duration, Instant};

use futures_util::StreamExt;

use crate::net::api::RecipeBackend;
use crate::net::types::{ImageUpload, NewRecipe};

pub const DEFAULT_REQUESTS: usize = 50;
pub const DEFAULT_WORKER_COUNTS: [usize; 3] = [1, 5, 10];
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

const DUMMY_FILE_NAME: &str = "dummy_image.txt";
const DUMMY_FILE_BODY: &[u8] = b"This is a dummy file for performance testing.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchConfig {
    pub requests: usize,
    /// Maximum concurrent requests. Zero is treated as one.
    pub workers: usize,
    pub request_timeout: Duration,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self { requests: DEFAULT_REQUESTS, workers: 1, request_timeout: DEFAULT_REQUEST_TIMEOUT }
    }
}

/// Latency of the successful requests, in milliseconds. All zero when
/// nothing succeeded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LatencyMetrics {
    pub count: usize,
    pub min_ms: f64,
    pub max_ms: f64,
    pub avg_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

impl LatencyMetrics {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_durations(durations: &[Duration]) -> Self {
        let mut samples: Vec<f64> = durations.iter().map(|d| d.as_secs_f64() * 1_000.0).collect();
        samples.sort_by(f64::total_cmp);
        let (Some(&min_ms), Some(&max_ms)) = (samples.first(), samples.last()) else {
            return Self::default();
        };
        Self {
            count: samples.len(),
            min_ms,
            max_ms,
            avg_ms: samples.iter().sum::<f64>() / samples.len() as f64,
            p50_ms: percentile(&samples, 0.50),
            p95_ms: percentile(&samples, 0.95),
            p99_ms: percentile(&samples, 0.99),
        }
    }
}

/// Outcome of one bench run.
#[derive(Clone, Debug, PartialEq)]
pub struct BenchReport {
    pub requests: usize,
    pub workers: usize,
    pub failures: usize,
    pub latency: LatencyMetrics,
    pub elapsed: Duration,
}

impl BenchReport {
    /// Successful requests per second of wall-clock time.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn throughput(&self) -> f64 {
        self.latency.count as f64 / self.elapsed.as_secs_f64().max(1e-9)
    }

    /// Human-readable summary, one fact per line.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let header = format!(
            "--- {} requests with {} workers ---",
            self.requests, self.workers
        );
        if self.latency.count == 0 {
            return vec![header, "Test failed: No successful responses recorded.".to_owned()];
        }
        let m = &self.latency;
        vec![
            header,
            format!("Total Successful Requests: {} / {}", m.count, self.requests),
            format!("Failed Requests: {}", self.failures),
            format!("Average Latency: {:.2} ms", m.avg_ms),
            format!(
                "Latency min/p50/p95/p99/max: {:.2} / {:.2} / {:.2} / {:.2} / {:.2} ms",
                m.min_ms, m.p50_ms, m.p95_ms, m.p99_ms, m.max_ms
            ),
            format!("Throughput: {:.2} req/s", self.throughput()),
        ]
    }
}

/// Run one load test against `backend` with `token`.
pub async fn run<B: RecipeBackend>(backend: &B, token: &str, config: &BenchConfig) -> BenchReport {
    let workers = config.workers.max(1);
    tracing::info!(requests = config.requests, workers, "bench started");

    let started = Instant::now();
    let outcomes = futures_util::stream::iter(0..config.requests)
        .map(|n| timed_upload(backend, token, n, config.request_timeout))
        .buffer_unordered(workers)
        .collect::<Vec<_>>()
        .await;
    let elapsed = started.elapsed();

    let latencies = outcomes.iter().filter_map(|o| *o).collect::<Vec<_>>();
    let report = BenchReport {
        requests: config.requests,
        workers,
        failures: outcomes.len() - latencies.len(),
        latency: LatencyMetrics::from_durations(&latencies),
        elapsed,
    };
    tracing::info!(
        succeeded = report.latency.count,
        failed = report.failures,
        avg_ms = report.latency.avg_ms,
        "bench finished"
    );
    report
}

/// Latency of one successful upload, or `None` on failure or timeout.
async fn timed_upload<B: RecipeBackend>(
    backend: &B,
    token: &str,
    n: usize,
    timeout: Duration,
) -> Option<Duration> {
    let recipe = bench_recipe(n);
    let started = Instant::now();
    match tokio::time::timeout(timeout, backend.create_recipe(token, &recipe)).await {
        Ok(Ok(_)) => Some(started.elapsed()),
        Ok(Err(e)) => {
            tracing::debug!(n, error = %e, "bench request failed");
            None
        }
        Err(_) => {
            tracing::debug!(n, "bench request timed out");
            None
        }
    }
}

fn bench_recipe(n: usize) -> NewRecipe {
    NewRecipe {
        title: format!("Load Test Recipe {n}"),
        instructions: "Run instructions for a load test.".to_owned(),
        image: Some(ImageUpload {
            file_name: DUMMY_FILE_NAME.to_owned(),
            bytes: DUMMY_FILE_BODY.to_vec(),
            mime: Some("text/plain".to_owned()),
        }),
    }
}

/// Nearest-rank percentile: the smallest sample with at least `p` of the
/// sample at or below it.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = (p * sorted.len() as f64).ceil() as usize;
    sorted.get(rank.saturating_sub(1)).copied().unwrap_or(0.0)
}
