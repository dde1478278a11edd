//! Per-task memory sampling and pressure mitigation
//!
//! Each export task gets its own [`MemorySampler`] that records process
//! memory at the start of the run and tracks the peak on a background loop.
//! The readings are observability only; export correctness never depends on
//! them. A separate pressure hook ([`check_memory_pressure`]) runs between
//! batches and applies watermark-based backpressure.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use sysinfo::System;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::SamplerConfig;
use crate::types::{MemoryStats, MemoryStatus, TaskId};

/// Background sampler of this process's memory usage
///
/// `start`/`stop` are idempotent: a second start while running, or a stop
/// while stopped, is a no-op.
pub struct MemorySampler {
    task_id: TaskId,
    interval: Duration,
    running: AtomicBool,
    start_bytes: AtomicU64,
    peak_bytes: Arc<AtomicU64>,
    current_bytes: Arc<AtomicU64>,
    loop_handle: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl MemorySampler {
    /// Create a sampler for one export task
    pub fn new(task_id: TaskId, config: &SamplerConfig) -> Self {
        Self {
            task_id,
            interval: Duration::from_millis(config.interval_ms),
            running: AtomicBool::new(false),
            start_bytes: AtomicU64::new(0),
            peak_bytes: Arc::new(AtomicU64::new(0)),
            current_bytes: Arc::new(AtomicU64::new(0)),
            loop_handle: Mutex::new(None),
        }
    }

    /// Start sampling
    ///
    /// Records the baseline reading (which doubles as the initial peak) and
    /// spawns the sampling loop. Returns immediately if already running.
    pub async fn start(&self) {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let baseline = read_process_memory().unwrap_or(0);
        self.start_bytes.store(baseline, Ordering::SeqCst);
        self.peak_bytes.store(baseline, Ordering::SeqCst);
        self.current_bytes.store(baseline, Ordering::SeqCst);

        tracing::debug!(
            task_id = %self.task_id,
            start_mb = baseline / (1024 * 1024),
            "memory sampler started"
        );

        let token = CancellationToken::new();
        let loop_token = token.clone();
        let peak = Arc::clone(&self.peak_bytes);
        let current = Arc::clone(&self.current_bytes);
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut sys = System::new();
            let pid = match sysinfo::get_current_pid() {
                Ok(pid) => pid,
                Err(e) => {
                    tracing::debug!(error = %e, "cannot resolve current pid, sampler loop exiting");
                    return;
                }
            };

            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {
                        sys.refresh_process(pid);
                        if let Some(proc) = sys.process(pid) {
                            let used = proc.memory();
                            current.store(used, Ordering::SeqCst);
                            peak.fetch_max(used, Ordering::SeqCst);
                        }
                    }
                }
            }
        });

        let mut guard = self.loop_handle.lock().await;
        *guard = Some((token, handle));
    }

    /// Stop sampling
    ///
    /// Cancels the loop, waits for it to finish, and records a final current
    /// reading. Returns immediately if not running.
    pub async fn stop(&self) {
        if self
            .running
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let taken = {
            let mut guard = self.loop_handle.lock().await;
            guard.take()
        };
        if let Some((token, handle)) = taken {
            token.cancel();
            let _ = handle.await;
        }

        if let Some(used) = read_process_memory() {
            self.current_bytes.store(used, Ordering::SeqCst);
            self.peak_bytes.fetch_max(used, Ordering::SeqCst);
        }

        let stats = self.stats();
        tracing::debug!(
            task_id = %self.task_id,
            peak_mb = format!("{:.1}", stats.peak_mb()),
            increase_mb = format!("{:.1}", stats.increase_mb()),
            "memory sampler stopped"
        );
    }

    /// Point-in-time snapshot of the sampled window, callable anytime
    pub fn stats(&self) -> MemoryStats {
        let start = self.start_bytes.load(Ordering::SeqCst);
        let peak = self.peak_bytes.load(Ordering::SeqCst);
        let current = self.current_bytes.load(Ordering::SeqCst);

        MemoryStats {
            start_bytes: start,
            peak_bytes: peak,
            current_bytes: current,
            increase_bytes: peak.saturating_sub(start),
        }
    }

    /// Whether the sampling loop is active
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Read this process's resident memory in bytes
fn read_process_memory() -> Option<u64> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut sys = System::new();
    sys.refresh_process(pid);
    sys.process(pid).map(|proc| proc.memory())
}

/// One-off reading of process and host memory, served by the monitor endpoint
pub fn memory_status() -> MemoryStatus {
    let mut sys = System::new();
    sys.refresh_memory();
    let total = sys.total_memory();
    let used = sys.used_memory();

    MemoryStatus {
        process_bytes: read_process_memory().unwrap_or(0),
        used_bytes: used,
        total_bytes: total,
        usage_ratio: if total == 0 {
            0.0
        } else {
            used as f64 / total as f64
        },
        timestamp: chrono::Utc::now().timestamp_millis(),
    }
}

/// Watermark-based memory pressure hook, run between batches
///
/// Heuristic backpressure only: above the high watermark the task yields
/// briefly so the allocator can return freed pages and other tasks can run,
/// then logs the before/after delta. Above the low watermark it only warns.
pub async fn check_memory_pressure(task_id: &TaskId, config: &SamplerConfig) {
    let mut sys = System::new();
    sys.refresh_memory();
    let total = sys.total_memory();
    if total == 0 {
        return;
    }
    let used = sys.used_memory();
    let ratio = used as f64 / total as f64;

    if ratio >= config.high_watermark {
        tracing::info!(
            task_id = %task_id,
            used_mb = used / (1024 * 1024),
            ratio = format!("{:.2}", ratio),
            "memory above high watermark, yielding"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;

        sys.refresh_memory();
        let after = sys.used_memory();
        tracing::info!(
            task_id = %task_id,
            before_mb = used / (1024 * 1024),
            after_mb = after / (1024 * 1024),
            "memory after yield"
        );
    } else if ratio >= config.low_watermark {
        tracing::warn!(
            task_id = %task_id,
            used_mb = used / (1024 * 1024),
            ratio = format!("{:.2}", ratio),
            "memory above low watermark"
        );
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SamplerConfig {
        SamplerConfig {
            interval_ms: 10,
            high_watermark: 0.75,
            low_watermark: 0.60,
        }
    }

    #[tokio::test]
    async fn sampler_records_baseline_and_peak() {
        let sampler = MemorySampler::new(TaskId::generate(), &config());

        sampler.start().await;
        assert!(sampler.is_running());
        tokio::time::sleep(Duration::from_millis(50)).await;
        sampler.stop().await;
        assert!(!sampler.is_running());

        let stats = sampler.stats();
        assert!(stats.peak_bytes >= stats.start_bytes);
        assert_eq!(stats.increase_bytes, stats.peak_bytes - stats.start_bytes);
    }

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let sampler = MemorySampler::new(TaskId::generate(), &config());

        sampler.start().await;
        sampler.start().await;
        assert!(sampler.is_running());

        sampler.stop().await;
        sampler.stop().await;
        assert!(!sampler.is_running());
    }

    #[tokio::test]
    async fn stop_before_start_is_a_noop() {
        let sampler = MemorySampler::new(TaskId::generate(), &config());
        sampler.stop().await;

        let stats = sampler.stats();
        assert_eq!(stats.start_bytes, 0);
        assert_eq!(stats.increase_bytes, 0);
    }

    #[tokio::test]
    async fn stats_are_callable_while_running() {
        let sampler = MemorySampler::new(TaskId::generate(), &config());

        sampler.start().await;
        let stats = sampler.stats();
        assert!(stats.peak_bytes >= stats.start_bytes);
        sampler.stop().await;
    }

    #[tokio::test]
    async fn pressure_hook_never_panics() {
        check_memory_pressure(&TaskId::generate(), &config()).await;
    }

    #[test]
    fn memory_status_reads_host_memory() {
        let status = memory_status();

        assert!(status.total_bytes > 0);
        assert!(status.used_bytes <= status.total_bytes);
        assert!((0.0..=1.0).contains(&status.usage_ratio));
        assert!(status.timestamp > 0);
    }
}
