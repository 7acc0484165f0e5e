//! Background memory/CPU sampler.
//!
//! A thread wakes every `interval`, reads the process' resident set size and
//! CPU time, and keeps the peak. Readings come from `/proc/self` and are only
//! available on Linux; elsewhere the tracker reports wall time only.

use std::fs;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::monitor::ResourceMonitor;

/// Default polling interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Linux `USER_HZ`; `/proc/<pid>/stat` reports CPU time in these ticks.
///
/// 100 on mainstream kernels. Where `USER_HZ` differs, reported CPU seconds
/// are approximate.
const CLOCK_TICKS_PER_SEC: f64 = 100.0;

/// One reading of process usage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Usage {
    pub rss_bytes: u64,
    pub cpu_secs: f64,
}

/// Summary produced when the tracker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UsageSummary {
    pub samples: usize,
    pub peak_rss_bytes: u64,
    pub cpu_secs: f64,
}

impl UsageSummary {
    fn record(&mut self, usage: Usage) {
        self.samples += 1;
        self.peak_rss_bytes = self.peak_rss_bytes.max(usage.rss_bytes);
        self.cpu_secs = self.cpu_secs.max(usage.cpu_secs);
    }
}

struct Running {
    stop_tx: Sender<()>,
    handle: JoinHandle<UsageSummary>,
    started: Instant,
}

pub struct ResourceTracker {
    interval: Duration,
    running: Option<Running>,
    last_summary: Option<UsageSummary>,
}

impl ResourceTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            running: None,
            last_summary: None,
        }
    }

    /// Summary of the most recent completed monitoring period.
    pub fn last_summary(&self) -> Option<UsageSummary> {
        self.last_summary
    }
}

impl Default for ResourceTracker {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl ResourceMonitor for ResourceTracker {
    fn start(&mut self) {
        if self.running.is_some() {
            return;
        }
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let interval = self.interval;

        let spawned = thread::Builder::new()
            .name("resource-tracker".to_string())
            .spawn(move || {
                let mut summary = UsageSummary::default();
                loop {
                    if let Some(usage) = read_usage() {
                        debug!(
                            rss_mb = usage.rss_bytes as f64 / 1_048_576.0,
                            cpu_secs = usage.cpu_secs,
                            "resource usage"
                        );
                        summary.record(usage);
                    }
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                // Final reading so short runs still report something.
                if let Some(usage) = read_usage() {
                    summary.record(usage);
                }
                summary
            });

        match spawned {
            Ok(handle) => {
                self.running = Some(Running {
                    stop_tx,
                    handle,
                    started: Instant::now(),
                });
            }
            // Monitoring never blocks the run.
            Err(e) => warn!(error = %e, "failed to start resource tracker"),
        }
    }

    fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        let _ = running.stop_tx.send(());
        let elapsed = running.started.elapsed();

        match running.handle.join() {
            Ok(summary) => {
                info!(
                    elapsed_secs = elapsed.as_secs_f64(),
                    peak_rss_mb = summary.peak_rss_bytes as f64 / 1_048_576.0,
                    cpu_secs = summary.cpu_secs,
                    samples = summary.samples,
                    "resource usage summary"
                );
                self.last_summary = Some(summary);
            }
            Err(_) => warn!("resource tracker thread panicked"),
        }
    }
}

impl Drop for ResourceTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_usage() -> Option<Usage> {
    let status = fs::read_to_string("/proc/self/status").ok()?;
    let rss_bytes = parse_vm_rss_kb(&status)? * 1024;
    let cpu_secs = fs::read_to_string("/proc/self/stat")
        .ok()
        .and_then(|s| parse_cpu_ticks(&s))
        .map(|ticks| ticks as f64 / CLOCK_TICKS_PER_SEC)
        .unwrap_or(0.0);
    Some(Usage { rss_bytes, cpu_secs })
}

fn parse_vm_rss_kb(status: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse().ok())
}

/// `utime + stime` from `/proc/<pid>/stat`.
fn parse_cpu_ticks(stat: &str) -> Option<u64> {
    // The command name is parenthesised and may contain spaces.
    let after_comm = &stat[stat.rfind(')')? + 1..];
    let fields: Vec<&str> = after_comm.split_whitespace().collect();
    // Fields 14 and 15 overall; 11 and 12 once pid and comm are dropped (0-based).
    let utime: u64 = fields.get(11)?.parse().ok()?;
    let stime: u64 = fields.get(12)?.parse().ok()?;
    Some(utime + stime)
}
