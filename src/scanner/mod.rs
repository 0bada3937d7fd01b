//! Scanner module - the sweep scheduler.
//!
//! Drives a [`Prober`] over a host list with bounded concurrency, retries a
//! timed-out host once with a longer timeout, and hands each reply to a
//! [`ReplySink`] the moment its probe completes.

pub mod claims;
pub mod icmp;
pub mod rate_limiter;
pub mod retry;
pub mod traits;

use crate::error::ProbeFailure;
use crate::hosts::HostList;
use crate::types::Address;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub use claims::{Claim, HostClaims};
pub use icmp::IcmpProber;
pub use rate_limiter::RateLimiter;
pub use retry::{Escalation, RetryState};
pub use traits::{display_millis, ProbeOutcome, Prober, Reply};

/// Default number of hosts probed at once.
pub const DEFAULT_CONCURRENCY: usize = 1000;

/// Default first-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// Default multiplier applied to the timeout on escalation.
pub const DEFAULT_ESCALATION_FACTOR: u32 = 2;

/// Receives replies as hosts are found alive.
pub trait ReplySink: Send + Sync {
    fn emit(&self, reply: &Reply);
}

/// Configuration for a sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Maximum number of hosts in flight.
    pub concurrency: usize,
    /// First-attempt timeout.
    pub timeout: Duration,
    /// Escalated timeout is `timeout * escalation_factor`.
    pub escalation_factor: u32,
    /// Probes per second, 0 for unlimited.
    pub rate_limit: u32,
    /// Draw a progress bar on stderr.
    pub progress: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            escalation_factor: DEFAULT_ESCALATION_FACTOR,
            rate_limit: 0,
            progress: false,
        }
    }
}

impl SweepConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_escalation_factor(mut self, factor: u32) -> Self {
        self.escalation_factor = factor;
        self
    }

    pub fn with_rate_limit(mut self, rate: u32) -> Self {
        self.rate_limit = rate;
        self
    }

    pub fn with_progress(mut self) -> Self {
        self.progress = true;
        self
    }

    /// Timeout used for the single retry.
    pub fn escalated_timeout(&self) -> Duration {
        self.timeout.saturating_mul(self.escalation_factor)
    }
}

/// Terminal state of one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostResult {
    /// The host answered and was reported.
    Reported(Reply),
    /// No answer, even after escalation.
    Unreachable { host: Address },
    /// The probe failed; the host was dropped silently.
    Failed { host: Address, cause: ProbeFailure },
}

/// Totals for a completed sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub hosts: usize,
    pub alive: usize,
    pub unreachable: usize,
    pub errors: usize,
    pub escalated: usize,
    pub duration_ms: u64,
}

impl SweepSummary {
    fn record(&mut self, result: &HostResult) {
        match result {
            HostResult::Reported(_) => self.alive += 1,
            HostResult::Unreachable { .. } => self.unreachable += 1,
            HostResult::Failed { .. } => self.errors += 1,
        }
    }
}

/// Sweep every host in `hosts`, emitting replies in completion order.
///
/// Hosts are admitted in list order, at most `config.concurrency` at a time.
/// A host stays in flight through its retry, so the bound covers escalated
/// probes too. An address listed more than once is probed by one task at a
/// time, each occurrence waiting for the one before it. The sweep always
/// runs to completion.
pub async fn run_sweep<P, S>(
    prober: &P,
    hosts: HostList,
    config: &SweepConfig,
    sink: &S,
) -> SweepSummary
where
    P: Prober + ?Sized,
    S: ReplySink + ?Sized,
{
    let start = Instant::now();
    let total = hosts.len();
    let retry = RetryState::new();
    let claims = HostClaims::new();
    let limiter = RateLimiter::new(config.rate_limit);
    let progress = config.progress.then(|| progress_bar(total));

    info!(
        hosts = total,
        concurrency = config.concurrency,
        timeout_ms = config.timeout.as_millis() as u64,
        "starting sweep"
    );

    let mut summary = SweepSummary {
        hosts: total,
        ..SweepSummary::default()
    };

    let mut results = stream::iter(hosts)
        .map(|host| {
            let claim = claims.claim(host);
            sweep_host(prober, claim, config, &retry, &claims, limiter.as_ref())
        })
        .buffer_unordered(config.concurrency.max(1));

    while let Some(result) = results.next().await {
        if let HostResult::Reported(reply) = &result {
            match &progress {
                Some(pb) => pb.suspend(|| sink.emit(reply)),
                None => sink.emit(reply),
            }
        }
        if let Some(pb) = &progress {
            pb.inc(1);
        }
        summary.record(&result);
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    summary.escalated = retry.escalated_count();
    summary.duration_ms = start.elapsed().as_millis() as u64;

    info!(
        alive = summary.alive,
        unreachable = summary.unreachable,
        errors = summary.errors,
        escalated = summary.escalated,
        duration_ms = summary.duration_ms,
        "sweep complete"
    );

    summary
}

/// Carry one host from pending to a terminal state while holding its claim.
async fn sweep_host<P>(
    prober: &P,
    mut claim: Claim,
    config: &SweepConfig,
    retry: &RetryState,
    claims: &HostClaims,
    limiter: Option<&RateLimiter>,
) -> HostResult
where
    P: Prober + ?Sized,
{
    claim.ready().await;
    let result = probe_host(prober, claim.host(), config, retry, limiter).await;
    claims.release(claim);
    result
}

async fn probe_host<P>(
    prober: &P,
    host: Address,
    config: &SweepConfig,
    retry: &RetryState,
    limiter: Option<&RateLimiter>,
) -> HostResult
where
    P: Prober + ?Sized,
{
    let mut timeout = config.timeout;
    let mut attempt = 1;

    loop {
        if let Some(limiter) = limiter {
            limiter.wait().await;
        }

        match prober.probe(host, timeout).await {
            ProbeOutcome::Alive { round_trip, .. } => {
                return HostResult::Reported(Reply::new(host, round_trip, attempt));
            }
            ProbeOutcome::TimedOut { .. } => {
                if !retry.escalate(host) {
                    return HostResult::Unreachable { host };
                }
                timeout = config.escalated_timeout();
                attempt += 1;
                debug!(%host, timeout_ms = timeout.as_millis() as u64, "timed out, escalating");
            }
            ProbeOutcome::ProbeError { cause, .. } => {
                debug!(%host, attempt, error = %cause, "probe failed");
                return HostResult::Failed { host, cause };
            }
        }
    }
}

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// What a scripted host does on each attempt.
    #[derive(Clone, Copy)]
    enum Step {
        Reply(u64),
        Silent,
        Fail,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Probe { host: String, timeout_ms: u64 },
        Emit(String),
    }

    type Log = Arc<Mutex<Vec<Event>>>;

    struct ScriptedProber {
        script: HashMap<Address, Vec<Step>>,
        attempts: Mutex<HashMap<Address, usize>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        per_host: Mutex<HashMap<Address, usize>>,
        max_per_host: AtomicUsize,
        log: Log,
    }

    impl ScriptedProber {
        fn new(script: &[(&str, Vec<Step>)], log: Log) -> Self {
            Self {
                script: script
                    .iter()
                    .map(|(h, steps)| (h.parse().unwrap(), steps.clone()))
                    .collect(),
                attempts: Mutex::new(HashMap::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                per_host: Mutex::new(HashMap::new()),
                max_per_host: AtomicUsize::new(0),
                log,
            }
        }

        fn attempts(&self, host: &str) -> usize {
            let host: Address = host.parse().unwrap();
            self.attempts.lock().unwrap().get(&host).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        fn requires_privileges(&self) -> bool {
            false
        }

        async fn probe(&self, host: Address, timeout: Duration) -> ProbeOutcome {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            {
                let mut per_host = self.per_host.lock().unwrap();
                let n = per_host.entry(host).or_insert(0);
                *n += 1;
                self.max_per_host.fetch_max(*n, Ordering::SeqCst);
            }

            let attempt = {
                let mut attempts = self.attempts.lock().unwrap();
                let n = attempts.entry(host).or_insert(0);
                *n += 1;
                *n - 1
            };
            self.log.lock().unwrap().push(Event::Probe {
                host: host.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });

            let step = self
                .script
                .get(&host)
                .and_then(|steps| steps.get(attempt).copied())
                .unwrap_or(Step::Silent);

            let outcome = match step {
                Step::Reply(ms) => {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    ProbeOutcome::Alive {
                        host,
                        round_trip: Duration::from_millis(ms),
                    }
                }
                Step::Silent => {
                    tokio::time::sleep(timeout).await;
                    ProbeOutcome::TimedOut { host }
                }
                Step::Fail => ProbeOutcome::ProbeError {
                    host,
                    cause: ProbeFailure::Send("unreachable".to_string()),
                },
            };

            *self.per_host.lock().unwrap().get_mut(&host).unwrap() -= 1;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            outcome
        }
    }

    struct LogSink(Log);

    impl ReplySink for LogSink {
        fn emit(&self, reply: &Reply) {
            self.0.lock().unwrap().push(Event::Emit(reply.to_string()));
        }
    }

    fn host_list(hosts: &[&str]) -> HostList {
        hosts
            .iter()
            .map(|h| h.parse::<Address>().unwrap())
            .collect::<Vec<_>>()
            .into()
    }

    fn emitted(log: &Log) -> Vec<String> {
        log.lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                Event::Emit(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_immediate_silent_and_escalated_hosts() {
        let log: Log = Arc::default();
        let prober = ScriptedProber::new(
            &[
                ("10.0.0.1", vec![Step::Reply(0)]),
                ("10.0.0.2", vec![Step::Silent, Step::Silent]),
                ("10.0.0.3", vec![Step::Silent, Step::Reply(3)]),
            ],
            log.clone(),
        );
        let config = SweepConfig::new().with_timeout(Duration::from_millis(20));

        let summary = run_sweep(
            &prober,
            host_list(&["10.0.0.1", "10.0.0.2", "10.0.0.3"]),
            &config,
            &LogSink(log.clone()),
        )
        .await;

        let mut lines = emitted(&log);
        lines.sort();
        assert_eq!(
            lines,
            [
                "Reply from 10.0.0.1: time=1ms",
                "Reply from 10.0.0.3: time=3ms"
            ]
        );

        // C is reported only after its escalated probe was sent.
        let events = log.lock().unwrap().clone();
        let second_probe = events
            .iter()
            .position(|e| {
                *e == Event::Probe {
                    host: "10.0.0.3".to_string(),
                    timeout_ms: 40,
                }
            })
            .expect("escalated probe for 10.0.0.3");
        let reply = events
            .iter()
            .position(|e| *e == Event::Emit("Reply from 10.0.0.3: time=3ms".to_string()))
            .unwrap();
        assert!(second_probe < reply);

        assert_eq!(prober.attempts("10.0.0.1"), 1);
        assert_eq!(prober.attempts("10.0.0.2"), 2);
        assert_eq!(prober.attempts("10.0.0.3"), 2);

        assert_eq!(summary.hosts, 3);
        assert_eq!(summary.alive, 2);
        assert_eq!(summary.unreachable, 1);
        assert_eq!(summary.escalated, 2);
    }

    #[tokio::test]
    async fn test_probe_error_is_not_retried() {
        let log: Log = Arc::default();
        let prober = ScriptedProber::new(&[("10.0.0.9", vec![Step::Fail, Step::Reply(1)])], log.clone());

        let summary = run_sweep(
            &prober,
            host_list(&["10.0.0.9"]),
            &SweepConfig::new().with_timeout(Duration::from_millis(10)),
            &LogSink(log.clone()),
        )
        .await;

        assert!(emitted(&log).is_empty());
        assert_eq!(prober.attempts("10.0.0.9"), 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.escalated, 0);
    }

    #[tokio::test]
    async fn test_error_after_escalation_is_silent() {
        let log: Log = Arc::default();
        let prober = ScriptedProber::new(&[("10.0.0.4", vec![Step::Silent, Step::Fail])], log.clone());

        let summary = run_sweep(
            &prober,
            host_list(&["10.0.0.4"]),
            &SweepConfig::new().with_timeout(Duration::from_millis(5)),
            &LogSink(log.clone()),
        )
        .await;

        assert!(emitted(&log).is_empty());
        assert_eq!(prober.attempts("10.0.0.4"), 2);
        assert_eq!(summary.errors, 1);
    }

    #[tokio::test]
    async fn test_concurrency_bound() {
        let log: Log = Arc::default();
        let hosts: Vec<String> = (1..=40).map(|i| format!("10.1.0.{}", i)).collect();
        let script: Vec<(&str, Vec<Step>)> = hosts
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let steps = if i % 3 == 0 {
                    vec![Step::Silent, Step::Reply(2)]
                } else {
                    vec![Step::Reply(5)]
                };
                (h.as_str(), steps)
            })
            .collect();
        let prober = ScriptedProber::new(&script, log.clone());
        let host_refs: Vec<&str> = hosts.iter().map(String::as_str).collect();

        let summary = run_sweep(
            &prober,
            host_list(&host_refs),
            &SweepConfig::new()
                .with_concurrency(4)
                .with_timeout(Duration::from_millis(5)),
            &LogSink(log.clone()),
        )
        .await;

        assert!(prober.max_in_flight.load(Ordering::SeqCst) <= 4);
        assert_eq!(prober.max_in_flight.load(Ordering::SeqCst), 4);
        assert_eq!(summary.alive, 40);
        assert_eq!(emitted(&log).len(), 40);
    }

    #[tokio::test]
    async fn test_repeated_host_is_owned_by_one_task() {
        let log: Log = Arc::default();
        let prober = ScriptedProber::new(
            &[
                ("10.0.0.1", vec![Step::Reply(5), Step::Reply(5)]),
                ("10.0.0.2", vec![Step::Silent, Step::Reply(2), Step::Silent]),
            ],
            log.clone(),
        );

        let summary = run_sweep(
            &prober,
            host_list(&["10.0.0.1", "10.0.0.2", "10.0.0.1", "10.0.0.2"]),
            &SweepConfig::new()
                .with_concurrency(4)
                .with_timeout(Duration::from_millis(10)),
            &LogSink(log.clone()),
        )
        .await;

        assert_eq!(prober.max_per_host.load(Ordering::SeqCst), 1);
        assert_eq!(prober.attempts("10.0.0.1"), 2);
        // First occurrence escalates and answers; the second times out once
        // and, already escalated, is terminal.
        assert_eq!(prober.attempts("10.0.0.2"), 3);

        let mut lines = emitted(&log);
        lines.sort();
        assert_eq!(
            lines,
            [
                "Reply from 10.0.0.1: time=5ms",
                "Reply from 10.0.0.1: time=5ms",
                "Reply from 10.0.0.2: time=2ms"
            ]
        );
        assert_eq!(summary.hosts, 4);
        assert_eq!(summary.alive, 3);
        assert_eq!(summary.unreachable, 1);
        assert_eq!(summary.escalated, 1);
    }

    #[tokio::test]
    async fn test_admission_follows_list_order() {
        let log: Log = Arc::default();
        let prober = ScriptedProber::new(
            &[
                ("10.2.0.1", vec![Step::Reply(1)]),
                ("10.2.0.2", vec![Step::Reply(1)]),
                ("10.2.0.3", vec![Step::Reply(1)]),
            ],
            log.clone(),
        );

        run_sweep(
            &prober,
            host_list(&["10.2.0.1", "10.2.0.2", "10.2.0.3"]),
            &SweepConfig::new().with_concurrency(1),
            &LogSink(log.clone()),
        )
        .await;

        let probed: Vec<String> = log
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                Event::Probe { host, .. } => Some(host.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(probed, ["10.2.0.1", "10.2.0.2", "10.2.0.3"]);
    }

    #[tokio::test]
    async fn test_empty_host_list() {
        let log: Log = Arc::default();
        let prober = ScriptedProber::new(&[], log.clone());

        let summary = run_sweep(
            &prober,
            HostList::default(),
            &SweepConfig::new(),
            &LogSink(log.clone()),
        )
        .await;

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(summary.hosts, 0);
        assert_eq!(summary.alive, 0);
        assert_eq!(summary.unreachable + summary.errors + summary.escalated, 0);
    }

    #[tokio::test]
    async fn test_rate_limited_sweep_completes() {
        let log: Log = Arc::default();
        let prober = ScriptedProber::new(&[("10.3.0.1", vec![Step::Reply(1)])], log.clone());

        let summary = run_sweep(
            &prober,
            host_list(&["10.3.0.1"]),
            &SweepConfig::new().with_rate_limit(1000),
            &LogSink(log.clone()),
        )
        .await;

        assert_eq!(summary.alive, 1);
    }

    #[test]
    fn test_escalated_timeout() {
        let config = SweepConfig::new().with_timeout(Duration::from_millis(500));
        assert_eq!(config.escalated_timeout(), Duration::from_millis(1000));

        let config = config.with_escalation_factor(3);
        assert_eq!(config.escalated_timeout(), Duration::from_millis(1500));
    }
}
