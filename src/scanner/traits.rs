//! Prober trait abstraction.
//!
//! Defines the probe outcome types and the interface every probing
//! mechanism implements, so the scheduler can be driven by the ICMP prober
//! in production and by scripted probers in tests.

use crate::error::ProbeFailure;
use crate::types::Address;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Result of a single echo probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The host answered within the timeout.
    Alive { host: Address, round_trip: Duration },
    /// No reply arrived within the timeout.
    TimedOut { host: Address },
    /// The probe failed for another reason.
    ProbeError { host: Address, cause: ProbeFailure },
}

impl ProbeOutcome {
    /// The probed host.
    pub fn host(&self) -> Address {
        match self {
            Self::Alive { host, .. } | Self::TimedOut { host } | Self::ProbeError { host, .. } => {
                *host
            }
        }
    }

    pub fn is_alive(&self) -> bool {
        matches!(self, Self::Alive { .. })
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alive { host, round_trip } => {
                write!(f, "{} alive ({}ms)", host, display_millis(*round_trip))
            }
            Self::TimedOut { host } => write!(f, "{} timed out", host),
            Self::ProbeError { host, cause } => write!(f, "{} failed: {}", host, cause),
        }
    }
}

/// Whole milliseconds for display, never less than 1.
pub fn display_millis(round_trip: Duration) -> u64 {
    (round_trip.as_millis() as u64).max(1)
}

/// A host that answered, as handed to the output sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub host: Address,
    /// Round-trip time in whole milliseconds, at least 1.
    pub time_ms: u64,
    /// 1 for the first probe, 2 for the escalated one.
    pub attempt: u8,
}

impl Reply {
    pub fn new(host: Address, round_trip: Duration, attempt: u8) -> Self {
        Self {
            host,
            time_ms: display_millis(round_trip),
            attempt,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reply from {}: time={}ms", self.host, self.time_ms)
    }
}

/// Trait for echo probe implementations.
///
/// Implementations must tolerate many concurrent `probe` calls against
/// different hosts, and must never deliver one call's reply to another.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Check if this prober needs elevated privileges.
    fn requires_privileges(&self) -> bool;

    /// Send one echo request to `host` and wait up to `timeout` for the reply.
    async fn probe(&self, host: Address, timeout: Duration) -> ProbeOutcome;
}
