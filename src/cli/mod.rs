//! Command-line interface definitions for pingscan.
//!
//! Uses `clap` derive macros for declarative argument parsing. The parsed
//! arguments are folded into an immutable [`AppSettings`] once, before any
//! host list is built.

mod sweep;

use crate::config::{AppSettings, Overrides};
use crate::error::CliResult;
use clap::Parser;
use std::path::PathBuf;

/// pingscan - a fast ICMP ping sweeper.
///
/// Sends one echo request to every host in the given CIDR ranges and prints
/// a line for each host that answers. With no ranges, the subnets of the
/// local non-loopback IPv4 interfaces are swept.
#[derive(Parser, Debug)]
#[command(name = "pingscan")]
#[command(author = "HueCodes <huecodes@proton.me>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A fast ICMP ping sweeper", long_about = None)]
pub struct Cli {
    /// CIDR ranges to sweep, in order (e.g. 192.168.1.0/24)
    #[arg(value_name = "CIDR")]
    pub cidrs: Vec<String>,

    /// Maximum number of hosts probed at once
    #[arg(short = 'c', long, env = "PINGSCAN_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// First-attempt timeout in milliseconds (doubled on the retry)
    #[arg(short = 't', long, value_name = "MS", env = "PINGSCAN_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Multiplier applied to the timeout when a host is retried
    #[arg(long, value_name = "FACTOR")]
    pub escalation: Option<u32>,

    /// Rate limit in probes per second (0 = unlimited)
    #[arg(short = 'r', long = "rate", value_name = "PPS")]
    pub rate_limit: Option<u32>,

    /// Echo payload size in bytes
    #[arg(short = 's', long = "size", value_name = "BYTES")]
    pub payload_size: Option<usize>,

    /// Largest subnet to expand (0 = no limit)
    #[arg(long, value_name = "N")]
    pub max_hosts: Option<usize>,

    /// Output format for replies
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,

    /// Show progress, debug logs and a summary on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print replies and fatal errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to a settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Settings file values with flags and environment applied on top.
    pub fn settings(&self) -> CliResult<AppSettings> {
        let base = match &self.config {
            Some(path) => AppSettings::load_from(path)?,
            None => AppSettings::load()?,
        };

        Ok(base.with_overrides(&self.overrides())?)
    }

    fn overrides(&self) -> Overrides {
        Overrides {
            concurrency: self.concurrency,
            timeout_ms: self.timeout,
            escalation_factor: self.escalation,
            rate_limit: self.rate_limit,
            payload_size: self.payload_size,
            max_hosts: self.max_hosts,
        }
    }
}

/// Output format for replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// `Reply from <host>: time=<N>ms`
    #[default]
    Plain,
    /// One JSON object per line
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
        }
    }
}
