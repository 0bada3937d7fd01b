//! # pingscan - A Fast ICMP Ping Sweeper
//!
//! pingscan finds live hosts on IPv4 subnets by sending one ICMP echo
//! request per address and printing each reply as it arrives.
//!
//! ## Features
//!
//! - **Flexible Targeting**: any number of CIDR ranges, or the subnets of
//!   the local interfaces when none are given
//! - **High Performance**: async probes over one shared ICMP socket with a
//!   configurable concurrency bound and optional rate limiting
//! - **Timeout Escalation**: a host that times out is retried once with a
//!   longer timeout before it is treated as unreachable
//! - **Streaming Output**: replies are printed in completion order, as plain
//!   text or JSON lines
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use pingscan::hosts::{HostListBuilder, SystemInterfaces};
//! use pingscan::output::PlainSink;
//! use pingscan::scanner::{run_sweep, IcmpProber, SweepConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cidrs = vec!["192.168.1.0/24".to_string()];
//!     let hosts = HostListBuilder::new().build(&cidrs, &SystemInterfaces)?;
//!     let prober = IcmpProber::new(56)?;
//!
//!     let summary = run_sweep(&prober, hosts, &SweepConfig::default(), &PlainSink::stdout()).await;
//!     println!("{} hosts alive", summary.alive);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - IPv4 address arithmetic and subnets
//! - [`hosts`] - Host-list construction from CIDRs or interfaces
//! - [`scanner`] - The `Prober` trait, the ICMP prober and the sweep scheduler
//! - [`config`] - Settings file and overrides
//! - [`output`] - Reply sinks and diagnostics
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod error;
pub mod hosts;
pub mod output;
pub mod scanner;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, HostListError, ProbeFailure};
pub use hosts::{HostList, HostListBuilder};
pub use scanner::{run_sweep, ProbeOutcome, Prober, Reply, SweepConfig, SweepSummary};
pub use types::{Address, AddressRange, Subnet};
