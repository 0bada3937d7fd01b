//! Sweep command implementation.
//!
//! Builds the host list, opens the ICMP socket and runs the scheduler.

use super::Cli;
use crate::error::CliResult;
use crate::hosts::{HostListBuilder, SystemInterfaces};
use crate::output;
use crate::scanner::{run_sweep, IcmpProber, Prober, SweepSummary};
use tracing::{debug, info};

impl Cli {
    /// Execute the sweep.
    ///
    /// Fails only before probing starts: bad settings, a malformed CIDR, or
    /// an ICMP socket that cannot be opened.
    pub async fn execute(&self) -> CliResult<SweepSummary> {
        let settings = self.settings()?;
        debug!(?settings, "resolved settings");

        let hosts = HostListBuilder::new()
            .with_max_hosts(settings.max_hosts)
            .build(&self.cidrs, &SystemInterfaces)?;

        if hosts.is_empty() {
            if self.cidrs.is_empty() && !self.quiet {
                output::print_warning("no non-loopback IPv4 interface found to sweep");
            }
            return Ok(SweepSummary::default());
        }
        info!(%hosts, "built host list");

        let prober = IcmpProber::new(settings.payload_size)?;
        if !prober.requires_privileges() {
            debug!("not running as root, using unprivileged ICMP sockets");
        }

        let mut config = settings.sweep_config();
        if self.verbose {
            config = config.with_progress();
        }

        let sink = output::sink_for(self.output);
        let summary = run_sweep(&prober, hosts, &config, sink.as_ref()).await;

        if self.verbose {
            output::print_summary(&summary);
        }

        Ok(summary)
    }
}
