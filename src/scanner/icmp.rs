//! ICMP echo prober.
//!
//! Sends echo requests through one shared `surge_ping::Client` socket.
//! Every probe gets its own ICMP identifier, and the client demultiplexes
//! replies by `(address, identifier, sequence)`, so concurrent in-flight
//! probes never see each other's replies.
//!
//! # Privileges
//!
//! Running as root opens a raw ICMP socket. Otherwise an unprivileged
//! datagram ICMP socket is used, which on Linux requires the process group
//! to be allowed by `net.ipv4.ping_group_range`.

use crate::error::ProbeFailure;
use crate::scanner::traits::{ProbeOutcome, Prober};
use crate::types::Address;
use async_trait::async_trait;
use rand::Rng;
use socket2::Type;
use std::io;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;
use surge_ping::{Client, Config, PingIdentifier, PingSequence, SurgeError, ICMP};
use tracing::debug;

/// Default echo payload size, giving a 64 byte ICMP message.
pub const DEFAULT_PAYLOAD_SIZE: usize = 56;

/// ICMP echo prober backed by a shared socket.
pub struct IcmpProber {
    client: Client,
    payload: Vec<u8>,
    next_ident: AtomicU16,
    privileged: bool,
}

impl IcmpProber {
    /// Open the ICMP socket.
    ///
    /// # Arguments
    /// * `payload_size` - Number of payload bytes in each echo request
    ///
    /// # Errors
    /// Returns the socket error if neither a raw nor a datagram ICMP socket
    /// can be opened.
    pub fn new(payload_size: usize) -> io::Result<Self> {
        let privileged = is_root();
        let sock_type = if privileged { Type::RAW } else { Type::DGRAM };
        let config = Config::builder()
            .kind(ICMP::V4)
            .sock_type_hint(sock_type)
            .build();
        let client = Client::new(&config)?;

        debug!(privileged, payload_size, "opened ICMP socket");

        Ok(Self {
            client,
            payload: vec![0u8; payload_size],
            next_ident: AtomicU16::new(rand::thread_rng().gen()),
            privileged,
        })
    }

    /// Take the next identifier. Wraps after 65536 probes, long after the
    /// earlier holder of the same value has finished.
    fn next_identifier(&self) -> PingIdentifier {
        PingIdentifier(self.next_ident.fetch_add(1, Ordering::Relaxed))
    }
}

#[async_trait]
impl Prober for IcmpProber {
    fn requires_privileges(&self) -> bool {
        self.privileged
    }

    async fn probe(&self, host: Address, timeout: Duration) -> ProbeOutcome {
        let mut pinger = self
            .client
            .pinger(IpAddr::V4(host.into()), self.next_identifier())
            .await;
        pinger.timeout(timeout);

        match pinger.ping(PingSequence(0), &self.payload).await {
            Ok((_packet, round_trip)) => ProbeOutcome::Alive { host, round_trip },
            Err(SurgeError::Timeout { .. }) => ProbeOutcome::TimedOut { host },
            Err(e) => ProbeOutcome::ProbeError {
                host,
                cause: classify_error(e),
            },
        }
    }
}

/// Map a surge-ping error onto a probe failure.
fn classify_error(error: SurgeError) -> ProbeFailure {
    match error {
        SurgeError::IOError(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            ProbeFailure::PermissionDenied(e.to_string())
        }
        SurgeError::IOError(e) => ProbeFailure::Send(e.to_string()),
        other => ProbeFailure::UnexpectedReply(other.to_string()),
    }
}

/// Check if running with root/admin privileges.
pub fn is_root() -> bool {
    #[cfg(unix)]
    {
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}
