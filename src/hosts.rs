//! Host-list construction.
//!
//! Turns the configured CIDR blocks, or the machine's own non-loopback IPv4
//! interfaces when none are configured, into one flat ordered list of
//! target addresses.

use crate::error::{HostListError, HostListResult};
use crate::types::{Address, AddressRange, Subnet};
use std::collections::HashSet;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use tracing::{debug, warn};

/// One address assigned to a network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddress {
    /// Interface name, used to group addresses.
    pub name: String,
    pub address: IpAddr,
    pub netmask: IpAddr,
    /// Loopback and other host-internal interfaces.
    pub internal: bool,
}

impl InterfaceAddress {
    /// The IPv4 address and netmask, if this entry is a usable IPv4 one.
    fn external_ipv4(&self) -> Option<(Ipv4Addr, Ipv4Addr)> {
        if self.internal {
            return None;
        }
        match (self.address, self.netmask) {
            (IpAddr::V4(address), IpAddr::V4(netmask)) => Some((address, netmask)),
            _ => None,
        }
    }
}

/// Source of the machine's interface addresses.
pub trait InterfaceSource {
    fn interfaces(&self) -> Vec<InterfaceAddress>;
}

/// Interfaces reported by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn interfaces(&self) -> Vec<InterfaceAddress> {
        pnet::datalink::interfaces()
            .into_iter()
            .flat_map(|iface| {
                let internal = iface.is_loopback();
                let name = iface.name.clone();
                iface.ips.into_iter().map(move |net| InterfaceAddress {
                    name: name.clone(),
                    address: net.ip(),
                    netmask: net.mask(),
                    internal,
                })
            })
            .collect()
    }
}

/// An immutable, ordered list of hosts to probe.
///
/// Overlapping input ranges are not deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostList {
    hosts: Vec<Address>,
}

impl HostList {
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Address> {
        self.hosts.iter()
    }

    /// Host addresses as dotted-quad text.
    pub fn to_strings(&self) -> Vec<String> {
        self.hosts.iter().map(Address::to_string).collect()
    }
}

impl From<Vec<Address>> for HostList {
    fn from(hosts: Vec<Address>) -> Self {
        Self { hosts }
    }
}

impl IntoIterator for HostList {
    type Item = Address;
    type IntoIter = std::vec::IntoIter<Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.hosts.into_iter()
    }
}

impl fmt::Display for HostList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} hosts", self.hosts.len())
    }
}

/// Builds a [`HostList`] from CIDRs or local interfaces.
///
/// Subnets of any size are expanded unless a host limit is set.
#[derive(Debug, Clone, Default)]
pub struct HostListBuilder {
    max_hosts: usize,
}

impl HostListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit how many hosts a single subnet may expand to. 0 disables it.
    pub fn with_max_hosts(mut self, max_hosts: usize) -> Self {
        self.max_hosts = max_hosts;
        self
    }

    /// Build from CIDRs, falling back to interface discovery when the list
    /// is empty.
    pub fn build<S: InterfaceSource + ?Sized>(
        &self,
        cidrs: &[String],
        interfaces: &S,
    ) -> HostListResult<HostList> {
        if cidrs.is_empty() {
            Ok(self.discover_interfaces(interfaces))
        } else {
            self.expand_cidrs(cidrs)
        }
    }

    /// Expand each CIDR in order. The first malformed one fails the build.
    pub fn expand_cidrs(&self, cidrs: &[String]) -> HostListResult<HostList> {
        let ranges = cidrs
            .iter()
            .map(|raw| {
                let subnet = Subnet::from_cidr(raw)?;
                let range = subnet.host_range()?;
                self.check_size(raw, &range)?;
                debug!(%subnet, hosts = range.len(), "expanding subnet");
                Ok(range)
            })
            .collect::<HostListResult<Vec<AddressRange>>>()?;

        let total = ranges.iter().map(AddressRange::len).sum();
        let mut hosts = Vec::with_capacity(total);
        for range in ranges {
            hosts.extend(range);
        }

        Ok(HostList { hosts })
    }

    /// Expand the first external IPv4 address of every interface.
    pub fn discover_interfaces<S: InterfaceSource + ?Sized>(&self, source: &S) -> HostList {
        let mut seen = HashSet::new();
        let mut hosts = Vec::new();

        for entry in source.interfaces() {
            if seen.contains(&entry.name) {
                continue;
            }
            let Some((address, netmask)) = entry.external_ipv4() else {
                continue;
            };
            seen.insert(entry.name.clone());

            match self.interface_range(address, netmask) {
                Ok(range) => {
                    debug!(interface = %entry.name, hosts = range.len(), "discovered subnet");
                    hosts.extend(range);
                }
                Err(e) => warn!(interface = %entry.name, error = %e, "skipping interface"),
            }
        }

        HostList { hosts }
    }

    fn interface_range(&self, address: Ipv4Addr, netmask: Ipv4Addr) -> HostListResult<AddressRange> {
        let subnet = Subnet::from_netmask(address, netmask)?;
        let range = subnet.host_range()?;
        self.check_size(&subnet.to_string(), &range)?;
        Ok(range)
    }

    fn check_size(&self, raw: &str, range: &AddressRange) -> HostListResult<()> {
        let count = range.len();
        if self.max_hosts != 0 && count > self.max_hosts {
            return Err(HostListError::TooManyHosts {
                raw: raw.to_string(),
                count,
                max: self.max_hosts,
            });
        }
        Ok(())
    }
}
