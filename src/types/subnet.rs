//! Subnets derived from CIDR text or an `(address, netmask)` pair.
//!
//! A `Subnet` exists only long enough to produce its usable host range.

use super::address::{parse_address, Address, AddressRange};
use crate::error::{HostListError, HostListResult};
use ipnetwork::Ipv4Network;
use std::fmt;
use std::net::Ipv4Addr;

/// An IPv4 network with a prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subnet {
    network: Ipv4Network,
}

impl Subnet {
    /// Parse `address/prefix` notation.
    ///
    /// The address part is parsed permissively (`"10.0/16"` is
    /// `10.0.0.0/16`); the prefix must be a decimal integer in `0..=32`.
    pub fn from_cidr(raw: &str) -> HostListResult<Self> {
        let invalid = || HostListError::InvalidCidr {
            raw: raw.to_string(),
        };

        let (addr_part, prefix_part) = raw.split_once('/').ok_or_else(invalid)?;
        let address = parse_address(addr_part).map_err(|_| invalid())?;

        if prefix_part.is_empty() || !prefix_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let prefix: u8 = prefix_part.parse().map_err(|_| invalid())?;

        let network = Ipv4Network::new(address.into(), prefix).map_err(|_| invalid())?;
        Ok(Self { network })
    }

    /// Build a subnet from an interface address and its netmask.
    pub fn from_netmask(address: Ipv4Addr, netmask: Ipv4Addr) -> HostListResult<Self> {
        let invalid = || HostListError::InvalidCidr {
            raw: format!("{}/{}", address, netmask),
        };

        let prefix = ipnetwork::ipv4_mask_to_prefix(netmask).map_err(|_| invalid())?;
        let network = Ipv4Network::new(address, prefix).map_err(|_| invalid())?;
        Ok(Self { network })
    }

    /// Prefix length.
    pub fn prefix(&self) -> u8 {
        self.network.prefix()
    }

    /// Network address (all host bits zero).
    pub fn network_address(&self) -> Address {
        self.network.network().into()
    }

    /// Broadcast address (all host bits one).
    pub fn broadcast_address(&self) -> Address {
        self.network.broadcast().into()
    }

    /// The usable host range.
    ///
    /// Up to /30 the network and broadcast addresses are excluded. A /31
    /// yields both of its addresses and a /32 its single address. The
    /// exclusive end saturates at `255.255.255.255`.
    pub fn host_range(&self) -> HostListResult<AddressRange> {
        let network = self.network_address();
        let broadcast = self.broadcast_address();

        let (first, last) = if self.prefix() <= 30 {
            (network.saturating_add(1), broadcast)
        } else {
            (network, broadcast.saturating_add(1))
        };

        Ok(AddressRange::new(first, last)?)
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network_address(), self.prefix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(cidr: &str) -> Vec<String> {
        Subnet::from_cidr(cidr)
            .unwrap()
            .host_range()
            .unwrap()
            .iter()
            .map(|a| a.to_string())
            .collect()
    }

    #[test]
    fn test_slash_30_excludes_network_and_broadcast() {
        assert_eq!(hosts("10.0.0.0/30"), ["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn test_slash_24_host_count() {
        let range = Subnet::from_cidr("192.168.1.0/24")
            .unwrap()
            .host_range()
            .unwrap();
        assert_eq!(range.len(), 254);
        assert_eq!(range.first().to_string(), "192.168.1.1");
        assert_eq!(range.last().to_string(), "192.168.1.255");
    }

    #[test]
    fn test_host_bits_are_masked() {
        let subnet = Subnet::from_cidr("192.168.1.77/24").unwrap();
        assert_eq!(subnet.to_string(), "192.168.1.0/24");
    }

    #[test]
    fn test_point_to_point_and_single_host() {
        assert_eq!(hosts("10.0.0.4/31"), ["10.0.0.4", "10.0.0.5"]);
        assert_eq!(hosts("10.0.0.9/32"), ["10.0.0.9"]);
    }

    #[test]
    fn test_short_address_form() {
        assert_eq!(
            Subnet::from_cidr("10.0/16").unwrap().to_string(),
            "10.0.0.0/16"
        );
    }

    #[test]
    fn test_malformed_cidr() {
        for bad in ["10.0.0.0/99", "10.0.0.0", "10.0.0.0/", "10.0.0.0/a", "300.0.0.0/8", "/24", "10.0.0.0/24/1"] {
            match Subnet::from_cidr(bad) {
                Err(HostListError::InvalidCidr { raw }) => assert_eq!(raw, bad),
                other => panic!("{:?} gave {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_from_netmask() {
        let subnet = Subnet::from_netmask(
            Ipv4Addr::new(192, 168, 7, 42),
            Ipv4Addr::new(255, 255, 255, 0),
        )
        .unwrap();
        assert_eq!(subnet.to_string(), "192.168.7.0/24");
        assert_eq!(subnet.host_range().unwrap().len(), 254);
    }

    #[test]
    fn test_top_of_address_space() {
        let range = Subnet::from_cidr("255.255.255.254/31")
            .unwrap()
            .host_range()
            .unwrap();
        assert_eq!(range.first().to_string(), "255.255.255.254");
        assert_eq!(range.len(), 1);

        let range = Subnet::from_cidr("0.0.0.0/0").unwrap().host_range().unwrap();
        assert_eq!(range.len(), u32::MAX as usize - 1);
    }

    #[test]
    fn test_from_netmask_rejects_non_contiguous() {
        let result = Subnet::from_netmask(
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(255, 0, 255, 0),
        );
        assert!(matches!(result, Err(HostListError::InvalidCidr { .. })));
    }
}
