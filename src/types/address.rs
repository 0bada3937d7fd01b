//! IPv4 address arithmetic.
//!
//! `Address` is a `u32` newtype with a canonical dotted-quad text form.
//! `AddressRange` is a half-open `[first, last)` interval of addresses that
//! can be iterated as many times as needed without allocating.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::FusedIterator;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// An IPv4 address stored as a host-order `u32`.
///
/// Comparison and arithmetic are always unsigned, so ranges near
/// `128.0.0.0` never wrap into negative spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u32);

impl Address {
    /// Lowest address, `0.0.0.0`.
    pub const MIN: Address = Address(0);
    /// Highest address, `255.255.255.255`.
    pub const MAX: Address = Address(u32::MAX);

    /// Wrap a raw `u32`.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw `u32`.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// The four octets, most significant first.
    #[inline]
    pub const fn octets(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Add `n`, stopping at `255.255.255.255`.
    #[inline]
    pub const fn saturating_add(self, n: u32) -> Self {
        Self(self.0.saturating_add(n))
    }
}

/// Parse dotted-quad text into an [`Address`].
///
/// Between one and four components are accepted; missing trailing
/// components are zero, so `"10.0"` is `10.0.0.0`. Every component must be
/// made of ASCII digits only and be at most 255.
pub fn parse_address(text: &str) -> Result<Address, AddressError> {
    let invalid = || AddressError::InvalidAddress(text.to_string());

    if text.is_empty() {
        return Err(invalid());
    }

    let mut octets = [0u8; 4];
    let mut count = 0;
    for part in text.split('.') {
        if count == 4 {
            return Err(invalid());
        }
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        octets[count] = part.parse::<u8>().map_err(|_| invalid())?;
        count += 1;
    }

    Ok(Address(u32::from_be_bytes(octets)))
}

/// Format an [`Address`] with all four octets explicit.
pub fn format_address(address: Address) -> String {
    address.to_string()
}

/// Enumerate every address in `[first, last)` in ascending order.
///
/// Fails with [`AddressError::InvalidRange`] when `last < first`.
pub fn enumerate(first: Address, last: Address) -> Result<AddressRange, AddressError> {
    AddressRange::new(first, last)
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.octets();
        write!(f, "{}.{}.{}.{}", a, b, c, d)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_address(s)
    }
}

impl From<u32> for Address {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Address> for u32 {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl From<Ipv4Addr> for Address {
    fn from(ip: Ipv4Addr) -> Self {
        Self(u32::from(ip))
    }
}

impl From<Address> for Ipv4Addr {
    fn from(address: Address) -> Self {
        Ipv4Addr::from(address.0)
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_address(&s).map_err(serde::de::Error::custom)
    }
}

/// Error type for address parsing and range construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("invalid IPv4 address: {0:?}")]
    InvalidAddress(String),
    #[error("address range is negative: {first} > {last}")]
    InvalidRange { first: Address, last: Address },
}

/// A half-open interval `[first, last)` of addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    first: Address,
    last: Address,
}

impl AddressRange {
    /// Create a range, rejecting `last < first`.
    pub fn new(first: Address, last: Address) -> Result<Self, AddressError> {
        if last < first {
            Err(AddressError::InvalidRange { first, last })
        } else {
            Ok(Self { first, last })
        }
    }

    /// First address (inclusive).
    pub const fn first(&self) -> Address {
        self.first
    }

    /// End address (exclusive).
    pub const fn last(&self) -> Address {
        self.last
    }

    /// Number of addresses in the range.
    pub const fn len(&self) -> usize {
        (self.last.0 - self.first.0) as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.first.0 == self.last.0
    }

    /// Iterate over the range. Each call starts again from `first`.
    pub fn iter(&self) -> AddressIter {
        AddressIter {
            next: self.first.0,
            end: self.last.0,
        }
    }
}

impl IntoIterator for AddressRange {
    type Item = Address;
    type IntoIter = AddressIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &AddressRange {
    type Item = Address;
    type IntoIter = AddressIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.first, self.last)
    }
}

/// Lazy ascending iterator over an [`AddressRange`].
#[derive(Debug, Clone)]
pub struct AddressIter {
    next: u32,
    end: u32,
}

impl Iterator for AddressIter {
    type Item = Address;

    #[inline]
    fn next(&mut self) -> Option<Address> {
        if self.next < self.end {
            let current = self.next;
            self.next += 1;
            Some(Address(current))
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for AddressIter {
    fn next_back(&mut self) -> Option<Address> {
        if self.next < self.end {
            self.end -= 1;
            Some(Address(self.end))
        } else {
            None
        }
    }
}

impl ExactSizeIterator for AddressIter {}

impl FusedIterator for AddressIter {}
