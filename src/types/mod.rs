//! Core type definitions using newtype patterns for type safety.
//!
//! `Address` keeps IPv4 arithmetic unsigned, and `Subnet` owns the
//! host-range convention for CIDR blocks and interface netmasks.

mod address;
mod subnet;

pub use address::{
    enumerate, format_address, parse_address, Address, AddressError, AddressIter, AddressRange,
};
pub use subnet::Subnet;
