//! # Local Address Model
//!
//! The address a host announces to its clients. Only unicast values are
//! representable. IPv4-mapped IPv6 addresses are stored in their IPv4 form.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Loopback value announced when no outbound route can be determined.
pub const FALLBACK_ADDRESS: Ipv4Addr = Ipv4Addr::LOCALHOST;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("'{0}' is not an IP address")]
    Syntax(String),
    #[error("{0} is not a unicast address")]
    NotUnicast(IpAddr),
}

/// A validated unicast IP address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(IpAddr);

impl Address {
    pub fn new(ip: IpAddr) -> Result<Self, AddressError> {
        let ip = ip.to_canonical();
        let unicast = match ip {
            IpAddr::V4(v4) => !v4.is_unspecified() && !v4.is_multicast() && !v4.is_broadcast(),
            IpAddr::V6(v6) => !v6.is_unspecified() && !v6.is_multicast(),
        };
        if !unicast {
            return Err(AddressError::NotUnicast(ip));
        }
        Ok(Self(ip))
    }

    /// The value announced when route discovery fails.
    pub fn fallback() -> Self {
        Self(IpAddr::V4(FALLBACK_ADDRESS))
    }

    pub fn ip(&self) -> IpAddr {
        self.0
    }

    /// Numeric form of the address. IPv4 values are widened so that every
    /// IPv4 address orders before every IPv6 one.
    pub fn to_bits(&self) -> u128 {
        match self.0 {
            IpAddr::V4(v4) => u128::from(u32::from(v4)),
            IpAddr::V6(v6) => u128::from(v6),
        }
    }

    pub fn is_loopback(&self) -> bool {
        self.0.is_loopback()
    }

    pub fn is_ipv4(&self) -> bool {
        self.0.is_ipv4()
    }
}

impl TryFrom<IpAddr> for Address {
    type Error = AddressError;

    fn try_from(ip: IpAddr) -> Result<Self, Self::Error> {
        Self::new(ip)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ip: IpAddr = s
            .trim()
            .parse()
            .map_err(|_| AddressError::Syntax(s.to_string()))?;
        Self::new(ip)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}
