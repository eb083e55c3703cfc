//! # Outbound Address Discovery
//!
//! Asks the OS which local address it would use to reach an external
//! destination. A connectionless socket is "connected" toward a probe
//! address; no packet leaves the host, the kernel only runs route selection
//! and binds the socket to the chosen source address.

use std::io;
use std::net::{IpAddr, SocketAddr, UdpSocket};

use ipsync_common::config::DEFAULT_PROBE;
use ipsync_common::network::Address;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("could not bind probe socket: {0}")]
    Bind(#[source] io::Error),
    #[error("no route towards {probe}: {source}")]
    Connect {
        probe: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("could not read probe socket name: {0}")]
    LocalAddr(#[source] io::Error),
    #[error("OS selected a non-unicast source address {0}")]
    NotUnicast(IpAddr),
    #[error("OS selected loopback source address {0}, no outbound route")]
    Loopback(IpAddr),
}

/// The address chosen for a run and whether it is the discovery fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub address: Address,
    pub fallback: bool,
}

impl Resolution {
    pub fn discovered(address: Address) -> Self {
        Self {
            address,
            fallback: false,
        }
    }

    pub fn fallback() -> Self {
        Self {
            address: Address::fallback(),
            fallback: true,
        }
    }
}

pub trait AddressResolver {
    /// Never fails: when no address can be determined, the loopback fallback
    /// is returned with `fallback` set.
    fn resolve(&self) -> Resolution;
}

impl<T: AddressResolver + ?Sized> AddressResolver for Box<T> {
    fn resolve(&self) -> Resolution {
        (**self).resolve()
    }
}

/// Resolves the outbound-routable address with a UDP route probe.
#[derive(Debug, Clone, Copy)]
pub struct RouteProbeResolver {
    probe: SocketAddr,
}

impl RouteProbeResolver {
    pub fn new(probe: SocketAddr) -> Self {
        Self { probe }
    }

    /// The route lookup itself, without the loopback fallback. A loopback
    /// source means the destination is local, so it counts as a failure.
    pub fn try_resolve(&self) -> Result<Address, ResolveError> {
        let source_ip = resolve_route_source_ip(self.probe)?;
        if source_ip.to_canonical().is_loopback() {
            return Err(ResolveError::Loopback(source_ip));
        }
        Address::new(source_ip).map_err(|_| ResolveError::NotUnicast(source_ip))
    }
}

impl Default for RouteProbeResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE)
    }
}

impl AddressResolver for RouteProbeResolver {
    fn resolve(&self) -> Resolution {
        match self.try_resolve() {
            Ok(address) => {
                debug!("Route lookup via {} selected {}", self.probe, address);
                Resolution::discovered(address)
            }
            Err(e) => {
                let resolution = Resolution::fallback();
                warn!("Error getting IP address: {e}; falling back to {}", resolution.address);
                resolution
            }
        }
    }
}

/// Always answers with the same address. Used for `--address` overrides.
#[derive(Debug, Clone, Copy)]
pub struct FixedResolver(pub Address);

impl AddressResolver for FixedResolver {
    fn resolve(&self) -> Resolution {
        Resolution::discovered(self.0)
    }
}

// The socket is dropped, and therefore closed, on every return path.
fn resolve_route_source_ip(probe: SocketAddr) -> Result<IpAddr, ResolveError> {
    let bind_addr = if probe.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
    let socket = UdpSocket::bind(bind_addr).map_err(ResolveError::Bind)?;

    socket
        .connect(probe)
        .map_err(|source| ResolveError::Connect { probe, source })?;

    let local = socket.local_addr().map_err(ResolveError::LocalAddr)?;
    Ok(local.ip())
}
