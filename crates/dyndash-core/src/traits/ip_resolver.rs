// # IP Resolver Trait
//
// Answers "what is the current IPv4 address for this interface, in this
// mode?". The mode is per-binding data, so a single resolver serves every
// binding.
//
// ## Implementations
//
// - System resolver (getifaddrs + HTTP egress probes): `dyndash-ip` crate

use crate::traits::IpMode;
use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for IP resolver implementations
///
/// `resolve` performs one lookup and returns the address or an error; it
/// never caches and never retries beyond its own endpoint fallback list.
/// Callers treat a failure as "try again next tick".
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Resolve the current IPv4 address for `interface` in the given mode.
    ///
    /// - [`IpMode::InterfaceIp`]: first IPv4 address bound to the named
    ///   interface; error if the interface does not exist or has none.
    /// - [`IpMode::PublicIp`]: egress address observed by probing a list of
    ///   public endpoints through the named interface; error only after all
    ///   endpoints fail or return unparseable bodies.
    async fn resolve(&self, interface: &str, mode: IpMode) -> Result<Ipv4Addr, crate::Error>;
}
