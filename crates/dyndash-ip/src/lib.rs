// # System IP Resolver
//
// Implements the core IpResolver trait against the host system.
//
// ## Modes
//
// - Interface mode: getifaddrs enumeration; first IPv4 address bound to
//   the named interface.
// - Public mode: HTTP probes to a short, ordered endpoint list, each
//   request forced out through the named interface with a fixed 5-second
//   timeout. The first response containing a parseable dotted-quad wins;
//   endpoints wrap the address in HTML or JSON, so the value is
//   pattern-matched out of the body rather than parsed whole.
//
// No retries beyond the fallback list, no caching: callers poll.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use async_trait::async_trait;
use dyndash_core::traits::{IpMode, IpResolver};
use dyndash_core::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

/// Per-probe request timeout
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

lazy_static! {
    /// Dotted-quad candidates; each candidate is validated by parsing, so
    /// strings like "999.1.1.1" fall through to the next match.
    static ref IPV4_PATTERN: Regex = Regex::new(r"\d{1,3}(?:\.\d{1,3}){3}").unwrap();
}

/// Extract the first valid IPv4 literal embedded in arbitrary text
pub fn extract_ipv4(text: &str) -> Option<Ipv4Addr> {
    IPV4_PATTERN
        .find_iter(text)
        .find_map(|m| m.as_str().parse().ok())
}

/// A network interface and its bound IPv4 addresses, for the UI dropdown
#[derive(Debug, Clone, Serialize)]
pub struct InterfaceInfo {
    pub name: String,
    pub ipv4: Vec<Ipv4Addr>,
}

/// List the host's network interfaces with their IPv4 addresses
pub fn list_interfaces() -> Result<Vec<InterfaceInfo>> {
    let addrs = if_addrs::get_if_addrs()
        .map_err(|e| Error::resolve(format!("interface enumeration failed: {}", e)))?;

    let mut interfaces: Vec<InterfaceInfo> = Vec::new();
    for iface in addrs {
        let v4 = match iface.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        };
        match interfaces.iter_mut().find(|i| i.name == iface.name) {
            Some(entry) => {
                if let Some(v4) = v4 {
                    entry.ipv4.push(v4);
                }
            }
            None => interfaces.push(InterfaceInfo {
                name: iface.name,
                ipv4: v4.into_iter().collect(),
            }),
        }
    }

    interfaces.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(interfaces)
}

/// First IPv4 address bound to the named interface
fn interface_ipv4(name: &str) -> Result<Ipv4Addr> {
    let addrs = if_addrs::get_if_addrs()
        .map_err(|e| Error::resolve(format!("interface enumeration failed: {}", e)))?;

    addrs
        .into_iter()
        .filter(|iface| iface.name == name)
        .find_map(|iface| match iface.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| Error::resolve(format!("interface {} has no IPv4 address", name)))
}

/// IpResolver implementation backed by getifaddrs and HTTP probes
pub struct SystemIpResolver {
    /// Public IP endpoints, tried in order
    probe_urls: Vec<String>,
}

impl SystemIpResolver {
    pub fn new(probe_urls: Vec<String>) -> Self {
        Self { probe_urls }
    }

    /// Build a client whose egress is pinned to `interface`.
    ///
    /// SO_BINDTODEVICE where the platform has it; elsewhere the probe binds
    /// its source address to the interface's own IPv4.
    fn egress_client(&self, interface: &str) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().timeout(PROBE_TIMEOUT);

        #[cfg(any(target_os = "linux", target_os = "android", target_os = "fuchsia"))]
        {
            builder = builder.interface(interface);
        }
        #[cfg(not(any(target_os = "linux", target_os = "android", target_os = "fuchsia")))]
        {
            builder = builder.local_address(IpAddr::V4(interface_ipv4(interface)?));
        }

        builder
            .build()
            .map_err(|e| Error::http(format!("failed to build probe client: {}", e)))
    }

    async fn public_ipv4(&self, interface: &str) -> Result<Ipv4Addr> {
        let client = self.egress_client(interface)?;
        probe(&client, &self.probe_urls, interface).await
    }
}

impl Default for SystemIpResolver {
    fn default() -> Self {
        Self::new(
            dyndash_core::config::DEFAULT_PROBE_URLS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

/// Try each endpoint in order and return the first extractable IPv4
async fn probe(client: &reqwest::Client, probe_urls: &[String], interface: &str) -> Result<Ipv4Addr> {
    for url in probe_urls {
        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => match extract_ipv4(&body) {
                    Some(ip) => {
                        info!("public IP via {} from {}: {}", interface, url, ip);
                        return Ok(ip);
                    }
                    None => {
                        warn!("{} returned no usable IPv4 literal", url);
                    }
                },
                Err(e) => {
                    warn!("failed to read probe body from {}: {}", url, e);
                }
            },
            Ok(response) => {
                warn!("probe {} answered {}", url, response.status());
            }
            Err(e) => {
                warn!("probe {} via {} failed: {}", url, interface, e);
            }
        }
    }

    Err(Error::resolve(format!(
        "all public IP probes failed for interface {}",
        interface
    )))
}

#[async_trait]
impl IpResolver for SystemIpResolver {
    async fn resolve(&self, interface: &str, mode: IpMode) -> Result<Ipv4Addr> {
        match mode {
            IpMode::InterfaceIp => interface_ipv4(interface),
            IpMode::PublicIp => self.public_ipv4(interface).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn extracts_bare_dotted_quad() {
        assert_eq!(extract_ipv4("203.0.113.9"), Some("203.0.113.9".parse().unwrap()));
        assert_eq!(extract_ipv4("  198.51.100.4\n"), Some("198.51.100.4".parse().unwrap()));
    }

    #[test]
    fn extracts_ip_from_surrounding_text() {
        // Providers wrap the value in prose, HTML or JSON
        assert_eq!(
            extract_ipv4("203.0.113.9 is your IP"),
            Some("203.0.113.9".parse().unwrap())
        );
        assert_eq!(
            extract_ipv4("<html><body>IP: 192.0.2.55</body></html>"),
            Some("192.0.2.55".parse().unwrap())
        );
        assert_eq!(
            extract_ipv4(r#"{"ip":"198.51.100.23","country":"XX"}"#),
            Some("198.51.100.23".parse().unwrap())
        );
    }

    #[test]
    fn skips_invalid_octets_and_keeps_searching() {
        assert_eq!(
            extract_ipv4("bogus 999.999.999.999 then 10.0.0.1"),
            Some("10.0.0.1".parse().unwrap())
        );
        assert_eq!(extract_ipv4("no address here"), None);
        assert_eq!(extract_ipv4("version 1.2.3 only"), None);
    }

    #[test]
    fn list_interfaces_enumerates_without_error() {
        let interfaces = list_interfaces().unwrap();
        // Every entry has a name; addresses may legitimately be empty
        assert!(interfaces.iter().all(|i| !i.name.is_empty()));
    }

    #[test]
    fn unknown_interface_reports_resolve_error() {
        let err = interface_ipv4("definitely-not-a-real-interface-0").unwrap_err();
        assert!(matches!(err, Error::Resolve(_)));
    }

    /// Serve one canned HTTP response on a loopback listener
    async fn one_shot_http_server(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn probe_falls_back_past_unusable_bodies() {
        let malformed = one_shot_http_server("<html>no address for you</html>").await;
        let good = one_shot_http_server("203.0.113.9 is your IP").await;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        let urls = vec![malformed, good];
        let ip = probe(&client, &urls, "test0").await.unwrap();
        assert_eq!(ip, "203.0.113.9".parse::<Ipv4Addr>().unwrap());
    }

    #[tokio::test]
    async fn probe_fails_only_after_all_endpoints() {
        let malformed = one_shot_http_server("nothing useful").await;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        // A dead endpoint first, then a live-but-useless one
        let urls = vec!["http://127.0.0.1:1".to_string(), malformed];
        let err = probe(&client, &urls, "test0").await.unwrap_err();
        assert!(matches!(err, Error::Resolve(_)));
    }
}
