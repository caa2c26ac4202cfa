//! SSRF guard for remote music sources.
//!
//! A caller-supplied music URL is fetched by the server, so before any
//! request goes out the URL must:
//! - use `http` or `https`
//! - have a host
//! - not point at, or resolve to, a private/internal address
//!
//! Private targets can be allowed for local development and tests.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use thiserror::Error;
use tracing::warn;
use url::Url;

/// Errors that can occur during URL validation
#[derive(Debug, Error)]
pub enum UrlValidationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(#[from] url::ParseError),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("URL must have a host")]
    MissingHost,

    #[error("URL resolves to private/internal IP address: {0}")]
    PrivateIpDetected(IpAddr),

    #[error("Failed to resolve hostname: {0}")]
    DnsResolutionFailed(String),
}

/// Whether an IPv4 address is loopback, private, link-local, broadcast,
/// unspecified, documentation, CGNAT (100.64/10) or benchmarking (198.18/15).
pub fn is_private_ipv4(ip: &Ipv4Addr) -> bool {
    let octets = ip.octets();
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_unspecified()
        || ip.is_documentation()
        || (octets[0] == 100 && (octets[1] & 0xC0) == 64)
        || (octets[0] == 198 && (octets[1] == 18 || octets[1] == 19))
}

/// Whether an IPv6 address is loopback, unspecified, link-local, unique
/// local, documentation, or maps to a private IPv4 address.
pub fn is_private_ipv6(ip: &Ipv6Addr) -> bool {
    if ip.is_loopback() || ip.is_unspecified() {
        return true;
    }
    let segments = ip.segments();
    // fe80::/10
    if segments[0] & 0xFFC0 == 0xFE80 {
        return true;
    }
    // fc00::/7
    if segments[0] & 0xFE00 == 0xFC00 {
        return true;
    }
    // 2001:db8::/32
    if segments[0] == 0x2001 && segments[1] == 0x0DB8 {
        return true;
    }
    ip.to_ipv4_mapped()
        .is_some_and(|ipv4| is_private_ipv4(&ipv4))
}

pub fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => is_private_ipv4(ipv4),
        IpAddr::V6(ipv6) => is_private_ipv6(ipv6),
    }
}

/// Validate a remote music URL and return it parsed.
///
/// With `allow_private` set, only the scheme and host checks apply.
///
/// # Example
/// ```rust,ignore
/// use podcast_gateway::utils::url_validation::validate_music_url;
///
/// assert!(validate_music_url("https://cdn.example.com/bed.mp3", false).await.is_ok());
/// assert!(validate_music_url("http://127.0.0.1/bed.mp3", false).await.is_err());
/// assert!(validate_music_url("ftp://cdn.example.com/bed.mp3", true).await.is_err());
/// ```
pub async fn validate_music_url(url: &str, allow_private: bool) -> Result<Url, UrlValidationError> {
    let parsed = Url::parse(url)?;

    let scheme = parsed.scheme();
    if scheme != "https" && scheme != "http" {
        return Err(UrlValidationError::UnsupportedScheme(scheme.to_string()));
    }

    let host = parsed
        .host_str()
        .ok_or(UrlValidationError::MissingHost)?
        .to_string();

    if allow_private {
        return Ok(parsed);
    }

    let ips: Vec<IpAddr> = match parsed.host() {
        Some(url::Host::Ipv4(ip)) => vec![IpAddr::V4(ip)],
        Some(url::Host::Ipv6(ip)) => vec![IpAddr::V6(ip)],
        Some(url::Host::Domain(_)) => {
            let port = parsed.port_or_known_default().unwrap_or(443);
            tokio::net::lookup_host((host.as_str(), port))
                .await
                .map_err(|e| UrlValidationError::DnsResolutionFailed(format!("{host}: {e}")))?
                .map(|addr| addr.ip())
                .collect()
        }
        None => return Err(UrlValidationError::MissingHost),
    };

    if ips.is_empty() {
        return Err(UrlValidationError::DnsResolutionFailed(format!(
            "No addresses found for {host}"
        )));
    }

    if let Some(ip) = ips.into_iter().find(is_private_ip) {
        warn!(
            host = %host,
            resolved_ip = %ip,
            "Music URL resolves to private IP address (SSRF protection)"
        );
        return Err(UrlValidationError::PrivateIpDetected(ip));
    }

    Ok(parsed)
}
