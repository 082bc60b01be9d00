use std::net::{IpAddr, Ipv6Addr};

use async_trait::async_trait;

use crate::ports::PrivateNetworkDetector;

/// Default, always-available private-network classifier (§11.2). The real
/// IP-to-country/ASN table the original implementation layers on top stays
/// out of scope (§1) — this covers exactly the documented ranges: loopback,
/// link-local, RFC1918, RFC4193, and multicast.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPrivateNetworkDetector;

#[async_trait]
impl PrivateNetworkDetector for DefaultPrivateNetworkDetector {
    async fn is_private(&self, host: &str) -> bool {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return is_private_ip(ip);
        }

        // Literal IPs are rare; most hosts need a DNS lookup. A resolution
        // failure fails closed (treated as private, so the caller drops the
        // link) — matches the original's `if err != nil { return false, nil
        // }`, after which the caller treats the link as not retained.
        match tokio::net::lookup_host((host, 0)).await {
            Ok(mut addrs) => addrs.next().map(|addr| is_private_ip(addr.ip())).unwrap_or(true),
            Err(_) => true,
        }
    }
}

fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_link_local()
                || v4.is_private()
                || v4.is_multicast()
                || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_multicast()
                || v6.is_unspecified()
                || is_unique_local_v6(v6)
                || is_link_local_v6(v6)
        }
    }
}

/// `fc00::/7` (RFC4193).
fn is_unique_local_v6(addr: Ipv6Addr) -> bool {
    (addr.segments()[0] & 0xfe00) == 0xfc00
}

/// `fe80::/10`.
fn is_link_local_v6(addr: Ipv6Addr) -> bool {
    (addr.segments()[0] & 0xffc0) == 0xfe80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn classifies_rfc1918_as_private() {
        let detector = DefaultPrivateNetworkDetector;
        assert!(detector.is_private("10.0.0.1").await);
        assert!(detector.is_private("172.16.0.1").await);
        assert!(detector.is_private("192.168.1.1").await);
    }

    #[tokio::test]
    async fn classifies_loopback_and_link_local() {
        let detector = DefaultPrivateNetworkDetector;
        assert!(detector.is_private("127.0.0.1").await);
        assert!(detector.is_private("169.254.1.1").await);
        assert!(detector.is_private("::1").await);
        assert!(detector.is_private("fe80::1").await);
        assert!(detector.is_private("fc00::1").await);
    }

    #[tokio::test]
    async fn classifies_public_ip_as_not_private() {
        let detector = DefaultPrivateNetworkDetector;
        assert!(!detector.is_private("93.184.216.34").await);
    }

    #[tokio::test]
    async fn unresolvable_host_fails_closed() {
        let detector = DefaultPrivateNetworkDetector;
        assert!(detector.is_private("this-host-does-not-resolve.invalid").await);
    }
}
