// ── Public/private IP classification ──
//
// A gateway behind carrier NAT only ever sees a private address on its
// WAN interface. Everywhere a public IP is extracted, the candidate runs
// through this classifier first; a private address must never be
// reported as `public_ip`.

use std::net::Ipv4Addr;
use std::str::FromStr;

/// Classification of an IP literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpClass {
    Public,
    Private,
}

/// Classify an IPv4 literal as public or private (RFC1918 prefixes).
///
/// Returns `None` when the string is not an IPv4 literal at all.
pub fn classify(s: &str) -> Option<IpClass> {
    let addr = Ipv4Addr::from_str(s.trim()).ok()?;
    let [a, b, _, _] = addr.octets();
    let private = a == 10 || (a == 172 && (16..=31).contains(&b)) || (a == 192 && b == 168);
    Some(if private { IpClass::Private } else { IpClass::Public })
}

pub fn is_public(s: &str) -> bool {
    classify(s) == Some(IpClass::Public)
}

pub fn is_private(s: &str) -> bool {
    classify(s) == Some(IpClass::Private)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc1918_ranges_are_private() {
        for ip in ["10.0.0.5", "192.168.1.1", "172.16.0.1", "172.31.255.255"] {
            assert_eq!(classify(ip), Some(IpClass::Private), "{ip}");
        }
    }

    #[test]
    fn everything_else_is_public() {
        for ip in ["8.8.8.8", "203.0.113.7", "172.15.0.1", "172.32.0.1"] {
            assert_eq!(classify(ip), Some(IpClass::Public), "{ip}");
        }
    }

    #[test]
    fn non_literals_do_not_classify() {
        for s in ["", "N/A", "gateway.local", "192.168.1", "10.0.0.256"] {
            assert_eq!(classify(s), None, "{s}");
            assert!(!is_public(s));
            assert!(!is_private(s));
        }
    }
}
