//! Reserved address ranges that outbound requests must never reach.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Returns true when `ip` falls inside a loopback, link-local, private or
/// otherwise reserved range.
///
/// IPv4-mapped and NAT64 (`64:ff9b::/96`) IPv6 addresses are judged by
/// their embedded IPv4 address.
pub fn is_blocked_ip(ip: IpAddr) -> bool {
    blocked_range(ip).is_some()
}

/// Name of the reserved range containing `ip`, if any.
pub fn blocked_range(ip: IpAddr) -> Option<&'static str> {
    match ip {
        IpAddr::V4(v4) => blocked_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped().or_else(|| nat64_embedded(v6)) {
            Some(v4) => blocked_v4(v4),
            None => blocked_v6(v6),
        },
    }
}

fn blocked_v4(addr: Ipv4Addr) -> Option<&'static str> {
    let [a, b, c, _] = addr.octets();
    match (a, b, c) {
        (0, _, _) => Some("0.0.0.0/8"),
        (127, _, _) => Some("127.0.0.0/8"),
        (10, _, _) => Some("10.0.0.0/8"),
        (172, 16..=31, _) => Some("172.16.0.0/12"),
        (192, 168, _) => Some("192.168.0.0/16"),
        (169, 254, _) => Some("169.254.0.0/16"),
        (100, 64..=127, _) => Some("100.64.0.0/10"),
        (224..=239, _, _) => Some("224.0.0.0/4"),
        (240..=255, _, _) => Some("240.0.0.0/4"),
        _ => None,
    }
}

fn nat64_embedded(addr: Ipv6Addr) -> Option<Ipv4Addr> {
    let seg = addr.segments();
    if seg[..6] != [0x64, 0xff9b, 0, 0, 0, 0] {
        return None;
    }
    let [a, b] = seg[6].to_be_bytes();
    let [c, d] = seg[7].to_be_bytes();
    Some(Ipv4Addr::new(a, b, c, d))
}

fn blocked_v6(addr: Ipv6Addr) -> Option<&'static str> {
    let first = addr.segments()[0];
    if addr.is_loopback() {
        Some("::1/128")
    } else if addr.is_unspecified() {
        Some("::/128")
    } else if first & 0xfe00 == 0xfc00 {
        Some("fc00::/7")
    } else if first & 0xffc0 == 0xfe80 {
        Some("fe80::/10")
    } else if first & 0xff00 == 0xff00 {
        Some("ff00::/8")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn reserved_ipv4_ranges_are_blocked() {
        for addr in [
            "127.0.0.1",
            "127.8.9.10",
            "10.0.0.1",
            "10.255.255.255",
            "172.16.0.1",
            "172.31.255.254",
            "192.168.1.20",
            "169.254.169.254",
            "0.0.0.0",
            "100.64.0.1",
            "100.127.255.254",
            "224.0.0.1",
            "239.1.1.1",
            "255.255.255.255",
        ] {
            assert!(is_blocked_ip(ip(addr)), "{addr} should be blocked");
        }
    }

    #[test]
    fn reserved_ipv6_ranges_are_blocked() {
        for addr in ["::1", "::", "fc00::1", "fd12:3456::1", "fe80::1", "febf::1", "ff02::1", "ff05::2"] {
            assert!(is_blocked_ip(ip(addr)), "{addr} should be blocked");
        }
    }

    #[test]
    fn mapped_ipv4_uses_embedded_address() {
        assert!(is_blocked_ip(ip("::ffff:10.0.0.1")));
        assert!(is_blocked_ip(ip("::ffff:127.0.0.1")));
        assert!(!is_blocked_ip(ip("::ffff:8.8.8.8")));
    }

    #[test]
    fn nat64_uses_embedded_address() {
        assert_eq!(blocked_range(ip("64:ff9b::7f00:1")), Some("127.0.0.0/8"));
        assert_eq!(blocked_range(ip("64:ff9b::a9fe:a9fe")), Some("169.254.0.0/16"));
        assert!(!is_blocked_ip(ip("64:ff9b::808:808")));
    }

    #[test]
    fn public_addresses_pass() {
        for addr in ["8.8.8.8", "1.1.1.1", "172.15.0.1", "172.32.0.1", "192.169.0.1", "100.63.255.255", "100.128.0.1", "2606:4700::1111"] {
            assert!(!is_blocked_ip(ip(addr)), "{addr} should pass");
        }
    }

    #[test]
    fn range_names_identify_the_block() {
        assert_eq!(blocked_range(ip("172.20.1.1")), Some("172.16.0.0/12"));
        assert_eq!(blocked_range(ip("fe80::abcd")), Some("fe80::/10"));
        assert_eq!(blocked_range(ip("8.8.4.4")), None);
    }
}
