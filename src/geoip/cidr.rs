use std::net::IpAddr;

use ipnet::IpNet;

use crate::error::{BuildError, Result};

/// Parse `addr[/prefix]`. A bare IPv4 address is a /32, a bare IPv6 address
/// a /128. Host bits below the prefix are cleared.
pub fn parse_cidr(s: &str) -> Result<IpNet> {
    let s = s.trim();
    let (addr, prefix) = match s.split_once('/') {
        Some((addr, prefix)) => (addr.trim(), Some(prefix.trim())),
        None => (s, None),
    };

    let ip: IpAddr = addr
        .parse()
        .map_err(|_| BuildError::InvalidCidr(format!("Invalid address: {}", s)))?;

    let max_prefix = match ip {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };
    let prefix = match prefix {
        Some(p) => p
            .parse::<u8>()
            .map_err(|_| BuildError::InvalidCidr(format!("Invalid network mask: {}", s)))?,
        None => max_prefix,
    };

    IpNet::new(ip, prefix)
        .map(|net| net.trunc())
        .map_err(|_| BuildError::InvalidCidr(format!("Invalid network mask: {}", s)))
}

/// Merge overlapping and adjacent ranges into the smallest equivalent set,
/// IPv4 ranges first, each family sorted by address.
pub fn merge_cidrs(cidrs: &[IpNet]) -> Vec<IpNet> {
    IpNet::aggregate(&cidrs.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn net(s: &str) -> IpNet {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_cidr() {
        assert_eq!(parse_cidr("10.0.0.0/8").unwrap(), net("10.0.0.0/8"));
        assert_eq!(parse_cidr("1.2.3.4").unwrap(), net("1.2.3.4/32"));
        assert_eq!(parse_cidr("2001:db8::1").unwrap(), net("2001:db8::1/128"));
        assert_eq!(parse_cidr(" fe80::/10 ").unwrap(), net("fe80::/10"));
    }

    #[test]
    fn test_parse_cidr_clears_host_bits() {
        assert_eq!(parse_cidr("192.168.1.77/24").unwrap(), net("192.168.1.0/24"));
    }

    #[test]
    fn test_parse_invalid_cidr() {
        for bad in ["", "not-an-ip", "10.0.0.0/33", "::/129", "10.0.0.0/abc", "300.1.1.1"] {
            let err = parse_cidr(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Parse, "input: {:?}", bad);
        }
    }

    #[test]
    fn test_merge_adjacent() {
        let merged = merge_cidrs(&[net("10.0.0.0/24"), net("10.0.1.0/24")]);
        assert_eq!(merged, vec![net("10.0.0.0/23")]);
    }

    #[test]
    fn test_merge_overlapping_and_mixed_families() {
        let merged = merge_cidrs(&[
            net("2001:db8::/48"),
            net("192.168.0.0/16"),
            net("192.168.10.0/24"),
            net("2001:db8:1::/48"),
            net("10.0.0.1/32"),
        ]);
        assert_eq!(
            merged,
            vec![
                net("10.0.0.1/32"),
                net("192.168.0.0/16"),
                net("2001:db8::/47"),
            ]
        );
    }

    #[test]
    fn test_merge_non_adjacent_kept() {
        let merged = merge_cidrs(&[net("10.0.1.0/24"), net("10.0.2.0/24")]);
        assert_eq!(merged, vec![net("10.0.1.0/24"), net("10.0.2.0/24")]);
    }
}
