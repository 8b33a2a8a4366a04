use std::collections::HashMap;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::Path;

use ipnet::IpNet;
use prost::Message;

use crate::error::{BuildError, Result};
use crate::types::{Rule, RuleKind};

pub mod geodat;

impl From<&Rule> for geodat::Domain {
    fn from(rule: &Rule) -> Self {
        use geodat::domain::{attribute::TypedValue, Attribute, Type};

        let kind = match rule.kind {
            RuleKind::Full => Type::Full,
            RuleKind::Domain => Type::RootDomain,
            RuleKind::Keyword => Type::Plain,
            RuleKind::Regex => Type::Regex,
        };

        geodat::Domain {
            r#type: kind as i32,
            value: rule.value.clone(),
            attribute: rule
                .attributes
                .iter()
                .map(|key| Attribute {
                    key: key.clone(),
                    typed_value: Some(TypedValue::BoolValue(true)),
                })
                .collect(),
        }
    }
}

impl From<&IpNet> for geodat::Cidr {
    fn from(net: &IpNet) -> Self {
        let ip = match net.addr() {
            IpAddr::V4(v4) => v4.octets().to_vec(),
            IpAddr::V6(v6) => v6.octets().to_vec(),
        };
        geodat::Cidr {
            ip,
            prefix: u32::from(net.prefix_len()),
        }
    }
}

/// Serialize a message into a buffer sized for it
fn encode<M: Message>(message: &M) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(message.encoded_len());
    message
        .encode(&mut buf)
        .map_err(|e| BuildError::EncodingError(e.to_string()))?;
    Ok(buf)
}

pub fn encode_geosite(list: &geodat::GeoSiteList) -> Result<Vec<u8>> {
    encode(list)
}

pub fn encode_geoip(list: &geodat::GeoIpList) -> Result<Vec<u8>> {
    encode(list)
}

pub fn decode_geosite(data: &[u8]) -> Result<geodat::GeoSiteList> {
    geodat::GeoSiteList::decode(data)
        .map_err(|e| BuildError::EncodingError(format!("Failed to decode GeoSite DAT: {}", e)))
}

pub fn decode_geoip(data: &[u8]) -> Result<geodat::GeoIpList> {
    geodat::GeoIpList::decode(data)
        .map_err(|e| BuildError::EncodingError(format!("Failed to decode GeoIP DAT: {}", e)))
}

/// Load GeoIP data from V2Ray DAT format
pub fn load_geoip(path: impl AsRef<Path>) -> Result<HashMap<String, Vec<IpNet>>> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| BuildError::io(path, e))?;
    let list = decode_geoip(&data)?;

    let mut result = HashMap::new();
    for entry in list.entry {
        let cidrs = entry.cidr.iter().filter_map(cidr_to_ipnet).collect();
        result.insert(entry.country_code, cidrs);
    }
    Ok(result)
}

/// Load GeoSite data from V2Ray DAT format
pub fn load_geosite(path: impl AsRef<Path>) -> Result<HashMap<String, Vec<Rule>>> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| BuildError::io(path, e))?;
    let list = decode_geosite(&data)?;

    let mut result = HashMap::new();
    for entry in list.entry {
        let rules = entry.domain.iter().filter_map(domain_to_rule).collect();
        result.insert(entry.country_code, rules);
    }
    Ok(result)
}

/// Convert protobuf CIDR to IpNet
fn cidr_to_ipnet(cidr: &geodat::Cidr) -> Option<IpNet> {
    let prefix = u8::try_from(cidr.prefix).ok()?;
    let addr = match cidr.ip.len() {
        4 => {
            let octets: [u8; 4] = cidr.ip[..].try_into().ok()?;
            IpAddr::V4(Ipv4Addr::from(octets))
        }
        16 => {
            let octets: [u8; 16] = cidr.ip[..].try_into().ok()?;
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        _ => return None,
    };
    IpNet::new(addr, prefix).ok()
}

/// Convert protobuf Domain back to a Rule
fn domain_to_rule(domain: &geodat::Domain) -> Option<Rule> {
    use geodat::domain::Type;

    let kind = match Type::try_from(domain.r#type) {
        Ok(Type::Plain) => RuleKind::Keyword,
        Ok(Type::Regex) => RuleKind::Regex,
        Ok(Type::RootDomain) => RuleKind::Domain,
        Ok(Type::Full) => RuleKind::Full,
        Err(_) => return None,
    };

    let mut rule = Rule::new(kind, &domain.value);
    for attr in &domain.attribute {
        rule = rule.with_attribute(&attr.key);
    }
    Some(rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_to_domain() {
        use geodat::domain::{attribute::TypedValue, Type};

        let rule = Rule::full("ads.google.com").with_attribute("ads");
        let domain = geodat::Domain::from(&rule);
        assert_eq!(domain.r#type, Type::Full as i32);
        assert_eq!(domain.value, "ads.google.com");
        assert_eq!(domain.attribute.len(), 1);
        assert_eq!(domain.attribute[0].key, "ads");
        assert_eq!(
            domain.attribute[0].typed_value,
            Some(TypedValue::BoolValue(true))
        );

        assert_eq!(
            geodat::Domain::from(&Rule::domain("a.com")).r#type,
            Type::RootDomain as i32
        );
        assert_eq!(
            geodat::Domain::from(&Rule::keyword("a")).r#type,
            Type::Plain as i32
        );
        assert_eq!(
            geodat::Domain::from(&Rule::regex("^a$")).r#type,
            Type::Regex as i32
        );
    }

    #[test]
    fn test_ipnet_to_cidr() {
        let v4: IpNet = "10.0.0.0/23".parse().unwrap();
        let cidr = geodat::Cidr::from(&v4);
        assert_eq!(cidr.ip, vec![10, 0, 0, 0]);
        assert_eq!(cidr.prefix, 23);

        let v6: IpNet = "fc00::/7".parse().unwrap();
        let cidr = geodat::Cidr::from(&v6);
        assert_eq!(cidr.ip.len(), 16);
        assert_eq!(cidr.ip[0], 0xfc);
        assert_eq!(cidr.prefix, 7);
    }

    #[test]
    fn test_geosite_list_decodes_back() {
        let list = geodat::GeoSiteList {
            entry: vec![geodat::GeoSite {
                country_code: "CN".into(),
                domain: vec![
                    geodat::Domain::from(&Rule::domain("baidu.com")),
                    geodat::Domain::from(&Rule::regex(r"^Qq\d+$").with_attribute("cn")),
                ],
            }],
        };
        let bytes = encode_geosite(&list).unwrap();
        let decoded = decode_geosite(&bytes).unwrap();
        assert_eq!(decoded, list);

        let rules: Vec<Rule> = decoded.entry[0]
            .domain
            .iter()
            .filter_map(domain_to_rule)
            .collect();
        assert_eq!(rules[1], Rule::regex(r"^Qq\d+$").with_attribute("cn"));
    }

    #[test]
    fn test_decode_garbage_is_encoding_error() {
        let err = decode_geoip(&[0xff, 0xff, 0xff]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Encoding);
    }

    #[test]
    fn test_cidr_to_ipnet_rejects_bad_length() {
        let cidr = geodat::Cidr {
            ip: vec![1, 2, 3],
            prefix: 8,
        };
        assert!(cidr_to_ipnet(&cidr).is_none());

        let cidr = geodat::Cidr {
            ip: vec![10, 0, 0, 0],
            prefix: 33,
        };
        assert!(cidr_to_ipnet(&cidr).is_none());
    }
}
