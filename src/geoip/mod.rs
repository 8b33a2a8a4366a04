//! IP list side: per-file CIDR lists, range merging and the built-in
//! `PRIVATE` entry.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ipnet::IpNet;
use once_cell::sync::Lazy;
use tracing::{debug, info, warn};

use crate::dat::geodat;
use crate::error::{BuildError, Result};
use crate::parser::strip_comment;
use crate::walk::walk_files;

mod cidr;

pub use cidr::{merge_cidrs, parse_cidr};

/// Name of the built-in reserved range entry
pub const PRIVATE_LIST: &str = "PRIVATE";

/// Reserved, private and special-use ranges
const PRIVATE_CIDRS: &[&str] = &[
    "0.0.0.0/8",
    "10.0.0.0/8",
    "100.64.0.0/10",
    "127.0.0.0/8",
    "169.254.0.0/16",
    "172.16.0.0/12",
    "192.0.0.0/24",
    "192.0.2.0/24",
    "192.88.99.0/24",
    "192.168.0.0/16",
    "198.18.0.0/15",
    "198.51.100.0/24",
    "203.0.113.0/24",
    "224.0.0.0/4",
    "240.0.0.0/4",
    "255.255.255.255/32",
    "::/128",
    "::1/128",
    "fc00::/7",
    "ff00::/8",
    "fe80::/10",
];

static PRIVATE_NETS: Lazy<Vec<IpNet>> = Lazy::new(|| {
    PRIVATE_CIDRS
        .iter()
        .map(|s| s.parse().expect("PRIVATE_CIDRS: hardcoded CIDR is invalid"))
        .collect()
});

/// The built-in `PRIVATE` ranges, in table order
pub fn private_cidrs() -> Vec<IpNet> {
    PRIVATE_NETS.clone()
}

/// Read one IP list file: one CIDR per line, `#` comments allowed.
/// Malformed lines are logged and skipped. The result is merged.
pub fn read_cidr_file(path: impl AsRef<Path>) -> Result<Vec<IpNet>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;

    let mut cidrs = Vec::new();
    for (line_num, line) in text.lines().enumerate() {
        let line = strip_comment(line);
        if line.is_empty() {
            continue;
        }
        match parse_cidr(line) {
            Ok(net) => cidrs.push(net),
            Err(e) => warn!("{}:{}: skipping line: {}", path.display(), line_num + 1, e),
        }
    }

    Ok(merge_cidrs(&cidrs))
}

/// Upper-cased file stem of an IP list file, e.g. `cn.txt` -> `CN`
pub fn ip_list_name(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().to_uppercase())
        .unwrap_or_default()
}

/// Read every IP list under `dir` and add the `PRIVATE` entry.
pub fn collect_dir(dir: impl AsRef<Path>) -> Result<BTreeMap<String, Vec<IpNet>>> {
    let dir = dir.as_ref();
    info!("Using IP list files in '{}'", dir.display());

    let mut lists = BTreeMap::new();
    for path in walk_files(dir)? {
        let name = ip_list_name(&path);
        if name == PRIVATE_LIST {
            warn!(
                "'{}' maps to the built-in {} list, ignoring it",
                path.display(),
                PRIVATE_LIST
            );
            continue;
        }
        let cidrs = read_cidr_file(&path)?;
        debug!("Read {} ranges for {} from '{}'", cidrs.len(), name, path.display());
        if lists.insert(name.clone(), cidrs).is_some() {
            warn!(
                "IP list {} defined more than once, keeping '{}'",
                name,
                path.display()
            );
        }
    }

    lists.insert(PRIVATE_LIST.to_string(), private_cidrs());
    Ok(lists)
}

/// Build the GeoIP dataset, one entry per list, ordered by name.
pub fn to_geoip_list(lists: &BTreeMap<String, Vec<IpNet>>) -> geodat::GeoIpList {
    let entry = lists
        .iter()
        .map(|(code, cidrs)| geodat::GeoIp {
            country_code: code.clone(),
            cidr: cidrs.iter().map(geodat::Cidr::from).collect(),
            reverse_match: false,
        })
        .collect();
    geodat::GeoIpList { entry }
}
