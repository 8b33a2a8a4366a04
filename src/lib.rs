//! geodat-builder - compiles rule directories into V2Ray geodata files
//!
//! Two datasets are produced:
//! - `geosite.dat`: per-list domain rules with boolean attributes
//! - `geoip.dat`: per-list CIDR ranges plus a built-in `PRIVATE` list
//!
//! # Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use geodat_builder::{parse_list, ListRegistry};
//!
//! let mut registry = ListRegistry::new();
//! registry.insert(parse_list("google", "google.com\nfull:ads.google.com @ads").unwrap());
//! registry.insert(parse_list("cn", "baidu.com\nwww.baidu.com\ninclude:google @ads").unwrap());
//!
//! // Flatten inclusions and deduplicate domains
//! registry.resolve().unwrap();
//!
//! let cn = registry.get("CN").unwrap();
//! let rules: Vec<String> = cn.to_rules(None).iter().map(|r| r.to_string()).collect();
//! assert_eq!(rules, vec!["domain:baidu.com", "full:ads.google.com @ads"]);
//!
//! // Encode-ready V2Ray GeoSiteList, one entry per list
//! let geosite = registry.to_geosite_list(&BTreeMap::new());
//! assert_eq!(geosite.entry.len(), 2);
//! ```
//!
//! # Domain list syntax
//!
//! One rule per line, `#` starts a comment:
//!
//! ```text
//! include:google @ads        # rules of list GOOGLE tagged @ads
//! include:alphabet           # every rule of list ALPHABET
//! full:www.example.com       # exact match
//! domain:example.com         # domain and subdomains
//! example.org                # same as domain:
//! keyword:example            # substring
//! regexp:^ex[0-9]+\.com$     # regular expression
//! ads.example.com @ads @cn   # attributes
//! ```
//!
//! Within a list, domain rules covered by a more general domain rule are
//! dropped (`www.example.com` when `example.com` is present).

pub mod builder;
pub mod checksum;
pub mod config;
pub mod custom;
pub mod dat;
pub mod error;
pub mod geoip;
pub mod geosite;
pub mod parser;
pub mod types;
mod walk;

// Re-export commonly used items
pub use builder::{build_geoip, build_geosite, compile_geoip, compile_geosite, run};
pub use config::{BuildConfig, Mode};
pub use custom::{apply_overrides, CustomRules};
pub use error::{BuildError, ErrorKind, Result};
pub use geosite::{DomainTrie, ListInfo, ListRegistry};
pub use parser::{parse_line, parse_list, parse_list_file, ParsedLine};
pub use types::{InclusionFilter, Rule, RuleKind};
