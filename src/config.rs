use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::error::{BuildError, Result};

/// Which dataset to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    Geoip,
    Geosite,
}

impl Mode {
    /// Default output file name for this mode
    pub fn default_dat_name(&self) -> &'static str {
        match self {
            Mode::Geoip => "geoip.dat",
            Mode::Geosite => "geosite.dat",
        }
    }
}

/// Settings for one build run. Constructed once and passed by reference.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub mode: Mode,
    /// Directory of rule files, one list per file
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Output file name; the mode's default when unset
    pub dat_name: Option<String>,
    /// Rule file receiving the override file's `direct` section
    pub direct_path: PathBuf,
    /// Rule file receiving the override file's `proxy` section
    pub proxy_path: PathBuf,
    /// Override file (TOML); skipped when missing
    pub custom_path: PathBuf,
    /// List name -> attribute keys left out of that list's export
    pub exclude_attrs: BTreeMap<String, BTreeSet<String>>,
}

impl BuildConfig {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            data_dir: PathBuf::from("./data"),
            output_dir: PathBuf::from("./publish"),
            dat_name: None,
            direct_path: PathBuf::from("./domain_data/cn"),
            proxy_path: PathBuf::from("./domain_data/gfw"),
            custom_path: PathBuf::from("./custom.toml"),
            exclude_attrs: BTreeMap::new(),
        }
    }

    pub fn dat_name(&self) -> &str {
        self.dat_name
            .as_deref()
            .unwrap_or_else(|| self.mode.default_dat_name())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(self.dat_name())
    }
}

/// Parse `--exclude-attrs` values such as `cn@ads,gfw@cn@ads`.
pub fn parse_exclude_attrs(value: &str) -> Result<BTreeMap<String, BTreeSet<String>>> {
    let mut result: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let mut parts = item.split('@');
        let list = parts.next().unwrap_or_default().trim().to_uppercase();
        if list.is_empty() {
            return Err(BuildError::ConfigError(format!(
                "Missing list name in exclude-attrs entry: {}",
                item
            )));
        }

        let attrs: BTreeSet<String> = parts
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();
        if attrs.is_empty() {
            return Err(BuildError::ConfigError(format!(
                "No attributes in exclude-attrs entry: {}",
                item
            )));
        }

        result.entry(list).or_default().extend(attrs);
    }

    Ok(result)
}
