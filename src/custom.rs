//! User override file: extra lines added to or removed from the direct and
//! proxy rule files before a build.
//!
//! ```toml
//! [direct]
//! add = ["domain:example.cn"]
//! remove = ["cn.example.com"]
//!
//! [proxy]
//! add = ["full:example.org"]
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::config::BuildConfig;
use crate::error::{BuildError, Result};

/// Lines to add and remove for one rule file
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LineEdits {
    pub add: Vec<String>,
    pub remove: Vec<String>,
}

/// Parsed override file
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CustomRules {
    pub direct: LineEdits,
    pub proxy: LineEdits,
}

impl CustomRules {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| BuildError::ConfigError(format!("TOML parse error: {e}")))
    }

    /// Load the override file. A missing file yields `None`.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        Self::from_toml(&text).map(Some)
    }

    /// Apply the direct then proxy edits to their rule files.
    pub fn apply(&self, direct_path: &Path, proxy_path: &Path) -> Result<()> {
        apply_edits(direct_path, &self.direct)?;
        apply_edits(proxy_path, &self.proxy)
    }
}

/// Load the configured override file, if any, and apply it.
pub fn apply_overrides(config: &BuildConfig) -> Result<()> {
    match CustomRules::load(&config.custom_path)? {
        Some(rules) => {
            info!("Applying overrides from '{}'", config.custom_path.display());
            rules.apply(&config.direct_path, &config.proxy_path)
        }
        None => {
            info!(
                "No override file at '{}', skipping",
                config.custom_path.display()
            );
            Ok(())
        }
    }
}

fn apply_edits(path: &Path, edits: &LineEdits) -> Result<()> {
    add_lines(path, &edits.add)?;
    remove_lines(path, &edits.remove)
}

/// Trimmed, non-blank lines of a file
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut content = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    fs::write(path, content).map_err(|e| BuildError::io(path, e))
}

/// Append lines to a rule file, rewriting it.
pub fn add_lines(path: &Path, add: &[String]) -> Result<()> {
    let mut lines = read_lines(path)?;
    for line in add {
        info!("{} added to {}", line, path.display());
    }
    lines.extend(add.iter().cloned());
    write_lines(path, &lines)
}

/// Drop every line equal to one of `remove`, rewriting the file.
pub fn remove_lines(path: &Path, remove: &[String]) -> Result<()> {
    let remove: HashSet<&str> = remove.iter().map(String::as_str).collect();
    let lines = read_lines(path)?;

    let mut kept = Vec::with_capacity(lines.len());
    for line in lines {
        if remove.contains(line.as_str()) {
            info!("{} removed from {}", line, path.display());
        } else {
            kept.push(line);
        }
    }
    write_lines(path, &kept)
}
