use std::fs;
use std::path::Path;

use crate::error::{BuildError, Result};
use crate::geosite::ListInfo;
use crate::types::{InclusionFilter, Rule, RuleKind};

/// One meaningful line of a domain list file
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// `include:name[@attr...]`
    Include {
        target: String,
        filters: Vec<InclusionFilter>,
    },
    Rule(Rule),
}

/// Remove everything from the first `#` and trim the rest.
pub fn strip_comment(line: &str) -> &str {
    let line = match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    };
    line.trim()
}

/// Parse a domain list from text. `name` is the list name used both as the
/// list identifier and in error messages.
pub fn parse_list(name: &str, text: &str) -> Result<ListInfo> {
    let mut list = ListInfo::new(name);

    for (line_num, line) in text.lines().enumerate() {
        let line_num = line_num + 1; // 1-based line numbers

        let line = strip_comment(line);
        if line.is_empty() {
            continue;
        }

        match parse_line(line, name, line_num)? {
            ParsedLine::Include { target, filters } => list.add_inclusion(&target, filters),
            ParsedLine::Rule(rule) => list.classify(rule),
        }
    }

    Ok(list)
}

/// Parse a domain list file. The list is named after the file's base name,
/// upper-cased.
pub fn parse_list_file(path: impl AsRef<Path>) -> Result<ListInfo> {
    let path = path.as_ref();
    let name = list_name(path);
    let text = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
    parse_list(&name, &text).map_err(|e| match e {
        BuildError::ParseErrorAtLine { line, message, .. } => BuildError::ParseErrorAtLine {
            file: path.display().to_string(),
            line,
            message,
        },
        other => other,
    })
}

/// Upper-cased base name of a list file
pub fn list_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_uppercase())
        .unwrap_or_default()
}

/// Parse a single comment-stripped, non-blank line
pub fn parse_line(line: &str, file: &str, line_num: usize) -> Result<ParsedLine> {
    let error = |message: String| BuildError::ParseErrorAtLine {
        file: file.to_string(),
        line: line_num,
        message,
    };

    if let Some(inclusion) = line.strip_prefix("include:") {
        return parse_inclusion(inclusion).map_err(error);
    }

    let mut tokens = line.split_whitespace();
    let head = tokens
        .next()
        .ok_or_else(|| error("Empty rule".to_string()))?;

    let (kind, value) = match head.split_once(':') {
        Some((prefix, value)) => {
            let kind = RuleKind::from_prefix(prefix.trim())
                .ok_or_else(|| error(format!("Unknown domain type: {}", prefix)))?;
            (kind, value.trim())
        }
        None => (RuleKind::Domain, head),
    };

    // Empty keywords are dropped at export, every other type needs a value
    if value.is_empty() && kind != RuleKind::Keyword {
        return Err(error(format!("Empty value for {} rule", kind.prefix())));
    }

    if kind == RuleKind::Regex {
        regex::Regex::new(value).map_err(|e| error(format!("Invalid regexp {}: {}", value, e)))?;
    }

    let mut rule = Rule::new(kind, value);
    for token in tokens {
        let key = token
            .strip_prefix('@')
            .ok_or_else(|| error(format!("Invalid attribute: {}", token)))?;
        if key.is_empty() {
            return Err(error(format!("Empty attribute: {}", token)));
        }
        rule = rule.with_attribute(key);
    }

    Ok(ParsedLine::Rule(rule))
}

/// Parse the part after `include:`, e.g. `google @cn @ads` or `google@cn`
fn parse_inclusion(inclusion: &str) -> std::result::Result<ParsedLine, String> {
    let mut parts = inclusion.split('@');
    let target = parts.next().unwrap_or_default().trim().to_uppercase();
    if target.is_empty() {
        return Err("Empty include target".to_string());
    }

    let mut filters: Vec<InclusionFilter> = parts
        .map(|attr| attr.trim().to_lowercase())
        .filter(|attr| !attr.is_empty())
        .map(InclusionFilter::Attribute)
        .collect();
    if filters.is_empty() {
        filters.push(InclusionFilter::All);
    }

    Ok(ParsedLine::Include { target, filters })
}
