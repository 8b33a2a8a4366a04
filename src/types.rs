use std::fmt;

/// Domain rule type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Exact domain match
    Full,
    /// Domain and all of its subdomains
    Domain,
    /// Substring match
    Keyword,
    /// Regular expression match
    Regex,
}

impl RuleKind {
    /// Parse a rule type prefix such as `full` or `regexp`.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.to_lowercase().as_str() {
            "full" => Some(RuleKind::Full),
            "domain" => Some(RuleKind::Domain),
            "keyword" => Some(RuleKind::Keyword),
            "regexp" => Some(RuleKind::Regex),
            _ => None,
        }
    }

    /// Prefix used in list files
    pub fn prefix(self) -> &'static str {
        match self {
            RuleKind::Full => "full",
            RuleKind::Domain => "domain",
            RuleKind::Keyword => "keyword",
            RuleKind::Regex => "regexp",
        }
    }
}

/// A single routing rule from a domain list file.
///
/// Attributes are stored without the leading `@`, lower-cased, in the order
/// they were written. An empty attribute list means a plain rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub kind: RuleKind,
    pub value: String,
    pub attributes: Vec<String>,
}

impl Rule {
    /// Create a rule, lower-casing the value unless it is a regex.
    pub fn new(kind: RuleKind, value: &str) -> Self {
        let value = match kind {
            RuleKind::Regex => value.to_string(),
            _ => value.to_lowercase(),
        };
        Self {
            kind,
            value,
            attributes: Vec::new(),
        }
    }

    pub fn full(value: &str) -> Self {
        Self::new(RuleKind::Full, value)
    }

    pub fn domain(value: &str) -> Self {
        Self::new(RuleKind::Domain, value)
    }

    pub fn keyword(value: &str) -> Self {
        Self::new(RuleKind::Keyword, value)
    }

    pub fn regex(value: &str) -> Self {
        Self::new(RuleKind::Regex, value)
    }

    /// Add an attribute; repeated keys are kept once.
    pub fn with_attribute(mut self, key: &str) -> Self {
        let key = key.to_lowercase();
        if !self.attributes.contains(&key) {
            self.attributes.push(key);
        }
        self
    }

    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.iter().any(|a| a == key)
    }

    /// Group key made of every attribute joined in order, e.g. `@cn@ads`.
    pub fn attribute_key(&self) -> String {
        self.attributes.iter().map(|a| format!("@{}", a)).collect()
    }

    /// Number of dot-separated labels in the value.
    pub fn label_count(&self) -> usize {
        self.value.split('.').count()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.prefix(), self.value)?;
        for attr in &self.attributes {
            write!(f, " @{}", attr)?;
        }
        Ok(())
    }
}

/// What an `include:` directive asks for from the target list
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InclusionFilter {
    /// Every rule, with or without attributes
    All,
    /// Only rules carrying this attribute key
    Attribute(String),
}
