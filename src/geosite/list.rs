use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::trie::DomainTrie;
use crate::error::{BuildError, Result};
use crate::types::{InclusionFilter, Rule, RuleKind};

/// Parsed state of one domain list file.
///
/// Plain rules are kept in one bucket per type; rules carrying attributes are
/// kept apart, both as a flat list and grouped by their joined attribute key
/// (`@cn@ads`). Inclusion merges append to these buckets, after which
/// [`ListInfo::dedup_domains`] fills `unique_domain`.
#[derive(Debug, Clone, Default)]
pub struct ListInfo {
    /// Upper-cased list name, e.g. `CN`
    pub name: String,
    /// Set when the file contained at least one `include:` line
    pub has_inclusion: bool,
    /// Included list name -> requested filters, in file order
    pub inclusions: BTreeMap<String, Vec<InclusionFilter>>,
    pub full: Vec<Rule>,
    pub keyword: Vec<Rule>,
    pub regex: Vec<Rule>,
    /// Domain rules before deduplication
    pub domain: Vec<Rule>,
    /// Domain rules after deduplication
    pub unique_domain: Vec<Rule>,
    /// Every rule carrying attributes
    pub attribute_rules: Vec<Rule>,
    /// Attribute rules grouped by [`Rule::attribute_key`]
    pub attribute_groups: BTreeMap<String, Vec<Rule>>,
}

impl ListInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_uppercase(),
            ..Default::default()
        }
    }

    /// Record an `include:` directive. Filters for the same target accumulate.
    pub fn add_inclusion(&mut self, target: &str, filters: Vec<InclusionFilter>) {
        self.has_inclusion = true;
        let wanted = self.inclusions.entry(target.to_uppercase()).or_default();
        for filter in filters {
            if !wanted.contains(&filter) {
                wanted.push(filter);
            }
        }
    }

    /// Put a rule into its bucket. Attribute rules go to the attribute
    /// buckets whatever their type.
    pub fn classify(&mut self, rule: Rule) {
        if rule.has_attributes() {
            self.attribute_groups
                .entry(rule.attribute_key())
                .or_default()
                .push(rule.clone());
            self.attribute_rules.push(rule);
            return;
        }

        match rule.kind {
            RuleKind::Full => self.full.push(rule),
            RuleKind::Domain => self.domain.push(rule),
            RuleKind::Keyword => self.keyword.push(rule),
            RuleKind::Regex => self.regex.push(rule),
        }
    }

    /// Names of the lists this list includes
    pub fn inclusion_targets(&self) -> impl Iterator<Item = &str> {
        self.inclusions.keys().map(String::as_str)
    }

    /// Merge the requested rules of every included list into this one.
    ///
    /// `lookup` returns an already flattened list by name; a missing target is
    /// an [`BuildError::UnknownInclude`].
    pub fn flatten<'a, F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<&'a ListInfo>,
    {
        let inclusions = std::mem::take(&mut self.inclusions);

        for (target, filters) in &inclusions {
            let included = lookup(target.as_str()).ok_or_else(|| BuildError::UnknownInclude {
                list: self.name.clone(),
                target: target.clone(),
            })?;

            if filters.contains(&InclusionFilter::All) {
                debug!("{}: including all rules of {}", self.name, target);
                self.merge_all(included);
                continue;
            }

            let wanted: BTreeSet<&str> = filters
                .iter()
                .filter_map(|f| match f {
                    InclusionFilter::Attribute(key) => Some(key.as_str()),
                    InclusionFilter::All => None,
                })
                .collect();
            debug!("{}: including {:?} rules of {}", self.name, wanted, target);
            self.merge_attributes(included, &wanted);
        }

        self.inclusions = inclusions;
        Ok(())
    }

    fn merge_all(&mut self, included: &ListInfo) {
        self.full.extend(included.full.iter().cloned());
        self.domain.extend(included.domain.iter().cloned());
        self.keyword.extend(included.keyword.iter().cloned());
        self.regex.extend(included.regex.iter().cloned());

        self.attribute_rules
            .extend(included.attribute_rules.iter().cloned());
        for (key, rules) in &included.attribute_groups {
            self.attribute_groups
                .entry(key.clone())
                .or_default()
                .extend(rules.iter().cloned());
        }
    }

    /// Merge every attribute group that carries at least one wanted key.
    /// Groups are keyed by the full conjunction but matched per key.
    fn merge_attributes(&mut self, included: &ListInfo, wanted: &BTreeSet<&str>) {
        for (key, rules) in &included.attribute_groups {
            let selected = key
                .split('@')
                .filter(|k| !k.is_empty())
                .any(|k| wanted.contains(k));
            if !selected {
                continue;
            }
            self.attribute_groups
                .entry(key.clone())
                .or_default()
                .extend(rules.iter().cloned());
            self.attribute_rules.extend(rules.iter().cloned());
        }
    }

    /// Sort domain rules most general first and keep the covering set.
    pub fn dedup_domains(&mut self) -> Result<()> {
        self.domain.sort_by_key(Rule::label_count);

        let mut trie = DomainTrie::new();
        let mut unique = Vec::with_capacity(self.domain.len());
        for rule in &self.domain {
            let inserted = trie
                .insert(&rule.value)
                .map_err(|_| BuildError::EmptyDomain(self.name.clone()))?;
            if inserted {
                unique.push(rule.clone());
            }
        }

        debug!(
            "{}: {} domain rules, {} after dedup",
            self.name,
            self.domain.len(),
            unique.len()
        );
        self.unique_domain = unique;
        Ok(())
    }

    /// Final rule sequence for this list: full, deduplicated domain, regex,
    /// non-empty keyword, then attribute rules. An attribute rule is dropped
    /// when any of its keys is in `excluded`.
    pub fn to_rules(&self, excluded: Option<&BTreeSet<String>>) -> Vec<Rule> {
        let mut rules = Vec::with_capacity(
            self.full.len()
                + self.unique_domain.len()
                + self.regex.len()
                + self.keyword.len()
                + self.attribute_rules.len(),
        );

        rules.extend(self.full.iter().cloned());
        rules.extend(self.unique_domain.iter().cloned());
        rules.extend(self.regex.iter().cloned());
        rules.extend(
            self.keyword
                .iter()
                .filter(|r| !r.value.trim().is_empty())
                .cloned(),
        );

        match excluded {
            Some(excluded) if !excluded.is_empty() => rules.extend(
                self.attribute_rules
                    .iter()
                    .filter(|r| !r.attributes.iter().any(|a| excluded.contains(a)))
                    .cloned(),
            ),
            _ => rules.extend(self.attribute_rules.iter().cloned()),
        }

        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::collections::HashMap;

    fn flatten_with(list: &mut ListInfo, others: &[&ListInfo]) -> Result<()> {
        let map: HashMap<&str, &ListInfo> = others.iter().map(|l| (l.name.as_str(), *l)).collect();
        list.flatten(|name| map.get(name).copied())
    }

    fn google() -> ListInfo {
        let mut list = ListInfo::new("google");
        list.classify(Rule::full("www.google.com"));
        list.classify(Rule::domain("google.com"));
        list.classify(Rule::keyword("google"));
        list.classify(Rule::regex(r"^g\d\.google\.com$"));
        list.classify(Rule::full("ads.google.com").with_attribute("ads"));
        list.classify(Rule::domain("google.cn").with_attribute("cn"));
        list.classify(
            Rule::domain("doubleclick.cn")
                .with_attribute("cn")
                .with_attribute("ads"),
        );
        list
    }

    #[test]
    fn test_classify_buckets() {
        let list = google();
        assert_eq!(list.name, "GOOGLE");
        assert_eq!(list.full.len(), 1);
        assert_eq!(list.domain.len(), 1);
        assert_eq!(list.keyword.len(), 1);
        assert_eq!(list.regex.len(), 1);
        assert_eq!(list.attribute_rules.len(), 3);
        let keys: Vec<&str> = list.attribute_groups.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["@ads", "@cn", "@cn@ads"]);
    }

    #[test]
    fn test_inclusion_filters_accumulate() {
        let mut list = ListInfo::new("cn");
        list.add_inclusion("google", vec![InclusionFilter::Attribute("cn".into())]);
        list.add_inclusion("GOOGLE", vec![InclusionFilter::Attribute("ads".into())]);
        assert!(list.has_inclusion);
        assert_eq!(
            list.inclusions.get("GOOGLE"),
            Some(&vec![
                InclusionFilter::Attribute("cn".into()),
                InclusionFilter::Attribute("ads".into())
            ])
        );
    }

    #[test]
    fn test_flatten_wildcard_copies_everything() {
        let google = google();
        let mut cn = ListInfo::new("CN");
        cn.classify(Rule::domain("baidu.com"));
        cn.add_inclusion("GOOGLE", vec![InclusionFilter::All]);

        flatten_with(&mut cn, &[&google]).unwrap();

        for rule in &google.full {
            assert!(cn.full.contains(rule));
        }
        for rule in &google.domain {
            assert!(cn.domain.contains(rule));
        }
        for rule in &google.keyword {
            assert!(cn.keyword.contains(rule));
        }
        for rule in &google.regex {
            assert!(cn.regex.contains(rule));
        }
        assert_eq!(cn.attribute_rules.len(), 3);
        assert_eq!(cn.attribute_groups.len(), 3);
        assert_eq!(cn.domain.len(), 2);
    }

    #[test]
    fn test_flatten_attribute_filter_matches_per_key() {
        let google = google();
        let mut cn = ListInfo::new("CN");
        cn.add_inclusion("GOOGLE", vec![InclusionFilter::Attribute("ads".into())]);

        flatten_with(&mut cn, &[&google]).unwrap();

        let values: Vec<&str> = cn.attribute_rules.iter().map(|r| r.value.as_str()).collect();
        assert!(values.contains(&"ads.google.com"));
        // Tagged @cn@ads, selected by its @ads key
        assert!(values.contains(&"doubleclick.cn"));
        // Tagged only @cn
        assert!(!values.contains(&"google.cn"));
        // Plain rules are not included by an attribute filter
        assert!(cn.full.is_empty());
        assert!(cn.domain.is_empty());
    }

    #[test]
    fn test_attribute_order_makes_separate_groups() {
        let mut google = ListInfo::new("google");
        google.classify(
            Rule::domain("a.google.cn")
                .with_attribute("cn")
                .with_attribute("ads"),
        );
        google.classify(
            Rule::domain("b.google.cn")
                .with_attribute("ads")
                .with_attribute("cn"),
        );
        google.classify(Rule::domain("c.google.cn").with_attribute("cn"));
        let keys: Vec<&str> = google.attribute_groups.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["@ads@cn", "@cn", "@cn@ads"]);

        let mut cn = ListInfo::new("CN");
        cn.add_inclusion("GOOGLE", vec![InclusionFilter::Attribute("ads".into())]);
        flatten_with(&mut cn, &[&google]).unwrap();

        let mut values: Vec<&str> = cn.attribute_rules.iter().map(|r| r.value.as_str()).collect();
        values.sort_unstable();
        assert_eq!(values, vec!["a.google.cn", "b.google.cn"]);
        assert_eq!(cn.attribute_groups.len(), 2);
    }

    #[test]
    fn test_flatten_multi_filter_selects_group_once() {
        let google = google();
        let mut cn = ListInfo::new("CN");
        cn.add_inclusion(
            "GOOGLE",
            vec![
                InclusionFilter::Attribute("cn".into()),
                InclusionFilter::Attribute("ads".into()),
            ],
        );

        flatten_with(&mut cn, &[&google]).unwrap();
        assert_eq!(cn.attribute_rules.len(), 3);
    }

    #[test]
    fn test_flatten_unknown_target() {
        let mut cn = ListInfo::new("CN");
        cn.add_inclusion("NONEXISTENT", vec![InclusionFilter::All]);
        let err = flatten_with(&mut cn, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
        match err {
            BuildError::UnknownInclude { list, target } => {
                assert_eq!(list, "CN");
                assert_eq!(target, "NONEXISTENT");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_dedup_domains() {
        let mut list = ListInfo::new("CN");
        list.classify(Rule::domain("www.google.com"));
        list.classify(Rule::domain("baidu.com"));
        list.classify(Rule::domain("google.com"));
        list.classify(Rule::domain("baidu.com"));
        list.classify(Rule::domain("map.baidu.com"));
        list.dedup_domains().unwrap();

        let values: Vec<&str> = list.unique_domain.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, vec!["baidu.com", "google.com"]);
    }

    #[test]
    fn test_dedup_empty_domain_is_error() {
        let mut list = ListInfo::new("CN");
        list.classify(Rule::domain(""));
        let err = list.dedup_domains().unwrap_err();
        assert!(matches!(err, BuildError::EmptyDomain(ref name) if name == "CN"));
    }

    #[test]
    fn test_to_rules_order() {
        let mut list = ListInfo::new("X");
        list.classify(Rule::keyword("kw"));
        list.classify(Rule::keyword(""));
        list.classify(Rule::regex("^re$"));
        list.classify(Rule::domain("a.com").with_attribute("ads"));
        list.classify(Rule::domain("b.com"));
        list.classify(Rule::full("c.com"));
        list.dedup_domains().unwrap();

        let rules = list.to_rules(None);
        let rendered: Vec<String> = rules.iter().map(Rule::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "full:c.com",
                "domain:b.com",
                "regexp:^re$",
                "keyword:kw",
                "domain:a.com @ads",
            ]
        );
    }

    #[test]
    fn test_to_rules_excludes_attributes() {
        let mut list = google();
        list.dedup_domains().unwrap();
        let excluded: BTreeSet<String> = ["ads".to_string()].into_iter().collect();

        let rules = list.to_rules(Some(&excluded));
        for rule in rules.iter().filter(|r| r.has_attributes()) {
            assert!(!rule.has_attribute("ads"), "{} should be excluded", rule);
        }
        assert!(rules.iter().any(|r| r.value == "google.cn"));

        // Without exclusions every attribute rule is kept
        let rules = list.to_rules(None);
        assert_eq!(rules.iter().filter(|r| r.has_attributes()).count(), 3);
    }
}
