use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use tracing::{debug, info, warn};

use super::list::ListInfo;
use crate::dat::geodat;
use crate::error::{BuildError, Result};
use crate::parser::parse_list_file;
use crate::walk::walk_files;

/// All domain lists of a data directory, keyed by list name.
#[derive(Debug, Default)]
pub struct ListRegistry {
    lists: BTreeMap<String, ListInfo>,
}

impl ListRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every file under `dir` (recursively) into a list.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        info!("Using domain list files in '{}'", dir.display());

        let mut registry = Self::new();
        for path in walk_files(dir)? {
            let list = parse_list_file(&path)?;
            debug!("Parsed list {} from '{}'", list.name, path.display());
            registry.insert(list);
        }
        Ok(registry)
    }

    /// Add a list, replacing any list of the same name.
    pub fn insert(&mut self, list: ListInfo) {
        if let Some(old) = self.lists.insert(list.name.clone(), list) {
            warn!("List {} defined more than once, keeping the last one", old.name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&ListInfo> {
        self.lists.get(name)
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ListInfo> {
        self.lists.values()
    }

    /// Group lists into levels so that every list comes after all lists it
    /// includes. Level 0 holds the lists without inclusions.
    pub fn inclusion_levels(&self) -> Result<Vec<Vec<String>>> {
        let mut pending: HashMap<&str, usize> = HashMap::with_capacity(self.lists.len());
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for list in self.lists.values() {
            let mut count = 0;
            for target in list.inclusion_targets() {
                if !self.lists.contains_key(target) {
                    return Err(BuildError::UnknownInclude {
                        list: list.name.clone(),
                        target: target.to_string(),
                    });
                }
                dependents.entry(target).or_default().push(&list.name);
                count += 1;
            }
            pending.insert(&list.name, count);
        }

        let mut frontier: Vec<&str> = pending
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(name, _)| *name)
            .collect();
        frontier.sort_unstable();

        let mut levels = Vec::new();
        let mut leveled = 0;
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for name in &frontier {
                for dependent in dependents.get(name).into_iter().flatten() {
                    if let Some(count) = pending.get_mut(dependent) {
                        *count -= 1;
                        if *count == 0 {
                            next.push(*dependent);
                        }
                    }
                }
            }
            next.sort_unstable();

            leveled += frontier.len();
            levels.push(frontier.iter().map(|n| n.to_string()).collect());
            frontier = next;
        }

        if leveled < self.lists.len() {
            let stuck: BTreeSet<String> = pending
                .into_iter()
                .filter(|(_, count)| *count > 0)
                .map(|(name, _)| name.to_string())
                .collect();
            return Err(BuildError::InclusionCycle(stuck.into_iter().collect()));
        }

        Ok(levels)
    }

    /// Flatten every list's inclusions in dependency order, then deduplicate
    /// its domain rules.
    pub fn resolve(&mut self) -> Result<()> {
        let levels = self.inclusion_levels()?;

        for (idx, level) in levels.iter().enumerate() {
            debug!("Inclusion level {}: {:?}", idx + 1, level);
            for name in level {
                let Some(mut list) = self.lists.remove(name) else {
                    continue;
                };
                let flattened = list
                    .flatten(|target| self.lists.get(target))
                    .and_then(|_| list.dedup_domains());
                self.lists.insert(name.clone(), list);
                flattened?;
            }
        }

        Ok(())
    }

    /// Export every list, ordered by name. `exclude_attrs` maps a list name
    /// to the attribute keys whose rules are left out of that list.
    pub fn to_geosite_list(
        &self,
        exclude_attrs: &BTreeMap<String, BTreeSet<String>>,
    ) -> geodat::GeoSiteList {
        let entry = self
            .lists
            .values()
            .map(|list| {
                let rules = list.to_rules(exclude_attrs.get(&list.name));
                geodat::GeoSite {
                    country_code: list.name.clone(),
                    domain: rules.iter().map(geodat::Domain::from).collect(),
                }
            })
            .collect();

        geodat::GeoSiteList { entry }
    }
}
