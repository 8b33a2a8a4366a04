use std::collections::HashMap;

/// Node of a [`DomainTrie`]
#[derive(Debug, Default)]
struct Node {
    /// A recorded domain ends here
    terminal: bool,
    children: HashMap<String, Node>,
}

/// Label trie used to drop domains already covered by a parent domain.
///
/// Domains are stored by labels read right to left, so `www.google.com`
/// lives at `com -> google -> www`. A terminal node covers every path below
/// it. Callers must insert the most general domains first (fewest labels)
/// for the trie to keep only the covering set.
#[derive(Debug, Default)]
pub struct DomainTrie {
    root: Node,
}

/// Inserting an empty domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyDomain;

impl DomainTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a domain. Returns `false` when the domain, or one of its parent
    /// domains, is already recorded.
    pub fn insert(&mut self, domain: &str) -> Result<bool, EmptyDomain> {
        if domain.is_empty() {
            return Err(EmptyDomain);
        }

        let mut node = &mut self.root;
        for label in domain.rsplit('.') {
            if node.terminal {
                return Ok(false);
            }
            node = node.children.entry(label.to_string()).or_default();
        }

        if node.terminal {
            return Ok(false);
        }
        node.terminal = true;
        Ok(true)
    }

    /// Whether `domain` or a parent domain of it has been recorded
    #[cfg(test)]
    fn covers(&self, domain: &str) -> bool {
        let mut node = &self.root;
        for label in domain.rsplit('.') {
            if node.terminal {
                return true;
            }
            match node.children.get(label) {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.terminal
    }
}
