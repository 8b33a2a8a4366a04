//! Domain list side: per-file rule buckets, inclusion resolution and
//! domain deduplication.

mod list;
mod registry;
mod trie;

pub use list::ListInfo;
pub use registry::ListRegistry;
pub use trie::{DomainTrie, EmptyDomain};
