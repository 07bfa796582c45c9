//
// config.rs
//
// Resolver configuration
//

/// Cache sizing for a [`crate::Resolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Parsed sources kept per (content hash, parse mode)
    pub max_parse_entries: usize,
    /// Resolved contexts kept per (content hash, position)
    pub max_context_entries: usize,
    /// Resolved contexts kept per view identity
    pub max_view_entries: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_parse_entries: 64,
            max_context_entries: 4096,
            max_view_entries: 256,
        }
    }
}

impl ResolverConfig {
    /// A configuration whose caches all hold `n` entries.
    pub fn uniform(n: usize) -> Self {
        Self {
            max_parse_entries: n,
            max_context_entries: n,
            max_view_entries: n,
        }
    }
}
