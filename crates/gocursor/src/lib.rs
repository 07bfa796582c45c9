// lib.rs - Cursor context resolution for Go source.
//
// Given a document and a byte offset, parses it with tree-sitter, builds the
// chain of nodes enclosing the cursor and classifies the position into a set
// of scopes. The `gocursor` binary and benches/tests build on this crate.

pub mod cache;
pub mod classify;
pub mod cli;
pub mod comments;
pub mod config;
pub mod context;
pub mod doc;
pub mod node;
pub mod parser_pool;
pub mod perf;
pub mod position;
pub mod resolver;
pub mod scope;
pub mod source;
pub mod stack;
// test_utils is available in test builds and when the `test-support` feature is enabled.
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use cache::{CacheStats, MemoCache, MemoStore};
pub use config::ResolverConfig;
pub use context::{ContextSummary, CursorContext};
pub use doc::DocAssociation;
pub use node::{NodeKind, SyntaxNode, TextRange};
pub use resolver::{Resolver, View, ViewId};
pub use scope::ScopeSet;
pub use source::{ContentHash, ParseMode, ParsedSource, NIL_PACKAGE_NAME};
pub use stack::NodeStack;
