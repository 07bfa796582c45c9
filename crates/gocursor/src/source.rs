//
// source.rs
//
// Parsed Go sources: content hashing, tolerant parsing, the shared empty
// sentinel and non-fatal diagnostics.
//

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tree_sitter::{Node, Tree};

use crate::comments::CommentIndex;
use crate::node::{is_bad, is_keyword, node_text, TextRange};
use crate::parser_pool;

/// Package name used when a file has no usable package clause.
pub const NIL_PACKAGE_NAME: &str = "_";

/// Always-valid package clause appended in permissive mode and parsed on its
/// own for the sentinel tree.
pub const NIL_PACKAGE_SRC: &str = "\n\npackage _\n";

/// Hash of the exact source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ContentHash(pub u64);

impl ContentHash {
    pub fn of(src: &[u8]) -> Self {
        let mut hasher = DefaultHasher::new();
        src.hash(&mut hasher);
        Self(hasher.finish())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ParseMode {
    /// Parse the bytes as given.
    Strict,
    /// Append [`NIL_PACKAGE_SRC`] first so a file without a usable package
    /// clause still yields a well-formed tree for comment detection.
    Permissive,
}

/// The file's `package` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageClause {
    pub name: String,
    pub range: TextRange,
    pub name_range: TextRange,
    pub start_row: usize,
}

/// A non-fatal syntax problem found while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub range: TextRange,
    pub message: String,
}

/// A parsed source buffer. Immutable once built and shared through `Arc`.
pub struct ParsedSource {
    hash: ContentHash,
    mode: ParseMode,
    /// Bytes that were actually parsed (including the permissive suffix)
    text: Arc<[u8]>,
    tree: Tree,
    package: Option<PackageClause>,
    comments: CommentIndex,
    diagnostics: Vec<Diagnostic>,
    is_sentinel: bool,
}

impl fmt::Debug for ParsedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedSource")
            .field("hash", &self.hash)
            .field("mode", &self.mode)
            .field("len", &self.text.len())
            .field("package", &self.package)
            .field("is_sentinel", &self.is_sentinel)
            .finish_non_exhaustive()
    }
}

impl ParsedSource {
    /// Hash of the caller's bytes (before any permissive suffix).
    pub fn hash(&self) -> ContentHash {
        self.hash
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    pub fn text(&self) -> &[u8] {
        &self.text
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn package(&self) -> Option<&PackageClause> {
        self.package.as_ref()
    }

    /// True when a package clause with a non-empty name exists. The
    /// placeholder `_` still counts as structurally valid.
    pub fn has_valid_package(&self) -> bool {
        self.package.as_ref().is_some_and(|p| !p.name.is_empty())
    }

    /// Declared package name, or [`NIL_PACKAGE_NAME`].
    pub fn package_name(&self) -> &str {
        match &self.package {
            Some(p) if !p.name.is_empty() => &p.name,
            _ => NIL_PACKAGE_NAME,
        }
    }

    pub fn comments(&self) -> &CommentIndex {
        &self.comments
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Whether this is the shared empty sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.is_sentinel
    }
}

static NIL_SOURCE: OnceLock<Arc<ParsedSource>> = OnceLock::new();

/// The shared sentinel: a lone `package _` with no other content.
pub fn nil_source() -> Arc<ParsedSource> {
    NIL_SOURCE
        .get_or_init(|| {
            let text: Arc<[u8]> = Arc::from(NIL_PACKAGE_SRC.as_bytes());
            let tree = parser_pool::with_parser(|parser| parser.parse(&text, None))
                .expect("sentinel package source must parse");
            let len = text.len();
            let mut parsed = build(ContentHash::of(&[]), ParseMode::Strict, text, len, tree);
            parsed.is_sentinel = true;
            Arc::new(parsed)
        })
        .clone()
}

/// Whether `src` contains anything that looks like a comment.
pub fn has_comments(src: &[u8]) -> bool {
    src.windows(2).any(|w| w == b"//" || w == b"/*")
}

/// Parse `src` in the given mode. Never fails: when no tree can be produced
/// the shared sentinel is returned.
pub fn parse(src: &[u8], mode: ParseMode) -> Arc<ParsedSource> {
    if src.is_empty() {
        return nil_source();
    }

    let hash = ContentHash::of(src);
    let text: Arc<[u8]> = match mode {
        ParseMode::Strict => Arc::from(src),
        ParseMode::Permissive => {
            let mut buf = Vec::with_capacity(src.len() + NIL_PACKAGE_SRC.len());
            buf.extend_from_slice(src);
            buf.extend_from_slice(NIL_PACKAGE_SRC.as_bytes());
            Arc::from(buf)
        }
    };

    let Some(tree) = parser_pool::with_parser(|parser| parser.parse(&text, None)) else {
        log::warn!("tree-sitter produced no tree for {} ({:?}); using sentinel", hash, mode);
        return nil_source();
    };

    let parsed = build(hash, mode, text, src.len(), tree);
    log::trace!(
        "Parsed {} ({:?}): package={:?}, {} comment groups, {} diagnostics",
        hash,
        mode,
        parsed.package.as_ref().map(|p| p.name.as_str()),
        parsed.comments.groups().len(),
        parsed.diagnostics.len()
    );
    Arc::new(parsed)
}

/// Load the bytes to analyse. When `src` is empty and a filename is given the
/// file is read instead; a failed or empty read is reported and an empty
/// buffer returned.
pub fn load_bytes(src: &[u8], filename: Option<&Path>) -> Arc<[u8]> {
    if !src.is_empty() {
        return Arc::from(src);
    }
    let Some(path) = filename else {
        return Arc::from(src);
    };
    match std::fs::read(path) {
        Ok(bytes) => {
            if bytes.is_empty() {
                log::info!("Fallback read of {} returned no bytes", path.display());
            }
            Arc::from(bytes)
        }
        Err(e) => {
            log::info!("Fallback read of {} failed: {}", path.display(), e);
            Arc::from(src)
        }
    }
}

/// `src_len` is the length of the caller's bytes within `text`.
fn build(
    hash: ContentHash,
    mode: ParseMode,
    text: Arc<[u8]>,
    src_len: usize,
    tree: Tree,
) -> ParsedSource {
    let root = tree.root_node();
    let package = find_package(root, &text, src_len);
    let comments = CommentIndex::build(root, &text);
    let diagnostics = if root.has_error() {
        collect_diagnostics(root)
    } else {
        Vec::new()
    };
    ParsedSource {
        hash,
        mode,
        package,
        comments,
        diagnostics,
        is_sentinel: false,
        text,
        tree,
    }
}

/// The first package clause, if its name is a real identifier from the
/// caller's bytes. A clause left unterminated in permissive mode can swallow
/// the appended `package` keyword as its name; that counts as no clause.
fn find_package(root: Node<'_>, src: &[u8], src_len: usize) -> Option<PackageClause> {
    let mut cursor = root.walk();
    let clause = root
        .named_children(&mut cursor)
        .find(|n| n.kind() == "package_clause")?;

    let mut cursor = clause.walk();
    let name = clause
        .named_children(&mut cursor)
        .find(|n| n.kind() == "package_identifier" && !is_bad(*n))?;

    let text = node_text(name, src);
    if name.start_byte() >= src_len || text.is_empty() || is_keyword(text) {
        log::debug!("Ignoring unusable package name {:?}", text);
        return None;
    }

    Some(PackageClause {
        name: text.to_string(),
        range: clause.into(),
        name_range: name.into(),
        start_row: clause.start_position().row,
    })
}

fn collect_diagnostics(root: Node<'_>) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_missing() {
            out.push(Diagnostic {
                range: node.into(),
                message: format!("missing `{}`", node.kind()),
            });
            continue;
        }
        if node.is_error() {
            out.push(Diagnostic {
                range: node.into(),
                message: "syntax error".to_string(),
            });
        }
        if node.has_error() {
            let mut cursor = node.walk();
            stack.extend(node.children(&mut cursor));
        }
    }
    out.sort_by_key(|d| (d.range.start, d.range.end));
    out
}
