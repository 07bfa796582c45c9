//
// resolver.rs
//
// Memoized entry point: parse caching, the permissive retry, and context
// caching by content and by view identity.
//

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::cache::{CacheStats, MemoCache, MemoStore};
use crate::config::ResolverConfig;
use crate::context::{is_test_filename, CursorContext};
use crate::perf::{self, TimingGuard};
use crate::source::{self, ContentHash, ParseMode, ParsedSource};

pub type ParseKey = (ContentHash, ParseMode);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextKey {
    pub hash: ContentHash,
    /// Raw, un-normalized position
    pub pos: usize,
    /// The filename marks a test file
    pub test_filename: bool,
}

/// Identity of a [`View`]; never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ViewId(u64);

static NEXT_VIEW_ID: AtomicU64 = AtomicU64::new(1);

impl ViewId {
    fn next() -> Self {
        Self(NEXT_VIEW_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// An immutable editor snapshot: document bytes plus cursor.
#[derive(Debug, Clone)]
pub struct View {
    id: ViewId,
    name: String,
    path: Option<PathBuf>,
    src: Arc<[u8]>,
    pos: usize,
}

impl View {
    pub fn new(
        name: impl Into<String>,
        path: Option<PathBuf>,
        src: impl Into<Arc<[u8]>>,
        pos: usize,
    ) -> Self {
        Self {
            id: ViewId::next(),
            name: name.into(),
            path,
            src: src.into(),
            pos,
        }
    }

    /// A new snapshot of the same document with the cursor moved.
    pub fn with_position(&self, pos: usize) -> Self {
        Self {
            id: ViewId::next(),
            pos,
            ..self.clone()
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn src(&self) -> &[u8] {
        &self.src
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Path used for test-file detection and the fallback read.
    fn filename(&self) -> Option<&Path> {
        self.path().or_else(|| {
            if self.name.is_empty() {
                None
            } else {
                Some(Path::new(&self.name))
            }
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    pub parses: CacheStats,
    pub contexts: CacheStats,
    pub views: CacheStats,
}

/// Resolves cursor contexts, memoizing parses and results.
///
/// Safe to share across threads; concurrent requests for the same key
/// compute once and share the result.
pub struct Resolver {
    config: ResolverConfig,
    parses: Box<dyn MemoStore<ParseKey, Arc<ParsedSource>>>,
    contexts: Box<dyn MemoStore<ContextKey, Arc<CursorContext>>>,
    views: Box<dyn MemoStore<ViewId, Arc<CursorContext>>>,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    pub fn with_config(config: ResolverConfig) -> Self {
        Self {
            parses: Box::new(MemoCache::new(config.max_parse_entries)),
            contexts: Box::new(MemoCache::new(config.max_context_entries)),
            views: Box::new(MemoCache::new(config.max_view_entries)),
            config,
        }
    }

    /// Use host-supplied stores instead of the default caches.
    pub fn with_stores(
        config: ResolverConfig,
        parses: Box<dyn MemoStore<ParseKey, Arc<ParsedSource>>>,
        contexts: Box<dyn MemoStore<ContextKey, Arc<CursorContext>>>,
        views: Box<dyn MemoStore<ViewId, Arc<CursorContext>>>,
    ) -> Self {
        Self {
            config,
            parses,
            contexts,
            views,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Parse `src` in `mode`, memoized by (content hash, mode).
    pub fn parse_with_mode(&self, src: &[u8], mode: ParseMode) -> Arc<ParsedSource> {
        if src.is_empty() {
            return source::nil_source();
        }
        let key = (ContentHash::of(src), mode);
        self.parses.get_or_compute(key, &mut || {
            let _guard = TimingGuard::with_threshold("parse", 50);
            perf::increment_parses();
            source::parse(src, mode)
        })
    }

    /// Parse `src` strictly, retrying in permissive mode when the package
    /// clause is unusable but the source has comments worth keeping.
    pub fn parse(&self, src: &[u8]) -> Arc<ParsedSource> {
        let parsed = self.parse_with_mode(src, ParseMode::Strict);
        if parsed.has_valid_package() || !source::has_comments(src) {
            return parsed;
        }
        log::debug!(
            "No usable package clause in {}; reparsing permissively",
            parsed.hash()
        );
        self.parse_with_mode(src, ParseMode::Permissive)
    }

    /// Resolve the context at `pos`.
    ///
    /// When `src` is empty and `filename` is given the file is read instead.
    /// Never fails; unparseable input resolves against the empty sentinel.
    pub fn resolve(&self, src: &[u8], pos: usize, filename: Option<&Path>) -> Arc<CursorContext> {
        let bytes = source::load_bytes(src, filename);
        let key = ContextKey {
            hash: ContentHash::of(&bytes),
            pos,
            test_filename: filename.is_some_and(is_test_filename),
        };
        self.contexts.get_or_compute(key, &mut || {
            perf::increment_resolves();
            let parsed = self.parse(&bytes);
            Arc::new(CursorContext::build(&parsed, &bytes, pos, filename))
        })
    }

    /// Resolve the cursor of `view`, memoized by view identity. Views with
    /// identical content and position share the content-keyed result.
    pub fn resolve_view(&self, view: &View) -> Arc<CursorContext> {
        self.views.get_or_compute(view.id(), &mut || {
            log::trace!("Resolving {} ({})", view.id(), view.name());
            self.resolve(view.src(), view.position(), view.filename())
        })
    }

    pub fn clear(&self) {
        log::debug!("Clearing resolver caches");
        self.parses.clear();
        self.contexts.clear();
        self.views.clear();
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            parses: self.parses.stats(),
            contexts: self.contexts.stats(),
            views: self.views.stats(),
        }
    }
}
