//
// scope.rs
//
// Named cursor scopes and the bitmask that carries them
//

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Set of syntactic facets describing where the cursor sits.
    ///
    /// Bits are only ever added during resolution, never cleared.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ScopeSet: u32 {
        const FILE = 1 << 0;
        const BLOCK = 1 << 1;
        const COMMENT = 1 << 2;
        const CONST = 1 << 3;
        const DECL = 1 << 4;
        const DEFER = 1 << 5;
        const DOC = 1 << 6;
        const IDENT = 1 << 7;
        const IMPORT = 1 << 8;
        const IMPORT_PATH = 1 << 9;
        const PACKAGE = 1 << 10;
        const RETURN = 1 << 11;
        const SELECTOR = 1 << 12;
        const STRING = 1 << 13;
        const TYPE = 1 << 14;
        const VAR = 1 << 15;
        const ASSIGNMENT = 1 << 16;
        const FUNCTION_DECLARATION = 1 << 17;
        const TYPE_DECLARATION = 1 << 18;
        const EXPRESSION = 1 << 19;
    }
}

/// Stable display names, sorted alphabetically.
const SCOPE_NAMES: &[(ScopeSet, &str)] = &[
    (ScopeSet::ASSIGNMENT, "Assignment"),
    (ScopeSet::BLOCK, "Block"),
    (ScopeSet::COMMENT, "Comment"),
    (ScopeSet::CONST, "Const"),
    (ScopeSet::DECL, "Decl"),
    (ScopeSet::DEFER, "Defer"),
    (ScopeSet::DOC, "Doc"),
    (ScopeSet::EXPRESSION, "Expression"),
    (ScopeSet::FILE, "File"),
    (ScopeSet::FUNCTION_DECLARATION, "FunctionDeclaration"),
    (ScopeSet::IDENT, "Ident"),
    (ScopeSet::IMPORT, "Import"),
    (ScopeSet::IMPORT_PATH, "ImportPath"),
    (ScopeSet::PACKAGE, "Package"),
    (ScopeSet::RETURN, "Return"),
    (ScopeSet::SELECTOR, "Selector"),
    (ScopeSet::STRING, "String"),
    (ScopeSet::TYPE, "Type"),
    (ScopeSet::TYPE_DECLARATION, "TypeDeclaration"),
    (ScopeSet::VAR, "Var"),
];

impl ScopeSet {
    /// True if the set is exactly equal to one of `combinations`.
    pub fn is(&self, combinations: &[ScopeSet]) -> bool {
        combinations.iter().any(|c| c == self)
    }

    /// True if any bit of `scopes` is set.
    pub fn any_of(&self, scopes: ScopeSet) -> bool {
        self.intersects(scopes)
    }

    /// True if every bit of `scopes` is set.
    pub fn all_of(&self, scopes: ScopeSet) -> bool {
        self.contains(scopes)
    }

    /// Names of the set bits in alphabetical order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        SCOPE_NAMES
            .iter()
            .filter(move |(scope, _)| self.contains(*scope))
            .map(|(_, name)| *name)
    }

    /// Look up a single scope by its display name, e.g. `"ImportPath"`.
    pub fn from_display_name(name: &str) -> Option<ScopeSet> {
        SCOPE_NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(scope, _)| *scope)
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        let names: Vec<&str> = self.names().collect();
        f.write_str(&names.join("|"))
    }
}
