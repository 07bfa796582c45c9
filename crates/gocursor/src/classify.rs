//
// classify.rs
//
// Scope classification: a fixed rule table over the node stack followed by
// the bare-keyword-line and expression-position heuristics. Bits are only
// ever added.
//

use crate::node::{DeclKeyword, NodeKind};
use crate::scope::ScopeSet;
use crate::stack::NodeStack;

/// Facts the classifier works from.
#[derive(Debug, Clone, Copy)]
pub struct Facts<'a> {
    pub stack: &'a NodeStack,
    pub pos: usize,
    /// Trimmed text of the cursor's line
    pub line: &'a str,
    /// The file has no usable package clause
    pub nil_package: bool,
    /// The cursor is inside a doc comment group
    pub in_doc: bool,
}

/// Scopes that allow an expression to follow.
const EXPR_CONTEXTS: ScopeSet = ScopeSet::ASSIGNMENT
    .union(ScopeSet::BLOCK)
    .union(ScopeSet::CONST)
    .union(ScopeSet::DEFER)
    .union(ScopeSet::RETURN)
    .union(ScopeSet::VAR);

/// Scopes in which expression completion makes no sense.
const EXPR_BLOCKERS: ScopeSet = ScopeSet::SELECTOR
    .union(ScopeSet::STRING)
    .union(ScopeSet::COMMENT);

pub fn classify(facts: &Facts<'_>) -> ScopeSet {
    let stack = facts.stack;
    let mut scope = ScopeSet::empty();

    if stack.contains(&NodeKind::Comment) {
        scope |= ScopeSet::COMMENT;
    }
    if facts.in_doc {
        scope |= ScopeSet::DOC | ScopeSet::COMMENT;
    }

    if facts.nil_package {
        return scope | ScopeSet::PACKAGE;
    }

    match stack.current().map(|n| &n.kind) {
        None => scope |= ScopeSet::PACKAGE,
        Some(NodeKind::File) => scope |= ScopeSet::FILE,
        // a clause is only stacked once the cursor is past its colon
        Some(NodeKind::Block) | Some(NodeKind::CaseClause { .. }) => scope |= ScopeSet::BLOCK,
        Some(NodeKind::Ident) => scope |= ScopeSet::IDENT,
        Some(_) => {}
    }

    for node in stack.each() {
        match node.kind {
            NodeKind::Block | NodeKind::CaseClause { .. } => scope |= ScopeSet::BLOCK,
            NodeKind::Assign { .. } => scope |= ScopeSet::ASSIGNMENT,
            NodeKind::Selector => scope |= ScopeSet::SELECTOR,
            NodeKind::Return => scope |= ScopeSet::RETURN,
            NodeKind::Defer => scope |= ScopeSet::DEFER,
            _ => {}
        }
    }

    if let Some(NodeKind::GroupDecl { keyword }) = stack
        .innermost(|k| matches!(k, NodeKind::GroupDecl { .. }))
        .map(|n| &n.kind)
    {
        scope |= match keyword {
            DeclKeyword::Import => ScopeSet::IMPORT,
            DeclKeyword::Const => ScopeSet::CONST,
            DeclKeyword::Var => ScopeSet::VAR,
            DeclKeyword::Type => ScopeSet::TYPE,
        };
    }

    let literal = stack.innermost(|k| matches!(k, NodeKind::BasicLit { .. }));
    if literal.is_some_and(|n| n.kind.is_string_lit()) {
        scope |= ScopeSet::STRING;
        if stack.contains(&NodeKind::ImportSpec) {
            scope |= ScopeSet::IMPORT_PATH;
        }
    }

    scope |= bare_keyword_line(facts, scope);
    scope |= expression_position(facts, scope);
    scope
}

/// Lets completion run right after `func` or `type` before a name is typed:
/// `kw`, `kw name` and `kw (` on its own line.
fn bare_keyword_line(facts: &Facts<'_>, scope: ScopeSet) -> ScopeSet {
    // a type group declaration always carries Type
    if !scope.difference(ScopeSet::TYPE).is_empty() || !is_keyword_line(facts.line) {
        return ScopeSet::empty();
    }
    match facts.stack.current().map(|n| &n.kind) {
        Some(NodeKind::FuncType) => ScopeSet::FUNCTION_DECLARATION,
        Some(NodeKind::FuncDecl { body_start, .. })
            if body_start.map_or(true, |start| facts.pos < start) =>
        {
            ScopeSet::FUNCTION_DECLARATION
        }
        Some(NodeKind::GroupDecl {
            keyword: DeclKeyword::Type,
        }) => ScopeSet::TYPE_DECLARATION,
        _ => ScopeSet::empty(),
    }
}

fn is_keyword_line(line: &str) -> bool {
    line.chars()
        .all(|c| c == ' ' || c == '\t' || c == '_' || c.is_alphanumeric())
}

/// Expression completion needs an expression context, no blocker, and the
/// cursor past the operator of the innermost assignment.
fn expression_position(facts: &Facts<'_>, scope: ScopeSet) -> ScopeSet {
    if !scope.any_of(EXPR_CONTEXTS) || scope.any_of(EXPR_BLOCKERS) {
        return ScopeSet::empty();
    }
    let assign = facts
        .stack
        .innermost(|k| matches!(k, NodeKind::Assign { .. }));
    if let Some(NodeKind::Assign { op_end }) = assign.map(|n| &n.kind) {
        match op_end {
            Some(end) if facts.pos >= *end => {}
            _ => return ScopeSet::empty(),
        }
    }
    ScopeSet::EXPRESSION
}
