//
// context.rs
//
// CursorContext: the immutable result of resolving a cursor position
//

use std::path::Path;

use serde::Serialize;

use crate::classify::{classify, Facts};
use crate::doc::DocAssociation;
use crate::node::{NodeKind, SyntaxNode};
use crate::position;
use crate::scope::ScopeSet;
use crate::source::{ParsedSource, NIL_PACKAGE_NAME};
use crate::stack::{self, NodeStack};

/// Everything known about the syntactic situation at one cursor position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorContext {
    position: usize,
    scope: ScopeSet,
    package_name: String,
    is_test_file: bool,
    current_line: String,
    stack: NodeStack,
    doc: Option<DocAssociation>,
}

impl CursorContext {
    /// Resolve `pos` in `src`, using `parsed` as its syntax tree.
    ///
    /// `parsed` may be a permissive parse of `src`; positions are always
    /// interpreted against `src` itself.
    pub fn build(parsed: &ParsedSource, src: &[u8], pos: usize, filename: Option<&Path>) -> Self {
        let pos = position::normalize(src, pos);
        let current_line = position::line_text(src, pos);
        let (stack, doc) = stack::build(parsed, pos);

        let package_name = parsed.package_name().to_string();
        let is_test_file =
            filename.is_some_and(is_test_filename) || package_name.ends_with("_test");

        let scope = classify(&Facts {
            stack: &stack,
            pos,
            line: &current_line,
            nil_package: package_name == NIL_PACKAGE_NAME,
            in_doc: doc.as_ref().is_some_and(|d| d.encloses_cursor),
        });

        Self {
            position: pos,
            scope,
            package_name,
            is_test_file,
            current_line,
            stack,
            doc,
        }
    }

    /// Normalized cursor offset.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn scope(&self) -> ScopeSet {
        self.scope
    }

    /// Declared package name, or `_` when the file has no valid package clause.
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn is_test_file(&self) -> bool {
        self.is_test_file
    }

    /// Whitespace-trimmed text of the cursor's line.
    pub fn current_line(&self) -> &str {
        &self.current_line
    }

    pub fn node_stack(&self) -> &NodeStack {
        &self.stack
    }

    pub fn current_node(&self) -> Option<&SyntaxNode> {
        self.stack.current()
    }

    pub fn doc(&self) -> Option<&DocAssociation> {
        self.doc.as_ref()
    }

    /// Name of the enclosing function or method declaration when the cursor
    /// is on its name token, and whether it is a method.
    pub fn func_decl_name(&self) -> Option<(&str, bool)> {
        let decl = self
            .stack
            .innermost(|k| matches!(k, NodeKind::FuncDecl { .. }))?;
        match &decl.kind {
            NodeKind::FuncDecl {
                name: Some(name),
                is_method,
                ..
            } if name.range.encloses(self.position) => Some((name.text.as_str(), *is_method)),
            _ => None,
        }
    }

    /// Function name under the cursor, or `""`.
    pub fn function_declaration_name(&self) -> &str {
        match self.func_decl_name() {
            Some((name, false)) => name,
            _ => "",
        }
    }

    /// Method name under the cursor, or `""`.
    pub fn method_declaration_name(&self) -> &str {
        match self.func_decl_name() {
            Some((name, true)) => name,
            _ => "",
        }
    }

    pub fn group_decl(&self) -> Option<&SyntaxNode> {
        self.stack
            .innermost(|k| matches!(k, NodeKind::GroupDecl { .. }))
    }

    pub fn import_spec(&self) -> Option<&SyntaxNode> {
        self.stack.innermost(|k| *k == NodeKind::ImportSpec)
    }

    pub fn comment(&self) -> Option<&SyntaxNode> {
        self.stack.innermost(|k| *k == NodeKind::Comment)
    }

    pub fn block(&self) -> Option<&SyntaxNode> {
        self.stack.innermost(|k| *k == NodeKind::Block)
    }

    pub fn call(&self) -> Option<&SyntaxNode> {
        self.stack.innermost(|k| *k == NodeKind::Call)
    }

    pub fn basic_lit(&self) -> Option<&SyntaxNode> {
        self.stack
            .innermost(|k| matches!(k, NodeKind::BasicLit { .. }))
    }

    pub fn summary(&self) -> ContextSummary {
        ContextSummary {
            position: self.position,
            scope: self.scope.to_string(),
            scopes: self.scope.names().map(str::to_string).collect(),
            package_name: self.package_name.clone(),
            is_test_file: self.is_test_file,
            current_line: self.current_line.clone(),
            node_stack: self
                .stack
                .nodes()
                .iter()
                .map(|n| n.to_string())
                .collect(),
            current_node: self.current_node().map(|n| n.to_string()),
            doc: self.doc.as_ref().map(|d| d.text()),
            function_name: self.function_declaration_name().to_string(),
            method_name: self.method_declaration_name().to_string(),
        }
    }
}

/// Go test files end in `_test.go`.
pub(crate) fn is_test_filename(path: &Path) -> bool {
    path.to_string_lossy().ends_with("_test.go")
}

/// Flat, serializable view of a [`CursorContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextSummary {
    pub position: usize,
    pub scope: String,
    pub scopes: Vec<String>,
    pub package_name: String,
    pub is_test_file: bool,
    pub current_line: String,
    pub node_stack: Vec<String>,
    pub current_node: Option<String>,
    pub doc: Option<String>,
    pub function_name: String,
    pub method_name: String,
}
