//
// node.rs
//
// Owned syntax nodes: a closed NodeKind per Go construct, mapped from
// tree-sitter-go grammar kinds.
//

use std::fmt;

use serde::Serialize;
use tree_sitter::Node;

/// Half-open byte range of a node. Enclosure tests treat both ends inclusively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// `start <= pos <= end`
    pub fn encloses(&self, pos: usize) -> bool {
        self.start <= pos && pos <= self.end
    }

    pub fn contains_range(&self, other: &TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl From<Node<'_>> for TextRange {
    fn from(node: Node<'_>) -> Self {
        Self::new(node.start_byte(), node.end_byte())
    }
}

/// Keyword of a grouped declaration (`import`, `const`, `var`, `type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeclKeyword {
    Import,
    Const,
    Var,
    Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LitKind {
    String,
    Int,
    Float,
    Imaginary,
    Rune,
}

/// Name token of a function or method declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NameToken {
    pub text: String,
    pub range: TextRange,
}

/// Go construct a node represents. Kinds the resolver does not reason about
/// collapse into `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    File,
    Block,
    /// `case`/`default` clause; `colon` is the byte offset of its `:`.
    CaseClause {
        colon: Option<usize>,
    },
    Ident,
    BasicLit {
        kind: LitKind,
    },
    GroupDecl {
        keyword: DeclKeyword,
    },
    ImportSpec,
    TypeSpec,
    ValueSpec,
    Field,
    FuncDecl {
        name: Option<NameToken>,
        is_method: bool,
        body_start: Option<usize>,
    },
    FuncType,
    FuncLit,
    /// Assignment or short variable declaration; `op_end` is the byte just
    /// past the assignment operator.
    Assign {
        op_end: Option<usize>,
    },
    Selector,
    Return,
    Defer,
    Call,
    Comment,
    Other,
}

impl NodeKind {
    /// Whether this kind can carry a leading documentation comment group.
    pub fn carries_doc(&self) -> bool {
        matches!(
            self,
            NodeKind::File
                | NodeKind::Field
                | NodeKind::GroupDecl { .. }
                | NodeKind::TypeSpec
                | NodeKind::FuncDecl { .. }
                | NodeKind::ValueSpec
                | NodeKind::ImportSpec
        )
    }

    pub fn is_string_lit(&self) -> bool {
        matches!(
            self,
            NodeKind::BasicLit {
                kind: LitKind::String
            }
        )
    }
}

/// Grammar wrapper kinds with no construct of their own.
pub(crate) fn is_transparent(ts_kind: &str) -> bool {
    ts_kind == "statement_list"
}

/// Grammar kinds whose [`NodeKind`] carries a leading doc comment group.
pub(crate) fn is_doc_carrier(ts_kind: &str) -> bool {
    matches!(
        ts_kind,
        "source_file"
            | "field_declaration"
            | "method_elem"
            | "method_spec"
            | "import_declaration"
            | "const_declaration"
            | "var_declaration"
            | "type_declaration"
            | "type_spec"
            | "type_alias"
            | "function_declaration"
            | "method_declaration"
            | "const_spec"
            | "var_spec"
            | "import_spec"
    )
}

/// Error-recovery placeholders never enter a node stack.
pub(crate) fn is_bad(node: Node<'_>) -> bool {
    node.is_error() || node.is_missing()
}

pub(crate) fn is_ident_kind(ts_kind: &str) -> bool {
    matches!(
        ts_kind,
        "identifier"
            | "field_identifier"
            | "type_identifier"
            | "package_identifier"
            | "label_name"
            | "blank_identifier"
    )
}

/// Go keywords; never valid as a package name.
pub(crate) fn is_keyword(word: &str) -> bool {
    matches!(
        word,
        "break"
            | "case"
            | "chan"
            | "const"
            | "continue"
            | "default"
            | "defer"
            | "else"
            | "fallthrough"
            | "for"
            | "func"
            | "go"
            | "goto"
            | "if"
            | "import"
            | "interface"
            | "map"
            | "package"
            | "range"
            | "return"
            | "select"
            | "struct"
            | "switch"
            | "type"
            | "var"
    )
}

/// Identifiers only, possibly wrapped in statements or recovery nodes.
pub(crate) fn is_name_only(node: Node<'_>) -> bool {
    if is_ident_kind(node.kind()) {
        return true;
    }
    if !matches!(node.kind(), "ERROR" | "expression_statement" | "expression_list") {
        return false;
    }
    let mut cursor = node.walk();
    let names_only = node
        .named_children(&mut cursor)
        .all(|c| c.kind() == "comment" || is_name_only(c));
    names_only
}

/// The declaration skeleton a node stands for: `func`, `func name`, `type`,
/// `type name` or `type (` left unfinished. tree-sitter recovers
/// these either as an error node or as a declaration with missing parts.
pub(crate) fn error_skeleton(node: Node<'_>) -> Option<NodeKind> {
    match node.kind() {
        "ERROR" => {
            let kind = keyword_skeleton(node.child(0)?.kind())?;
            is_name_only(node).then_some(kind)
        }
        "function_declaration" | "type_declaration" => {
            let kind = keyword_skeleton(node.child(0)?.kind())?;
            (node.has_error() && is_bare(node)).then_some(kind)
        }
        _ => None,
    }
}

/// Skeleton kind introduced by a `func` or `type` token.
pub(crate) fn keyword_skeleton(token: &str) -> Option<NodeKind> {
    match token {
        "func" => Some(NodeKind::FuncType),
        "type" => Some(NodeKind::GroupDecl {
            keyword: DeclKeyword::Type,
        }),
        _ => None,
    }
}

/// Only names, `func`/`type` tokens and missing nodes below `node`.
fn is_bare(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let bare = node.children(&mut cursor).all(|c| {
        if c.is_missing() || c.kind() == "comment" || is_ident_kind(c.kind()) {
            true
        } else if c.is_named() {
            is_bare(c)
        } else {
            matches!(c.kind(), "func" | "type")
        }
    });
    bare
}

/// An error node holding nothing but a leading `.`: the field of a selector
/// that has not been typed yet.
pub(crate) fn is_dangling_dot(node: Node<'_>) -> bool {
    node.is_error()
        && node.named_child_count() == 0
        && node.child(0).is_some_and(|c| c.kind() == ".")
}

/// An error node that ends in `.` after an operand, e.g. `(ERROR (identifier) ".")`.
pub(crate) fn ends_with_dot(node: Node<'_>) -> bool {
    node.is_error()
        && node.named_child_count() > 0
        && node
            .child(node.child_count().saturating_sub(1))
            .is_some_and(|c| c.kind() == ".")
}

/// An owned snapshot of one tree node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SyntaxNode {
    /// tree-sitter node id; unique within one tree
    pub id: usize,
    pub kind: NodeKind,
    pub range: TextRange,
    /// Raw grammar kind, e.g. `"short_var_declaration"`, or for a node
    /// recovered from a syntax error the kind of the construct it stands for
    pub grammar_kind: &'static str,
}

impl SyntaxNode {
    pub fn from_ts(node: Node<'_>, src: &[u8]) -> Self {
        Self {
            id: node.id(),
            kind: classify_kind(node, src),
            range: node.into(),
            grammar_kind: node.kind(),
        }
    }

    /// A construct recognised inside error-recovery node `node`, spanning `range`.
    pub(crate) fn recovered(node: Node<'_>, kind: NodeKind, range: TextRange) -> Self {
        let grammar_kind = match kind {
            NodeKind::FuncType => "function_type",
            NodeKind::GroupDecl { .. } => "type_declaration",
            NodeKind::Selector => "selector_expression",
            _ => node.kind(),
        };
        Self {
            id: node.id(),
            kind,
            range,
            grammar_kind,
        }
    }

    pub fn encloses(&self, pos: usize) -> bool {
        self.range.encloses(pos)
    }
}

impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}..{}",
            self.grammar_kind, self.range.start, self.range.end
        )
    }
}

/// Map a tree-sitter-go node onto a [`NodeKind`].
pub fn classify_kind(node: Node<'_>, src: &[u8]) -> NodeKind {
    match node.kind() {
        "source_file" => NodeKind::File,
        "block" => NodeKind::Block,
        "expression_case" | "type_case" | "default_case" | "communication_case" => {
            NodeKind::CaseClause {
                colon: token_child(node, ":").map(|c| c.start_byte()),
            }
        }
        kind if is_ident_kind(kind) => NodeKind::Ident,
        "interpreted_string_literal" | "raw_string_literal" => NodeKind::BasicLit {
            kind: LitKind::String,
        },
        "int_literal" => NodeKind::BasicLit { kind: LitKind::Int },
        "float_literal" => NodeKind::BasicLit {
            kind: LitKind::Float,
        },
        "imaginary_literal" => NodeKind::BasicLit {
            kind: LitKind::Imaginary,
        },
        "rune_literal" => NodeKind::BasicLit {
            kind: LitKind::Rune,
        },
        "import_declaration" => NodeKind::GroupDecl {
            keyword: DeclKeyword::Import,
        },
        "const_declaration" => NodeKind::GroupDecl {
            keyword: DeclKeyword::Const,
        },
        "var_declaration" => NodeKind::GroupDecl {
            keyword: DeclKeyword::Var,
        },
        "type_declaration" => NodeKind::GroupDecl {
            keyword: DeclKeyword::Type,
        },
        "import_spec" => NodeKind::ImportSpec,
        "type_spec" | "type_alias" => NodeKind::TypeSpec,
        "const_spec" | "var_spec" => NodeKind::ValueSpec,
        "field_declaration" | "method_elem" | "method_spec" => NodeKind::Field,
        "function_declaration" | "method_declaration" => NodeKind::FuncDecl {
            name: node
                .child_by_field_name("name")
                .filter(|n| !is_bad(*n))
                .map(|n| NameToken {
                    text: node_text(n, src).to_string(),
                    range: n.into(),
                }),
            is_method: node.kind() == "method_declaration",
            body_start: node.child_by_field_name("body").map(|b| b.start_byte()),
        },
        "function_type" => NodeKind::FuncType,
        "func_literal" => NodeKind::FuncLit,
        "assignment_statement" | "short_var_declaration" => NodeKind::Assign {
            op_end: assignment_operator(node).map(|op| op.end_byte()),
        },
        "selector_expression" | "qualified_type" => NodeKind::Selector,
        "return_statement" => NodeKind::Return,
        "defer_statement" => NodeKind::Defer,
        "call_expression" => NodeKind::Call,
        "comment" => NodeKind::Comment,
        _ => NodeKind::Other,
    }
}

/// First anonymous child token whose kind is exactly `token`.
fn token_child<'t>(node: Node<'t>, token: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .find(|c| !c.is_named() && c.kind() == token);
    found
}

fn assignment_operator(node: Node<'_>) -> Option<Node<'_>> {
    if let Some(op) = node.child_by_field_name("operator") {
        return Some(op);
    }
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .find(|c| !c.is_named() && !c.is_missing() && c.kind().ends_with('='));
    found
}

/// Source text of a node; empty when it is not valid UTF-8.
pub fn node_text<'a>(node: Node<'_>, src: &'a [u8]) -> &'a str {
    std::str::from_utf8(&src[node.byte_range()]).unwrap_or("")
}
