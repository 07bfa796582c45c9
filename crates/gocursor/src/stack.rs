//
// stack.rs
//
// Node stack builder: the chain of syntax nodes enclosing the cursor,
// outermost first.
//

use std::mem;

use serde::Serialize;
use tree_sitter::Node;

use crate::doc::{DocAssociation, DocTracker};
use crate::node::{
    ends_with_dot, error_skeleton, is_bad, is_dangling_dot, is_name_only, is_transparent,
    keyword_skeleton, NodeKind, SyntaxNode, TextRange,
};
use crate::source::ParsedSource;

/// Immutable chain of nodes enclosing a position, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NodeStack {
    nodes: Vec<SyntaxNode>,
}

impl NodeStack {
    pub fn new(nodes: Vec<SyntaxNode>) -> Self {
        Self { nodes }
    }

    /// Nodes from outermost to innermost.
    pub fn nodes(&self) -> &[SyntaxNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The innermost node, if any.
    pub fn current(&self) -> Option<&SyntaxNode> {
        self.nodes.last()
    }

    /// Iterate innermost to outermost.
    pub fn each(&self) -> impl Iterator<Item = &SyntaxNode> + '_ {
        self.nodes.iter().rev()
    }

    /// Innermost node whose kind satisfies `pred`.
    pub fn innermost(&self, pred: impl Fn(&NodeKind) -> bool) -> Option<&SyntaxNode> {
        self.each().find(|n| pred(&n.kind))
    }

    pub fn some(&self, pred: impl Fn(&SyntaxNode) -> bool) -> bool {
        self.each().any(pred)
    }

    /// Whether a node of the same variant as `kind` is on the stack; variant
    /// payloads are ignored.
    pub fn contains(&self, kind: &NodeKind) -> bool {
        let want = mem::discriminant(kind);
        self.some(|n| mem::discriminant(&n.kind) == want)
    }

    /// Grammar kinds from outermost to innermost.
    pub fn grammar_kinds(&self) -> Vec<&'static str> {
        self.nodes.iter().map(|n| n.grammar_kind).collect()
    }
}

/// Threaded through one traversal and finalized into a [`NodeStack`].
struct StackBuilder<'p> {
    parsed: &'p ParsedSource,
    pos: usize,
    nodes: Vec<SyntaxNode>,
    doc: DocTracker,
}

impl<'p> StackBuilder<'p> {
    fn new(parsed: &'p ParsedSource, pos: usize) -> Self {
        Self {
            parsed,
            pos,
            nodes: Vec::new(),
            doc: DocTracker::new(pos),
        }
    }

    fn push(&mut self, node: Option<Node<'_>>, syntax: SyntaxNode) {
        if self.nodes.iter().any(|n| n.id == syntax.id) {
            return;
        }
        if let Some(node) = node {
            self.doc.pushed(self.parsed, node, &syntax);
        }
        self.nodes.push(syntax);
    }

    /// Visit the named children of `node`; the first one enclosing the
    /// position is entered, so at a shared boundary the earlier sibling wins.
    fn descend(&mut self, node: Node<'_>) {
        if node.is_error() && self.enter_trailing_keyword(node) {
            return;
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node
            .named_children(&mut cursor)
            .filter(|c| c.kind() != "comment")
            .collect();

        let mut claimed = false;
        for (i, &child) in children.iter().enumerate() {
            self.doc.visit(self.parsed, child);
            if claimed {
                continue;
            }
            claimed = self.enter_skeleton(&children[i..])
                || self.enter_selector(child, children.get(i + 1).copied());
            if !claimed && TextRange::from(child).encloses(self.pos) {
                claimed = true;
                self.enter(child);
            }
        }
    }

    /// An unfinished `func`/`type` line recovered as an error node or a
    /// declaration with missing parts, together with any bare names tree-sitter split off after it on the same row.
    /// Pushed as one opaque skeleton node.
    fn enter_skeleton(&mut self, siblings: &[Node<'_>]) -> bool {
        let Some((&first, rest)) = siblings.split_first() else {
            return false;
        };
        let Some(kind) = error_skeleton(first) else {
            return false;
        };
        let row = first.start_position().row;
        let end = rest
            .iter()
            .take_while(|n| n.start_position().row == row && is_name_only(**n))
            .last()
            .map_or(first.end_byte(), |n| n.end_byte());
        let range = TextRange::new(first.start_byte(), end);
        if !range.encloses(self.pos) {
            return false;
        }
        log::trace!("Recovered {:?} skeleton at {:?}", kind, range);
        self.push(None, SyntaxNode::recovered(first, kind, range));
        true
    }

    /// A `func`/`type` token stranded inside a larger error node, e.g. when
    /// the whole file failed to parse. Only names and `(` may follow it on
    /// its row, up to the end of the node.
    fn enter_trailing_keyword(&mut self, node: Node<'_>) -> bool {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        let Some(at) = children
            .iter()
            .rposition(|c| !c.is_named() && keyword_skeleton(c.kind()).is_some())
        else {
            return false;
        };
        let keyword = children[at];
        let Some(kind) = keyword_skeleton(keyword.kind()) else {
            return false;
        };
        let row = keyword.start_position().row;
        let tail: Vec<Node<'_>> = children[at + 1..]
            .iter()
            .copied()
            .filter(|c| c.kind() != "comment")
            .collect();
        let bare = tail
            .iter()
            .all(|c| c.start_position().row == row && (c.kind() == "(" || is_name_only(*c)));
        if !bare {
            return false;
        }
        let end = tail.last().map_or(keyword.end_byte(), |c| c.end_byte());
        let range = TextRange::new(keyword.start_byte(), end);
        if !range.encloses(self.pos) {
            return false;
        }
        log::trace!("Recovered {:?} skeleton at {:?}", kind, range);
        self.push(None, SyntaxNode::recovered(keyword, kind, range));
        true
    }

    /// `operand.` with the field missing: tree-sitter leaves the `.` in an
    /// error node after the operand. Both are covered by one selector.
    fn enter_selector(&mut self, operand: Node<'_>, next: Option<Node<'_>>) -> bool {
        let Some(dot) = next.filter(|n| is_dangling_dot(*n)) else {
            return false;
        };
        if is_bad(operand) || operand.end_byte() > dot.start_byte() {
            return false;
        }
        let text = self.parsed.text();
        let gap = &text[operand.end_byte()..dot.start_byte()];
        if !gap.iter().all(|b| *b == b' ' || *b == b'\t') {
            return false;
        }
        let range = TextRange::new(operand.start_byte(), dot.end_byte());
        if !range.encloses(self.pos) {
            return false;
        }
        self.push(None, SyntaxNode::recovered(dot, NodeKind::Selector, range));
        if TextRange::from(operand).encloses(self.pos) {
            self.enter(operand);
        }
        true
    }

    fn enter(&mut self, node: Node<'_>) {
        if is_bad(node) || is_transparent(node.kind()) {
            if ends_with_dot(node) {
                let syntax = SyntaxNode::recovered(node, NodeKind::Selector, node.into());
                self.push(None, syntax);
            }
            self.descend(node);
            return;
        }
        let syntax = SyntaxNode::from_ts(node, self.parsed.text());
        let eligible = match syntax.kind {
            // only the body of a clause counts, not its guard
            NodeKind::CaseClause { colon } => colon.is_some_and(|c| c <= self.pos),
            _ => true,
        };
        if eligible {
            self.push(Some(node), syntax);
        }
        self.descend(node);
    }

    fn scan_comments(&mut self) {
        let parsed = self.parsed;
        for group in parsed.comments().groups() {
            if !group.encloses(self.pos) {
                continue;
            }
            for comment in &group.comments {
                if comment.range.encloses(self.pos) {
                    self.push(
                        None,
                        SyntaxNode {
                            id: comment.id,
                            kind: NodeKind::Comment,
                            range: comment.range,
                            grammar_kind: "comment",
                        },
                    );
                }
            }
        }
    }

    fn finish(self) -> (NodeStack, Option<DocAssociation>) {
        (NodeStack::new(self.nodes), self.doc.finish())
    }
}

/// Build the node stack and doc association for `pos` in `parsed`.
///
/// The tree is only walked when the file has a package clause and the
/// position lies past its name; comments are always scanned.
pub fn build(parsed: &ParsedSource, pos: usize) -> (NodeStack, Option<DocAssociation>) {
    let mut builder = StackBuilder::new(parsed, pos);
    let root = parsed.root();
    builder.doc.visit(parsed, root);

    let walk = parsed
        .package()
        .is_some_and(|p| !p.name.is_empty() && pos > p.name_range.end);
    if walk {
        let syntax = SyntaxNode::from_ts(root, parsed.text());
        builder.push(Some(root), syntax);
        builder.descend(root);
    }
    builder.scan_comments();

    let (stack, doc) = builder.finish();
    log::trace!(
        "Node stack at {}: [{}]",
        pos,
        stack
            .nodes()
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    (stack, doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{parse, ParseMode};

    fn stack_at(code: &str, pos: usize) -> (NodeStack, Option<DocAssociation>) {
        let parsed = parse(code.as_bytes(), ParseMode::Strict);
        build(&parsed, pos)
    }

    #[test]
    fn test_assignment_stack() {
        let code = "package p\n\nfunc f() {\n\tx := 1\n}\n";
        let (stack, _) = stack_at(code, code.find('1').unwrap());
        let kinds = stack.grammar_kinds();
        assert_eq!(kinds.first(), Some(&"source_file"));
        assert_eq!(kinds.last(), Some(&"int_literal"));
        assert!(kinds.contains(&"function_declaration"));
        assert!(kinds.contains(&"block"));
        assert!(kinds.contains(&"short_var_declaration"));
        assert!(!kinds.contains(&"statement_list"));
    }

    #[test]
    fn test_stack_is_a_containment_chain() {
        let code = "package p\n\nfunc f() {\n\tif x := g(1, 2); x > 0 {\n\t\treturn\n\t}\n}\n";
        let (stack, _) = stack_at(code, code.find("2)").unwrap());
        assert!(stack.len() > 3);
        for pair in stack.nodes().windows(2) {
            assert!(
                pair[0].range.contains_range(&pair[1].range),
                "{} does not contain {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_earlier_sibling_wins_at_boundary() {
        let code = "package p\n\nvar v = f()\n";
        let (stack, _) = stack_at(code, code.find("()").unwrap());
        let current = stack.current().unwrap();
        assert_eq!(current.kind, NodeKind::Ident);
        assert!(!stack.grammar_kinds().contains(&"argument_list"));
        assert!(stack.contains(&NodeKind::Call));
    }

    #[test]
    fn test_position_before_package_name_is_not_walked() {
        let code = "package p\n\nfunc f() {}\n";
        let (stack, _) = stack_at(code, 3);
        assert!(stack.is_empty());
        assert!(stack.current().is_none());
    }

    #[test]
    fn test_comment_in_body_is_innermost() {
        let code = "package p\n\nfunc f() {\n\t// note\n\tx := 1\n}\n";
        let (stack, _) = stack_at(code, code.find("note").unwrap());
        assert_eq!(stack.current().unwrap().kind, NodeKind::Comment);
        assert!(stack.contains(&NodeKind::Block));
    }

    #[test]
    fn test_comment_without_package_is_found() {
        let code = "// comment\n";
        let (stack, _) = stack_at(code, 4);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.current().unwrap().kind, NodeKind::Comment);
    }

    #[test]
    fn test_case_clause_guard_excluded() {
        let code = "package p\n\nfunc f(x int) {\n\tswitch x {\n\tcase 1:\n\t\ty()\n\t}\n}\n";
        let (stack, _) = stack_at(code, code.find("1:").unwrap());
        assert!(!stack.grammar_kinds().contains(&"expression_case"));

        let (stack, _) = stack_at(code, code.find("y()").unwrap());
        assert!(stack.grammar_kinds().contains(&"expression_case"));
    }

    #[test]
    fn test_no_duplicate_nodes() {
        let code = "package p\n\nfunc f() {\n\tdefer g(\"a\") // c\n}\n";
        for pos in 0..=code.len() {
            let (stack, _) = stack_at(code, pos);
            let mut ids: Vec<usize> = stack.nodes().iter().map(|n| n.id).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), stack.len(), "duplicate at {}", pos);
        }
    }

    #[test]
    fn test_innermost_and_each() {
        let code = "package p\n\nfunc f() {\n\tx := func() { y := 2 }\n}\n";
        let (stack, _) = stack_at(code, code.find('2').unwrap());
        let assigns: Vec<_> = stack
            .each()
            .filter(|n| matches!(n.kind, NodeKind::Assign { .. }))
            .collect();
        assert_eq!(assigns.len(), 2);
        let inner = stack
            .innermost(|k| matches!(k, NodeKind::Assign { .. }))
            .unwrap();
        assert_eq!(inner.range.start, code.find("y :=").unwrap());
    }

    #[test]
    fn test_doc_group_enclosing_cursor() {
        let code = "package p\n\n// Foo does X.\nfunc Foo() {}\n";
        let (stack, doc) = stack_at(code, code.find("does").unwrap());
        let doc = doc.expect("doc");
        assert!(doc.encloses_cursor);
        assert_eq!(doc.node.grammar_kind, "function_declaration");
        assert_eq!(stack.current().unwrap().kind, NodeKind::Comment);
    }

    #[test]
    fn test_doc_falls_back_to_innermost_declaration() {
        let code = "package p\n\n// T is a type.\ntype T struct {\n\t// A is a field.\n\tA int\n}\n";
        let (_, doc) = stack_at(code, code.find("A int").unwrap());
        let doc = doc.expect("doc");
        assert!(!doc.encloses_cursor);
        assert_eq!(doc.text(), "A is a field.");
    }

    #[test]
    fn test_unfinished_func_line_is_a_function_type() {
        let code = "package p\n\nfunc \n";
        let (stack, _) = stack_at(code, code.find("unc").unwrap());
        let current = stack.current().expect("skeleton");
        assert_eq!(current.kind, NodeKind::FuncType);
        assert_eq!(current.grammar_kind, "function_type");
        assert!(!stack.grammar_kinds().contains(&"ERROR"));
    }

    #[test]
    fn test_unfinished_type_line_is_a_type_declaration() {
        let code = "package p\n\ntype \n";
        let (stack, _) = stack_at(code, code.find("ype").unwrap());
        assert_eq!(stack.current().unwrap().grammar_kind, "type_declaration");
    }

    #[test]
    fn test_dangling_dot_is_a_selector() {
        let code = "package main\n\nfunc main() {\n\tfmt.\n}\n";
        let (stack, _) = stack_at(code, code.find("fmt.").unwrap() + 3);
        let kinds = stack.grammar_kinds();
        assert!(kinds.contains(&"block"), "{:?}", kinds);
        assert!(kinds.contains(&"selector_expression"), "{:?}", kinds);
        assert!(!kinds.contains(&"ERROR"));
    }
}
