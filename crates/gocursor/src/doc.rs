//
// doc.rs
//
// Doc comment association for the cursor
//

use serde::Serialize;
use tree_sitter::Node;

use crate::comments::CommentGroup;
use crate::node::{is_doc_carrier, SyntaxNode};
use crate::source::ParsedSource;

/// A declaration paired with its leading documentation comment group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocAssociation {
    pub node: SyntaxNode,
    pub group: CommentGroup,
    /// The cursor is inside the comment group itself
    pub encloses_cursor: bool,
}

impl DocAssociation {
    pub fn text(&self) -> String {
        self.group.text()
    }
}

/// Leading doc group of `node`. The file's doc sits above its package clause.
pub fn lead_doc<'p>(parsed: &'p ParsedSource, node: Node<'_>) -> Option<&'p CommentGroup> {
    if !is_doc_carrier(node.kind()) {
        return None;
    }
    let (start, row) = if node.kind() == "source_file" {
        let clause = parsed.package()?;
        (clause.range.start, clause.start_row)
    } else {
        (node.start_byte(), node.start_position().row)
    };
    parsed.comments().lead_group(parsed.text(), start, row)
}

/// Collects the doc association during a traversal.
///
/// The first visited declaration whose doc group encloses the cursor wins.
/// Otherwise the innermost documented declaration on the node stack is used.
#[derive(Debug)]
pub(crate) struct DocTracker {
    pos: usize,
    enclosing: Option<DocAssociation>,
    innermost: Option<DocAssociation>,
}

impl DocTracker {
    pub fn new(pos: usize) -> Self {
        Self {
            pos,
            enclosing: None,
            innermost: None,
        }
    }

    /// Called for every visited node.
    pub fn visit(&mut self, parsed: &ParsedSource, node: Node<'_>) {
        if self.enclosing.is_some() {
            return;
        }
        let Some(group) = lead_doc(parsed, node) else {
            return;
        };
        if group.encloses(self.pos) {
            log::trace!("Doc group {:?} encloses cursor at {}", group.range, self.pos);
            self.enclosing = Some(DocAssociation {
                node: SyntaxNode::from_ts(node, parsed.text()),
                group: group.clone(),
                encloses_cursor: true,
            });
        }
    }

    /// Called for every node pushed onto the stack, outer to inner.
    pub fn pushed(&mut self, parsed: &ParsedSource, node: Node<'_>, syntax: &SyntaxNode) {
        if let Some(group) = lead_doc(parsed, node) {
            self.innermost = Some(DocAssociation {
                node: syntax.clone(),
                group: group.clone(),
                encloses_cursor: false,
            });
        }
    }

    pub fn finish(self) -> Option<DocAssociation> {
        self.enclosing.or(self.innermost)
    }
}
