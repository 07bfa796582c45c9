//
// comments.rs
//
// Comment groups and leading documentation comments.
//
// tree-sitter keeps comments as `extra` nodes scattered through the tree, so
// groups are rebuilt here: adjacent comments separated only by blanks and at
// most one newline form a group, and a group ending on the line right above
// a declaration is that declaration's doc comment.
//

use std::collections::HashMap;

use serde::Serialize;
use tree_sitter::{Node, TreeCursor};

use crate::node::{node_text, TextRange};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CommentNode {
    /// tree-sitter node id
    pub id: usize,
    pub range: TextRange,
    pub start_row: usize,
    pub end_row: usize,
    /// Raw comment text including markers
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CommentGroup {
    pub comments: Vec<CommentNode>,
    pub range: TextRange,
    pub start_row: usize,
    pub end_row: usize,
    /// The first comment is the only thing on its line before it
    pub own_line: bool,
}

impl CommentGroup {
    fn start(comment: CommentNode, own_line: bool) -> Self {
        Self {
            range: comment.range,
            start_row: comment.start_row,
            end_row: comment.end_row,
            own_line,
            comments: vec![comment],
        }
    }

    fn push(&mut self, comment: CommentNode) {
        self.range.end = comment.range.end;
        self.end_row = comment.end_row;
        self.comments.push(comment);
    }

    pub fn encloses(&self, pos: usize) -> bool {
        self.range.encloses(pos)
    }

    /// Comment text with markers removed, blank edge lines dropped and lines
    /// joined by `\n`.
    pub fn text(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        for comment in &self.comments {
            let raw = comment.text.as_str();
            if let Some(body) = raw.strip_prefix("//") {
                let body = body.strip_prefix(' ').unwrap_or(body);
                lines.push(body.trim_end().to_string());
            } else {
                let body = raw
                    .strip_prefix("/*")
                    .and_then(|b| b.strip_suffix("*/"))
                    .unwrap_or(raw);
                lines.extend(body.lines().map(|l| l.trim_end().to_string()));
            }
        }

        while lines.first().is_some_and(|l| l.trim().is_empty()) {
            lines.remove(0);
        }
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }
        lines.join("\n")
    }
}

/// All comment groups of a document plus a row index for doc lookups.
#[derive(Debug, Clone, Default)]
pub struct CommentIndex {
    groups: Vec<CommentGroup>,
    by_end_row: HashMap<usize, usize>,
}

impl CommentIndex {
    pub fn build(root: Node<'_>, src: &[u8]) -> Self {
        let mut comments = Vec::new();
        let mut cursor = root.walk();
        collect_comments(&mut cursor, src, &mut comments);

        let mut groups: Vec<CommentGroup> = Vec::new();
        for comment in comments {
            let own_line = starts_line(src, comment.range.start);
            match groups.last_mut() {
                Some(group) if joins_group(src, group, &comment) => group.push(comment),
                _ => groups.push(CommentGroup::start(comment, own_line)),
            }
        }

        let by_end_row = groups
            .iter()
            .enumerate()
            .map(|(i, g)| (g.end_row, i))
            .collect();
        Self { groups, by_end_row }
    }

    pub fn groups(&self) -> &[CommentGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Leading doc comment of a construct starting at byte `start` on `row`.
    pub fn lead_group(&self, src: &[u8], start: usize, row: usize) -> Option<&CommentGroup> {
        let prev_row = row.checked_sub(1)?;
        let group = &self.groups[*self.by_end_row.get(&prev_row)?];
        if !group.own_line || group.range.end > start {
            return None;
        }
        let gap = &src[group.range.end..start];
        if gap.iter().all(|b| b.is_ascii_whitespace()) {
            Some(group)
        } else {
            None
        }
    }
}

fn collect_comments(cursor: &mut TreeCursor<'_>, src: &[u8], out: &mut Vec<CommentNode>) {
    let node = cursor.node();
    if node.kind() == "comment" {
        out.push(CommentNode {
            id: node.id(),
            range: node.into(),
            start_row: node.start_position().row,
            end_row: node.end_position().row,
            text: node_text(node, src).to_string(),
        });
        return;
    }
    if cursor.goto_first_child() {
        loop {
            collect_comments(cursor, src, out);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
}

fn starts_line(src: &[u8], start: usize) -> bool {
    src[..start]
        .iter()
        .rev()
        .take_while(|b| **b != b'\n')
        .all(|b| *b == b' ' || *b == b'\t' || *b == b'\r')
}

fn joins_group(src: &[u8], group: &CommentGroup, next: &CommentNode) -> bool {
    if next.range.start < group.range.end {
        return false;
    }
    let gap = &src[group.range.end..next.range.start];
    if !gap.iter().all(|b| b.is_ascii_whitespace()) {
        return false;
    }
    match gap.iter().filter(|b| **b == b'\n').count() {
        0 => true,
        // a trailing comment keeps its group to its own line
        1 => group.own_line,
        _ => false,
    }
}
