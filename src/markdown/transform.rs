//! Structural pass over the document tree.
//!
//! A single depth-first walk visits every node. Transforms run on entry only;
//! the exit edge is skipped. The transform for a node is looked up by its
//! [`Kind`] in [`TRANSFORMS`]; kinds without an entry are left unmodified.

use super::ast::{Kind, Node};

/// Classes marking a blockquote visually (left border + padding).
pub const BLOCKQUOTE_CLASS: &str = "border-start border-primary border-3 ps-2";
pub const LINK_TARGET: &str = "_blank";
pub const LINK_REL: &str = "noopener noreferrer";

pub type Transform = fn(&mut Node);

/// Kind → transform table.
pub const TRANSFORMS: &[(Kind, Transform)] = &[
    (Kind::Link, open_in_new_tab),
    (Kind::BlockQuote, mark_blockquote),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Enter,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    Continue,
    SkipChildren,
    Stop,
}

/// Depth-first walk calling `visit` on the enter and exit edge of every node.
pub fn walk<F>(node: &mut Node, visit: &mut F) -> WalkStatus
where
    F: FnMut(&mut Node, Edge) -> WalkStatus,
{
    match visit(node, Edge::Enter) {
        WalkStatus::Stop => return WalkStatus::Stop,
        WalkStatus::SkipChildren => {}
        WalkStatus::Continue => {
            for child in &mut node.children {
                if walk(child, visit) == WalkStatus::Stop {
                    return WalkStatus::Stop;
                }
            }
        }
    }
    visit(node, Edge::Exit)
}

/// Apply the transform table to the whole document.
pub fn apply(document: &mut Node) {
    walk(document, &mut |node, edge| {
        if edge == Edge::Enter
            && let Some((_, transform)) = TRANSFORMS.iter().find(|(k, _)| *k == node.kind.kind())
        {
            transform(node);
        }
        WalkStatus::Continue
    });
}

fn open_in_new_tab(node: &mut Node) {
    node.set_attr("target", LINK_TARGET);
    node.set_attr("rel", LINK_REL);
}

fn mark_blockquote(node: &mut Node) {
    node.set_attr("class", BLOCKQUOTE_CLASS);
}
