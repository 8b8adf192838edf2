//! Owned markdown document tree.
//!
//! comrak parses into an arena of `RefCell`-wrapped nodes that cannot carry
//! arbitrary HTML attributes. The document is converted into this tagged-union
//! tree so the structural pass can attach attributes before serialization.

use super::MarkdownError;
use comrak::arena_tree::Node as ArenaNode;
use comrak::nodes::{Ast, ListType, NodeValue};
use std::cell::RefCell;

/// Node payload, one variant per supported markdown construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Paragraph,
    Heading { level: u8 },
    BlockQuote,
    List { ordered: bool, start: usize, tight: bool },
    Item,
    CodeBlock { info: String, literal: String },
    ThematicBreak,
    /// Raw HTML from the source, never emitted verbatim.
    RawHtml,
    Text(String),
    Code(String),
    SoftBreak,
    LineBreak,
    Emph,
    Strong,
    Link { url: String, title: String },
    Image { url: String, title: String },
}

/// Payload-free discriminant of [`NodeKind`], used to key transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Document,
    Paragraph,
    Heading,
    BlockQuote,
    List,
    Item,
    CodeBlock,
    ThematicBreak,
    RawHtml,
    Text,
    Code,
    SoftBreak,
    LineBreak,
    Emph,
    Strong,
    Link,
    Image,
}

impl NodeKind {
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Document => Kind::Document,
            Self::Paragraph => Kind::Paragraph,
            Self::Heading { .. } => Kind::Heading,
            Self::BlockQuote => Kind::BlockQuote,
            Self::List { .. } => Kind::List,
            Self::Item => Kind::Item,
            Self::CodeBlock { .. } => Kind::CodeBlock,
            Self::ThematicBreak => Kind::ThematicBreak,
            Self::RawHtml => Kind::RawHtml,
            Self::Text(_) => Kind::Text,
            Self::Code(_) => Kind::Code,
            Self::SoftBreak => Kind::SoftBreak,
            Self::LineBreak => Kind::LineBreak,
            Self::Emph => Kind::Emph,
            Self::Strong => Kind::Strong,
            Self::Link { .. } => Kind::Link,
            Self::Image { .. } => Kind::Image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Extra HTML attributes, emitted after the kind's own attributes.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Node {
    pub const fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_children(kind: NodeKind, children: Vec<Node>) -> Self {
        Self {
            kind,
            attrs: Vec::new(),
            children,
        }
    }

    /// Set an attribute, replacing any previous value for the same key.
    pub fn set_attr(&mut self, key: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_owned(),
            None => self.attrs.push((key.to_owned(), value.to_owned())),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Concatenated text of all descendants (used for image alt text).
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.kind {
            NodeKind::Text(text) | NodeKind::Code(text) => out.push_str(text),
            NodeKind::SoftBreak | NodeKind::LineBreak => out.push(' '),
            _ => self.children.iter().for_each(|c| c.collect_text(out)),
        }
    }
}

/// Deepest nesting accepted below the document node.
///
/// The converted tree is walked and serialized recursively, so this bounds
/// the stack those passes need.
pub const MAX_DEPTH: usize = 64;

/// Convert a parsed comrak document into an owned tree.
///
/// Fails on node kinds outside the supported set and on documents nested
/// deeper than [`MAX_DEPTH`]; the renderer treats both like any other
/// conversion failure.
pub fn from_comrak<'a>(node: &'a ArenaNode<'a, RefCell<Ast>>) -> Result<Node, MarkdownError> {
    convert(node, 0)
}

fn convert<'a>(node: &'a ArenaNode<'a, RefCell<Ast>>, depth: usize) -> Result<Node, MarkdownError> {
    if depth > MAX_DEPTH {
        return Err(MarkdownError::TooDeep(MAX_DEPTH));
    }
    let ast = node.data.borrow();

    let kind = match &ast.value {
        NodeValue::Document => NodeKind::Document,
        NodeValue::Paragraph => NodeKind::Paragraph,
        NodeValue::Heading(heading) => NodeKind::Heading {
            level: heading.level,
        },
        NodeValue::BlockQuote => NodeKind::BlockQuote,
        NodeValue::List(list) => NodeKind::List {
            ordered: matches!(list.list_type, ListType::Ordered),
            start: list.start,
            tight: list.tight,
        },
        NodeValue::Item(_) => NodeKind::Item,
        NodeValue::CodeBlock(code_block) => NodeKind::CodeBlock {
            info: code_block.info.clone(),
            literal: code_block.literal.clone(),
        },
        NodeValue::ThematicBreak => NodeKind::ThematicBreak,
        NodeValue::HtmlBlock(_) | NodeValue::HtmlInline(_) => NodeKind::RawHtml,
        NodeValue::Text(text) => NodeKind::Text(text.to_string()),
        NodeValue::Code(code) => NodeKind::Code(code.literal.clone()),
        NodeValue::SoftBreak => NodeKind::SoftBreak,
        NodeValue::LineBreak => NodeKind::LineBreak,
        NodeValue::Emph => NodeKind::Emph,
        NodeValue::Strong => NodeKind::Strong,
        NodeValue::Link(link) => NodeKind::Link {
            url: link.url.clone(),
            title: link.title.clone(),
        },
        NodeValue::Image(link) => NodeKind::Image {
            url: link.url.clone(),
            title: link.title.clone(),
        },
        other => return Err(MarkdownError::Unsupported(other.xml_node_name())),
    };

    let children = node
        .children()
        .map(|child| convert(child, depth + 1))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Node::with_children(kind, children))
}
