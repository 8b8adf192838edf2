//! HTML serialization of the document tree.
//!
//! Elements are written through `quick_xml`, which escapes text content and
//! attribute values. Raw HTML from the source is never emitted and URLs with
//! script-capable schemes are blanked.

use super::MarkdownError;
use super::ast::{Node, NodeKind};
use quick_xml::{
    Writer,
    events::{BytesEnd, BytesStart, BytesText, Event},
};
use std::io::Cursor;

type HtmlWriter = Writer<Cursor<Vec<u8>>>;

const RAW_HTML_OMITTED: &str = " raw HTML omitted ";

const UNSAFE_SCHEMES: &[&str] = &["javascript:", "vbscript:", "file:", "data:"];
const SAFE_DATA_PREFIXES: &[&str] = &[
    "data:image/png",
    "data:image/gif",
    "data:image/jpeg",
    "data:image/webp",
];

/// Serialize a document tree to an HTML fragment.
pub fn to_html(document: &Node) -> Result<String, MarkdownError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    write_node(&mut writer, document, false)?;
    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8(bytes)?)
}

/// Blank out URLs whose scheme could execute script.
pub fn sanitize_url(url: &str) -> &str {
    let lower = url.trim_start().to_ascii_lowercase();
    let unsafe_scheme = UNSAFE_SCHEMES.iter().any(|s| lower.starts_with(s));
    let safe_data = SAFE_DATA_PREFIXES.iter().any(|s| lower.starts_with(s));
    if unsafe_scheme && !safe_data { "" } else { url }
}

fn write_node(writer: &mut HtmlWriter, node: &Node, tight: bool) -> Result<(), MarkdownError> {
    match &node.kind {
        NodeKind::Document => write_children(writer, node, tight)?,
        NodeKind::Paragraph if tight => write_children(writer, node, tight)?,
        NodeKind::Paragraph => {
            write_wrapped(writer, node, start_tag("p", node), tight)?;
            newline(writer)?;
        }
        NodeKind::Heading { level } => {
            write_wrapped(writer, node, start_tag(&format!("h{level}"), node), tight)?;
            newline(writer)?;
        }
        NodeKind::BlockQuote => {
            let elem = start_tag("blockquote", node);
            let end = elem.to_end().into_owned();
            writer.write_event(Event::Start(elem))?;
            newline(writer)?;
            write_children(writer, node, false)?;
            writer.write_event(Event::End(end))?;
            newline(writer)?;
        }
        NodeKind::List {
            ordered,
            start,
            tight: list_tight,
        } => {
            let tag = if *ordered { "ol" } else { "ul" };
            let mut elem = BytesStart::new(tag);
            if *ordered && *start != 1 {
                elem.push_attribute(("start", start.to_string().as_str()));
            }
            push_extra_attrs(&mut elem, node);
            writer.write_event(Event::Start(elem))?;
            newline(writer)?;
            write_children(writer, node, *list_tight)?;
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
            newline(writer)?;
        }
        NodeKind::Item => {
            write_wrapped(writer, node, start_tag("li", node), tight)?;
            newline(writer)?;
        }
        NodeKind::CodeBlock { info, literal } => {
            writer.write_event(Event::Start(start_tag("pre", node)))?;
            let mut code = BytesStart::new("code");
            if let Some(lang) = info.split_whitespace().next() {
                code.push_attribute(("class", format!("language-{lang}").as_str()));
            }
            writer.write_event(Event::Start(code))?;
            writer.write_event(Event::Text(BytesText::new(literal)))?;
            writer.write_event(Event::End(BytesEnd::new("code")))?;
            writer.write_event(Event::End(BytesEnd::new("pre")))?;
            newline(writer)?;
        }
        NodeKind::ThematicBreak => {
            writer.write_event(Event::Empty(start_tag("hr", node)))?;
            newline(writer)?;
        }
        NodeKind::RawHtml => {
            writer.write_event(Event::Comment(BytesText::from_escaped(RAW_HTML_OMITTED)))?;
        }
        NodeKind::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        NodeKind::Code(code) => {
            writer.write_event(Event::Start(start_tag("code", node)))?;
            writer.write_event(Event::Text(BytesText::new(code)))?;
            writer.write_event(Event::End(BytesEnd::new("code")))?;
        }
        NodeKind::SoftBreak => newline(writer)?,
        NodeKind::LineBreak => {
            writer.write_event(Event::Empty(BytesStart::new("br")))?;
            newline(writer)?;
        }
        NodeKind::Emph => write_wrapped(writer, node, start_tag("em", node), tight)?,
        NodeKind::Strong => write_wrapped(writer, node, start_tag("strong", node), tight)?,
        NodeKind::Link { url, title } => {
            let mut elem = BytesStart::new("a");
            elem.push_attribute(("href", sanitize_url(url)));
            if !title.is_empty() {
                elem.push_attribute(("title", title.as_str()));
            }
            push_extra_attrs(&mut elem, node);
            write_wrapped(writer, node, elem, tight)?;
        }
        NodeKind::Image { url, title } => {
            let alt = node.text_content();
            let mut elem = BytesStart::new("img");
            elem.push_attribute(("src", sanitize_url(url)));
            elem.push_attribute(("alt", alt.as_str()));
            if !title.is_empty() {
                elem.push_attribute(("title", title.as_str()));
            }
            push_extra_attrs(&mut elem, node);
            writer.write_event(Event::Empty(elem))?;
        }
    }
    Ok(())
}

fn write_children(writer: &mut HtmlWriter, node: &Node, tight: bool) -> Result<(), MarkdownError> {
    node.children
        .iter()
        .try_for_each(|child| write_node(writer, child, tight))
}

/// Write `<tag ...>children</tag>`.
fn write_wrapped(
    writer: &mut HtmlWriter,
    node: &Node,
    elem: BytesStart<'_>,
    tight: bool,
) -> Result<(), MarkdownError> {
    let end = elem.to_end().into_owned();
    writer.write_event(Event::Start(elem))?;
    write_children(writer, node, tight)?;
    writer.write_event(Event::End(end))?;
    Ok(())
}

fn start_tag<'a>(tag: &str, node: &Node) -> BytesStart<'a> {
    let mut elem = BytesStart::new(tag.to_owned());
    push_extra_attrs(&mut elem, node);
    elem
}

fn push_extra_attrs(elem: &mut BytesStart<'_>, node: &Node) {
    for (key, value) in &node.attrs {
        elem.push_attribute((key.as_str(), value.as_str()));
    }
}

#[inline]
fn newline(writer: &mut HtmlWriter) -> Result<(), MarkdownError> {
    writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;
    Ok(())
}
