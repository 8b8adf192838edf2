//! Markdown to HTML rendering for template content.
//!
//! # Pipeline
//!
//! ```text
//! source ──▶ comrak (autolink) ──▶ ast::Node tree ──▶ transform::apply ──▶ html::to_html
//!                                                                              │
//!             any failure ─────────────────────────▶ "<p>{source}</p>" ◀───────┘ (on error)
//! ```
//!
//! The renderer is the only safety boundary for markdown output: its result is
//! wrapped in [`SafeHtml`] and the template engine inserts it unescaped.

pub mod ast;
pub mod html;
pub mod transform;

use comrak::{Arena, Options, parse_document};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarkdownError {
    #[error("input is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("unsupported markdown node `{0}`")]
    Unsupported(&'static str),

    #[error("document nested deeper than {0} levels")]
    TooDeep(usize),

    #[error("failed to write html")]
    Write(#[from] std::io::Error),

    #[error("serialized html is not valid UTF-8")]
    Output(#[from] std::string::FromUtf8Error),
}

/// HTML that has already been made safe for direct embedding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SafeHtml(String);

impl SafeHtml {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SafeHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Converts markdown to post-processed HTML fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub const fn new() -> Self {
        Self
    }

    /// Render markdown, falling back to a plain paragraph on any failure.
    pub fn render(&self, source: &str) -> SafeHtml {
        match self.try_render(source) {
            Ok(html) => SafeHtml(html),
            Err(_) => fallback(source),
        }
    }

    /// Render raw bytes. Input that is not valid UTF-8 takes the fallback path.
    pub fn render_bytes(&self, source: &[u8]) -> SafeHtml {
        let rendered = std::str::from_utf8(source)
            .map_err(MarkdownError::from)
            .and_then(|s| self.try_render(s));
        match rendered {
            Ok(html) => SafeHtml(html),
            Err(_) => fallback(&String::from_utf8_lossy(source)),
        }
    }

    /// Run the full pipeline, surfacing the failure instead of falling back.
    pub fn try_render(&self, source: &str) -> Result<String, MarkdownError> {
        let mut options = Options::default();
        options.extension.autolink = true;

        let arena = Arena::new();
        let root = parse_document(&arena, source, &options);
        let mut document = ast::from_comrak(root)?;
        transform::apply(&mut document);
        html::to_html(&document)
    }
}

/// Degraded output: the source as-is inside a paragraph, no attributes.
fn fallback(source: &str) -> SafeHtml {
    SafeHtml(format!("<p>{source}</p>"))
}
