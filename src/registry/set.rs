//! Compiled template set produced by one compile cycle.

use super::error::TemplateError;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::Arc;
use tera::{Context, Tera};

/// A ready-to-render template.
///
/// Cheap to clone: the parsed engine instance is shared behind an `Arc` and
/// never mutated after compilation.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    name: String,
    entry: String,
    engine: Arc<Tera>,
}

impl CompiledTemplate {
    pub(crate) fn new(name: &str, entry: &str, engine: Arc<Tera>) -> Self {
        Self {
            name: name.to_owned(),
            entry: entry.to_owned(),
            engine,
        }
    }

    /// Logical name, e.g. `package` or `toast`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Engine-internal name of the template that gets rendered.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Every template parsed into this instance, sorted.
    pub fn engine_templates(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.engine.get_template_names().collect();
        names.sort_unstable();
        names
    }

    pub fn render(&self, context: &Context) -> Result<String, TemplateError> {
        self.engine
            .render(&self.entry, context)
            .map_err(|source| TemplateError::Render {
                name: self.name.clone(),
                source,
            })
    }

    /// Render with any serializable value as the context.
    pub fn render_value<T: Serialize>(&self, data: &T) -> Result<String, TemplateError> {
        let context = Context::from_serialize(data).map_err(TemplateError::Context)?;
        self.render(&context)
    }
}

/// All compiled templates keyed by logical name.
#[derive(Debug, Default)]
pub struct TemplateSet {
    templates: FxHashMap<String, CompiledTemplate>,
    generation: u64,
}

impl TemplateSet {
    pub(crate) fn insert(&mut self, template: CompiledTemplate) {
        self.templates.insert(template.name.clone(), template);
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub fn get(&self, name: &str) -> Option<&CompiledTemplate> {
        self.templates.get(name)
    }

    /// Logical names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Compile cycle that produced this set; `0` for the initial empty set.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
