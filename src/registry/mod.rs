//! Template registry.
//!
//! Compiles the fixed template set from disk and publishes it atomically.
//! Readers always observe one complete set: either the previous one or the
//! freshly compiled one, never a mix.
//!
//! # Compile phases
//!
//! ```text
//! layout/<layout>.html ─┐
//! components/*.html ─────┴─► base engine (+ function library)
//!                              │
//!             ┌────────────────┴───────────────┐
//!             ▼ clone per page                 ▼ fresh engine per component
//!   + pages/<page>.html               components/<requires>.html
//!                                     + components/<name>.html
//! ```

mod error;
mod set;

#[cfg(test)]
pub(crate) mod fixture;

pub use error::TemplateError;
pub use set::{CompiledTemplate, TemplateSet};

use crate::config::{
    BASE_NAME, COMPONENTS_DIR, LAYOUT_DIR, PAGES_DIR, TEMPLATE_EXT, TemplatesConfig,
};
use crate::funcs::{Collaborators, FunctionLibrary};
use crate::log;
use arc_swap::ArcSwap;
use rustc_hash::FxHashMap;
use std::{
    fs, io,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Instant,
};
use tera::Tera;

/// Error name used when a shared component fails to parse.
const SHARED_COMPONENTS: &str = "components/*.html";

/// Owner of the current template set.
///
/// Shared between request handlers and the change watcher behind an `Arc`.
/// `get` never blocks on a running compile.
#[derive(Debug)]
pub struct TemplateRegistry {
    config: TemplatesConfig,
    collaborators: Collaborators,
    current: ArcSwap<TemplateSet>,
    /// Last generation ticket handed out to a compile.
    tickets: AtomicU64,
}

impl TemplateRegistry {
    /// Create a registry holding an empty set. Call [`compile`](Self::compile)
    /// before serving.
    pub fn new(config: TemplatesConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
            current: ArcSwap::from_pointee(TemplateSet::default()),
            tickets: AtomicU64::new(0),
        }
    }

    /// Create a registry and compile the initial set.
    pub fn load(
        config: TemplatesConfig,
        collaborators: Collaborators,
    ) -> Result<Self, TemplateError> {
        let registry = Self::new(config, collaborators);
        registry.compile()?;
        Ok(registry)
    }

    pub fn config(&self) -> &TemplatesConfig {
        &self.config
    }

    /// Rebuild every template from disk and replace the current set.
    ///
    /// On failure the current set is left untouched. When compiles overlap,
    /// the one that started last wins regardless of which finishes first.
    pub fn compile(&self) -> Result<Arc<TemplateSet>, TemplateError> {
        let start = Instant::now();
        let ticket = self.tickets.fetch_add(1, Ordering::AcqRel) + 1;

        let mut set = self.build()?;
        set.set_generation(ticket);
        let set = self.publish(set);

        if set.generation() == ticket {
            log!(
                "compile";
                "{} templates ready in {:.1?} (generation {ticket})",
                set.len(),
                start.elapsed()
            );
        } else {
            log!(
                "compile";
                "generation {ticket} superseded by generation {}",
                set.generation()
            );
        }
        Ok(set)
    }

    /// Swap `set` in unless a newer generation is already published.
    /// Returns the set that is current afterwards.
    fn publish(&self, set: TemplateSet) -> Arc<TemplateSet> {
        let set = Arc::new(set);
        let previous = self.current.rcu(|current| {
            if current.generation() > set.generation() {
                Arc::clone(current)
            } else {
                Arc::clone(&set)
            }
        });
        if previous.generation() > set.generation() {
            previous
        } else {
            set
        }
    }

    /// Look up a compiled template by logical name.
    pub fn get(&self, name: &str) -> Option<CompiledTemplate> {
        self.current.load().get(name).cloned()
    }

    /// Render a template by logical name with serializable data.
    pub fn render<T: serde::Serialize>(
        &self,
        name: &str,
        data: &T,
    ) -> Result<String, TemplateError> {
        self.get(name)
            .ok_or_else(|| TemplateError::UnknownTemplate(name.to_owned()))?
            .render_value(data)
    }

    /// The set currently published.
    pub fn snapshot(&self) -> Arc<TemplateSet> {
        self.current.load_full()
    }

    /// Generation of the published set; `0` before the first compile.
    ///
    /// Strictly increases with every successful compile.
    pub fn generation(&self) -> u64 {
        self.current.load().generation()
    }

    fn build(&self) -> Result<TemplateSet, TemplateError> {
        let library = FunctionLibrary::new(&self.collaborators);
        let components = self.read_components()?;
        let mut set = TemplateSet::default();

        // Shared base: layout plus every component, parsed once
        let layout = TemplatesConfig::engine_name(LAYOUT_DIR, &self.config.layout);
        let mut base = Tera::default();
        library.install(&mut base);
        base.add_raw_template(&layout, &self.read(&layout)?)
            .map_err(TemplateError::parse(&layout))?;
        base.add_raw_templates(
            components
                .iter()
                .map(|(name, source)| (name.as_str(), source.as_str())),
        )
        .map_err(TemplateError::parse(SHARED_COMPONENTS))?;
        let base = Arc::new(base);
        set.insert(CompiledTemplate::new(BASE_NAME, &layout, Arc::clone(&base)));

        // Pages: an independent copy of the base each, never the base itself
        for page in &self.config.pages {
            let entry = TemplatesConfig::engine_name(PAGES_DIR, page);
            let source = self.read(&entry)?;

            let mut engine = Tera::clone(&base);
            engine
                .add_raw_template(&entry, &source)
                .map_err(TemplateError::parse(&entry))?;
            set.insert(CompiledTemplate::new(page, &entry, Arc::new(engine)));
        }

        // Standalone components: dependencies first, then the component itself
        for component in &self.config.components {
            let entry = TemplatesConfig::engine_name(COMPONENTS_DIR, &component.name);
            let mut templates = Vec::with_capacity(component.requires.len() + 1);
            for name in component.requires.iter().chain([&component.name]) {
                let engine_name = TemplatesConfig::engine_name(COMPONENTS_DIR, name);
                let source = components.get(&engine_name).ok_or_else(|| TemplateError::Read {
                    path: self.config.source_path(&engine_name),
                    source: io::Error::new(io::ErrorKind::NotFound, "component not found"),
                })?;
                templates.push((engine_name, source.as_str()));
            }

            let mut engine = Tera::default();
            library.install(&mut engine);
            engine
                .add_raw_templates(templates)
                .map_err(TemplateError::parse(&entry))?;
            set.insert(CompiledTemplate::new(&component.name, &entry, Arc::new(engine)));
        }

        Ok(set)
    }

    fn read(&self, engine_name: &str) -> Result<String, TemplateError> {
        let path = self.config.source_path(engine_name);
        fs::read_to_string(&path).map_err(|source| TemplateError::Read { path, source })
    }

    /// Every `*.html` file directly under `components/`, keyed by engine name.
    fn read_components(&self) -> Result<FxHashMap<String, String>, TemplateError> {
        let dir = self.config.components_dir();
        let read_err = |source| TemplateError::Read {
            path: dir.clone(),
            source,
        };

        let mut components = FxHashMap::default();
        for entry in fs::read_dir(&dir).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            if !path.is_file() || !is_template(&path) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let name = TemplatesConfig::engine_name(COMPONENTS_DIR, stem);
            let source = self.read(&name)?;
            components.insert(name, source);
        }
        Ok(components)
    }
}

fn is_template(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == TEMPLATE_EXT)
}

// ============================================================================
// Tests
// ============================================================================
