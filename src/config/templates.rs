//! `[templates]` section configuration.
//!
//! Describes the fixed set of templates the registry compiles and where their
//! sources live on disk:
//!
//! ```text
//! <root>/layout/<layout>.html
//! <root>/pages/<page>.html
//! <root>/components/<component>.html
//! ```

use super::{defaults, error::ConfigError};
use educe::Educe;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const LAYOUT_DIR: &str = "layout";
pub const PAGES_DIR: &str = "pages";
pub const COMPONENTS_DIR: &str = "components";
pub const TEMPLATE_EXT: &str = "html";

/// Logical name of the compiled base layout in the template set.
pub const BASE_NAME: &str = "base";

/// `[templates]` section in hotpage.toml.
///
/// # Example
/// ```toml
/// [templates]
/// root = "templates"
/// layout = "base"
/// pages = ["packages", "package"]
///
/// [[templates.components]]
/// name = "pkg-config-input"
/// requires = ["datalist"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct TemplatesConfig {
    /// Templates root directory (relative to project root until resolved)
    #[serde(default = "defaults::templates::root")]
    #[educe(Default = defaults::templates::root())]
    pub root: PathBuf,

    /// File stem of the base layout under `layout/`
    #[serde(default = "defaults::templates::layout")]
    #[educe(Default = defaults::templates::layout())]
    pub layout: String,

    /// Page file stems under `pages/`
    #[serde(default = "defaults::templates::pages")]
    #[educe(Default = defaults::templates::pages())]
    pub pages: Vec<String>,

    /// Components compiled as standalone templates
    #[serde(default = "defaults::templates::components")]
    #[educe(Default = defaults::templates::components())]
    pub components: Vec<ComponentConfig>,
}

/// A standalone component and the other components it renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentConfig {
    pub name: String,

    #[serde(default)]
    pub requires: Vec<String>,
}

impl TemplatesConfig {
    pub fn layout_dir(&self) -> PathBuf {
        self.root.join(LAYOUT_DIR)
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.root.join(PAGES_DIR)
    }

    pub fn components_dir(&self) -> PathBuf {
        self.root.join(COMPONENTS_DIR)
    }

    /// Directories observed by the change watcher.
    pub fn watch_dirs(&self) -> Vec<PathBuf> {
        vec![self.components_dir(), self.layout_dir(), self.pages_dir()]
    }

    /// Engine-internal name of a template: its path relative to the root.
    ///
    /// `("pages", "package")` → `pages/package.html`
    pub fn engine_name(dir: &str, stem: &str) -> String {
        format!("{dir}/{stem}.{TEMPLATE_EXT}")
    }

    /// Absolute source path for an engine-internal name.
    pub fn source_path(&self, engine_name: &str) -> PathBuf {
        self.root.join(Path::new(engine_name))
    }

    /// Check names are non-empty and unique across base, pages and components.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_name(&self.layout) {
            return Err(ConfigError::Validation(format!(
                "[templates.layout] invalid layout name `{}`",
                self.layout
            )));
        }

        let mut seen = FxHashSet::default();
        seen.insert(BASE_NAME);

        let names = self
            .pages
            .iter()
            .chain(self.components.iter().map(|c| &c.name));
        for name in names {
            if !is_valid_name(name) {
                return Err(ConfigError::Validation(format!(
                    "invalid template name `{name}`"
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateTemplate(name.clone()));
            }
        }

        for component in &self.components {
            for required in &component.requires {
                if !is_valid_name(required) {
                    return Err(ConfigError::Validation(format!(
                        "component `{}` has invalid requirement `{required}`",
                        component.name
                    )));
                }
                if required == &component.name {
                    return Err(ConfigError::Validation(format!(
                        "component `{}` requires itself",
                        component.name
                    )));
                }
            }
        }

        Ok(())
    }
}

/// A file stem that stays inside its template directory.
fn is_valid_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.contains(['/', '\\']) && name != ".."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_set() {
        let config = TemplatesConfig::default();
        assert_eq!(config.layout, "base");
        assert_eq!(config.pages.len(), 9);
        let header = config
            .components
            .iter()
            .find(|c| c.name == "pkg-detail-header")
            .unwrap();
        assert_eq!(header.requires, vec!["pkg-detail-btns".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_engine_name() {
        assert_eq!(
            TemplatesConfig::engine_name(PAGES_DIR, "package"),
            "pages/package.html"
        );
    }

    #[test]
    fn test_watch_dirs() {
        let config = TemplatesConfig {
            root: PathBuf::from("/srv/web"),
            ..Default::default()
        };
        let dirs = config.watch_dirs();
        assert_eq!(dirs.len(), 3);
        assert!(dirs.contains(&PathBuf::from("/srv/web/components")));
        assert!(dirs.contains(&PathBuf::from("/srv/web/layout")));
        assert!(dirs.contains(&PathBuf::from("/srv/web/pages")));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let config = TemplatesConfig {
            pages: vec!["toast".into()],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateTemplate(name)) if name == "toast"
        ));

        let config = TemplatesConfig {
            pages: vec!["base".into()],
            components: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_layout_must_stay_in_layout_dir() {
        for layout in ["../secrets", "nested/base", "..\\base", "", ".."] {
            let config = TemplatesConfig {
                layout: layout.into(),
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::Validation(_))),
                "layout `{layout}` should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_names_rejected() {
        let config = TemplatesConfig {
            pages: vec!["nested/page".into()],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TemplatesConfig {
            components: vec![ComponentConfig {
                name: "loop".into(),
                requires: vec!["loop".into()],
            }],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TemplatesConfig {
            components: vec![ComponentConfig {
                name: "modal".into(),
                requires: vec!["../modal".into()],
            }],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
