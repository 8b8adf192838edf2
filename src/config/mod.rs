//! Configuration management for `hotpage.toml`.
//!
//! # Sections
//!
//! | Section        | Purpose                                          |
//! |----------------|--------------------------------------------------|
//! | `[templates]`  | Template root, layout, pages and components      |
//! | `[watch]`      | Hot reload toggle and reload failure policy      |
//! | `[repository]` | Package repositories for manifest URL lookups    |
//!
//! # Example
//!
//! ```toml
//! [templates]
//! root = "web/templates"
//! pages = ["packages", "package"]
//!
//! [[templates.components]]
//! name = "toast"
//!
//! [watch]
//! on_error = "keep"
//!
//! [repository]
//! url = "https://packages.dl.glasskube.dev/packages"
//! ```

pub mod defaults;
mod error;
mod repository;
mod templates;
mod watch;

pub use error::ConfigError;
pub use repository::RepositoryConfig;
pub use templates::{
    BASE_NAME, COMPONENTS_DIR, ComponentConfig, LAYOUT_DIR, PAGES_DIR, TEMPLATE_EXT,
    TemplatesConfig,
};
pub use watch::{ReloadPolicy, WatchConfig};

use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing hotpage.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Template sources and the fixed template set
    #[serde(default)]
    pub templates: TemplatesConfig,

    /// Hot reload settings
    #[serde(default)]
    pub watch: WatchConfig,

    /// Package repositories
    #[serde(default)]
    pub repository: RepositoryConfig,
}

impl AppConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content)?;
        config.config_path = Self::normalize_path(path);
        Ok(config)
    }

    /// Resolve relative paths against the project root and normalize them.
    pub fn resolve_paths(&mut self, root: &Path) {
        let root = Self::normalize_path(root);
        self.templates.root = Self::normalize_path(&root.join(&self.templates.root));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.templates.validate()?;

        if !self.templates.root.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[templates.root] `{}` is not a directory",
                self.templates.root.display()
            )));
        }

        let urls = std::iter::once(&self.repository.url).chain(self.repository.mirrors.values());
        for url in urls {
            if !url.starts_with("http") {
                bail!(ConfigError::Validation(format!(
                    "repository url `{url}` must start with http:// or https://"
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
