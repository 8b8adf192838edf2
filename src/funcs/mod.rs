//! Helper filters and functions available inside every template.
//!
//! | Name                   | Kind     | Result on bad input       |
//! |------------------------|----------|---------------------------|
//! | `markdown`             | filter   | `<p>{source}</p>`         |
//! | `reversed`             | filter   | input unchanged           |
//! | `url_escape`           | filter   | escaped string form       |
//! | `package_manifest_url` | function | `""`                      |
//! | `is_upgradable`        | function | `false`                   |
//! | `is_repo_status_ready` | function | `false`                   |
//! | `auto_update_enabled`  | function | `false`                   |
//! | `is_suspended`         | function | `false`                   |
//!
//! None of them ever returns an error, so a template render cannot fail
//! because of missing or broken data handed to a helper.

pub mod collaborators;
pub mod package;

pub use collaborators::{
    Collaborators, DottedVersionChecker, LookupError, RepoClientset, StaticRepoClientset,
    UpgradeChecker,
};
pub use package::{PackageHandle, PackageInfo, PackageRepository, PackageSnapshot, PackageSpec};

use crate::markdown::MarkdownRenderer;
use std::{borrow::Cow, collections::HashMap, sync::Arc};
use tera::{Filter, Function, Result, Tera, Value};

pub const FILTERS: &[&str] = &["markdown", "reversed", "url_escape"];
pub const FUNCTIONS: &[&str] = &[
    "package_manifest_url",
    "is_upgradable",
    "is_repo_status_ready",
    "auto_update_enabled",
    "is_suspended",
];

/// The helper set installed into each template at compile time.
///
/// Built fresh on every compile so entries that close over collaborators
/// pick up the registry's current ones.
#[derive(Debug, Clone)]
pub struct FunctionLibrary {
    markdown: Markdown,
    package_manifest_url: PackageManifestUrl,
    is_upgradable: IsUpgradable,
}

impl FunctionLibrary {
    pub fn new(collaborators: &Collaborators) -> Self {
        Self {
            markdown: Markdown {
                renderer: MarkdownRenderer::new(),
            },
            package_manifest_url: PackageManifestUrl {
                repos: Arc::clone(&collaborators.repos),
            },
            is_upgradable: IsUpgradable {
                versions: Arc::clone(&collaborators.versions),
            },
        }
    }

    /// Register every filter and function on a template engine instance.
    pub fn install(&self, tera: &mut Tera) {
        tera.register_filter("markdown", self.markdown);
        tera.register_filter("reversed", reversed);
        tera.register_filter("url_escape", url_escape);

        tera.register_function("package_manifest_url", self.package_manifest_url.clone());
        tera.register_function("is_upgradable", self.is_upgradable.clone());
        tera.register_function("is_repo_status_ready", is_repo_status_ready);
        tera.register_function("auto_update_enabled", auto_update_enabled);
        tera.register_function("is_suspended", is_suspended);
    }
}

// ============================================================================
// Filters
// ============================================================================

/// `{{ text | markdown }}`, output is inserted without further escaping.
#[derive(Debug, Clone, Copy)]
struct Markdown {
    renderer: MarkdownRenderer,
}

impl Filter for Markdown {
    fn filter(&self, value: &Value, _args: &HashMap<String, Value>) -> Result<Value> {
        let html = match value {
            Value::Null => return Ok(Value::String(String::new())),
            Value::String(source) => self.renderer.render(source),
            other => self.renderer.render(&other.to_string()),
        };
        Ok(Value::String(html.into_string()))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

/// Reverse a sequence into a new array; other values pass through.
pub fn reversed(value: &Value, _args: &HashMap<String, Value>) -> Result<Value> {
    Ok(match value {
        Value::Array(items) => Value::Array(items.iter().rev().cloned().collect()),
        other => other.clone(),
    })
}

/// Escape a value for use inside a URL query component.
pub fn url_escape(value: &Value, _args: &HashMap<String, Value>) -> Result<Value> {
    let raw: Cow<'_, str> = match value {
        Value::String(s) => Cow::Borrowed(s),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    };
    Ok(Value::String(urlencoding::encode(&raw).into_owned()))
}

// ============================================================================
// Functions
// ============================================================================

fn package_arg(args: &HashMap<String, Value>) -> PackageHandle {
    PackageHandle::from_value(args.get("pkg"))
}

fn str_arg<'a>(args: &'a HashMap<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

/// `package_manifest_url(pkg=package)`
#[derive(Debug, Clone)]
struct PackageManifestUrl {
    repos: Arc<dyn RepoClientset>,
}

impl Function for PackageManifestUrl {
    fn call(&self, args: &HashMap<String, Value>) -> Result<Value> {
        let url = match package_arg(args) {
            PackageHandle::Present(pkg) => self
                .repos
                .package_manifest_url(&pkg.spec.package_info)
                .unwrap_or_default(),
            PackageHandle::Absent => String::new(),
        };
        Ok(Value::String(url))
    }
}

/// `is_upgradable(current=installed, latest=available)`
#[derive(Debug, Clone)]
struct IsUpgradable {
    versions: Arc<dyn UpgradeChecker>,
}

impl Function for IsUpgradable {
    fn call(&self, args: &HashMap<String, Value>) -> Result<Value> {
        let upgradable = match (str_arg(args, "current"), str_arg(args, "latest")) {
            (Some(current), Some(latest)) => self
                .versions
                .is_upgradable(current, latest)
                .unwrap_or(false),
            _ => false,
        };
        Ok(Value::Bool(upgradable))
    }
}

/// `is_repo_status_ready(repo=repository)`
pub fn is_repo_status_ready(args: &HashMap<String, Value>) -> Result<Value> {
    let ready = PackageRepository::from_value(args.get("repo"))
        .is_some_and(|repo| repo.status.is_ready());
    Ok(Value::Bool(ready))
}

/// `auto_update_enabled(pkg=package)`
pub fn auto_update_enabled(args: &HashMap<String, Value>) -> Result<Value> {
    let enabled = match package_arg(args) {
        PackageHandle::Present(pkg) => pkg.auto_updates_enabled(),
        PackageHandle::Absent => false,
    };
    Ok(Value::Bool(enabled))
}

/// `is_suspended(pkg=package)`
pub fn is_suspended(args: &HashMap<String, Value>) -> Result<Value> {
    let suspended = match package_arg(args) {
        PackageHandle::Present(pkg) => pkg.spec().suspend,
        PackageHandle::Absent => false,
    };
    Ok(Value::Bool(suspended))
}

// ============================================================================
// Tests
// ============================================================================
