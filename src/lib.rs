//! hotpage - compile-once, hot-reloading HTML page templates.
//!
//! - [`registry`]: compiles layout, pages and components into an atomically
//!   swapped [`TemplateSet`](registry::TemplateSet)
//! - [`watch`]: recompiles the set on every change under the template root
//! - [`funcs`]: filters and functions available inside templates
//! - [`markdown`]: untrusted markdown to sanitized HTML

pub mod config;
pub mod funcs;
pub mod markdown;
pub mod registry;
pub mod utils;
pub mod watch;

pub use config::AppConfig;
pub use registry::{CompiledTemplate, TemplateError, TemplateRegistry, TemplateSet};
pub use watch::{TemplateWatcher, WatchError};
