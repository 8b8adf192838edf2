//! `[watch]` section configuration.
//!
//! Contains template hot-reload settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// What the watcher does when a reload fails to compile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadPolicy {
    /// Log the error and terminate the process, same as a failed startup compile.
    #[default]
    Abort,
    /// Log the error and keep serving the previously compiled set.
    Keep,
}

/// `[watch]` section in hotpage.toml - template hot reload.
///
/// # Example
/// ```toml
/// [watch]
/// enable = true
/// on_error = "keep"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Recompile templates when their sources change.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Reload failure handling.
    #[serde(default = "defaults::watch::on_error")]
    #[educe(Default = defaults::watch::on_error())]
    pub on_error: ReloadPolicy,
}
