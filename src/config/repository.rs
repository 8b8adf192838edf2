//! `[repository]` section configuration.
//!
//! Package repositories used to resolve manifest URLs from templates.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `[repository]` section in hotpage.toml.
///
/// # Example
/// ```toml
/// [repository]
/// url = "https://packages.dl.glasskube.dev/packages"
///
/// [repository.mirrors]
/// internal = "https://mirror.example.com/packages"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Default repository, used for packages without a repository name.
    #[serde(default = "defaults::repository::url")]
    #[educe(Default = defaults::repository::url())]
    pub url: String,

    /// Additional repositories keyed by repository name.
    #[serde(default)]
    pub mirrors: BTreeMap<String, String>,
}

impl RepositoryConfig {
    /// Base URL for a package's repository, falling back to the default.
    pub fn url_for(&self, repository: Option<&str>) -> &str {
        repository
            .and_then(|name| self.mirrors.get(name))
            .map_or(self.url.as_str(), String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::super::AppConfig;

    #[test]
    fn test_repository_config() {
        let config = r#"
            [repository]
            url = "https://example.com/packages"

            [repository.mirrors]
            internal = "https://mirror.local/pkgs"
        "#;
        let config: AppConfig = toml::from_str(config).unwrap();

        assert_eq!(config.repository.url_for(None), "https://example.com/packages");
        assert_eq!(
            config.repository.url_for(Some("internal")),
            "https://mirror.local/pkgs"
        );
        assert_eq!(
            config.repository.url_for(Some("unknown")),
            "https://example.com/packages"
        );
    }

    #[test]
    fn test_repository_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.repository.url.starts_with("https://"));
        assert!(config.repository.mirrors.is_empty());
    }
}
