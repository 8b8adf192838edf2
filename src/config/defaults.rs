//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [templates] Section Defaults
// ============================================================================

pub mod templates {
    use super::super::ComponentConfig;
    use std::path::PathBuf;

    pub fn root() -> PathBuf {
        "templates".into()
    }

    pub fn layout() -> String {
        "base".into()
    }

    pub fn pages() -> Vec<String> {
        [
            "clusterpackages",
            "packages",
            "package",
            "discussion",
            "support",
            "bootstrap",
            "kubeconfig",
            "settings",
            "repository",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    pub fn components() -> Vec<ComponentConfig> {
        let component = |name: &str, requires: &[&str]| ComponentConfig {
            name: name.into(),
            requires: requires.iter().map(|r| (*r).to_owned()).collect(),
        };

        vec![
            component("pkg-detail-header", &["pkg-detail-btns"]),
            component("pkg-config-input", &["datalist"]),
            component("pkg-uninstall-modal", &[]),
            component("toast", &[]),
            component("datalist", &[]),
            component("discussion-badge", &[]),
            component("yaml-modal", &[]),
        ]
    }
}

// ============================================================================
// [watch] Section Defaults
// ============================================================================

pub mod watch {
    use super::super::ReloadPolicy;

    pub fn on_error() -> ReloadPolicy {
        ReloadPolicy::Abort
    }
}

// ============================================================================
// [repository] Section Defaults
// ============================================================================

pub mod repository {
    pub fn url() -> String {
        "https://packages.dl.glasskube.dev/packages".into()
    }
}
