//! External lookups the helper functions delegate to.
//!
//! Helpers close over a [`Collaborators`] bundle. Failures are reported as
//! [`LookupError`] and turned into defaults by the helpers themselves.

use super::package::PackageInfo;
use crate::config::RepositoryConfig;
use std::{cmp::Ordering, fmt::Debug, sync::Arc};
use thiserror::Error;

const MANIFEST_FILE: &str = "package.yaml";

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("package `{0}` has no version")]
    MissingVersion(String),

    #[error("invalid version `{0}`")]
    InvalidVersion(String),

    #[error("lookup failed: {0}")]
    Failed(String),
}

/// Resolves repository locations for packages.
pub trait RepoClientset: Debug + Send + Sync {
    fn package_manifest_url(&self, info: &PackageInfo) -> Result<String, LookupError>;
}

/// Decides whether `latest` is an upgrade over `current`.
pub trait UpgradeChecker: Debug + Send + Sync {
    fn is_upgradable(&self, current: &str, latest: &str) -> Result<bool, LookupError>;
}

/// Collaborator handles shared with every compiled template.
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub repos: Arc<dyn RepoClientset>,
    pub versions: Arc<dyn UpgradeChecker>,
}

impl Collaborators {
    pub fn new(repos: Arc<dyn RepoClientset>, versions: Arc<dyn UpgradeChecker>) -> Self {
        Self { repos, versions }
    }

    pub fn from_config(config: &RepositoryConfig) -> Self {
        Self::new(
            Arc::new(StaticRepoClientset::new(config.clone())),
            Arc::new(DottedVersionChecker),
        )
    }
}

/// Repository client backed by the `[repository]` config section.
///
/// Manifest URL layout: `<repo-url>/<name>/<version>/package.yaml`
#[derive(Debug, Clone)]
pub struct StaticRepoClientset {
    config: RepositoryConfig,
}

impl StaticRepoClientset {
    pub fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }
}

impl RepoClientset for StaticRepoClientset {
    fn package_manifest_url(&self, info: &PackageInfo) -> Result<String, LookupError> {
        if info.version.is_empty() {
            return Err(LookupError::MissingVersion(info.name.clone()));
        }
        let base = self
            .config
            .url_for(info.repository_name.as_deref())
            .trim_end_matches('/');
        Ok(format!(
            "{base}/{}/{}/{MANIFEST_FILE}",
            urlencoding::encode(&info.name),
            urlencoding::encode(&info.version),
        ))
    }
}

/// Compares dotted numeric versions such as `v1.14.2` or `1.2.0+1`.
///
/// A leading `v` and any pre-release or build suffix are ignored; missing
/// trailing components count as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct DottedVersionChecker;

impl DottedVersionChecker {
    fn parse(version: &str) -> Result<Vec<u64>, LookupError> {
        let invalid = || LookupError::InvalidVersion(version.to_owned());
        let core = version.trim().trim_start_matches('v');
        let core = core.split(['-', '+']).next().unwrap_or_default();
        if core.is_empty() {
            return Err(invalid());
        }
        core.split('.')
            .map(|part| part.parse::<u64>().map_err(|_| invalid()))
            .collect()
    }

    fn compare(a: &[u64], b: &[u64]) -> Ordering {
        let len = a.len().max(b.len());
        (0..len)
            .map(|i| {
                let x = a.get(i).copied().unwrap_or(0);
                let y = b.get(i).copied().unwrap_or(0);
                x.cmp(&y)
            })
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl UpgradeChecker for DottedVersionChecker {
    fn is_upgradable(&self, current: &str, latest: &str) -> Result<bool, LookupError> {
        let current = Self::parse(current)?;
        let latest = Self::parse(latest)?;
        Ok(Self::compare(&latest, &current) == Ordering::Greater)
    }
}
