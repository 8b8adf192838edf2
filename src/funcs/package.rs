//! Read-only views of the domain objects templates pass to helpers.
//!
//! Templates receive plain JSON values. Helpers turn them back into these
//! types and treat anything missing or malformed as absent.

use serde::{Deserialize, Serialize, Serializer};
use tera::Value;

/// Condition type marking a repository as usable.
pub const CONDITION_READY: &str = "Ready";
/// Condition status value for a satisfied condition.
pub const STATUS_TRUE: &str = "True";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSpec {
    pub package_info: PackageInfo,
    #[serde(default)]
    pub suspend: bool,
}

/// A package or cluster package as seen by templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSnapshot {
    pub spec: PackageSpec,
    #[serde(default)]
    pub auto_updates_enabled: bool,
}

impl PackageSnapshot {
    pub fn spec(&self) -> &PackageSpec {
        &self.spec
    }

    pub fn auto_updates_enabled(&self) -> bool {
        self.auto_updates_enabled
    }
}

/// Package handle that may not point at a package.
///
/// Serializes as `null` when absent so templates can pass it straight back
/// into helpers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PackageHandle {
    #[default]
    Absent,
    Present(PackageSnapshot),
}

impl PackageHandle {
    /// Build a handle from a template value.
    ///
    /// `null`, a missing value, an object without a spec, a package with an
    /// empty name and anything that fails to deserialize are all absent.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Absent,
            Some(value) => match PackageSnapshot::deserialize(value) {
                Ok(pkg) if !pkg.spec.package_info.name.is_empty() => Self::Present(pkg),
                _ => Self::Absent,
            },
        }
    }

    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub const fn as_present(&self) -> Option<&PackageSnapshot> {
        match self {
            Self::Present(pkg) => Some(pkg),
            Self::Absent => None,
        }
    }
}

impl From<Option<PackageSnapshot>> for PackageHandle {
    fn from(pkg: Option<PackageSnapshot>) -> Self {
        pkg.map_or(Self::Absent, Self::Present)
    }
}

impl Serialize for PackageHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absent => serializer.serialize_none(),
            Self::Present(pkg) => pkg.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl RepositoryStatus {
    pub fn find_condition(&self, kind: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.kind == kind)
    }

    pub fn is_ready(&self) -> bool {
        self.find_condition(CONDITION_READY)
            .is_some_and(|c| c.status == STATUS_TRUE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRepository {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: RepositoryStatus,
}

impl PackageRepository {
    pub fn from_value(value: Option<&Value>) -> Option<Self> {
        value.and_then(|v| Self::deserialize(v).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot_json() -> Value {
        json!({
            "spec": {
                "packageInfo": { "name": "cert-manager", "version": "v1.14.2" },
                "suspend": true
            },
            "autoUpdatesEnabled": true
        })
    }

    #[test]
    fn test_handle_from_value_present() {
        let value = snapshot_json();
        let handle = PackageHandle::from_value(Some(&value));
        let pkg = handle.as_present().expect("package should be present");
        assert_eq!(pkg.spec().package_info.name, "cert-manager");
        assert!(pkg.spec().suspend);
        assert!(pkg.auto_updates_enabled());
    }

    #[test]
    fn test_handle_from_value_absent() {
        assert!(PackageHandle::from_value(None).is_absent());
        assert!(PackageHandle::from_value(Some(&Value::Null)).is_absent());
        assert!(PackageHandle::from_value(Some(&json!({}))).is_absent());
        assert!(PackageHandle::from_value(Some(&json!("cert-manager"))).is_absent());
        let unnamed = json!({ "spec": { "packageInfo": { "name": "" } } });
        assert!(PackageHandle::from_value(Some(&unnamed)).is_absent());
    }

    #[test]
    fn test_handle_serializes_back() {
        let value = snapshot_json();
        let handle = PackageHandle::from_value(Some(&value));
        let round = serde_json::to_value(&handle).unwrap();
        assert_eq!(PackageHandle::from_value(Some(&round)), handle);
        assert_eq!(serde_json::to_value(PackageHandle::Absent).unwrap(), Value::Null);
    }

    #[test]
    fn test_repository_ready_condition() {
        let ready = json!({
            "metadata": { "name": "glasskube" },
            "status": { "conditions": [
                { "type": "Synced", "status": "False" },
                { "type": "Ready", "status": "True", "reason": "Ok" }
            ]}
        });
        let repo = PackageRepository::from_value(Some(&ready)).unwrap();
        assert_eq!(repo.metadata.name, "glasskube");
        assert!(repo.status.is_ready());

        let unknown = json!({ "status": { "conditions": [{ "type": "Ready", "status": "Unknown" }] } });
        let repo = PackageRepository::from_value(Some(&unknown)).unwrap();
        assert!(!repo.status.is_ready());

        let bare = PackageRepository::from_value(Some(&json!({}))).unwrap();
        assert!(!bare.status.is_ready());
    }
}
