// sysdeps-common/src/model/effective.rs
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::Serialize;

use super::coordinate::{Coordinate, Gav, GroupArtifact, ManagementKey};
use super::scope::Scope;

/// A dependency declaration after interpolation and management.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub group: String,
    pub artifact: String,
    /// Plain version or range; `None` when neither declared nor managed.
    pub version: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    pub scope: Scope,
    pub optional: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclusions: Vec<GroupArtifact>,
}

impl Dependency {
    pub fn key(&self) -> ManagementKey {
        ManagementKey::new(
            &self.group,
            &self.artifact,
            &self.kind,
            self.classifier.as_deref(),
        )
    }

    pub fn group_artifact(&self) -> GroupArtifact {
        GroupArtifact::new(&self.group, &self.artifact)
    }

    pub fn coordinate(&self, version: impl Into<String>) -> Coordinate {
        Coordinate {
            group: self.group.clone(),
            artifact: self.artifact.clone(),
            version: version.into(),
            classifier: self.classifier.clone(),
            kind: self.kind.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagedDependency {
    pub group: String,
    pub artifact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclusions: Vec<GroupArtifact>,
}

impl ManagedDependency {
    pub fn key(&self) -> ManagementKey {
        ManagementKey::new(
            &self.group,
            &self.artifact,
            &self.kind,
            self.classifier.as_deref(),
        )
    }

    /// `scope=import, type=pom` entries stand for another descriptor's table.
    pub fn is_import(&self) -> bool {
        self.scope == Some(Scope::Import) && self.kind == "pom"
    }
}

/// Management entries in declaration order, unique by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManagementTable {
    entries: Vec<ManagedDependency>,
    #[serde(skip)]
    positions: HashMap<ManagementKey, usize>,
}

impl ManagementTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ManagementKey) -> Option<&ManagedDependency> {
        self.positions.get(key).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, key: &ManagementKey) -> bool {
        self.positions.contains_key(key)
    }

    /// Replaces an existing entry in place, or appends a new key.
    pub fn upsert(&mut self, entry: ManagedDependency) {
        match self.positions.get(&entry.key()) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.positions.insert(entry.key(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Appends only when the key is new.
    pub fn insert_if_absent(&mut self, entry: ManagedDependency) -> bool {
        if self.contains(&entry.key()) {
            return false;
        }
        self.upsert(entry);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManagedDependency> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ManagedDependency> for ManagementTable {
    fn from_iter<I: IntoIterator<Item = ManagedDependency>>(iter: I) -> Self {
        let mut table = ManagementTable::new();
        for entry in iter {
            table.upsert(entry);
        }
        table
    }
}

/// Outcome of evaluating one profile's activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileDecision {
    /// Descriptor that declares the profile.
    pub declared_in: String,
    pub id: String,
    pub active: bool,
    pub reason: String,
}

/// Fully merged, interpolated metadata for one coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveModel {
    /// `type` carries the packaging.
    pub coordinate: Coordinate,
    pub descriptor: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Gav>,
    /// Child first, ending at the topmost ancestor.
    pub lineage: Vec<Gav>,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<Dependency>,
    pub management: ManagementTable,
    pub profiles: Vec<ProfileDecision>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl EffectiveModel {
    pub fn gav(&self) -> Gav {
        self.coordinate.gav()
    }

    pub fn packaging(&self) -> &str {
        &self.coordinate.kind
    }

    pub fn active_profiles(&self) -> impl Iterator<Item = &ProfileDecision> {
        self.profiles.iter().filter(|p| p.active)
    }
}
