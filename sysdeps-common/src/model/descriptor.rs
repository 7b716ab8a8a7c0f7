// sysdeps-common/src/model/descriptor.rs
//! Descriptor contents exactly as written, placeholders unexpanded.
use std::path::PathBuf;

use serde::Serialize;

use super::coordinate::{Gav, GroupArtifact};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentRef {
    pub group: String,
    pub artifact: String,
    pub version: String,
    /// `relativePath` as declared. `None` means the default `../pom.xml`,
    /// an empty string disables the filesystem lookup.
    pub relative_path: Option<String>,
}

impl ParentRef {
    pub fn gav(&self) -> Gav {
        Gav::new(&self.group, &self.artifact, &self.version)
    }
}

/// One `<dependency>` element, used both for declarations and for
/// management entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawDependency {
    pub group: String,
    pub artifact: String,
    pub version: Option<String>,
    pub kind: Option<String>,
    pub classifier: Option<String>,
    pub scope: Option<String>,
    pub optional: Option<String>,
    pub exclusions: Vec<GroupArtifact>,
}

impl RawDependency {
    pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            ..Self::default()
        }
    }

    /// Key before interpolation; used while layering descriptors.
    pub fn literal_key(&self) -> (String, String, String, String) {
        (
            self.group.clone(),
            self.artifact.clone(),
            self.kind.clone().unwrap_or_else(|| "jar".to_string()),
            self.classifier.clone().unwrap_or_default(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyCondition {
    /// May start with `!` to require the property to be absent.
    pub name: String,
    /// May start with `!` to require a different value.
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FileCondition {
    Exists(String),
    Missing(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Activation {
    pub active_by_default: bool,
    pub property: Option<PropertyCondition>,
    pub file: Option<FileCondition>,
    /// Conditions this resolver cannot evaluate offline (`jdk`, `os`).
    pub unsupported: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawProfile {
    pub id: String,
    pub activation: Option<Activation>,
    pub properties: Vec<(String, String)>,
    pub dependencies: Vec<RawDependency>,
    pub management: Vec<RawDependency>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawModel {
    pub path: PathBuf,
    pub group: Option<String>,
    pub artifact: String,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<ParentRef>,
    pub properties: Vec<(String, String)>,
    pub dependencies: Vec<RawDependency>,
    pub management: Vec<RawDependency>,
    pub profiles: Vec<RawProfile>,
    /// Elements skipped while parsing.
    pub warnings: Vec<String>,
}

impl RawModel {
    /// Group and version fall back to the parent declaration.
    pub fn group(&self) -> Option<&str> {
        self.group
            .as_deref()
            .or_else(|| self.parent.as_ref().map(|p| p.group.as_str()))
    }

    pub fn version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or_else(|| self.parent.as_ref().map(|p| p.version.as_str()))
    }

    pub fn packaging(&self) -> &str {
        self.packaging.as_deref().unwrap_or("jar")
    }

    /// Literal identity; may still contain placeholders.
    pub fn gav(&self) -> Option<Gav> {
        Some(Gav::new(self.group()?, &self.artifact, self.version()?))
    }
}
