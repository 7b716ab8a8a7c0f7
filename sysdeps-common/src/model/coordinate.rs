// sysdeps-common/src/model/coordinate.rs
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SysdepsError};

pub const DEFAULT_TYPE: &str = "jar";

/// Identity of one artifact. Equality is exact on every field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    #[serde(rename = "type", default = "default_type")]
    pub kind: String,
}

fn default_type() -> String {
    DEFAULT_TYPE.to_string()
}

impl Coordinate {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
            classifier: None,
            kind: default_type(),
        }
    }

    pub fn with_type(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        let classifier = classifier.into();
        self.classifier = (!classifier.is_empty()).then_some(classifier);
        self
    }

    pub fn gav(&self) -> Gav {
        Gav::new(&self.group, &self.artifact, &self.version)
    }

    pub fn group_artifact(&self) -> GroupArtifact {
        GroupArtifact::new(&self.group, &self.artifact)
    }

    pub fn management_key(&self) -> ManagementKey {
        ManagementKey::new(
            &self.group,
            &self.artifact,
            &self.kind,
            self.classifier.as_deref(),
        )
    }

    pub fn is_pom(&self) -> bool {
        self.kind == "pom"
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.classifier, self.kind.as_str()) {
            (None, DEFAULT_TYPE) => write!(f, "{}:{}:{}", self.group, self.artifact, self.version),
            (None, kind) => write!(f, "{}:{}:{}:{}", self.group, self.artifact, kind, self.version),
            (Some(classifier), kind) => write!(
                f,
                "{}:{}:{}:{}:{}",
                self.group, self.artifact, kind, classifier, self.version
            ),
        }
    }
}

/// A coordinate as typed by a user. The version may be absent or a range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoordinateSpec {
    pub group: String,
    pub artifact: String,
    pub version: Option<String>,
    pub classifier: Option<String>,
    pub kind: String,
}

impl CoordinateSpec {
    pub fn group_artifact(&self) -> GroupArtifact {
        GroupArtifact::new(&self.group, &self.artifact)
    }

    pub fn into_coordinate(self, version: impl Into<String>) -> Coordinate {
        Coordinate {
            group: self.group,
            artifact: self.artifact,
            version: version.into(),
            classifier: self.classifier,
            kind: self.kind,
        }
    }
}

impl FromStr for CoordinateSpec {
    type Err = SysdepsError;

    /// Accepts `g:a`, `g:a:v`, `g:a:type:v` and `g:a:type:classifier:v`.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(SysdepsError::InvalidCoordinate(s.to_string()));
        }
        let own = |p: &str| p.trim().to_string();
        let (kind, classifier, version) = match parts.as_slice() {
            [_, _] => (default_type(), None, None),
            [_, _, v] => (default_type(), None, Some(own(v))),
            [_, _, t, v] => (own(t), None, Some(own(v))),
            [_, _, t, c, v] => (own(t), Some(own(c)), Some(own(v))),
            _ => return Err(SysdepsError::InvalidCoordinate(s.to_string())),
        };
        Ok(Self {
            group: own(parts[0]),
            artifact: own(parts[1]),
            version,
            classifier,
            kind,
        })
    }
}

impl FromStr for Coordinate {
    type Err = SysdepsError;

    fn from_str(s: &str) -> Result<Self> {
        let spec: CoordinateSpec = s.parse()?;
        match spec.version.clone() {
            Some(version) => Ok(spec.into_coordinate(version)),
            None => Err(SysdepsError::InvalidCoordinate(s.to_string())),
        }
    }
}

/// `group:artifact`, the unit of exclusion and version listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupArtifact {
    pub group: String,
    pub artifact: String,
}

impl GroupArtifact {
    pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
        }
    }

    /// Treats `*` (or an empty field) on `self` as a wildcard.
    pub fn matches(&self, other: &GroupArtifact) -> bool {
        let field = |pattern: &str, value: &str| {
            pattern == "*" || pattern.is_empty() || pattern == value
        };
        field(&self.group, &other.group) && field(&self.artifact, &other.artifact)
    }
}

impl fmt::Display for GroupArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)
    }
}

impl FromStr for GroupArtifact {
    type Err = SysdepsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().split_once(':') {
            Some((g, a)) if !g.is_empty() && !a.is_empty() && !a.contains(':') => {
                Ok(Self::new(g.trim(), a.trim()))
            }
            _ => Err(SysdepsError::InvalidCoordinate(s.to_string())),
        }
    }
}

/// `group:artifact:version`, the identity of a descriptor file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Gav {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl Gav {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        }
    }

    pub fn group_artifact(&self) -> GroupArtifact {
        GroupArtifact::new(&self.group, &self.artifact)
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(&self.group, &self.artifact, &self.version)
    }
}

impl fmt::Display for Gav {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

/// `group:artifact:type:classifier`: keys management entries and mediation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ManagementKey {
    pub group: String,
    pub artifact: String,
    pub kind: String,
    pub classifier: String,
}

impl ManagementKey {
    pub fn new(group: &str, artifact: &str, kind: &str, classifier: Option<&str>) -> Self {
        Self {
            group: group.to_string(),
            artifact: artifact.to_string(),
            kind: if kind.is_empty() { DEFAULT_TYPE } else { kind }.to_string(),
            classifier: classifier.unwrap_or_default().to_string(),
        }
    }

    pub fn group_artifact(&self) -> GroupArtifact {
        GroupArtifact::new(&self.group, &self.artifact)
    }
}

impl fmt::Display for ManagementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.kind)?;
        if !self.classifier.is_empty() {
            write!(f, ":{}", self.classifier)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("org.x:lib:1.0", "org.x:lib:1.0")]
    #[case("org.x:lib:pom:1.0", "org.x:lib:pom:1.0")]
    #[case("org.x:lib:jar:linux:1.0", "org.x:lib:jar:linux:1.0")]
    #[case(" org.x:lib:jar:1.0 ", "org.x:lib:1.0")]
    fn coordinate_text_form(#[case] input: &str, #[case] expected: &str) {
        let coordinate: Coordinate = input.parse().unwrap();
        assert_eq!(coordinate.to_string(), expected);
    }

    #[rstest]
    #[case("org.x")]
    #[case("org.x::1.0")]
    #[case("a:b:c:d:e:f")]
    fn rejects_malformed_coordinates(#[case] input: &str) {
        assert!(input.parse::<CoordinateSpec>().is_err());
    }

    #[test]
    fn versionless_spec_is_not_a_coordinate() {
        let spec: CoordinateSpec = "org.x:lib".parse().unwrap();
        assert_eq!(spec.version, None);
        assert!("org.x:lib".parse::<Coordinate>().is_err());
    }

    #[test]
    fn wildcard_exclusions_match() {
        let target = GroupArtifact::new("org.x", "lib");
        assert!(GroupArtifact::new("*", "*").matches(&target));
        assert!(GroupArtifact::new("org.x", "*").matches(&target));
        assert!(!GroupArtifact::new("org.y", "*").matches(&target));
        assert!(GroupArtifact::new("org.x", "lib").matches(&target));
    }

    #[test]
    fn management_key_defaults_type() {
        let key = ManagementKey::new("g", "a", "", None);
        assert_eq!(key.to_string(), "g:a:jar");
        assert_eq!(key, Coordinate::new("g", "a", "1").management_key());
    }
}
