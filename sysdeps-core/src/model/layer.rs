// sysdeps-core/src/model/layer.rs
//! One descriptor's contribution to an inheritance chain, and the merge
//! that folds a chain into a single layer.
use std::collections::BTreeMap;

use sysdeps_common::model::{Gav, ProfileDecision, RawDependency, RawModel, RawProfile};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelLayer {
    pub group: Option<String>,
    pub version: Option<String>,
    pub properties: BTreeMap<String, String>,
    /// Unique by literal key; an override keeps the original position.
    pub management: Vec<RawDependency>,
    pub dependencies: Vec<RawDependency>,
    pub profiles: Vec<ProfileDecision>,
    /// Topmost ancestor first.
    pub lineage: Vec<Gav>,
}

impl ModelLayer {
    /// Base content of `raw` with its active profiles applied on top.
    pub fn from_descriptor(
        raw: &RawModel,
        gav: Gav,
        active: &[&RawProfile],
        decisions: Vec<ProfileDecision>,
    ) -> Self {
        let mut layer = ModelLayer {
            group: raw.group.clone(),
            version: raw.version.clone(),
            properties: raw.properties.iter().cloned().collect(),
            management: Vec::new(),
            dependencies: raw.dependencies.clone(),
            profiles: decisions,
            lineage: vec![gav],
        };
        for entry in &raw.management {
            upsert(&mut layer.management, entry.clone());
        }

        for profile in active {
            layer.properties.extend(profile.properties.iter().cloned());
            for entry in &profile.management {
                upsert(&mut layer.management, entry.clone());
            }
            layer.dependencies.extend(profile.dependencies.iter().cloned());
        }
        layer
    }

    /// `child` layered over `parent`. Associative, so a chain may be folded
    /// from either end.
    pub fn merge(parent: &ModelLayer, child: &ModelLayer) -> ModelLayer {
        let mut merged = parent.clone();
        merged.group = child.group.clone().or_else(|| parent.group.clone());
        merged.version = child.version.clone().or_else(|| parent.version.clone());
        merged
            .properties
            .extend(child.properties.iter().map(|(k, v)| (k.clone(), v.clone())));
        for entry in &child.management {
            upsert(&mut merged.management, entry.clone());
        }
        merged.dependencies.extend(child.dependencies.iter().cloned());
        merged.profiles.extend(child.profiles.iter().cloned());
        merged.lineage.extend(child.lineage.iter().cloned());
        merged
    }
}

fn upsert(entries: &mut Vec<RawDependency>, entry: RawDependency) {
    let key = entry.literal_key();
    match entries.iter_mut().find(|e| e.literal_key() == key) {
        Some(existing) => *existing = entry,
        None => entries.push(entry),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn dep(artifact: &str, version: &str) -> RawDependency {
        RawDependency {
            version: Some(version.to_string()),
            ..RawDependency::new("g", artifact)
        }
    }

    fn layer(name: &str, props: &[(&str, &str)], managed: &[RawDependency], deps: &[RawDependency]) -> ModelLayer {
        ModelLayer {
            group: (name != "child").then(|| "g".to_string()),
            version: Some(format!("{name}-version")),
            properties: props.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            management: managed.to_vec(),
            dependencies: deps.to_vec(),
            profiles: Vec::new(),
            lineage: vec![Gav::new("g", name, "1")],
        }
    }

    #[test]
    fn merge_is_associative_along_a_chain() {
        let grandparent = layer(
            "grandparent",
            &[("a", "1"), ("b", "1")],
            &[dep("x", "1"), dep("y", "1")],
            &[dep("d1", "1")],
        );
        let parent = layer("parent", &[("b", "2"), ("c", "2")], &[dep("z", "2"), dep("x", "2")], &[dep("d2", "2")]);
        let child = layer("child", &[("a", "3")], &[dep("y", "3")], &[dep("d1", "3")]);

        let left = ModelLayer::merge(&ModelLayer::merge(&grandparent, &parent), &child);
        let right = ModelLayer::merge(&grandparent, &ModelLayer::merge(&parent, &child));
        assert_eq!(left, right);

        assert_eq!(left.group.as_deref(), Some("g"));
        assert_eq!(left.properties.get("a").map(String::as_str), Some("3"));
        assert_eq!(left.properties.get("b").map(String::as_str), Some("2"));
        let managed: Vec<_> = left
            .management
            .iter()
            .map(|m| format!("{}={}", m.artifact, m.version.as_deref().unwrap_or("")))
            .collect();
        assert_eq!(managed, vec!["x=2", "y=3", "z=2"]);
        assert_eq!(left.dependencies.len(), 3);
    }

    #[test]
    fn active_profiles_layer_over_base() {
        let raw = RawModel {
            artifact: "lib".into(),
            properties: vec![("p".into(), "base".into()), ("q".into(), "base".into())],
            dependencies: vec![dep("a", "1")],
            management: vec![dep("m", "1")],
            ..RawModel::default()
        };
        let profile = RawProfile {
            id: "extra".into(),
            properties: vec![("p".into(), "profile".into())],
            dependencies: vec![dep("b", "1")],
            management: vec![dep("m", "2")],
            ..RawProfile::default()
        };

        let layer = ModelLayer::from_descriptor(&raw, Gav::new("g", "lib", "1"), &[&profile], Vec::new());
        assert_eq!(layer.properties.get("p").map(String::as_str), Some("profile"));
        assert_eq!(layer.properties.get("q").map(String::as_str), Some("base"));
        assert_eq!(layer.management.len(), 1);
        assert_eq!(layer.management[0].version.as_deref(), Some("2"));
        let deps: Vec<_> = layer.dependencies.iter().map(|d| d.artifact.as_str()).collect();
        assert_eq!(deps, vec!["a", "b"]);
    }
}
