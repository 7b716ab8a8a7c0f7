// sysdeps-core/src/model/management.rs
//! Dependency-management: import expansion and application to declarations.
use std::sync::Arc;

use sysdeps_common::error::{Result, SysdepsError};
use sysdeps_common::model::{Dependency, EffectiveModel, Gav, ManagedDependency, ManagementTable, Scope};
use tracing::{debug, warn};

/// Builds the final table from entries in declaration order.
///
/// Import entries are replaced in place by the imported descriptor's table.
/// Explicit entries win over imported ones wherever they are declared; among
/// imports the first one to provide a key wins. Imports that cannot be loaded
/// are reported in `warnings`; import cycles are errors.
pub fn expand_imports<F>(
    entries: Vec<ManagedDependency>,
    mut load_import: F,
    warnings: &mut Vec<String>,
) -> Result<ManagementTable>
where
    F: FnMut(&Gav) -> Result<Arc<EffectiveModel>>,
{
    let explicit: ManagementTable = entries.iter().filter(|e| !e.is_import()).cloned().collect();
    let mut table = ManagementTable::new();

    for entry in entries {
        if !entry.is_import() {
            if let Some(winner) = explicit.get(&entry.key()) {
                table.insert_if_absent(winner.clone());
            }
            continue;
        }

        let Some(version) = entry.version.clone() else {
            warnings.push(format!("import {}:{} has no version", entry.group, entry.artifact));
            continue;
        };
        let gav = Gav::new(&entry.group, &entry.artifact, version);
        match load_import(&gav) {
            Ok(imported) => {
                debug!("Importing {} managed entries from {}", imported.management.len(), gav);
                for managed in imported.management.iter() {
                    if !explicit.contains(&managed.key()) {
                        table.insert_if_absent(managed.clone());
                    }
                }
            }
            Err(e @ SysdepsError::CyclicInheritance { .. }) => return Err(e),
            Err(e) => {
                warn!("Skipping import {}: {}", gav, e);
                warnings.push(format!("import {gav} skipped: {e}"));
            }
        }
    }
    Ok(table)
}

/// Fills what the declaration leaves open from the matching managed entry.
pub fn apply(
    mut dependency: Dependency,
    declared_scope: bool,
    table: &ManagementTable,
) -> Dependency {
    let Some(managed) = table.get(&dependency.key()) else {
        return dependency;
    };
    if dependency.version.is_none() {
        dependency.version = managed.version.clone();
    }
    if !declared_scope {
        if let Some(scope) = managed.scope.filter(|s| *s != Scope::Import) {
            dependency.scope = scope;
        }
    }
    for exclusion in &managed.exclusions {
        if !dependency.exclusions.contains(exclusion) {
            dependency.exclusions.push(exclusion.clone());
        }
    }
    dependency
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use sysdeps_common::model::{Coordinate, GroupArtifact};

    use super::*;

    fn managed(artifact: &str, version: &str) -> ManagedDependency {
        ManagedDependency {
            group: "g".into(),
            artifact: artifact.into(),
            version: Some(version.into()),
            kind: "jar".into(),
            classifier: None,
            scope: None,
            exclusions: Vec::new(),
        }
    }

    fn import(artifact: &str) -> ManagedDependency {
        ManagedDependency {
            kind: "pom".into(),
            scope: Some(Scope::Import),
            ..managed(artifact, "1")
        }
    }

    fn bom(artifact: &str, entries: Vec<ManagedDependency>) -> Arc<EffectiveModel> {
        Arc::new(EffectiveModel {
            coordinate: Coordinate::new("g", artifact, "1").with_type("pom"),
            descriptor: PathBuf::from(format!("/{artifact}.pom")),
            parent: None,
            lineage: Vec::new(),
            properties: BTreeMap::new(),
            dependencies: Vec::new(),
            management: entries.into_iter().collect(),
            profiles: Vec::new(),
            warnings: Vec::new(),
        })
    }

    fn rendered(table: &ManagementTable) -> Vec<String> {
        table
            .iter()
            .map(|m| format!("{}={}", m.artifact, m.version.as_deref().unwrap_or("")))
            .collect()
    }

    #[test]
    fn imports_splice_in_place_and_yield_to_explicit_entries() {
        let entries = vec![
            managed("a", "1"),
            import("bom1"),
            import("bom2"),
            managed("c", "9"),
        ];
        let mut warnings = Vec::new();
        let table = expand_imports(
            entries,
            |gav| match gav.artifact.as_str() {
                "bom1" => Ok(bom("bom1", vec![managed("b", "1"), managed("c", "1")])),
                "bom2" => Ok(bom("bom2", vec![managed("b", "2"), managed("d", "2")])),
                _ => unreachable!(),
            },
            &mut warnings,
        )
        .unwrap();

        assert_eq!(rendered(&table), vec!["a=1", "b=1", "d=2", "c=9"]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn missing_imports_are_warnings_and_cycles_are_errors() {
        let mut warnings = Vec::new();
        let table = expand_imports(
            vec![import("gone"), managed("a", "1")],
            |gav| Err(SysdepsError::DescriptorNotFound(gav.to_string())),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(rendered(&table), vec!["a=1"]);
        assert_eq!(warnings.len(), 1);

        let err = expand_imports(
            vec![import("loop")],
            |_| Err(SysdepsError::CyclicInheritance { chain: vec!["x".into()] }),
            &mut warnings,
        )
        .unwrap_err();
        assert!(matches!(err, SysdepsError::CyclicInheritance { .. }));
    }

    #[test]
    fn apply_fills_only_missing_fields() {
        let table: ManagementTable = [ManagedDependency {
            scope: Some(Scope::Runtime),
            exclusions: vec![GroupArtifact::new("x", "y")],
            ..managed("a", "2")
        }]
        .into_iter()
        .collect();
        let declared = Dependency {
            group: "g".into(),
            artifact: "a".into(),
            version: None,
            kind: "jar".into(),
            classifier: None,
            scope: Scope::Compile,
            optional: false,
            exclusions: Vec::new(),
        };

        let filled = apply(declared.clone(), false, &table);
        assert_eq!(filled.version.as_deref(), Some("2"));
        assert_eq!(filled.scope, Scope::Runtime);
        assert_eq!(filled.exclusions, vec![GroupArtifact::new("x", "y")]);

        let pinned = apply(
            Dependency {
                version: Some("1".into()),
                ..declared
            },
            true,
            &table,
        );
        assert_eq!(pinned.version.as_deref(), Some("1"));
        assert_eq!(pinned.scope, Scope::Compile);
    }
}
