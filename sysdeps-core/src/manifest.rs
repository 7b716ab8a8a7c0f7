// sysdeps-core/src/manifest.rs
//! Resolution manifest: ordered records plus diagnostics, as JSON or a text
//! report.
use std::fmt::Write as _;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sysdeps_common::error::{Result, SysdepsError};
use sysdeps_common::model::{Coordinate, ProfileDecision, Scope};
use tempfile::NamedTempFile;
use tracing::{debug, error};

use crate::resolver::{ResolvedGraph, ResolvedNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Resolved,
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestRecord {
    pub coordinate: String,
    pub group: String,
    pub artifact: String,
    pub version: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    pub scope: Scope,
    pub depth: usize,
    pub status: RecordStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_library: Option<PathBuf>,
}

impl From<&ResolvedNode> for ManifestRecord {
    fn from(node: &ResolvedNode) -> Self {
        let c = &node.coordinate;
        Self {
            coordinate: c.to_string(),
            group: c.group.clone(),
            artifact: c.artifact.clone(),
            version: c.version.clone(),
            kind: c.kind.clone(),
            classifier: c.classifier.clone(),
            scope: node.scope,
            depth: node.depth,
            status: if node.is_resolved() {
                RecordStatus::Resolved
            } else {
                RecordStatus::Unresolved
            },
            path: node.artifact.clone(),
            native_library: node.native_library.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedEntry {
    pub subject: String,
    pub kind: &'static str,
    pub reason: String,
    /// Root first.
    pub path: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediationEntry {
    pub selected: String,
    pub discarded: String,
    pub path: Vec<String>,
}

/// Everything worth telling the user beyond the records themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub unresolved: Vec<UnresolvedEntry>,
    pub mediation: Vec<MediationEntry>,
    pub profiles: Vec<ProfileDecision>,
    pub warnings: Vec<String>,
}

impl Diagnostics {
    pub fn from_graph(graph: &ResolvedGraph) -> Self {
        Self {
            unresolved: graph
                .failures
                .iter()
                .map(|f| UnresolvedEntry {
                    subject: f.subject.clone(),
                    kind: f.error.kind(),
                    reason: f.error.to_string(),
                    path: render_path(&f.path),
                })
                .collect(),
            mediation: graph
                .discarded
                .iter()
                .map(|m| MediationEntry {
                    selected: m.selected.to_string(),
                    discarded: m.discarded.to_string(),
                    path: render_path(&m.path),
                })
                .collect(),
            profiles: graph.profiles.clone(),
            warnings: graph.warnings.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.unresolved.is_empty() && self.mediation.is_empty() && self.warnings.is_empty()
    }
}

fn render_path(path: &[Coordinate]) -> Vec<String> {
    path.iter().map(ToString::to_string).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub complete: bool,
    pub roots: Vec<String>,
    pub artifacts: Vec<ManifestRecord>,
    pub diagnostics: Diagnostics,
}

impl Manifest {
    /// Records keep graph order: roots in request order, then discovery order.
    pub fn from_graph(graph: &ResolvedGraph, diagnostics: &Diagnostics) -> Self {
        Self {
            complete: graph.complete,
            roots: graph
                .nodes
                .iter()
                .filter(|n| n.root)
                .map(|n| n.coordinate.to_string())
                .collect(),
            artifacts: graph.nodes.iter().map(ManifestRecord::from).collect(),
            diagnostics: diagnostics.clone(),
        }
    }

    pub fn resolved(&self) -> impl Iterator<Item = &ManifestRecord> {
        self.artifacts
            .iter()
            .filter(|r| r.status == RecordStatus::Resolved)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes pretty JSON through a temp file in the target directory, then
    /// renames it into place.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let temp_file = NamedTempFile::new_in(dir)?;
        debug!(
            "Writing manifest with {} records to {} via {}",
            self.artifacts.len(),
            path.display(),
            temp_file.path().display()
        );
        let mut writer = BufWriter::new(temp_file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        let temp_file = writer.into_inner().map_err(|e| e.into_error())?;
        temp_file.as_file().sync_all()?;
        temp_file.persist(path).map_err(|e| {
            error!("Failed to move manifest into {}: {}", path.display(), e.error);
            SysdepsError::from(e.error)
        })?;
        Ok(())
    }

    /// Sectioned plain-text report.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        let state = if self.complete { "complete" } else { "INCOMPLETE" };
        let _ = writeln!(out, "Resolution {state}: {}", self.roots.join(", "));

        let resolved = self.resolved().count();
        let _ = writeln!(out, "\nArtifacts ({resolved}/{} resolved)", self.artifacts.len());
        for record in &self.artifacts {
            let location = match (&record.status, &record.path) {
                (RecordStatus::Resolved, Some(path)) => path.display().to_string(),
                _ => "UNRESOLVED".to_string(),
            };
            let indent = "  ".repeat(record.depth + 1);
            let _ = writeln!(out, "{indent}{} [{}] {location}", record.coordinate, record.scope);
            if let Some(native) = &record.native_library {
                let _ = writeln!(out, "{indent}  native: {}", native.display());
            }
        }

        let d = &self.diagnostics;
        if !d.unresolved.is_empty() {
            let _ = writeln!(out, "\nUnresolved ({})", d.unresolved.len());
            for entry in &d.unresolved {
                let _ = writeln!(out, "  {} [{}]: {}", entry.subject, entry.kind, entry.reason);
                if !entry.path.is_empty() {
                    let _ = writeln!(out, "    via {}", entry.path.join(" -> "));
                }
            }
        }
        if !d.mediation.is_empty() {
            let _ = writeln!(out, "\nMediation ({})", d.mediation.len());
            for entry in &d.mediation {
                let _ = writeln!(out, "  {} omitted for {}", entry.discarded, entry.selected);
                if !entry.path.is_empty() {
                    let _ = writeln!(out, "    via {}", entry.path.join(" -> "));
                }
            }
        }
        if !d.profiles.is_empty() {
            let _ = writeln!(out, "\nActive profiles ({})", d.profiles.len());
            for profile in &d.profiles {
                let _ = writeln!(out, "  {} in {}: {}", profile.id, profile.declared_in, profile.reason);
            }
        }
        if !d.warnings.is_empty() {
            let _ = writeln!(out, "\nWarnings ({})", d.warnings.len());
            for warning in &d.warnings {
                let _ = writeln!(out, "  {warning}");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::resolver::{MediationLoser, NodeFailure};

    fn node(artifact: &str, depth: usize, file: Option<&str>) -> ResolvedNode {
        let coordinate = Coordinate::new("g", artifact, "1");
        ResolvedNode {
            path: Vec::new(),
            scope: Scope::Compile,
            depth,
            root: depth == 0,
            optional: false,
            descriptor: None,
            artifact: file.map(PathBuf::from),
            native_library: None,
            failure: file
                .is_none()
                .then(|| SysdepsError::MissingArtifact(coordinate.to_string())),
            coordinate,
        }
    }

    fn sample() -> ResolvedGraph {
        let app = Coordinate::new("g", "app", "1");
        ResolvedGraph {
            nodes: vec![node("app", 0, Some("/j/app.jar")), node("lib", 1, None)],
            discarded: vec![MediationLoser {
                key: Coordinate::new("g", "lib", "0.9").management_key(),
                selected: Coordinate::new("g", "lib", "1"),
                discarded: Coordinate::new("g", "lib", "0.9"),
                path: vec![app.clone()],
            }],
            failures: vec![NodeFailure {
                subject: "g:lib:1".into(),
                error: SysdepsError::MissingArtifact("g:lib:1".into()),
                path: vec![app],
                root: false,
            }],
            warnings: vec!["something odd".into()],
            complete: true,
            ..ResolvedGraph::default()
        }
    }

    #[test]
    fn records_and_diagnostics_follow_the_graph() {
        let graph = sample();
        let manifest = Manifest::from_graph(&graph, &Diagnostics::from_graph(&graph));

        assert_eq!(manifest.roots, vec!["g:app:1"]);
        let statuses: Vec<_> = manifest.artifacts.iter().map(|r| (r.artifact.as_str(), r.status)).collect();
        assert_eq!(
            statuses,
            vec![("app", RecordStatus::Resolved), ("lib", RecordStatus::Unresolved)]
        );
        assert_eq!(manifest.diagnostics.unresolved[0].kind, "missing-artifact");
        assert_eq!(manifest.diagnostics.unresolved[0].path, vec!["g:app:1"]);
        assert_eq!(manifest.diagnostics.mediation[0].discarded, "g:lib:0.9");

        let report = manifest.render_report();
        assert!(report.starts_with("Resolution complete: g:app:1"));
        assert!(report.contains("g:lib:1 [compile] UNRESOLVED"));
        assert!(report.contains("g:lib:0.9 omitted for g:lib:1"));
        assert!(report.contains("something odd"));
    }

    #[test]
    fn json_is_written_atomically_and_reproducibly() {
        let dir = TempDir::new().unwrap();
        let graph = sample();
        let manifest = Manifest::from_graph(&graph, &Diagnostics::from_graph(&graph));
        let path = dir.path().join("out/manifest.json");

        manifest.write_json(&path).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        manifest.write_json(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
        assert_eq!(first, format!("{}\n", manifest.to_json_string().unwrap()));

        let value: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert_eq!(value["artifacts"][0]["type"], "jar");
        assert_eq!(value["artifacts"][1]["status"], "unresolved");
        assert!(value["artifacts"][1].get("path").is_none());
        assert_eq!(fs::read_dir(dir.path().join("out")).unwrap().count(), 1);
    }
}
