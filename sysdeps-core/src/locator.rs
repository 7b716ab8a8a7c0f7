// sysdeps-core/src/locator.rs
//! Maps selected coordinates onto files found by the scan.
use std::path::{Path, PathBuf};

use sysdeps_common::error::{Result, SysdepsError};
use sysdeps_common::model::Coordinate;
use tracing::{debug, trace};

use crate::repository::layout;
use crate::repository::RepositoryIndex;
use crate::resolver::{NodeFailure, ResolvedGraph};

const NATIVE_TYPES: &[&str] = &["so", "dll", "dylib", "jnilib"];

pub struct ArtifactLocator<'a> {
    index: &'a RepositoryIndex,
}

impl<'a> ArtifactLocator<'a> {
    pub fn new(index: &'a RepositoryIndex) -> Self {
        Self { index }
    }

    /// The file backing `coordinate`, searched from most to least exact.
    pub fn locate(&self, coordinate: &Coordinate) -> Result<PathBuf> {
        let gav = coordinate.gav();

        if coordinate.is_pom() {
            return self
                .index
                .descriptor(&gav)
                .map(|entry| entry.path.clone())
                .ok_or_else(|| SysdepsError::MissingArtifact(coordinate.to_string()));
        }
        if NATIVE_TYPES.contains(&coordinate.kind.as_str()) {
            return self
                .native_library(coordinate)
                .ok_or_else(|| SysdepsError::MissingArtifact(coordinate.to_string()));
        }

        let ext = layout::extension_for_type(&coordinate.kind);
        let classifier = coordinate
            .classifier
            .as_deref()
            .or_else(|| layout::classifier_for_type(&coordinate.kind));

        if let Some(path) = self.index.artifact(&gav, ext, classifier) {
            trace!("{} -> {} (indexed)", coordinate, path.display());
            return Ok(path.to_path_buf());
        }
        for name in layout::loose_file_names(&gav, classifier, ext) {
            if let Some(path) = self.index.loose_file(&name) {
                debug!("{} -> {} (by name)", coordinate, path.display());
                return Ok(path.to_path_buf());
            }
        }
        if classifier.is_none() {
            let candidates: Vec<(&str, &Path)> = self.index.loose_versioned(&coordinate.artifact, ext).collect();
            let highest = sysdeps_common::model::version::highest(candidates.iter().map(|(v, _)| *v));
            if let Some((version, path)) = candidates.iter().find(|(v, _)| Some(*v) == highest) {
                debug!(
                    "{} -> {} (installed version {})",
                    coordinate,
                    path.display(),
                    version
                );
                return Ok(path.to_path_buf());
            }
        }
        Err(SysdepsError::MissingArtifact(coordinate.to_string()))
    }

    /// A native library shipped under the artifact's name, if any.
    pub fn native_library(&self, coordinate: &Coordinate) -> Option<PathBuf> {
        layout::native_names_for(&coordinate.artifact)
            .iter()
            .find_map(|name| self.index.native_library(name))
            .map(Path::to_path_buf)
    }

    /// Fills in files for every node that built cleanly; misses become
    /// node failures.
    pub fn locate_all(&self, graph: &mut ResolvedGraph) {
        let mut failures = Vec::new();
        for node in graph.nodes.iter_mut().filter(|n| n.failure.is_none()) {
            match self.locate(&node.coordinate) {
                Ok(path) => node.artifact = Some(path),
                Err(e) => {
                    debug!("No file for {}: {}", node.coordinate, e);
                    node.failure = Some(e.clone());
                    failures.push(NodeFailure {
                        subject: node.coordinate.to_string(),
                        error: e,
                        path: node.path.clone(),
                        root: node.root,
                    });
                }
            }
            if !NATIVE_TYPES.contains(&node.coordinate.kind.as_str()) {
                node.native_library = self.native_library(&node.coordinate);
            }
        }
        graph.failures.extend(failures);
    }
}
