// sysdeps-core/src/repository/index.rs
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use sysdeps_common::model::{version, Coordinate, Gav, GroupArtifact};
use tracing::debug;

use super::layout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorEntry {
    pub path: PathBuf,
    pub packaging: String,
    pub parent: Option<Gav>,
}

/// Everything found on disk, keyed for lookup. Immutable once built.
#[derive(Debug, Default)]
pub struct RepositoryIndex {
    descriptors: HashMap<Gav, DescriptorEntry>,
    /// `(type, classifier)` -> file; classifier is empty when absent.
    artifacts: HashMap<Gav, BTreeMap<(String, String), PathBuf>>,
    versions: HashMap<GroupArtifact, BTreeSet<String>>,
    /// Artifact files without a known coordinate, by file name.
    loose: BTreeMap<String, PathBuf>,
    natives: BTreeMap<String, PathBuf>,
    warnings: Vec<String>,
}

impl RepositoryIndex {
    pub fn descriptor(&self, gav: &Gav) -> Option<&DescriptorEntry> {
        self.descriptors.get(gav)
    }

    pub fn artifact(&self, gav: &Gav, kind: &str, classifier: Option<&str>) -> Option<&Path> {
        self.artifacts
            .get(gav)?
            .get(&(kind.to_string(), classifier.unwrap_or_default().to_string()))
            .map(PathBuf::as_path)
    }

    /// Versions with a descriptor or an artifact on disk, unordered.
    pub fn versions(&self, ga: &GroupArtifact) -> impl Iterator<Item = &str> {
        self.versions.get(ga).into_iter().flatten().map(String::as_str)
    }

    pub fn highest_version(&self, ga: &GroupArtifact) -> Option<&str> {
        version::highest(self.versions(ga))
    }

    pub fn loose_file(&self, file_name: &str) -> Option<&Path> {
        self.loose.get(file_name).map(PathBuf::as_path)
    }

    /// Loose files named `<artifact>-<digit>...<.ext>`, e.g. `foo-1.2.jar`.
    pub fn loose_versioned<'a>(
        &'a self,
        artifact: &str,
        ext: &str,
    ) -> impl Iterator<Item = (&'a str, &'a Path)> + 'a {
        let prefix = format!("{artifact}-");
        let suffix = format!(".{ext}");
        let bound = prefix.clone();
        self.loose
            .range(prefix.clone()..)
            .take_while(move |(name, _)| name.starts_with(bound.as_str()))
            .filter_map(move |(name, path)| {
                let version = name.strip_prefix(prefix.as_str())?.strip_suffix(suffix.as_str())?;
                version
                    .starts_with(|c: char| c.is_ascii_digit())
                    .then_some((version, path.as_path()))
            })
    }

    pub fn native_library(&self, name: &str) -> Option<&Path> {
        self.natives.get(name).map(PathBuf::as_path)
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn descriptor_count(&self) -> usize {
        self.descriptors.len()
    }

    pub fn artifact_count(&self) -> usize {
        self.artifacts.values().map(BTreeMap::len).sum::<usize>() + self.loose.len()
    }

    pub fn native_count(&self) -> usize {
        self.natives.len()
    }

    /// Descriptors sorted by coordinate.
    pub fn descriptors(&self) -> Vec<(&Gav, &DescriptorEntry)> {
        let mut all: Vec<_> = self.descriptors.iter().collect();
        all.sort_by(|a, b| a.0.cmp(b.0));
        all
    }
}

/// One finding reported by a scan worker.
#[derive(Debug, Clone)]
pub enum ScanRecord {
    Descriptor {
        path: PathBuf,
        gav: Gav,
        packaging: String,
        parent: Option<Gav>,
    },
    Artifact {
        root: PathBuf,
        path: PathBuf,
    },
    Native {
        path: PathBuf,
        name: String,
    },
    Warning {
        path: PathBuf,
        message: String,
    },
}

impl ScanRecord {
    fn path(&self) -> &Path {
        match self {
            ScanRecord::Descriptor { path, .. }
            | ScanRecord::Artifact { path, .. }
            | ScanRecord::Native { path, .. }
            | ScanRecord::Warning { path, .. } => path,
        }
    }
}

/// Collects records in any order and builds the same index regardless.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    records: Vec<ScanRecord>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ScanRecord) {
        self.records.push(record);
    }

    /// When two files claim one key, the path sorting last wins.
    pub fn finish(mut self) -> RepositoryIndex {
        self.records.sort_by(|a, b| a.path().cmp(b.path()));

        let mut index = RepositoryIndex::default();
        // (directory, file stem) -> descriptor identity, for pairing artifacts.
        let mut paired: HashMap<(PathBuf, String), Gav> = HashMap::new();
        let mut artifacts = Vec::new();

        for record in self.records {
            match record {
                ScanRecord::Descriptor {
                    path,
                    gav,
                    packaging,
                    parent,
                } => {
                    if let (Some(dir), Some(stem)) = (path.parent(), path.file_stem().and_then(|s| s.to_str())) {
                        paired.insert((dir.to_path_buf(), stem.to_string()), gav.clone());
                    }
                    index
                        .versions
                        .entry(gav.group_artifact())
                        .or_default()
                        .insert(gav.version.clone());
                    if let Some(previous) = index.descriptors.insert(
                        gav.clone(),
                        DescriptorEntry {
                            path,
                            packaging,
                            parent,
                        },
                    ) {
                        debug!("Descriptor {} shadowed: {}", gav, previous.path.display());
                    }
                }
                ScanRecord::Artifact { root, path } => artifacts.push((root, path)),
                ScanRecord::Native { path, name } => {
                    index.natives.insert(name, path);
                }
                ScanRecord::Warning { path, message } => {
                    index.warnings.push(format!("{}: {}", path.display(), message));
                }
            }
        }

        for (root, path) in artifacts {
            let Some(file_name) = path.file_name().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let Some((stem, ext)) = file_name.rsplit_once('.') else {
                continue;
            };
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

            let coordinate = paired
                .get(&(dir, stem.to_string()))
                .map(|gav| gav.coordinate().with_type(ext))
                .or_else(|| layout::coordinate_from_layout(&root, &path));

            match coordinate {
                Some(coordinate) => index.insert_artifact(coordinate, path),
                None => {
                    index.loose.insert(file_name, path);
                }
            }
        }

        debug!(
            "Index built: {} descriptors, {} artifacts, {} native libraries, {} warnings",
            index.descriptor_count(),
            index.artifact_count(),
            index.native_count(),
            index.warnings.len()
        );
        index
    }
}

impl RepositoryIndex {
    fn insert_artifact(&mut self, coordinate: Coordinate, path: PathBuf) {
        let gav = coordinate.gav();
        self.versions
            .entry(gav.group_artifact())
            .or_default()
            .insert(gav.version.clone());
        self.artifacts
            .entry(gav)
            .or_default()
            .insert((coordinate.kind, coordinate.classifier.unwrap_or_default()), path);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn descriptor(path: &str, gav: &str) -> ScanRecord {
        let parts: Vec<&str> = gav.split(':').collect();
        ScanRecord::Descriptor {
            path: PathBuf::from(path),
            gav: Gav::new(parts[0], parts[1], parts[2]),
            packaging: "jar".into(),
            parent: None,
        }
    }

    #[test]
    fn later_path_wins_regardless_of_arrival_order() {
        let records = [
            descriptor("/r/b/lib.pom", "g:lib:1"),
            descriptor("/r/a/lib.pom", "g:lib:1"),
        ];

        for ordering in [[0, 1], [1, 0]] {
            let mut builder = IndexBuilder::new();
            for i in ordering {
                builder.push(records[i].clone());
            }
            let index = builder.finish();
            assert_eq!(
                index.descriptor(&Gav::new("g", "lib", "1")).unwrap().path,
                PathBuf::from("/r/b/lib.pom")
            );
        }
    }

    #[test]
    fn artifacts_pair_with_descriptors_then_layout_then_loose() {
        let mut builder = IndexBuilder::new();
        builder.push(descriptor("/poms/lib.pom", "g:lib:1"));
        builder.push(ScanRecord::Artifact {
            root: PathBuf::from("/poms"),
            path: PathBuf::from("/poms/lib.jar"),
        });
        builder.push(ScanRecord::Artifact {
            root: PathBuf::from("/repo"),
            path: PathBuf::from("/repo/org/x/dep/2.0/dep-2.0.jar"),
        });
        builder.push(ScanRecord::Artifact {
            root: PathBuf::from("/java"),
            path: PathBuf::from("/java/tool-1.5.jar"),
        });
        let index = builder.finish();

        assert_eq!(
            index.artifact(&Gav::new("g", "lib", "1"), "jar", None),
            Some(Path::new("/poms/lib.jar"))
        );
        assert_eq!(
            index.artifact(&Gav::new("org.x", "dep", "2.0"), "jar", None),
            Some(Path::new("/repo/org/x/dep/2.0/dep-2.0.jar"))
        );
        assert_eq!(index.loose_file("tool-1.5.jar"), Some(Path::new("/java/tool-1.5.jar")));
        let versioned: Vec<_> = index.loose_versioned("tool", "jar").collect();
        assert_eq!(versioned, vec![("1.5", Path::new("/java/tool-1.5.jar"))]);
        assert_eq!(
            index.highest_version(&GroupArtifact::new("org.x", "dep")),
            Some("2.0")
        );
    }
}
