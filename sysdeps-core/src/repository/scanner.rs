// sysdeps-core/src/repository/scanner.rs
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crossbeam_channel::Sender;
use sysdeps_common::config::Config;
use sysdeps_common::error::{Result, SysdepsError};
use sysdeps_common::model::Gav;
use threadpool::ThreadPool;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use super::index::{IndexBuilder, RepositoryIndex, ScanRecord};
use super::layout;
use crate::descriptor::parser;
use crate::model::interpolate::{self, PropertyScope};

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub roots: Vec<PathBuf>,
    /// Maximum directory depth below each root.
    pub max_depth: usize,
    pub workers: usize,
    pub interpolation_passes: usize,
}

impl ScanOptions {
    pub fn from_config(config: &Config) -> Self {
        let mut roots: Vec<PathBuf> = Vec::new();
        for dir in config
            .metadata_dirs
            .iter()
            .chain(&config.jar_dirs)
            .chain(&config.native_library_dirs)
        {
            if !roots.contains(dir) {
                roots.push(dir.clone());
            }
        }
        Self {
            roots,
            max_depth: config.scan_depth,
            workers: config.scan_workers,
            interpolation_passes: config.max_interpolation_passes,
        }
    }
}

/// Walks every root and builds the index. Missing roots count as empty and
/// unreadable files become index warnings.
#[instrument(skip_all, fields(roots = options.roots.len()))]
pub fn scan(options: &ScanOptions) -> RepositoryIndex {
    let num_workers = options.workers.max(1);
    let pool = ThreadPool::new(num_workers);
    let (record_tx, record_rx) = crossbeam_channel::unbounded::<ScanRecord>();
    debug!("Scanner started with {} workers.", num_workers);

    for root in &options.roots {
        if !root.is_dir() {
            debug!("Scan root {} does not exist, skipping", root.display());
            continue;
        }
        if options.max_depth == 0 {
            continue;
        }

        let mut entries: Vec<PathBuf> = match fs::read_dir(root) {
            Ok(rd) => rd.filter_map(|e| e.ok().map(|e| e.path())).collect(),
            Err(e) => {
                warn!("Cannot read scan root {}: {}", root.display(), e);
                let _ = record_tx.send(ScanRecord::Warning {
                    path: root.clone(),
                    message: e.to_string(),
                });
                continue;
            }
        };
        entries.sort();

        for entry in entries {
            if entry.is_dir() {
                let root = root.clone();
                let tx = record_tx.clone();
                let depth = options.max_depth - 1;
                let passes = options.interpolation_passes;
                pool.execute(move || walk_subtree(&root, &entry, depth, passes, &tx));
            } else {
                classify(root, &entry, options.interpolation_passes, &record_tx);
            }
        }
    }
    drop(record_tx);

    let mut builder = IndexBuilder::new();
    for record in record_rx {
        builder.push(record);
    }
    pool.join();
    builder.finish()
}

fn walk_subtree(root: &Path, dir: &Path, depth: usize, passes: usize, tx: &Sender<ScanRecord>) {
    debug!("Walking {}", dir.display());
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .max_depth(depth)
        .sort_by_file_name()
    {
        match entry {
            Ok(entry) if entry.file_type().is_file() => classify(root, entry.path(), passes, tx),
            Ok(_) => {}
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                warn!("Skipping {}: {}", path.display(), e);
                let _ = tx.send(ScanRecord::Warning {
                    path,
                    message: e.to_string(),
                });
            }
        }
    }
}

fn classify(root: &Path, path: &Path, passes: usize, tx: &Sender<ScanRecord>) {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return;
    };

    let record = if layout::is_descriptor(file_name) {
        match read_descriptor(path, passes) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping descriptor {}: {}", path.display(), e);
                ScanRecord::Warning {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            }
        }
    } else if let Some(name) = layout::native_library_name(file_name) {
        ScanRecord::Native {
            path: path.to_path_buf(),
            name,
        }
    } else if file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| layout::is_artifact_extension(ext))
    {
        ScanRecord::Artifact {
            root: root.to_path_buf(),
            path: path.to_path_buf(),
        }
    } else {
        return;
    };

    // The receiver outlives every worker.
    let _ = tx.send(record);
}

/// Identity-only parse, with placeholders in group and version expanded from
/// the descriptor's own properties.
fn read_descriptor(path: &Path, passes: usize) -> Result<ScanRecord> {
    let text = fs::read_to_string(path)?;
    let fields = parser::parse_identity(path, &text)?;

    let parent = fields.parent.as_ref();
    let group = fields
        .group
        .clone()
        .or_else(|| parent.map(|p| p.group.clone()))
        .unwrap_or_default();
    let version = fields
        .version
        .clone()
        .or_else(|| parent.map(|p| p.version.clone()))
        .ok_or(SysdepsError::MissingField {
            path: path.to_path_buf(),
            field: "version",
        })?;
    let packaging = fields.packaging.clone().unwrap_or_else(|| "jar".to_string());

    let properties: BTreeMap<String, String> = fields.properties.iter().cloned().collect();
    let builtins = interpolate::builtins(
        &group,
        &fields.artifact,
        &version,
        &packaging,
        parent,
        path.parent(),
    );
    let empty = BTreeMap::new();
    let scope = PropertyScope {
        overrides: &empty,
        properties: &properties,
        builtins: &builtins,
        env: &empty,
        max_passes: passes,
    };

    let gav = Gav::new(
        scope.interpolate(&group)?,
        scope.interpolate(&fields.artifact)?,
        scope.interpolate(&version)?,
    );
    if [&gav.group, &gav.artifact, &gav.version]
        .iter()
        .any(|s| interpolate::has_placeholder(s))
    {
        return Err(SysdepsError::Parse {
            path: path.to_path_buf(),
            message: format!("unresolved identity {gav}"),
        });
    }

    Ok(ScanRecord::Descriptor {
        path: path.to_path_buf(),
        gav,
        packaging: scope.interpolate_lossy(&packaging),
        parent: fields.parent.as_ref().map(|p| p.gav()),
    })
}
