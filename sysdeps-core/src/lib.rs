// sysdeps-core/src/lib.rs
pub mod context;
pub mod descriptor;
pub mod locator;
pub mod manifest;
pub mod model;
pub mod repository;
pub mod resolver;

pub use context::{CancellationToken, ResolutionContext, ResolveOptions};
pub use locator::ArtifactLocator;
pub use manifest::{Diagnostics, Manifest, ManifestRecord, RecordStatus};
pub use repository::{scan, RepositoryIndex, ScanOptions};
pub use resolver::{ResolutionError, ResolvedGraph, ResolvedNode, RootRequest};
