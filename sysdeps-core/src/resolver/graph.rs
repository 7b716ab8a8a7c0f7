// sysdeps-core/src/resolver/graph.rs
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use sysdeps_common::error::{Result, SysdepsError};
use sysdeps_common::model::{Coordinate, CoordinateSpec, GroupArtifact, ManagementKey, ProfileDecision, Scope};
use thiserror::Error;

/// A coordinate the caller asks for, with an optional version or range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootRequest {
    pub spec: CoordinateSpec,
    pub scope: Scope,
    pub exclusions: Vec<GroupArtifact>,
}

impl RootRequest {
    pub fn new(spec: CoordinateSpec) -> Self {
        Self {
            spec,
            scope: Scope::Compile,
            exclusions: Vec::new(),
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn exclude(mut self, exclusion: GroupArtifact) -> Self {
        self.exclusions.push(exclusion);
        self
    }
}

impl FromStr for RootRequest {
    type Err = SysdepsError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self::new(s.parse()?))
    }
}

impl fmt::Display for RootRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.spec.group, self.spec.artifact)?;
        if let Some(version) = &self.spec.version {
            write!(f, ":{version}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedNode {
    pub coordinate: Coordinate,
    pub scope: Scope,
    pub depth: usize,
    pub root: bool,
    pub optional: bool,
    /// From the root down to the node's parent, along the winning path.
    pub path: Vec<Coordinate>,
    pub descriptor: Option<PathBuf>,
    pub artifact: Option<PathBuf>,
    pub native_library: Option<PathBuf>,
    #[serde(skip)]
    pub failure: Option<SysdepsError>,
}

impl ResolvedNode {
    pub fn is_resolved(&self) -> bool {
        self.failure.is_none() && self.artifact.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    pub from: Coordinate,
    pub to: Coordinate,
    pub scope: Scope,
    pub exclusions: Vec<GroupArtifact>,
    pub optional: bool,
    pub declared_at_depth: usize,
}

/// A version that lost mediation to an already selected one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediationLoser {
    pub key: ManagementKey,
    pub selected: Coordinate,
    pub discarded: Coordinate,
    pub path: Vec<Coordinate>,
}

#[derive(Debug, Clone)]
pub struct NodeFailure {
    /// Coordinate, or `group:artifact` with the unmet requirement.
    pub subject: String,
    pub error: SysdepsError,
    pub path: Vec<Coordinate>,
    pub root: bool,
}

impl fmt::Display for NodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.error)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedGraph {
    /// Roots first in request order, then discovery order.
    pub nodes: Vec<ResolvedNode>,
    pub edges: Vec<DependencyEdge>,
    pub discarded: Vec<MediationLoser>,
    pub failures: Vec<NodeFailure>,
    pub profiles: Vec<ProfileDecision>,
    pub warnings: Vec<String>,
    pub complete: bool,
}

impl ResolvedGraph {
    pub fn node(&self, coordinate: &Coordinate) -> Option<&ResolvedNode> {
        self.nodes.iter().find(|n| &n.coordinate == coordinate)
    }

    pub fn root_failures(&self) -> impl Iterator<Item = &NodeFailure> {
        self.failures.iter().filter(|f| f.root)
    }
}

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("{} root(s) could not be resolved: {}", failures.len(), join(failures))]
    Unresolved {
        failures: Vec<NodeFailure>,
        graph: Box<ResolvedGraph>,
    },

    #[error("Resolution cancelled after {} nodes", graph.nodes.len())]
    Cancelled { graph: Box<ResolvedGraph> },
}

impl ResolutionError {
    /// The partial graph built before failing.
    pub fn graph(&self) -> &ResolvedGraph {
        match self {
            ResolutionError::Unresolved { graph, .. } | ResolutionError::Cancelled { graph } => graph,
        }
    }

    pub fn into_graph(self) -> ResolvedGraph {
        match self {
            ResolutionError::Unresolved { graph, .. } | ResolutionError::Cancelled { graph } => *graph,
        }
    }
}

fn join(failures: &[NodeFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
