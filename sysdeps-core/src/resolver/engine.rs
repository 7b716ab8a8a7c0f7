// sysdeps-core/src/resolver/engine.rs
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sysdeps_common::error::{Result, SysdepsError};
use sysdeps_common::model::{
    Coordinate, Dependency, EffectiveModel, Gav, GroupArtifact, ManagementKey, ProfileDecision, Scope,
    VersionRequirement,
};
use tracing::{debug, warn};

use super::graph::{DependencyEdge, MediationLoser, NodeFailure, ResolvedGraph, ResolvedNode, RootRequest};
use crate::context::ResolutionContext;

/// A node waiting for its dependencies to be expanded.
struct Pending {
    node: usize,
    scope: Scope,
    exclusions: Vec<GroupArtifact>,
    /// Effective models from the root down to the node's parent.
    ancestors: Vec<Arc<EffectiveModel>>,
    path: Vec<Coordinate>,
}

/// One arrival at a coordinate through some edge.
struct Candidate {
    coordinate: Coordinate,
    scope: Scope,
    depth: usize,
    optional: bool,
    exclusions: Vec<GroupArtifact>,
    ancestors: Vec<Arc<EffectiveModel>>,
    path: Vec<Coordinate>,
}

/// Breadth-first, nearest-wins graph construction.
pub struct GraphResolver<'a> {
    ctx: &'a ResolutionContext,
    nodes: Vec<ResolvedNode>,
    /// Exclusions in force for each node; shrinks when a less restricted path arrives.
    node_exclusions: Vec<Vec<GroupArtifact>>,
    selected: HashMap<ManagementKey, usize>,
    edges: Vec<DependencyEdge>,
    edge_positions: HashMap<(usize, usize), usize>,
    discarded: Vec<MediationLoser>,
    failures: Vec<NodeFailure>,
    failed: HashSet<usize>,
    profiles: Vec<ProfileDecision>,
    seen_profiles: HashSet<(String, String)>,
    warnings: Vec<String>,
    seen_warnings: HashSet<String>,
    expanded_models: HashSet<Gav>,
}

impl<'a> GraphResolver<'a> {
    pub fn new(ctx: &'a ResolutionContext) -> Self {
        let mut resolver = Self {
            ctx,
            nodes: Vec::new(),
            node_exclusions: Vec::new(),
            selected: HashMap::new(),
            edges: Vec::new(),
            edge_positions: HashMap::new(),
            discarded: Vec::new(),
            failures: Vec::new(),
            failed: HashSet::new(),
            profiles: Vec::new(),
            seen_profiles: HashSet::new(),
            warnings: Vec::new(),
            seen_warnings: HashSet::new(),
            expanded_models: HashSet::new(),
        };
        for warning in ctx.index().warnings() {
            resolver.warn_once(warning.clone());
        }
        resolver
    }

    /// Builds the graph level by level. Returns `false` when cancelled.
    pub fn run(&mut self, roots: &[RootRequest]) -> bool {
        debug!("Resolving {} root(s)", roots.len());
        let mut level = Vec::new();
        for root in roots {
            let version = match self.select_version(
                &root.spec.group_artifact(),
                root.spec.version.as_deref(),
                None,
            ) {
                Ok(v) => v,
                Err(e) => {
                    warn!("Root {} cannot be resolved: {}", root, e);
                    self.failures.push(NodeFailure {
                        subject: root.to_string(),
                        error: e,
                        path: Vec::new(),
                        root: true,
                    });
                    continue;
                }
            };
            let candidate = Candidate {
                coordinate: root.spec.clone().into_coordinate(version),
                scope: root.scope,
                depth: 0,
                optional: false,
                exclusions: root.exclusions.clone(),
                ancestors: Vec::new(),
                path: Vec::new(),
            };
            if let Some(pending) = self.discover(candidate, None) {
                level.push(pending);
            }
        }

        let mut depth = 0;
        while !level.is_empty() {
            if self.ctx.cancellation().is_cancelled() {
                debug!("Cancelled before depth {}", depth);
                return false;
            }
            debug!("Expanding {} node(s) at depth {}", level.len(), depth);
            self.prefetch(&level);

            let mut next = Vec::new();
            for pending in level {
                if self.ctx.cancellation().is_cancelled() {
                    debug!("Cancelled during depth {}", depth);
                    return false;
                }
                next.extend(self.expand(pending));
            }
            level = next;
            depth += 1;
        }
        true
    }

    pub fn finish(self, complete: bool) -> ResolvedGraph {
        ResolvedGraph {
            nodes: self.nodes,
            edges: self.edges,
            discarded: self.discarded,
            failures: self.failures,
            profiles: self.profiles,
            warnings: self.warnings,
            complete,
        }
    }

    /// Loads a level's models concurrently so expansion only hits the cache.
    fn prefetch(&self, level: &[Pending]) {
        let mut seen = HashSet::new();
        let gavs: Vec<Gav> = level
            .iter()
            .map(|p| self.nodes[p.node].coordinate.gav())
            .filter(|gav| seen.insert(gav.clone()) && self.ctx.models().cached_effective(gav).is_none())
            .collect();
        let workers = self.ctx.options().workers.min(gavs.len());
        if workers < 2 {
            return;
        }

        let ctx = self.ctx;
        let next = AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    if i >= gavs.len() || ctx.cancellation().is_cancelled() {
                        break;
                    }
                    // Errors are cached and reported when the node is expanded.
                    let _ = ctx.models().effective(&gavs[i]);
                });
            }
        });
    }

    /// Applies mediation to an arrival. Returns work when the node is new or
    /// was promoted and must be expanded again.
    fn discover(&mut self, candidate: Candidate, from: Option<usize>) -> Option<Pending> {
        let key = candidate.coordinate.management_key();

        let pending = match self.selected.get(&key).copied() {
            Some(index) => {
                let existing = &self.nodes[index];
                if existing.coordinate.version != candidate.coordinate.version {
                    debug!(
                        "Mediation: {} wins over {}",
                        existing.coordinate, candidate.coordinate
                    );
                    self.discarded.push(MediationLoser {
                        key,
                        selected: existing.coordinate.clone(),
                        discarded: candidate.coordinate,
                        path: candidate.path,
                    });
                    return None;
                }

                let widened = candidate.scope.is_wider_than(existing.scope);
                let current = &self.node_exclusions[index];
                let narrowed: Vec<GroupArtifact> = current
                    .iter()
                    .filter(|e| candidate.exclusions.contains(e))
                    .cloned()
                    .collect();
                let relaxed = narrowed.len() < current.len();

                if let Some(from) = from {
                    self.record_edge(from, index, &candidate);
                }
                if !widened && !relaxed {
                    return None;
                }

                let node = &mut self.nodes[index];
                if widened {
                    debug!(
                        "Promoting {} from {} to {}",
                        node.coordinate, node.scope, candidate.scope
                    );
                    node.scope = candidate.scope;
                }
                if relaxed {
                    debug!("Re-expanding {} with fewer exclusions", node.coordinate);
                }
                self.node_exclusions[index] = narrowed.clone();
                Pending {
                    node: index,
                    scope: node.scope,
                    exclusions: narrowed,
                    ancestors: candidate.ancestors,
                    path: candidate.path,
                }
            }
            None => {
                let index = self.nodes.len();
                debug!(
                    "Selected {} ({}) at depth {}",
                    candidate.coordinate, candidate.scope, candidate.depth
                );
                self.nodes.push(ResolvedNode {
                    coordinate: candidate.coordinate.clone(),
                    scope: candidate.scope,
                    depth: candidate.depth,
                    root: from.is_none(),
                    optional: candidate.optional,
                    path: candidate.path.clone(),
                    descriptor: None,
                    artifact: None,
                    native_library: None,
                    failure: None,
                });
                self.node_exclusions.push(candidate.exclusions.clone());
                self.selected.insert(key, index);
                if let Some(from) = from {
                    self.record_edge(from, index, &candidate);
                }
                Pending {
                    node: index,
                    scope: candidate.scope,
                    exclusions: candidate.exclusions,
                    ancestors: candidate.ancestors,
                    path: candidate.path,
                }
            }
        };
        Some(pending)
    }

    fn record_edge(&mut self, from: usize, to: usize, candidate: &Candidate) {
        let edge = DependencyEdge {
            from: self.nodes[from].coordinate.clone(),
            to: self.nodes[to].coordinate.clone(),
            scope: candidate.scope,
            exclusions: candidate.exclusions.clone(),
            optional: candidate.optional,
            declared_at_depth: self.nodes[from].depth,
        };
        match self.edge_positions.get(&(from, to)) {
            Some(&position) => {
                let existing = &mut self.edges[position];
                if edge.scope.is_wider_than(existing.scope) {
                    existing.scope = edge.scope;
                }
            }
            None => {
                self.edge_positions.insert((from, to), self.edges.len());
                self.edges.push(edge);
            }
        }
    }

    fn expand(&mut self, pending: Pending) -> Vec<Pending> {
        let coordinate = self.nodes[pending.node].coordinate.clone();
        let depth = self.nodes[pending.node].depth;

        let model = match self.ctx.models().effective(&coordinate.gav()) {
            Ok(model) => model,
            Err(SysdepsError::DescriptorNotFound(_)) => {
                self.warn_once(format!("{coordinate}: no descriptor; treated as a leaf"));
                return Vec::new();
            }
            Err(e) => {
                if self.failed.insert(pending.node) {
                    warn!("Cannot build model for {}: {}", coordinate, e);
                    self.nodes[pending.node].failure = Some(e.clone());
                    self.failures.push(NodeFailure {
                        subject: coordinate.to_string(),
                        error: e,
                        path: pending.path.clone(),
                        root: depth == 0,
                    });
                }
                return Vec::new();
            }
        };
        self.nodes[pending.node].descriptor = Some(model.descriptor.clone());
        self.record_model(&model);

        let mut path = pending.path.clone();
        path.push(coordinate.clone());
        let mut ancestors = pending.ancestors.clone();
        ancestors.push(Arc::clone(&model));

        let mut next = Vec::new();
        for dependency in &model.dependencies {
            if dependency.optional && depth > 0 {
                debug!("Skipping optional {}:{} below the root", dependency.group, dependency.artifact);
                continue;
            }
            let ga = dependency.group_artifact();
            if pending.exclusions.iter().any(|e| e.matches(&ga)) {
                debug!("Excluded {} under {}", ga, coordinate);
                continue;
            }

            let (requirement, declared) = managed_override(&pending.ancestors, dependency);
            let scope = if depth == 0 {
                match declared {
                    Scope::Import => None,
                    declared => Some(pending.scope.narrower(declared)),
                }
            } else {
                Scope::propagate(pending.scope, declared)
            };
            let Some(scope) = scope.filter(|s| self.ctx.options().scopes.admits(*s)) else {
                debug!("Scope {} of {} not admitted under {}", declared, ga, coordinate);
                continue;
            };

            let version = match self.select_version(&ga, requirement.as_deref(), Some(&coordinate)) {
                Ok(v) => v,
                Err(e) => {
                    warn!("{} required by {}: {}", ga, coordinate, e);
                    self.failures.push(NodeFailure {
                        subject: format!("{ga}:{}", requirement.as_deref().unwrap_or("*")),
                        error: e,
                        path: path.clone(),
                        root: false,
                    });
                    continue;
                }
            };

            let mut exclusions = pending.exclusions.clone();
            for exclusion in &dependency.exclusions {
                if !exclusions.contains(exclusion) {
                    exclusions.push(exclusion.clone());
                }
            }
            let candidate = Candidate {
                coordinate: dependency.coordinate(version),
                scope,
                depth: depth + 1,
                optional: dependency.optional,
                exclusions,
                ancestors: ancestors.clone(),
                path: path.clone(),
            };
            next.extend(self.discover(candidate, Some(pending.node)));
        }
        next
    }

    /// Turns a version, range or nothing into one concrete indexed version.
    fn select_version(
        &mut self,
        ga: &GroupArtifact,
        requirement: Option<&str>,
        required_by: Option<&Coordinate>,
    ) -> Result<String> {
        let index = self.ctx.index();
        let Some(raw) = requirement else {
            let highest = index.highest_version(ga).map(str::to_string).ok_or_else(|| {
                SysdepsError::NoMatchingVersion {
                    artifact: ga.to_string(),
                    requirement: "any version".to_string(),
                }
            })?;
            let by = required_by.map(|c| format!(" (required by {c})")).unwrap_or_default();
            self.warn_once(format!("{ga}{by} has no version; using highest available {highest}"));
            return Ok(highest);
        };

        match VersionRequirement::parse(raw)? {
            VersionRequirement::Exact(version) => Ok(version),
            range @ VersionRequirement::Range(_) => range
                .select(index.versions(ga))
                .map(str::to_string)
                .ok_or_else(|| SysdepsError::NoMatchingVersion {
                    artifact: ga.to_string(),
                    requirement: raw.to_string(),
                }),
        }
    }

    fn record_model(&mut self, model: &EffectiveModel) {
        if !self.expanded_models.insert(model.gav()) {
            return;
        }
        for decision in model.active_profiles() {
            if self
                .seen_profiles
                .insert((decision.declared_in.clone(), decision.id.clone()))
            {
                self.profiles.push(decision.clone());
            }
        }
        for warning in &model.warnings {
            self.warn_once(format!("{}: {}", model.gav(), warning));
        }
    }

    fn warn_once(&mut self, message: String) {
        if self.seen_warnings.insert(message.clone()) {
            self.warnings.push(message);
        }
    }
}

/// Version and scope after the nearest-to-root management entry for the key.
fn managed_override(ancestors: &[Arc<EffectiveModel>], dependency: &Dependency) -> (Option<String>, Scope) {
    let key = dependency.key();
    let managed = ancestors.iter().find_map(|model| model.management.get(&key));
    match managed {
        Some(entry) => (
            entry.version.clone().or_else(|| dependency.version.clone()),
            entry
                .scope
                .filter(|s| *s != Scope::Import)
                .unwrap_or(dependency.scope),
        ),
        None => (dependency.version.clone(), dependency.scope),
    }
}
