// sysdeps-core/src/resolver/mod.rs
//! Transitive graph resolution: breadth-first discovery with nearest-wins
//! mediation, then artifact location.
pub mod engine;
pub mod graph;

pub use engine::GraphResolver;
pub use graph::{
    DependencyEdge, MediationLoser, NodeFailure, ResolutionError, ResolvedGraph, ResolvedNode, RootRequest,
};
use tracing::{debug, error, info, instrument, warn};

use crate::context::ResolutionContext;
use crate::locator::ArtifactLocator;

/// Resolves `roots` and locates every selected node's files.
///
/// Failures below the roots are recorded on the graph; the run only fails
/// when a root cannot be resolved or the run is cancelled.
#[instrument(skip_all, fields(roots = roots.len()))]
pub fn resolve(ctx: &ResolutionContext, roots: &[RootRequest]) -> Result<ResolvedGraph, ResolutionError> {
    let mut resolver = GraphResolver::new(ctx);
    let complete = resolver.run(roots);
    let mut graph = resolver.finish(complete);

    ArtifactLocator::new(ctx.index()).locate_all(&mut graph);

    if !complete {
        warn!("Resolution cancelled with {} node(s) selected", graph.nodes.len());
        return Err(ResolutionError::Cancelled { graph: Box::new(graph) });
    }

    let failures: Vec<NodeFailure> = graph.root_failures().cloned().collect();
    if !failures.is_empty() {
        for failure in &failures {
            error!("Root {}", failure);
        }
        return Err(ResolutionError::Unresolved {
            failures,
            graph: Box::new(graph),
        });
    }

    let resolved = graph.nodes.iter().filter(|n| n.is_resolved()).count();
    info!(
        "Resolved {}/{} node(s), {} discarded by mediation, {} failure(s)",
        resolved,
        graph.nodes.len(),
        graph.discarded.len(),
        graph.failures.len()
    );
    debug!("Edges: {}", graph.edges.len());
    Ok(graph)
}
