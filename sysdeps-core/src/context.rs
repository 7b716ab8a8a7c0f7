// sysdeps-core/src/context.rs
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sysdeps_common::config::Config;
use sysdeps_common::error::Result;
use sysdeps_common::model::{EffectiveModel, Gav, ScopeFilter};
use tracing::debug;

use crate::model::ModelStore;
use crate::repository::RepositoryIndex;
use crate::resolver::{self, ResolutionError, ResolvedGraph, RootRequest};

/// Parameters of one resolution run.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Win over every property a descriptor defines.
    pub properties: BTreeMap<String, String>,
    pub active_profiles: Vec<String>,
    pub scopes: ScopeFilter,
    pub max_inheritance_depth: usize,
    pub max_interpolation_passes: usize,
    /// Upper bound on concurrent model prefetches.
    pub workers: usize,
    /// Snapshot backing `${env.NAME}`.
    pub env: BTreeMap<String, String>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self::settings(&Config::default())
    }
}

impl ResolveOptions {
    /// Settings from `config` plus a snapshot of the process environment.
    pub fn from_config(config: &Config) -> Self {
        Self {
            env: std::env::vars().collect(),
            ..Self::settings(config)
        }
    }

    fn settings(config: &Config) -> Self {
        Self {
            properties: config.properties.clone(),
            active_profiles: config.active_profiles.clone(),
            scopes: config.scopes,
            max_inheritance_depth: config.max_inheritance_depth,
            max_interpolation_passes: config.max_interpolation_passes,
            workers: config.scan_workers.max(1),
            env: BTreeMap::new(),
        }
    }
}

/// Cooperative cancellation, checked between node expansions.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        debug!("Cancellation requested");
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything one invocation shares: options, the index and model caches.
pub struct ResolutionContext {
    options: ResolveOptions,
    index: Arc<RepositoryIndex>,
    models: ModelStore,
    cancellation: CancellationToken,
}

impl ResolutionContext {
    pub fn new(options: ResolveOptions, index: Arc<RepositoryIndex>) -> Self {
        let models = ModelStore::new(Arc::clone(&index), &options);
        Self {
            options,
            index,
            models,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn index(&self) -> &RepositoryIndex {
        &self.index
    }

    pub fn models(&self) -> &ModelStore {
        &self.models
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn effective_model(&self, gav: &Gav) -> Result<Arc<EffectiveModel>> {
        self.models.effective(gav)
    }

    /// Resolves `roots` into a located graph.
    pub fn resolve(&self, roots: &[RootRequest]) -> std::result::Result<ResolvedGraph, ResolutionError> {
        resolver::resolve(self, roots)
    }
}
