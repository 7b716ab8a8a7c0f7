// sysdeps-core/src/model/store.rs
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sysdeps_common::error::{Result, SysdepsError};
use sysdeps_common::model::{
    Dependency, EffectiveModel, Gav, GroupArtifact, ManagedDependency, ManagementKey, ParentRef,
    RawDependency, RawModel, Scope,
};
use tracing::{debug, instrument, warn};

use super::flight::SingleFlight;
use super::interpolate::{self, has_placeholder, PropertyScope};
use super::layer::ModelLayer;
use super::management;
use super::profile::{self, ActivationInputs};
use crate::context::ResolveOptions;
use crate::descriptor::parser;
use crate::repository::RepositoryIndex;

/// A descriptor with its whole parent chain folded in, before interpolation.
#[derive(Debug)]
pub struct InheritedModel {
    pub raw: Arc<RawModel>,
    pub layer: ModelLayer,
}

type Shared<T> = Result<Arc<T>>;

/// Memoized raw, inherited and effective models for one run.
pub struct ModelStore {
    index: Arc<RepositoryIndex>,
    overrides: BTreeMap<String, String>,
    requested_profiles: Vec<String>,
    env: BTreeMap<String, String>,
    max_depth: usize,
    max_passes: usize,
    raw: SingleFlight<PathBuf, Shared<RawModel>>,
    inherited: SingleFlight<PathBuf, Shared<InheritedModel>>,
    effective: SingleFlight<Gav, Shared<EffectiveModel>>,
}

impl ModelStore {
    pub fn new(index: Arc<RepositoryIndex>, options: &ResolveOptions) -> Self {
        Self {
            index,
            overrides: options.properties.clone(),
            requested_profiles: options.active_profiles.clone(),
            env: options.env.clone(),
            max_depth: options.max_inheritance_depth,
            max_passes: options.max_interpolation_passes,
            raw: SingleFlight::new(),
            inherited: SingleFlight::new(),
            effective: SingleFlight::new(),
        }
    }

    pub fn raw(&self, path: &Path) -> Shared<RawModel> {
        self.raw
            .get_or_compute(&path.to_path_buf(), || parser::load(path).map(Arc::new))
            .unwrap_or_else(|chain| Err(cycle_error(chain.iter().map(|p| p.display().to_string()))))
    }

    /// The effective model of an indexed descriptor.
    pub fn effective(&self, gav: &Gav) -> Shared<EffectiveModel> {
        self.effective_in(gav, &[])
    }

    /// A finished model (or its error) without computing anything.
    pub fn cached_effective(&self, gav: &Gav) -> Option<Shared<EffectiveModel>> {
        self.effective.get(gav)
    }

    fn effective_in(&self, gav: &Gav, importers: &[Gav]) -> Shared<EffectiveModel> {
        if importers.contains(gav) {
            return Err(cycle_error(importers.iter().chain([gav]).map(Gav::to_string)));
        }
        self.effective
            .get_or_compute(gav, || self.build_effective(gav, importers))
            .unwrap_or_else(|chain| Err(cycle_error(chain.iter().map(Gav::to_string))))
    }

    pub fn inherited(&self, path: &Path) -> Shared<InheritedModel> {
        self.inherited_in(path, &[])
    }

    fn inherited_in(&self, path: &Path, chain: &[(PathBuf, String)]) -> Shared<InheritedModel> {
        let raw = self.raw(path)?;
        let label = label_of(&raw);

        if chain.iter().any(|(p, _)| p == path) {
            return Err(cycle_error(
                chain.iter().map(|(_, l)| l.clone()).chain([label]),
            ));
        }

        let mut extended = chain.to_vec();
        extended.push((path.to_path_buf(), label));
        self.inherited
            .get_or_compute(&path.to_path_buf(), || self.build_inherited(raw, &extended))
            .unwrap_or_else(|keys| Err(cycle_error(keys.iter().map(|p| p.display().to_string()))))
    }

    fn build_inherited(&self, raw: Arc<RawModel>, chain: &[(PathBuf, String)]) -> Shared<InheritedModel> {
        let parent = match &raw.parent {
            None => None,
            Some(parent_ref) => {
                let parent_ref = self.expand_parent_ref(&raw, parent_ref);
                let parent_path = self.locate_parent(&raw, &parent_ref).ok_or_else(|| {
                    SysdepsError::UnresolvedParent {
                        child: label_of(&raw),
                        parent: parent_ref.gav().to_string(),
                    }
                })?;
                debug!("Parent of {} is {}", label_of(&raw), parent_path.display());
                Some(self.inherited_in(&parent_path, chain)?)
            }
        };

        let mut properties = parent
            .as_ref()
            .map(|p| p.layer.properties.clone())
            .unwrap_or_default();
        properties.extend(raw.properties.iter().cloned());

        let group = raw
            .group()
            .or_else(|| parent.as_ref().and_then(|p| p.layer.group.as_deref()))
            .unwrap_or_default()
            .to_string();
        let version = raw
            .version()
            .or_else(|| parent.as_ref().and_then(|p| p.layer.version.as_deref()))
            .unwrap_or_default()
            .to_string();
        let basedir = raw.path.parent().unwrap_or(Path::new("."));
        let builtins = interpolate::builtins(
            &group,
            &raw.artifact,
            &version,
            raw.packaging(),
            raw.parent.as_ref(),
            Some(basedir),
        );
        let scope = self.scope(&properties, &builtins);
        let inputs = ActivationInputs {
            properties: scope,
            requested: &self.requested_profiles,
            basedir,
        };
        let (active, decisions) = profile::select(&raw, &inputs);
        let gav = Gav::new(
            scope.interpolate_lossy(&group),
            scope.interpolate_lossy(&raw.artifact),
            scope.interpolate_lossy(&version),
        );

        let own = ModelLayer::from_descriptor(&raw, gav, &active, decisions);
        let layer = match &parent {
            Some(parent) => ModelLayer::merge(&parent.layer, &own),
            None => own,
        };
        // Own lineage only, independent of the requesting chain.
        if layer.lineage.len() > self.max_depth {
            return Err(SysdepsError::InheritanceDepth {
                coordinate: label_of(&raw),
                limit: self.max_depth,
            });
        }
        Ok(Arc::new(InheritedModel {
            raw: Arc::clone(&raw),
            layer,
        }))
    }

    /// Parent coordinates may use the child's properties, e.g. `${revision}`.
    fn expand_parent_ref(&self, raw: &RawModel, parent: &ParentRef) -> ParentRef {
        if !has_placeholder(&parent.group) && !has_placeholder(&parent.version) {
            return parent.clone();
        }
        let properties: BTreeMap<String, String> = raw.properties.iter().cloned().collect();
        let empty = BTreeMap::new();
        let scope = self.scope(&properties, &empty);
        ParentRef {
            group: scope.interpolate_lossy(&parent.group),
            artifact: scope.interpolate_lossy(&parent.artifact),
            version: scope.interpolate_lossy(&parent.version),
            relative_path: parent.relative_path.clone(),
        }
    }

    /// `relativePath` when it holds the right descriptor, then the index, then
    /// a sibling `<artifactId>.pom`.
    fn locate_parent(&self, raw: &RawModel, parent: &ParentRef) -> Option<PathBuf> {
        let dir = raw.path.parent()?;
        let wanted = parent.gav();

        let relative = parent.relative_path.as_deref().unwrap_or("../pom.xml");
        if !relative.is_empty() {
            let mut candidate = dir.join(relative);
            if candidate.is_dir() {
                candidate = candidate.join("pom.xml");
            }
            if candidate.is_file() && candidate != raw.path {
                match self.raw(&candidate) {
                    Ok(found) if self.identity_matches(&found, &wanted) => return Some(candidate),
                    Ok(_) => debug!(
                        "{} is not {}, ignoring relativePath",
                        candidate.display(),
                        wanted
                    ),
                    Err(e) => debug!("Cannot read {}: {}", candidate.display(), e),
                }
            }
        }

        if let Some(entry) = self.index.descriptor(&wanted) {
            return Some(entry.path.clone());
        }

        let sibling = dir.join(format!("{}.pom", parent.artifact));
        if sibling.is_file() && sibling != raw.path {
            if let Ok(found) = self.raw(&sibling) {
                if found.artifact == parent.artifact {
                    return Some(sibling);
                }
            }
        }
        None
    }

    fn identity_matches(&self, found: &RawModel, wanted: &Gav) -> bool {
        let properties: BTreeMap<String, String> = found.properties.iter().cloned().collect();
        let empty = BTreeMap::new();
        let scope = self.scope(&properties, &empty);
        found.artifact == wanted.artifact
            && found.group().map(|g| scope.interpolate_lossy(g)).as_deref() == Some(wanted.group.as_str())
            && found.version().map(|v| scope.interpolate_lossy(v)).as_deref() == Some(wanted.version.as_str())
    }

    fn scope<'a>(
        &'a self,
        properties: &'a BTreeMap<String, String>,
        builtins: &'a BTreeMap<String, String>,
    ) -> PropertyScope<'a> {
        PropertyScope {
            overrides: &self.overrides,
            properties,
            builtins,
            env: &self.env,
            max_passes: self.max_passes,
        }
    }

    #[instrument(level = "debug", skip_all, fields(gav = %gav))]
    fn build_effective(&self, gav: &Gav, importers: &[Gav]) -> Shared<EffectiveModel> {
        let entry = self
            .index
            .descriptor(gav)
            .ok_or_else(|| SysdepsError::DescriptorNotFound(gav.to_string()))?;
        let inherited = self.inherited(&entry.path)?;
        let raw = &inherited.raw;
        let layer = &inherited.layer;

        let builtins = interpolate::builtins(
            &gav.group,
            &gav.artifact,
            &gav.version,
            raw.packaging(),
            raw.parent.as_ref(),
            entry.path.parent(),
        );
        let scope = self.scope(&layer.properties, &builtins);
        let mut warnings = raw.warnings.clone();

        let properties = layer
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), scope.interpolate_lossy(v)))
            .collect();

        let managed = layer
            .management
            .iter()
            .map(|entry| managed_entry(entry, &scope))
            .collect::<Result<Vec<_>>>()?;
        let mut importers = importers.to_vec();
        importers.push(gav.clone());
        let management =
            management::expand_imports(managed, |import| self.effective_in(import, &importers), &mut warnings)?;

        let mut dependencies: Vec<Dependency> = Vec::with_capacity(layer.dependencies.len());
        let mut positions: HashMap<ManagementKey, usize> = HashMap::new();
        for declared in &layer.dependencies {
            let (dependency, scope_declared) = dependency_entry(declared, &scope)?;
            let dependency = management::apply(dependency, scope_declared, &management);
            match positions.get(&dependency.key()) {
                Some(&i) => dependencies[i] = dependency,
                None => {
                    positions.insert(dependency.key(), dependencies.len());
                    dependencies.push(dependency);
                }
            }
        }

        for warning in &warnings {
            warn!("{}: {}", gav, warning);
        }

        let parent = raw.parent.as_ref().map(|p| self.expand_parent_ref(raw, p).gav());
        let model = EffectiveModel {
            coordinate: gav.coordinate().with_type(scope.interpolate_lossy(raw.packaging())),
            descriptor: entry.path.clone(),
            parent,
            lineage: layer.lineage.iter().rev().cloned().collect(),
            properties,
            dependencies,
            management,
            profiles: layer.profiles.clone(),
            warnings,
        };
        debug!(
            "Effective model {}: {} dependencies, {} managed",
            gav,
            model.dependencies.len(),
            model.management.len()
        );
        Ok(Arc::new(model))
    }
}

fn label_of(raw: &RawModel) -> String {
    raw.gav()
        .map(|g| g.to_string())
        .unwrap_or_else(|| raw.path.display().to_string())
}

fn cycle_error<I: IntoIterator<Item = String>>(chain: I) -> SysdepsError {
    SysdepsError::CyclicInheritance {
        chain: chain.into_iter().collect(),
    }
}

/// A resolution field: must interpolate fully, otherwise the whole model fails.
fn resolved(scope: &PropertyScope<'_>, value: &str, field: &'static str) -> Result<String> {
    let expanded = scope.interpolate(value)?;
    if has_placeholder(&expanded) {
        return Err(SysdepsError::UnresolvedPlaceholder {
            field,
            value: expanded,
        });
    }
    Ok(expanded)
}

fn optional_text(scope: &PropertyScope<'_>, value: Option<&str>) -> Option<String> {
    value
        .map(|v| scope.interpolate_lossy(v))
        .filter(|v| !v.is_empty())
}

fn exclusions(scope: &PropertyScope<'_>, raw: &RawDependency) -> Vec<GroupArtifact> {
    raw.exclusions
        .iter()
        .map(|e| {
            GroupArtifact::new(
                scope.interpolate_lossy(&e.group),
                scope.interpolate_lossy(&e.artifact),
            )
        })
        .collect()
}

fn dependency_entry(raw: &RawDependency, scope: &PropertyScope<'_>) -> Result<(Dependency, bool)> {
    let declared_scope = raw
        .scope
        .as_deref()
        .map(|s| resolved(scope, s, "scope"))
        .transpose()?;
    let dependency = Dependency {
        group: resolved(scope, &raw.group, "groupId")?,
        artifact: resolved(scope, &raw.artifact, "artifactId")?,
        version: raw
            .version
            .as_deref()
            .map(|v| resolved(scope, v, "version"))
            .transpose()?,
        kind: optional_text(scope, raw.kind.as_deref()).unwrap_or_else(|| "jar".to_string()),
        classifier: optional_text(scope, raw.classifier.as_deref()),
        scope: declared_scope.as_deref().map(Scope::from_declared).unwrap_or_default(),
        optional: optional_text(scope, raw.optional.as_deref()).is_some_and(|o| o == "true"),
        exclusions: exclusions(scope, raw),
    };
    Ok((dependency, declared_scope.is_some()))
}

fn managed_entry(raw: &RawDependency, scope: &PropertyScope<'_>) -> Result<ManagedDependency> {
    Ok(ManagedDependency {
        group: resolved(scope, &raw.group, "groupId")?,
        artifact: resolved(scope, &raw.artifact, "artifactId")?,
        version: raw
            .version
            .as_deref()
            .map(|v| resolved(scope, v, "version"))
            .transpose()?,
        kind: optional_text(scope, raw.kind.as_deref()).unwrap_or_else(|| "jar".to_string()),
        classifier: optional_text(scope, raw.classifier.as_deref()),
        scope: raw
            .scope
            .as_deref()
            .map(|s| resolved(scope, s, "scope"))
            .transpose()?
            .map(|s| Scope::from_declared(&s)),
        exclusions: exclusions(scope, raw),
    })
}
