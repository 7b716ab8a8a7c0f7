// sysdeps-common/src/model/mod.rs
pub mod coordinate;
pub mod descriptor;
pub mod effective;
pub mod scope;
pub mod version;

pub use coordinate::{Coordinate, CoordinateSpec, Gav, GroupArtifact, ManagementKey};
pub use descriptor::{Activation, FileCondition, ParentRef, PropertyCondition, RawDependency, RawModel, RawProfile};
pub use effective::{Dependency, EffectiveModel, ManagedDependency, ManagementTable, ProfileDecision};
pub use scope::{Scope, ScopeFilter};
pub use version::{MavenVersion, VersionRange, VersionRequirement};
