// sysdeps-common/src/lib.rs
pub mod config;
pub mod error;
pub mod model;

// Re-export key types
pub use config::Config;
pub use error::{Result, SysdepsError};
pub use model::{Coordinate, CoordinateSpec, EffectiveModel, Gav, GroupArtifact, Scope, ScopeFilter};
