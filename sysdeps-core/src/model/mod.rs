// sysdeps-core/src/model/mod.rs
//! Effective model construction: inheritance, profiles, interpolation and
//! dependency management, memoized per run.
pub mod flight;
pub mod interpolate;
pub mod layer;
pub mod management;
pub mod profile;
pub mod store;

pub use flight::SingleFlight;
pub use layer::ModelLayer;
pub use store::{InheritedModel, ModelStore};
