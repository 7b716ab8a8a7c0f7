// sysdeps-common/src/error.rs
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SysdepsError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("JSON Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("Config file parse error: {0}")]
    Toml(#[from] Arc<toml::de::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Malformed descriptor {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Descriptor {} is missing required field '{field}'", path.display())]
    MissingField { path: PathBuf, field: &'static str },

    #[error("No descriptor found for {0}")]
    DescriptorNotFound(String),

    #[error("Parent {parent} of {child} could not be found")]
    UnresolvedParent { child: String, parent: String },

    #[error("Cyclic inheritance: {}", chain.join(" -> "))]
    CyclicInheritance { chain: Vec<String> },

    #[error("Inheritance chain of {coordinate} exceeds {limit} levels")]
    InheritanceDepth { coordinate: String, limit: usize },

    #[error("Expression '{expression}' did not settle after {passes} interpolation passes")]
    InterpolationDepth { expression: String, passes: usize },

    #[error("No available version of {artifact} satisfies {requirement}")]
    NoMatchingVersion { artifact: String, requirement: String },

    #[error("Artifact file for {0} not found")]
    MissingArtifact(String),

    #[error("Invalid coordinate '{0}'")]
    InvalidCoordinate(String),

    #[error("Invalid version range '{0}'")]
    InvalidVersionRange(String),

    #[error("Unresolved placeholder in {field} '{value}'")]
    UnresolvedPlaceholder { field: &'static str, value: String },
}

impl From<std::io::Error> for SysdepsError {
    fn from(err: std::io::Error) -> Self {
        SysdepsError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for SysdepsError {
    fn from(err: serde_json::Error) -> Self {
        SysdepsError::Json(Arc::new(err))
    }
}

impl From<toml::de::Error> for SysdepsError {
    fn from(err: toml::de::Error) -> Self {
        SysdepsError::Toml(Arc::new(err))
    }
}

impl SysdepsError {
    /// Stable short name used in manifests and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            SysdepsError::Io(_) => "io",
            SysdepsError::Json(_) => "json",
            SysdepsError::Toml(_) => "toml",
            SysdepsError::Config(_) => "config",
            SysdepsError::Parse { .. } => "parse",
            SysdepsError::MissingField { .. } => "missing-field",
            SysdepsError::DescriptorNotFound(_) => "descriptor-not-found",
            SysdepsError::UnresolvedParent { .. } => "unresolved-parent",
            SysdepsError::CyclicInheritance { .. } => "cyclic-inheritance",
            SysdepsError::InheritanceDepth { .. } => "inheritance-depth",
            SysdepsError::InterpolationDepth { .. } => "interpolation-depth",
            SysdepsError::NoMatchingVersion { .. } => "no-matching-version",
            SysdepsError::MissingArtifact(_) => "missing-artifact",
            SysdepsError::InvalidCoordinate(_) => "invalid-coordinate",
            SysdepsError::InvalidVersionRange(_) => "invalid-version-range",
            SysdepsError::UnresolvedPlaceholder { .. } => "unresolved-placeholder",
        }
    }
}

pub type Result<T> = std::result::Result<T, SysdepsError>;
