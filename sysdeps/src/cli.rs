// sysdeps/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use sysdeps_common::config::{self, Config};
use sysdeps_common::error::SysdepsError;
use sysdeps_common::model::ScopeFilter;
use sysdeps_core::ResolutionError;
use thiserror::Error;

pub mod index;
pub mod resolve;
pub mod show;

use crate::cli::index::IndexArgs;
use crate::cli::resolve::ResolveArgs;
use crate::cli::show::ShowArgs;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "sysdeps", bin_name = "sysdeps")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve coordinates into a manifest of local files
    Resolve(ResolveArgs),
    /// Scan the repository directories and summarise what was found
    Index(IndexArgs),
    /// Print the effective model of one coordinate as JSON
    Show(ShowArgs),
}

impl Command {
    pub fn run(&self, config: Config) -> Result<(), CliError> {
        match self {
            Self::Resolve(command) => command.run(config),
            Self::Index(command) => command.run(config),
            Self::Show(command) => command.run(config),
        }
    }
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Sysdeps(#[from] SysdepsError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// Where to look for descriptors, jars and native libraries.
#[derive(Args, Debug, Clone, Default)]
pub struct RepositoryArgs {
    /// Descriptor directory (repeatable; replaces the configured list)
    #[arg(long = "metadata-dir", value_name = "DIR")]
    pub metadata_dirs: Vec<PathBuf>,

    /// Jar directory (repeatable; replaces the configured list)
    #[arg(long = "jar-dir", value_name = "DIR")]
    pub jar_dirs: Vec<PathBuf>,

    /// Native library directory (repeatable; replaces the configured list)
    #[arg(long = "native-dir", value_name = "DIR")]
    pub native_dirs: Vec<PathBuf>,
}

impl RepositoryArgs {
    pub fn apply(&self, config: &mut Config) {
        if !self.metadata_dirs.is_empty() {
            config.metadata_dirs = self.metadata_dirs.clone();
        }
        if !self.jar_dirs.is_empty() {
            config.jar_dirs = self.jar_dirs.clone();
        }
        if !self.native_dirs.is_empty() {
            config.native_library_dirs = self.native_dirs.clone();
        }
    }
}

/// Inputs to model building shared by `resolve` and `show`.
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Property override, `key=value` (repeatable)
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE")]
    pub properties: Vec<String>,

    /// Profile to activate, or `!id` to deactivate (repeatable)
    #[arg(short = 'P', long = "profile", value_name = "ID")]
    pub profiles: Vec<String>,

    /// Scopes to include, comma separated
    #[arg(long, value_name = "SCOPES")]
    pub scope: Option<String>,
}

impl ModelArgs {
    pub fn apply(&self, config: &mut Config) -> Result<(), SysdepsError> {
        for property in &self.properties {
            let (key, value) = config::parse_property(property)?;
            config.properties.insert(key, value);
        }
        for profile in self.profiles.iter().flat_map(|p| p.split(',')) {
            let profile = profile.trim();
            if !profile.is_empty() && !config.active_profiles.iter().any(|p| p == profile) {
                config.active_profiles.push(profile.to_string());
            }
        }
        if let Some(scopes) = &self.scope {
            config.scopes = ScopeFilter::parse_list(scopes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_resolve_flags() {
        let args = CliArgs::try_parse_from([
            "sysdeps",
            "-vv",
            "resolve",
            "org.x:app:1.0",
            "org.x:tool",
            "-D",
            "jdk=17",
            "-P",
            "linux,!slow",
            "--scope",
            "compile,runtime,test",
            "--metadata-dir",
            "/tmp/poms",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        let Command::Resolve(resolve) = &args.command else {
            panic!("expected resolve");
        };
        assert_eq!(resolve.coordinates, vec!["org.x:app:1.0", "org.x:tool"]);

        let mut config = Config::default();
        resolve.model.apply(&mut config).unwrap();
        resolve.repository.apply(&mut config);
        assert_eq!(config.properties.get("jdk").map(String::as_str), Some("17"));
        assert_eq!(config.active_profiles, vec!["linux", "!slow"]);
        assert!(config.scopes.contains(ScopeFilter::TEST));
        assert_eq!(config.metadata_dirs, vec![PathBuf::from("/tmp/poms")]);
        assert_eq!(config.jar_dirs, Config::default().jar_dirs);
    }

    #[test]
    fn rejects_bad_scopes() {
        let model = ModelArgs {
            scope: Some("compile,bogus".into()),
            ..ModelArgs::default()
        };
        assert!(model.apply(&mut Config::default()).is_err());
    }
}
