// sysdeps/src/cli/resolve.rs
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, ValueEnum};
use colored::Colorize;
use sysdeps_common::config::Config;
use sysdeps_common::model::GroupArtifact;
use sysdeps_core::{
    scan, Diagnostics, Manifest, ResolutionContext, ResolveOptions, RootRequest, ScanOptions,
};
use tracing::{debug, info};

use super::{CliError, ModelArgs, RepositoryArgs};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Text,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Coordinates as `group:artifact[:version]` or with type and classifier
    #[arg(required = true, value_name = "COORD")]
    pub coordinates: Vec<String>,

    /// Exclude `group:artifact` (`*` wildcards allowed) below every root
    #[arg(long, value_name = "GROUP:ARTIFACT")]
    pub exclude: Vec<String>,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub repository: RepositoryArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the manifest here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl ResolveArgs {
    pub fn run(&self, mut config: Config) -> Result<(), CliError> {
        self.repository.apply(&mut config);
        self.model.apply(&mut config)?;

        let exclusions = self
            .exclude
            .iter()
            .map(|e| e.parse::<GroupArtifact>())
            .collect::<Result<Vec<_>, _>>()?;
        let roots = self
            .coordinates
            .iter()
            .map(|c| {
                let mut request: RootRequest = c.parse()?;
                request.exclusions = exclusions.clone();
                Ok(request)
            })
            .collect::<Result<Vec<_>, CliError>>()?;

        let index = Arc::new(scan(&ScanOptions::from_config(&config)));
        info!(
            "Indexed {} descriptors, {} artifacts, {} native libraries",
            index.descriptor_count(),
            index.artifact_count(),
            index.native_count()
        );
        let ctx = ResolutionContext::new(ResolveOptions::from_config(&config), index);

        let (graph, failure) = match ctx.resolve(&roots) {
            Ok(graph) => (graph, None),
            Err(e) => {
                debug!("Resolution failed, emitting the partial graph");
                (e.graph().clone(), Some(e))
            }
        };
        let diagnostics = Diagnostics::from_graph(&graph);
        let manifest = Manifest::from_graph(&graph, &diagnostics);
        self.emit(&manifest)?;

        let resolved = manifest.resolved().count();
        eprintln!(
            "{}{}",
            "==> ".bold().blue(),
            format!(
                "{resolved}/{} artifacts resolved, {} unresolved, {} warnings",
                manifest.artifacts.len(),
                diagnostics.unresolved.len(),
                diagnostics.warnings.len()
            )
            .bold()
        );

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    fn emit(&self, manifest: &Manifest) -> Result<(), CliError> {
        match (self.format, &self.output) {
            (OutputFormat::Json, Some(path)) => manifest.write_json(path)?,
            (OutputFormat::Json, None) => println!("{}", manifest.to_json_string()?),
            (OutputFormat::Text, Some(path)) => {
                fs::write(path, manifest.render_report()).map_err(sysdeps_common::SysdepsError::from)?
            }
            (OutputFormat::Text, None) => print!("{}", manifest.render_report()),
        }
        if let Some(path) = &self.output {
            debug!("Manifest written to {}", path.display());
        }
        Ok(())
    }
}
