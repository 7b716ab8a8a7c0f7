// sysdeps/src/cli/show.rs
use std::sync::Arc;

use clap::Args;
use sysdeps_common::config::Config;
use sysdeps_common::error::SysdepsError;
use sysdeps_common::model::{CoordinateSpec, Gav};
use sysdeps_core::{scan, ResolutionContext, ResolveOptions, ScanOptions};
use tracing::debug;

use super::{CliError, ModelArgs, RepositoryArgs};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// `group:artifact[:version]`; without a version the highest indexed one
    #[arg(value_name = "COORD")]
    pub coordinate: String,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub repository: RepositoryArgs,
}

impl ShowArgs {
    pub fn run(&self, mut config: Config) -> Result<(), CliError> {
        self.repository.apply(&mut config);
        self.model.apply(&mut config)?;

        let spec: CoordinateSpec = self.coordinate.parse()?;
        let index = Arc::new(scan(&ScanOptions::from_config(&config)));
        let version = match &spec.version {
            Some(version) => version.clone(),
            None => index
                .highest_version(&spec.group_artifact())
                .map(str::to_string)
                .ok_or_else(|| SysdepsError::DescriptorNotFound(self.coordinate.clone()))?,
        };
        let gav = Gav::new(&spec.group, &spec.artifact, version);
        debug!("Showing effective model of {}", gav);

        let ctx = ResolutionContext::new(ResolveOptions::from_config(&config), index);
        let model = ctx.effective_model(&gav)?;
        let json = serde_json::to_string_pretty(model.as_ref()).map_err(SysdepsError::from)?;
        println!("{json}");
        Ok(())
    }
}
