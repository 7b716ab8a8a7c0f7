// sysdeps/src/cli/index.rs
use clap::Args;
use colored::Colorize;
use prettytable::{format, Cell, Row, Table};
use sysdeps_common::config::Config;
use sysdeps_core::{scan, ScanOptions};

use super::{CliError, RepositoryArgs};

#[derive(Args, Debug)]
pub struct IndexArgs {
    #[command(flatten)]
    pub repository: RepositoryArgs,

    /// List every indexed descriptor
    #[arg(long)]
    pub list: bool,

    /// Print scan warnings
    #[arg(long)]
    pub warnings: bool,
}

impl IndexArgs {
    pub fn run(&self, mut config: Config) -> Result<(), CliError> {
        self.repository.apply(&mut config);
        let options = ScanOptions::from_config(&config);
        let index = scan(&options);

        for root in &options.roots {
            let marker = if root.is_dir() { "" } else { " (missing)" };
            println!("{} {}{}", "Root:".bold(), root.display(), marker.yellow());
        }
        println!(
            "{}{}",
            "==> ".bold().blue(),
            format!(
                "{} descriptors, {} artifacts, {} native libraries, {} warnings",
                index.descriptor_count(),
                index.artifact_count(),
                index.native_count(),
                index.warnings().len()
            )
            .bold()
        );

        if self.list {
            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
            table.add_row(Row::new(vec![
                Cell::new("Coordinate").style_spec("b"),
                Cell::new("Packaging").style_spec("b"),
                Cell::new("Parent").style_spec("b"),
                Cell::new("Descriptor").style_spec("b"),
            ]));
            for (gav, entry) in index.descriptors() {
                let parent = entry.parent.as_ref().map(ToString::to_string).unwrap_or_default();
                table.add_row(Row::new(vec![
                    Cell::new(&gav.to_string()),
                    Cell::new(&entry.packaging),
                    Cell::new(&parent),
                    Cell::new(&entry.path.display().to_string()),
                ]));
            }
            table.printstd();
        }

        if self.warnings {
            for warning in index.warnings() {
                println!("{} {}", "Warning:".yellow().bold(), warning);
            }
        }
        Ok(())
    }
}
