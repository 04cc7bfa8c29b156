mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> miette::Result<()> {
    match Cli::parse().command {
        Commands::Resolve {
            requirements,
            location,
            latest,
            registry,
            no_configure,
            dry_run,
        } => commands::resolve::run(requirements, location, latest, registry, no_configure, dry_run),
        Commands::Generate {
            config,
            plugin,
            output,
            dry_run,
        } => commands::generate::run(config, plugin, output, dry_run),
        Commands::Check { path } => commands::check::run(path),
    }
}
