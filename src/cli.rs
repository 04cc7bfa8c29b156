use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mcresolver",
    about = "Resolve, download and configure Minecraft server plugins",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download and configure every plugin in a requirements manifest
    Resolve {
        /// Requirements manifest (YAML)
        #[arg(short = 'r', long = "requirements", value_name = "FILE")]
        requirements: String,

        /// Server directory plugins are downloaded into
        #[arg(short, long, value_name = "DIR")]
        location: String,

        /// Use the latest release when a requested version is unavailable
        #[arg(short = 'u', long)]
        latest: bool,

        /// Directory of *.rhai configurator scripts
        #[arg(long, value_name = "DIR")]
        registry: Option<String>,

        /// Download only; skip plugin configuration
        #[arg(long)]
        no_configure: bool,

        /// Resolve versions and show what would be downloaded
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate a template and defaults file from a plugin configuration
    Generate {
        /// Plugin configuration file to generate from
        config: String,

        /// Plugin name used for the generated file names
        #[arg(short, long)]
        plugin: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: String,

        /// Print the generated files instead of writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate a directory of configurator scripts
    Check {
        /// Registry directory (default: the configured registry, else the current directory)
        path: Option<String>,
    },
}
