use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "gmxport - Export engine-neutral force-field models to GROMACS .gro and .top files.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a coordinate file and a topology file for a parameterized model.
    Export(ExportArgs),
    /// Read a .gro file back and summarize its contents.
    InspectGro(InspectGroArgs),
}

/// Arguments for the `export` subcommand.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Path to the parameterized model in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the output coordinate file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub gro: PathBuf,

    /// Path for the output topology file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub top: PathBuf,

    /// Path to an export configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Coordinate Overrides ---
    /// Number of decimals for coordinates (1-16).
    #[arg(short, long, value_name = "INT")]
    pub precision: Option<usize>,

    /// Title line of the coordinate file.
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    // --- Topology Overrides ---
    /// Number given to the first particle.
    #[arg(long, value_name = "INT")]
    pub index_origin: Option<usize>,

    /// Name of the molecule type.
    #[arg(short, long, value_name = "NAME")]
    pub molecule_name: Option<String>,

    /// Number of bonds over which nonbonded interactions are excluded.
    #[arg(long, value_name = "INT")]
    pub nrexcl: Option<u32>,

    /// Name written to the [ system ] directive.
    #[arg(long, value_name = "TEXT")]
    pub system_name: Option<String>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S coordinates.precision=5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `inspect-gro` subcommand.
#[derive(Args, Debug)]
pub struct InspectGroArgs {
    /// Path to the coordinate file to read.
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,
}
