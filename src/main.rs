use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use gnatoms::commands::{GenerateOptions, generate_command, matrix_command, reduce_command};
use gnatoms::format::OutputFormat;
use gnatoms::telemetry;

/// Partition per-configuration source lists into guarded GN stanzas
///
/// gnatoms takes the files each build configuration compiles (architecture,
/// branding, platform) and computes the smallest set of disjoint file groups
/// that reproduces every configuration. Each group gets a minimal GN
/// condition using wildcards where a whole axis is covered.
///
/// QUICK START:
///
///   gnatoms generate --observations observed.json --output ffmpeg_generated.gni
///
///   # Try the condition reducer directly
///   gnatoms reduce ia32/Chromium/win x64/Chromium/win arm64/Chromium/win
///
///   # Show which configurations exist
///   gnatoms matrix
///
/// The support matrix and GN spellings are read from gnatoms.toml in the
/// current directory when present.
#[derive(Parser)]
#[command(name = "gnatoms")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'gnatoms <command> --help' for more information on a specific command.")]
struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (default: ./gnatoms.toml)
    #[arg(long, global = true, value_name = "TOML")]
    config: Option<PathBuf>,

    /// Output format: text or json
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate GN source groups from observed configurations
    ///
    /// Reads a JSON observation file, partitions the files into disjoint
    /// groups, reduces each group's condition, fixes object basename
    /// collisions and renders the result.
    Generate {
        /// JSON file of observed configurations
        #[arg(long, value_name = "JSON")]
        observations: PathBuf,

        /// JSON array of files that keep their names when renaming
        #[arg(long, value_name = "JSON")]
        exempt: Option<PathBuf>,

        /// Write the result here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Write the rename plan here as JSON
        #[arg(long, value_name = "JSON")]
        renames: Option<PathBuf>,

        /// Create the forwarding files for renamed sources under this directory
        #[arg(long, value_name = "DIR")]
        source_root: Option<PathBuf>,
    },

    /// Reduce a set of conditions
    ///
    /// Conditions are written arch/branding/platform; any part may be '*'.
    Reduce {
        #[arg(required = true, value_name = "CONDITION")]
        conditions: Vec<String>,
    },

    /// Print the effective support matrix
    Matrix,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    let output = match cli.command {
        Commands::Generate {
            observations,
            exempt,
            output,
            renames,
            source_root,
        } => generate_command(&GenerateOptions {
            observations,
            exempt,
            config: cli.config,
            output,
            renames,
            source_root,
            format: cli.format,
        })?,
        Commands::Reduce { conditions } => {
            reduce_command(&conditions, cli.config.as_deref(), cli.format)?
        }
        Commands::Matrix => matrix_command(cli.config.as_deref(), cli.format)?,
    };

    if output.ends_with('\n') || output.is_empty() {
        print!("{output}");
    } else {
        println!("{output}");
    }
    Ok(())
}
