//! Command implementations.
//!
//! Each command returns the text destined for stdout; `main` only parses
//! arguments and prints. Side outputs (GN file, rename plan, forwarding
//! files) are written here.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use gnatoms_core::{Condition, Generated, generate, reduce_conditional_logic, render_gn_file};
use tracing::info;

use crate::config::{CONFIG_FILE, GnatomsConfig};
use crate::format::OutputFormat;
use crate::input::{ObservationFile, load_exempt};

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

/// Inputs and outputs of `gnatoms generate`.
#[derive(Clone, Debug, Default)]
pub struct GenerateOptions {
    pub observations: PathBuf,
    pub exempt: Option<PathBuf>,
    pub config: Option<PathBuf>,
    /// Write the result here instead of stdout.
    pub output: Option<PathBuf>,
    /// Write the rename plan here as JSON.
    pub renames: Option<PathBuf>,
    /// Create the forwarding files of the rename plan under this directory.
    pub source_root: Option<PathBuf>,
    pub format: OutputFormat,
}

/// Run the whole pipeline.
///
/// # Errors
/// Fails on unreadable or invalid input, on engine errors, and on write
/// failures.
pub fn generate_command(opts: &GenerateOptions) -> Result<String> {
    let config = load_config(opts.config.as_deref())?;
    let (matrix, table) = config.resolve()?;

    let observations = ObservationFile::load(&opts.observations)?.into_observations()?;
    let exempt = opts
        .exempt
        .as_deref()
        .map(load_exempt)
        .transpose()?
        .into_iter()
        .collect::<Vec<_>>();

    let generated: Generated =
        generate(&observations, &exempt, &matrix).context("generation failed")?;

    let rendered = match opts.format {
        OutputFormat::Text => render_gn_file(&generated.groups, &table),
        OutputFormat::Json => opts.format.serialize(&generated)?,
    };

    if let Some(path) = &opts.renames {
        let plan = OutputFormat::Json.serialize(&generated.renames)?;
        write_file(path, &plan)?;
    }
    if let Some(root) = &opts.source_root {
        for rename in &generated.renames {
            write_file(&root.join(&rename.to), &rename.content)?;
        }
        info!(count = generated.renames.len(), root = %root.display(), "wrote forwarding files");
    }

    match &opts.output {
        Some(path) => {
            write_file(path, &rendered)?;
            Ok(format!(
                "wrote {} groups to {} ({} renames)",
                generated.groups.len(),
                path.display(),
                generated.renames.len()
            ))
        }
        None => Ok(rendered),
    }
}

// ---------------------------------------------------------------------------
// reduce
// ---------------------------------------------------------------------------

/// Reduce conditions given as `arch/branding/platform` strings.
///
/// # Errors
/// Fails if a condition is malformed or names an unknown value.
pub fn reduce_command(
    conditions: &[String],
    config: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let (matrix, _) = load_config(config)?.resolve()?;
    let parsed: BTreeSet<Condition> = conditions
        .iter()
        .map(|raw| raw.parse::<Condition>())
        .collect::<Result<_, _>>()?;

    let reduced = reduce_conditional_logic(&parsed, &matrix)?;

    match format {
        OutputFormat::Text => Ok(reduced
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Json => format.serialize(&reduced),
    }
}

// ---------------------------------------------------------------------------
// matrix
// ---------------------------------------------------------------------------

/// Describe the effective support matrix.
///
/// # Errors
/// Fails if the configuration cannot be loaded.
pub fn matrix_command(config: Option<&Path>, format: OutputFormat) -> Result<String> {
    let (matrix, _) = load_config(config)?.resolve()?;
    match format {
        OutputFormat::Text => Ok(matrix.to_string()),
        OutputFormat::Json => format.serialize(&matrix.configurations()),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Result<GnatomsConfig> {
    let path = path.unwrap_or_else(|| Path::new(CONFIG_FILE));
    Ok(GnatomsConfig::load(path)?)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("could not create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("could not write {}", path.display()))
}
