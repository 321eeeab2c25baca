//! gnatoms configuration (`gnatoms.toml`).
//!
//! Defines the typed configuration for the support matrix and for how
//! conditions are spelled in GN. Every field is optional: anything left out
//! falls back to the Chromium defaults.
//!
//! ```toml
//! [matrix]
//! architectures = ["ia32", "x64", "arm64"]
//! brandings = ["Chromium", "Chrome"]
//!
//! [matrix.platforms.win]
//! architectures = ["ia32", "x64", "arm64"]
//!
//! [matrix.platforms.mac]
//! architectures = ["x64", "arm64"]
//!
//! [stanza]
//! branding_variable = "ffmpeg_branding"
//!
//! [stanza.architectures.ia32]
//! cpus = ["x86"]
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use gnatoms_core::lattice::{Attribute, PlatformSupport, SupportMatrix};
use gnatoms_core::stanza::{ArchClause, StanzaTable};
use serde::Deserialize;
use thiserror::Error;

/// Conventional config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "gnatoms.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level gnatoms configuration.
///
/// Missing file → all defaults (no error).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GnatomsConfig {
    /// Which configurations exist.
    #[serde(default)]
    pub matrix: MatrixConfig,

    /// How conditions and source lists are rendered.
    #[serde(default)]
    pub stanza: StanzaConfig,
}

// ---------------------------------------------------------------------------
// MatrixConfig
// ---------------------------------------------------------------------------

/// Attribute domains and per-platform restrictions.
///
/// Each field left unset is taken from the Chromium matrix. Setting
/// `platforms` replaces the whole platform list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatrixConfig {
    #[serde(default)]
    pub architectures: Option<Vec<String>>,

    #[serde(default)]
    pub brandings: Option<Vec<String>>,

    #[serde(default)]
    pub platforms: Option<BTreeMap<String, PlatformConfig>>,
}

/// Restrictions for one platform; unset means the global domain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformConfig {
    #[serde(default)]
    pub architectures: Option<Vec<String>>,

    #[serde(default)]
    pub brandings: Option<Vec<String>>,
}

impl MatrixConfig {
    /// Build the support matrix this section describes.
    ///
    /// Without `platforms`, the Chromium platform restrictions are narrowed
    /// to the configured architecture and branding domains.
    ///
    /// # Errors
    /// Returns `ConfigError` if a platform names a value outside the global
    /// domains.
    pub fn to_support_matrix(&self) -> Result<SupportMatrix, ConfigError> {
        let chromium = SupportMatrix::chromium();
        if *self == Self::default() {
            return Ok(chromium);
        }

        let domain = |configured: &Option<Vec<String>>, attribute: Attribute| -> Vec<String> {
            configured.clone().unwrap_or_else(|| {
                chromium.domain(attribute).map(str::to_owned).collect()
            })
        };
        let architectures = domain(&self.architectures, Attribute::Architecture);
        let brandings = domain(&self.brandings, Attribute::Branding);

        let platforms: Vec<(String, PlatformSupport)> = match &self.platforms {
            Some(platforms) => platforms
                .iter()
                .map(|(name, p)| {
                    let support = PlatformSupport {
                        architectures: p.architectures.as_deref().map(to_set),
                        brandings: p.brandings.as_deref().map(to_set),
                    };
                    (name.clone(), support)
                })
                .collect(),
            None => {
                let keep = |restriction: &Option<BTreeSet<String>>, domain: &[String]| {
                    restriction.as_ref().map(|values| {
                        values
                            .iter()
                            .filter(|v| domain.contains(*v))
                            .cloned()
                            .collect::<BTreeSet<_>>()
                    })
                };
                chromium
                    .domain(Attribute::Platform)
                    .map(|name| {
                        let support = chromium.platform(name).cloned().unwrap_or_default();
                        let narrowed = PlatformSupport {
                            architectures: keep(&support.architectures, &architectures),
                            brandings: keep(&support.brandings, &brandings),
                        };
                        (name.to_owned(), narrowed)
                    })
                    .collect()
            }
        };

        SupportMatrix::new(architectures, brandings, platforms).map_err(|e| ConfigError {
            path: None,
            message: format!("[matrix]: {e}"),
        })
    }
}

fn to_set(values: &[String]) -> BTreeSet<String> {
    values.iter().cloned().collect()
}

// ---------------------------------------------------------------------------
// StanzaConfig
// ---------------------------------------------------------------------------

/// Overrides for the GN stanza table.
///
/// Scalar fields replace the default. Map fields are merged key by key over
/// the defaults. List fields replace the default list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StanzaConfig {
    /// GN variable holding the target CPU (default: `current_cpu`).
    #[serde(default)]
    pub cpu_variable: Option<String>,

    /// GN variable holding the branding (default: `ffmpeg_branding`).
    #[serde(default)]
    pub branding_variable: Option<String>,

    /// Architecture spellings, e.g. `ia32` → `current_cpu == "x86"`.
    #[serde(default)]
    pub architectures: BTreeMap<String, ArchClauseConfig>,

    /// Platform spellings, e.g. `mac` → `is_apple`.
    #[serde(default)]
    pub platforms: BTreeMap<String, String>,

    /// Source list variable per file extension.
    #[serde(default)]
    pub source_lists: BTreeMap<String, String>,

    /// Source list for any other extension (default: `ffmpeg_c_sources`).
    #[serde(default)]
    pub default_source_list: Option<String>,

    #[serde(default)]
    pub imports: Option<Vec<String>>,

    /// Lines emitted verbatim before the first stanza.
    #[serde(default)]
    pub prelude: Option<Vec<String>>,
}

/// GN spelling of one architecture value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchClauseConfig {
    /// Accepted CPU values.
    #[serde(default)]
    pub cpus: Vec<String>,

    /// Extra boolean clauses, e.g. `arm_use_neon`.
    #[serde(default)]
    pub flags: Vec<String>,
}

impl StanzaConfig {
    /// The default stanza table with this section's overrides applied.
    #[must_use]
    pub fn to_stanza_table(&self) -> StanzaTable {
        let mut table = StanzaTable::default();
        if let Some(cpu_variable) = &self.cpu_variable {
            table.cpu_variable.clone_from(cpu_variable);
        }
        if let Some(branding_variable) = &self.branding_variable {
            table.branding_variable.clone_from(branding_variable);
        }
        for (arch, clause) in &self.architectures {
            table.architectures.insert(
                arch.clone(),
                ArchClause {
                    cpus: clause.cpus.clone(),
                    flags: clause.flags.clone(),
                },
            );
        }
        table.platforms.extend(self.platforms.clone());
        table.source_lists.extend(self.source_lists.clone());
        if let Some(default_source_list) = &self.default_source_list {
            table.default_source_list.clone_from(default_source_list);
        }
        if let Some(imports) = &self.imports {
            table.imports.clone_from(imports);
        }
        if let Some(prelude) = &self.prelude {
            table.prelude.clone_from(prelude);
        }
        table
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Error loading a gnatoms configuration file.
#[derive(Debug, Error)]
#[error("{}: {message}", display_path(.path.as_deref()))]
pub struct ConfigError {
    /// The path that was being loaded (if available).
    pub path: Option<PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

fn display_path(path: Option<&Path>) -> String {
    path.map_or_else(|| "config error".to_owned(), |p| p.display().to_string())
}

impl GnatomsConfig {
    /// Load configuration from a TOML file.
    ///
    /// - If the file does not exist, returns all defaults (not an error).
    /// - If the file exists but contains invalid TOML or unknown fields,
    ///   returns a [`ConfigError`] with line-level detail.
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors (other than not-found) or parse errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML or unknown fields.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError {
                path: None,
                message,
            }
        })
    }

    /// Resolve into the engine's matrix and stanza table.
    ///
    /// # Errors
    /// Returns `ConfigError` if the matrix section is inconsistent.
    pub fn resolve(&self) -> Result<(SupportMatrix, StanzaTable), ConfigError> {
        Ok((self.matrix.to_support_matrix()?, self.stanza.to_stanza_table()))
    }
}
