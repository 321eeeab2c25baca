//! Observation input files.
//!
//! Observations are read from JSON. Each entry names its configuration as
//! `arch/branding/platform` and lists either the source files it compiled or
//! the object files it linked; objects are mapped back to sources through the
//! top-level `sources` list.
//!
//! ```json
//! {
//!   "sources": ["libavutil/cpu.c", "libavutil/x86/cpu.c"],
//!   "observations": [
//!     { "condition": "x64/Chrome/linux", "objects": ["libavutil/cpu.o"] },
//!     { "condition": "ia32/Chrome/win", "files": ["libavutil/x86/cpu.c"],
//!       "flags": ["-msse2"] }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use gnatoms_core::objects::object_to_source_mapping;
use gnatoms_core::{Condition, Observation, SourceSet};
use serde::{Deserialize, Deserializer};

/// Top-level observation file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservationFile {
    /// Every known source file; required to resolve `objects`.
    #[serde(default)]
    pub sources: Vec<PathBuf>,

    pub observations: Vec<ObservationEntry>,
}

/// One observed configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservationEntry {
    #[serde(deserialize_with = "condition_from_str")]
    pub condition: Condition,

    #[serde(default)]
    pub flags: Vec<String>,

    #[serde(default)]
    pub files: Option<Vec<PathBuf>>,

    #[serde(default)]
    pub objects: Option<Vec<PathBuf>>,
}

fn condition_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Condition, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

impl ObservationFile {
    /// Parse an observation file from JSON text.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or does not match the schema.
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid observation file")
    }

    /// Read and parse `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Convert entries into engine observations, resolving objects.
    ///
    /// # Errors
    /// Returns an error if an entry lists both or neither of `files` and
    /// `objects`, or if an object has no matching source.
    pub fn into_observations(self) -> Result<Vec<Observation>> {
        let mapping = object_to_source_mapping(self.sources.as_slice());
        self.observations
            .into_iter()
            .map(|entry| -> Result<Observation> {
                let observation = match (entry.files, entry.objects) {
                    (Some(files), None) => Observation::new(entry.condition, files),
                    (None, Some(objects)) => {
                        Observation::from_objects(entry.condition.clone(), &mapping, objects.as_slice())
                            .with_context(|| format!("observation {}", entry.condition))?
                    }
                    _ => bail!(
                        "observation {} must list exactly one of `files` or `objects`",
                        entry.condition
                    ),
                };
                Ok(observation.with_flags(entry.flags))
            })
            .collect()
    }
}

/// Read exempt files: a JSON array of paths that keep their names.
///
/// # Errors
/// Returns an error if the file cannot be read or is not an array of paths.
pub fn load_exempt(path: &Path) -> Result<SourceSet> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    let files: Vec<PathBuf> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array of paths", path.display()))?;
    Ok(SourceSet::new(files, [Condition::universal()]))
}
