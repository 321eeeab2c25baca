//! The full generation pipeline.
//!
//! observe → partition → reduce → fix collisions → name
//!
//! 1. Observations are grouped by their distinguishing compiler flags; files
//!    built with different flags can never share a target.
//! 2. Each flag group is refined into disjoint atoms
//!    ([`create_pairwise_disjoint_sets`]).
//! 3. Each atom's guard is minimised ([`reduce_source_set`]).
//! 4. Basename collisions across all atoms are fixed
//!    ([`fix_object_basename_collisions`]).
//! 5. Every atom is given a stable name ([`assign_names`]).
//!
//! # Determinism
//!
//! Flag groups are visited in sorted order and atoms come out of the
//! partition step sorted, so the same observations always produce the same
//! groups, names and rename plan, whatever order they were supplied in.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::collision::{Rename, fix_object_basename_collisions};
use crate::condition::Condition;
use crate::error::EngineError;
use crate::lattice::SupportMatrix;
use crate::naming::assign_names;
use crate::objects::source_file_set;
use crate::partition::create_pairwise_disjoint_sets;
use crate::reduce::reduce_source_set;
use crate::source_set::SourceSet;

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// The files compiled under one configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub condition: Condition,
    /// Compiler flags that distinguish these files from the default build.
    #[serde(default)]
    pub flags: BTreeSet<String>,
    pub files: BTreeSet<PathBuf>,
}

impl Observation {
    pub fn new<F>(condition: Condition, files: F) -> Self
    where
        F: IntoIterator,
        F::Item: Into<PathBuf>,
    {
        Self {
            condition,
            flags: BTreeSet::new(),
            files: files.into_iter().map(Into::into).collect(),
        }
    }

    /// Build an observation from the object files a configuration linked.
    ///
    /// # Errors
    ///
    /// * [`EngineError::UnknownObject`] if an object has no source in
    ///   `mapping`.
    pub fn from_objects<P: AsRef<std::path::Path>>(
        condition: Condition,
        mapping: &BTreeMap<PathBuf, PathBuf>,
        objects: &[P],
    ) -> Result<Self, EngineError> {
        Ok(Self {
            condition,
            flags: BTreeSet::new(),
            files: source_file_set(mapping, objects)?,
        })
    }

    #[must_use]
    pub fn with_flags<I>(mut self, flags: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// A named, guarded group of files: one future build stanza.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub flags: BTreeSet<String>,
    pub sources: SourceSet,
}

/// Everything the pipeline produces.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generated {
    pub groups: Vec<Group>,
    /// Renames the caller must apply for `groups` to be valid.
    pub renames: Vec<Rename>,
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

/// Run the whole pipeline over `observations`.
///
/// `exempt` atoms (e.g. the files of a primary aggregate target) keep their
/// names but still take part in collision detection; they are not part of
/// the returned groups.
///
/// # Errors
///
/// * [`EngineError::UnknownAttributeValue`] if an observation's condition
///   references a value outside `matrix`. Checked before any processing.
/// * [`EngineError::DuplicatePath`], [`EngineError::NonRelativePath`] or
///   [`EngineError::AmbiguousCollision`] from collision fixing.
#[instrument(skip_all, fields(observations = observations.len(), exempt = exempt.len()))]
pub fn generate(
    observations: &[Observation],
    exempt: &[SourceSet],
    matrix: &SupportMatrix,
) -> Result<Generated, EngineError> {
    for observation in observations {
        matrix.validate(&observation.condition)?;
    }

    let mut by_flags: BTreeMap<&BTreeSet<String>, Vec<SourceSet>> = BTreeMap::new();
    for observation in observations {
        if observation.files.is_empty() {
            debug!(condition = %observation.condition, "skipping observation without files");
            continue;
        }
        by_flags
            .entry(&observation.flags)
            .or_default()
            .push(SourceSet::new(
                observation.files.iter().cloned(),
                [observation.condition.clone()],
            ));
    }

    let mut flags_of = Vec::new();
    let mut atoms = Vec::new();
    for (flags, sets) in by_flags {
        for atom in create_pairwise_disjoint_sets(&sets) {
            atoms.push(reduce_source_set(&atom, matrix)?);
            flags_of.push(flags.clone());
        }
    }

    let fix = fix_object_basename_collisions(&atoms, exempt)?;
    let names = assign_names(fix.atoms.iter().map(|a| &a.files).zip(&flags_of));

    let groups: Vec<Group> = names
        .into_iter()
        .zip(flags_of)
        .zip(fix.atoms)
        .map(|((name, flags), sources)| Group {
            name,
            flags,
            sources,
        })
        .collect();

    info!(
        groups = groups.len(),
        renames = fix.renames.len(),
        "generated source groups"
    );
    Ok(Generated {
        groups,
        renames: fix.renames,
    })
}
