//! Object basename collision fixing.
//!
//! Static-library archivers (notably macOS `libtool`) complain, or silently
//! drop members, when two object files in the same library share a basename.
//! `libavcodec/x86/foo.c` and `libavcodec/arm/foo.c` both compile to `foo.o`,
//! and so do `foo.c` and `foo.asm`. Sibling targets built into one library
//! must therefore have unique object basenames.
//!
//! This module computes a rename plan: colliding files get a forwarding copy
//! under a unique name, and the atoms are rewritten to list the copy instead.
//!
//! # Rules
//!
//! Files collide when their stems (file name without extension) match.
//! Exempt atoms keep their names and claim their stems first. Every
//! colliding non-exempt file, visited in order, takes the first of its
//! candidate names whose stem is still unclaimed:
//!
//! - at top level: its own name, then `autorename_<name>`;
//! - in a subdirectory `d` whose stem also occurs in another directory:
//!   `d/autorename_<d with / replaced by _>_<name>`, then
//!   `d/autorename_<name>`;
//! - in a subdirectory `d` holding every file with that stem: its own name,
//!   then `d/autorename_<d with / replaced by _>_<name>`.
//!
//! A file with no free candidate keeps the last one, and the collision is
//! reported as ambiguous.
//!
//! # Determinism
//!
//! Atoms are visited in the order given and files in sorted order; the plan
//! is returned sorted by source path.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::EngineError;
use crate::source_set::SourceSet;

/// Prefix given to every renamed file.
pub const AUTORENAME_PREFIX: &str = "autorename_";

// ---------------------------------------------------------------------------
// Rename
// ---------------------------------------------------------------------------

/// One entry of a rename plan.
///
/// The original file is left in place; a new file is created at `to` whose
/// content includes the original.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rename {
    /// Original path, relative to the source root.
    pub from: PathBuf,
    /// Path of the forwarding copy, relative to the source root.
    pub to: PathBuf,
    /// Content to write at `to`.
    pub content: String,
}

impl Rename {
    fn new(from: &Path, to: PathBuf) -> Self {
        Self {
            content: forwarding_content(from),
            from: from.to_owned(),
            to,
        }
    }
}

/// Atoms after collision fixing, plus the renames that produced them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollisionFix {
    /// The input atoms, in input order, with renamed files relocated.
    pub atoms: Vec<SourceSet>,
    /// Renames, sorted by source path.
    pub renames: Vec<Rename>,
}

impl CollisionFix {
    /// Returns `true` if nothing had to be renamed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.renames.is_empty()
    }
}

// ---------------------------------------------------------------------------
// fix_object_basename_collisions
// ---------------------------------------------------------------------------

/// Rename files so no two files across `atoms` and `exempt` share an object
/// basename.
///
/// Files in `exempt` are never renamed but still take part in collision
/// detection.
///
/// # Errors
///
/// * [`EngineError::NonRelativePath`] if a path is absolute or contains `..`
///   or `.` components.
/// * [`EngineError::DuplicatePath`] if a path appears in two distinct atoms
///   (or in an atom and an exempt atom).
/// * [`EngineError::AmbiguousCollision`] if the renamed names still collide,
///   e.g. three top-level files `foo.c`, `foo.S` and `foo.asm`.
pub fn fix_object_basename_collisions(
    atoms: &[SourceSet],
    exempt: &[SourceSet],
) -> Result<CollisionFix, EngineError> {
    let exempt_files: BTreeSet<&PathBuf> = exempt.iter().flat_map(|s| &s.files).collect();
    for &file in &exempt_files {
        check_relative(file)?;
    }

    // Every distinct path, keyed by stem.
    let mut by_stem: BTreeMap<String, BTreeSet<&PathBuf>> = BTreeMap::new();
    let mut seen: BTreeSet<&PathBuf> = BTreeSet::new();
    for atom in atoms {
        for file in &atom.files {
            check_relative(file)?;
            if exempt_files.contains(file) || !seen.insert(file) {
                return Err(EngineError::DuplicatePath { path: file.clone() });
            }
            by_stem.entry(object_stem(file)).or_default().insert(file);
        }
    }
    for &file in &exempt_files {
        by_stem.entry(object_stem(file)).or_default().insert(file);
    }

    let colliding: BTreeMap<&str, BTreeSet<Option<&Path>>> = by_stem
        .iter()
        .filter(|(_, paths)| paths.len() > 1)
        .map(|(stem, paths)| {
            let dirs = paths.iter().map(|p| directory_of(p)).collect();
            (stem.as_str(), dirs)
        })
        .collect();

    let mut claimed: BTreeSet<String> = exempt_files.iter().map(|f| object_stem(f)).collect();
    let mut renames = Vec::new();
    let mut fixed = Vec::with_capacity(atoms.len());

    for atom in atoms {
        let mut files = BTreeSet::new();
        for file in &atom.files {
            let stem = object_stem(file);
            let Some(dirs) = colliding.get(stem.as_str()) else {
                files.insert(file.clone());
                continue;
            };

            let candidates = candidate_names(file, dirs.len() > 1);
            let chosen = candidates
                .iter()
                .find(|c| !claimed.contains(&object_stem(c)))
                .or_else(|| candidates.last())
                .cloned()
                .unwrap_or_else(|| file.clone());
            claimed.insert(object_stem(&chosen));

            if chosen != *file {
                debug!(from = %file.display(), to = %chosen.display(), "renaming colliding file");
                renames.push(Rename::new(file, chosen.clone()));
            }
            files.insert(chosen);
        }
        fixed.push(atom.with_files(files));
    }

    check_unique_stems(&fixed, &exempt_files)?;

    renames.sort();
    if !renames.is_empty() {
        info!(renames = renames.len(), "fixed object basename collisions");
    }
    Ok(CollisionFix {
        atoms: fixed,
        renames,
    })
}

/// Names a colliding file may take, in order of preference.
fn candidate_names(file: &Path, across_directories: bool) -> [PathBuf; 2] {
    let short = PathBuf::from(format!("{AUTORENAME_PREFIX}{}", file_name(file)));
    match directory_of(file) {
        None => [file.to_owned(), short],
        Some(dir) if across_directories => [qualified_name(file, dir), dir.join(short)],
        Some(dir) => [file.to_owned(), qualified_name(file, dir)],
    }
}

/// Only plain components, so renamed names stay next to the original.
fn check_relative(path: &Path) -> Result<(), EngineError> {
    let plain = path.components().all(|c| matches!(c, Component::Normal(_)));
    if plain && path.file_name().is_some() {
        Ok(())
    } else {
        Err(EngineError::NonRelativePath {
            path: path.to_owned(),
        })
    }
}

/// Verify that the final file lists have no colliding stems left.
fn check_unique_stems(
    atoms: &[SourceSet],
    exempt_files: &BTreeSet<&PathBuf>,
) -> Result<(), EngineError> {
    let mut by_stem: BTreeMap<String, BTreeSet<PathBuf>> = BTreeMap::new();
    let all = atoms
        .iter()
        .flat_map(|a| &a.files)
        .chain(exempt_files.iter().copied());
    for file in all {
        by_stem.entry(object_stem(file)).or_default().insert(file.clone());
    }

    match by_stem.into_iter().find(|(_, paths)| paths.len() > 1) {
        Some((basename, paths)) => Err(EngineError::AmbiguousCollision {
            basename,
            paths: paths.into_iter().collect(),
        }),
        None => Ok(()),
    }
}

/// The object basename a source file compiles to: its file stem.
fn object_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Parent directory of `path`, or `None` for top-level files.
fn directory_of(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

/// `dir/autorename_<dir_with_underscores>_<name>`.
fn qualified_name(path: &Path, dir: &Path) -> PathBuf {
    let prefix: Vec<String> = dir
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    dir.join(format!(
        "{AUTORENAME_PREFIX}{}_{}",
        prefix.join("_"),
        file_name(path)
    ))
}

/// Content of the forwarding file that replaces `original`.
///
/// The copy lives next to the original, so it includes it by file name.
fn forwarding_content(original: &Path) -> String {
    let name = file_name(original);
    match original.extension().and_then(|e| e.to_str()) {
        Some("asm") => format!("%include \"{name}\"\n"),
        _ => format!("#include \"{name}\"\n"),
    }
}
