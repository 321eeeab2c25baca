//! Object file ↔ source file mapping.
//!
//! Build logs list the object files a configuration links, not the sources
//! that produced them. These helpers turn such listings back into source
//! paths so they can be fed to the partition step.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::error::EngineError;

/// Map each source to the object file it compiles to (`dir/a.c` → `dir/a.o`).
pub fn object_to_source_mapping<P: AsRef<Path>>(sources: &[P]) -> BTreeMap<PathBuf, PathBuf> {
    sources
        .iter()
        .map(|src| {
            let src = src.as_ref();
            (src.with_extension("o"), src.to_owned())
        })
        .collect()
}

/// Resolve `objects` to their source files.
///
/// # Errors
///
/// * [`EngineError::UnknownObject`] for the first object with no mapping.
pub fn source_file_set<P: AsRef<Path>>(
    mapping: &BTreeMap<PathBuf, PathBuf>,
    objects: &[P],
) -> Result<BTreeSet<PathBuf>, EngineError> {
    objects
        .iter()
        .map(|obj| {
            let obj = obj.as_ref();
            mapping
                .get(obj)
                .cloned()
                .ok_or_else(|| EngineError::UnknownObject {
                    object: obj.to_owned(),
                })
        })
        .collect()
}
