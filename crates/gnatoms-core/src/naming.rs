//! Stable names for generated groups.
//!
//! A group is named after the directory most of its files live in, followed
//! by its distinguishing compiler flags: `libavcodec_x86_mavx2`. Names that
//! would repeat get a numeric suffix in the order groups are emitted, so the
//! same input always produces the same names.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Name used for files that sit at the top of the source tree.
pub const TOP_LEVEL: &str = "toplevel";

/// Base name for a group (before deduplication).
#[must_use]
pub fn base_name(files: &BTreeSet<PathBuf>, flags: &BTreeSet<String>) -> String {
    let mut name = dominant_directory(files)
        .map_or_else(|| TOP_LEVEL.to_owned(), |dir| sanitize(&dir.to_string_lossy()));
    for flag in flags {
        let flag = sanitize(flag.trim_start_matches('-'));
        if !flag.is_empty() {
            name.push('_');
            name.push_str(&flag);
        }
    }
    name
}

/// Assign unique names to groups, given in emission order.
#[must_use]
pub fn assign_names<'a, I>(groups: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a BTreeSet<PathBuf>, &'a BTreeSet<String>)>,
{
    let mut used: BTreeMap<String, usize> = BTreeMap::new();
    groups
        .into_iter()
        .map(|(files, flags)| {
            let base = base_name(files, flags);
            let count = used.entry(base.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                base
            } else {
                format!("{base}_{count}")
            }
        })
        .collect()
}

/// The parent directory shared by the most files; ties go to the
/// lexicographically smallest directory. `None` when most files are at the
/// top level.
fn dominant_directory(files: &BTreeSet<PathBuf>) -> Option<&Path> {
    let mut counts: BTreeMap<&Path, usize> = BTreeMap::new();
    for file in files {
        let dir = file.parent().unwrap_or_else(|| Path::new(""));
        *counts.entry(dir).or_insert(0) += 1;
    }

    // `max_by_key` keeps the last maximum; we want the first.
    let mut best: Option<(&Path, usize)> = None;
    for (dir, count) in counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((dir, count));
        }
    }
    best.map(|(dir, _)| dir).filter(|dir| !dir.as_os_str().is_empty())
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
