//! PARTITION step: refine observed source sets into disjoint atoms.
//!
//! Given one [`SourceSet`] per observed configuration, computes the Venn
//! diagram of their file sets. Every region of the diagram becomes an atom:
//! a group of files that is either fully inside or fully outside each input,
//! guarded by the union of the conditions of the inputs it lies inside.
//!
//! # Example
//!
//! ```text
//! S1 = {common, intel}          if (ia32, Chromium, win)
//! S2 = {common, intel, chrome}  if (ia32, Chrome, win)
//!
//! Atoms:
//!   {common, intel}  if (ia32, Chromium, win) | (ia32, Chrome, win)
//!   {chrome}         if (ia32, Chrome, win)
//! ```
//!
//! # Determinism
//!
//! The refinement itself depends on input order only in how intermediate
//! atoms are arranged; the returned atoms are sorted by file set, so the
//! output is identical for any permutation of the input.

use tracing::debug;

use crate::source_set::SourceSet;

/// Refine `source_sets` into pairwise-disjoint atoms.
///
/// Guarantees, for the returned atoms:
///
/// - every file of every input appears in exactly one atom;
/// - no atom straddles an input: its files are either a subset of the
///   input's files or disjoint from them;
/// - an atom's conditions are the union of the conditions of exactly the
///   inputs whose files contain it.
///
/// Inputs without files are ignored. Two inputs with identical files collapse
/// into one atom carrying both inputs' conditions.
#[must_use]
pub fn create_pairwise_disjoint_sets(source_sets: &[SourceSet]) -> Vec<SourceSet> {
    let mut inputs = source_sets.iter().filter(|s| !s.is_empty());
    let Some(first) = inputs.next() else {
        return Vec::new();
    };

    let mut atoms = vec![first.clone()];
    for next in inputs {
        // Portion of `next` that no existing atom covers yet.
        let uncovered = next.difference_all(&atoms);

        let mut refined = Vec::with_capacity(atoms.len() * 2 + 1);
        for atom in &atoms {
            let inside = atom.intersect(next);
            if !inside.is_empty() {
                refined.push(inside);
            }
            let outside = atom.difference(next);
            if !outside.is_empty() {
                refined.push(outside);
            }
        }
        if !uncovered.is_empty() {
            refined.push(uncovered);
        }

        atoms = refined;
    }

    atoms.sort();
    debug!(
        inputs = source_sets.len(),
        atoms = atoms.len(),
        "refined source sets into disjoint atoms"
    );
    atoms
}
