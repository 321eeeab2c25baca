//! Property tests for the partition, reduce and collision steps.
//!
//! Inputs are drawn from the default Chromium support matrix and a small pool
//! of file paths, so overlaps and basename collisions are common.
//!
//! # Coverage
//!
//! - **Partition**: atoms are disjoint, cover every input file, never
//!   straddle an input, and carry exactly the conditions of the inputs that
//!   contain them.
//! - **Reduce**: the reduced guard matches exactly the same supported
//!   configurations, is never larger, and is a fixed point.
//! - **Collisions**: success means unique stems with every file accounted
//!   for and exempt files untouched; failure is always an ambiguous
//!   collision among three or more files sharing a stem.
//! - **Pipeline**: output is identical for any permutation of observations.

#![allow(clippy::all, clippy::pedantic, clippy::nursery, clippy::unwrap_used)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use proptest::prelude::*;

use crate::collision::fix_object_basename_collisions;
use crate::condition::Condition;
use crate::error::EngineError;
use crate::lattice::{Configuration, SupportMatrix};
use crate::partition::create_pairwise_disjoint_sets;
use crate::pipeline::{Observation, generate};
use crate::reduce::reduce_conditional_logic;
use crate::source_set::SourceSet;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn exact(config: &Configuration) -> Condition {
    Condition::new(
        config.architecture.as_str(),
        config.branding.as_str(),
        config.platform.as_str(),
    )
}

fn matched<'a>(
    matrix: &'a SupportMatrix,
    conditions: &'a BTreeSet<Condition>,
) -> BTreeSet<&'a Configuration> {
    matrix
        .configurations()
        .iter()
        .filter(|config| conditions.iter().any(|c| c.matches(config)))
        .collect()
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Proptest strategies
// ---------------------------------------------------------------------------

fn arb_configuration() -> impl Strategy<Value = Configuration> {
    prop::sample::select(SupportMatrix::chromium().configurations().to_vec())
}

/// A path from a small pool: up to two directories, few stems, mixed
/// extensions.
fn arb_path() -> impl Strategy<Value = PathBuf> {
    (
        prop::sample::select(vec!["", "libavutil", "libavcodec", "libavcodec/x86"]),
        prop::sample::select(vec!["foo", "bar", "cpu", "fft"]),
        prop::sample::select(vec!["c", "S", "asm"]),
    )
        .prop_map(|(dir, stem, ext)| {
            let name = format!("{stem}.{ext}");
            if dir.is_empty() {
                PathBuf::from(name)
            } else {
                Path::new(dir).join(name)
            }
        })
}

fn arb_files() -> impl Strategy<Value = BTreeSet<PathBuf>> {
    prop::collection::btree_set(arb_path(), 0..8)
}

/// One singleton-condition source set per observed configuration.
fn arb_observed_sets() -> impl Strategy<Value = Vec<SourceSet>> {
    prop::collection::btree_map(arb_configuration(), arb_files(), 0..8).prop_map(|observed| {
        observed
            .into_iter()
            .map(|(config, files)| SourceSet::new(files, [exact(&config)]))
            .collect()
    })
}

fn arb_exact_conditions() -> impl Strategy<Value = BTreeSet<Condition>> {
    prop::collection::btree_set(arb_configuration(), 0..24)
        .prop_map(|configs| configs.iter().map(exact).collect())
}

/// Deal `paths` into up to three atoms and one exempt atom.
fn arb_dealt(paths: BTreeSet<PathBuf>) -> impl Strategy<Value = (Vec<SourceSet>, Vec<SourceSet>)> {
    let paths: Vec<PathBuf> = paths.into_iter().collect();
    let n = paths.len();
    prop::collection::vec(0..4_usize, n).prop_map(move |buckets| {
        let mut dealt = vec![BTreeSet::new(); 4];
        for (path, &bucket) in paths.iter().zip(&buckets) {
            dealt[bucket].insert(path.clone());
        }
        let exempt_files = dealt.pop().unwrap_or_default();
        let atoms = dealt
            .into_iter()
            .filter(|files| !files.is_empty())
            .map(|files| SourceSet::new(files, [Condition::universal()]))
            .collect();
        let exempt = if exempt_files.is_empty() {
            Vec::new()
        } else {
            vec![SourceSet::new(exempt_files, [Condition::universal()])]
        };
        (atoms, exempt)
    })
}

/// Atoms and exempt atoms with pairwise-distinct paths.
fn arb_collision_input() -> impl Strategy<Value = (Vec<SourceSet>, Vec<SourceSet>)> {
    prop::collection::btree_set(arb_path(), 0..12).prop_flat_map(arb_dealt)
}

/// As [`arb_collision_input`], with at most two files per stem.
fn arb_pairwise_collision_input() -> impl Strategy<Value = (Vec<SourceSet>, Vec<SourceSet>)> {
    prop::collection::vec(prop::collection::btree_set(arb_path(), 0..=2), 4)
        .prop_map(|groups| {
            let mut by_stem: BTreeMap<String, BTreeSet<PathBuf>> = BTreeMap::new();
            for path in groups.into_iter().flatten() {
                let entry = by_stem.entry(stem(&path)).or_default();
                if entry.len() < 2 {
                    entry.insert(path);
                }
            }
            by_stem.into_values().flatten().collect::<BTreeSet<_>>()
        })
        .prop_flat_map(arb_dealt)
}

/// Largest number of input files sharing one stem.
fn max_files_per_stem(atoms: &[SourceSet], exempt: &[SourceSet]) -> usize {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for file in atoms.iter().chain(exempt).flat_map(|a| &a.files) {
        *counts.entry(stem(file)).or_default() += 1;
    }
    counts.into_values().max().unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn partition_atoms_are_disjoint_and_complete(inputs in arb_observed_sets()) {
        let atoms = create_pairwise_disjoint_sets(&inputs);

        let mut seen = BTreeSet::new();
        for atom in &atoms {
            prop_assert!(!atom.is_empty());
            for file in &atom.files {
                prop_assert!(seen.insert(file.clone()), "{} in two atoms", file.display());
            }
        }
        let expected: BTreeSet<PathBuf> =
            inputs.iter().flat_map(|s| s.files.iter().cloned()).collect();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn partition_atoms_carry_exact_conditions(inputs in arb_observed_sets()) {
        let atoms = create_pairwise_disjoint_sets(&inputs);

        for atom in &atoms {
            let mut expected = BTreeSet::new();
            for input in &inputs {
                let inside = atom.files.is_subset(&input.files);
                let outside = atom.files.is_disjoint(&input.files);
                prop_assert!(inside || outside, "atom {} straddles input {}", atom, input);
                if inside {
                    expected.extend(input.conditions.iter().cloned());
                }
            }
            prop_assert_eq!(&atom.conditions, &expected);
        }
    }

    #[test]
    fn partition_is_order_independent(
        inputs in arb_observed_sets().prop_shuffle(),
    ) {
        let mut sorted = inputs.clone();
        sorted.sort();
        prop_assert_eq!(
            create_pairwise_disjoint_sets(&inputs),
            create_pairwise_disjoint_sets(&sorted)
        );
    }
}

// ---------------------------------------------------------------------------
// Reduce
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn reduction_is_sound(conditions in arb_exact_conditions()) {
        let matrix = SupportMatrix::chromium();

        let reduced = reduce_conditional_logic(&conditions, &matrix).unwrap();

        prop_assert_eq!(matched(&matrix, &reduced), matched(&matrix, &conditions));
        prop_assert!(reduced.len() <= conditions.len());
    }

    #[test]
    fn reduction_is_a_fixed_point(conditions in arb_exact_conditions()) {
        let matrix = SupportMatrix::chromium();

        let once = reduce_conditional_logic(&conditions, &matrix).unwrap();
        let twice = reduce_conditional_logic(&once, &matrix).unwrap();

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn reduced_conditions_do_not_subsume_each_other(conditions in arb_exact_conditions()) {
        let matrix = SupportMatrix::chromium();

        let reduced = reduce_conditional_logic(&conditions, &matrix).unwrap();

        for a in &reduced {
            for b in &reduced {
                prop_assert!(a == b || !a.subsumes(b), "{} subsumes {}", a, b);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Collisions
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn collision_fix_leaves_unique_stems((atoms, exempt) in arb_collision_input()) {
        let exempt_files: BTreeSet<&PathBuf> = exempt.iter().flat_map(|s| &s.files).collect();

        match fix_object_basename_collisions(&atoms, &exempt) {
            Ok(fix) => {
                let mut stems: BTreeSet<String> = exempt_files.iter().map(|f| stem(f)).collect();
                prop_assert_eq!(stems.len(), exempt_files.len());
                for atom in &fix.atoms {
                    for file in &atom.files {
                        prop_assert!(!exempt_files.contains(file), "{} listed twice", file.display());
                        prop_assert!(stems.insert(stem(file)), "stem of {} repeated", file.display());
                    }
                }

                let before: usize = atoms.iter().map(|a| a.files.len()).sum();
                prop_assert_eq!(stems.len(), before + exempt_files.len());

                for rename in &fix.renames {
                    prop_assert!(!exempt_files.contains(&rename.from), "exempt {} renamed", rename.from.display());
                    prop_assert_eq!(rename.from.parent(), rename.to.parent());
                }
            }
            Err(err) => {
                prop_assert!(matches!(err, EngineError::AmbiguousCollision { .. }), "{err}");
                prop_assert!(
                    max_files_per_stem(&atoms, &exempt) >= 3,
                    "{err} with at most two files per stem"
                );
            }
        }
    }

    #[test]
    fn collision_pairs_are_always_resolved((atoms, exempt) in arb_pairwise_collision_input()) {
        prop_assert!(max_files_per_stem(&atoms, &exempt) <= 2);
        prop_assert!(fix_object_basename_collisions(&atoms, &exempt).is_ok());
    }

    #[test]
    fn collision_fix_is_deterministic((atoms, exempt) in arb_collision_input()) {
        prop_assert_eq!(
            fix_object_basename_collisions(&atoms, &exempt),
            fix_object_basename_collisions(&atoms, &exempt)
        );
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn pipeline_is_order_independent(
        observed in prop::collection::btree_map(arb_configuration(), arb_files(), 0..6)
            .prop_map(|m| m.into_iter().collect::<Vec<_>>())
            .prop_shuffle(),
    ) {
        let matrix = SupportMatrix::chromium();
        let observations: Vec<Observation> = observed
            .iter()
            .map(|(config, files)| Observation::new(exact(config), files.iter().cloned()))
            .collect();
        let mut sorted = observations.clone();
        sorted.sort_by(|a, b| a.condition.cmp(&b.condition));

        prop_assert_eq!(
            generate(&observations, &[], &matrix),
            generate(&sorted, &[], &matrix)
        );
    }
}
