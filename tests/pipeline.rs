//! End-to-end scenarios through the library API.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;
use std::path::PathBuf;

use gnatoms::config::GnatomsConfig;
use proptest::prelude::*;
use gnatoms::engine::{
    Condition, Configuration, Observation, SourceSet, SupportMatrix,
    create_pairwise_disjoint_sets, fix_object_basename_collisions, generate,
    reduce_conditional_logic, render_gn_file,
};

fn cond(a: &str, b: &str, c: &str) -> Condition {
    Condition::new(a, b, c)
}

fn paths(items: &[&str]) -> BTreeSet<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

#[test]
fn two_configurations_refine_into_two_atoms() {
    let chromium = SourceSet::new(["a", "b"], [cond("ia32", "Chromium", "win")]);
    let chrome = SourceSet::new(["a", "b", "c"], [cond("ia32", "Chrome", "win")]);

    let atoms = create_pairwise_disjoint_sets(&[chromium, chrome]);

    assert_eq!(
        atoms,
        vec![
            SourceSet::new(
                ["a", "b"],
                [cond("ia32", "Chromium", "win"), cond("ia32", "Chrome", "win")]
            ),
            SourceSet::new(["c"], [cond("ia32", "Chrome", "win")]),
        ]
    );
}

#[test]
fn all_linux_architectures_reduce_to_wildcard() {
    let matrix = SupportMatrix::chromium();
    let conditions: BTreeSet<_> = ["ia32", "x64", "arm", "arm-neon", "arm64"]
        .into_iter()
        .map(|arch| cond(arch, "Chromium", "linux"))
        .collect();

    let reduced = reduce_conditional_logic(&conditions, &matrix).unwrap();

    assert_eq!(reduced, BTreeSet::from([cond("*", "Chromium", "linux")]));
}

#[test]
fn partial_branding_span_does_not_collapse() {
    let matrix = SupportMatrix::chromium();
    let conditions = BTreeSet::from([
        cond("arm64", "Chromium", "win"),
        cond("x64", "Chromium", "win"),
        cond("ia32", "Chromium", "win"),
        cond("ia32", "Chrome", "win"),
    ]);

    let reduced = reduce_conditional_logic(&conditions, &matrix).unwrap();

    assert_eq!(
        reduced,
        BTreeSet::from([cond("*", "Chromium", "win"), cond("ia32", "*", "win")])
    );
    assert!(
        !reduced
            .iter()
            .any(|c| c.matches(&Configuration::new("x64", "Chrome", "win")))
    );
}

#[test]
fn same_named_files_in_two_directories_are_both_renamed() {
    let atoms = [
        SourceSet::new(["a/foo.c"], [cond("x64", "Chrome", "linux")]),
        SourceSet::new(["b/foo.c"], [cond("arm64", "Chrome", "linux")]),
    ];

    let fix = fix_object_basename_collisions(&atoms, &[]).unwrap();

    let renames: Vec<_> = fix
        .renames
        .iter()
        .map(|r| (r.from.clone(), r.to.clone()))
        .collect();
    assert_eq!(
        renames,
        [
            (PathBuf::from("a/foo.c"), PathBuf::from("a/autorename_a_foo.c")),
            (PathBuf::from("b/foo.c"), PathBuf::from("b/autorename_b_foo.c")),
        ]
    );
    assert_eq!(fix.atoms[0].files, paths(&["a/autorename_a_foo.c"]));
    assert_eq!(fix.atoms[1].files, paths(&["b/autorename_b_foo.c"]));
}

#[test]
fn configured_stanza_table_drives_rendering() {
    let config = GnatomsConfig::parse(
        r#"
[stanza]
branding_variable = "branding"
imports = []
prelude = []

[stanza.platforms]
win = "is_windows"
"#,
    )
    .unwrap();
    let (matrix, table) = config.resolve().unwrap();
    let observations = ["ia32", "x64", "arm64"]
        .map(|arch| Observation::new(cond(arch, "Chromium", "win"), ["libavutil/mem.c"]));

    let generated = generate(&observations, &[], &matrix).unwrap();
    let gn = render_gn_file(&generated.groups, &table);

    assert!(!gn.contains("import("), "{gn}");
    assert!(
        gn.contains("if (is_windows && branding == \"Chromium\") {"),
        "{gn}"
    );
}

#[test]
fn every_observed_configuration_is_reproduced() {
    let matrix = SupportMatrix::chromium();
    let observed = [
        (Configuration::new("ia32", "Chrome", "win"), vec!["a.c", "x86/b.asm", "c.c"]),
        (Configuration::new("x64", "Chrome", "win"), vec!["a.c", "x86/b.asm"]),
        (Configuration::new("arm64", "Chromium", "mac"), vec!["a.c", "aarch64/d.S"]),
        (Configuration::new("arm64", "Chrome", "mac"), vec!["a.c", "aarch64/d.S", "c.c"]),
    ];
    let observations: Vec<_> = observed
        .iter()
        .map(|(config, files)| {
            Observation::new(
                Condition::new(
                    config.architecture.as_str(),
                    config.branding.as_str(),
                    config.platform.as_str(),
                ),
                files.iter().copied(),
            )
        })
        .collect();

    let generated = generate(&observations, &[], &matrix).unwrap();
    assert!(generated.renames.is_empty());

    for (config, files) in &observed {
        let built: BTreeSet<PathBuf> = generated
            .groups
            .iter()
            .filter(|g| g.sources.matches(config))
            .flat_map(|g| g.sources.files.iter().cloned())
            .collect();
        assert_eq!(built, paths(files), "files built for {config}");
    }
}

// ---------------------------------------------------------------------------
// Fidelity over random observations
// ---------------------------------------------------------------------------

/// Paths with distinct stems, so no renames interfere with the comparison.
fn arb_files() -> impl Strategy<Value = BTreeSet<PathBuf>> {
    prop::collection::btree_set(0..24_usize, 0..10).prop_map(|ids| {
        ids.into_iter()
            .map(|i| PathBuf::from(format!("dir{}/file{i}.c", i % 3)))
            .collect()
    })
}

fn arb_observed() -> impl Strategy<Value = Vec<(Configuration, BTreeSet<PathBuf>)>> {
    let configs = SupportMatrix::chromium().configurations().to_vec();
    prop::collection::btree_map(prop::sample::select(configs), arb_files(), 1..10)
        .prop_map(|m| m.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn generated_groups_reproduce_observations(observed in arb_observed()) {
        let matrix = SupportMatrix::chromium();
        let observations: Vec<_> = observed
            .iter()
            .map(|(config, files)| {
                Observation::new(
                    Condition::new(
                        config.architecture.as_str(),
                        config.branding.as_str(),
                        config.platform.as_str(),
                    ),
                    files.iter().cloned(),
                )
            })
            .collect();

        let generated = generate(&observations, &[], &matrix).unwrap();
        prop_assert!(generated.renames.is_empty());

        for (config, files) in &observed {
            let built: BTreeSet<PathBuf> = generated
                .groups
                .iter()
                .filter(|g| g.sources.matches(config))
                .flat_map(|g| g.sources.files.iter().cloned())
                .collect();
            prop_assert_eq!(&built, files, "files built for {}", config);
        }
    }
}
