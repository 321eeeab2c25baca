//! REDUCE step: shrink an atom's guard using wildcards.
//!
//! Partitioning leaves each atom guarded by the exact list of configurations
//! it was observed under. Most of those lists have structure: a file built for
//! every Linux architecture does not need five architecture comparisons. This
//! module collapses such spans into wildcarded conditions.
//!
//! # Algorithm
//!
//! Greedy axis collapsing, repeated until a fixed point:
//!
//! 1. Compute the set of supported configurations the input matches.
//! 2. For each attribute axis, try to widen every condition on that axis to
//!    `*`. A widening is accepted only if every supported configuration the
//!    widened condition matches is already matched by the input.
//! 3. Drop conditions structurally subsumed by another condition.
//! 4. Repeat full passes over all axes until no widening is accepted.
//!
//! Widenings may overlap: one input condition can contribute to two different
//! wildcarded conditions. This is what keeps the result exact in cases like
//!
//! ```text
//! (arm64, Chromium, win) (x64, Chromium, win) (ia32, Chromium, win) (ia32, Chrome, win)
//!   => (*, Chromium, win) (ia32, *, win)
//! ```
//!
//! where a naive "collapse the whole group" approach would produce
//! `(*, *, win)` and wrongly match `(x64, Chrome, win)`.
//!
//! The result is sound (it matches exactly the same supported configurations
//! as the input) but not guaranteed to be a minimum cover.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::condition::Condition;
use crate::error::EngineError;
use crate::lattice::{Attribute, Configuration, SupportMatrix};
use crate::source_set::SourceSet;

/// Reduce `conditions` to an equivalent, typically smaller, set.
///
/// Equivalence is judged against `matrix`: for every supported configuration
/// `c`, `c` matches some input condition if and only if it matches some
/// output condition. An empty input reduces to an empty output.
///
/// # Errors
///
/// * [`EngineError::UnknownAttributeValue`] if any condition references a
///   value outside the matrix's domains. No reduction is attempted.
pub fn reduce_conditional_logic(
    conditions: &BTreeSet<Condition>,
    matrix: &SupportMatrix,
) -> Result<BTreeSet<Condition>, EngineError> {
    for condition in conditions {
        matrix.validate(condition)?;
    }

    let covered: BTreeSet<&Configuration> = matrix
        .configurations()
        .iter()
        .filter(|config| conditions.iter().any(|c| c.matches(config)))
        .collect();

    let mut current = prune_subsumed(conditions.clone());
    let mut passes = 0_usize;
    loop {
        passes += 1;
        let mut changed = false;

        for attribute in Attribute::ALL {
            let mut next = BTreeSet::new();
            for condition in &current {
                if condition.get(attribute).is_any() {
                    next.insert(condition.clone());
                    continue;
                }

                let widened = condition.widen(attribute);
                let spans = matrix
                    .configurations_matching(&widened)
                    .all(|config| covered.contains(config));
                if spans {
                    trace!(%condition, %widened, "collapsed {attribute} axis");
                    changed = true;
                    next.insert(widened);
                } else {
                    next.insert(condition.clone());
                }
            }
            current = prune_subsumed(next);
        }

        if !changed {
            break;
        }
    }

    debug!(
        before = conditions.len(),
        after = current.len(),
        passes,
        "reduced conditional logic"
    );
    Ok(current)
}

/// Reduce the conditions of `source_set`, returning a new set with the same
/// files.
///
/// # Errors
///
/// * [`EngineError::UnknownAttributeValue`] as for [`reduce_conditional_logic`].
pub fn reduce_source_set(
    source_set: &SourceSet,
    matrix: &SupportMatrix,
) -> Result<SourceSet, EngineError> {
    let conditions = reduce_conditional_logic(&source_set.conditions, matrix)?;
    Ok(source_set.with_conditions(conditions))
}

/// Remove every condition that another condition in the set structurally
/// covers.
fn prune_subsumed(conditions: BTreeSet<Condition>) -> BTreeSet<Condition> {
    let kept: BTreeSet<Condition> = conditions
        .iter()
        .filter(|c| !conditions.iter().any(|other| other != *c && other.subsumes(c)))
        .cloned()
        .collect();
    kept
}
