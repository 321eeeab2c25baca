//! Source sets and the algebra the partition engine is built on.
//!
//! A [`SourceSet`] pairs a set of files with the set of conditions under which
//! those files are compiled. The operations here are pure: they never mutate
//! their operands and always return a fresh value.
//!
//! Note the asymmetry between the two binary operations:
//!
//! - [`SourceSet::intersect`] unions the conditions of both operands, even
//!   when the file intersection is empty.
//! - [`SourceSet::difference`] keeps only the left operand's conditions.
//!
//! Emptiness is decided by files alone.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::lattice::Configuration;

/// A set of source files and the conditions under which they are built.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceSet {
    pub files: BTreeSet<PathBuf>,
    pub conditions: BTreeSet<Condition>,
}

impl SourceSet {
    pub fn new<F, C>(files: F, conditions: C) -> Self
    where
        F: IntoIterator,
        F::Item: Into<PathBuf>,
        C: IntoIterator<Item = Condition>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            conditions: conditions.into_iter().collect(),
        }
    }

    /// Files in both sets, guarded by the conditions of either.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            files: self.files.intersection(&other.files).cloned().collect(),
            conditions: self.conditions.union(&other.conditions).cloned().collect(),
        }
    }

    /// Files in `self` but not in `other`, keeping `self`'s conditions.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        Self {
            files: self.files.difference(&other.files).cloned().collect(),
            conditions: self.conditions.clone(),
        }
    }

    /// Files in `self` not contained in any of `others`.
    #[must_use]
    pub fn difference_all<'a>(&self, others: impl IntoIterator<Item = &'a Self>) -> Self {
        let mut files = self.files.clone();
        for other in others {
            files.retain(|f| !other.files.contains(f));
        }
        Self {
            files,
            conditions: self.conditions.clone(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Returns `true` if any condition of this set matches `configuration`.
    #[must_use]
    pub fn matches(&self, configuration: &Configuration) -> bool {
        self.conditions.iter().any(|c| c.matches(configuration))
    }

    /// Returns a copy with the files replaced.
    #[must_use]
    pub fn with_files(&self, files: BTreeSet<PathBuf>) -> Self {
        Self {
            files,
            conditions: self.conditions.clone(),
        }
    }

    /// Returns a copy with the conditions replaced.
    #[must_use]
    pub fn with_conditions(&self, conditions: BTreeSet<Condition>) -> Self {
        Self {
            files: self.files.clone(),
            conditions,
        }
    }
}

impl fmt::Display for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let files: Vec<_> = self.files.iter().map(|p| p.display().to_string()).collect();
        let conditions: Vec<_> = self.conditions.iter().map(ToString::to_string).collect();
        write!(f, "{{{}}} if {}", files.join(", "), conditions.join(" | "))
    }
}
