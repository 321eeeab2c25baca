//! Error types for the generation engine.
//!
//! [`EngineError`] is the single error type returned by every fallible engine
//! operation. All variants describe contract violations in the input: the
//! engine never recovers from them and never returns partial output.

use std::path::PathBuf;

use thiserror::Error;

use crate::lattice::Attribute;

/// Errors returned by the generation engine.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A condition (or a support-matrix restriction) references a value that
    /// is not part of the declared domain for its attribute.
    #[error("unknown {attribute} value `{value}` (expected one of: {expected})")]
    UnknownAttributeValue {
        /// The attribute whose domain was violated.
        attribute: Attribute,
        /// The offending value.
        value: String,
        /// Comma-separated list of the declared domain values.
        expected: String,
    },

    /// Renaming could not give every colliding file a unique object basename.
    #[error(
        "ambiguous basename collision on `{basename}`: {} cannot be disambiguated",
        display_paths(.paths)
    )]
    AmbiguousCollision {
        /// The object basename (file stem) shared by the files.
        basename: String,
        /// Every path that ends up with this object basename, sorted.
        paths: Vec<PathBuf>,
    },

    /// The same relative path was found in two distinct atoms.
    #[error("`{}` appears in more than one source set", .path.display())]
    DuplicatePath {
        /// The duplicated path.
        path: PathBuf,
    },

    /// A source path is absolute or climbs out of the source root.
    #[error("`{}` is not a relative path below the source root", .path.display())]
    NonRelativePath {
        /// The offending path.
        path: PathBuf,
    },

    /// An observed object file has no corresponding source file.
    #[error("no source file produces object `{}`", .object.display())]
    UnknownObject {
        /// The object file that could not be mapped.
        object: PathBuf,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("`{}`", p.display()))
        .collect::<Vec<_>>()
        .join(", ")
}
