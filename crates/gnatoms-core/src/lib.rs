//! Core engine for gnatoms.
//!
//! Given the source files each build configuration compiles, this crate
//! computes the smallest set of disjoint, conditionally-guarded file groups
//! that reproduces every configuration exactly, fixes object basename
//! collisions inside those groups, and renders them as GN stanzas.
//!
//! # Crate layout
//!
//! - [`lattice`] — attributes, configurations and the [`SupportMatrix`] of
//!   supported combinations.
//! - [`condition`] — [`Condition`] tuples with wildcard values.
//! - [`source_set`] — the [`SourceSet`] algebra (intersect, difference).
//! - [`partition`] — refinement of overlapping sets into disjoint atoms.
//! - [`reduce`] — minimisation of an atom's condition set.
//! - [`collision`] — basename collision detection and the rename plan.
//! - [`naming`] — stable group names.
//! - [`objects`] — object file to source file mapping.
//! - [`stanza`] — GN rendering.
//! - [`pipeline`] — all of the above, end to end ([`generate`]).
//! - [`error`] — the [`EngineError`] enum.
//!
//! Everything here is pure and deterministic: no I/O, no global state, and
//! all collections are ordered.

pub mod collision;
pub mod condition;
pub mod error;
pub mod lattice;
pub mod naming;
pub mod objects;
pub mod partition;
pub mod pipeline;
pub mod reduce;
pub mod source_set;
pub mod stanza;

#[cfg(test)]
mod property_tests;

pub use collision::{CollisionFix, Rename, fix_object_basename_collisions};
pub use condition::{AttrValue, Condition, ParseConditionError, WILDCARD};
pub use error::EngineError;
pub use lattice::{Attribute, Configuration, PlatformSupport, SupportMatrix};
pub use partition::create_pairwise_disjoint_sets;
pub use pipeline::{Generated, Group, Observation, generate};
pub use reduce::{reduce_conditional_logic, reduce_source_set};
pub use source_set::SourceSet;
pub use stanza::{StanzaTable, render_gn_file, render_stanza};
