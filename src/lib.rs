//! gnatoms library crate: configuration, input parsing and the commands
//! behind the `gnatoms` binary.
//!
//! The engine itself lives in `gnatoms-core` and is re-exported as
//! [`engine`] so integration tests can drive both layers from one crate.

pub mod commands;
pub mod config;
pub mod format;
pub mod input;
pub mod telemetry;

pub use gnatoms_core as engine;
