//! `stagehand-core` -- boot pipeline domain logic.
//!
//! Defines the step model ([`step`]) and subprocess execution
//! ([`process`]) for the container entrypoint. Everything here is pure
//! pipeline mechanics: no configuration, signal handling, or logging.
//! The `boot` crate owns the wiring.

pub mod error;
pub mod process;
pub mod step;
