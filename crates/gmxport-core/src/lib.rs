//! # gmxport
//!
//! Exports an abstract, force-field-parameterized molecular model to a GROMACS
//! coordinate file (`.gro`) and topology file (`.top`).
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** The read-only [`Model`](core::models::system::Model),
//!   its per-category force field tables, unit handling, and the file formats.
//!
//! - **[`engine`]: The Planner.** Validates the model, assigns output indices,
//!   resolves every interaction to its parameters, derives pairs, exclusions and
//!   virtual-site constructions, and assembles a fully resolved plan.
//!
//! - **[`workflows`]: The Public API.** Renders a plan into both files in memory
//!   and writes them only when both succeeded.

pub mod core;
pub mod engine;
pub mod workflows;
