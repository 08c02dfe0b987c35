//! # Force Field Module
//!
//! Typed, unit-carrying parameter storage for every interaction category a
//! model can carry.
//!
//! ## Key Components
//!
//! - [`table`] - [`CategoryTable`](table::CategoryTable): ordered slot map plus
//!   parameter sets, and the [`ForceField`](table::ForceField) that groups them
//! - [`params`] - One closed parameter struct per category, with conversion to
//!   GROMACS units
//! - [`mixing`] - Combination rules and their `comb-rule` codes

pub mod mixing;
pub mod params;
pub mod table;
