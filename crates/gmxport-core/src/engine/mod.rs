//! # Engine Module
//!
//! Turns a read-only [`Model`](crate::core::models::system::Model) into a fully
//! resolved [`TopologyPlan`](plan::TopologyPlan).
//!
//! ## Architecture
//!
//! - **Compatibility Gate** ([`compat`]) - Global nonbonded validation, run first
//! - **Index Assigner** ([`indexing`]) - Output numbering for atoms and virtual sites
//! - **Slot Resolver** ([`resolver`]) - Keyed parameter lookup per interaction category
//! - **Bonded Graph** ([`graph`]) - Angle, torsion and 1-4 enumeration from the bonds
//! - **Pair/Exclusion Deriver** ([`pairs`]) - `[ pairs ]` and `[ exclusions ]` rows
//! - **Virtual-Site Translator** ([`virtual_sites`]) - Construction coefficients per kind
//! - **Plan Builder** ([`plan`]) - Runs everything above and assembles both documents
//! - **Configuration** ([`config`]) and **Errors** ([`error`])

pub mod compat;
pub mod config;
pub mod error;
pub mod graph;
pub mod indexing;
pub mod pairs;
pub mod plan;
pub mod resolver;
pub mod virtual_sites;
