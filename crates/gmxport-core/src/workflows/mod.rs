//! # Workflows Module
//!
//! High-level entry points that tie the [`crate::engine`] planner to the
//! [`crate::core::io`] writers.
//!
//! - **Export Workflow** ([`export`]) - Plans a model, renders the `.gro` and
//!   `.top` files in memory, and commits them to disk only once both rendered.

pub mod export;
