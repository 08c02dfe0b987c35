//! # Core Module
//!
//! The stateless foundation of the exporter: the molecular model, its force
//! field tables, and the GROMACS file formats.
//!
//! - **Molecular Representation** ([`models`]) - Atoms, residues, bonds, keys and units
//! - **Parameters** ([`forcefield`]) - Per-category tables and typed parameter sets
//! - **File I/O** ([`io`]) - `.gro` writer/reader and `.top` writer

pub mod forcefield;
pub mod io;
pub mod models;
