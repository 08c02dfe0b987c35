//! # Core Models Module
//!
//! Data structures describing the molecular model handed to the exporter.
//!
//! ## Key Components
//!
//! - [`system`] - The [`Model`](system::Model): atoms, residues, bonds, box and force field
//! - [`keys`] - Site, virtual-site, particle and parameter-set identities
//! - [`units`] - Unit-carrying quantities and conversion to GROMACS units
//! - [`element`] - Static element table (atomic numbers and masses)
//! - [`loader`] - TOML document loading
//!
//! ```ignore
//! use gmxport::core::models::system::Model;
//!
//! let model = Model::load(Path::new("water.toml"))?;
//! println!("{} atoms, {} bonds", model.n_atoms(), model.bonds().len());
//! ```

pub mod atom;
pub mod element;
pub mod keys;
pub mod loader;
pub mod residue;
pub mod system;
pub mod topology;
pub mod units;
