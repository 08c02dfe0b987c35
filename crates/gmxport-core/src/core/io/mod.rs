//! Provides input/output functionality for GROMACS file formats.
//!
//! Writers render fully resolved in-memory documents; they perform no lookups
//! of their own. The coordinate format can also be read back.

pub mod gro;
pub mod top;
pub mod traits;
pub(crate) mod util;
