use thiserror::Error;

use crate::core::io::gro::GroError;
use crate::core::io::top::TopError;
use crate::core::models::keys::Category;
use crate::core::models::units::UnitError;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unsupported export: {0}")]
    UnsupportedExport(String),

    #[error(
        "Mixing rule '{0}' is not compatible with GROMACS; supported values are 'lorentz-berthelot' and 'geometric'"
    )]
    UnsupportedMixingRule(String),

    #[error("Unsupported geometry for {site}: {reason}")]
    UnsupportedGeometry { site: String, reason: String },

    #[error("No {category} parameters found for atoms {atoms:?}")]
    UnresolvedInteraction {
        category: Category,
        atoms: Vec<usize>,
    },

    #[error("Atoms {atoms:?} match different {category} parameters in forward and reverse order")]
    AmbiguousResolution {
        category: Category,
        atoms: Vec<usize>,
    },

    #[error("{category} table references missing parameter set '{id}'")]
    DanglingPotential { category: Category, id: String },

    #[error("Unit conversion failed: {0}")]
    Unit(#[from] UnitError),

    #[error("Coordinate file error: {0}")]
    Gro(#[from] GroError),

    #[error("Topology file error: {0}")]
    Top(#[from] TopError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
