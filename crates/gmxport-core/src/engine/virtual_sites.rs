use super::error::ExportError;
use super::graph::BondGraph;
use super::indexing::IndexAssigner;
use super::resolver::SlotResolver;
use crate::core::forcefield::params::VirtualSiteParams;
use crate::core::io::top::VirtualSiteRecord;
use crate::core::models::keys::{VirtualSiteKey, VirtualSiteKind};
use tracing::{debug, warn};

/// Relative tolerance used when comparing the two bonds of a divalent lone pair.
const BOND_LENGTH_TOLERANCE: f64 = 1e-9;

/// Construction of one virtual site, still in model (0-based) atom indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Construction {
    pub funct: u8,
    pub parents: Vec<usize>,
    pub coefficients: Vec<f64>,
}

fn unsupported(key: &VirtualSiteKey, reason: impl Into<String>) -> ExportError {
    ExportError::UnsupportedGeometry {
        site: key.to_string(),
        reason: reason.into(),
    }
}

fn sorted_parents(key: &VirtualSiteKey) -> Vec<usize> {
    let mut parents = key.parents().to_vec();
    parents.sort_unstable();
    parents
}

fn bond_charge(
    params: &VirtualSiteParams,
    key: &VirtualSiteKey,
) -> Result<Construction, ExportError> {
    Ok(Construction {
        funct: 2,
        parents: key.parents().to_vec(),
        coefficients: vec![params.distance_nm()?],
    })
}

fn monovalent_lone_pair(
    params: &VirtualSiteParams,
    key: &VirtualSiteKey,
) -> Result<Construction, ExportError> {
    if params.out_of_plane_angle_deg()? != 0.0 {
        return Err(unsupported(
            key,
            "a nonzero out-of-plane angle has no GROMACS construction",
        ));
    }
    let in_plane = params
        .in_plane_angle_deg()?
        .ok_or_else(|| unsupported(key, "an in-plane angle is required"))?;
    Ok(Construction {
        funct: 3,
        parents: sorted_parents(key),
        coefficients: vec![180.0 - in_plane, params.distance_nm()?],
    })
}

fn divalent_lone_pair(
    params: &VirtualSiteParams,
    key: &VirtualSiteKey,
    resolver: &SlotResolver<'_>,
    graph: &BondGraph,
) -> Result<Construction, ExportError> {
    warn!(
        "{} is written with sorted parents; the handedness of the lone pair is not preserved.",
        key
    );
    let parents = sorted_parents(key);
    let (center, side1, side2) = (parents[0], parents[1], parents[2]);
    if !(graph.are_bonded(center, side1) && graph.are_bonded(center, side2)) {
        return Err(unsupported(
            key,
            format!(
                "the central atom must have the lowest index, but atom {} is not bonded to both {} and {}",
                center, side1, side2
            ),
        ));
    }

    let bond1 = resolver.bond(center, side1)?.length_nm()?;
    let bond2 = resolver.bond(center, side2)?.length_nm()?;
    if (bond1 - bond2).abs() > BOND_LENGTH_TOLERANCE * bond1.abs().max(bond2.abs()) {
        return Err(unsupported(
            key,
            format!("parent bonds differ in length ({} nm and {} nm)", bond1, bond2),
        ));
    }
    let angle = resolver
        .angle(side1, center, side2)?
        .angle_deg()?
        .to_radians();
    let distance = params.distance_nm()?;
    let out_of_plane = params.out_of_plane_angle_deg()?.to_radians();

    if out_of_plane == 0.0 {
        let a = -distance / (2.0 * (angle / 2.0).cos() * bond1);
        Ok(Construction {
            funct: 1,
            parents,
            coefficients: vec![a, a],
        })
    } else {
        let a = -(distance * out_of_plane.cos()) / (2.0 * bond1 * (angle / 2.0).cos());
        let c = -(distance * out_of_plane.sin()) / (bond1 * bond1 * angle.sin());
        Ok(Construction {
            funct: 4,
            parents,
            coefficients: vec![a, a, c],
        })
    }
}

/// Converts physical placement parameters into construction coefficients.
///
/// `graph` is only consulted for divalent lone pairs, whose central atom is
/// taken to be the lowest-indexed parent.
pub fn construct(
    key: &VirtualSiteKey,
    params: &VirtualSiteParams,
    resolver: &SlotResolver<'_>,
    graph: &BondGraph,
) -> Result<Construction, ExportError> {
    match key.kind() {
        VirtualSiteKind::BondCharge => bond_charge(params, key),
        VirtualSiteKind::MonovalentLonePair => monovalent_lone_pair(params, key),
        VirtualSiteKind::DivalentLonePair => divalent_lone_pair(params, key, resolver, graph),
    }
}

/// Builds the virtual-site rows of every indexed site, in output numbering.
///
/// Rows are ordered by kind name, keeping declaration order within a kind.
pub fn translate_all(
    resolver: &SlotResolver<'_>,
    graph: &BondGraph,
    indices: &IndexAssigner,
) -> Result<Vec<VirtualSiteRecord>, ExportError> {
    let mut sites: Vec<(&VirtualSiteKey, usize)> = indices.virtual_sites().collect();
    sites.sort_by_key(|(key, _)| key.kind().to_string());

    let records = sites
        .into_iter()
        .map(|(key, site)| -> Result<VirtualSiteRecord, ExportError> {
            let params = resolver.virtual_site(key)?;
            let construction = construct(key, params, resolver, graph)?;
            Ok(VirtualSiteRecord {
                site,
                parents: construction
                    .parents
                    .iter()
                    .map(|&parent| indices.atom(parent))
                    .collect(),
                funct: construction.funct,
                coefficients: construction.coefficients,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    debug!("Translated {} virtual sites.", records.len());
    Ok(records)
}
