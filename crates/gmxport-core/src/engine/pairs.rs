use super::compat::{NonbondedForm, NonbondedSettings};
use super::error::ExportError;
use super::graph::BondGraph;
use super::indexing::IndexAssigner;
use super::resolver::SlotResolver;
use crate::core::io::top::{ExclusionRecord, PairRecord};
use crate::core::models::keys::ParticleKey;
use tracing::debug;

/// Builds `[ pairs ]` rows for every 1-4 pair of the graph, sorted ascending.
///
/// Lennard-Jones pairs carry combined parameters with epsilon scaled by the
/// 1-4 factor; Buckingham pairs are written without parameters.
pub fn derive_pairs(
    graph: &BondGraph,
    resolver: &SlotResolver<'_>,
    settings: &NonbondedSettings,
    indices: &IndexAssigner,
) -> Result<Vec<PairRecord>, ExportError> {
    let pairs = graph.pairs_14();
    debug!("Derived {} unique 1-4 pairs.", pairs.len());

    pairs
        .into_iter()
        .map(|(a, b)| -> Result<PairRecord, ExportError> {
            let parameters = match settings.form {
                NonbondedForm::LennardJones => {
                    let lj_a = resolver
                        .lennard_jones(&ParticleKey::Atom(a))?
                        .in_gromacs_units()?;
                    let lj_b = resolver
                        .lennard_jones(&ParticleKey::Atom(b))?
                        .in_gromacs_units()?;
                    settings
                        .mixing_rule
                        .combine(lj_a, lj_b)
                        .map(|(sigma, epsilon)| (sigma, epsilon * settings.scale_lj))
                }
                NonbondedForm::Buckingham => None,
            };
            Ok(PairRecord {
                atoms: [indices.atom(a), indices.atom(b)],
                parameters,
            })
        })
        .collect()
}

/// One exclusion row per virtual site, listing its parents in declared order.
pub fn derive_exclusions(indices: &IndexAssigner) -> Vec<ExclusionRecord> {
    indices
        .virtual_sites()
        .map(|(key, site)| ExclusionRecord {
            site,
            excluded: key
                .parents()
                .iter()
                .map(|&parent| indices.atom(parent))
                .collect(),
        })
        .collect()
}
