use super::error::ExportError;
use crate::core::forcefield::params::{
    AngleParams, BondParams, BuckinghamParams, ChargeParams, LennardJonesParams, RbTorsionParams,
    TorsionParams, VirtualSiteParams,
};
use crate::core::forcefield::table::{CategoryTable, ForceField};
use crate::core::models::keys::{Category, ParticleKey, TopologyKey, VirtualSiteKey};
use std::hash::Hash;

/// A resolved parameter set, borrowed from the force field it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterSet<'a> {
    Bond(&'a BondParams),
    Angle(&'a AngleParams),
    Torsion(&'a TorsionParams),
    RbTorsion(&'a RbTorsionParams),
    LennardJones(&'a LennardJonesParams),
    Buckingham(&'a BuckinghamParams),
    Charge(&'a ChargeParams),
    VirtualSite(&'a VirtualSiteParams),
}

/// Answers "which parameters apply to this interaction" against one force field.
///
/// Lookups are hash-keyed and read-only, so repeated calls give identical answers.
#[derive(Debug, Clone, Copy)]
pub struct SlotResolver<'a> {
    force_field: &'a ForceField,
}

impl<'a> SlotResolver<'a> {
    pub fn new(force_field: &'a ForceField) -> Self {
        Self { force_field }
    }

    pub fn force_field(&self) -> &'a ForceField {
        self.force_field
    }

    /// Resolves `key` in `category`.
    ///
    /// Bonds and angles match either direction. Torsions match the declared
    /// order only. Nonbonded categories expect a single-atom key; virtual sites
    /// go through [`SlotResolver::virtual_site`] instead.
    pub fn resolve(
        &self,
        category: Category,
        key: &TopologyKey,
    ) -> Result<ParameterSet<'a>, ExportError> {
        let ff = self.force_field;
        match category {
            Category::Bonds => {
                resolve_either_direction(ff.bonds.as_ref(), category, key).map(ParameterSet::Bond)
            }
            Category::Angles => resolve_either_direction(ff.angles.as_ref(), category, key)
                .map(ParameterSet::Angle),
            Category::ProperTorsions => {
                resolve_declared(ff.proper_torsions.as_ref(), category, key)
                    .map(ParameterSet::Torsion)
            }
            Category::ImproperTorsions => {
                resolve_declared(ff.improper_torsions.as_ref(), category, key)
                    .map(ParameterSet::Torsion)
            }
            Category::RbTorsions => resolve_declared(ff.rb_torsions.as_ref(), category, key)
                .map(ParameterSet::RbTorsion),
            Category::Vdw | Category::Buckingham | Category::Electrostatics => {
                let atom = match key.atom_indices() {
                    [atom] => *atom,
                    _ => {
                        return Err(ExportError::UnresolvedInteraction {
                            category,
                            atoms: key.atom_indices().to_vec(),
                        });
                    }
                };
                let particle = ParticleKey::Atom(atom);
                match category {
                    Category::Vdw => self.lennard_jones(&particle).map(ParameterSet::LennardJones),
                    Category::Buckingham => {
                        self.buckingham(&particle).map(ParameterSet::Buckingham)
                    }
                    _ => self.charge(&particle).map(ParameterSet::Charge),
                }
            }
            Category::VirtualSites => Err(ExportError::UnsupportedExport(
                "virtual sites resolve through their virtual-site key, not an atom tuple"
                    .to_string(),
            )),
        }
    }

    pub fn bond(&self, i: usize, j: usize) -> Result<&'a BondParams, ExportError> {
        resolve_either_direction(
            self.force_field.bonds.as_ref(),
            Category::Bonds,
            &TopologyKey::bond(i, j),
        )
    }

    pub fn angle(&self, i: usize, j: usize, k: usize) -> Result<&'a AngleParams, ExportError> {
        resolve_either_direction(
            self.force_field.angles.as_ref(),
            Category::Angles,
            &TopologyKey::angle(i, j, k),
        )
    }

    /// Finds the proper torsion declared for a graph path in either orientation.
    ///
    /// Returns the key as declared in the table along with its parameters.
    pub fn proper_torsion(
        &self,
        path: &TopologyKey,
    ) -> Result<Option<(TopologyKey, &'a TorsionParams)>, ExportError> {
        find_declared_orientation(
            self.force_field.proper_torsions.as_ref(),
            Category::ProperTorsions,
            path,
        )
    }

    pub fn rb_torsion(
        &self,
        path: &TopologyKey,
    ) -> Result<Option<(TopologyKey, &'a RbTorsionParams)>, ExportError> {
        find_declared_orientation(
            self.force_field.rb_torsions.as_ref(),
            Category::RbTorsions,
            path,
        )
    }

    /// Impropers are a partial map; `None` means the center is not parameterized.
    pub fn improper_torsion(
        &self,
        key: &TopologyKey,
    ) -> Result<Option<&'a TorsionParams>, ExportError> {
        match self.force_field.improper_torsions.as_ref() {
            Some(table) => lookup(table, key),
            None => Ok(None),
        }
    }

    pub fn lennard_jones(
        &self,
        particle: &ParticleKey,
    ) -> Result<&'a LennardJonesParams, ExportError> {
        resolve_particle(
            self.force_field.vdw.as_ref().map(|handler| &handler.table),
            Category::Vdw,
            particle,
        )
    }

    pub fn buckingham(&self, particle: &ParticleKey) -> Result<&'a BuckinghamParams, ExportError> {
        resolve_particle(
            self.force_field.buckingham.as_ref().map(|handler| &handler.table),
            Category::Buckingham,
            particle,
        )
    }

    pub fn charge(&self, particle: &ParticleKey) -> Result<&'a ChargeParams, ExportError> {
        resolve_particle(
            self.force_field
                .electrostatics
                .as_ref()
                .map(|handler| &handler.table),
            Category::Electrostatics,
            particle,
        )
    }

    /// Like [`SlotResolver::charge`], but an unassigned particle yields `None`.
    pub fn optional_charge(
        &self,
        particle: &ParticleKey,
    ) -> Result<Option<&'a ChargeParams>, ExportError> {
        match self.force_field.electrostatics.as_ref() {
            Some(handler) => lookup(&handler.table, particle),
            None => Ok(None),
        }
    }

    /// Like [`SlotResolver::lennard_jones`], but an unassigned particle yields `None`.
    pub fn optional_lennard_jones(
        &self,
        particle: &ParticleKey,
    ) -> Result<Option<&'a LennardJonesParams>, ExportError> {
        match self.force_field.vdw.as_ref() {
            Some(handler) => lookup(&handler.table, particle),
            None => Ok(None),
        }
    }

    pub fn virtual_site(&self, key: &VirtualSiteKey) -> Result<&'a VirtualSiteParams, ExportError> {
        let table = self.force_field.virtual_sites.as_ref().ok_or_else(|| {
            ExportError::UnresolvedInteraction {
                category: Category::VirtualSites,
                atoms: key.parents().to_vec(),
            }
        })?;
        lookup(table, key)?.ok_or_else(|| ExportError::UnresolvedInteraction {
            category: Category::VirtualSites,
            atoms: key.parents().to_vec(),
        })
    }
}

/// Looks up a slot and its parameter set. A slot whose set is missing is an error.
fn lookup<'a, K, P>(table: &'a CategoryTable<K, P>, key: &K) -> Result<Option<&'a P>, ExportError>
where
    K: Clone + Eq + Hash,
{
    match table.potential_key(key) {
        Some(potential) => table
            .params(potential)
            .map(Some)
            .ok_or_else(|| ExportError::DanglingPotential {
                category: table.category(),
                id: potential.id.clone(),
            }),
        None => Ok(None),
    }
}

fn unresolved(category: Category, key: &TopologyKey) -> ExportError {
    ExportError::UnresolvedInteraction {
        category,
        atoms: key.atom_indices().to_vec(),
    }
}

fn resolve_either_direction<'a, P>(
    table: Option<&'a CategoryTable<TopologyKey, P>>,
    category: Category,
    key: &TopologyKey,
) -> Result<&'a P, ExportError> {
    let table = table.ok_or_else(|| unresolved(category, key))?;
    let reversed = key.reversed();
    let forward = table.potential_key(key);
    let backward = if key.is_palindrome() {
        None
    } else {
        table.potential_key(&reversed)
    };

    let matched = match (forward, backward) {
        (Some(f), Some(b)) if f != b => {
            return Err(ExportError::AmbiguousResolution {
                category,
                atoms: key.atom_indices().to_vec(),
            });
        }
        (Some(_), _) => key,
        (None, Some(_)) => &reversed,
        (None, None) => return Err(unresolved(category, key)),
    };
    lookup(table, matched)?.ok_or_else(|| unresolved(category, key))
}

fn resolve_declared<'a, P>(
    table: Option<&'a CategoryTable<TopologyKey, P>>,
    category: Category,
    key: &TopologyKey,
) -> Result<&'a P, ExportError> {
    let table = table.ok_or_else(|| unresolved(category, key))?;
    lookup(table, key)?.ok_or_else(|| unresolved(category, key))
}

fn find_declared_orientation<'a, P>(
    table: Option<&'a CategoryTable<TopologyKey, P>>,
    category: Category,
    path: &TopologyKey,
) -> Result<Option<(TopologyKey, &'a P)>, ExportError> {
    let Some(table) = table else {
        return Ok(None);
    };
    let mirror = path.reversed();
    let forward = lookup(table, path)?;
    let backward = lookup(table, &mirror)?;
    match (forward, backward) {
        (Some(_), Some(_)) if table.potential_key(path) != table.potential_key(&mirror) => {
            Err(ExportError::AmbiguousResolution {
                category,
                atoms: path.atom_indices().to_vec(),
            })
        }
        (Some(params), _) => Ok(Some((path.clone(), params))),
        (None, Some(params)) => Ok(Some((mirror, params))),
        (None, None) => Ok(None),
    }
}

fn resolve_particle<'a, P>(
    table: Option<&'a CategoryTable<ParticleKey, P>>,
    category: Category,
    particle: &ParticleKey,
) -> Result<&'a P, ExportError> {
    let missing = || ExportError::UnresolvedInteraction {
        category,
        atoms: match particle {
            ParticleKey::Atom(atom) => vec![*atom],
            ParticleKey::VirtualSite(site) => site.parents().to_vec(),
        },
    };
    let table = table.ok_or_else(missing)?;
    lookup(table, particle)?.ok_or_else(missing)
}
