use super::atom::Atom;
use super::element::Element;
use super::keys::{Category, KeyError, ParticleKey, TopologyKey, VirtualSiteKey, VirtualSiteKind};
use super::system::Model;
use super::units::{Unit, UnitError};
use crate::core::forcefield::params::{
    AngleParams, BondParams, BuckinghamParams, ChargeParams, LennardJonesParams, RbTorsionParams,
    TorsionParams, VirtualSiteParams,
};
use crate::core::forcefield::table::{
    CategoryTable, ElectrostaticsHandler, ForceField, NonbondedHandler,
};
use nalgebra::{Matrix3, Point3};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;

const DEFAULT_MIXING_RULE: &str = "lorentz-berthelot";
const DEFAULT_VDW_SCALE_14: f64 = 0.5;
const DEFAULT_ELECTROSTATICS_SCALE_14: f64 = 0.8333333333;
const IN_MEMORY_SOURCE: &str = "<memory>";

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("{context} references atom {index}, but the model has {n_atoms} atoms")]
    UnknownAtom {
        context: String,
        index: usize,
        n_atoms: usize,
    },
    #[error("Atom '{0}' references an unknown residue")]
    UnknownResidue(String),
    #[error("Invalid bond between atoms {0} and {1}")]
    InvalidBond(usize, usize),
    #[error("Virtual site '{0}' is declared more than once")]
    DuplicateVirtualSite(String),
    #[error("Unknown virtual site '{0}'")]
    UnknownVirtualSite(String),
    #[error("A {category} slot must name exactly one of `atom` or `virtual-site`")]
    InvalidParticleSlot { category: Category },
    #[error("Invalid virtual site '{name}': {source}")]
    VirtualSite { name: String, source: KeyError },
    #[error(transparent)]
    Unit(#[from] UnitError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct ModelDocument {
    #[serde(default)]
    length_unit: Option<Unit>,
    #[serde(default, rename = "box")]
    box_vectors: Option<[[f64; 3]; 3]>,
    #[serde(default)]
    bonds: Vec<[usize; 2]>,
    #[serde(default)]
    residues: Vec<ResidueDocument>,
    #[serde(default)]
    force_field: ForceFieldDocument,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResidueDocument {
    name: String,
    #[serde(default)]
    atoms: Vec<AtomDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AtomDocument {
    name: String,
    element: Element,
    position: [f64; 3],
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct ForceFieldDocument {
    bonds: Option<BondedDocument<BondParams>>,
    angles: Option<BondedDocument<AngleParams>>,
    proper_torsions: Option<BondedDocument<TorsionParams>>,
    improper_torsions: Option<BondedDocument<TorsionParams>>,
    rb_torsions: Option<BondedDocument<RbTorsionParams>>,
    vdw: Option<NonbondedDocument<LennardJonesParams>>,
    buckingham: Option<NonbondedDocument<BuckinghamParams>>,
    electrostatics: Option<ElectrostaticsDocument>,
    virtual_sites: Option<VirtualSitesDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BondedDocument<P> {
    #[serde(default)]
    slots: Vec<TopologySlot>,
    #[serde(default = "BTreeMap::new")]
    potentials: BTreeMap<String, P>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TopologySlot {
    atoms: Vec<usize>,
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct NonbondedDocument<P> {
    #[serde(default = "default_mixing_rule")]
    mixing_rule: String,
    #[serde(default = "default_vdw_scale_14")]
    scale_14: f64,
    #[serde(default)]
    slots: Vec<ParticleSlot>,
    #[serde(default = "BTreeMap::new")]
    potentials: BTreeMap<String, P>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct ElectrostaticsDocument {
    #[serde(default = "default_electrostatics_scale_14")]
    scale_14: f64,
    #[serde(default)]
    slots: Vec<ParticleSlot>,
    #[serde(default)]
    potentials: BTreeMap<String, ChargeParams>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct ParticleSlot {
    #[serde(default)]
    atom: Option<usize>,
    #[serde(default)]
    virtual_site: Option<String>,
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VirtualSitesDocument {
    #[serde(default)]
    slots: Vec<VirtualSiteSlot>,
    #[serde(default)]
    potentials: BTreeMap<String, VirtualSiteParams>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VirtualSiteSlot {
    name: String,
    kind: VirtualSiteKind,
    parents: Vec<usize>,
    id: String,
}

fn default_mixing_rule() -> String {
    DEFAULT_MIXING_RULE.to_string()
}

fn default_vdw_scale_14() -> f64 {
    DEFAULT_VDW_SCALE_14
}

fn default_electrostatics_scale_14() -> f64 {
    DEFAULT_ELECTROSTATICS_SCALE_14
}

impl Model {
    /// Loads a model from a TOML document on disk.
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ModelLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let document: ModelDocument = toml::from_str(&content).map_err(|e| ModelLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        document.into_model()
    }

    /// Parses a model from an in-memory TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ModelLoadError> {
        let document: ModelDocument = toml::from_str(content).map_err(|e| ModelLoadError::Toml {
            path: IN_MEMORY_SOURCE.to_string(),
            source: e,
        })?;
        document.into_model()
    }
}

impl ModelDocument {
    fn into_model(self) -> Result<Model, ModelLoadError> {
        let mut model = Model::new();
        if let Some(unit) = self.length_unit {
            model.set_length_unit(unit)?;
        }
        model.set_box_vectors(self.box_vectors.map(|rows| {
            Matrix3::from_row_slice(&[
                rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2],
                rows[2][0], rows[2][1], rows[2][2],
            ])
        }));

        for residue in self.residues {
            let residue_index = model.add_residue(&residue.name);
            for atom in residue.atoms {
                let [x, y, z] = atom.position;
                let name = atom.name;
                model
                    .add_atom(Atom::new(&name, atom.element, residue_index, Point3::new(x, y, z)))
                    .ok_or(ModelLoadError::UnknownResidue(name))?;
            }
        }

        let n_atoms = model.n_atoms();
        for [a, b] in self.bonds {
            model
                .add_bond(a, b)
                .ok_or(ModelLoadError::InvalidBond(a, b))?;
        }

        let force_field = self.force_field.into_force_field(n_atoms)?;
        model.set_force_field(force_field);
        Ok(model)
    }
}

impl ForceFieldDocument {
    fn into_force_field(self, n_atoms: usize) -> Result<ForceField, ModelLoadError> {
        let (virtual_sites, by_name) = match self.virtual_sites {
            Some(doc) => {
                let (table, by_name) = doc.into_table(n_atoms)?;
                (Some(table), by_name)
            }
            None => (None, HashMap::new()),
        };

        Ok(ForceField {
            bonds: self
                .bonds
                .map(|d| d.into_table(Category::Bonds, n_atoms))
                .transpose()?,
            angles: self
                .angles
                .map(|d| d.into_table(Category::Angles, n_atoms))
                .transpose()?,
            proper_torsions: self
                .proper_torsions
                .map(|d| d.into_table(Category::ProperTorsions, n_atoms))
                .transpose()?,
            improper_torsions: self
                .improper_torsions
                .map(|d| d.into_table(Category::ImproperTorsions, n_atoms))
                .transpose()?,
            rb_torsions: self
                .rb_torsions
                .map(|d| d.into_table(Category::RbTorsions, n_atoms))
                .transpose()?,
            vdw: self
                .vdw
                .map(|d| d.into_handler(Category::Vdw, n_atoms, &by_name))
                .transpose()?,
            buckingham: self
                .buckingham
                .map(|d| d.into_handler(Category::Buckingham, n_atoms, &by_name))
                .transpose()?,
            electrostatics: self
                .electrostatics
                .map(|d| d.into_handler(n_atoms, &by_name))
                .transpose()?,
            virtual_sites,
        })
    }
}

fn check_atom(
    context: impl FnOnce() -> String,
    index: usize,
    n_atoms: usize,
) -> Result<(), ModelLoadError> {
    if index < n_atoms {
        Ok(())
    } else {
        Err(ModelLoadError::UnknownAtom {
            context: context(),
            index,
            n_atoms,
        })
    }
}

impl<P> BondedDocument<P> {
    fn into_table(
        self,
        category: Category,
        n_atoms: usize,
    ) -> Result<CategoryTable<TopologyKey, P>, ModelLoadError> {
        let mut table = CategoryTable::new(category);
        for slot in self.slots {
            for &index in &slot.atoms {
                check_atom(|| format!("{} slot '{}'", category, slot.id), index, n_atoms)?;
            }
            table.assign(TopologyKey::new(slot.atoms), &slot.id);
        }
        for (id, params) in self.potentials {
            table.insert_potential(&id, params);
        }
        Ok(table)
    }
}

impl ParticleSlot {
    fn into_key(
        self,
        category: Category,
        n_atoms: usize,
        virtual_sites: &HashMap<String, VirtualSiteKey>,
    ) -> Result<(ParticleKey, String), ModelLoadError> {
        let key = match (self.atom, self.virtual_site) {
            (Some(index), None) => {
                check_atom(|| format!("{} slot '{}'", category, self.id), index, n_atoms)?;
                ParticleKey::Atom(index)
            }
            (None, Some(name)) => virtual_sites
                .get(&name)
                .cloned()
                .map(ParticleKey::VirtualSite)
                .ok_or(ModelLoadError::UnknownVirtualSite(name))?,
            _ => return Err(ModelLoadError::InvalidParticleSlot { category }),
        };
        Ok((key, self.id))
    }
}

fn particle_table<P>(
    category: Category,
    slots: Vec<ParticleSlot>,
    potentials: BTreeMap<String, P>,
    n_atoms: usize,
    virtual_sites: &HashMap<String, VirtualSiteKey>,
) -> Result<CategoryTable<ParticleKey, P>, ModelLoadError> {
    let mut table = CategoryTable::new(category);
    for slot in slots {
        let (key, id) = slot.into_key(category, n_atoms, virtual_sites)?;
        table.assign(key, &id);
    }
    for (id, params) in potentials {
        table.insert_potential(&id, params);
    }
    Ok(table)
}

impl<P> NonbondedDocument<P> {
    fn into_handler(
        self,
        category: Category,
        n_atoms: usize,
        virtual_sites: &HashMap<String, VirtualSiteKey>,
    ) -> Result<NonbondedHandler<P>, ModelLoadError> {
        let mut handler = NonbondedHandler::new(category, &self.mixing_rule, self.scale_14);
        handler.table =
            particle_table(category, self.slots, self.potentials, n_atoms, virtual_sites)?;
        Ok(handler)
    }
}

impl ElectrostaticsDocument {
    fn into_handler(
        self,
        n_atoms: usize,
        virtual_sites: &HashMap<String, VirtualSiteKey>,
    ) -> Result<ElectrostaticsHandler, ModelLoadError> {
        let mut handler = ElectrostaticsHandler::new(self.scale_14);
        handler.table = particle_table(
            Category::Electrostatics,
            self.slots,
            self.potentials,
            n_atoms,
            virtual_sites,
        )?;
        Ok(handler)
    }
}

impl VirtualSitesDocument {
    fn into_table(
        self,
        n_atoms: usize,
    ) -> Result<
        (
            CategoryTable<VirtualSiteKey, VirtualSiteParams>,
            HashMap<String, VirtualSiteKey>,
        ),
        ModelLoadError,
    > {
        let mut table = CategoryTable::new(Category::VirtualSites);
        let mut by_name = HashMap::new();
        for slot in self.slots {
            for &index in &slot.parents {
                check_atom(|| format!("virtual site '{}'", slot.name), index, n_atoms)?;
            }
            if by_name.contains_key(&slot.name) {
                return Err(ModelLoadError::DuplicateVirtualSite(slot.name));
            }
            let key = VirtualSiteKey::new(slot.name.clone(), slot.kind, slot.parents).map_err(
                |source| ModelLoadError::VirtualSite {
                    name: slot.name.clone(),
                    source,
                },
            )?;
            table.assign(key.clone(), &slot.id);
            by_name.insert(slot.name, key);
        }
        for (id, params) in self.potentials {
            table.insert_potential(&id, params);
        }
        Ok((table, by_name))
    }
}
