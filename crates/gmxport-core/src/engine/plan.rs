use super::compat::{NonbondedForm, NonbondedSettings, check_compatibility};
use super::config::ExportConfig;
use super::error::ExportError;
use super::graph::BondGraph;
use super::indexing::IndexAssigner;
use super::pairs::{derive_exclusions, derive_pairs};
use super::resolver::SlotResolver;
use super::virtual_sites::translate_all;
use crate::core::io::gro::{GroFrame, GroParticle};
use crate::core::io::top::{
    AngleRecord, AtomRecord, AtomType, BondRecord, Defaults, DihedralRecord, DihedralTerm,
    TopologyDocument, TypeParameters,
};
use crate::core::models::keys::{Category, ParticleKey, TopologyKey};
use crate::core::models::system::Model;
use nalgebra::{Matrix3, Point3};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Edge length of the cubic box written when the model has none, in nm.
pub const DEFAULT_BOX_EDGE: f64 = 11.0;

const VIRTUAL_SITE_NAME: &str = "VS";

/// Everything needed to write both output files, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyPlan {
    pub coordinates: GroFrame,
    pub topology: TopologyDocument,
}

/// Shared state of one plan build.
struct PlanContext<'a> {
    model: &'a Model,
    config: &'a ExportConfig,
    resolver: SlotResolver<'a>,
    graph: BondGraph,
    indices: IndexAssigner,
    settings: NonbondedSettings,
}

impl TopologyPlan {
    /// Resolves every interaction of `model` into output records.
    ///
    /// Fails on the first incompatibility; nothing is written here.
    pub fn build(model: &Model, config: &ExportConfig) -> Result<Self, ExportError> {
        let force_field = model.force_field();
        let settings = check_compatibility(force_field)?;
        let context = PlanContext {
            model,
            config,
            resolver: SlotResolver::new(force_field),
            graph: BondGraph::from_model(model),
            indices: IndexAssigner::new(
                model.n_atoms(),
                force_field.virtual_site_keys(),
                config.index_origin,
            ),
            settings,
        };

        let type_names = atom_type_names(model);
        let atom_types = context.atom_types(&type_names)?;
        let atoms = context.atoms(&type_names)?;
        let pairs = derive_pairs(
            &context.graph,
            &context.resolver,
            &context.settings,
            &context.indices,
        )?;
        let bonds = context.bonds()?;
        let angles = context.angles()?;
        let dihedrals = context.dihedrals()?;
        let virtual_sites = translate_all(&context.resolver, &context.graph, &context.indices)?;
        let exclusions = derive_exclusions(&context.indices);

        debug!(
            "Planned {} atom types, {} particles, {} pairs, {} bonds, {} angles, {} dihedrals, {} virtual sites.",
            atom_types.len(),
            atoms.len(),
            pairs.len(),
            bonds.len(),
            angles.len(),
            dihedrals.len(),
            virtual_sites.len()
        );

        let topology = TopologyDocument {
            defaults: Defaults {
                nbfunc: settings.nbfunc(),
                comb_rule: settings.comb_rule(),
                gen_pairs: false,
                fudge_lj: settings.scale_lj,
                fudge_qq: settings.scale_qq,
            },
            atom_types,
            molecule_name: config.molecule_name.clone(),
            nrexcl: config.nrexcl,
            atoms,
            pairs,
            bonds,
            angles,
            dihedrals,
            virtual_sites,
            exclusions,
            system_name: config.system_name.clone(),
            molecule_count: 1,
        };

        Ok(Self {
            coordinates: context.coordinates()?,
            topology,
        })
    }
}

/// One atom type per atom, named by element symbol and a per-element counter.
fn atom_type_names(model: &Model) -> Vec<String> {
    let mut counters: HashMap<&str, usize> = HashMap::new();
    model
        .atoms()
        .iter()
        .map(|atom| {
            let symbol = atom.element.symbol();
            let count = counters.entry(symbol).or_insert(0);
            *count += 1;
            format!("{}{}", symbol, count)
        })
        .collect()
}

impl PlanContext<'_> {
    fn residue_name(&self, residue_index: usize) -> String {
        self.model
            .residue(residue_index)
            .map(|residue| residue.name.clone())
            .unwrap_or_default()
    }

    fn atom_types(&self, type_names: &[String]) -> Result<Vec<AtomType>, ExportError> {
        let mut atom_types = Vec::with_capacity(type_names.len());
        for (index, (atom, name)) in self.model.atoms().iter().zip(type_names).enumerate() {
            let particle = ParticleKey::Atom(index);
            let parameters = match self.settings.form {
                NonbondedForm::LennardJones => {
                    let (sigma, epsilon) =
                        self.resolver.lennard_jones(&particle)?.in_gromacs_units()?;
                    TypeParameters::LennardJones { sigma, epsilon }
                }
                NonbondedForm::Buckingham => {
                    let (a, b, c) = self.resolver.buckingham(&particle)?.in_gromacs_units()?;
                    TypeParameters::Buckingham { a, b, c }
                }
            };
            atom_types.push(AtomType {
                name: name.clone(),
                atomic_number: atom.element.atomic_number(),
                mass: atom.element.mass(),
                parameters,
            });
        }

        if self.settings.form == NonbondedForm::LennardJones {
            for (key, _) in self.indices.virtual_sites() {
                let particle = ParticleKey::VirtualSite(key.clone());
                let (sigma, epsilon) = match self.resolver.optional_lennard_jones(&particle)? {
                    Some(params) => params.in_gromacs_units()?,
                    None => (0.0, 0.0),
                };
                atom_types.push(AtomType::virtual_site(TypeParameters::LennardJones {
                    sigma,
                    epsilon,
                }));
            }
        }
        Ok(atom_types)
    }

    fn atoms(&self, type_names: &[String]) -> Result<Vec<AtomRecord>, ExportError> {
        let mut records = Vec::with_capacity(self.indices.n_particles());
        for (index, (atom, atom_type)) in self.model.atoms().iter().zip(type_names).enumerate() {
            let charge = self
                .resolver
                .charge(&ParticleKey::Atom(index))?
                .charge_e()?;
            let number = self.indices.atom(index);
            records.push(AtomRecord {
                index: number,
                atom_type: atom_type.clone(),
                residue_number: atom.residue_index + 1,
                residue_name: self.residue_name(atom.residue_index),
                atom_name: atom.name.clone(),
                charge_group: number,
                charge,
                mass: atom.element.mass(),
            });
        }

        for (key, number) in self.indices.virtual_sites() {
            let charge = match self
                .resolver
                .optional_charge(&ParticleKey::VirtualSite(key.clone()))?
            {
                Some(params) => params.charge_e()?,
                None => 0.0,
            };
            // A virtual site lives in the residue of its first parent.
            let residue_index = key
                .parents()
                .first()
                .and_then(|&parent| self.model.atom(parent))
                .map_or(0, |parent| parent.residue_index);
            records.push(AtomRecord {
                index: number,
                atom_type: VIRTUAL_SITE_NAME.to_string(),
                residue_number: residue_index + 1,
                residue_name: self.residue_name(residue_index),
                atom_name: VIRTUAL_SITE_NAME.to_string(),
                charge_group: number,
                charge,
                mass: 0.0,
            });
        }
        Ok(records)
    }

    fn bonds(&self) -> Result<Vec<BondRecord>, ExportError> {
        self.graph
            .bonds()
            .iter()
            .map(|&(a, b)| -> Result<BondRecord, ExportError> {
                let params = self.resolver.bond(a, b)?;
                let (low, high) = (a.min(b), a.max(b));
                Ok(BondRecord {
                    atoms: [self.indices.atom(low), self.indices.atom(high)],
                    length: params.length_nm()?,
                    k: params.k_kj_nm2()?,
                })
            })
            .collect()
    }

    fn angles(&self) -> Result<Vec<AngleRecord>, ExportError> {
        self.graph
            .angles()
            .into_iter()
            .map(|[i, j, k]| -> Result<AngleRecord, ExportError> {
                let params = self.resolver.angle(i, j, k)?;
                Ok(AngleRecord {
                    atoms: [
                        self.indices.atom(i),
                        self.indices.atom(j),
                        self.indices.atom(k),
                    ],
                    angle: params.angle_deg()?,
                    k: params.k_kj_rad2()?,
                })
            })
            .collect()
    }

    fn output_quartet(&self, key: &TopologyKey) -> [usize; 4] {
        let mut atoms = [0; 4];
        for (slot, &atom) in atoms.iter_mut().zip(key.atom_indices()) {
            *slot = self.indices.atom(atom);
        }
        atoms
    }

    fn dihedrals(&self) -> Result<Vec<DihedralRecord>, ExportError> {
        let force_field = self.resolver.force_field();
        let mut dihedrals = Vec::new();

        if force_field.proper_torsions.is_some() || force_field.rb_torsions.is_some() {
            for path in self.graph.propers() {
                let path = TopologyKey::new(path);
                let proper = self.resolver.proper_torsion(&path)?;
                let rb = self.resolver.rb_torsion(&path)?;
                if proper.is_none() && rb.is_none() {
                    let category = if force_field.proper_torsions.is_some() {
                        Category::ProperTorsions
                    } else {
                        Category::RbTorsions
                    };
                    return Err(ExportError::UnresolvedInteraction {
                        category,
                        atoms: path.atom_indices().to_vec(),
                    });
                }
                if let Some((declared, params)) = proper {
                    dihedrals.push(DihedralRecord {
                        atoms: self.output_quartet(&declared),
                        term: DihedralTerm::Proper {
                            phase: params.phase_deg()?,
                            k: params.k_kj()?,
                            periodicity: params.periodicity,
                        },
                    });
                }
                if let Some((declared, params)) = rb {
                    dihedrals.push(DihedralRecord {
                        atoms: self.output_quartet(&declared),
                        term: DihedralTerm::RyckaertBellemans(params.coefficients_kj()?),
                    });
                }
            }
        }

        if force_field.improper_torsions.is_some() {
            let mut skipped = 0;
            for improper in self.graph.impropers() {
                let key = TopologyKey::new(improper);
                match self.resolver.improper_torsion(&key)? {
                    Some(params) => dihedrals.push(DihedralRecord {
                        atoms: self.output_quartet(&key),
                        term: DihedralTerm::Improper {
                            phase: params.phase_deg()?,
                            k: params.k_kj()?,
                            periodicity: params.periodicity,
                        },
                    }),
                    None => skipped += 1,
                }
            }
            if skipped > 0 {
                warn!(
                    "Skipped {} trivalent centers with no improper torsion parameters.",
                    skipped
                );
            }
        }
        Ok(dihedrals)
    }

    fn coordinates(&self) -> Result<GroFrame, ExportError> {
        let positions = self.model.positions_nm()?;
        let mut particles = Vec::with_capacity(self.indices.n_particles());
        for (index, (atom, position)) in self.model.atoms().iter().zip(positions).enumerate() {
            particles.push(GroParticle {
                residue_number: atom.residue_index + 1,
                residue_name: self.residue_name(atom.residue_index),
                atom_name: atom.name.clone(),
                atom_number: self.indices.atom(index),
                position,
            });
        }
        for (_, number) in self.indices.virtual_sites() {
            particles.push(GroParticle {
                residue_number: 1,
                residue_name: String::new(),
                atom_name: VIRTUAL_SITE_NAME.to_string(),
                atom_number: number,
                position: Point3::origin(),
            });
        }

        let box_vectors = self
            .model
            .box_vectors_nm()?
            .unwrap_or_else(|| Matrix3::from_diagonal_element(DEFAULT_BOX_EDGE));

        Ok(GroFrame {
            title: self.config.title.clone(),
            particles,
            box_vectors,
            precision: self.config.precision,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::params::{
        AngleParams, BondParams, BuckinghamParams, ChargeParams, LennardJonesParams,
        TorsionParams, VirtualSiteParams,
    };
    use crate::core::forcefield::table::{CategoryTable, ElectrostaticsHandler, NonbondedHandler};
    use crate::core::models::atom::Atom;
    use crate::core::models::keys::{VirtualSiteKey, VirtualSiteKind};
    use crate::core::models::units::{Quantity, Unit};

    fn q(value: f64, unit: Unit) -> Quantity {
        Quantity::new(value, unit)
    }

    fn lj(sigma: f64, epsilon: f64) -> LennardJonesParams {
        LennardJonesParams {
            sigma: q(sigma, Unit::Nanometer),
            epsilon: q(epsilon, Unit::KilojoulePerMole),
        }
    }

    fn charge(value: f64) -> ChargeParams {
        ChargeParams {
            charge: q(value, Unit::ElementaryCharge),
        }
    }

    /// Water with the oxygen last, and bonds declared hydrogen-first.
    fn water() -> Model {
        let mut model = Model::new();
        let res = model.add_residue("HOH");
        let h = "H".parse().unwrap();
        let o = "O".parse().unwrap();
        model
            .add_atom(Atom::new("H1", h, res, Point3::new(0.0757, 0.0586, 0.0)))
            .unwrap();
        model
            .add_atom(Atom::new("H2", h, res, Point3::new(-0.0757, 0.0586, 0.0)))
            .unwrap();
        model
            .add_atom(Atom::new("O", o, res, Point3::new(0.0, 0.0, 0.0)))
            .unwrap();
        model.add_bond(2, 0).unwrap();
        model.add_bond(1, 2).unwrap();

        let ff = model.force_field_mut();
        let mut bonds = CategoryTable::new(Category::Bonds);
        bonds.assign(TopologyKey::bond(0, 2), "oh");
        bonds.assign(TopologyKey::bond(1, 2), "oh");
        bonds.insert_potential(
            "oh",
            BondParams {
                k: q(462750.4, Unit::KilojoulePerMolePerNanometer2),
                length: q(0.09572, Unit::Nanometer),
            },
        );
        ff.bonds = Some(bonds);

        let mut angles = CategoryTable::new(Category::Angles);
        angles.assign(TopologyKey::angle(0, 2, 1), "hoh");
        angles.insert_potential(
            "hoh",
            AngleParams {
                k: q(836.8, Unit::KilojoulePerMolePerRadian2),
                angle: q(104.52, Unit::Degree),
            },
        );
        ff.angles = Some(angles);

        let mut vdw = NonbondedHandler::new(Category::Vdw, "lorentz-berthelot", 0.5);
        vdw.table.assign(ParticleKey::Atom(0), "h");
        vdw.table.assign(ParticleKey::Atom(1), "h");
        vdw.table.assign(ParticleKey::Atom(2), "o");
        vdw.table.insert_potential("h", lj(0.0, 0.0));
        vdw.table.insert_potential("o", lj(0.315061, 0.636386));
        ff.vdw = Some(vdw);

        let mut electrostatics = ElectrostaticsHandler::new(0.8333333333);
        electrostatics.table.assign(ParticleKey::Atom(0), "h");
        electrostatics.table.assign(ParticleKey::Atom(1), "h");
        electrostatics.table.assign(ParticleKey::Atom(2), "o");
        electrostatics.table.insert_potential("h", charge(0.417));
        electrostatics.table.insert_potential("o", charge(-0.834));
        ff.electrostatics = Some(electrostatics);
        model
    }

    #[test]
    fn water_plan_has_expected_records() {
        let plan = TopologyPlan::build(&water(), &ExportConfig::default()).unwrap();
        let top = &plan.topology;

        assert_eq!(top.defaults.nbfunc, 1);
        assert_eq!(top.defaults.comb_rule, 2);
        let type_names: Vec<&str> = top.atom_types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(type_names, vec!["H1", "H2", "O1"]);
        let indices: Vec<usize> = top.atoms.iter().map(|a| a.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(top.atoms[2].atom_name, "O");
        assert!((top.atoms[2].charge + 0.834).abs() < 1e-12);
        assert!(top.pairs.is_empty());
        assert_eq!(top.bonds.len(), 2);
        assert_eq!(top.angles.len(), 1);
        assert!(top.dihedrals.is_empty());
        assert!(top.virtual_sites.is_empty());
    }

    #[test]
    fn bonds_are_written_ascending_regardless_of_declared_direction() {
        let plan = TopologyPlan::build(&water(), &ExportConfig::default()).unwrap();
        let atoms: Vec<[usize; 2]> = plan.topology.bonds.iter().map(|b| b.atoms).collect();
        assert_eq!(atoms, vec![[1, 3], [2, 3]]);
        assert!(atoms.iter().all(|[a, b]| a < b));
    }

    #[test]
    fn coordinates_default_to_an_eleven_nanometer_cube() {
        let plan = TopologyPlan::build(&water(), &ExportConfig::default()).unwrap();
        let frame = &plan.coordinates;
        assert_eq!(frame.particles.len(), 3);
        assert_eq!(frame.box_vectors, Matrix3::from_diagonal_element(11.0));
        assert_eq!(frame.precision, 3);
        assert_eq!(frame.particles[0].residue_name, "HOH");
    }

    #[test]
    fn model_box_is_converted_to_nanometers() {
        let mut model = water();
        model.set_length_unit(Unit::Angstrom).unwrap();
        model.set_box_vectors(Some(Matrix3::from_diagonal_element(30.0)));
        let plan = TopologyPlan::build(&model, &ExportConfig::default()).unwrap();
        assert!((plan.coordinates.box_vectors[(0, 0)] - 3.0).abs() < 1e-12);
        assert!((plan.coordinates.particles[0].position.x - 0.00757).abs() < 1e-12);
    }

    #[test]
    fn missing_angle_parameters_fail_the_plan() {
        let mut model = water();
        model.force_field_mut().angles = None;
        let err = TopologyPlan::build(&model, &ExportConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ExportError::UnresolvedInteraction {
                category: Category::Angles,
                ..
            }
        ));
    }

    #[test]
    fn missing_atom_charge_fails_the_plan() {
        let mut model = water();
        if let Some(electrostatics) = model.force_field_mut().electrostatics.as_mut() {
            electrostatics.table = CategoryTable::new(Category::Electrostatics);
        }
        assert!(matches!(
            TopologyPlan::build(&model, &ExportConfig::default()),
            Err(ExportError::UnresolvedInteraction {
                category: Category::Electrostatics,
                ..
            })
        ));
    }

    #[test]
    fn virtual_sites_follow_atoms_in_both_files() {
        let mut model = water();
        let ep = VirtualSiteKey::new("EP", VirtualSiteKind::BondCharge, vec![2, 0]).unwrap();
        let ff = model.force_field_mut();
        let mut sites = CategoryTable::new(Category::VirtualSites);
        sites.assign(ep.clone(), "ep");
        sites.insert_potential(
            "ep",
            VirtualSiteParams {
                distance: q(0.015, Unit::Nanometer),
                in_plane_angle: None,
                out_of_plane_angle: None,
            },
        );
        ff.virtual_sites = Some(sites);
        if let Some(electrostatics) = ff.electrostatics.as_mut() {
            electrostatics
                .table
                .assign(ParticleKey::VirtualSite(ep.clone()), "ep");
            electrostatics.table.insert_potential("ep", charge(-1.04));
        }

        let plan = TopologyPlan::build(&model, &ExportConfig::default()).unwrap();
        let top = &plan.topology;
        let site = top.atoms.last().unwrap();
        assert_eq!(site.index, 4);
        assert_eq!(site.atom_type, "VS");
        assert_eq!(site.mass, 0.0);
        assert!((site.charge + 1.04).abs() < 1e-12);
        assert_eq!(top.atom_types.last().unwrap().name, "VS");
        assert_eq!(top.virtual_sites[0].parents, vec![3, 1]);
        assert_eq!(top.exclusions[0].excluded, vec![3, 1]);

        let particle = plan.coordinates.particles.last().unwrap();
        assert_eq!(particle.atom_number, 4);
        assert_eq!(particle.atom_name, "VS");
        assert_eq!(particle.residue_number, 1);
        assert_eq!(particle.position, Point3::origin());
    }

    fn butane_chain() -> Model {
        let mut model = Model::new();
        let res = model.add_residue("BUT");
        let c = "C".parse().unwrap();
        for i in 0..4 {
            let position = Point3::new(0.15 * i as f64, 0.0, 0.0);
            model
                .add_atom(Atom::new(&format!("C{}", i + 1), c, res, position))
                .unwrap();
        }
        model.add_bond(0, 1).unwrap();
        model.add_bond(1, 2).unwrap();
        model.add_bond(2, 3).unwrap();

        let ff = model.force_field_mut();
        let mut bonds = CategoryTable::new(Category::Bonds);
        for (a, b) in [(0, 1), (1, 2), (2, 3)] {
            bonds.assign(TopologyKey::bond(a, b), "cc");
        }
        bonds.insert_potential(
            "cc",
            BondParams {
                k: q(224262.4, Unit::KilojoulePerMolePerNanometer2),
                length: q(0.1526, Unit::Nanometer),
            },
        );
        ff.bonds = Some(bonds);
        let mut angles = CategoryTable::new(Category::Angles);
        angles.assign(TopologyKey::angle(0, 1, 2), "ccc");
        angles.assign(TopologyKey::angle(3, 2, 1), "ccc");
        angles.insert_potential(
            "ccc",
            AngleParams {
                k: q(334.72, Unit::KilojoulePerMolePerRadian2),
                angle: q(109.5, Unit::Degree),
            },
        );
        ff.angles = Some(angles);

        let mut buckingham = NonbondedHandler::new(Category::Buckingham, "buckingham", 0.5);
        let mut electrostatics = ElectrostaticsHandler::new(0.8333333333);
        for atom in 0..4 {
            buckingham.table.assign(ParticleKey::Atom(atom), "c");
            electrostatics.table.assign(ParticleKey::Atom(atom), "c");
        }
        buckingham.table.insert_potential(
            "c",
            BuckinghamParams {
                a: q(1000.0, Unit::KilojoulePerMole),
                b: q(30.0, Unit::PerNanometer),
                c: q(0.002, Unit::KilojoulePerMoleNanometer6),
            },
        );
        electrostatics.table.insert_potential("c", charge(0.0));
        ff.buckingham = Some(buckingham);
        ff.electrostatics = Some(electrostatics);
        model
    }

    #[test]
    fn buckingham_plan_uses_nbfunc_two_and_bare_pairs() {
        let plan = TopologyPlan::build(&butane_chain(), &ExportConfig::default()).unwrap();
        let top = &plan.topology;
        assert_eq!(top.defaults.nbfunc, 2);
        assert!(matches!(
            top.atom_types[0].parameters,
            TypeParameters::Buckingham { .. }
        ));
        assert_eq!(top.pairs.len(), 1);
        assert_eq!(top.pairs[0].atoms, [1, 4]);
        assert_eq!(top.pairs[0].parameters, None);
    }

    #[test]
    fn proper_torsion_declared_in_reverse_is_written_as_declared() {
        let mut model = butane_chain();
        let mut propers = CategoryTable::new(Category::ProperTorsions);
        propers.assign(TopologyKey::torsion(3, 2, 1, 0), "t");
        propers.insert_potential(
            "t",
            TorsionParams {
                k: q(2.0, Unit::KilojoulePerMole),
                periodicity: 3,
                phase: q(0.0, Unit::Degree),
                idivf: 2.0,
            },
        );
        model.force_field_mut().proper_torsions = Some(propers);

        let plan = TopologyPlan::build(&model, &ExportConfig::default()).unwrap();
        let dihedral = &plan.topology.dihedrals[0];
        assert_eq!(dihedral.atoms, [4, 3, 2, 1]);
        assert_eq!(
            dihedral.term,
            DihedralTerm::Proper {
                phase: 0.0,
                k: 1.0,
                periodicity: 3
            }
        );
    }

    #[test]
    fn unparameterized_proper_fails_when_torsions_are_present() {
        let mut model = butane_chain();
        model.force_field_mut().proper_torsions =
            Some(CategoryTable::new(Category::ProperTorsions));
        assert!(matches!(
            TopologyPlan::build(&model, &ExportConfig::default()),
            Err(ExportError::UnresolvedInteraction {
                category: Category::ProperTorsions,
                ..
            })
        ));
    }

    #[test]
    fn index_origin_shifts_every_reference() {
        let config = crate::engine::config::ExportConfigBuilder::new()
            .index_origin(0)
            .build()
            .unwrap();
        let plan = TopologyPlan::build(&water(), &config).unwrap();
        assert_eq!(plan.topology.atoms[0].index, 0);
        assert_eq!(plan.topology.bonds[0].atoms, [0, 2]);
        assert_eq!(plan.coordinates.particles[2].atom_number, 2);
    }
}
