use super::util::format_g;
use crate::core::io::traits::MolecularFile;
use std::io::{self, Write};
use thiserror::Error;

const BONDING_TYPE: &str = "XX";
const PARTICLE_TYPE: &str = "A";
const VIRTUAL_SITE_TYPE: &str = "VS";

#[derive(Debug, Error)]
pub enum TopError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Virtual site {site} has {parents} parent atoms; only 2 or 3 are supported")]
    UnsupportedVirtualSite { site: usize, parents: usize },
}

/// The `[ defaults ]` directive.
#[derive(Debug, Clone, PartialEq)]
pub struct Defaults {
    /// 1 for Lennard-Jones, 2 for Buckingham.
    pub nbfunc: u8,
    pub comb_rule: u8,
    pub gen_pairs: bool,
    pub fudge_lj: f64,
    pub fudge_qq: f64,
}

/// Nonbonded columns of an `[ atomtypes ]` row, in GROMACS units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeParameters {
    LennardJones { sigma: f64, epsilon: f64 },
    Buckingham { a: f64, b: f64, c: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtomType {
    pub name: String,
    pub atomic_number: u8,
    pub mass: f64,
    pub parameters: TypeParameters,
}

impl AtomType {
    pub fn is_virtual_site(&self) -> bool {
        self.name == VIRTUAL_SITE_TYPE
    }

    pub fn virtual_site(parameters: TypeParameters) -> Self {
        Self {
            name: VIRTUAL_SITE_TYPE.to_string(),
            atomic_number: 0,
            mass: 0.0,
            parameters,
        }
    }
}

/// One `[ atoms ]` row. Indices are already in the output numbering.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    pub index: usize,
    pub atom_type: String,
    pub residue_number: usize,
    pub residue_name: String,
    pub atom_name: String,
    pub charge_group: usize,
    pub charge: f64,
    pub mass: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairRecord {
    pub atoms: [usize; 2],
    /// Combined `(sigma, epsilon)`; `None` leaves the pair to the engine's defaults.
    pub parameters: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BondRecord {
    pub atoms: [usize; 2],
    /// Equilibrium length in nm.
    pub length: f64,
    /// Force constant in kJ/mol/nm^2.
    pub k: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AngleRecord {
    pub atoms: [usize; 3],
    /// Equilibrium angle in degrees.
    pub angle: f64,
    /// Force constant in kJ/mol/rad^2.
    pub k: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DihedralTerm {
    /// Periodic proper torsion, funct 1.
    Proper { phase: f64, k: f64, periodicity: u32 },
    /// Ryckaert-Bellemans, funct 3.
    RyckaertBellemans([f64; 6]),
    /// Periodic improper torsion, funct 4.
    Improper { phase: f64, k: f64, periodicity: u32 },
}

impl DihedralTerm {
    pub fn funct(&self) -> u8 {
        match self {
            Self::Proper { .. } => 1,
            Self::RyckaertBellemans(_) => 3,
            Self::Improper { .. } => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DihedralRecord {
    pub atoms: [usize; 4],
    pub term: DihedralTerm,
}

/// A virtual-site construction row, written to `[ virtual_sites2 ]` or
/// `[ virtual_sites3 ]` depending on the number of parents.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualSiteRecord {
    pub site: usize,
    pub parents: Vec<usize>,
    pub funct: u8,
    pub coefficients: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionRecord {
    pub site: usize,
    pub excluded: Vec<usize>,
}

/// A fully resolved topology, ready to be written without further lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyDocument {
    pub defaults: Defaults,
    pub atom_types: Vec<AtomType>,
    pub molecule_name: String,
    pub nrexcl: u32,
    pub atoms: Vec<AtomRecord>,
    pub pairs: Vec<PairRecord>,
    pub bonds: Vec<BondRecord>,
    pub angles: Vec<AngleRecord>,
    pub dihedrals: Vec<DihedralRecord>,
    pub virtual_sites: Vec<VirtualSiteRecord>,
    pub exclusions: Vec<ExclusionRecord>,
    pub system_name: String,
    pub molecule_count: usize,
}

pub struct TopFile;

impl TopFile {
    fn write_defaults(defaults: &Defaults, writer: &mut impl Write) -> io::Result<()> {
        writeln!(writer, "[ defaults ]")?;
        writeln!(writer, "; nbfunc\tcomb-rule\tgen-pairs\tfudgeLJ\tfudgeQQ")?;
        writeln!(
            writer,
            "{:6}\t{:6}\t{:6} {:8.6} {:8.6}\n",
            defaults.nbfunc,
            defaults.comb_rule,
            if defaults.gen_pairs { "yes" } else { "no" },
            defaults.fudge_lj,
            defaults.fudge_qq,
        )
    }

    fn write_atom_types(atom_types: &[AtomType], writer: &mut impl Write) -> io::Result<()> {
        writeln!(writer, "[ atomtypes ]")?;
        writeln!(
            writer,
            ";type, bondingtype, atomic_number, mass, charge, ptype, sigma, epsilon"
        )?;
        for atom_type in atom_types {
            write!(writer, "{:<11}", atom_type.name)?;
            if !atom_type.is_virtual_site() {
                write!(writer, " {:6}", BONDING_TYPE)?;
            }
            write!(
                writer,
                " {:6} {} {} {:5}",
                atom_type.atomic_number,
                format_g(atom_type.mass, 16),
                format_g(0.0, 16),
                PARTICLE_TYPE,
            )?;
            match atom_type.parameters {
                TypeParameters::LennardJones { sigma, epsilon } => writeln!(
                    writer,
                    " {} {}",
                    format_g(sigma, 16),
                    format_g(epsilon, 16)
                )?,
                TypeParameters::Buckingham { a, b, c } => writeln!(
                    writer,
                    " {} {} {}",
                    format_g(a, 16),
                    format_g(b, 16),
                    format_g(c, 16)
                )?,
            }
        }
        writeln!(writer)
    }

    fn write_atoms(atoms: &[AtomRecord], writer: &mut impl Write) -> io::Result<()> {
        writeln!(writer, "[ atoms ]")?;
        writeln!(writer, ";num, type, resnum, resname, atomname, cgnr, q, m")?;
        for atom in atoms {
            writeln!(
                writer,
                "{:6} {:18} {:6} {:8} {:8} {:6} {:18.8} {:18.8}",
                atom.index,
                atom.atom_type,
                atom.residue_number,
                atom.residue_name,
                atom.atom_name,
                atom.charge_group,
                atom.charge,
                atom.mass,
            )?;
        }
        writeln!(writer)
    }

    fn write_pairs(pairs: &[PairRecord], writer: &mut impl Write) -> io::Result<()> {
        writeln!(writer, "[ pairs ]")?;
        writeln!(writer, "; ai\taj\tfunct")?;
        for pair in pairs {
            write!(writer, "{:7} {:7} {:6}", pair.atoms[0], pair.atoms[1], 1)?;
            if let Some((sigma, epsilon)) = pair.parameters {
                write!(
                    writer,
                    " {:>16} {:>16}",
                    format_g(sigma, 6),
                    format_g(epsilon, 6)
                )?;
            }
            writeln!(writer)?;
        }
        writeln!(writer)
    }

    fn write_bonds(bonds: &[BondRecord], writer: &mut impl Write) -> io::Result<()> {
        writeln!(writer, "[ bonds ]")?;
        writeln!(writer, "; ai\taj\tfunc\tr\tk")?;
        for bond in bonds {
            writeln!(
                writer,
                "{:7} {:7} {:4} {} {}",
                bond.atoms[0],
                bond.atoms[1],
                "1",
                format_g(bond.length, 16),
                format_g(bond.k, 16),
            )?;
        }
        writeln!(writer)
    }

    fn write_angles(angles: &[AngleRecord], writer: &mut impl Write) -> io::Result<()> {
        writeln!(writer, "[ angles ]")?;
        writeln!(writer, "; ai\taj\tak\tfunc\tr\tk")?;
        for angle in angles {
            writeln!(
                writer,
                "{:7} {:7} {:7} {:4} {} {}",
                angle.atoms[0],
                angle.atoms[1],
                angle.atoms[2],
                "1",
                format_g(angle.angle, 16),
                format_g(angle.k, 16),
            )?;
        }
        writeln!(writer)
    }

    fn write_dihedrals(dihedrals: &[DihedralRecord], writer: &mut impl Write) -> io::Result<()> {
        writeln!(writer, "[ dihedrals ]")?;
        writeln!(writer, ";    i      j      k      l   func")?;
        for dihedral in dihedrals {
            let [i, j, k, l] = dihedral.atoms;
            write!(
                writer,
                "{:7} {:7} {:7} {:7} {:6}",
                i,
                j,
                k,
                l,
                dihedral.term.funct()
            )?;
            match dihedral.term {
                DihedralTerm::Proper {
                    phase,
                    k,
                    periodicity,
                }
                | DihedralTerm::Improper {
                    phase,
                    k,
                    periodicity,
                } => writeln!(
                    writer,
                    " {} {} {}",
                    format_g(phase, 16),
                    format_g(k, 16),
                    periodicity
                )?,
                DihedralTerm::RyckaertBellemans(coefficients) => {
                    for c in coefficients {
                        write!(writer, " {}", format_g(c, 16))?;
                    }
                    writeln!(writer)?;
                }
            }
        }
        writeln!(writer)
    }

    fn write_virtual_sites(
        records: &[VirtualSiteRecord],
        writer: &mut impl Write,
    ) -> Result<(), TopError> {
        if let Some(bad) = records
            .iter()
            .find(|r| r.parents.len() != 2 && r.parents.len() != 3)
        {
            return Err(TopError::UnsupportedVirtualSite {
                site: bad.site,
                parents: bad.parents.len(),
            });
        }

        for (n_parents, header) in [
            (2, "[ virtual_sites2 ]\n; site  ai  aj  funct   a"),
            (3, "[ virtual_sites3 ]\n; site  ai  aj  ak funct   a   b"),
        ] {
            let mut group = records.iter().filter(|r| r.parents.len() == n_parents).peekable();
            if group.peek().is_none() {
                continue;
            }
            writeln!(writer, "{}", header)?;
            for record in group {
                write!(writer, "{}\t", record.site)?;
                for parent in &record.parents {
                    write!(writer, "\t{}", parent)?;
                }
                write!(writer, "\t{}", record.funct)?;
                for coefficient in &record.coefficients {
                    write!(writer, "\t{}", format_g(*coefficient, 16))?;
                }
                writeln!(writer)?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    fn write_exclusions(exclusions: &[ExclusionRecord], writer: &mut impl Write) -> io::Result<()> {
        writeln!(writer, "[ exclusions ]")?;
        for exclusion in exclusions {
            write!(writer, "{}", exclusion.site)?;
            for atom in &exclusion.excluded {
                write!(writer, "\t{}", atom)?;
            }
            writeln!(writer)?;
        }
        writeln!(writer)
    }
}

impl MolecularFile for TopFile {
    type Document = TopologyDocument;
    type Error = TopError;

    fn write_to(doc: &TopologyDocument, writer: &mut impl Write) -> Result<(), Self::Error> {
        Self::write_defaults(&doc.defaults, writer)?;
        Self::write_atom_types(&doc.atom_types, writer)?;

        writeln!(writer, "[ moleculetype ]")?;
        writeln!(writer, "; Name\tnrexcl")?;
        writeln!(writer, "{}\t{}\n", doc.molecule_name, doc.nrexcl)?;

        Self::write_atoms(&doc.atoms, writer)?;
        Self::write_pairs(&doc.pairs, writer)?;
        if !doc.bonds.is_empty() {
            Self::write_bonds(&doc.bonds, writer)?;
        }
        if !doc.angles.is_empty() {
            Self::write_angles(&doc.angles, writer)?;
        }
        if !doc.dihedrals.is_empty() {
            Self::write_dihedrals(&doc.dihedrals, writer)?;
        }
        if !doc.virtual_sites.is_empty() {
            Self::write_virtual_sites(&doc.virtual_sites, writer)?;
            Self::write_exclusions(&doc.exclusions, writer)?;
        }

        writeln!(writer, "[ system ]")?;
        writeln!(writer, "; name ")?;
        writeln!(writer, "{}\n", doc.system_name)?;

        writeln!(writer, "[ molecules ]")?;
        writeln!(writer, "; Compound\tnmols")?;
        writeln!(writer, "{}\t{}", doc.molecule_name, doc.molecule_count)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section<'a>(text: &'a str, header: &str) -> Vec<&'a str> {
        text.split("\n\n")
            .find(|block| block.trim_start().starts_with(header))
            .map(|block| {
                block
                    .lines()
                    .skip_while(|l| !l.starts_with(header))
                    .skip(1)
                    .filter(|l| !l.starts_with(';') && !l.trim().is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn minimal() -> TopologyDocument {
        TopologyDocument {
            defaults: Defaults {
                nbfunc: 1,
                comb_rule: 2,
                gen_pairs: false,
                fudge_lj: 0.5,
                fudge_qq: 0.8333333333,
            },
            atom_types: vec![AtomType {
                name: "O1".to_string(),
                atomic_number: 8,
                mass: 15.999,
                parameters: TypeParameters::LennardJones {
                    sigma: 0.315061,
                    epsilon: 0.636386,
                },
            }],
            molecule_name: "MOL".to_string(),
            nrexcl: 3,
            atoms: vec![AtomRecord {
                index: 1,
                atom_type: "O1".to_string(),
                residue_number: 1,
                residue_name: "HOH".to_string(),
                atom_name: "O".to_string(),
                charge_group: 1,
                charge: -0.834,
                mass: 15.999,
            }],
            pairs: vec![],
            bonds: vec![],
            angles: vec![],
            dihedrals: vec![],
            virtual_sites: vec![],
            exclusions: vec![],
            system_name: "System name".to_string(),
            molecule_count: 1,
        }
    }

    #[test]
    fn sections_appear_in_order() {
        let mut doc = minimal();
        doc.bonds.push(BondRecord {
            atoms: [1, 2],
            length: 0.09572,
            k: 462750.4,
        });
        let text = TopFile::render(&doc).unwrap();
        let order = [
            "[ defaults ]",
            "[ atomtypes ]",
            "[ moleculetype ]",
            "[ atoms ]",
            "[ pairs ]",
            "[ bonds ]",
            "[ system ]",
            "[ molecules ]",
        ];
        let positions: Vec<usize> = order.iter().map(|h| text.find(h).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(!text.contains("[ angles ]"));
        assert!(!text.contains("[ exclusions ]"));
    }

    #[test]
    fn defaults_line_has_expected_columns() {
        let text = TopFile::render(&minimal()).unwrap();
        let line = section(&text, "[ defaults ]")[0];
        assert_eq!(line, "     1\t     2\tno     0.500000 0.833333");
    }

    #[test]
    fn atomtypes_rows_use_sixteen_significant_digits() {
        let text = TopFile::render(&minimal()).unwrap();
        let row = section(&text, "[ atomtypes ]")[0];
        let fields: Vec<&str> = row.split_whitespace().collect();
        assert_eq!(
            fields,
            vec!["O1", "XX", "8", "15.999", "0", "A", "0.315061", "0.636386"]
        );
    }

    #[test]
    fn virtual_site_atomtype_omits_bonding_type() {
        let mut doc = minimal();
        doc.atom_types.push(AtomType::virtual_site(TypeParameters::LennardJones {
            sigma: 0.0,
            epsilon: 0.0,
        }));
        let text = TopFile::render(&doc).unwrap();
        let row = section(&text, "[ atomtypes ]")[1];
        let fields: Vec<&str> = row.split_whitespace().collect();
        assert_eq!(fields, vec!["VS", "0", "0", "0", "A", "0", "0"]);
    }

    #[test]
    fn atoms_row_is_fixed_width() {
        let text = TopFile::render(&minimal()).unwrap();
        let row = section(&text, "[ atoms ]")[0];
        let fields: Vec<&str> = row.split_whitespace().collect();
        assert_eq!(
            fields,
            vec!["1", "O1", "1", "HOH", "O", "1", "-0.83400000", "15.99900000"]
        );
    }

    #[test]
    fn pairs_without_parameters_write_only_funct() {
        let mut doc = minimal();
        doc.pairs = vec![
            PairRecord {
                atoms: [1, 4],
                parameters: Some((0.3, 0.25)),
            },
            PairRecord {
                atoms: [2, 5],
                parameters: None,
            },
        ];
        let text = TopFile::render(&doc).unwrap();
        let rows = section(&text, "[ pairs ]");
        assert_eq!(
            rows[0].split_whitespace().collect::<Vec<_>>(),
            vec!["1", "4", "1", "0.3", "0.25"]
        );
        assert_eq!(rows[1].split_whitespace().collect::<Vec<_>>(), vec!["2", "5", "1"]);
    }

    #[test]
    fn dihedral_functs_and_columns() {
        let mut doc = minimal();
        doc.dihedrals = vec![
            DihedralRecord {
                atoms: [1, 2, 3, 4],
                term: DihedralTerm::Proper {
                    phase: 180.0,
                    k: 4.6024,
                    periodicity: 2,
                },
            },
            DihedralRecord {
                atoms: [1, 2, 3, 4],
                term: DihedralTerm::RyckaertBellemans([1.0, 2.0, 3.0, 0.0, 0.0, 0.0]),
            },
            DihedralRecord {
                atoms: [2, 1, 3, 4],
                term: DihedralTerm::Improper {
                    phase: 180.0,
                    k: 4.6,
                    periodicity: 2,
                },
            },
        ];
        let text = TopFile::render(&doc).unwrap();
        let rows: Vec<Vec<&str>> = section(&text, "[ dihedrals ]")
            .into_iter()
            .map(|r| r.split_whitespace().collect())
            .collect();
        assert_eq!(rows[0], vec!["1", "2", "3", "4", "1", "180", "4.6024", "2"]);
        assert_eq!(rows[1], vec!["1", "2", "3", "4", "3", "1", "2", "3", "0", "0", "0"]);
        assert_eq!(rows[2][4], "4");
    }

    #[test]
    fn virtual_sites_grouped_by_parent_count() {
        let mut doc = minimal();
        doc.virtual_sites = vec![
            VirtualSiteRecord {
                site: 5,
                parents: vec![1, 2, 3],
                funct: 1,
                coefficients: vec![-0.5, -0.5],
            },
            VirtualSiteRecord {
                site: 4,
                parents: vec![2, 1],
                funct: 2,
                coefficients: vec![0.05],
            },
        ];
        doc.exclusions = vec![
            ExclusionRecord {
                site: 5,
                excluded: vec![1, 2, 3],
            },
            ExclusionRecord {
                site: 4,
                excluded: vec![2, 1],
            },
        ];
        let text = TopFile::render(&doc).unwrap();
        assert!(text.find("[ virtual_sites2 ]").unwrap() < text.find("[ virtual_sites3 ]").unwrap());
        assert_eq!(
            section(&text, "[ virtual_sites2 ]")[0]
                .split_whitespace()
                .collect::<Vec<_>>(),
            vec!["4", "2", "1", "2", "0.05"]
        );
        assert_eq!(section(&text, "[ exclusions ]"), vec!["5\t1\t2\t3", "4\t2\t1"]);
    }

    #[test]
    fn virtual_site_with_unsupported_parent_count_fails() {
        let mut doc = minimal();
        doc.virtual_sites = vec![VirtualSiteRecord {
            site: 2,
            parents: vec![1],
            funct: 1,
            coefficients: vec![],
        }];
        assert!(matches!(
            TopFile::render(&doc),
            Err(TopError::UnsupportedVirtualSite { site: 2, parents: 1 })
        ));
    }

    #[test]
    fn molecules_section_closes_the_file() {
        let text = TopFile::render(&minimal()).unwrap();
        assert!(text.ends_with("[ molecules ]\n; Compound\tnmols\nMOL\t1\n"));
    }
}
