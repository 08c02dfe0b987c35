use super::atom::Atom;
use super::residue::Residue;
use super::topology::Bond;
use super::units::{Quantity, Unit, UnitError};
use crate::core::forcefield::table::ForceField;
use nalgebra::{Matrix3, Point3};

/// Represents a complete, parameterized molecular model ready for export.
///
/// A `Model` holds the bonded graph (atoms, residues, bonds), the global scalars
/// (periodic box and the unit positions are expressed in), and the [`ForceField`]
/// category tables. The exporter treats it as read-only.
#[derive(Debug, Clone)]
pub struct Model {
    /// Atoms in topology order; an atom's position in this list is its index.
    atoms: Vec<Atom>,
    residues: Vec<Residue>,
    bonds: Vec<Bond>,
    /// Cached adjacency list for bond connectivity, indexed by atom index.
    bond_adjacency: Vec<Vec<usize>>,
    /// Periodic box vectors as matrix rows, in `length_unit`.
    box_vectors: Option<Matrix3<f64>>,
    length_unit: Unit,
    force_field: ForceField,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// Creates a new, empty model with positions in nanometers and no force field.
    pub fn new() -> Self {
        Self {
            atoms: Vec::new(),
            residues: Vec::new(),
            bonds: Vec::new(),
            bond_adjacency: Vec::new(),
            box_vectors: None,
            length_unit: Unit::Nanometer,
            force_field: ForceField::default(),
        }
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn residue(&self, index: usize) -> Option<&Residue> {
        self.residues.get(index)
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    /// Returns a slice of all bonds in declaration order.
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Bonded neighbors of an atom, in the order the bonds were added.
    pub fn neighbors(&self, atom: usize) -> &[usize] {
        self.bond_adjacency
            .get(atom)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn box_vectors(&self) -> Option<&Matrix3<f64>> {
        self.box_vectors.as_ref()
    }

    pub fn set_box_vectors(&mut self, box_vectors: Option<Matrix3<f64>>) {
        self.box_vectors = box_vectors;
    }

    pub fn length_unit(&self) -> Unit {
        self.length_unit
    }

    /// Sets the unit of positions and box vectors.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::UnitMismatch`] if `unit` is not a length.
    pub fn set_length_unit(&mut self, unit: Unit) -> Result<(), UnitError> {
        if unit.dimension() != Unit::Nanometer.dimension() {
            return Err(UnitError::UnitMismatch {
                from: unit,
                to: Unit::Nanometer,
            });
        }
        self.length_unit = unit;
        Ok(())
    }

    pub fn force_field(&self) -> &ForceField {
        &self.force_field
    }

    pub fn force_field_mut(&mut self) -> &mut ForceField {
        &mut self.force_field
    }

    pub fn set_force_field(&mut self, force_field: ForceField) {
        self.force_field = force_field;
    }

    /// Appends a residue and returns its index.
    pub fn add_residue(&mut self, name: &str) -> usize {
        self.residues.push(Residue::new(name));
        self.residues.len() - 1
    }

    /// Appends an atom to its residue and returns the atom's index.
    ///
    /// Returns `None` if the atom's residue does not exist.
    pub fn add_atom(&mut self, atom: Atom) -> Option<usize> {
        let index = self.atoms.len();
        self.residues.get_mut(atom.residue_index)?.add_atom(index);
        self.atoms.push(atom);
        self.bond_adjacency.push(Vec::new());
        Some(index)
    }

    /// Adds a bond between two atoms.
    ///
    /// Idempotent in either direction; the declared direction of the first
    /// insertion is kept. Returns `None` for unknown atoms or a self-bond.
    pub fn add_bond(&mut self, atom1: usize, atom2: usize) -> Option<()> {
        if atom1 == atom2 || atom1 >= self.atoms.len() || atom2 >= self.atoms.len() {
            return None;
        }
        if self.bond_adjacency[atom1].contains(&atom2) {
            return Some(());
        }

        self.bonds.push(Bond::new(atom1, atom2));
        self.bond_adjacency[atom1].push(atom2);
        self.bond_adjacency[atom2].push(atom1);
        Some(())
    }

    /// Atom positions converted to nanometers.
    pub fn positions_nm(&self) -> Result<Vec<Point3<f64>>, UnitError> {
        let factor = Quantity::new(1.0, self.length_unit).m_as(Unit::Nanometer)?;
        Ok(self.atoms.iter().map(|a| a.position * factor).collect())
    }

    /// Box vectors converted to nanometers.
    pub fn box_vectors_nm(&self) -> Result<Option<Matrix3<f64>>, UnitError> {
        let factor = Quantity::new(1.0, self.length_unit).m_as(Unit::Nanometer)?;
        Ok(self.box_vectors.map(|m| m * factor))
    }
}
