use super::element::Element;
use nalgebra::Point3;

/// Represents a real (massive) particle of the model.
///
/// Atoms are addressed by their zero-based position in [`Model::atoms`](super::system::Model::atoms),
/// which is also their topology order.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom (e.g., "OW", "HW1").
    pub name: String,
    /// The chemical element, used for masses, atomic numbers, and type names.
    pub element: Element,
    /// Index of the parent residue in [`Model::residues`](super::system::Model::residues).
    pub residue_index: usize,
    /// Cartesian coordinates, expressed in the model's length unit.
    pub position: Point3<f64>,
}

impl Atom {
    /// Creates a new `Atom`.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the atom.
    /// * `element` - The chemical element of the atom.
    /// * `residue_index` - The index of the residue this atom belongs to.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(name: &str, element: Element, residue_index: usize, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            element,
            residue_index,
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_has_expected_fields() {
        let oxygen: Element = "O".parse().unwrap();
        let atom = Atom::new("OW", oxygen, 0, Point3::new(1.0, 2.0, 3.0));

        assert_eq!(atom.name, "OW");
        assert_eq!(atom.element, oxygen);
        assert_eq!(atom.residue_index, 0);
        assert_eq!(atom.position, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn atom_equality_and_clone_works() {
        let atom1 = Atom::new("C1", "C".parse().unwrap(), 2, Point3::origin());
        let atom2 = atom1.clone();
        assert_eq!(atom1, atom2);
    }
}
