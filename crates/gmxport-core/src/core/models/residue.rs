#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub name: String,              // Name of the residue (e.g., "HOH", "ETH")
    pub(crate) atoms: Vec<usize>, // Indices of atoms belonging to this residue
}

impl Residue {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            atoms: Vec::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_index: usize) {
        self.atoms.push(atom_index);
    }

    pub fn atoms(&self) -> &[usize] {
        &self.atoms
    }
}
