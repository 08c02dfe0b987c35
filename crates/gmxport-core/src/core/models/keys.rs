use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The closed set of interaction categories a force field can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Bonds,
    Angles,
    ProperTorsions,
    ImproperTorsions,
    RbTorsions,
    Vdw,
    Buckingham,
    Electrostatics,
    VirtualSites,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Bonds,
        Category::Angles,
        Category::ProperTorsions,
        Category::ImproperTorsions,
        Category::RbTorsions,
        Category::Vdw,
        Category::Buckingham,
        Category::Electrostatics,
        Category::VirtualSites,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Bonds => "Bonds",
            Self::Angles => "Angles",
            Self::ProperTorsions => "ProperTorsions",
            Self::ImproperTorsions => "ImproperTorsions",
            Self::RbTorsions => "RBTorsions",
            Self::Vdw => "vdW",
            Self::Buckingham => "Buckingham-6",
            Self::Electrostatics => "Electrostatics",
            Self::VirtualSites => "VirtualSites",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Ordered tuple of atom indices naming one physical interaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct TopologyKey {
    atom_indices: Vec<usize>,
}

impl TopologyKey {
    pub fn new(atom_indices: impl Into<Vec<usize>>) -> Self {
        Self {
            atom_indices: atom_indices.into(),
        }
    }

    pub fn bond(i: usize, j: usize) -> Self {
        Self::new([i, j])
    }

    pub fn angle(i: usize, j: usize, k: usize) -> Self {
        Self::new([i, j, k])
    }

    pub fn torsion(i: usize, j: usize, k: usize, l: usize) -> Self {
        Self::new([i, j, k, l])
    }

    pub fn atom_indices(&self) -> &[usize] {
        &self.atom_indices
    }

    pub fn len(&self) -> usize {
        self.atom_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atom_indices.is_empty()
    }

    pub fn reversed(&self) -> Self {
        Self {
            atom_indices: self.atom_indices.iter().rev().copied().collect(),
        }
    }

    pub fn is_palindrome(&self) -> bool {
        self.atom_indices
            .iter()
            .eq(self.atom_indices.iter().rev())
    }
}

impl fmt::Display for TopologyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.atom_indices)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("Unsupported virtual site kind '{0}'")]
    UnsupportedKind(String),
    #[error("Virtual site kind {kind} requires {expected} parent atoms, got {actual}")]
    ParentCount {
        kind: VirtualSiteKind,
        expected: usize,
        actual: usize,
    },
    #[error("Virtual site parent atoms must be distinct, got {0:?}")]
    RepeatedParent(Vec<usize>),
}

/// The virtual-site geometries that can be expressed in the target format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum VirtualSiteKind {
    BondCharge,
    MonovalentLonePair,
    DivalentLonePair,
}

impl VirtualSiteKind {
    pub fn parent_count(self) -> usize {
        match self {
            Self::BondCharge => 2,
            Self::MonovalentLonePair | Self::DivalentLonePair => 3,
        }
    }
}

impl fmt::Display for VirtualSiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::BondCharge => "BondCharge",
                Self::MonovalentLonePair => "MonovalentLonePair",
                Self::DivalentLonePair => "DivalentLonePair",
            }
        )
    }
}

impl FromStr for VirtualSiteKind {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BondCharge" => Ok(Self::BondCharge),
            "MonovalentLonePair" => Ok(Self::MonovalentLonePair),
            "DivalentLonePair" => Ok(Self::DivalentLonePair),
            _ => Err(KeyError::UnsupportedKind(s.to_string())),
        }
    }
}

impl TryFrom<String> for VirtualSiteKind {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Identity of a constructed (massless) particle placed relative to parent atoms.
///
/// The parent order is kept exactly as declared; the first parent is the anchor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualSiteKey {
    name: String,
    kind: VirtualSiteKind,
    parents: Vec<usize>,
}

impl VirtualSiteKey {
    pub fn new(
        name: impl Into<String>,
        kind: VirtualSiteKind,
        parents: impl Into<Vec<usize>>,
    ) -> Result<Self, KeyError> {
        let parents = parents.into();
        if parents.len() != kind.parent_count() {
            return Err(KeyError::ParentCount {
                kind,
                expected: kind.parent_count(),
                actual: parents.len(),
            });
        }
        for (i, a) in parents.iter().enumerate() {
            if parents[i + 1..].contains(a) {
                return Err(KeyError::RepeatedParent(parents));
            }
        }
        Ok(Self {
            name: name.into(),
            kind,
            parents,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> VirtualSiteKind {
        self.kind
    }

    pub fn parents(&self) -> &[usize] {
        &self.parents
    }
}

impl fmt::Display for VirtualSiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' on atoms {:?}", self.kind, self.name, self.parents)
    }
}

/// A particle that can carry nonbonded parameters: a real atom or a virtual site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParticleKey {
    Atom(usize),
    VirtualSite(VirtualSiteKey),
}

impl fmt::Display for ParticleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(index) => write!(f, "atom {}", index),
            Self::VirtualSite(key) => write!(f, "{}", key),
        }
    }
}

/// Opaque identifier of a parameter set within one category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PotentialKey {
    pub id: String,
    pub category: Category,
}

impl PotentialKey {
    pub fn new(id: impl Into<String>, category: Category) -> Self {
        Self {
            id: id.into(),
            category,
        }
    }
}

impl fmt::Display for PotentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_key_reversed_flips_order() {
        let key = TopologyKey::angle(3, 1, 2);
        assert_eq!(key.reversed(), TopologyKey::angle(2, 1, 3));
        assert_eq!(key.reversed().reversed(), key);
    }

    #[test]
    fn topology_key_palindrome_detection() {
        assert!(TopologyKey::angle(1, 0, 1).is_palindrome());
        assert!(!TopologyKey::bond(0, 1).is_palindrome());
    }

    #[test]
    fn virtual_site_kind_parses_supported_names() {
        assert_eq!(
            "BondCharge".parse::<VirtualSiteKind>().unwrap(),
            VirtualSiteKind::BondCharge
        );
        assert_eq!(
            "DivalentLonePair".parse::<VirtualSiteKind>().unwrap(),
            VirtualSiteKind::DivalentLonePair
        );
    }

    #[test]
    fn virtual_site_kind_rejects_unsupported_geometry() {
        assert_eq!(
            "TrivalentLonePair".parse::<VirtualSiteKind>(),
            Err(KeyError::UnsupportedKind("TrivalentLonePair".to_string()))
        );
    }

    #[test]
    fn virtual_site_key_validates_parent_count() {
        let err = VirtualSiteKey::new("EP", VirtualSiteKind::BondCharge, vec![0, 1, 2]);
        assert_eq!(
            err,
            Err(KeyError::ParentCount {
                kind: VirtualSiteKind::BondCharge,
                expected: 2,
                actual: 3
            })
        );
        assert!(VirtualSiteKey::new("EP", VirtualSiteKind::DivalentLonePair, vec![0, 1, 2]).is_ok());
    }

    #[test]
    fn virtual_site_key_rejects_repeated_parents() {
        let err = VirtualSiteKey::new("EP", VirtualSiteKind::MonovalentLonePair, vec![0, 1, 0]);
        assert!(matches!(err, Err(KeyError::RepeatedParent(_))));
    }

    #[test]
    fn virtual_site_key_preserves_declared_parent_order() {
        let key = VirtualSiteKey::new("EP", VirtualSiteKind::BondCharge, vec![5, 2]).unwrap();
        assert_eq!(key.parents(), &[5, 2]);
    }

    #[test]
    fn category_names_match_handler_names() {
        assert_eq!(Category::Vdw.to_string(), "vdW");
        assert_eq!(Category::Buckingham.to_string(), "Buckingham-6");
        assert_eq!(Category::RbTorsions.to_string(), "RBTorsions");
    }
}
