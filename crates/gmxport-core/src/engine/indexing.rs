use crate::core::models::keys::{ParticleKey, VirtualSiteKey};
use std::collections::HashMap;

/// Assigns output numbers to every particle of one export.
///
/// Real atoms keep their topology order starting at `origin`; virtual sites are
/// appended contiguously after the last atom in declaration order.
#[derive(Debug, Clone)]
pub struct IndexAssigner {
    origin: usize,
    n_atoms: usize,
    virtual_sites: Vec<VirtualSiteKey>,
    virtual_site_positions: HashMap<VirtualSiteKey, usize>,
}

impl IndexAssigner {
    /// Repeated virtual-site keys keep their first position.
    pub fn new(
        n_atoms: usize,
        virtual_site_keys: impl IntoIterator<Item = VirtualSiteKey>,
        origin: usize,
    ) -> Self {
        let mut virtual_sites = Vec::new();
        let mut virtual_site_positions = HashMap::new();
        for key in virtual_site_keys {
            if !virtual_site_positions.contains_key(&key) {
                virtual_site_positions.insert(key.clone(), virtual_sites.len());
                virtual_sites.push(key);
            }
        }
        Self {
            origin,
            n_atoms,
            virtual_sites,
            virtual_site_positions,
        }
    }

    pub fn origin(&self) -> usize {
        self.origin
    }

    pub fn n_atoms(&self) -> usize {
        self.n_atoms
    }

    pub fn n_particles(&self) -> usize {
        self.n_atoms + self.virtual_sites.len()
    }

    /// Output number of a real atom.
    pub fn atom(&self, atom: usize) -> usize {
        self.origin + atom
    }

    pub fn virtual_site(&self, key: &VirtualSiteKey) -> Option<usize> {
        self.virtual_site_positions
            .get(key)
            .map(|position| self.origin + self.n_atoms + position)
    }

    pub fn particle(&self, key: &ParticleKey) -> Option<usize> {
        match key {
            ParticleKey::Atom(atom) if *atom < self.n_atoms => Some(self.atom(*atom)),
            ParticleKey::Atom(_) => None,
            ParticleKey::VirtualSite(site) => self.virtual_site(site),
        }
    }

    /// Virtual sites with their output numbers, in declaration order.
    pub fn virtual_sites(&self) -> impl Iterator<Item = (&VirtualSiteKey, usize)> {
        let first = self.origin + self.n_atoms;
        self.virtual_sites
            .iter()
            .enumerate()
            .map(move |(position, key)| (key, first + position))
    }
}
