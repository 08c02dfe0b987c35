use crate::core::models::system::Model;
use itertools::{Itertools, iproduct};
use std::collections::BTreeSet;

/// Adjacency view of the bonded graph, built once per export.
///
/// Neighbor lists are sorted so every enumeration below is deterministic.
#[derive(Debug, Clone)]
pub struct BondGraph {
    adjacency: Vec<Vec<usize>>,
    bonds: Vec<(usize, usize)>,
}

impl BondGraph {
    /// Builds the graph from `bonds` over `n_atoms` atoms.
    ///
    /// Self-bonds, out-of-range atoms and repeated bonds are ignored.
    pub fn new(n_atoms: usize, bonds: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut adjacency = vec![Vec::new(); n_atoms];
        let mut kept = Vec::new();
        for (a, b) in bonds {
            if a == b || a >= n_atoms || b >= n_atoms || adjacency[a].contains(&b) {
                continue;
            }
            adjacency[a].push(b);
            adjacency[b].push(a);
            kept.push((a, b));
        }
        for neighbors in &mut adjacency {
            neighbors.sort_unstable();
        }
        Self {
            adjacency,
            bonds: kept,
        }
    }

    pub fn from_model(model: &Model) -> Self {
        Self::new(
            model.n_atoms(),
            model.bonds().iter().map(|bond| (bond.atom1, bond.atom2)),
        )
    }

    pub fn n_atoms(&self) -> usize {
        self.adjacency.len()
    }

    pub fn neighbors(&self, atom: usize) -> &[usize] {
        self.adjacency.get(atom).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Bonds in declared order and direction.
    pub fn bonds(&self) -> &[(usize, usize)] {
        &self.bonds
    }

    pub fn are_bonded(&self, a: usize, b: usize) -> bool {
        self.neighbors(a).binary_search(&b).is_ok()
    }

    /// True when `a` and `b` are 1-2 or 1-3 neighbors.
    pub fn within_two_bonds(&self, a: usize, b: usize) -> bool {
        self.are_bonded(a, b)
            || self
                .neighbors(a)
                .iter()
                .any(|&middle| self.are_bonded(middle, b))
    }

    /// Every `(i, center, k)` with `i < k` both bonded to `center`.
    pub fn angles(&self) -> Vec<[usize; 3]> {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(center, neighbors)| {
                neighbors
                    .iter()
                    .tuple_combinations()
                    .map(move |(&i, &k)| [i, center, k])
            })
            .collect()
    }

    /// Every path `i-j-k-l` along a bond `(j, k)` with four distinct atoms.
    ///
    /// Each bond contributes paths in its declared direction only.
    pub fn propers(&self) -> Vec<[usize; 4]> {
        let mut propers = Vec::new();
        for &(j, k) in &self.bonds {
            let outer_j = self.neighbors(j).iter().filter(|&&i| i != k);
            let outer_k = self.neighbors(k).iter().filter(|&&l| l != j);
            for (&i, &l) in iproduct!(outer_j, outer_k) {
                if i != l {
                    propers.push([i, j, k, l]);
                }
            }
        }
        propers
    }

    /// One `(n0, center, n1, n2)` per atom with exactly three neighbors.
    pub fn impropers(&self) -> Vec<[usize; 4]> {
        self.adjacency
            .iter()
            .enumerate()
            .filter_map(|(center, neighbors)| match neighbors.as_slice() {
                &[n0, n1, n2] => Some([n0, center, n1, n2]),
                _ => None,
            })
            .collect()
    }

    /// Endpoints of every proper torsion that are not already 1-2 or 1-3
    /// neighbors, as sorted pairs, each listed once in ascending order.
    pub fn pairs_14(&self) -> Vec<(usize, usize)> {
        let pairs: BTreeSet<(usize, usize)> = self
            .propers()
            .into_iter()
            .map(|[i, _, _, l]| (i.min(l), i.max(l)))
            .filter(|&(a, b)| !self.within_two_bonds(a, b))
            .collect();
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn butane() -> BondGraph {
        BondGraph::new(4, [(0, 1), (1, 2), (2, 3)])
    }

    #[test]
    fn adjacency_is_symmetric_and_ignores_duplicates() {
        let graph = BondGraph::new(3, [(0, 1), (1, 0), (1, 2), (2, 2), (2, 7)]);
        assert_eq!(graph.neighbors(1), &[0, 2]);
        assert_eq!(graph.neighbors(0), &[1]);
        assert_eq!(graph.bonds(), &[(0, 1), (1, 2)]);
        assert!(graph.neighbors(9).is_empty());
    }

    #[test]
    fn water_has_one_angle_and_no_torsions() {
        let graph = BondGraph::new(3, [(0, 1), (0, 2)]);
        assert_eq!(graph.angles(), vec![[1, 0, 2]]);
        assert!(graph.propers().is_empty());
        assert!(graph.pairs_14().is_empty());
    }

    #[test]
    fn butane_chain_enumerates_one_proper_and_one_pair() {
        let graph = butane();
        assert_eq!(graph.angles(), vec![[0, 1, 2], [1, 2, 3]]);
        assert_eq!(graph.propers(), vec![[0, 1, 2, 3]]);
        assert_eq!(graph.pairs_14(), vec![(0, 3)]);
    }

    #[test]
    fn proper_follows_declared_bond_direction() {
        let graph = BondGraph::new(4, [(0, 1), (2, 1), (2, 3)]);
        assert_eq!(graph.propers(), vec![[3, 2, 1, 0]]);
    }

    #[test]
    fn trivalent_center_yields_improper_with_center_second() {
        // Formaldehyde-like: carbon 1 bonded to 0, 2, 3.
        let graph = BondGraph::new(4, [(1, 0), (1, 2), (1, 3)]);
        assert_eq!(graph.impropers(), vec![[0, 1, 2, 3]]);
        assert_eq!(butane().impropers(), Vec::<[usize; 4]>::new());
    }

    #[test]
    fn pair_reachable_by_two_paths_is_listed_once() {
        // Six-membered ring: 0-1-2-3 and 0-4-5-3 both reach (0, 3).
        let graph = BondGraph::new(6, [(0, 1), (1, 2), (2, 3), (0, 4), (4, 5), (5, 3)]);
        let pairs = graph.pairs_14();
        assert_eq!(pairs.iter().filter(|&&p| p == (0, 3)).count(), 1);
        assert!(pairs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn small_ring_excludes_close_neighbors_from_pairs() {
        // Cyclopropane carbons: every torsion endpoint is a 1-2 neighbor.
        let graph = BondGraph::new(3, [(0, 1), (1, 2), (2, 0)]);
        assert!(graph.propers().is_empty());

        // Cyclobutane: endpoints of i-j-k-l are bonded directly.
        let ring = BondGraph::new(4, [(0, 1), (1, 2), (2, 3), (3, 0)]);
        assert!(!ring.propers().is_empty());
        assert!(ring.pairs_14().is_empty());
    }

    #[test]
    fn within_two_bonds_detects_one_three_neighbors() {
        let graph = butane();
        assert!(graph.within_two_bonds(0, 2));
        assert!(!graph.within_two_bonds(0, 3));
    }
}
