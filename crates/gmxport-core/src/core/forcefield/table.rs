use super::params::{
    AngleParams, BondParams, BuckinghamParams, ChargeParams, LennardJonesParams, RbTorsionParams,
    TorsionParams, VirtualSiteParams,
};
use crate::core::models::keys::{Category, ParticleKey, PotentialKey, TopologyKey, VirtualSiteKey};
use std::collections::HashMap;
use std::hash::Hash;

/// Resolution table plus parameter storage for one interaction category.
///
/// Slots (site identity to parameter-set identity) keep their insertion order,
/// which is the order entries are emitted in. Lookups go through a hash index.
#[derive(Debug, Clone)]
pub struct CategoryTable<K, P> {
    category: Category,
    slots: Vec<(K, PotentialKey)>,
    slot_index: HashMap<K, usize>,
    potentials: HashMap<PotentialKey, P>,
}

impl<K, P> CategoryTable<K, P>
where
    K: Clone + Eq + Hash,
{
    pub fn new(category: Category) -> Self {
        Self {
            category,
            slots: Vec::new(),
            slot_index: HashMap::new(),
            potentials: HashMap::new(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Maps `key` to the parameter set `id`.
    ///
    /// Re-assigning an existing key replaces its target but keeps its position.
    pub fn assign(&mut self, key: K, id: &str) -> PotentialKey {
        let potential = PotentialKey::new(id, self.category);
        match self.slot_index.get(&key) {
            Some(&position) => self.slots[position].1 = potential.clone(),
            None => {
                self.slot_index.insert(key.clone(), self.slots.len());
                self.slots.push((key, potential.clone()));
            }
        }
        potential
    }

    /// Stores a parameter set under `id`, returning the previous one if any.
    pub fn insert_potential(&mut self, id: &str, params: P) -> Option<P> {
        self.potentials
            .insert(PotentialKey::new(id, self.category), params)
    }

    pub fn potential_key(&self, key: &K) -> Option<&PotentialKey> {
        self.slot_index
            .get(key)
            .map(|&position| &self.slots[position].1)
    }

    pub fn params(&self, potential: &PotentialKey) -> Option<&P> {
        self.potentials.get(potential)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.slot_index.contains_key(key)
    }

    pub fn slots(&self) -> impl Iterator<Item = (&K, &PotentialKey)> {
        self.slots.iter().map(|(key, potential)| (key, potential))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// A nonbonded category together with its global combination settings.
#[derive(Debug, Clone)]
pub struct NonbondedHandler<P> {
    pub table: CategoryTable<ParticleKey, P>,
    pub mixing_rule: String,
    /// Multiplier applied to 1-4 interactions.
    pub scale_14: f64,
}

impl<P> NonbondedHandler<P> {
    pub fn new(category: Category, mixing_rule: &str, scale_14: f64) -> Self {
        Self {
            table: CategoryTable::new(category),
            mixing_rule: mixing_rule.to_string(),
            scale_14,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElectrostaticsHandler {
    pub table: CategoryTable<ParticleKey, ChargeParams>,
    pub scale_14: f64,
}

impl ElectrostaticsHandler {
    pub fn new(scale_14: f64) -> Self {
        Self {
            table: CategoryTable::new(Category::Electrostatics),
            scale_14,
        }
    }
}

pub type BondTable = CategoryTable<TopologyKey, BondParams>;
pub type AngleTable = CategoryTable<TopologyKey, AngleParams>;
pub type TorsionTable = CategoryTable<TopologyKey, TorsionParams>;
pub type RbTorsionTable = CategoryTable<TopologyKey, RbTorsionParams>;
pub type VirtualSiteTable = CategoryTable<VirtualSiteKey, VirtualSiteParams>;

/// The full set of category tables of one model. Absent categories are `None`.
#[derive(Debug, Clone, Default)]
pub struct ForceField {
    pub bonds: Option<BondTable>,
    pub angles: Option<AngleTable>,
    pub proper_torsions: Option<TorsionTable>,
    pub improper_torsions: Option<TorsionTable>,
    pub rb_torsions: Option<RbTorsionTable>,
    pub vdw: Option<NonbondedHandler<LennardJonesParams>>,
    pub buckingham: Option<NonbondedHandler<BuckinghamParams>>,
    pub electrostatics: Option<ElectrostaticsHandler>,
    pub virtual_sites: Option<VirtualSiteTable>,
}

impl ForceField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, category: Category) -> bool {
        match category {
            Category::Bonds => self.bonds.is_some(),
            Category::Angles => self.angles.is_some(),
            Category::ProperTorsions => self.proper_torsions.is_some(),
            Category::ImproperTorsions => self.improper_torsions.is_some(),
            Category::RbTorsions => self.rb_torsions.is_some(),
            Category::Vdw => self.vdw.is_some(),
            Category::Buckingham => self.buckingham.is_some(),
            Category::Electrostatics => self.electrostatics.is_some(),
            Category::VirtualSites => self.virtual_sites.is_some(),
        }
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        Category::ALL.into_iter().filter(|c| self.has(*c))
    }

    /// Virtual-site keys in table order; empty when the category is absent.
    pub fn virtual_site_keys(&self) -> Vec<VirtualSiteKey> {
        self.virtual_sites
            .as_ref()
            .map(|table| table.slots().map(|(key, _)| key.clone()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::keys::VirtualSiteKind;
    use crate::core::models::units::{Quantity, Unit};

    fn charge(value: f64) -> ChargeParams {
        ChargeParams {
            charge: Quantity::new(value, Unit::ElementaryCharge),
        }
    }

    #[test]
    fn assign_preserves_insertion_order() {
        let mut table: CategoryTable<TopologyKey, ChargeParams> =
            CategoryTable::new(Category::Bonds);
        table.assign(TopologyKey::bond(2, 3), "b");
        table.assign(TopologyKey::bond(0, 1), "a");
        let keys: Vec<_> = table.slots().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![TopologyKey::bond(2, 3), TopologyKey::bond(0, 1)]);
    }

    #[test]
    fn reassigning_a_key_keeps_its_position() {
        let mut table: CategoryTable<ParticleKey, ChargeParams> =
            CategoryTable::new(Category::Electrostatics);
        table.assign(ParticleKey::Atom(0), "o");
        table.assign(ParticleKey::Atom(1), "h");
        table.assign(ParticleKey::Atom(0), "o2");

        assert_eq!(table.len(), 2);
        let first = table.slots().next().unwrap();
        assert_eq!(first.0, &ParticleKey::Atom(0));
        assert_eq!(first.1.id, "o2");
    }

    #[test]
    fn potential_lookup_uses_table_category() {
        let mut handler = ElectrostaticsHandler::new(0.8333);
        let pk = handler.table.assign(ParticleKey::Atom(0), "o");
        handler.table.insert_potential("o", charge(-0.8));

        assert_eq!(pk.category, Category::Electrostatics);
        assert_eq!(handler.table.potential_key(&ParticleKey::Atom(0)), Some(&pk));
        assert_eq!(handler.table.params(&pk), Some(&charge(-0.8)));
        assert_eq!(
            handler
                .table
                .params(&PotentialKey::new("o", Category::Vdw)),
            None
        );
    }

    #[test]
    fn force_field_reports_present_categories() {
        let mut ff = ForceField::new();
        ff.bonds = Some(CategoryTable::new(Category::Bonds));
        ff.electrostatics = Some(ElectrostaticsHandler::new(0.8333));

        assert!(ff.has(Category::Bonds));
        assert!(!ff.has(Category::Vdw));
        assert_eq!(
            ff.categories().collect::<Vec<_>>(),
            vec![Category::Bonds, Category::Electrostatics]
        );
    }

    #[test]
    fn virtual_site_keys_follow_table_order() {
        let mut table = VirtualSiteTable::new(Category::VirtualSites);
        let ep2 = VirtualSiteKey::new("EP2", VirtualSiteKind::BondCharge, vec![0, 1]).unwrap();
        let ep1 = VirtualSiteKey::new("EP1", VirtualSiteKind::BondCharge, vec![0, 2]).unwrap();
        table.assign(ep2.clone(), "vs");
        table.assign(ep1.clone(), "vs");

        let ff = ForceField {
            virtual_sites: Some(table),
            ..ForceField::default()
        };
        assert_eq!(ff.virtual_site_keys(), vec![ep2, ep1]);
        assert!(ForceField::new().virtual_site_keys().is_empty());
    }
}
