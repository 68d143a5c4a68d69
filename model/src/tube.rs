//! The tube: top-level population container and single mutator of the
//! partner relation.
//!
//! Strands and domains are created once at tube construction and never
//! destroyed. Complexes merge when a new hybridization or stacking edge
//! joins two of them (the survivor keeps the lower id) and split when an
//! edge removal disconnects them (the surviving component keeps the lower
//! id; the detached component gets a fresh one). Merge is incremental;
//! split detection is a bounded BFS from the two endpoints of the removed
//! edge — connected-component data is never rebuilt globally.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::complex::{Complex, RemovedPairs};
use crate::domain::{Domain, DomainStore};
use crate::error::ModelError;
use crate::fingerprint::StateFingerprint;
use crate::ids::{ComplexId, DomainEnd, DomainId, StackingJunction, StrandId};
use crate::strand::{StrandDef, StrandStore};

/// Avogadro's number, per mol.
pub const N_AVOGADRO: f64 = 6.022e23;

/// Domain-species complementarity map.
///
/// The default convention is case-swap of the species name (`"A"` ↔
/// `"a"`); a non-default map may be supplied. A species may never be its
/// own complement: self-binding within one species is rejected at
/// construction.
#[derive(Debug, Clone, Default)]
pub struct PairingMap {
    map: BTreeMap<String, String>,
}

impl PairingMap {
    /// Build from an explicit map.
    ///
    /// # Errors
    ///
    /// [`ModelError::SelfComplementarySpecies`] if any `k == map[k]`.
    pub fn new(map: BTreeMap<String, String>) -> Result<Self, ModelError> {
        for (species, complement) in &map {
            if species == complement {
                return Err(ModelError::SelfComplementarySpecies {
                    species: species.clone(),
                });
            }
        }
        Ok(Self { map })
    }

    /// Build the default case-swap map for the given species set.
    ///
    /// # Errors
    ///
    /// [`ModelError::SelfComplementarySpecies`] for species with no case
    /// to swap (e.g. `"5"`), which would bind themselves.
    pub fn case_swap<'a>(species: impl IntoIterator<Item = &'a str>) -> Result<Self, ModelError> {
        let mut map = BTreeMap::new();
        for s in species {
            let swapped = if s == s.to_uppercase() {
                s.to_lowercase()
            } else {
                s.to_uppercase()
            };
            map.insert(s.to_string(), swapped);
        }
        Self::new(map)
    }

    /// The declared complement of a species, if any.
    #[must_use]
    pub fn complement(&self, species: &str) -> Option<&str> {
        self.map.get(species).map(String::as_str)
    }

    /// Iterate `(species, complement)` entries in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Top-level container: volume, population, complexes, global counters.
#[derive(Debug, Clone)]
pub struct Tube {
    volume_liters: f64,
    domains: DomainStore,
    strands: StrandStore,
    complexes: BTreeMap<ComplexId, Complex>,
    next_complex: u32,
    pairing: PairingMap,
    /// Global index: species name → domain ids in creation order.
    domains_by_species: BTreeMap<String, Vec<DomainId>>,
    n_domains_hybridized: u64,
    n_strands_hybridized: u64,
    n_steps: u64,
    n_changes: u64,
}

impl Tube {
    /// Build a tube from strand definitions. Every strand starts as a
    /// singleton complex.
    ///
    /// # Errors
    ///
    /// Propagates pairing-map validation failures; additionally rejects a
    /// supplied map that self-pairs any species present in the population.
    pub fn new(
        volume_liters: f64,
        defs: &[StrandDef],
        pairing: PairingMap,
    ) -> Result<Self, ModelError> {
        let mut tube = Self {
            volume_liters,
            domains: DomainStore::default(),
            strands: StrandStore::default(),
            complexes: BTreeMap::new(),
            next_complex: 0,
            pairing,
            domains_by_species: BTreeMap::new(),
            n_domains_hybridized: 0,
            n_strands_hybridized: 0,
            n_steps: 0,
            n_changes: 0,
        };

        for def in defs {
            let cid = tube.alloc_complex_id();
            #[allow(clippy::cast_possible_truncation)]
            let sid = StrandId(tube.strands.len() as u32);

            let mut domain_ids = Vec::with_capacity(def.domains.len());
            for dd in &def.domains {
                let did = tube
                    .domains
                    .push(dd.species.as_str(), dd.sequence.as_str(), sid);
                tube.domains_by_species
                    .entry(dd.species.clone())
                    .or_default()
                    .push(did);
                domain_ids.push(did);
            }
            // Backbone wiring, 5′ → 3′ along the definition order.
            for (i, &did) in domain_ids.iter().enumerate() {
                let five = if i > 0 { Some(domain_ids[i - 1]) } else { None };
                let three = domain_ids.get(i + 1).copied();
                tube.domains.get_mut(did).set_neighbors(five, three);
            }

            let pushed = tube.strands.push(def.species.as_str(), domain_ids, cid);
            debug_assert_eq!(pushed, sid);

            let mut complex = Complex::new(cid);
            complex.add_strand(tube.strands.get(sid), &tube.domains);
            tube.complexes.insert(cid, complex);
        }

        for species in tube.domains_by_species.keys() {
            if tube.pairing.complement(species) == Some(species) {
                return Err(ModelError::SelfComplementarySpecies {
                    species: species.clone(),
                });
            }
        }

        Ok(tube)
    }

    fn alloc_complex_id(&mut self) -> ComplexId {
        let id = ComplexId(self.next_complex);
        self.next_complex += 1;
        id
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Tube volume in liters.
    #[must_use]
    pub fn volume_liters(&self) -> f64 {
        self.volume_liters
    }

    /// The molar concentration equivalent of one molecule: `1/(N_A·V)`.
    #[must_use]
    pub fn per_molecule_concentration(&self) -> f64 {
        1.0 / (N_AVOGADRO * self.volume_liters)
    }

    /// The domain arena.
    #[must_use]
    pub fn domains(&self) -> &DomainStore {
        &self.domains
    }

    /// The strand arena.
    #[must_use]
    pub fn strands(&self) -> &StrandStore {
        &self.strands
    }

    /// Live complexes by id.
    #[must_use]
    pub fn complexes(&self) -> &BTreeMap<ComplexId, Complex> {
        &self.complexes
    }

    /// The complementarity map.
    #[must_use]
    pub fn pairing(&self) -> &PairingMap {
        &self.pairing
    }

    /// One domain record.
    #[must_use]
    pub fn domain(&self, id: DomainId) -> &Domain {
        self.domains.get(id)
    }

    /// The complex a domain currently belongs to.
    #[must_use]
    pub fn complex_of_domain(&self, id: DomainId) -> ComplexId {
        self.strands.get(self.domains.get(id).strand()).complex()
    }

    /// All domain ids of a species, in creation order. Empty for unknown
    /// species.
    #[must_use]
    pub fn domains_of_species(&self, species: &str) -> &[DomainId] {
        self.domains_by_species
            .get(species)
            .map_or(&[], Vec::as_slice)
    }

    /// Total domain population.
    #[must_use]
    pub fn n_domains(&self) -> usize {
        self.domains.len()
    }

    /// Total strand population.
    #[must_use]
    pub fn n_strands(&self) -> usize {
        self.strands.len()
    }

    /// Currently hybridized domains (maintained incrementally).
    #[must_use]
    pub fn n_domains_hybridized(&self) -> u64 {
        self.n_domains_hybridized
    }

    /// Currently hybridized strands (any domain paired).
    #[must_use]
    pub fn n_strands_hybridized(&self) -> u64 {
        self.n_strands_hybridized
    }

    /// Steps taken so far.
    #[must_use]
    pub fn n_steps(&self) -> u64 {
        self.n_steps
    }

    /// Accepted state changes (hybridizations + dehybridizations).
    #[must_use]
    pub fn n_changes(&self) -> u64 {
        self.n_changes
    }

    /// Record one simulation step.
    pub fn note_step(&mut self) {
        self.n_steps += 1;
    }

    /// Whether any domain of the strand is hybridized.
    #[must_use]
    pub fn strand_is_hybridized(&self, id: StrandId) -> bool {
        self.strands
            .get(id)
            .domains()
            .iter()
            .any(|&d| self.domains.get(d).is_hybridized())
    }

    /// State fingerprint of a complex.
    ///
    /// # Errors
    ///
    /// [`ModelError::Invariant`] for a dangling complex id.
    pub fn complex_state_fingerprint(
        &mut self,
        id: ComplexId,
    ) -> Result<StateFingerprint, ModelError> {
        let domains = &self.domains;
        self.complexes
            .get_mut(&id)
            .map(|c| c.state_fingerprint(domains))
            .ok_or_else(|| ModelError::Invariant {
                detail: format!("complex {id} is not live"),
            })
    }

    // -----------------------------------------------------------------------
    // Mutators
    // -----------------------------------------------------------------------

    /// Hybridize two complementary, unpaired domains.
    ///
    /// Sets the reciprocal partner relation, merges complexes if the two
    /// domains lived in different ones (survivor = lower id), records the
    /// hybridization edge, and bumps the global counters.
    ///
    /// # Errors
    ///
    /// [`ModelError::AlreadyPaired`] or [`ModelError::NotComplementary`]
    /// on precondition failure; [`ModelError::Invariant`] on internal
    /// bookkeeping drift.
    pub fn hybridize(&mut self, a: DomainId, b: DomainId) -> Result<(), ModelError> {
        if self.domains.get(a).is_hybridized() {
            return Err(ModelError::AlreadyPaired { domain: a });
        }
        if self.domains.get(b).is_hybridized() {
            return Err(ModelError::AlreadyPaired { domain: b });
        }
        let species_a = self.domains.get(a).species();
        let species_b = self.domains.get(b).species();
        if self.pairing.complement(species_a) != Some(species_b) {
            return Err(ModelError::NotComplementary { first: a, second: b });
        }

        let sa = self.domains.get(a).strand();
        let sb = self.domains.get(b).strand();
        let newly_hybridized_strands = [sa, sb]
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter(|&s| !self.strand_is_hybridized(s))
            .count() as u64;

        self.domains.get_mut(a).set_partner(Some(b));
        self.domains.get_mut(b).set_partner(Some(a));
        self.n_domains_hybridized += 2;
        self.n_strands_hybridized += newly_hybridized_strands;

        let ca = self.strands.get(sa).complex();
        let cb = self.strands.get(sb).complex();
        let home = if ca == cb {
            ca
        } else {
            self.merge_complexes(ca, cb)?
        };

        let domains = &self.domains;
        let complex = self.complexes.get_mut(&home).ok_or_else(|| ModelError::Invariant {
            detail: format!("complex {home} vanished during hybridize"),
        })?;
        complex.add_hybridization_edge(a, b, domains)?;

        self.n_changes += 1;
        Ok(())
    }

    /// Dissociate a hybridized pair.
    ///
    /// Removes the edge, clears the reciprocal partner relation, and tests
    /// the remaining interaction graph for connectedness; a detached
    /// component moves to a freshly allocated complex.
    ///
    /// # Errors
    ///
    /// [`ModelError::NotPaired`] if the two domains are not partners;
    /// [`ModelError::Invariant`] on internal bookkeeping drift.
    pub fn dehybridize(&mut self, a: DomainId, b: DomainId) -> Result<(), ModelError> {
        if self.domains.get(a).partner() != Some(b) {
            return Err(ModelError::NotPaired { domain: a });
        }
        if self.domains.get(b).partner() != Some(a) {
            return Err(ModelError::NotPaired { domain: b });
        }

        let cid = self.complex_of_domain(a);
        if self.complex_of_domain(b) != cid {
            return Err(ModelError::Invariant {
                detail: format!("partners {a} and {b} live in different complexes"),
            });
        }

        {
            let domains = &self.domains;
            let complex = self.complexes.get_mut(&cid).ok_or_else(|| ModelError::Invariant {
                detail: format!("complex {cid} is not live"),
            })?;
            complex.remove_hybridization_edge(a, b, domains)?;
        }

        let sa = self.domains.get(a).strand();
        let sb = self.domains.get(b).strand();
        self.domains.get_mut(a).set_partner(None);
        self.domains.get_mut(b).set_partner(None);
        self.n_domains_hybridized -= 2;
        let no_longer_hybridized = [sa, sb]
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter(|&s| !self.strand_is_hybridized(s))
            .count() as u64;
        self.n_strands_hybridized -= no_longer_hybridized;

        self.split_if_disconnected(cid, a, b)?;

        self.n_changes += 1;
        Ok(())
    }

    /// Stack two duplex ends (one junction, two ordered edges).
    ///
    /// Merges complexes like [`Tube::hybridize`] when the junction bridges
    /// two of them.
    ///
    /// # Errors
    ///
    /// [`ModelError::StackingEdgeConflict`] when an involved end is
    /// already stacked.
    pub fn stack(&mut self, junction: StackingJunction) -> Result<(), ModelError> {
        for (from, to) in junction.ordered_pairs() {
            if self.domains.get(from).stacking_partner(DomainEnd::End3p).is_some() {
                return Err(ModelError::StackingEdgeConflict {
                    detail: format!("3' end of {from} is already stacked"),
                });
            }
            if self.domains.get(to).stacking_partner(DomainEnd::End5p).is_some() {
                return Err(ModelError::StackingEdgeConflict {
                    detail: format!("5' end of {to} is already stacked"),
                });
            }
        }

        let mut involved: BTreeSet<ComplexId> = BTreeSet::new();
        for (from, to) in junction.ordered_pairs() {
            involved.insert(self.complex_of_domain(from));
            involved.insert(self.complex_of_domain(to));
        }
        let mut iter = involved.into_iter();
        let mut home = iter.next().ok_or_else(|| ModelError::Invariant {
            detail: "stack junction with no complexes".to_string(),
        })?;
        for other in iter {
            home = self.merge_complexes(home, other)?;
        }

        for (from, to) in junction.ordered_pairs() {
            self.domains.get_mut(from).set_stacking(DomainEnd::End3p, Some(to));
            self.domains.get_mut(to).set_stacking(DomainEnd::End5p, Some(from));
        }

        let domains = &self.domains;
        let complex = self.complexes.get_mut(&home).ok_or_else(|| ModelError::Invariant {
            detail: format!("complex {home} vanished during stack"),
        })?;
        complex.add_stacking_edges(junction, domains)?;
        Ok(())
    }

    /// Remove one stack junction, splitting the complex if it was the
    /// last connection between the two sides.
    ///
    /// # Errors
    ///
    /// [`ModelError::StackingEdgeConflict`] if the junction is not
    /// currently stacked as claimed.
    pub fn unstack(&mut self, junction: StackingJunction) -> Result<(), ModelError> {
        for (from, to) in junction.ordered_pairs() {
            if self.domains.get(from).stacking_partner(DomainEnd::End3p) != Some(to) {
                return Err(ModelError::StackingEdgeConflict {
                    detail: format!("pair {from} -> {to} is not stacked"),
                });
            }
        }

        let cid = self.complex_of_domain(junction.h1_end3p);
        {
            let domains = &self.domains;
            let complex = self.complexes.get_mut(&cid).ok_or_else(|| ModelError::Invariant {
                detail: format!("complex {cid} is not live"),
            })?;
            complex.remove_stacking_edges(junction, domains)?;
        }

        for (from, to) in junction.ordered_pairs() {
            self.domains.get_mut(from).set_stacking(DomainEnd::End3p, None);
            self.domains.get_mut(to).set_stacking(DomainEnd::End5p, None);
        }

        // Both removed edges bridge the same two duplex sides, so at most
        // one component can detach.
        self.split_if_disconnected(cid, junction.h1_end3p, junction.h2_end5p)?;
        Ok(())
    }

    fn merge_complexes(&mut self, x: ComplexId, y: ComplexId) -> Result<ComplexId, ModelError> {
        let (keep, drop_id) = if x < y { (x, y) } else { (y, x) };
        let absorbed = self.complexes.remove(&drop_id).ok_or_else(|| ModelError::Invariant {
            detail: format!("complex {drop_id} is not live"),
        })?;
        for &sid in absorbed.strands() {
            self.strands.get_mut(sid).set_complex(keep);
        }
        let domains = &self.domains;
        let strands = &self.strands;
        let survivor = self.complexes.get_mut(&keep).ok_or_else(|| ModelError::Invariant {
            detail: format!("complex {keep} is not live"),
        })?;
        survivor.absorb(&absorbed, strands, domains);
        Ok(keep)
    }

    /// After removing an edge between `anchor` and `probe`, detach the
    /// probe-side component if the two are no longer connected. Returns
    /// the fresh complex id if a split happened.
    fn split_if_disconnected(
        &mut self,
        cid: ComplexId,
        anchor: DomainId,
        probe: DomainId,
    ) -> Result<Option<ComplexId>, ModelError> {
        let anchor_side = self.interaction_component(anchor);
        if anchor_side.contains(&probe) {
            return Ok(None);
        }

        let probe_side = self.interaction_component(probe);
        let moving_strands: BTreeSet<StrandId> = probe_side
            .iter()
            .map(|&d| self.domains.get(d).strand())
            .collect();

        let fresh = self.alloc_complex_id();
        let mut detached = Complex::new(fresh);
        let mut moved = RemovedPairs::default();
        {
            let domains = &self.domains;
            let old = self.complexes.get_mut(&cid).ok_or_else(|| ModelError::Invariant {
                detail: format!("complex {cid} is not live"),
            })?;
            for &sid in &moving_strands {
                let removed = old.remove_strand(self.strands.get(sid), domains)?;
                moved.hybridization.extend(removed.hybridization);
                moved.stacking.extend(removed.stacking);
            }
        }
        for &sid in &moving_strands {
            self.strands.get_mut(sid).set_complex(fresh);
        }
        {
            let domains = &self.domains;
            for &sid in &moving_strands {
                detached.add_strand(self.strands.get(sid), domains);
            }
            debug_assert!(
                moved
                    .hybridization
                    .iter()
                    .flat_map(|&(p, q)| [p, q])
                    .chain(moved.stacking.iter().flat_map(|&(p, q)| [p, q]))
                    .all(|d| probe_side.contains(&d)),
                "a pair crossing the split boundary should have kept the complex connected"
            );
            detached.adopt_pairs(&moved, domains);
        }
        self.complexes.insert(fresh, detached);
        Ok(Some(fresh))
    }

    // -----------------------------------------------------------------------
    // Graph queries
    // -----------------------------------------------------------------------

    /// The connected component of a domain under backbone ∪ hybridization
    /// ∪ stacking, by breadth-first traversal.
    #[must_use]
    pub fn interaction_component(&self, start: DomainId) -> BTreeSet<DomainId> {
        let mut visited = BTreeSet::new();
        visited.insert(start);
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            for neighbor in self.domains.get(node).interaction_neighbors() {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        visited
    }

    /// Hop distance between two domains in the interaction graph, or
    /// `None` if `b` is unreachable from `a` within `cap` hops.
    #[must_use]
    pub fn domain_distance(&self, a: DomainId, b: DomainId, cap: u32) -> Option<u32> {
        if a == b {
            return Some(0);
        }
        let mut visited = BTreeSet::new();
        visited.insert(a);
        let mut frontier = vec![a];
        for hop in 1..=cap {
            let mut next = Vec::new();
            for &node in &frontier {
                for neighbor in self.domains.get(node).interaction_neighbors() {
                    if neighbor == b {
                        return Some(hop);
                    }
                    if visited.insert(neighbor) {
                        next.push(neighbor);
                    }
                }
            }
            if next.is_empty() {
                return None;
            }
            frontier = next;
        }
        None
    }

    /// Whether a complex's members form one connected component.
    #[must_use]
    pub fn is_complex_connected(&self, id: ComplexId) -> bool {
        let Some(complex) = self.complexes.get(&id) else {
            return false;
        };
        let members: BTreeSet<DomainId> = complex.member_domains().into_iter().collect();
        let Some(&first) = members.first() else {
            return true;
        };
        self.interaction_component(first) == members
    }

    /// Recount hybridized domains from scratch (diagnostic).
    #[must_use]
    pub fn recount_hybridized_domains(&self) -> u64 {
        self.domains.iter().filter(|d| d.is_hybridized()).count() as u64
    }

    /// Recount hybridized strands from scratch (diagnostic).
    #[must_use]
    pub fn recount_hybridized_strands(&self) -> u64 {
        self.strands
            .iter()
            .filter(|s| s.domains().iter().any(|&d| self.domains.get(d).is_hybridized()))
            .count() as u64
    }

    /// Check the incremental counters, the partner reciprocity relation,
    /// and per-complex species counters against a full recount.
    ///
    /// # Errors
    ///
    /// [`ModelError::Invariant`] with a description of the first drift
    /// found.
    pub fn verify_counters(&self) -> Result<(), ModelError> {
        let recount = self.recount_hybridized_domains();
        if recount % 2 != 0 {
            return Err(ModelError::Invariant {
                detail: format!("odd number of hybridized domains: {recount}"),
            });
        }
        if recount != self.n_domains_hybridized {
            return Err(ModelError::Invariant {
                detail: format!(
                    "hybridized-domain counter drift: counted {recount}, cached {}",
                    self.n_domains_hybridized
                ),
            });
        }
        let strand_recount = self.recount_hybridized_strands();
        if strand_recount != self.n_strands_hybridized {
            return Err(ModelError::Invariant {
                detail: format!(
                    "hybridized-strand counter drift: counted {strand_recount}, cached {}",
                    self.n_strands_hybridized
                ),
            });
        }
        for domain in self.domains.iter() {
            if let Some(partner) = domain.partner() {
                if self.domains.get(partner).partner() != Some(domain.id()) {
                    return Err(ModelError::Invariant {
                        detail: format!(
                            "asymmetric partner relation: {} -> {partner}",
                            domain.id()
                        ),
                    });
                }
            }
        }
        for (id, complex) in &self.complexes {
            if !complex.species_counts_consistent(&self.domains, &self.strands) {
                return Err(ModelError::Invariant {
                    detail: format!("species counter drift in {id}"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complex::IcidMode;
    use crate::strand::DomainDef;

    fn duplex_defs() -> Vec<StrandDef> {
        vec![
            StrandDef::new("top", vec![DomainDef::new("A", "GCTAGGCATTCTGCAA")]),
            StrandDef::new("bot", vec![DomainDef::new("a", "TTGCAGAATGCCTAGC")]),
        ]
    }

    fn duplex_tube() -> Tube {
        let pairing = PairingMap::case_swap(["A", "a"]).unwrap();
        Tube::new(1e-15, &duplex_defs(), pairing).unwrap()
    }

    #[test]
    fn construction_makes_singleton_complexes() {
        let tube = duplex_tube();
        assert_eq!(tube.complexes().len(), 2);
        assert_eq!(tube.n_domains(), 2);
        assert_eq!(tube.n_strands(), 2);
        assert!(tube.is_complex_connected(ComplexId(0)));
        tube.verify_counters().unwrap();
    }

    #[test]
    fn per_molecule_concentration_matches_definition() {
        let tube = duplex_tube();
        let c = tube.per_molecule_concentration();
        assert!((c - 1.0 / (N_AVOGADRO * 1e-15)).abs() < 1e-24);
    }

    #[test]
    fn self_complementary_pairing_rejected() {
        let mut map = BTreeMap::new();
        map.insert("P".to_string(), "P".to_string());
        let err = PairingMap::new(map).unwrap_err();
        assert!(matches!(err, ModelError::SelfComplementarySpecies { .. }));
    }

    #[test]
    fn hybridize_merges_into_lower_id() {
        let mut tube = duplex_tube();
        tube.hybridize(DomainId(0), DomainId(1)).unwrap();

        assert_eq!(tube.complexes().len(), 1);
        assert!(tube.complexes().contains_key(&ComplexId(0)));
        assert_eq!(tube.complex_of_domain(DomainId(1)), ComplexId(0));
        assert_eq!(tube.domain(DomainId(0)).partner(), Some(DomainId(1)));
        assert_eq!(tube.domain(DomainId(1)).partner(), Some(DomainId(0)));
        assert_eq!(tube.n_domains_hybridized(), 2);
        assert_eq!(tube.n_strands_hybridized(), 2);
        assert_eq!(tube.n_changes(), 1);
        tube.verify_counters().unwrap();
    }

    #[test]
    fn dehybridize_splits_with_fresh_id_for_detached_component() {
        let mut tube = duplex_tube();
        tube.hybridize(DomainId(0), DomainId(1)).unwrap();
        tube.dehybridize(DomainId(0), DomainId(1)).unwrap();

        assert_eq!(tube.complexes().len(), 2);
        // Surviving component keeps the lower id; the detached one is fresh.
        assert!(tube.complexes().contains_key(&ComplexId(0)));
        assert!(tube.complexes().contains_key(&ComplexId(2)));
        assert_eq!(tube.n_domains_hybridized(), 0);
        assert_eq!(tube.n_strands_hybridized(), 0);
        assert_eq!(tube.n_changes(), 2);
        tube.verify_counters().unwrap();
    }

    #[test]
    fn hybridize_rejects_non_complementary_and_paired() {
        let mut tube = duplex_tube();
        let err = tube.hybridize(DomainId(0), DomainId(0)).unwrap_err();
        assert!(matches!(err, ModelError::NotComplementary { .. }));

        tube.hybridize(DomainId(0), DomainId(1)).unwrap();
        let err = tube.hybridize(DomainId(0), DomainId(1)).unwrap_err();
        assert!(matches!(err, ModelError::AlreadyPaired { .. }));
    }

    #[test]
    fn edge_round_trip_restores_fingerprint() {
        let mut tube = duplex_tube();
        tube.hybridize(DomainId(0), DomainId(1)).unwrap();
        let home = tube.complex_of_domain(DomainId(0));
        let hybridized_fp = tube.complex_state_fingerprint(home).unwrap();

        tube.dehybridize(DomainId(0), DomainId(1)).unwrap();
        tube.hybridize(DomainId(0), DomainId(1)).unwrap();
        let rejoined = tube.complex_of_domain(DomainId(0));
        assert_eq!(
            tube.complex_state_fingerprint(rejoined).unwrap(),
            hybridized_fp,
            "re-forming the same duplex must reproduce the fingerprint"
        );
    }

    /// Two copies of strand species S = [A, a], hybridized into a
    /// symmetric ring: species-level icids cannot disambiguate the copies
    /// at any radius, so the complex must fall back to instance icids.
    #[test]
    fn symmetric_ring_falls_back_to_instance_icids() {
        let defs = vec![
            StrandDef::new(
                "S",
                vec![DomainDef::new("A", "GCTAGGCA"), DomainDef::new("a", "TGCCTAGC")],
            ),
            StrandDef::new(
                "S",
                vec![DomainDef::new("A", "GCTAGGCA"), DomainDef::new("a", "TGCCTAGC")],
            ),
        ];
        let pairing = PairingMap::case_swap(["A", "a"]).unwrap();
        let mut tube = Tube::new(1e-15, &defs, pairing).unwrap();

        // S1.A (D0) ↔ S2.a (D3) and S2.A (D2) ↔ S1.a (D1).
        tube.hybridize(DomainId(0), DomainId(3)).unwrap();
        tube.hybridize(DomainId(2), DomainId(1)).unwrap();

        let home = tube.complex_of_domain(DomainId(0));
        let fp0 = tube.complex_state_fingerprint(home).unwrap();
        assert_eq!(
            tube.complexes().get(&home).unwrap().icid_mode(),
            &IcidMode::Instance,
            "duplicate icids must trigger the instance fallback"
        );

        // Mutator + undo returns the same fingerprint; the ring stays one
        // complex because the second duplex still connects the strands.
        tube.dehybridize(DomainId(0), DomainId(3)).unwrap();
        let mid = tube.complex_state_fingerprint(home).unwrap();
        assert_ne!(mid, fp0);
        tube.hybridize(DomainId(0), DomainId(3)).unwrap();
        assert_eq!(tube.complex_state_fingerprint(home).unwrap(), fp0);
    }

    #[test]
    fn stack_and_unstack_merge_and_split() {
        // Two duplexes: (A·a) and (B·b), stacked end to end.
        let defs = vec![
            StrandDef::new("s1", vec![DomainDef::new("A", "GCTAGGCA")]),
            StrandDef::new("s2", vec![DomainDef::new("a", "TGCCTAGC")]),
            StrandDef::new("s3", vec![DomainDef::new("B", "ATCCGGTA")]),
            StrandDef::new("s4", vec![DomainDef::new("b", "TACCGGAT")]),
        ];
        let pairing = PairingMap::case_swap(["A", "a", "B", "b"]).unwrap();
        let mut tube = Tube::new(1e-15, &defs, pairing).unwrap();
        tube.hybridize(DomainId(0), DomainId(1)).unwrap();
        tube.hybridize(DomainId(2), DomainId(3)).unwrap();
        assert_eq!(tube.complexes().len(), 2);

        let junction = StackingJunction {
            h1_end3p: DomainId(0),
            h2_end5p: DomainId(2),
            h2_end3p: DomainId(3),
            h1_end5p: DomainId(1),
        };
        tube.stack(junction).unwrap();
        assert_eq!(tube.complexes().len(), 1, "stacking must merge the duplexes");
        let home = tube.complex_of_domain(DomainId(0));
        assert!(tube.is_complex_connected(home));

        tube.unstack(junction).unwrap();
        assert_eq!(tube.complexes().len(), 2, "unstacking must split again");
        tube.verify_counters().unwrap();
    }

    #[test]
    fn domain_distance_counts_interaction_hops() {
        let defs = vec![StrandDef::new(
            "chain",
            vec![
                DomainDef::new("A", "GCTAGGCA"),
                DomainDef::new("B", "ATCCGGTA"),
                DomainDef::new("C", "GGTACCAT"),
            ],
        )];
        let pairing = PairingMap::case_swap(["A", "B", "C"]).unwrap();
        let tube = Tube::new(1e-15, &defs, pairing).unwrap();

        assert_eq!(tube.domain_distance(DomainId(0), DomainId(2), 8), Some(2));
        assert_eq!(tube.domain_distance(DomainId(0), DomainId(0), 8), Some(0));
    }

    #[test]
    fn unreachable_domains_have_no_distance() {
        let tube = duplex_tube();
        assert_eq!(tube.domain_distance(DomainId(0), DomainId(1), 8), None);
    }
}
