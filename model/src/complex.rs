//! Complexes: connected components of the interaction graph, with cached
//! state fingerprints.
//!
//! A complex tracks its strand membership, species multiplicities, and the
//! hybridization/stacking edge sets. The combined state fingerprint is the
//! cache key for anything derived from a complex's structural state; every
//! mutator invalidates the caches and, in debug builds, is wrapped by a
//! contract asserting that the fingerprint actually changed.
//!
//! Residual degeneracy is accepted: two isomorphic complexes with
//! interchangeable strand copies may produce the same fingerprint under
//! different physical embeddings. This module does not solve graph
//! isomorphism; the in-complex identifier (icid) machinery only
//! disambiguates species copies up to its traversal radius.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::domain::DomainStore;
use crate::error::ModelError;
use crate::fingerprint::{
    fingerprint_bytes, fingerprint_records, StateFingerprint, DOMAIN_COMPLEX_STATE,
    DOMAIN_HYBRIDIZATION, DOMAIN_ICID, DOMAIN_STACKING, DOMAIN_STRANDS,
};
use crate::ids::{ComplexId, DomainId, StackingJunction, StrandId};
use crate::strand::Strand;

/// Bound on the diagnostic history ring.
const HISTORY_CAP: usize = 100;

/// Default icid traversal radius, in interaction-graph hops.
const DEFAULT_ICID_RADIUS: u32 = 5;

/// How many radius doublings to try before falling back to instance icids.
const ICID_RADIUS_RETRIES: u32 = 3;

/// How in-complex identifiers are computed.
///
/// Species-level icids keep fingerprints comparable across complexes in
/// the same state (the cache-friendly default). Instance icids are exact
/// but complex-private.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IcidMode {
    /// Species-level local identifiers for every domain.
    Species,
    /// Instance identifiers for the listed domains only.
    PerDomain(BTreeSet<DomainId>),
    /// Instance identifiers for all domains.
    Instance,
}

/// Edge sets invalidated by removing a strand, returned so the caller can
/// rewire global indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovedPairs {
    /// Unordered hybridization pairs that lost an endpoint.
    pub hybridization: Vec<(DomainId, DomainId)>,
    /// Ordered (3′ → 5′) stacking pairs that lost an endpoint.
    pub stacking: Vec<(DomainId, DomainId)>,
}

/// A connected component under backbone ∪ hybridization ∪ stacking.
#[derive(Debug, Clone)]
pub struct Complex {
    id: ComplexId,
    strands: BTreeSet<StrandId>,
    strand_species: BTreeMap<String, u32>,
    domain_species: BTreeMap<String, u32>,
    domains_by_species: BTreeMap<String, BTreeSet<DomainId>>,
    /// Unordered hybridized pairs, keyed (min, max).
    hybridized_pairs: BTreeSet<(DomainId, DomainId)>,
    /// Ordered stacked pairs, direction 3′ → 5′.
    stacked_pairs: BTreeSet<(DomainId, DomainId)>,
    icid_radius: u32,
    icid_mode: IcidMode,
    fp_state: Option<StateFingerprint>,
    fp_strands: Option<StateFingerprint>,
    fp_hybridization: Option<StateFingerprint>,
    fp_stacking: Option<StateFingerprint>,
    history: VecDeque<String>,
}

impl Complex {
    /// Create an empty complex.
    #[must_use]
    pub fn new(id: ComplexId) -> Self {
        Self {
            id,
            strands: BTreeSet::new(),
            strand_species: BTreeMap::new(),
            domain_species: BTreeMap::new(),
            domains_by_species: BTreeMap::new(),
            hybridized_pairs: BTreeSet::new(),
            stacked_pairs: BTreeSet::new(),
            icid_radius: DEFAULT_ICID_RADIUS,
            icid_mode: IcidMode::Species,
            fp_state: None,
            fp_strands: None,
            fp_hybridization: None,
            fp_stacking: None,
            history: VecDeque::new(),
        }
    }

    /// This complex's id.
    #[must_use]
    pub fn id(&self) -> ComplexId {
        self.id
    }

    /// Member strands.
    #[must_use]
    pub fn strands(&self) -> &BTreeSet<StrandId> {
        &self.strands
    }

    /// Hybridized pairs, keyed (min, max).
    #[must_use]
    pub fn hybridized_pairs(&self) -> &BTreeSet<(DomainId, DomainId)> {
        &self.hybridized_pairs
    }

    /// Stacked pairs, direction 3′ → 5′.
    #[must_use]
    pub fn stacked_pairs(&self) -> &BTreeSet<(DomainId, DomainId)> {
        &self.stacked_pairs
    }

    /// Strand species multiplicities.
    #[must_use]
    pub fn strand_species(&self) -> &BTreeMap<String, u32> {
        &self.strand_species
    }

    /// Domain species multiplicities.
    #[must_use]
    pub fn domain_species(&self) -> &BTreeMap<String, u32> {
        &self.domain_species
    }

    /// Current icid traversal radius.
    #[must_use]
    pub fn icid_radius(&self) -> u32 {
        self.icid_radius
    }

    /// Current icid mode.
    #[must_use]
    pub fn icid_mode(&self) -> &IcidMode {
        &self.icid_mode
    }

    /// Override the icid mode (opt-in instance identifiers).
    pub fn set_icid_mode(&mut self, mode: IcidMode) {
        self.icid_mode = mode;
        self.reset_state_fingerprint();
    }

    /// Recent mutation history, oldest first.
    #[must_use]
    pub fn history(&self) -> &VecDeque<String> {
        &self.history
    }

    /// Whether a domain belongs to this complex (via its strand).
    #[must_use]
    pub fn contains_domain(&self, domain: DomainId, domains: &DomainStore) -> bool {
        self.strands.contains(&domains.get(domain).strand())
    }

    /// All member domains, in deterministic order.
    #[must_use]
    pub fn member_domains(&self) -> Vec<DomainId> {
        self.domains_by_species
            .values()
            .flat_map(|set| set.iter().copied())
            .collect()
    }

    fn push_history(&mut self, entry: String) {
        if self.history.len() == HISTORY_CAP {
            self.history.pop_front();
        }
        self.history.push_back(entry);
    }

    #[cfg(debug_assertions)]
    fn assert_state_changed(
        &mut self,
        before: StateFingerprint,
        operation: &str,
        domains: &DomainStore,
    ) {
        let after = self.state_fingerprint(domains);
        assert!(
            after != before,
            "state contract violated: {operation} left {} at fingerprint {before}\n\
             recent history:\n  {}",
            self.id,
            self.history
                .iter()
                .rev()
                .take(20)
                .cloned()
                .collect::<Vec<_>>()
                .join("\n  "),
        );
    }

    // -----------------------------------------------------------------------
    // Mutators
    // -----------------------------------------------------------------------

    /// Add a strand and index its domains.
    ///
    /// Backbone edges are implied by the strand's domain order; nothing
    /// further is recorded here.
    pub fn add_strand(&mut self, strand: &Strand, domains: &DomainStore) {
        #[cfg(debug_assertions)]
        let before = self.state_fingerprint(domains);

        self.index_strand(strand, domains);
        self.push_history(format!("add_strand {}", strand.id()));
        self.reset_state_fingerprint();

        #[cfg(debug_assertions)]
        self.assert_state_changed(before, "add_strand", domains);
    }

    /// Remove a strand, un-indexing its domains and dropping every edge
    /// pair that lost an endpoint. The dropped pairs are returned so the
    /// caller can rewire global indices.
    ///
    /// # Errors
    ///
    /// [`ModelError::StrandNotPresent`] if the strand is not a member.
    pub fn remove_strand(
        &mut self,
        strand: &Strand,
        domains: &DomainStore,
    ) -> Result<RemovedPairs, ModelError> {
        if !self.strands.contains(&strand.id()) {
            return Err(ModelError::StrandNotPresent { strand: strand.id() });
        }

        #[cfg(debug_assertions)]
        let before = self.state_fingerprint(domains);

        self.strands.remove(&strand.id());
        decrement(&mut self.strand_species, strand.species());

        let mut removed = RemovedPairs::default();
        for &did in strand.domains() {
            let species = domains.get(did).species().to_string();
            decrement(&mut self.domain_species, &species);
            if let Some(set) = self.domains_by_species.get_mut(&species) {
                set.remove(&did);
                if set.is_empty() {
                    self.domains_by_species.remove(&species);
                }
            }

            let obsolete_hyb: Vec<_> = self
                .hybridized_pairs
                .iter()
                .filter(|&&(a, b)| a == did || b == did)
                .copied()
                .collect();
            for pair in obsolete_hyb {
                self.hybridized_pairs.remove(&pair);
                removed.hybridization.push(pair);
            }

            let obsolete_stack: Vec<_> = self
                .stacked_pairs
                .iter()
                .filter(|&&(a, b)| a == did || b == did)
                .copied()
                .collect();
            for pair in obsolete_stack {
                self.stacked_pairs.remove(&pair);
                removed.stacking.push(pair);
            }
        }
        self.push_history(format!("remove_strand {}", strand.id()));
        self.reset_state_fingerprint();

        #[cfg(debug_assertions)]
        self.assert_state_changed(before, "remove_strand", domains);

        Ok(removed)
    }

    /// Record an unordered hybridization edge between two member domains.
    ///
    /// Complementarity of the two species is the tube's precondition; the
    /// tube is the single mutator of the partner relation and checks it
    /// before calling here.
    ///
    /// # Errors
    ///
    /// [`ModelError::DomainNotInComplex`] if either endpoint is not a
    /// member of this complex.
    pub fn add_hybridization_edge(
        &mut self,
        a: DomainId,
        b: DomainId,
        domains: &DomainStore,
    ) -> Result<(), ModelError> {
        self.ensure_member(a, domains)?;
        self.ensure_member(b, domains)?;

        #[cfg(debug_assertions)]
        let before = self.state_fingerprint(domains);

        self.hybridized_pairs.insert(ordered(a, b));
        self.push_history(format!("add_hybridization_edge {a} {b}"));
        self.fp_hybridization = None;
        self.fp_state = None;

        #[cfg(debug_assertions)]
        self.assert_state_changed(before, "add_hybridization_edge", domains);

        Ok(())
    }

    /// Remove an unordered hybridization edge.
    ///
    /// # Errors
    ///
    /// [`ModelError::HybridizationEdgeMissing`] if the edge is not present;
    /// [`ModelError::DomainNotInComplex`] if either endpoint is foreign.
    pub fn remove_hybridization_edge(
        &mut self,
        a: DomainId,
        b: DomainId,
        domains: &DomainStore,
    ) -> Result<(), ModelError> {
        self.ensure_member(a, domains)?;
        self.ensure_member(b, domains)?;
        if !self.hybridized_pairs.contains(&ordered(a, b)) {
            return Err(ModelError::HybridizationEdgeMissing { first: a, second: b });
        }

        #[cfg(debug_assertions)]
        let before = self.state_fingerprint(domains);

        self.hybridized_pairs.remove(&ordered(a, b));
        self.push_history(format!("remove_hybridization_edge {a} {b}"));
        self.fp_hybridization = None;
        self.fp_state = None;

        #[cfg(debug_assertions)]
        self.assert_state_changed(before, "remove_hybridization_edge", domains);

        Ok(())
    }

    /// Record the ordered pair of stacking edges forming one junction.
    ///
    /// # Errors
    ///
    /// [`ModelError::DomainNotInComplex`] if any endpoint is foreign;
    /// [`ModelError::StackingEdgeConflict`] if an edge already exists.
    pub fn add_stacking_edges(
        &mut self,
        junction: StackingJunction,
        domains: &DomainStore,
    ) -> Result<(), ModelError> {
        for (from, to) in junction.ordered_pairs() {
            self.ensure_member(from, domains)?;
            self.ensure_member(to, domains)?;
            if self.stacked_pairs.contains(&(from, to)) {
                return Err(ModelError::StackingEdgeConflict {
                    detail: format!("pair {from} -> {to} already stacked"),
                });
            }
        }

        #[cfg(debug_assertions)]
        let before = self.state_fingerprint(domains);

        for (from, to) in junction.ordered_pairs() {
            self.stacked_pairs.insert((from, to));
        }
        self.push_history(format!(
            "add_stacking_edges {} {}",
            junction.h1_end3p, junction.h2_end3p
        ));
        self.fp_stacking = None;
        self.fp_state = None;

        #[cfg(debug_assertions)]
        self.assert_state_changed(before, "add_stacking_edges", domains);

        Ok(())
    }

    /// Remove the ordered pair of stacking edges forming one junction.
    ///
    /// # Errors
    ///
    /// [`ModelError::StackingEdgeConflict`] if either edge is absent.
    pub fn remove_stacking_edges(
        &mut self,
        junction: StackingJunction,
        domains: &DomainStore,
    ) -> Result<(), ModelError> {
        for (from, to) in junction.ordered_pairs() {
            self.ensure_member(from, domains)?;
            self.ensure_member(to, domains)?;
            if !self.stacked_pairs.contains(&(from, to)) {
                return Err(ModelError::StackingEdgeConflict {
                    detail: format!("pair {from} -> {to} is not stacked"),
                });
            }
        }

        #[cfg(debug_assertions)]
        let before = self.state_fingerprint(domains);

        for (from, to) in junction.ordered_pairs() {
            self.stacked_pairs.remove(&(from, to));
        }
        self.push_history(format!(
            "remove_stacking_edges {} {}",
            junction.h1_end3p, junction.h2_end3p
        ));
        self.fp_stacking = None;
        self.fp_state = None;

        #[cfg(debug_assertions)]
        self.assert_state_changed(before, "remove_stacking_edges", domains);

        Ok(())
    }

    /// Absorb another complex wholesale: its strands, counters, and edge
    /// sets. Used by the tube when a new edge merges two complexes; the
    /// caller has already repointed the moved strands at this complex.
    pub(crate) fn absorb(
        &mut self,
        other: &Complex,
        strands: &crate::strand::StrandStore,
        domains: &DomainStore,
    ) {
        #[cfg(debug_assertions)]
        let before = self.state_fingerprint(domains);

        for &sid in other.strands() {
            self.index_strand(strands.get(sid), domains);
        }
        self.hybridized_pairs.extend(other.hybridized_pairs.iter().copied());
        self.stacked_pairs.extend(other.stacked_pairs.iter().copied());
        self.push_history(format!("absorb {}", other.id));
        self.reset_state_fingerprint();

        #[cfg(debug_assertions)]
        self.assert_state_changed(before, "absorb", domains);
    }

    /// Adopt edge pairs moved over from a split sibling. No-op when both
    /// lists are empty.
    pub(crate) fn adopt_pairs(&mut self, moved: &RemovedPairs, domains: &DomainStore) {
        if moved.hybridization.is_empty() && moved.stacking.is_empty() {
            return;
        }

        #[cfg(debug_assertions)]
        let before = self.state_fingerprint(domains);

        for &(a, b) in &moved.hybridization {
            debug_assert!(
                self.contains_domain(a, domains) && self.contains_domain(b, domains),
                "adopted pair {a}/{b} crosses the complex boundary"
            );
            self.hybridized_pairs.insert(ordered(a, b));
        }
        for &pair in &moved.stacking {
            debug_assert!(
                self.contains_domain(pair.0, domains) && self.contains_domain(pair.1, domains),
                "adopted stack {}/{} crosses the complex boundary",
                pair.0,
                pair.1
            );
            self.stacked_pairs.insert(pair);
        }
        self.push_history(format!(
            "adopt_pairs hyb={} stack={}",
            moved.hybridization.len(),
            moved.stacking.len()
        ));
        self.reset_state_fingerprint();

        #[cfg(debug_assertions)]
        self.assert_state_changed(before, "adopt_pairs", domains);
    }

    fn index_strand(&mut self, strand: &Strand, domains: &DomainStore) {
        self.strands.insert(strand.id());
        *self
            .strand_species
            .entry(strand.species().to_string())
            .or_insert(0) += 1;
        for &did in strand.domains() {
            let species = domains.get(did).species().to_string();
            *self.domain_species.entry(species.clone()).or_insert(0) += 1;
            self.domains_by_species.entry(species).or_default().insert(did);
        }
    }

    fn ensure_member(&self, domain: DomainId, domains: &DomainStore) -> Result<(), ModelError> {
        if self.contains_domain(domain, domains) {
            Ok(())
        } else {
            Err(ModelError::DomainNotInComplex { domain })
        }
    }

    // -----------------------------------------------------------------------
    // Fingerprints
    // -----------------------------------------------------------------------

    /// The combined state fingerprint, computed lazily and cached.
    ///
    /// Before hashing, species-level icids are checked for collisions; on
    /// collision the radius is doubled (up to three times) and finally the
    /// complex falls back to instance icids.
    pub fn state_fingerprint(&mut self, domains: &DomainStore) -> StateFingerprint {
        if let Some(fp) = self.fp_state {
            return fp;
        }
        if self.icid_mode != IcidMode::Instance && self.has_icid_collision(domains) {
            self.adjust_icid_radius_or_use_instance(domains);
        }
        let strands_fp = self.strands_fingerprint();
        let hyb_fp = self.hybridization_fingerprint(domains);
        let stack_fp = self.stacking_fingerprint(domains);
        let mut buf = [0u8; 24];
        buf[..8].copy_from_slice(&strands_fp.value().to_le_bytes());
        buf[8..16].copy_from_slice(&hyb_fp.value().to_le_bytes());
        buf[16..].copy_from_slice(&stack_fp.value().to_le_bytes());
        let fp = fingerprint_bytes(DOMAIN_COMPLEX_STATE, &buf);
        self.fp_state = Some(fp);
        fp
    }

    /// Fingerprint of the strand-species multiset.
    pub fn strands_fingerprint(&mut self) -> StateFingerprint {
        if let Some(fp) = self.fp_strands {
            return fp;
        }
        let records = self
            .strand_species
            .iter()
            .map(|(species, count)| {
                let mut rec = species.as_bytes().to_vec();
                rec.push(0);
                rec.extend_from_slice(&count.to_le_bytes());
                rec
            })
            .collect();
        let fp = fingerprint_records(DOMAIN_STRANDS, records, false);
        self.fp_strands = Some(fp);
        fp
    }

    /// Fingerprint of the hybridization edge set: unordered pairs of
    /// `(species, icid)`.
    pub fn hybridization_fingerprint(&mut self, domains: &DomainStore) -> StateFingerprint {
        if let Some(fp) = self.fp_hybridization {
            return fp;
        }
        let records = self
            .hybridized_pairs
            .iter()
            .map(|&(a, b)| {
                let ea = self.icid_record(a, domains);
                let eb = self.icid_record(b, domains);
                let (lo, hi) = if ea <= eb { (ea, eb) } else { (eb, ea) };
                let mut rec = lo;
                rec.extend_from_slice(&hi);
                rec
            })
            .collect();
        let fp = fingerprint_records(DOMAIN_HYBRIDIZATION, records, true);
        self.fp_hybridization = Some(fp);
        fp
    }

    /// Fingerprint of the stacking edge set: ordered pairs of
    /// `(species, icid)`, direction 3′ → 5′.
    pub fn stacking_fingerprint(&mut self, domains: &DomainStore) -> StateFingerprint {
        if let Some(fp) = self.fp_stacking {
            return fp;
        }
        let records = self
            .stacked_pairs
            .iter()
            .map(|&(from, to)| {
                let mut rec = self.icid_record(from, domains);
                rec.extend_from_slice(&self.icid_record(to, domains));
                rec
            })
            .collect();
        let fp = fingerprint_records(DOMAIN_STACKING, records, true);
        self.fp_stacking = Some(fp);
        fp
    }

    /// Invalidate all fingerprint caches.
    pub fn reset_state_fingerprint(&mut self) {
        self.fp_state = None;
        self.fp_strands = None;
        self.fp_hybridization = None;
        self.fp_stacking = None;
    }

    fn icid_record(&self, domain: DomainId, domains: &DomainStore) -> Vec<u8> {
        let d = domains.get(domain);
        let mut rec = d.species().as_bytes().to_vec();
        rec.push(0);
        rec.extend_from_slice(&self.in_complex_identifier(domain, domains).to_le_bytes());
        rec
    }

    // -----------------------------------------------------------------------
    // In-complex identifiers
    // -----------------------------------------------------------------------

    /// The in-complex identifier of a domain.
    ///
    /// `0` is a sentinel meaning "only one of this species in the complex;
    /// no disambiguation needed". Otherwise the icid is the hash of the
    /// multiset of `(edge-kind, neighbor-species)` observations from a
    /// breadth-first traversal out to `icid_radius` hops (remapped to 1 on
    /// the rare hash-to-zero), or the raw instance id under instance mode.
    #[must_use]
    pub fn in_complex_identifier(&self, domain: DomainId, domains: &DomainStore) -> u64 {
        match &self.icid_mode {
            IcidMode::Instance => instance_icid(domain),
            IcidMode::PerDomain(set) if set.contains(&domain) => instance_icid(domain),
            _ => {
                let species = domains.get(domain).species();
                if self.domain_species.get(species).copied().unwrap_or(0) <= 1 {
                    return 0;
                }
                self.neighborhood_icid(domain, domains)
            }
        }
    }

    fn neighborhood_icid(&self, start: DomainId, domains: &DomainStore) -> u64 {
        let mut visited = BTreeSet::new();
        visited.insert(start);
        let mut frontier = vec![start];
        let mut records: Vec<Vec<u8>> = Vec::new();

        for hop in 0..self.icid_radius {
            let mut next = Vec::new();
            for &node in &frontier {
                for (kind, neighbor) in domains.get(node).interaction_edges() {
                    if !self.contains_domain(neighbor, domains) {
                        continue;
                    }
                    // The BFS layer anchors each observation to its
                    // distance from the start domain; without it every
                    // radius covering the whole component would emit the
                    // same start-independent multiset.
                    let mut rec = hop.to_le_bytes().to_vec();
                    rec.push(kind.tag());
                    rec.extend_from_slice(domains.get(neighbor).species().as_bytes());
                    records.push(rec);
                    if visited.insert(neighbor) {
                        next.push(neighbor);
                    }
                }
            }
            frontier = next;
            if frontier.is_empty() {
                break;
            }
        }

        let value = fingerprint_records(DOMAIN_ICID, records, false).value();
        if value == 0 {
            1
        } else {
            value
        }
    }

    fn has_icid_collision(&self, domains: &DomainStore) -> bool {
        let mut seen: BTreeSet<(String, u64)> = BTreeSet::new();
        for did in self.member_domains() {
            let icid = self.in_complex_identifier(did, domains);
            if icid == 0 {
                continue;
            }
            let key = (domains.get(did).species().to_string(), icid);
            if !seen.insert(key) {
                return true;
            }
        }
        false
    }

    /// Resolve species-level icid collisions by doubling the traversal
    /// radius up to three times, then falling back to instance icids.
    pub fn adjust_icid_radius_or_use_instance(&mut self, domains: &DomainStore) {
        for _ in 0..ICID_RADIUS_RETRIES {
            self.icid_radius *= 2;
            self.reset_state_fingerprint();
            if !self.has_icid_collision(domains) {
                log::debug!(
                    "{}: unique icids found at radius {}",
                    self.id,
                    self.icid_radius
                );
                return;
            }
        }
        log::debug!(
            "{}: icid radius expansion exhausted, using instance identifiers",
            self.id
        );
        self.icid_mode = IcidMode::Instance;
        self.reset_state_fingerprint();
    }

    // -----------------------------------------------------------------------
    // Consistency checks
    // -----------------------------------------------------------------------

    /// Whether the species counters equal the true multiset counts.
    #[must_use]
    pub fn species_counts_consistent(
        &self,
        domains: &DomainStore,
        strands: &crate::strand::StrandStore,
    ) -> bool {
        let mut strand_counts: BTreeMap<String, u32> = BTreeMap::new();
        let mut domain_counts: BTreeMap<String, u32> = BTreeMap::new();
        for &sid in &self.strands {
            let strand = strands.get(sid);
            *strand_counts.entry(strand.species().to_string()).or_insert(0) += 1;
            for &did in strand.domains() {
                *domain_counts
                    .entry(domains.get(did).species().to_string())
                    .or_insert(0) += 1;
            }
        }
        strand_counts == self.strand_species && domain_counts == self.domain_species
    }
}

fn ordered(a: DomainId, b: DomainId) -> (DomainId, DomainId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn instance_icid(domain: DomainId) -> u64 {
    u64::from(domain.0) + 1
}

fn decrement(counter: &mut BTreeMap<String, u32>, key: &str) {
    if let Some(count) = counter.get_mut(key) {
        *count -= 1;
        if *count == 0 {
            counter.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainStore;
    use crate::strand::StrandStore;

    /// Two strands: "top" = [A], "bot" = [a].
    fn duplex_fixture() -> (DomainStore, StrandStore, Complex) {
        let mut domains = DomainStore::default();
        let mut strands = StrandStore::default();
        let cid = ComplexId(0);

        let a = domains.push("A", "ACGTACGT", StrandId(0));
        let top = strands.push("top", vec![a], cid);
        assert_eq!(top, StrandId(0));

        let b = domains.push("a", "ACGTACGT", StrandId(1));
        let bot = strands.push("bot", vec![b], cid);
        assert_eq!(bot, StrandId(1));

        let mut complex = Complex::new(cid);
        complex.add_strand(strands.get(top), &domains);
        complex.add_strand(strands.get(bot), &domains);
        (domains, strands, complex)
    }

    #[test]
    fn add_remove_strand_round_trips_fingerprint() {
        let (domains, strands, mut complex) = duplex_fixture();
        let before = complex.state_fingerprint(&domains);

        let removed = complex
            .remove_strand(strands.get(StrandId(1)), &domains)
            .unwrap();
        assert!(removed.hybridization.is_empty());
        assert_ne!(complex.state_fingerprint(&domains), before);

        complex.add_strand(strands.get(StrandId(1)), &domains);
        assert_eq!(complex.state_fingerprint(&domains), before);
    }

    #[test]
    fn hybridization_edge_round_trips_fingerprint() {
        let (mut domains, _strands, mut complex) = duplex_fixture();
        let (a, b) = (DomainId(0), DomainId(1));
        domains.get_mut(a).set_partner(Some(b));
        domains.get_mut(b).set_partner(Some(a));

        let before = complex.state_fingerprint(&domains);
        complex.add_hybridization_edge(a, b, &domains).unwrap();
        let mid = complex.state_fingerprint(&domains);
        assert_ne!(mid, before);

        complex.remove_hybridization_edge(a, b, &domains).unwrap();
        domains.get_mut(a).set_partner(None);
        domains.get_mut(b).set_partner(None);
        assert_eq!(complex.state_fingerprint(&domains), before);
    }

    #[test]
    fn remove_strand_returns_invalidated_pairs() {
        let (mut domains, strands, mut complex) = duplex_fixture();
        let (a, b) = (DomainId(0), DomainId(1));
        domains.get_mut(a).set_partner(Some(b));
        domains.get_mut(b).set_partner(Some(a));
        complex.add_hybridization_edge(a, b, &domains).unwrap();

        let removed = complex
            .remove_strand(strands.get(StrandId(1)), &domains)
            .unwrap();
        assert_eq!(removed.hybridization, vec![(a, b)]);
        assert!(complex.hybridized_pairs().is_empty());
    }

    #[test]
    fn remove_absent_strand_fails() {
        let (domains, _strands, mut complex) = duplex_fixture();
        // A strand whose id is not a member of this complex.
        let mut other_strands = StrandStore::default();
        let _ = other_strands.push("x", vec![], ComplexId(9));
        let _ = other_strands.push("y", vec![], ComplexId(9));
        let ghost = other_strands.push("ghost", vec![], ComplexId(9));
        assert_eq!(ghost, StrandId(2));
        let err = complex
            .remove_strand(other_strands.get(ghost), &domains)
            .unwrap_err();
        assert!(matches!(err, ModelError::StrandNotPresent { .. }));
    }

    #[test]
    fn unique_species_get_sentinel_icid() {
        let (domains, _strands, complex) = duplex_fixture();
        assert_eq!(complex.in_complex_identifier(DomainId(0), &domains), 0);
        assert_eq!(complex.in_complex_identifier(DomainId(1), &domains), 0);
    }

    #[test]
    fn remove_missing_edge_fails() {
        let (domains, _strands, mut complex) = duplex_fixture();
        let err = complex
            .remove_hybridization_edge(DomainId(0), DomainId(1), &domains)
            .unwrap_err();
        assert!(matches!(err, ModelError::HybridizationEdgeMissing { .. }));
    }

    #[test]
    fn species_counters_match_membership() {
        let (domains, strands, complex) = duplex_fixture();
        assert!(complex.species_counts_consistent(&domains, &strands));
        assert_eq!(complex.strand_species().get("top"), Some(&1));
        assert_eq!(complex.domain_species().get("a"), Some(&1));
    }

    #[test]
    fn foreign_domain_rejected_by_edge_mutators() {
        let (mut domains, _strands, mut complex) = duplex_fixture();
        let foreign = domains.push("z", "AC", StrandId(7));
        let err = complex
            .add_hybridization_edge(DomainId(0), foreign, &domains)
            .unwrap_err();
        assert!(matches!(err, ModelError::DomainNotInComplex { .. }));
    }
}
