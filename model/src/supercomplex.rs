//! SuperComplex: an aggregation of complexes joined by blunt-end stacking.
//!
//! Nodes are complexes; edges are blunt-end stacking pairs between
//! otherwise-separate complexes, tracked without merging them. Stacking
//! contacts are typically brief next to hybridization, so keeping the
//! child complexes intact avoids continuous merge/split churn. The core
//! engine operates correctly with only [`crate::complex::Complex`]; this
//! type is the forward-looking aggregator.

use std::collections::BTreeSet;

use crate::error::ModelError;
use crate::fingerprint::{fingerprint_records, StateFingerprint, DOMAIN_SUPERCOMPLEX};
use crate::ids::{ComplexId, DomainId};
use crate::tube::Tube;

/// A graph whose nodes are complexes and whose edges are blunt-end
/// stacking pairs.
#[derive(Debug, Clone, Default)]
pub struct SuperComplex {
    complexes: BTreeSet<ComplexId>,
    /// Ordered (3′ → 5′) blunt-end contacts between member complexes.
    stacking_pairs: BTreeSet<(DomainId, DomainId)>,
    fp_state: Option<StateFingerprint>,
}

impl SuperComplex {
    /// Create an empty supercomplex.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Member complexes.
    #[must_use]
    pub fn complexes(&self) -> &BTreeSet<ComplexId> {
        &self.complexes
    }

    /// Blunt-end stacking contacts.
    #[must_use]
    pub fn stacking_pairs(&self) -> &BTreeSet<(DomainId, DomainId)> {
        &self.stacking_pairs
    }

    /// Add a member complex.
    pub fn add_complex(&mut self, id: ComplexId) {
        self.complexes.insert(id);
        self.reset_state_fingerprint();
    }

    /// Remove a member complex.
    pub fn remove_complex(&mut self, id: ComplexId) {
        self.complexes.remove(&id);
        self.reset_state_fingerprint();
    }

    /// Record a blunt-end stacking contact between two member complexes.
    pub fn add_stacking_pair(&mut self, from: DomainId, to: DomainId) {
        self.stacking_pairs.insert((from, to));
        self.reset_state_fingerprint();
    }

    /// Remove a blunt-end stacking contact.
    pub fn remove_stacking_pair(&mut self, from: DomainId, to: DomainId) {
        self.stacking_pairs.remove(&(from, to));
        self.reset_state_fingerprint();
    }

    /// The supercomplex fingerprint: the unordered multiset of child
    /// complex fingerprints.
    ///
    /// # Errors
    ///
    /// [`ModelError::Invariant`] if a member complex id is no longer live
    /// in the tube.
    pub fn state_fingerprint(&mut self, tube: &mut Tube) -> Result<StateFingerprint, ModelError> {
        if let Some(fp) = self.fp_state {
            return Ok(fp);
        }
        let mut records = Vec::with_capacity(self.complexes.len());
        for &cid in &self.complexes {
            let child = tube.complex_state_fingerprint(cid)?;
            records.push(child.value().to_le_bytes().to_vec());
        }
        let fp = fingerprint_records(DOMAIN_SUPERCOMPLEX, records, false);
        self.fp_state = Some(fp);
        Ok(fp)
    }

    /// Invalidate the cached fingerprint.
    pub fn reset_state_fingerprint(&mut self) {
        self.fp_state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::DomainId;
    use crate::strand::{DomainDef, StrandDef};
    use crate::tube::PairingMap;

    fn two_duplex_tube() -> Tube {
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
        tube
    }

    #[test]
    fn fingerprint_is_multiset_of_children() {
        let mut tube = two_duplex_tube();
        let (ca, cb) = {
            let mut ids = tube.complexes().keys().copied();
            (ids.next().unwrap(), ids.next().unwrap())
        };

        let mut fwd = SuperComplex::new();
        fwd.add_complex(ca);
        fwd.add_complex(cb);
        let fp_fwd = fwd.state_fingerprint(&mut tube).unwrap();

        let mut rev = SuperComplex::new();
        rev.add_complex(cb);
        rev.add_complex(ca);
        let fp_rev = rev.state_fingerprint(&mut tube).unwrap();

        assert_eq!(fp_fwd, fp_rev, "child order must not matter");
    }

    #[test]
    fn membership_changes_invalidate_cache() {
        let mut tube = two_duplex_tube();
        let (ca, cb) = {
            let mut ids = tube.complexes().keys().copied();
            (ids.next().unwrap(), ids.next().unwrap())
        };

        let mut sc = SuperComplex::new();
        sc.add_complex(ca);
        let one = sc.state_fingerprint(&mut tube).unwrap();
        sc.add_complex(cb);
        let two = sc.state_fingerprint(&mut tube).unwrap();
        assert_ne!(one, two);

        sc.remove_complex(cb);
        assert_eq!(sc.state_fingerprint(&mut tube).unwrap(), one);
    }

    #[test]
    fn dangling_member_is_an_invariant_error() {
        let mut tube = two_duplex_tube();
        let mut sc = SuperComplex::new();
        sc.add_complex(crate::ids::ComplexId(99));
        assert!(sc.state_fingerprint(&mut tube).is_err());
    }

    #[test]
    fn stacking_pairs_are_tracked_without_merging() {
        let mut tube = two_duplex_tube();
        let n_before = tube.complexes().len();
        let mut sc = SuperComplex::new();
        sc.add_stacking_pair(DomainId(0), DomainId(2));
        assert_eq!(sc.stacking_pairs().len(), 1);
        assert_eq!(tube.complexes().len(), n_before, "no merge happens");
    }
}
