//! Canonical state-fingerprint hashing with domain separation.
//!
//! Algorithm: SHA-256 over `domain_prefix || data`, reduced to the first
//! eight little-endian digest bytes. The full 64-bit word is the public
//! fingerprint; the full hex digest is kept available for diagnostics.
//!
//! **Exactly one place defines canonical hashing.** Complexes, icids, and
//! supercomplexes all hash through this module with distinct prefixes so
//! that structurally unrelated byte strings can never collide by domain
//! confusion.

use sha2::{Digest, Sha256};

/// A 64-bit canonical fingerprint of a complex's structural state.
///
/// Fingerprints are cache keys, not persistent representations: they only
/// have to be one-way, and two structurally isomorphic complexes with
/// interchangeable strand copies may legitimately share one (the residual
/// degeneracy is accepted; this is not a graph canonization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateFingerprint(pub u64);

impl StateFingerprint {
    /// The raw 64-bit value.
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for StateFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

// Domain separation constants. Each prefix is null-terminated.

/// Prefix for the strand-species multiset fingerprint.
pub const DOMAIN_STRANDS: &[u8] = b"STRANDSIM::STRANDS::V1\0";

/// Prefix for the hybridization edge-set fingerprint.
pub const DOMAIN_HYBRIDIZATION: &[u8] = b"STRANDSIM::HYBRIDIZATION::V1\0";

/// Prefix for the (directional) stacking edge-set fingerprint.
pub const DOMAIN_STACKING: &[u8] = b"STRANDSIM::STACKING::V1\0";

/// Prefix for the combined complex state fingerprint.
pub const DOMAIN_COMPLEX_STATE: &[u8] = b"STRANDSIM::COMPLEX_STATE::V1\0";

/// Prefix for in-complex domain identifiers.
pub const DOMAIN_ICID: &[u8] = b"STRANDSIM::ICID::V1\0";

/// Prefix for the supercomplex child-multiset fingerprint.
pub const DOMAIN_SUPERCOMPLEX: &[u8] = b"STRANDSIM::SUPERCOMPLEX::V1\0";

/// Hash a byte string under a domain prefix.
#[must_use]
pub fn fingerprint_bytes(domain: &[u8], data: &[u8]) -> StateFingerprint {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    let digest = hasher.finalize();
    let mut word = [0u8; 8];
    word.copy_from_slice(&digest[..8]);
    StateFingerprint(u64::from_le_bytes(word))
}

/// Hash a collection of records as a canonical multiset.
///
/// Records are sorted, then concatenated with a `u32` little-endian length
/// prefix per record (length framing keeps `["ab","c"]` distinct from
/// `["a","bc"]`). Pass `dedup = true` for set semantics.
#[must_use]
pub fn fingerprint_records(
    domain: &[u8],
    mut records: Vec<Vec<u8>>,
    dedup: bool,
) -> StateFingerprint {
    records.sort_unstable();
    if dedup {
        records.dedup();
    }
    let mut buf = Vec::with_capacity(records.iter().map(|r| r.len() + 4).sum());
    for record in &records {
        #[allow(clippy::cast_possible_truncation)]
        let len = record.len() as u32;
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(record);
    }
    fingerprint_bytes(domain, &buf)
}

/// Full hex digest under a domain prefix, for history-ring diagnostics.
#[must_use]
pub fn hex_digest(domain: &[u8], data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_prefixes_are_null_terminated() {
        for prefix in [
            DOMAIN_STRANDS,
            DOMAIN_HYBRIDIZATION,
            DOMAIN_STACKING,
            DOMAIN_COMPLEX_STATE,
            DOMAIN_ICID,
            DOMAIN_SUPERCOMPLEX,
        ] {
            assert!(prefix.ends_with(&[0]), "prefix must be null-terminated");
        }
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let first = fingerprint_bytes(DOMAIN_STRANDS, b"determinism");
        for _ in 0..10 {
            assert_eq!(fingerprint_bytes(DOMAIN_STRANDS, b"determinism"), first);
        }
    }

    #[test]
    fn domains_separate() {
        let a = fingerprint_bytes(DOMAIN_STRANDS, b"same-data");
        let b = fingerprint_bytes(DOMAIN_HYBRIDIZATION, b"same-data");
        assert_ne!(a, b, "distinct prefixes must hash the same data apart");
    }

    #[test]
    fn record_order_does_not_matter() {
        let fwd = fingerprint_records(
            DOMAIN_STRANDS,
            vec![b"alpha".to_vec(), b"beta".to_vec()],
            false,
        );
        let rev = fingerprint_records(
            DOMAIN_STRANDS,
            vec![b"beta".to_vec(), b"alpha".to_vec()],
            false,
        );
        assert_eq!(fwd, rev);
    }

    #[test]
    fn length_framing_prevents_concatenation_collisions() {
        let a = fingerprint_records(DOMAIN_STRANDS, vec![b"ab".to_vec(), b"c".to_vec()], false);
        let b = fingerprint_records(DOMAIN_STRANDS, vec![b"a".to_vec(), b"bc".to_vec()], false);
        assert_ne!(a, b);
    }

    #[test]
    fn dedup_gives_set_semantics() {
        let multi = fingerprint_records(
            DOMAIN_HYBRIDIZATION,
            vec![b"pair".to_vec(), b"pair".to_vec()],
            true,
        );
        let single = fingerprint_records(DOMAIN_HYBRIDIZATION, vec![b"pair".to_vec()], true);
        assert_eq!(multi, single);
    }

    #[test]
    fn hex_digest_is_full_sha256() {
        let digest = hex_digest(DOMAIN_COMPLEX_STATE, b"x");
        assert_eq!(digest.len(), 64);
    }
}
