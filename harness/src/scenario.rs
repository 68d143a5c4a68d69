//! Canned scenarios: strand definitions and pairing maps for runs and
//! tests.

use std::collections::BTreeSet;

use strandsim_model::error::ModelError;
use strandsim_model::strand::{DomainDef, StrandDef};
use strandsim_model::tube::{PairingMap, Tube};

/// Watson–Crick reverse complement of a sequence, 5′ → 3′.
///
/// Unrecognized characters map to `N`.
#[must_use]
pub fn reverse_complement(seq: &str) -> String {
    seq.chars()
        .rev()
        .map(|c| match c {
            'A' => 'T',
            'T' => 'A',
            'G' => 'C',
            'C' => 'G',
            'a' => 't',
            't' => 'a',
            'g' => 'c',
            'c' => 'g',
            _ => 'N',
        })
        .collect()
}

/// A deterministic mixed-content sequence of the given length.
fn filler_sequence(n_bases: usize) -> String {
    const PATTERN: &[u8] = b"GCTAGGCATTCTGCAA";
    (0..n_bases)
        .map(|i| PATTERN[i % PATTERN.len()] as char)
        .collect()
}

/// Two complementary single-domain strands: `top` carrying species `A`
/// over `n_bases`, `bot` carrying the reverse complement as species `a`.
#[must_use]
pub fn duplex_pair(n_bases: usize) -> Vec<StrandDef> {
    let seq = filler_sequence(n_bases);
    let comp = reverse_complement(&seq);
    vec![
        StrandDef::new("top", vec![DomainDef::new("A", seq)]),
        StrandDef::new("bot", vec![DomainDef::new("a", comp)]),
    ]
}

/// A single strand with no complement anywhere in the tube.
#[must_use]
pub fn lone_strand() -> Vec<StrandDef> {
    vec![StrandDef::new(
        "lone",
        vec![DomainDef::new("A", filler_sequence(16))],
    )]
}

/// Two copies of one strand species `S = [A, a]`, which can close into a
/// structurally symmetric ring; used to stress the icid machinery.
#[must_use]
pub fn symmetric_ring() -> Vec<StrandDef> {
    let seq = filler_sequence(8);
    let comp = reverse_complement(&seq);
    let strand = StrandDef::new(
        "S",
        vec![
            DomainDef::new("A", seq),
            DomainDef::new("a", comp),
        ],
    );
    vec![strand.clone(), strand]
}

/// The default case-swap pairing map over every domain species appearing
/// in the definitions.
///
/// # Errors
///
/// Propagates [`ModelError::SelfComplementarySpecies`] for species with
/// no case to swap.
pub fn default_pairing(defs: &[StrandDef]) -> Result<PairingMap, ModelError> {
    let species: BTreeSet<&str> = defs
        .iter()
        .flat_map(|d| d.domains.iter().map(|dd| dd.species.as_str()))
        .collect();
    PairingMap::case_swap(species)
}

/// Build a tube from definitions with the default pairing.
///
/// # Errors
///
/// Propagates pairing and construction failures.
pub fn build_tube(volume_liters: f64, defs: &[StrandDef]) -> Result<Tube, ModelError> {
    let pairing = default_pairing(defs)?;
    Tube::new(volume_liters, defs, pairing)
}
