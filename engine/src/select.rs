//! Event selection: the two-stage activity-biased lottery.
//!
//! Stage one picks a domain uniformly from the whole population. If it is
//! already hybridized, the event is the (possible) melt of that pair.
//! Otherwise stage two draws from the unpaired complement candidates,
//! weighted by effective activity, with an explicit null candidate
//! standing in for "no encounter in this tick".
//!
//! Draw order is fixed for reproducibility: one uniform for the stage-one
//! pick, then (only when stage two runs) one uniform for the categorical
//! draw over the weight vector by inverse CDF.

use rand::Rng;

use strandsim_model::ids::DomainId;
use strandsim_model::tube::Tube;

use crate::thermo::AVOGADRO_VOLUME_NM3;

/// Contour length contributed per interaction-graph hop, nm.
///
/// A coarse per-domain tether segment (a ~16 nt single strand spans
/// roughly this far); only the monotone decrease of intra-complex
/// activity with hop distance matters to the engine.
pub const SEGMENT_LENGTH_NM: f64 = 6.0;

/// Cap on the tether-distance search between intra-complex candidates.
pub const MAX_TETHER_HOPS: u32 = 64;

/// Result of the two-stage lottery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// The uniformly picked domain.
    pub first: DomainId,
    /// The drawn counterpart: the current partner when already
    /// hybridized, a complement candidate, or `None` for a miss.
    pub second: Option<DomainId>,
    /// Whether `first` and `second` are currently hybridized to each
    /// other.
    pub already_hybridized: bool,
}

/// Run the lottery. Returns `None` only for an empty tube.
pub fn select_event_domains<R: Rng>(
    rng: &mut R,
    tube: &Tube,
    oversampling: f64,
) -> Option<Selection> {
    let n = tube.n_domains();
    if n == 0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let first = DomainId(rng.random_range(0..n) as u32);

    if let Some(partner) = tube.domain(first).partner() {
        return Some(Selection {
            first,
            second: Some(partner),
            already_hybridized: true,
        });
    }

    let miss = Selection {
        first,
        second: None,
        already_hybridized: false,
    };
    let Some(complement) = tube.pairing().complement(tube.domain(first).species()) else {
        return Some(miss);
    };
    let candidates: Vec<DomainId> = tube
        .domains_of_species(complement)
        .iter()
        .copied()
        .filter(|&c| !tube.domain(c).is_hybridized())
        .collect();
    if candidates.is_empty() {
        return Some(miss);
    }

    let mut weights: Vec<f64> = candidates
        .iter()
        .map(|&c| effective_activity(tube, first, c, oversampling))
        .collect();
    let total: f64 = weights.iter().sum();
    let mut entries: Vec<Option<DomainId>> = candidates.into_iter().map(Some).collect();
    if total < 1.0 {
        // The remaining probability mass is "no encounter in this tick".
        weights.push(1.0 - total);
        entries.push(None);
    } else if total > 1.0 {
        for w in &mut weights {
            *w /= total;
        }
    }

    let index = categorical_index(rng, &weights);
    Some(Selection {
        first,
        second: entries[index],
        already_hybridized: false,
    })
}

/// Effective activity of `candidate` as seen from `first`.
///
/// Inter-complex candidates carry the standard per-molecule molar
/// concentration `1/(N_A·V)`. Intra-complex candidates carry the local
/// tether concentration from the interaction-graph hop distance (closer
/// domains have higher effective activity), capped at the 1 M duplex
/// reference. Both are multiplied by the oversampling factor.
#[must_use]
pub fn effective_activity(
    tube: &Tube,
    first: DomainId,
    candidate: DomainId,
    oversampling: f64,
) -> f64 {
    let base = if tube.complex_of_domain(first) == tube.complex_of_domain(candidate) {
        let hops = tube
            .domain_distance(first, candidate, MAX_TETHER_HOPS)
            .unwrap_or(MAX_TETHER_HOPS);
        local_tether_concentration(hops).min(1.0)
    } else {
        tube.per_molecule_concentration()
    };
    base * oversampling
}

/// Molar concentration of one molecule confined to the sphere swept by a
/// tether of `hops` segments.
fn local_tether_concentration(hops: u32) -> f64 {
    let radius_nm = f64::from(hops.max(1)) * SEGMENT_LENGTH_NM;
    let volume_nm3 = 4.0 / 3.0 * std::f64::consts::PI * radius_nm.powi(3);
    AVOGADRO_VOLUME_NM3 / volume_nm3
}

/// Inverse-CDF draw over a weight vector summing to ≤ 1. Consumes exactly
/// one uniform.
fn categorical_index<R: Rng>(rng: &mut R, weights: &[f64]) -> usize {
    let x: f64 = rng.random();
    let mut acc = 0.0;
    for (i, w) in weights.iter().enumerate() {
        acc += w;
        if x < acc {
            return i;
        }
    }
    weights.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use strandsim_model::strand::{DomainDef, StrandDef};
    use strandsim_model::tube::PairingMap;

    fn duplex_tube() -> Tube {
        let defs = vec![
            StrandDef::new("top", vec![DomainDef::new("A", "GCTAGGCATTCTGCAA")]),
            StrandDef::new("bot", vec![DomainDef::new("a", "TTGCAGAATGCCTAGC")]),
        ];
        let pairing = PairingMap::case_swap(["A", "a"]).unwrap();
        Tube::new(1e-15, &defs, pairing).unwrap()
    }

    #[test]
    fn hybridized_pick_returns_partner() {
        let mut tube = duplex_tube();
        tube.hybridize(DomainId(0), DomainId(1)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let sel = select_event_domains(&mut rng, &tube, 1.0).unwrap();
        assert!(sel.already_hybridized);
        assert_eq!(sel.second, Some(tube.domain(sel.first).partner().unwrap()));
    }

    #[test]
    fn dilute_tube_mostly_misses() {
        let tube = duplex_tube();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        // Base activity is ~1.7e-9; with no oversampling the null
        // candidate dominates completely.
        let hits = (0..1000)
            .filter(|_| {
                select_event_domains(&mut rng, &tube, 1.0)
                    .unwrap()
                    .second
                    .is_some()
            })
            .count();
        assert_eq!(hits, 0);
    }

    #[test]
    fn saturated_weights_always_select_a_candidate() {
        let tube = duplex_tube();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        // Oversampling large enough that ΣW > 1: weights renormalize and
        // the null candidate disappears.
        for _ in 0..100 {
            let sel = select_event_domains(&mut rng, &tube, 1e12).unwrap();
            assert!(sel.second.is_some());
            assert!(!sel.already_hybridized);
        }
    }

    #[test]
    fn missing_complement_is_a_miss_not_an_error() {
        let defs = vec![StrandDef::new(
            "lone",
            vec![DomainDef::new("A", "GCTAGGCATTCTGCAA")],
        )];
        let pairing = PairingMap::case_swap(["A"]).unwrap();
        let tube = Tube::new(1e-15, &defs, pairing).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let sel = select_event_domains(&mut rng, &tube, 1e12).unwrap();
        assert_eq!(sel.second, None);
    }

    #[test]
    fn same_seed_same_draws() {
        let tube = duplex_tube();
        let run = |seed: u64| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..50)
                .map(|_| select_event_domains(&mut rng, &tube, 1e8).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(9), run(9));
        assert_ne!(run(9), run(10));
    }

    #[test]
    fn intra_complex_activity_decreases_with_distance() {
        assert!(local_tether_concentration(1) > local_tether_concentration(2));
        assert!(local_tether_concentration(2) > local_tether_concentration(10));
    }

    #[test]
    fn intra_complex_candidates_outweigh_inter_complex_ones() {
        // A three-domain strand with a far complement on another strand:
        // the tethered candidate must carry the larger weight.
        let defs = vec![
            StrandDef::new(
                "hairpin",
                vec![
                    DomainDef::new("A", "GCTAGGCA"),
                    DomainDef::new("X", "TTTT"),
                    DomainDef::new("a", "TGCCTAGC"),
                ],
            ),
            StrandDef::new("free", vec![DomainDef::new("a", "TGCCTAGC")]),
        ];
        let pairing = PairingMap::case_swap(["A", "a", "X"]).unwrap();
        let tube = Tube::new(1e-15, &defs, pairing).unwrap();

        let tethered = effective_activity(&tube, DomainId(0), DomainId(2), 1.0);
        let free = effective_activity(&tube, DomainId(0), DomainId(3), 1.0);
        assert!(tethered > free);
    }
}
