//! Hybridization thermodynamics: the nearest-neighbor contract, the
//! memoized energy model with neighbor corrections, and the two-state
//! acceptance probability.
//!
//! Units follow the nearest-neighbor convention throughout: ΔH in
//! kcal/mol, ΔS in cal/mol·K, and the assembled standard free energy
//!
//! ```text
//! ΔG = 1000·ΔH − T·ΔS          (cal/mol)
//! ```
//!
//! with ΔCp° assumed zero, so ΔH and ΔS are temperature independent and
//! one memoized table lookup per species pair suffices.

use std::collections::BTreeMap;

use strandsim_model::ids::DomainId;
use strandsim_model::tube::Tube;

/// Universal gas constant, cal/mol·K.
pub const R_GAS_CAL: f64 = 1.987;

/// Avogadro's number, per mol (re-exported from the model).
pub use strandsim_model::tube::N_AVOGADRO;

/// Volume per molecule at 1 M, in nm³ (1 L = 1e24 nm³).
pub const AVOGADRO_VOLUME_NM3: f64 = 1.0e24 / N_AVOGADRO;

/// Electrostatic repulsion per existing backbone neighbor, kcal/mol.
const DH_PER_NEIGHBOR: f64 = -3.0;
/// Electrostatic repulsion per existing backbone neighbor, cal/mol·K.
const DS_PER_NEIGHBOR: f64 = -10.0;
/// Stacking gain per hybridized backbone neighbor, kcal/mol.
const DH_PER_STACK: f64 = -7.0;
/// Stacking gain per hybridized backbone neighbor, cal/mol·K.
const DS_PER_STACK: f64 = -20.0;
/// Ring-closure entropy penalty when both domains already share a
/// complex, cal/mol·K.
const DS_INTRA_COMPLEX: f64 = 4.0;

/// External nearest-neighbor thermodynamics contract.
///
/// Implementations return the standard enthalpy (kcal/mol) and entropy
/// (cal/mol·K) of duplex formation for a sequence pair. The parameter
/// tables themselves are outside the core.
pub trait NnThermo {
    /// Standard `(ΔH, ΔS)` of hybridization for the two sequences.
    fn duplex_dh_ds(&self, seq_a: &str, seq_b: &str) -> (f64, f64);
}

/// A fully corrected duplex energy evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuplexEnergy {
    /// Standard Gibbs free energy, cal/mol, corrections included.
    pub delta_g: f64,
    /// Enthalpy with corrections, kcal/mol.
    pub delta_h: f64,
    /// Entropy with corrections, cal/mol·K.
    pub delta_s: f64,
    /// The correction share of `delta_h`.
    pub delta_h_corr: f64,
    /// The correction share of `delta_s`.
    pub delta_s_corr: f64,
}

/// Memoizing energy model over an [`NnThermo`] implementation.
///
/// The table lookup is performed once per domain species pair; the
/// neighbor, stacking, and intra-complex corrections are evaluated
/// against the live graph on every call, since they depend on the
/// current hybridization state around the duplex.
#[derive(Debug)]
pub struct EnergyModel<N> {
    nn: N,
    memo: BTreeMap<(String, String), (f64, f64)>,
}

impl<N: NnThermo> EnergyModel<N> {
    /// Wrap a nearest-neighbor source.
    pub fn new(nn: N) -> Self {
        Self {
            nn,
            memo: BTreeMap::new(),
        }
    }

    /// Number of memoized species pairs.
    #[must_use]
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Standard Gibbs free energy of hybridization between two domains at
    /// temperature `t_kelvin`, assuming neither forms other structures in
    /// the single-stranded state.
    pub fn hybridization_energy(
        &mut self,
        tube: &Tube,
        a: DomainId,
        b: DomainId,
        t_kelvin: f64,
    ) -> DuplexEnergy {
        let da = tube.domain(a);
        let db = tube.domain(b);
        let key = (da.species().to_string(), db.species().to_string());
        let (dh0, ds0) = if let Some(&cached) = self.memo.get(&key) {
            cached
        } else {
            let fresh = self.nn.duplex_dh_ds(da.sequence(), db.sequence());
            self.memo.insert(key, fresh);
            fresh
        };

        // Existing backbone neighbors on the four sides of the duplex
        // (5′ and 3′ of both strands): electrostatic repulsion per dangle.
        let neighbors = [
            da.neighbor_5p(),
            da.neighbor_3p(),
            db.neighbor_5p(),
            db.neighbor_3p(),
        ];
        #[allow(clippy::cast_precision_loss)]
        let n_neighbors = neighbors.iter().flatten().count() as f64;
        // Of those, the count currently hybridized (0–4): one stacking
        // gain per hybridized neighbor.
        #[allow(clippy::cast_precision_loss)]
        let n_stacking = neighbors
            .iter()
            .flatten()
            .filter(|&&n| tube.domain(n).is_hybridized())
            .count() as f64;

        let delta_h_corr = DH_PER_NEIGHBOR * n_neighbors + DH_PER_STACK * n_stacking;
        let mut delta_s_corr = DS_PER_NEIGHBOR * n_neighbors + DS_PER_STACK * n_stacking;

        // Joining two points of one complex reduces its conformational
        // freedom.
        if tube.complex_of_domain(a) == tube.complex_of_domain(b) {
            delta_s_corr += DS_INTRA_COMPLEX;
        }

        let delta_h = dh0 + delta_h_corr;
        let delta_s = ds0 + delta_s_corr;
        let delta_g = 1000.0 * delta_h - t_kelvin * delta_s;

        DuplexEnergy {
            delta_g,
            delta_h,
            delta_s,
            delta_h_corr,
            delta_s_corr,
        }
    }

    /// Probability that the pair is in the hybridized state at `t_kelvin`
    /// with bias factor `q`.
    pub fn hybridization_probability(
        &mut self,
        tube: &Tube,
        a: DomainId,
        b: DomainId,
        t_kelvin: f64,
        q: f64,
    ) -> f64 {
        let energy = self.hybridization_energy(tube, a, b, t_kelvin);
        binary_state_probability(energy.delta_g, t_kelvin, q)
    }
}

/// Two-state occupancy: `K = exp(−ΔG/RT)`, `p = K·Q/(1 + K·Q)`,
/// saturating to the closed interval [0, 1] for extreme ΔG.
#[must_use]
pub fn binary_state_probability(delta_g: f64, t_kelvin: f64, q: f64) -> f64 {
    let exponent = -delta_g / (R_GAS_CAL * t_kelvin);
    // exp() overflows f64 around 709; saturate before it can produce inf*0.
    if exponent > 700.0 {
        return 1.0;
    }
    let kq = exponent.exp() * q;
    if !kq.is_finite() {
        return 1.0;
    }
    (kq / (1.0 + kq)).clamp(0.0, 1.0)
}
