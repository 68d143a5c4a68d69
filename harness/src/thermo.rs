//! Reference thermodynamics for end-to-end runs: a per-base-pair uniform
//! nearest-neighbor stub and the two-state melting temperature helper.
//!
//! Real parameter tables are an external collaborator; this stub honors
//! the same contract with flat per-pair averages, which is enough to
//! drive melting-curve scenarios whose expectations are computed against
//! the same numbers.

use strandsim_engine::thermo::{NnThermo, R_GAS_CAL};

/// Flat per-base-pair nearest-neighbor estimate.
///
/// Defaults are duplex-formation averages in the usual NN units: −8.0
/// kcal/mol·bp enthalpy, −22.0 cal/mol·K·bp entropy.
#[derive(Debug, Clone, Copy)]
pub struct UniformNn {
    /// Enthalpy per base pair, kcal/mol.
    pub dh_per_bp: f64,
    /// Entropy per base pair, cal/mol·K.
    pub ds_per_bp: f64,
}

impl Default for UniformNn {
    fn default() -> Self {
        Self {
            dh_per_bp: -8.0,
            ds_per_bp: -22.0,
        }
    }
}

impl NnThermo for UniformNn {
    fn duplex_dh_ds(&self, seq_a: &str, seq_b: &str) -> (f64, f64) {
        #[allow(clippy::cast_precision_loss)]
        let pairs = seq_a.len().min(seq_b.len()) as f64;
        (self.dh_per_bp * pairs, self.ds_per_bp * pairs)
    }
}

/// Two-state melting temperature at the given molar concentration:
/// the temperature where the dissociated and hybridized states are
/// equally occupied, `Tm = 1000·ΔH / (ΔS + R·ln c)`.
#[must_use]
pub fn two_state_tm(delta_h_kcal: f64, delta_s_cal: f64, conc_molar: f64) -> f64 {
    1000.0 * delta_h_kcal / (delta_s_cal + R_GAS_CAL * conc_molar.ln())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_nn_scales_with_length() {
        let nn = UniformNn::default();
        let (dh16, ds16) = nn.duplex_dh_ds(&"G".repeat(16), &"C".repeat(16));
        assert!((dh16 - -128.0).abs() < f64::EPSILON);
        assert!((ds16 - -352.0).abs() < f64::EPSILON);

        let (dh8, _) = nn.duplex_dh_ds(&"G".repeat(8), &"C".repeat(16));
        assert!((dh8 - -64.0).abs() < f64::EPSILON, "shorter side bounds the duplex");
    }

    #[test]
    fn tm_drops_with_dilution() {
        let tm_high = two_state_tm(-128.0, -352.0, 1e-3);
        let tm_low = two_state_tm(-128.0, -352.0, 1e-9);
        assert!(tm_high > tm_low, "dilution must lower Tm");
        // 16 bp at ~1.7 nM lands in the low-320s K with these averages.
        let tm = two_state_tm(-128.0, -352.0, 1.66e-9);
        assert!((320.0..335.0).contains(&tm), "unexpected Tm {tm}");
    }
}
