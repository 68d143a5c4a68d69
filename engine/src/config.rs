//! Recognized simulation parameters, with eager validation.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::SimError;

/// Simulation configuration.
///
/// Loadable from JSON via [`SimParams::from_json_str`]; unknown upstream
/// spellings are tolerated where a historical alias exists.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Tube volume in liters; determines the base activity `1/(N_A·V)`.
    pub volume: f64,

    /// Multiplies selection weights, and the melt probability of already
    /// hybridized pairs, to reduce rejection in large dilute systems at
    /// the cost of strict kinetic fidelity.
    #[serde(alias = "probablity_oversampling_factor")]
    pub probability_oversampling_factor: f64,

    /// Steps between timesampling snapshots.
    pub timesampling_frequency: u64,

    /// Enable or disable stats capture.
    pub record_stats: bool,

    /// Emit a one-line summary on each flush.
    pub print_statsline_when_saving: bool,

    /// Seed of the simulator's single random generator.
    pub seed: u64,

    /// Base path for the stats output streams; each stream's filename is
    /// derived by suffixing `_<streamname>` before the extension. `None`
    /// bounds the caches but writes nothing.
    pub stats_base_path: Option<PathBuf>,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            volume: 1e-15,
            probability_oversampling_factor: 1.0,
            timesampling_frequency: 10,
            record_stats: true,
            print_statsline_when_saving: false,
            seed: 0,
            stats_base_path: None,
        }
    }
}

impl SimParams {
    /// Parse from a JSON object string.
    ///
    /// # Errors
    ///
    /// [`SimError::Config`] on malformed JSON.
    pub fn from_json_str(s: &str) -> Result<Self, SimError> {
        let params: Self = serde_json::from_str(s).map_err(|e| SimError::Config {
            detail: format!("malformed params JSON: {e}"),
        })?;
        params.validate()?;
        Ok(params)
    }

    /// Validate option coherence before any simulation starts.
    ///
    /// # Errors
    ///
    /// [`SimError::Config`] describing the first incoherent option found.
    pub fn validate(&self) -> Result<(), SimError> {
        if !self.volume.is_finite() || self.volume <= 0.0 {
            return Err(SimError::Config {
                detail: format!("volume must be finite and positive, got {}", self.volume),
            });
        }
        if !self.probability_oversampling_factor.is_finite()
            || self.probability_oversampling_factor <= 0.0
        {
            return Err(SimError::Config {
                detail: format!(
                    "probability_oversampling_factor must be finite and positive, got {}",
                    self.probability_oversampling_factor
                ),
            });
        }
        if self.timesampling_frequency == 0 {
            return Err(SimError::Config {
                detail: "timesampling_frequency must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
