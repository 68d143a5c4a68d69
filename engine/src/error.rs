//! Typed simulation errors.

use std::path::PathBuf;

use strandsim_model::error::ModelError;

/// Typed failure for simulation operations.
///
/// A selection miss (no complement candidate, or the null candidate drawn)
/// is *not* an error; it is a normal no-op step and never surfaces here.
#[derive(Debug)]
pub enum SimError {
    /// Incoherent configuration (zero δT, reversed ramp, bad volume).
    /// Surfaced eagerly before simulation starts.
    Config { detail: String },

    /// A stats flush failed. The in-memory cache of the failed stream is
    /// preserved for retry; temperature and step identify the flush.
    StatsIo {
        stream: String,
        path: PathBuf,
        temperature: f64,
        step: u64,
        source: std::io::Error,
    },

    /// Counter mismatch, asymmetric partner relation, or a failed
    /// fingerprint-change contract. Fatal in debug builds; in release
    /// builds the offending step is logged and discarded.
    Invariant { detail: String },
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config { detail } => write!(f, "configuration error: {detail}"),
            Self::StatsIo {
                stream,
                path,
                temperature,
                step,
                source,
            } => write!(
                f,
                "stats flush failed for stream {stream:?} at {} (T={temperature} K, step {step}): {source}",
                path.display()
            ),
            Self::Invariant { detail } => write!(f, "invariant violation: {detail}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::StatsIo { source, .. } => Some(source),
            Self::Config { .. } | Self::Invariant { .. } => None,
        }
    }
}

impl From<ModelError> for SimError {
    fn from(err: ModelError) -> Self {
        Self::Invariant {
            detail: err.to_string(),
        }
    }
}
