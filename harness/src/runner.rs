//! Run orchestration: wire definitions + parameters + thermodynamics
//! into an annealing run, sampling a melting curve along the way.

use strandsim_engine::config::SimParams;
use strandsim_engine::error::SimError;
use strandsim_engine::simulator::Simulator;
use strandsim_engine::stats::StatsSnapshot;
use strandsim_engine::thermo::NnThermo;
use strandsim_model::error::ModelError;
use strandsim_model::strand::StrandDef;
use strandsim_model::tube::Tube;

use crate::scenario;

/// How many occupancy samples to average per temperature.
const SAMPLES_PER_TEMPERATURE: u64 = 50;

/// Typed failure for harness runs.
#[derive(Debug)]
pub enum RunError {
    /// Tube or pairing construction failed.
    Model(ModelError),
    /// Simulation or configuration failed.
    Sim(SimError),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Model(e) => write!(f, "model error: {e}"),
            Self::Sim(e) => write!(f, "simulation error: {e}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Model(e) => Some(e),
            Self::Sim(e) => Some(e),
        }
    }
}

impl From<ModelError> for RunError {
    fn from(e: ModelError) -> Self {
        Self::Model(e)
    }
}

impl From<SimError> for RunError {
    fn from(e: SimError) -> Self {
        Self::Sim(e)
    }
}

/// Aggregate result of an annealing run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Total steps taken.
    pub n_steps: u64,
    /// Accepted state changes.
    pub n_changes: u64,
    /// Final fraction of hybridized domains.
    pub final_f_domains_hybridized: f64,
    /// Final fraction of hybridized strands.
    pub final_f_strands_hybridized: f64,
    /// Per-temperature mean fraction of hybridized strands, in ramp
    /// order.
    pub melting_curve: Vec<(f64, f64)>,
    /// Stats flushes that wrote output.
    pub flush_count: u64,
}

impl RunSummary {
    /// First ramp temperature at which the mean hybridized-strand
    /// fraction reaches `threshold`.
    #[must_use]
    pub fn crossing_temperature(&self, threshold: f64) -> Option<f64> {
        self.melting_curve
            .iter()
            .find(|&&(_, f)| f >= threshold)
            .map(|&(t, _)| t)
    }
}

/// Run an anneal over the definitions with the default case-swap
/// pairing, sampling the hybridized-strand fraction
/// [`SAMPLES_PER_TEMPERATURE`] times per temperature.
///
/// Stats streams flush at every temperature boundary, exactly as
/// [`Simulator::anneal`] does.
///
/// # Errors
///
/// Eager configuration errors for an incoherent schedule; otherwise
/// whatever construction or simulation raises.
pub fn run_anneal<N: NnThermo>(
    defs: &[StrandDef],
    params: SimParams,
    nn: N,
    t_start: f64,
    t_finish: f64,
    delta_t: f64,
    n_steps_per_t: u64,
) -> Result<RunSummary, RunError> {
    if delta_t == 0.0 || !delta_t.is_finite() {
        return Err(SimError::Config {
            detail: "anneal delta_t must be nonzero and finite".to_string(),
        }
        .into());
    }
    if (delta_t < 0.0 && t_start <= t_finish) || (delta_t > 0.0 && t_finish <= t_start) {
        return Err(SimError::Config {
            detail: format!(
                "ramp direction contradicts endpoints: {t_start} -> {t_finish} by {delta_t}"
            ),
        }
        .into());
    }

    let pairing = scenario::default_pairing(defs)?;
    let tube = Tube::new(params.volume, defs, pairing)?;
    let mut sim = Simulator::new(tube, params, nn)?;

    let chunk = (n_steps_per_t / SAMPLES_PER_TEMPERATURE).max(1);
    let mut melting_curve = Vec::new();

    let mut index: u64 = 0;
    loop {
        #[allow(clippy::cast_precision_loss)]
        let t = t_start + delta_t * index as f64;
        let past_end = if delta_t < 0.0 {
            t < t_finish - 1e-9
        } else {
            t > t_finish + 1e-9
        };
        if past_end {
            break;
        }

        let mut taken: u64 = 0;
        let mut f_sum = 0.0;
        let mut samples: u64 = 0;
        while taken < n_steps_per_t {
            let this_chunk = chunk.min(n_steps_per_t - taken);
            sim.simulate(t, this_chunk)?;
            taken += this_chunk;
            f_sum += StatsSnapshot::from_tube(t, sim.tube()).f_strands_hybridized;
            samples += 1;
        }
        #[allow(clippy::cast_precision_loss)]
        melting_curve.push((t, f_sum / samples as f64));

        sim.flush_stats(t)?;
        index += 1;
    }

    let final_snapshot = StatsSnapshot::from_tube(
        melting_curve.last().map_or(t_start, |&(t, _)| t),
        sim.tube(),
    );
    Ok(RunSummary {
        n_steps: sim.tube().n_steps(),
        n_changes: sim.tube().n_changes(),
        final_f_domains_hybridized: final_snapshot.f_domains_hybridized,
        final_f_strands_hybridized: final_snapshot.f_strands_hybridized,
        melting_curve,
        flush_count: sim.stats().flush_count(),
    })
}
