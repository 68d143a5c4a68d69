//! The step engine and annealing driver.
//!
//! One step selects a candidate pair, evaluates the acceptance
//! probability, and on acceptance mutates the tube graph and emits a
//! `changesampling` snapshot. The annealer sweeps a temperature schedule,
//! flushing the stats caches at every temperature boundary.
//!
//! The core is single-threaded with no suspension points; each step is
//! atomic with respect to itself. A long-running simulate call is
//! cancellable only at step boundaries via [`Simulator::simulate_until`].

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use strandsim_model::error::ModelError;
use strandsim_model::ids::DomainId;
use strandsim_model::tube::Tube;

use crate::config::SimParams;
use crate::error::SimError;
use crate::select::{self, Selection};
use crate::stats::{FlushContext, StatsCollector, StatsSnapshot, CHANGESAMPLING, TIMESAMPLING};
use crate::thermo::{EnergyModel, NnThermo};

/// What one step did to the tube.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The lottery drew no counterpart (null candidate or no complement).
    NoEncounter,
    /// A pair was evaluated but the dice left its state as-is.
    Unchanged,
    /// The pair hybridized.
    Hybridized(DomainId, DomainId),
    /// The pair dissociated.
    Dehybridized(DomainId, DomainId),
}

/// Everything required for a single simulation: the tube, the energy
/// model, the single seedable generator, parameters, and stats.
#[derive(Debug)]
pub struct Simulator<N> {
    tube: Tube,
    params: SimParams,
    energy: EnergyModel<N>,
    rng: ChaCha8Rng,
    stats: StatsCollector,
}

impl<N: NnThermo> Simulator<N> {
    /// Build a simulator. Parameters are validated eagerly.
    ///
    /// # Errors
    ///
    /// [`SimError::Config`] for incoherent parameters.
    pub fn new(tube: Tube, params: SimParams, nn: N) -> Result<Self, SimError> {
        params.validate()?;
        let stats = StatsCollector::new(
            params.stats_base_path.as_deref(),
            params.record_stats,
            params.print_statsline_when_saving,
        );
        log::info!(
            "simulator initiated at V={:.3e} L with {} strands spanning {} domains \
             (per-molecule concentration {:.3e} M)",
            tube.volume_liters(),
            tube.n_strands(),
            tube.n_domains(),
            tube.per_molecule_concentration()
        );
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(params.seed),
            energy: EnergyModel::new(nn),
            tube,
            params,
            stats,
        })
    }

    /// The tube.
    #[must_use]
    pub fn tube(&self) -> &Tube {
        &self.tube
    }

    /// Mutable tube access, for scenario setup and tests.
    pub fn tube_mut(&mut self) -> &mut Tube {
        &mut self.tube
    }

    /// Consume the simulator, returning the tube.
    #[must_use]
    pub fn into_tube(self) -> Tube {
        self.tube
    }

    /// The stats collector.
    #[must_use]
    pub fn stats(&self) -> &StatsCollector {
        &self.stats
    }

    /// The parameters.
    #[must_use]
    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Perform a single step at temperature `t_kelvin`.
    ///
    /// # Errors
    ///
    /// [`SimError::StatsIo`] if an automatic flush fails. Model-level
    /// precondition failures are invariant violations: fatal in debug
    /// builds, logged and discarded in release builds.
    pub fn step(&mut self, t_kelvin: f64) -> Result<StepOutcome, SimError> {
        let oversampling = self.params.probability_oversampling_factor;
        let Some(selection) = select::select_event_domains(&mut self.rng, &self.tube, oversampling)
        else {
            return Ok(StepOutcome::NoEncounter);
        };
        let Selection {
            first,
            second,
            already_hybridized,
        } = selection;
        let Some(second) = second else {
            // Selection miss: a normal no-op step, not an error.
            return Ok(StepOutcome::NoEncounter);
        };
        if first == second {
            return self.discard_step(ModelError::Invariant {
                detail: format!("selection produced {first} twice"),
            });
        }

        // Q defaults to 1: the concentration bias already lives in the
        // selection weights.
        let mut p_hyb = self
            .energy
            .hybridization_probability(&self.tube, first, second, t_kelvin, 1.0);
        if already_hybridized && oversampling > 1.0 {
            // For an existing duplex the oversampling factor accelerates
            // melting instead of selection.
            p_hyb = (1.0 - oversampling * (1.0 - p_hyb)).clamp(0.0, 1.0);
        }

        let u: f64 = self.rng.random();
        let desired_hybridized = u <= p_hyb;

        let outcome = match (already_hybridized, desired_hybridized) {
            (false, true) => match self.tube.hybridize(first, second) {
                Ok(()) => StepOutcome::Hybridized(first, second),
                Err(err) => return self.discard_step(err),
            },
            (true, false) => match self.tube.dehybridize(first, second) {
                Ok(()) => StepOutcome::Dehybridized(first, second),
                Err(err) => return self.discard_step(err),
            },
            _ => StepOutcome::Unchanged,
        };

        if matches!(
            outcome,
            StepOutcome::Hybridized(..) | StepOutcome::Dehybridized(..)
        ) && self.params.record_stats
        {
            self.stats
                .record(CHANGESAMPLING, StatsSnapshot::from_tube(t_kelvin, &self.tube));
            self.flush_if_overflowing(t_kelvin)?;
        }
        Ok(outcome)
    }

    fn discard_step(&mut self, err: ModelError) -> Result<StepOutcome, SimError> {
        if cfg!(debug_assertions) {
            panic!("step rejected by model: {err}");
        }
        log::error!("step rejected by model, discarding: {err}");
        Ok(StepOutcome::Unchanged)
    }

    /// Run `n_steps` steps at temperature `t_kelvin`.
    ///
    /// # Errors
    ///
    /// Propagates stats I/O failures; the in-memory caches survive for
    /// retry.
    pub fn simulate(&mut self, t_kelvin: f64, n_steps: u64) -> Result<(), SimError> {
        self.simulate_until(t_kelvin, n_steps, &|| false)
    }

    /// Run up to `n_steps` steps, polling `cancel` between steps.
    ///
    /// Counter invariants are checked at entry and exit (fatal in debug
    /// builds, logged in release).
    ///
    /// # Errors
    ///
    /// Propagates stats I/O failures.
    pub fn simulate_until(
        &mut self,
        t_kelvin: f64,
        n_steps: u64,
        cancel: &dyn Fn() -> bool,
    ) -> Result<(), SimError> {
        self.check_boundary_invariants();
        for done in 0..n_steps {
            if cancel() {
                log::debug!("simulation cancelled after {done} steps at T={t_kelvin} K");
                break;
            }
            let _ = self.step(t_kelvin)?;
            self.tube.note_step();
            if self.params.record_stats
                && self.tube.n_steps() % self.params.timesampling_frequency == 0
            {
                self.stats
                    .record(TIMESAMPLING, StatsSnapshot::from_tube(t_kelvin, &self.tube));
                self.flush_if_overflowing(t_kelvin)?;
            }
            if (done + 1) % 10_000 == 0 {
                log::debug!(
                    "simulated {} of {n_steps} steps at T={t_kelvin} K ({} state changes in {} total steps)",
                    done + 1,
                    self.tube.n_changes(),
                    self.tube.n_steps()
                );
            }
        }
        self.check_boundary_invariants();
        Ok(())
    }

    /// Sweep the temperature schedule, running `n_steps_per_t` steps at
    /// each temperature and flushing the stats caches after every one.
    ///
    /// # Errors
    ///
    /// [`SimError::Config`] eagerly for a zero `delta_t` or a ramp whose
    /// direction contradicts its endpoints; otherwise propagates
    /// simulate/flush failures.
    pub fn anneal(
        &mut self,
        t_start: f64,
        t_finish: f64,
        delta_t: f64,
        n_steps_per_t: u64,
    ) -> Result<(), SimError> {
        if delta_t == 0.0 || !delta_t.is_finite() {
            return Err(SimError::Config {
                detail: "anneal delta_t must be nonzero and finite".to_string(),
            });
        }
        if delta_t < 0.0 && t_start <= t_finish {
            return Err(SimError::Config {
                detail: format!(
                    "cooling ramp requires t_start > t_finish, got {t_start} -> {t_finish}"
                ),
            });
        }
        if delta_t > 0.0 && t_finish <= t_start {
            return Err(SimError::Config {
                detail: format!(
                    "heating ramp requires t_finish > t_start, got {t_start} -> {t_finish}"
                ),
            });
        }

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
            log::info!(
                "simulating at {t} K for {n_steps_per_t} steps \
                 (ramp {t_start} K to {t_finish} K in {delta_t} K increments)"
            );
            self.simulate(t, n_steps_per_t)?;
            self.stats
                .flush_all(&FlushContext::from_tube(t, &self.tube))?;
            index += 1;
        }
        Ok(())
    }

    /// Flush every cache now, regardless of fill level.
    ///
    /// # Errors
    ///
    /// [`SimError::StatsIo`] with flush context.
    pub fn flush_stats(&mut self, t_kelvin: f64) -> Result<(), SimError> {
        self.stats
            .flush_all(&FlushContext::from_tube(t_kelvin, &self.tube))
    }

    fn flush_if_overflowing(&mut self, t_kelvin: f64) -> Result<(), SimError> {
        if self.stats.any_over_threshold() {
            self.stats
                .flush_all(&FlushContext::from_tube(t_kelvin, &self.tube))?;
        }
        Ok(())
    }

    fn check_boundary_invariants(&self) {
        if let Err(err) = self.tube.verify_counters() {
            if cfg!(debug_assertions) {
                panic!("boundary invariant check failed: {err}");
            }
            log::error!("boundary invariant check failed: {err}");
        }
    }
}
