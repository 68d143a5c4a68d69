//! Shared helpers for strandsim benchmark suites.

use strandsim_engine::config::SimParams;
use strandsim_engine::simulator::Simulator;
use strandsim_harness::scenario::{build_tube, duplex_pair, symmetric_ring};
use strandsim_harness::thermo::UniformNn;
use strandsim_model::ids::DomainId;
use strandsim_model::tube::Tube;

/// A femtoliter duplex tube ready for stepping near its melting point.
///
/// # Panics
///
/// Panics if construction fails. Benchmark setup failures are fatal.
#[must_use]
pub fn duplex_simulator(seed: u64) -> Simulator<UniformNn> {
    let tube = build_tube(1e-15, &duplex_pair(16)).expect("duplex tube builds");
    let params = SimParams {
        probability_oversampling_factor: 1e8,
        record_stats: false,
        seed,
        ..SimParams::default()
    };
    Simulator::new(tube, params, UniformNn::default()).expect("simulator builds")
}

/// The symmetric two-copy ring complex, the worst case for icid
/// disambiguation and therefore for fingerprint recomputation.
///
/// # Panics
///
/// Panics if construction fails. Benchmark setup failures are fatal.
#[must_use]
pub fn ring_tube() -> Tube {
    let mut tube = build_tube(1e-15, &symmetric_ring()).expect("ring tube builds");
    tube.hybridize(DomainId(0), DomainId(3)).expect("first duplex forms");
    tube.hybridize(DomainId(2), DomainId(1)).expect("second duplex forms");
    tube
}
