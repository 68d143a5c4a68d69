//! Universal invariants driven end to end through stochastic runs.

use strandsim_engine::config::SimParams;
use strandsim_engine::simulator::Simulator;
use strandsim_harness::scenario::{build_tube, duplex_pair, symmetric_ring};
use strandsim_harness::thermo::UniformNn;
use strandsim_model::complex::IcidMode;
use strandsim_model::ids::DomainId;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// After thousands of stochastic transitions near the melting point:
/// reciprocal partners with complementary species, counters that match a
/// full recount, and connected complexes.
#[test]
fn stochastic_run_preserves_every_invariant() {
    init_logging();
    let tube = build_tube(1e-15, &duplex_pair(16)).unwrap();
    let params = SimParams {
        probability_oversampling_factor: 1e8,
        seed: 7,
        ..SimParams::default()
    };
    let mut sim = Simulator::new(tube, params, UniformNn::default()).unwrap();
    sim.simulate(328.0, 20_000).unwrap();

    let tube = sim.tube();
    tube.verify_counters().unwrap();

    let mut paired = 0u64;
    for domain in tube.domains().iter() {
        if let Some(partner) = domain.partner() {
            assert_eq!(
                tube.domain(partner).partner(),
                Some(domain.id()),
                "partner relation must be reciprocal"
            );
            assert_eq!(
                tube.pairing().complement(domain.species()),
                Some(tube.domain(partner).species()),
                "partners must be complementary species"
            );
            if domain.id() < partner {
                paired += 1;
            }
        }
    }
    assert_eq!(tube.n_domains_hybridized(), 2 * paired);

    for &cid in tube.complexes().keys() {
        assert!(tube.is_complex_connected(cid), "complex {cid} disconnected");
    }
}

/// As volume grows without bound the chance of a successful complement
/// selection in one step tends to zero: a liter-scale tube never reacts.
#[test]
fn infinite_dilution_never_encounters_a_partner() {
    init_logging();
    let tube = build_tube(1.0, &duplex_pair(16)).unwrap();
    let params = SimParams {
        volume: 1.0,
        seed: 3,
        ..SimParams::default()
    };
    let mut sim = Simulator::new(tube, params, UniformNn::default()).unwrap();
    sim.simulate(300.0, 5_000).unwrap();
    assert_eq!(sim.tube().n_changes(), 0);
}

/// The symmetric two-copy ring drives the icid machinery to its instance
/// fallback, after which a mutate + undo still restores the fingerprint.
#[test]
fn icid_fallback_survives_mutate_and_undo() {
    init_logging();
    let mut tube = build_tube(1e-15, &symmetric_ring()).unwrap();
    tube.hybridize(DomainId(0), DomainId(3)).unwrap();
    tube.hybridize(DomainId(2), DomainId(1)).unwrap();

    let home = tube.complex_of_domain(DomainId(0));
    let fp0 = tube.complex_state_fingerprint(home).unwrap();
    assert_eq!(
        tube.complexes().get(&home).unwrap().icid_mode(),
        &IcidMode::Instance
    );

    tube.dehybridize(DomainId(2), DomainId(1)).unwrap();
    assert_ne!(tube.complex_state_fingerprint(home).unwrap(), fp0);
    tube.hybridize(DomainId(2), DomainId(1)).unwrap();
    assert_eq!(tube.complex_state_fingerprint(home).unwrap(), fp0);
}
