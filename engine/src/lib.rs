//! Strandsim Engine: the kinetic Monte Carlo step engine.
//!
//! This crate provides the stochastic layer over `strandsim-model`. It
//! depends only on the model — it does NOT depend on `strandsim-harness`.
//!
//! # Crate dependency graph
//!
//! ```text
//! strandsim_model  ←  strandsim_engine  ←  strandsim_harness
//! (graph, tube)       (energy, steps)      (scenarios, runner)
//! ```
//!
//! # Key types
//!
//! - [`thermo::NnThermo`] — external nearest-neighbor thermodynamics contract
//! - [`thermo::EnergyModel`] — memoized ΔH/ΔS with neighbor corrections
//! - [`select::Selection`] — the two-stage event lottery result
//! - [`simulator::Simulator`] — step / simulate / anneal driver
//! - [`stats::StatsCollector`] — bounded snapshot caches with CSV flush
//! - [`config::SimParams`] — recognized configuration options
//!
//! Randomness is served by a single seedable generator owned by the
//! simulator; the uniform and categorical draws consume from it in a
//! deterministic, documented order.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod select;
pub mod simulator;
pub mod stats;
pub mod thermo;
