//! Strandsim Harness: scenario construction and run orchestration.
//!
//! The harness assembles strand definitions into tubes, supplies a
//! reference nearest-neighbor stub for end-to-end runs, and wires
//! parameters + scenario + output paths into an annealing run with a
//! summarized result.
//!
//! The harness does NOT implement model or engine logic — scenarios
//! provide domain data only; the engine owns stepping and stats.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod runner;
pub mod scenario;
pub mod thermo;
