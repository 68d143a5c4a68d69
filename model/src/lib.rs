//! Strandsim Model: the domain-level DNA strand/complex graph.
//!
//! Strands are ordered sequences of domains; domains participate in
//! backbone, hybridization, and stacking interactions; connected domains
//! belong to the same complex. The [`tube::Tube`] owns every arena and is
//! the only mutator of the `partner` relation, so the reciprocity invariant
//! is enforced in exactly one place.
//!
//! # Module Dependency Direction
//!
//! `ids` ← `fingerprint` ← `domain`/`strand` ← `complex` ← `tube` ← `supercomplex`
//!
//! One-way only. No cycles. `tube` orchestrates; `complex` never reaches
//! back into the tube.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod complex;
pub mod domain;
pub mod error;
pub mod fingerprint;
pub mod ids;
pub mod strand;
pub mod supercomplex;
pub mod tube;
