//! Typed model errors.

use crate::ids::{DomainId, StrandId};

/// Typed failure for graph-model operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The strand is not a member of the complex it was addressed through.
    StrandNotPresent { strand: StrandId },

    /// A domain was addressed through a complex it does not belong to.
    DomainNotInComplex { domain: DomainId },

    /// Two domains were paired whose species are not complementary under
    /// the tube's pairing map.
    NotComplementary { first: DomainId, second: DomainId },

    /// A domain already has a hybridization partner.
    AlreadyPaired { domain: DomainId },

    /// A domain has no hybridization partner, or its partner is not the
    /// domain named in the operation.
    NotPaired { domain: DomainId },

    /// The hybridization edge to remove is not present.
    HybridizationEdgeMissing { first: DomainId, second: DomainId },

    /// The stacking edge to remove is not present, or an end to stack is
    /// already occupied.
    StackingEdgeConflict { detail: String },

    /// The pairing map declares a species as its own complement.
    SelfComplementarySpecies { species: String },

    /// An internal bookkeeping invariant failed (counter drift, asymmetric
    /// partner relation, complex map inconsistency). Fatal in debug
    /// builds; callers in release builds log and discard the step.
    Invariant { detail: String },
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StrandNotPresent { strand } => {
                write!(f, "strand {strand} is not a member of this complex")
            }
            Self::DomainNotInComplex { domain } => {
                write!(f, "domain {domain} does not belong to this complex")
            }
            Self::NotComplementary { first, second } => {
                write!(f, "domains {first} and {second} are not complementary")
            }
            Self::AlreadyPaired { domain } => {
                write!(f, "domain {domain} already has a hybridization partner")
            }
            Self::NotPaired { domain } => {
                write!(f, "domain {domain} is not paired as claimed")
            }
            Self::HybridizationEdgeMissing { first, second } => {
                write!(f, "no hybridization edge between {first} and {second}")
            }
            Self::StackingEdgeConflict { detail } => {
                write!(f, "stacking edge conflict: {detail}")
            }
            Self::SelfComplementarySpecies { species } => {
                write!(f, "species {species:?} is declared as its own complement")
            }
            Self::Invariant { detail } => {
                write!(f, "invariant violation: {detail}")
            }
        }
    }
}

impl std::error::Error for ModelError {}
