//! Integer handles for the arena-allocated graph objects.
//!
//! Strands, domains, and complexes reference each other cyclically
//! (strand ↔ complex, domain ↔ partner), so objects live in stable
//! arenas and refer to each other by these ids only.

/// Handle of a [`crate::domain::Domain`] in the tube's domain arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainId(pub u32);

impl DomainId {
    /// Arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for DomainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "D[{}]", self.0)
    }
}

/// Handle of a [`crate::strand::Strand`] in the tube's strand arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StrandId(pub u32);

impl StrandId {
    /// Arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for StrandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S[{}]", self.0)
    }
}

/// Handle of a [`crate::complex::Complex`].
///
/// Complex ids are allocated sequentially and never reused. When a complex
/// splits, the surviving component keeps the lower id and the detached
/// component receives a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComplexId(pub u32);

impl std::fmt::Display for ComplexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "C[{}]", self.0)
    }
}

/// Which end of a domain participates in a stacking contact.
///
/// A stacking edge is directional: the 3′ end of one duplex stacks onto
/// the 5′ end of the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DomainEnd {
    /// The 5′ end.
    End5p,
    /// The 3′ end.
    End3p,
}

impl DomainEnd {
    /// The opposite end.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::End5p => Self::End3p,
            Self::End3p => Self::End5p,
        }
    }
}

/// One stack junction between two duplex ends.
///
/// The junction joins helix 1's 3′ end onto helix 2's 5′ end, and helix
/// 2's 3′ end onto helix 1's 5′ end. It therefore contributes two
/// *ordered* (3′ → 5′) stacking edges: `(h1_end3p, h2_end5p)` and
/// `(h2_end3p, h1_end5p)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StackingJunction {
    /// Domain whose 3′ end terminates helix 1.
    pub h1_end3p: DomainId,
    /// Domain whose 5′ end opens helix 2, opposite `h1_end3p`.
    pub h2_end5p: DomainId,
    /// Domain whose 3′ end terminates helix 2.
    pub h2_end3p: DomainId,
    /// Domain whose 5′ end opens helix 1, opposite `h2_end3p`.
    pub h1_end5p: DomainId,
}

impl StackingJunction {
    /// The two ordered (3′ → 5′) stacking edges this junction contributes.
    #[must_use]
    pub fn ordered_pairs(&self) -> [(DomainId, DomainId); 2] {
        [
            (self.h1_end3p, self.h2_end5p),
            (self.h2_end3p, self.h1_end5p),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_by_value() {
        assert!(DomainId(1) < DomainId(2));
        assert!(ComplexId(0) < ComplexId(7));
    }

    #[test]
    fn domain_end_opposite_round_trips() {
        assert_eq!(DomainEnd::End5p.opposite(), DomainEnd::End3p);
        assert_eq!(DomainEnd::End3p.opposite().opposite(), DomainEnd::End3p);
    }

    #[test]
    fn junction_pairs_run_three_prime_to_five_prime() {
        let j = StackingJunction {
            h1_end3p: DomainId(0),
            h2_end5p: DomainId(1),
            h2_end3p: DomainId(2),
            h1_end5p: DomainId(3),
        };
        assert_eq!(
            j.ordered_pairs(),
            [(DomainId(0), DomainId(1)), (DomainId(2), DomainId(3))]
        );
    }
}
