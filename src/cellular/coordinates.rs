//! Coordinate systems and the typed locators used as cache keys.
//!
//! Locators derive `Ord` so they can key ordered caches; the derived orders
//! are part of the public contract.

use std::fmt;

use crate::homology_error::HomologyError;

/// Cell decomposition a chain complex is written in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CoordinateSystem {
    /// Open simplices plus the truncation cells around ideal vertices.
    Std,
    /// Dual polyhedral cells of the interior standard cells.
    Dual,
    /// Barycentric refinement of the standard cells.
    Mix,
    StdBdry,
    DualBdry,
    MixBdry,
    StdRelBdry,
    DualRelBdry,
    MixRelBdry,
}

/// Which decomposition a system is built from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Family {
    Std,
    Dual,
    Mix,
}

/// Whole manifold, its boundary, or the pair `(M, ∂M)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Part {
    Whole,
    Boundary,
    Relative,
}

impl CoordinateSystem {
    pub const ALL: [CoordinateSystem; 9] = [
        CoordinateSystem::Std,
        CoordinateSystem::Dual,
        CoordinateSystem::Mix,
        CoordinateSystem::StdBdry,
        CoordinateSystem::DualBdry,
        CoordinateSystem::MixBdry,
        CoordinateSystem::StdRelBdry,
        CoordinateSystem::DualRelBdry,
        CoordinateSystem::MixRelBdry,
    ];

    pub fn family(self) -> Family {
        use CoordinateSystem::*;
        match self {
            Std | StdBdry | StdRelBdry => Family::Std,
            Dual | DualBdry | DualRelBdry => Family::Dual,
            Mix | MixBdry | MixRelBdry => Family::Mix,
        }
    }

    pub fn part(self) -> Part {
        use CoordinateSystem::*;
        match self {
            Std | Dual | Mix => Part::Whole,
            StdBdry | DualBdry | MixBdry => Part::Boundary,
            StdRelBdry | DualRelBdry | MixRelBdry => Part::Relative,
        }
    }

    pub fn from_parts(family: Family, part: Part) -> Self {
        use CoordinateSystem::*;
        match (family, part) {
            (Family::Std, Part::Whole) => Std,
            (Family::Dual, Part::Whole) => Dual,
            (Family::Mix, Part::Whole) => Mix,
            (Family::Std, Part::Boundary) => StdBdry,
            (Family::Dual, Part::Boundary) => DualBdry,
            (Family::Mix, Part::Boundary) => MixBdry,
            (Family::Std, Part::Relative) => StdRelBdry,
            (Family::Dual, Part::Relative) => DualRelBdry,
            (Family::Mix, Part::Relative) => MixRelBdry,
        }
    }

    #[inline]
    pub fn is_boundary(self) -> bool {
        self.part() == Part::Boundary
    }

    /// Top cell dimension for an ambient manifold of dimension `ambient`.
    #[inline]
    pub fn top_dim(self, ambient: usize) -> usize {
        if self.is_boundary() { ambient - 1 } else { ambient }
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CoordinateSystem::Std => "STD",
            CoordinateSystem::Dual => "DUAL",
            CoordinateSystem::Mix => "MIX",
            CoordinateSystem::StdBdry => "STD_BDRY",
            CoordinateSystem::DualBdry => "DUAL_BDRY",
            CoordinateSystem::MixBdry => "MIX_BDRY",
            CoordinateSystem::StdRelBdry => "STD_REL_BDRY",
            CoordinateSystem::DualRelBdry => "DUAL_REL_BDRY",
            CoordinateSystem::MixRelBdry => "MIX_REL_BDRY",
        };
        f.write_str(s)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variance {
    Covariant,
    Contravariant,
}

/// Homology (covariant) or cohomology (contravariant) group in dimension
/// `dim` of `system` with `ℤ/modulus` coefficients; modulus 0 means ℤ.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupLocator {
    pub dim: usize,
    pub variance: Variance,
    pub system: CoordinateSystem,
    pub modulus: u64,
}

impl GroupLocator {
    pub fn new(dim: usize, variance: Variance, system: CoordinateSystem, modulus: u64) -> Self {
        Self {
            dim,
            variance,
            system,
            modulus,
        }
    }

    /// Integral homology.
    pub fn homology(dim: usize, system: CoordinateSystem) -> Self {
        Self::new(dim, Variance::Covariant, system, 0)
    }

    /// Integral cohomology.
    pub fn cohomology(dim: usize, system: CoordinateSystem) -> Self {
        Self::new(dim, Variance::Contravariant, system, 0)
    }

    pub fn with_modulus(self, modulus: u64) -> Self {
        Self { modulus, ..self }
    }

    pub fn with_system(self, system: CoordinateSystem) -> Self {
        Self { system, ..self }
    }

    pub fn with_dim(self, dim: usize) -> Self {
        Self { dim, ..self }
    }

    /// The modulus as an `i64`, the integer type of the algebra layer.
    pub fn modulus_i64(&self) -> Result<i64, HomologyError> {
        i64::try_from(self.modulus).map_err(|_| HomologyError::ArithmeticOverflow)
    }
}

impl fmt::Display for GroupLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = match self.variance {
            Variance::Covariant => "H_",
            Variance::Contravariant => "H^",
        };
        write!(f, "{h}{}({}", self.dim, self.system)?;
        if self.modulus == 0 {
            write!(f, "; Z)")
        } else {
            write!(f, "; Z_{})", self.modulus)
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HomLocator {
    pub domain: GroupLocator,
    pub range: GroupLocator,
}

impl HomLocator {
    pub fn new(domain: GroupLocator, range: GroupLocator) -> Self {
        Self { domain, range }
    }
}

impl fmt::Display for HomLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.domain, self.range)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormKind {
    /// Homology against cohomology of the same group.
    Evaluation,
    Intersection,
    TorsionLinking,
    /// Recognized as a locator; no coordinate combination is implemented.
    CupProduct,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormLocator {
    pub kind: FormKind,
    pub left: GroupLocator,
    pub right: GroupLocator,
}

impl FormLocator {
    pub fn new(kind: FormKind, left: GroupLocator, right: GroupLocator) -> Self {
        Self { kind, left, right }
    }
}

impl fmt::Display for FormLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}[{} x {}]", self.kind, self.left, self.right)
    }
}

/// Which fundamental group to present.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PresentationLocator {
    Whole,
    /// Component `i` of the real (non-ideal) boundary.
    StandardBoundary(usize),
    /// Cusp cross-section `i`.
    IdealBoundary(usize),
}

impl fmt::Display for PresentationLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresentationLocator::Whole => write!(f, "pi1(M)"),
            PresentationLocator::StandardBoundary(i) => write!(f, "pi1(std boundary {i})"),
            PresentationLocator::IdealBoundary(i) => write!(f, "pi1(ideal boundary {i})"),
        }
    }
}

/// Textual summaries of the torsion linking form.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StringRequest {
    TorsionRankVector,
    TorsionSigmaVector,
    TorsionLegendreSymbolVector,
    EmbeddabilityComment,
}

/// Predicates on the torsion linking form.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BoolRequest {
    TorsionFormIsHyperbolic,
    TorsionFormIsSplit,
    TorsionFormSatisfiesKkTwoTorCondition,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_round_trip() {
        for s in CoordinateSystem::ALL {
            assert_eq!(CoordinateSystem::from_parts(s.family(), s.part()), s);
        }
        assert_eq!(CoordinateSystem::MixBdry.top_dim(4), 3);
        assert_eq!(CoordinateSystem::DualRelBdry.top_dim(3), 3);
    }

    #[test]
    fn locators_order_and_print() {
        let a = GroupLocator::homology(1, CoordinateSystem::Std);
        let b = a.with_modulus(2);
        assert!(a < b);
        assert_eq!(b.to_string(), "H_1(STD; Z_2)");
        let c = GroupLocator::cohomology(2, CoordinateSystem::DualRelBdry);
        assert_eq!(c.to_string(), "H^2(DUAL_REL_BDRY; Z)");
        assert_eq!(HomLocator::new(a, b).to_string(), "H_1(STD; Z) -> H_1(STD; Z_2)");
    }
}
