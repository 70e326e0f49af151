//! The request coordinator.
//!
//! [`CellularData`] owns a copy of the triangulation together with its
//! skeleton, cell registry and adjacency store, and answers typed requests
//! (see [`crate::cellular::coordinates`]) by building the requested object
//! on first use and memoizing it, failures included.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::algebra::abelian_group::{AbelianGroup, MarkedAbelianGroup};
use crate::algebra::hom::HomMarkedAbelianGroup;
use crate::algebra::laurent::{LaurentPoly, PolyMatrix};
use crate::algebra::matrix::IntMatrix;
use crate::algebra::presentation::{GroupPresentation, HomGroupPresentation};
use crate::cellular::adjacency::AdjacencyStore;
use crate::cellular::alexander::AlexanderModule;
use crate::cellular::bilinear::BilinearForm;
use crate::cellular::cache::{InvalidateCache, Memo};
use crate::cellular::cells::CellRegistry;
use crate::cellular::coordinates::{
    BoolRequest, CoordinateSystem, FormKind, FormLocator, GroupLocator, HomLocator,
    PresentationLocator, StringRequest, Variance,
};
use crate::cellular::fundamental_group::Pi1Data;
use crate::cellular::linking::LinkingInvariants;
use crate::debug_invariants::DebugInvariants;
use crate::homology_error::HomologyError;
use crate::topology::skeleton::Skeleton;
use crate::topology::triangulation::Triangulation;
use crate::topology::validation::{validate_triangulation, TriangulationValidationOptions};

/// Engine configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineOptions {
    /// Input checks run at construction.
    pub validation: TriangulationValidationOptions,
    /// Check `∂∂ = 0` at construction and chain-map commutativity whenever a
    /// chain map is materialized, even in release builds.
    pub check_invariants: bool,
    /// Gauss sums with a smaller modulus count as zero (`σ = ∞`).
    pub gauss_sum_tolerance: f64,
    /// Largest p-primary group order searched exhaustively for a metabolizer.
    pub max_metabolizer_order: u64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            validation: TriangulationValidationOptions::default(),
            check_invariants: false,
            gauss_sum_tolerance: 1e-6,
            max_metabolizer_order: 1 << 12,
        }
    }
}

type Lazy<T> = OnceCell<Result<Arc<T>, HomologyError>>;

/// Cellular homology engine for one triangulated 3- or 4-manifold.
#[derive(Debug)]
pub struct CellularData {
    tri: Triangulation,
    sk: Skeleton,
    reg: CellRegistry,
    adj: AdjacencyStore,
    options: EngineOptions,

    complexes: Memo<(CoordinateSystem, usize), IntMatrix>,
    groups: Memo<GroupLocator, MarkedAbelianGroup>,
    pub(crate) homs: Memo<HomLocator, HomMarkedAbelianGroup>,
    pub(crate) forms: Memo<FormLocator, BilinearForm>,
    presentations: Memo<PresentationLocator, GroupPresentation>,
    inclusions: Memo<PresentationLocator, HomGroupPresentation>,
    strings: Memo<StringRequest, String>,

    pi1: Lazy<Pi1Data>,
    alexander: Lazy<AlexanderModule>,
    linking: Lazy<LinkingInvariants>,
    double_cover: Lazy<CellularData>,
}

impl CellularData {
    /// Engine with default options.
    pub fn new(tri: &Triangulation) -> Result<Self, HomologyError> {
        Self::with_options(tri, EngineOptions::default())
    }

    pub fn with_options(tri: &Triangulation, options: EngineOptions) -> Result<Self, HomologyError> {
        // 1. skeleton and input checks
        let sk = Skeleton::new(tri)?;
        validate_triangulation(tri, &sk, &options.validation)?;
        // 2. cells and their boundaries
        let reg = CellRegistry::new(&sk)?;
        let adj = AdjacencyStore::new(&sk, &reg)?;
        log::debug!(
            "cellular data: dim {} with {} simplices, {} ideal vertices, orientable = {}",
            tri.dim(),
            tri.size(),
            sk.ideal_vertex_count(),
            sk.is_orientable()
        );
        let data = Self {
            tri: tri.clone(),
            sk,
            reg,
            adj,
            options,
            complexes: Memo::new("chain complex"),
            groups: Memo::new("group"),
            homs: Memo::new("hom"),
            forms: Memo::new("form"),
            presentations: Memo::new("presentation"),
            inclusions: Memo::new("inclusion"),
            strings: Memo::new("string"),
            pi1: OnceCell::new(),
            alexander: OnceCell::new(),
            linking: OnceCell::new(),
            double_cover: OnceCell::new(),
        };
        // 3. optional eager consistency check
        crate::debug_invariants!(force data.options.check_invariants, data.validate_invariants(), "cellular data");
        Ok(data)
    }

    pub fn triangulation(&self) -> &Triangulation {
        &self.tri
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.sk
    }

    pub fn registry(&self) -> &CellRegistry {
        &self.reg
    }

    pub fn adjacency(&self) -> &AdjacencyStore {
        &self.adj
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    #[inline]
    pub fn ambient_dim(&self) -> usize {
        self.sk.dim()
    }

    pub fn is_orientable(&self) -> bool {
        self.sk.is_orientable()
    }

    /// No real boundary and no ideal vertices.
    pub fn is_closed(&self) -> bool {
        self.sk.is_closed()
    }

    pub fn cell_count(&self, d: usize, system: CoordinateSystem) -> Result<usize, HomologyError> {
        self.reg.count(system, d)
    }

    /// Euler characteristic of the compact manifold.
    pub fn euler_char(&self) -> Result<i64, HomologyError> {
        self.reg.euler_characteristic(CoordinateSystem::Std)
    }

    /// Integer boundary matrix `∂_d` of `system` (rows `(d−1)`-cells).
    pub fn integer_chain_complex(
        &self,
        d: usize,
        system: CoordinateSystem,
    ) -> Result<Arc<IntMatrix>, HomologyError> {
        self.complexes.get_or_try_insert_with(&(system, d), || {
            let m = self.adj.boundary(&self.sk, &self.reg, system, d)?.integer_matrix();
            log::debug!("boundary {system}_{d}: {}x{}", m.rows(), m.cols());
            Ok(m)
        })
    }

    /// `∂_d` padded at the ends of the complex: zero rows below dimension 0
    /// and zero columns above the top dimension.
    pub(crate) fn padded_boundary(&self, d: usize, system: CoordinateSystem) -> Result<IntMatrix, HomologyError> {
        let top = system.top_dim(self.ambient_dim());
        if d == 0 {
            return Ok(IntMatrix::zeros(0, self.reg.count(system, 0)?));
        }
        if d == top + 1 {
            return Ok(IntMatrix::zeros(self.reg.count(system, top)?, 0));
        }
        Ok((*self.integer_chain_complex(d, system)?).clone())
    }

    pub fn marked_group(&self, loc: &GroupLocator) -> Result<Arc<MarkedAbelianGroup>, HomologyError> {
        self.groups.get_or_try_insert_with(loc, || {
            self.reg.check_dim(loc.system, loc.dim)?;
            let modulus = loc.modulus_i64()?;
            let out = self.padded_boundary(loc.dim, loc.system)?;
            let inc = self.padded_boundary(loc.dim + 1, loc.system)?;
            let g = match loc.variance {
                Variance::Covariant => MarkedAbelianGroup::new(out, inc, modulus)?,
                Variance::Contravariant => MarkedAbelianGroup::new(inc.transpose(), out.transpose(), modulus)?,
            };
            log::debug!("{loc} = {}", g.group());
            Ok(g)
        })
    }

    pub fn unmarked_group(&self, loc: &GroupLocator) -> Result<AbelianGroup, HomologyError> {
        Ok(self.marked_group(loc)?.group().clone())
    }

    /// Rational Betti number `b_d(M)`.
    pub fn betti_number(&self, d: usize) -> Result<usize, HomologyError> {
        Ok(self.marked_group(&GroupLocator::homology(d, CoordinateSystem::Std))?.rank())
    }

    /// `Σ b_d t^d`.
    pub fn poincare_polynomial(&self) -> Result<LaurentPoly, HomologyError> {
        let mut p = LaurentPoly::default();
        for d in 0..=self.ambient_dim() {
            p.add_term(d as i64, self.betti_number(d)? as i64);
        }
        Ok(p)
    }

    pub fn hom(&self, loc: &HomLocator) -> Result<Arc<HomMarkedAbelianGroup>, HomologyError> {
        self.homs.get_or_try_insert_with(loc, || self.build_hom(loc))
    }

    /// Chain-level matrix of a hom; fails for homs that pass through the
    /// inverse of a homology isomorphism.
    pub fn chain_map(&self, loc: &HomLocator) -> Result<IntMatrix, HomologyError> {
        self.hom(loc)?
            .chain_matrix()
            .cloned()
            .ok_or_else(|| HomologyError::UnsupportedHom(format!("{loc} has no chain-level representative")))
    }

    pub fn form(&self, loc: &FormLocator) -> Result<Arc<BilinearForm>, HomologyError> {
        self.forms.get_or_try_insert_with(loc, || self.build_form(loc))
    }

    /// Signature of the intersection form on `H_2` of an orientable
    /// 4-manifold; 0 in every other case.
    pub fn signature(&self) -> Result<i64, HomologyError> {
        if self.ambient_dim() != 4 {
            return Ok(0);
        }
        if !self.is_orientable() {
            log::debug!("signature requested on a non-orientable manifold");
            return Ok(0);
        }
        let h2 = GroupLocator::homology(2, CoordinateSystem::Dual);
        self.form(&FormLocator::new(FormKind::Intersection, h2, h2))?.signature()
    }

    pub(crate) fn pi1_data(&self) -> Result<Arc<Pi1Data>, HomologyError> {
        self.pi1
            .get_or_init(|| Pi1Data::new(&self.sk, &self.reg, &self.adj).map(Arc::new))
            .clone()
    }

    pub fn group_presentation(&self, loc: PresentationLocator) -> Result<Arc<GroupPresentation>, HomologyError> {
        self.presentations
            .get_or_try_insert_with(&loc, || self.pi1_data()?.presentation(loc))
    }

    /// `π₁` of a boundary component into `π₁(M)`.
    pub fn inclusion_hom(&self, loc: PresentationLocator) -> Result<Arc<HomGroupPresentation>, HomologyError> {
        self.inclusions.get_or_try_insert_with(&loc, || {
            let pi1 = self.pi1_data()?;
            let domain = self.group_presentation(loc)?;
            let range = self.group_presentation(PresentationLocator::Whole)?;
            pi1.inclusion(loc, domain, range)
        })
    }

    /// Standard plus ideal boundary components.
    pub fn boundary_component_count(&self) -> Result<usize, HomologyError> {
        let pi1 = self.pi1_data()?;
        Ok(pi1.std_component_count() + pi1.ideal_component_count())
    }

    fn alexander_module(&self) -> Result<Arc<AlexanderModule>, HomologyError> {
        self.alexander
            .get_or_init(|| {
                let betti = self.betti_number(1)?;
                if betti != 1 {
                    return Err(HomologyError::AlexanderPrecondition { betti });
                }
                let whole = self.group_presentation(PresentationLocator::Whole)?;
                AlexanderModule::new(&whole).map(Arc::new)
            })
            .clone()
    }

    pub fn alexander_presentation_matrix(&self) -> Result<PolyMatrix, HomologyError> {
        Ok(self.alexander_module()?.presentation_matrix().clone())
    }

    pub fn alexander_ideal(&self) -> Result<Vec<LaurentPoly>, HomologyError> {
        Ok(self.alexander_module()?.ideal().to_vec())
    }

    /// Engine for the orientable double cover, sharing this engine's options.
    pub fn double_cover(&self) -> Result<Arc<CellularData>, HomologyError> {
        self.double_cover
            .get_or_init(|| {
                let cover = self.tri.orientable_double_cover()?;
                CellularData::with_options(&cover, self.options.clone()).map(Arc::new)
            })
            .clone()
    }

    pub(crate) fn linking_invariants(&self) -> Result<Arc<LinkingInvariants>, HomologyError> {
        self.linking
            .get_or_init(|| {
                if !self.is_orientable() {
                    return self.double_cover()?.linking_invariants();
                }
                let form = self.torsion_linking_form()?;
                LinkingInvariants::classify(&form, &self.options).map(Arc::new)
            })
            .clone()
    }

    pub fn string_info(&self, request: StringRequest) -> Result<Arc<String>, HomologyError> {
        self.strings.get_or_try_insert_with(&request, || {
            let inv = self.linking_invariants()?;
            let text = match request {
                StringRequest::TorsionRankVector => inv.rank_vector_string(),
                StringRequest::TorsionSigmaVector => inv.sigma_vector_string()?,
                StringRequest::TorsionLegendreSymbolVector => inv.legendre_vector_string(),
                StringRequest::EmbeddabilityComment => inv.embeddability_comment(self.is_closed())?,
            };
            Ok(if self.is_orientable() {
                text
            } else {
                format!("Orientable double cover: {text}")
            })
        })
    }

    pub fn bool_info(&self, request: BoolRequest) -> Result<bool, HomologyError> {
        let inv = self.linking_invariants()?;
        match request {
            BoolRequest::TorsionFormIsHyperbolic => inv.is_hyperbolic(),
            BoolRequest::TorsionFormIsSplit => inv.is_split(),
            BoolRequest::TorsionFormSatisfiesKkTwoTorCondition => inv.satisfies_kk_two_torsion(),
        }
    }
}

impl InvalidateCache for CellularData {
    fn invalidate_cache(&mut self) {
        self.complexes.clear();
        self.groups.clear();
        self.homs.clear();
        self.forms.clear();
        self.presentations.clear();
        self.inclusions.clear();
        self.strings.clear();
        self.pi1 = OnceCell::new();
        self.alexander = OnceCell::new();
        self.linking = OnceCell::new();
        self.double_cover = OnceCell::new();
    }
}

impl DebugInvariants for CellularData {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "cellular data");
    }

    /// `∂_d ∘ ∂_{d+1} = 0` in every coordinate system.
    fn validate_invariants(&self) -> Result<(), HomologyError> {
        for system in CoordinateSystem::ALL {
            let top = system.top_dim(self.ambient_dim());
            for d in 1..top {
                let lower = self.integer_chain_complex(d, system)?;
                let upper = self.integer_chain_complex(d + 1, system)?;
                if !lower.mul(&upper)?.is_zero() {
                    return Err(HomologyError::InvalidTriangulation(format!(
                        "boundary of boundary is nonzero in {system} at dimension {d}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lens_space_homology() {
        let data = CellularData::new(&Triangulation::lens_space(5, 2).unwrap()).unwrap();
        let h1 = data.unmarked_group(&GroupLocator::homology(1, CoordinateSystem::Std)).unwrap();
        assert_eq!((h1.rank(), h1.torsion()), (0, &[5][..]));
        assert_eq!(data.euler_char().unwrap(), 0);
        assert_eq!(data.poincare_polynomial().unwrap(), LaurentPoly::from_terms([(0, 1), (3, 1)]));
        data.validate_invariants().unwrap();
    }

    #[test]
    fn out_of_range_requests_fail_and_stay_failed() {
        let data = CellularData::new(&Triangulation::lens_space(3, 1).unwrap()).unwrap();
        let loc = GroupLocator::homology(3, CoordinateSystem::StdBdry);
        for _ in 0..2 {
            assert!(matches!(data.marked_group(&loc), Err(HomologyError::DimOutOfRange { .. })));
        }
    }

    #[test]
    fn memoized_groups_are_shared() {
        let data = CellularData::new(&Triangulation::lens_space(4, 1).unwrap()).unwrap();
        let loc = GroupLocator::cohomology(2, CoordinateSystem::Mix);
        let a = data.marked_group(&loc).unwrap();
        let b = data.marked_group(&loc).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.torsion(), &[4]);
    }
}
