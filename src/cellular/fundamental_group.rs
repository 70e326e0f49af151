//! Presentations of π₁ of the manifold and of its boundary components.
//!
//! Generators are the cover edges outside the maximal tree; relators are the
//! cycle words with tree edges dropped. Generators are numbered component by
//! component, boundary edges first, so the generators of the `i`-th boundary
//! component form a contiguous block of the whole group's generators and the
//! inclusion map sends generator `j` to generator `offset + j`.

use std::ops::Range;
use std::sync::Arc;

use crate::algebra::presentation::{GroupPresentation, HomGroupPresentation, Word};
use crate::cellular::adjacency::AdjacencyStore;
use crate::cellular::cells::CellRegistry;
use crate::cellular::coordinates::PresentationLocator;
use crate::cellular::dual_graph::{CoverComplex, CoverEdge};
use crate::cellular::max_tree::{ComponentKind, MaximalTree};
use crate::debug_invariants::DebugInvariants;
use crate::homology_error::HomologyError;
use crate::topology::skeleton::Skeleton;

#[derive(Clone, Debug)]
struct ComponentBlock {
    kind: ComponentKind,
    generators: Range<usize>,
    relators: Vec<Word>,
}

#[derive(Clone, Debug)]
pub struct Pi1Data {
    complex: CoverComplex,
    tree: MaximalTree,
    /// Generator number of every cover edge outside the tree.
    generator_of: Vec<Option<usize>>,
    generator_count: usize,
    relators: Vec<Word>,
    blocks: Vec<ComponentBlock>,
}

impl Pi1Data {
    pub fn new(sk: &Skeleton, reg: &CellRegistry, adj: &AdjacencyStore) -> Result<Self, HomologyError> {
        let complex = CoverComplex::new(sk, reg, adj)?;
        crate::debug_invariants!(complex.validate_invariants(), "cover complex");
        let tree = MaximalTree::new(&complex)?;

        // 1. number the non-tree edges, one boundary component at a time
        let ne = complex.edges().len();
        let mut generator_of = vec![None; ne];
        let mut next = 0usize;
        let mut ranges = Vec::with_capacity(tree.components().len());
        for c in 0..tree.components().len() {
            let first = next;
            for e in 0..ne {
                if !tree.contains(e) && tree.edge_component(&complex, e) == Some(c) {
                    generator_of[e] = Some(next);
                    next += 1;
                }
            }
            ranges.push(first..next);
        }
        for e in 0..ne {
            if generator_of[e].is_none() && !tree.contains(e) {
                generator_of[e] = Some(next);
                next += 1;
            }
        }

        // 2. relators are the cycle words read off the generators
        let read = |word: &[(usize, i64)]| -> Word {
            word.iter()
                .filter_map(|&(e, d)| generator_of[e].map(|g| (g, d)))
                .collect()
        };
        let relators: Vec<Word> = complex.cycles().iter().map(|c| read(&c.word)).collect();

        // 3. a boundary cycle belongs to the component of its edges
        let mut blocks: Vec<ComponentBlock> = tree
            .components()
            .iter()
            .zip(ranges)
            .map(|(comp, generators)| ComponentBlock {
                kind: comp.kind,
                generators,
                relators: Vec::new(),
            })
            .collect();
        for cycle in complex.cycles().iter().filter(|c| c.kind.is_boundary()) {
            let Some(&(e, _)) = cycle.word.first() else {
                continue;
            };
            let c = tree.edge_component(&complex, e).ok_or_else(|| {
                HomologyError::InvalidTriangulation(format!("boundary cycle around {:?} leaves the boundary", cycle.cell))
            })?;
            let offset = blocks[c].generators.start;
            let local = read(&cycle.word).into_iter().map(|(g, d)| (g - offset, d)).collect();
            blocks[c].relators.push(local);
        }

        log::debug!(
            "pi1: {next} generators, {} relators, {} boundary components",
            relators.len(),
            blocks.len()
        );
        Ok(Pi1Data {
            complex,
            tree,
            generator_of,
            generator_count: next,
            relators,
            blocks,
        })
    }

    /// Blocks of one kind, in discovery order.
    fn blocks_of(&self, kind: ComponentKind) -> impl Iterator<Item = &ComponentBlock> {
        self.blocks.iter().filter(move |b| b.kind == kind)
    }

    fn block(&self, loc: PresentationLocator) -> Result<&ComponentBlock, HomologyError> {
        let (kind, i) = match loc {
            PresentationLocator::Whole => {
                return Err(HomologyError::UnsupportedHom("pi1(M) is not a boundary component".into()));
            }
            PresentationLocator::StandardBoundary(i) => (ComponentKind::Standard, i),
            PresentationLocator::IdealBoundary(i) => (ComponentKind::Ideal, i),
        };
        self.blocks_of(kind)
            .nth(i)
            .ok_or_else(|| HomologyError::UnsupportedHom(format!("{loc} does not exist")))
    }

    pub fn presentation(&self, loc: PresentationLocator) -> Result<GroupPresentation, HomologyError> {
        match loc {
            PresentationLocator::Whole => GroupPresentation::new(self.generator_count, self.relators.clone()),
            _ => {
                let b = self.block(loc)?;
                GroupPresentation::new(b.generators.len(), b.relators.clone())
            }
        }
    }

    /// Inclusion of a boundary component's group into the whole group.
    pub fn inclusion(
        &self,
        loc: PresentationLocator,
        domain: Arc<GroupPresentation>,
        range: Arc<GroupPresentation>,
    ) -> Result<HomGroupPresentation, HomologyError> {
        let b = self.block(loc)?;
        let images = b.generators.clone().map(|g| vec![(g, 1)]).collect();
        HomGroupPresentation::new(domain, range, images)
    }

    pub fn std_component_count(&self) -> usize {
        self.blocks_of(ComponentKind::Standard).count()
    }

    pub fn ideal_component_count(&self) -> usize {
        self.blocks_of(ComponentKind::Ideal).count()
    }

    pub fn complex(&self) -> &CoverComplex {
        &self.complex
    }

    /// Cover edge carrying each generator of the whole group.
    pub fn generator_edges(&self) -> Vec<CoverEdge> {
        let mut out = vec![None; self.generator_count];
        for (e, g) in self.generator_of.iter().enumerate() {
            if let Some(g) = *g {
                out[g] = Some(self.complex.edges()[e]);
            }
        }
        out.into_iter().flatten().collect()
    }

    pub fn tree(&self) -> &MaximalTree {
        &self.tree
    }
}
