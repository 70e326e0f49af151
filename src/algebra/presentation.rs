//! Finite group presentations and homomorphisms between them.

use std::fmt;
use std::sync::Arc;

use crate::algebra::abelian_group::AbelianGroup;
use crate::algebra::matrix::IntMatrix;
use crate::homology_error::HomologyError;

/// A word in the generators: `(generator, exponent)` pairs read left to right.
pub type Word = Vec<(usize, i64)>;

/// Merge adjacent powers of the same generator and drop zero exponents.
pub fn free_reduce(word: &Word) -> Word {
    let mut out: Word = Vec::with_capacity(word.len());
    for &(g, e) in word {
        if e == 0 {
            continue;
        }
        match out.last_mut() {
            Some((h, f)) if *h == g => {
                *f += e;
                if *f == 0 {
                    out.pop();
                }
            }
            _ => out.push((g, e)),
        }
    }
    out
}

/// Inverse word.
pub fn invert(word: &Word) -> Word {
    word.iter().rev().map(|&(g, e)| (g, -e)).collect()
}

/// `⟨ g₀, …, g_{n−1} | r₁, r₂, … ⟩`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct GroupPresentation {
    generators: usize,
    relators: Vec<Word>,
}

impl GroupPresentation {
    pub fn new(generators: usize, relators: Vec<Word>) -> Result<Self, HomologyError> {
        for r in &relators {
            if let Some(&(g, _)) = r.iter().find(|(g, _)| *g >= generators) {
                return Err(HomologyError::ShapeMismatch {
                    expected: format!("generator below {generators}"),
                    found: format!("generator {g}"),
                });
            }
        }
        let relators = relators
            .iter()
            .map(free_reduce)
            .filter(|r| !r.is_empty())
            .collect();
        Ok(Self {
            generators,
            relators,
        })
    }

    #[inline]
    pub fn generator_count(&self) -> usize {
        self.generators
    }

    #[inline]
    pub fn relators(&self) -> &[Word] {
        &self.relators
    }

    /// Exponent-sum matrix, one column per relator.
    pub fn abelianization_matrix(&self) -> IntMatrix {
        let mut m = IntMatrix::zeros(self.generators, self.relators.len());
        for (c, r) in self.relators.iter().enumerate() {
            for &(g, e) in r {
                m.set(g, c, m.get(g, c) + e);
            }
        }
        m
    }

    pub fn abelianization(&self) -> Result<AbelianGroup, HomologyError> {
        AbelianGroup::from_relations(self.generators, &self.abelianization_matrix())
    }
}

impl fmt::Display for GroupPresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gens: Vec<String> = (0..self.generators).map(|g| format!("g{g}")).collect();
        let rels: Vec<String> = self
            .relators
            .iter()
            .map(|r| {
                r.iter()
                    .map(|&(g, e)| if e == 1 { format!("g{g}") } else { format!("g{g}^{e}") })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        write!(f, "< {} | {} >", gens.join(", "), rels.join(", "))
    }
}

/// Homomorphism given by the images of the domain generators.
#[derive(Clone, Debug)]
pub struct HomGroupPresentation {
    domain: Arc<GroupPresentation>,
    range: Arc<GroupPresentation>,
    images: Vec<Word>,
}

impl HomGroupPresentation {
    pub fn new(
        domain: Arc<GroupPresentation>,
        range: Arc<GroupPresentation>,
        images: Vec<Word>,
    ) -> Result<Self, HomologyError> {
        if images.len() != domain.generator_count() {
            return Err(HomologyError::ShapeMismatch {
                expected: format!("{} images", domain.generator_count()),
                found: format!("{} images", images.len()),
            });
        }
        if images.iter().flatten().any(|&(g, _)| g >= range.generator_count()) {
            return Err(HomologyError::ShapeMismatch {
                expected: format!("generators below {}", range.generator_count()),
                found: "out-of-range generator in image".into(),
            });
        }
        Ok(Self {
            domain,
            range,
            images,
        })
    }

    pub fn domain(&self) -> &Arc<GroupPresentation> {
        &self.domain
    }

    pub fn range(&self) -> &Arc<GroupPresentation> {
        &self.range
    }

    pub fn image(&self, generator: usize) -> &Word {
        &self.images[generator]
    }

    /// Image of a domain word.
    pub fn evaluate(&self, word: &Word) -> Word {
        let mut out = Word::new();
        for &(g, e) in word {
            let img = if e > 0 { self.images[g].clone() } else { invert(&self.images[g]) };
            for _ in 0..e.unsigned_abs() {
                out.extend_from_slice(&img);
            }
        }
        free_reduce(&out)
    }

    /// Induced map on abelianizations at the level of generators.
    pub fn abelianization_matrix(&self) -> IntMatrix {
        let mut m = IntMatrix::zeros(self.range.generator_count(), self.domain.generator_count());
        for (c, w) in self.images.iter().enumerate() {
            for &(g, e) in w {
                m.set(g, c, m.get(g, c) + e);
            }
        }
        m
    }

    /// `self ∘ inner`.
    pub fn compose(&self, inner: &HomGroupPresentation) -> Result<Self, HomologyError> {
        let images = inner.images.iter().map(|w| self.evaluate(w)).collect();
        Self::new(inner.domain.clone(), self.range.clone(), images)
    }
}
