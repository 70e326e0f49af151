//! Small permutations of `{0, …, n−1}` with `n ≤ 5`.
//!
//! Gluing maps between facets of a 3- or 4-dimensional triangulation are
//! permutations of the simplex vertices, so a copyable fixed-size
//! representation is enough.

use core::fmt::{Debug, Display, Formatter};

use itertools::Itertools;

use crate::homology_error::HomologyError;

/// Permutation of `{0, …, len−1}`, stored as an image table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Perm {
    len: u8,
    images: [u8; Perm::MAX_LEN],
}

impl Perm {
    /// Largest supported permutation size (vertices of a pentachoron).
    pub const MAX_LEN: usize = 5;

    pub fn identity(n: usize) -> Self {
        debug_assert!(n <= Self::MAX_LEN);
        let mut images = [0u8; Self::MAX_LEN];
        for (i, slot) in images.iter_mut().enumerate().take(n) {
            *slot = i as u8;
        }
        Self {
            len: n as u8,
            images,
        }
    }

    /// Build from an image table, rejecting anything that is not a bijection.
    pub fn from_images(images: &[usize]) -> Result<Self, HomologyError> {
        let n = images.len();
        if n > Self::MAX_LEN {
            return Err(HomologyError::ShapeMismatch {
                expected: format!("at most {} points", Self::MAX_LEN),
                found: format!("{n} points"),
            });
        }
        let mut seen = [false; Self::MAX_LEN];
        let mut out = [0u8; Self::MAX_LEN];
        for (i, &x) in images.iter().enumerate() {
            if x >= n || seen[x] {
                return Err(HomologyError::ShapeMismatch {
                    expected: format!("a permutation of 0..{n}"),
                    found: format!("{images:?}"),
                });
            }
            seen[x] = true;
            out[i] = x as u8;
        }
        Ok(Self {
            len: n as u8,
            images: out,
        })
    }

    /// Transposition of `a` and `b` in `S_n`.
    pub fn transposition(n: usize, a: usize, b: usize) -> Self {
        let mut p = Self::identity(n);
        p.images.swap(a, b);
        p
    }

    /// Number of points permuted.
    #[inline]
    pub fn size(self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn apply(self, i: usize) -> usize {
        self.images[i] as usize
    }

    pub fn images(&self) -> impl Iterator<Item = usize> + '_ {
        self.images[..self.size()].iter().map(|&x| x as usize)
    }

    /// `self ∘ other`: first `other`, then `self`.
    #[inline]
    pub fn compose(self, other: Perm) -> Perm {
        debug_assert_eq!(self.len, other.len);
        let mut images = [0u8; Self::MAX_LEN];
        for (i, slot) in images.iter_mut().enumerate().take(self.size()) {
            *slot = self.images[other.images[i] as usize];
        }
        Perm {
            len: self.len,
            images,
        }
    }

    #[inline]
    pub fn inverse(self) -> Perm {
        let mut images = [0u8; Self::MAX_LEN];
        for i in 0..self.size() {
            images[self.images[i] as usize] = i as u8;
        }
        Perm {
            len: self.len,
            images,
        }
    }

    /// `+1` for even permutations, `−1` for odd ones.
    pub fn sign(self) -> i64 {
        let mut seen = [false; Self::MAX_LEN];
        let mut sign = 1;
        for start in 0..self.size() {
            if seen[start] {
                continue;
            }
            let mut len = 0;
            let mut i = start;
            while !seen[i] {
                seen[i] = true;
                i = self.apply(i);
                len += 1;
            }
            if len % 2 == 0 {
                sign = -sign;
            }
        }
        sign
    }

    /// All of `S_n` in lexicographic order of image tables.
    pub fn all(n: usize) -> Vec<Perm> {
        (0..n)
            .permutations(n)
            .filter_map(|p| Perm::from_images(&p).ok())
            .collect()
    }

    /// Position of `self` in [`Perm::all`] (Lehmer code).
    pub fn lex_index(self) -> usize {
        let n = self.size();
        let mut idx = 0;
        for i in 0..n {
            let smaller = (i + 1..n).filter(|&j| self.images[j] < self.images[i]).count();
            idx = idx * (n - i) + smaller;
        }
        idx
    }

    /// Inverse of [`Perm::lex_index`].
    pub fn from_lex_index(n: usize, mut idx: usize) -> Option<Perm> {
        let total: usize = (1..=n).product();
        if n > Self::MAX_LEN || idx >= total {
            return None;
        }
        let mut pool: Vec<usize> = (0..n).collect();
        let mut images = Vec::with_capacity(n);
        let mut block = total;
        for i in 0..n {
            block /= n - i;
            images.push(pool.remove(idx / block));
            idx %= block;
        }
        Perm::from_images(&images).ok()
    }
}

impl Debug for Perm {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "Perm(")?;
        for x in self.images() {
            write!(f, "{x}")?;
        }
        write!(f, ")")
    }
}

impl Display for Perm {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        for x in self.images() {
            write!(f, "{x}")?;
        }
        Ok(())
    }
}

/// Sign of the permutation `π` with `a[k] = b[π[k]]`.
///
/// `a` must be a rearrangement of `b`.
pub fn list_sign<T: PartialEq>(a: &[T], b: &[T]) -> i64 {
    debug_assert_eq!(a.len(), b.len());
    let pos: Vec<usize> = a
        .iter()
        .map(|x| b.iter().position(|y| y == x).unwrap_or(0))
        .collect();
    let inversions = (0..pos.len())
        .tuple_combinations()
        .filter(|&(i, j)| pos[i] > pos[j])
        .count();
    if inversions % 2 == 0 { 1 } else { -1 }
}

/// Sign of the permutation that sorts `xs`.
pub fn sort_sign<T: Ord + Clone>(xs: &[T]) -> i64 {
    let mut sorted = xs.to_vec();
    sorted.sort();
    list_sign(xs, &sorted)
}

#[cfg(test)]
mod layout_tests {
    use super::*;
    use static_assertions::{assert_eq_size, assert_impl_all};

    // Gluing tables store one `Perm` per facet.
    assert_eq_size!(Perm, [u8; 6]);
    assert_impl_all!(Perm: Copy, Send, Sync);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_and_invert() {
        let a = Perm::from_images(&[1, 2, 0, 3]).unwrap();
        let b = Perm::transposition(4, 0, 3);
        let ab = a.compose(b);
        assert_eq!(ab.images().collect::<Vec<_>>(), vec![3, 2, 0, 1]);
        assert_eq!(a.compose(a.inverse()), Perm::identity(4));
        assert_eq!(a.sign(), 1);
        assert_eq!(b.sign(), -1);
    }

    #[test]
    fn lexicographic_ranking() {
        let all = Perm::all(4);
        assert_eq!(all.len(), 24);
        for (i, p) in all.iter().enumerate() {
            assert_eq!(p.lex_index(), i);
            assert_eq!(Perm::from_lex_index(4, i), Some(*p));
        }
        assert_eq!(Perm::all(5)[119].to_string(), "43210");
    }

    #[test]
    fn rejects_non_bijections() {
        assert!(Perm::from_images(&[0, 0, 1]).is_err());
        assert!(Perm::from_images(&[0, 1, 2, 3, 4, 5]).is_err());
    }

    #[test]
    fn list_signs() {
        assert_eq!(list_sign(&[2, 1, 3], &[1, 2, 3]), -1);
        assert_eq!(list_sign(&[3, 1, 2], &[1, 2, 3]), 1);
        assert_eq!(sort_sign(&[5, 0, 2]), 1);
    }
}
