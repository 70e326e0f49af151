//! Kawauchi–Kojima classification of torsion linking forms.
//!
//! A symmetric form `f: G × G → ℚ/ℤ` on a finite abelian group is stored as
//! numerators over a common denominator `N`. The group is split into its
//! `p`-primary parts, and each part is layered by the exponent `k` of its
//! cyclic summands `ℤ/p^k`. The invariants are:
//!
//! * the rank vector (number of `ℤ/p^k` summands per prime and layer),
//! * the sigma vector of the 2-part, read off the argument of the Gauss sum
//!   `Σ_{x ∈ G₂} exp(2πi · 2^{k−1} f(x, x))` (`∞` when the sum vanishes),
//! * the Legendre vector, the Legendre symbol of the determinant of each
//!   odd-primary layer form `p^{k−1} f` over `ℤ/p`.
//!
//! An odd-primary part is metabolic exactly when its Witt class vanishes:
//! only the odd layers contribute, and their orthogonal sum over `ℤ/p` has
//! even rank `R` and `(−1)^{R/2} · det` a square. The 2-part has no such
//! shortcut here; its sigma vector, the KK condition and the metabolizer
//! search enumerate the group and fail once its order exceeds
//! `EngineOptions::max_metabolizer_order`. Those failures stay confined to
//! the invariants that need the enumeration.

use std::f64::consts::PI;

use hashbrown::HashSet;
use num_complex::Complex64;
use num_integer::Integer;

use crate::algebra::matrix::IntMatrix;
use crate::cellular::bilinear::BilinearForm;
use crate::cellular::engine::EngineOptions;
use crate::homology_error::HomologyError;

/// Values of the form on generator coordinates, as numerators over `modulus`.
#[derive(Clone, Debug)]
struct Pairing {
    orders: Vec<i64>,
    modulus: i64,
    values: IntMatrix,
}

impl Pairing {
    fn value(&self, x: &[i64], y: &[i64]) -> i64 {
        let n = self.modulus as i128;
        let mut acc = 0i128;
        for (a, &xa) in x.iter().enumerate() {
            if xa == 0 {
                continue;
            }
            for (b, &yb) in y.iter().enumerate() {
                if yb != 0 {
                    acc = (acc + xa as i128 * yb as i128 * self.values.get(a, b) as i128).rem_euclid(n);
                }
            }
        }
        acc as i64
    }

    /// Is `scale · f(x, y)` zero in `ℚ/ℤ`?
    fn vanishes(&self, x: &[i64], y: &[i64], scale: i64) -> bool {
        (self.value(x, y) as i128 * scale as i128) % self.modulus as i128 == 0
    }
}

/// Cyclic summands `ℤ/p^k` of the `p`-primary part, as vectors in the
/// coordinates of `G`.
#[derive(Clone, Debug)]
struct PrimaryPart {
    p: i64,
    generators: Vec<(Vec<i64>, u32)>,
}

impl PrimaryPart {
    fn order(&self) -> Option<u64> {
        self.generators
            .iter()
            .try_fold(1u64, |acc, (_, k)| acc.checked_mul((self.p as u64).checked_pow(*k)?))
    }

    fn max_layer(&self) -> u32 {
        self.generators.iter().map(|(_, k)| *k).max().unwrap_or(0)
    }

    fn layer(&self, k: u32) -> Vec<&Vec<i64>> {
        self.generators.iter().filter(|(_, e)| *e == k).map(|(g, _)| g).collect()
    }

    fn rank_vector(&self) -> Vec<usize> {
        (1..=self.max_layer()).map(|k| self.layer(k).len()).collect()
    }
}

/// Elements of a finite subgroup spanned by `(generator, order)` pairs.
struct Enumeration {
    radices: Vec<i64>,
    elements: Vec<Vec<i64>>,
}

impl Enumeration {
    fn new(gens: &[(Vec<i64>, i64)], orders: &[i64], bound: u64) -> Option<Self> {
        let size = gens.iter().try_fold(1u64, |acc, (_, o)| acc.checked_mul(*o as u64))?;
        if size > bound {
            return None;
        }
        let radices: Vec<i64> = gens.iter().map(|(_, o)| *o).collect();
        let mut elements = Vec::with_capacity(size as usize);
        for idx in 0..size {
            let mut rest = idx as i64;
            let mut x = vec![0i64; orders.len()];
            for ((g, _), &r) in gens.iter().zip(&radices) {
                let c = rest % r;
                rest /= r;
                for (slot, &v) in x.iter_mut().zip(g) {
                    *slot += c * v;
                }
            }
            for (slot, &d) in x.iter_mut().zip(orders) {
                *slot = slot.rem_euclid(d);
            }
            elements.push(x);
        }
        Some(Self { radices, elements })
    }

    fn len(&self) -> usize {
        self.elements.len()
    }

    fn sum(&self, a: usize, b: usize) -> usize {
        let (mut ra, mut rb) = (a as i64, b as i64);
        let mut out = 0i64;
        let mut place = 1i64;
        for &r in &self.radices {
            let c = (ra % r + rb % r) % r;
            ra /= r;
            rb /= r;
            out += c * place;
            place *= r;
        }
        out as usize
    }
}

/// Depth-first search for an isotropic subgroup of order `target`.
fn find_metabolizer(pairing: &Pairing, en: &Enumeration, target: usize) -> bool {
    let isotropic: Vec<usize> = (0..en.len())
        .filter(|&i| i != 0 && pairing.vanishes(&en.elements[i], &en.elements[i], 1))
        .collect();
    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    let mut stack: Vec<(Vec<usize>, Vec<usize>)> = vec![(vec![0], Vec::new())];
    while let Some((members, gens)) = stack.pop() {
        if members.len() == target {
            return true;
        }
        for &x in &isotropic {
            if members.binary_search(&x).is_ok() {
                continue;
            }
            if !gens.iter().all(|&g| pairing.vanishes(&en.elements[x], &en.elements[g], 1)) {
                continue;
            }
            // ⟨H, x⟩ = ⋃ (H + m·x)
            let mut grown: Vec<usize> = members.clone();
            let mut shift = x;
            while members.binary_search(&shift).is_err() {
                grown.extend(members.iter().map(|&h| en.sum(h, shift)));
                shift = en.sum(shift, x);
            }
            grown.sort_unstable();
            grown.dedup();
            if grown.len() > target || target % grown.len() != 0 || !seen.insert(grown.clone()) {
                continue;
            }
            let mut next = gens.clone();
            next.push(x);
            stack.push((grown, next));
        }
    }
    false
}

fn prime_factors(mut n: i64) -> Vec<i64> {
    let mut out = Vec::new();
    let mut p = 2;
    while p * p <= n {
        if n % p == 0 {
            out.push(p);
            while n % p == 0 {
                n /= p;
            }
        }
        p += 1;
    }
    if n > 1 {
        out.push(n);
    }
    out
}

fn valuation(mut n: i64, p: i64) -> u32 {
    let mut v = 0;
    while n % p == 0 {
        n /= p;
        v += 1;
    }
    v
}

fn pow_mod(mut b: i64, mut e: i64, m: i64) -> i64 {
    let mut r = 1i64;
    b = b.rem_euclid(m);
    while e > 0 {
        if e & 1 == 1 {
            r = r * b % m;
        }
        b = b * b % m;
        e >>= 1;
    }
    r
}

/// Determinant over `ℤ/p`.
fn det_mod_p(mut m: Vec<Vec<i64>>, p: i64) -> i64 {
    let n = m.len();
    let mut det = 1i64;
    for c in 0..n {
        let Some(r) = (c..n).find(|&r| m[r][c].rem_euclid(p) != 0) else {
            return 0;
        };
        if r != c {
            m.swap(r, c);
            det = -det;
        }
        let pivot = m[c][c].rem_euclid(p);
        det = det * pivot % p;
        let inv = pow_mod(pivot, p - 2, p);
        for r in c + 1..n {
            let f = m[r][c].rem_euclid(p) * inv % p;
            for k in c..n {
                m[r][k] = (m[r][k] - f * m[c][k]).rem_euclid(p);
            }
        }
    }
    det.rem_euclid(p)
}

fn legendre(a: i64, p: i64) -> i8 {
    match pow_mod(a, (p - 1) / 2, p) {
        0 => 0,
        1 => 1,
        _ => -1,
    }
}

/// The Kawauchi–Kojima invariants of a torsion linking form and the
/// predicates derived from them. Invariants that need to enumerate the
/// 2-primary part keep their own `Result`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkingInvariants {
    /// `(p, [a₁, a₂, …])` per prime dividing `|G|`.
    rank_vector: Vec<(i64, Vec<usize>)>,
    /// One entry per 2-primary layer; `None` is `∞`.
    sigma_vector: Result<Vec<Option<u8>>, HomologyError>,
    /// `(p, [χ₁, χ₂, …])` per odd prime.
    legendre_vector: Vec<(i64, Vec<i8>)>,
    hyperbolic: Result<bool, HomologyError>,
    split: Result<bool, HomologyError>,
    kk_two_torsion: Result<bool, HomologyError>,
}

impl LinkingInvariants {
    pub fn classify(form: &BilinearForm, options: &EngineOptions) -> Result<Self, HomologyError> {
        let range = form.range();
        if range.generator_count() > 1 || range.rank() > 0 {
            return Err(HomologyError::UnsupportedForm(format!(
                "linking form valued in {}",
                range.group()
            )));
        }
        if !form.is_symmetric() {
            return Err(HomologyError::UnsupportedForm("non-symmetric linking form".into()));
        }
        let group = form.left();
        let t = group.generator_count();
        let orders: Vec<i64> = (0..t).map(|a| group.generator_order(a)).collect();
        if orders.contains(&0) {
            return Err(HomologyError::UnsupportedForm("linking form on a group with free part".into()));
        }
        let modulus = if range.generator_count() == 0 { 1 } else { range.generator_order(0) };
        let mut values = IntMatrix::zeros(t, t);
        for a in 0..t {
            for b in 0..t {
                values.set(a, b, form.reduced_pairing(a, b).first().copied().unwrap_or(0));
            }
        }
        let pairing = Pairing {
            orders: orders.clone(),
            modulus,
            values,
        };

        // 1. primary decomposition
        let total: i64 = orders.iter().product();
        let mut parts = Vec::new();
        for p in prime_factors(total) {
            let mut generators = Vec::new();
            for (a, &d) in orders.iter().enumerate() {
                let k = valuation(d, p);
                if k > 0 {
                    let mut g = vec![0i64; t];
                    g[a] = d / p.pow(k);
                    generators.push((g, k));
                }
            }
            parts.push(PrimaryPart { p, generators });
        }
        let rank_vector = parts.iter().map(|part| (part.p, part.rank_vector())).collect();

        // 2. odd layers
        let mut legendre_vector = Vec::new();
        for part in parts.iter().filter(|part| part.p != 2) {
            let p = part.p;
            let symbols = (1..=part.max_layer())
                .map(|k| legendre(det_mod_p(layer_matrix(&pairing, &part.layer(k), p, k), p), p))
                .collect();
            legendre_vector.push((p, symbols));
        }

        // 3. the 2-part: sigma vector and the KK condition
        let (sigma_vector, kk_two_torsion) = match parts.iter().find(|part| part.p == 2) {
            None => (Ok(Vec::new()), Ok(true)),
            Some(part) => {
                let gens: Vec<(Vec<i64>, i64)> =
                    part.generators.iter().map(|(g, k)| (g.clone(), 2i64.pow(*k))).collect();
                match Enumeration::new(&gens, &pairing.orders, options.max_metabolizer_order) {
                    Some(en) => {
                        let sigma = (1..=part.max_layer())
                            .map(|k| gauss_sigma(&pairing, &en, k, options.gauss_sum_tolerance))
                            .collect();
                        (Ok(sigma), Ok(kk_condition(&pairing, &en)))
                    }
                    None => {
                        let err = over_bound("2-primary part", part.order(), options);
                        log::warn!("{err}");
                        (Err(err.clone()), Err(err))
                    }
                }
            }
        };

        // 4. hyperbolicity and splitting
        let hyperbolic = if is_square(total as u64) {
            all_parts(parts.iter().map(|part| primary_hyperbolic(&pairing, part, options)))
        } else {
            Ok(false)
        };
        let split = all_parts(parts.iter().map(|part| primary_split(&pairing, part, options)));

        let inv = Self {
            rank_vector,
            sigma_vector,
            legendre_vector,
            hyperbolic,
            split,
            kk_two_torsion,
        };
        log::debug!("linking form invariants: {inv:?}");
        Ok(inv)
    }

    pub fn rank_vector(&self) -> &[(i64, Vec<usize>)] {
        &self.rank_vector
    }

    pub fn sigma_vector(&self) -> Result<&[Option<u8>], HomologyError> {
        self.sigma_vector.as_deref().map_err(Clone::clone)
    }

    pub fn legendre_vector(&self) -> &[(i64, Vec<i8>)] {
        &self.legendre_vector
    }

    /// `"2(1 0 1) 3(2)"`, or `"no torsion"`.
    pub fn rank_vector_string(&self) -> String {
        if self.rank_vector.is_empty() {
            return "no torsion".into();
        }
        self.rank_vector
            .iter()
            .map(|(p, ranks)| format!("{p}({})", join(ranks)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `"2(0 inf 3)"`, or `"no 2-torsion"`.
    pub fn sigma_vector_string(&self) -> Result<String, HomologyError> {
        let sigma = self.sigma_vector()?;
        if sigma.is_empty() {
            return Ok("no 2-torsion".into());
        }
        let entries: Vec<String> = sigma
            .iter()
            .map(|s| s.map_or_else(|| "inf".to_string(), |v| v.to_string()))
            .collect();
        Ok(format!("2({})", entries.join(" ")))
    }

    /// `"3(1 -1) 5(1)"`, or `"no odd p-torsion"`.
    pub fn legendre_vector_string(&self) -> String {
        if self.legendre_vector.is_empty() {
            return "no odd p-torsion".into();
        }
        self.legendre_vector
            .iter()
            .map(|(p, symbols)| format!("{p}({})", join(symbols)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_hyperbolic(&self) -> Result<bool, HomologyError> {
        self.hyperbolic.clone()
    }

    pub fn is_split(&self) -> Result<bool, HomologyError> {
        self.split.clone()
    }

    pub fn satisfies_kk_two_torsion(&self) -> Result<bool, HomologyError> {
        self.kk_two_torsion.clone()
    }

    /// What the form says about embedding the manifold in a homology
    /// 4-sphere.
    pub fn embeddability_comment(&self, closed: bool) -> Result<String, HomologyError> {
        let no_torsion = self.rank_vector.is_empty();
        Ok(match (closed, no_torsion) {
            (true, true) => "No torsion in H1: the linking form gives no obstruction to embedding in a homology 4-sphere.".into(),
            (true, false) if self.is_hyperbolic()? => {
                "The torsion linking form is hyperbolic: no obstruction to embedding in a homology 4-sphere.".into()
            }
            (true, false) => {
                "The torsion linking form is not hyperbolic: the manifold does not embed in a homology 4-sphere.".into()
            }
            (false, true) => "No torsion in H1: no obstruction to embedding in a homology 4-sphere.".into(),
            (false, false) if self.satisfies_kk_two_torsion()? => {
                "The 2-torsion condition holds: no obstruction to embedding in a homology 4-sphere.".into()
            }
            (false, false) => {
                "The 2-torsion condition fails: the manifold does not embed in a homology 4-sphere.".into()
            }
        })
    }
}

/// A definite `false` from any part wins over an undecided part.
fn all_parts(results: impl Iterator<Item = Result<bool, HomologyError>>) -> Result<bool, HomologyError> {
    let mut undecided = None;
    for r in results {
        match r {
            Ok(true) => {}
            Ok(false) => return Ok(false),
            Err(e) => undecided = undecided.or(Some(e)),
        }
    }
    undecided.map_or(Ok(true), Err)
}

fn over_bound(what: &str, order: Option<u64>, options: &EngineOptions) -> HomologyError {
    let order = order.map_or_else(|| "overflowing".to_string(), |o| o.to_string());
    HomologyError::UnsupportedForm(format!(
        "{what} of order {order} exceeds the enumeration bound {}",
        options.max_metabolizer_order
    ))
}

fn join<T: ToString>(xs: &[T]) -> String {
    xs.iter().map(T::to_string).collect::<Vec<_>>().join(" ")
}

fn is_square(n: u64) -> bool {
    let r = (n as f64).sqrt().round() as u64;
    (r.saturating_sub(1)..=r + 1).any(|s| s * s == n)
}

/// The layer form `p^{k−1} f` on the `ℤ/p^k` summands, over `ℤ/p`.
fn layer_matrix(pairing: &Pairing, layer: &[&Vec<i64>], p: i64, k: u32) -> Vec<Vec<i64>> {
    let scale = p.pow(k) as i128;
    let n = pairing.modulus as i128;
    layer
        .iter()
        .map(|x| {
            layer
                .iter()
                .map(|y| {
                    let v = pairing.value(x, y) as i128 * scale;
                    ((v / n) % p as i128) as i64
                })
                .collect()
        })
        .collect()
}

fn gauss_sigma(pairing: &Pairing, en: &Enumeration, k: u32, tolerance: f64) -> Option<u8> {
    let scale = 2i128.pow(k - 1);
    let n = pairing.modulus as i128;
    let mut sum = Complex64::new(0.0, 0.0);
    for x in &en.elements {
        let v = (pairing.value(x, x) as i128 * scale).rem_euclid(n);
        sum += Complex64::from_polar(1.0, 2.0 * PI * v as f64 / n as f64);
    }
    if sum.norm() < tolerance * en.len() as f64 {
        return None;
    }
    let eighths = (sum.arg() / (PI / 4.0)).rem_euclid(8.0);
    let frac = eighths - eighths.floor();
    if (frac - 0.5).abs() < 1e-3 {
        log::warn!("Gauss sum argument {eighths:.4}/8 is close to a tie");
    }
    // ties go to the smaller σ
    let sigma = if frac <= 0.5 { eighths.floor() } else { eighths.ceil() };
    Some((sigma as u8) % 8)
}

/// `2^{k−1} f(x, x) = 0` for every `x` of order `2^k`.
fn kk_condition(pairing: &Pairing, en: &Enumeration) -> bool {
    en.elements.iter().all(|x| {
        let order = x
            .iter()
            .zip(&pairing.orders)
            .map(|(&c, &d)| if c == 0 { 1 } else { d / c.gcd(&d) })
            .fold(1i64, |acc, o| acc.lcm(&o));
        order == 1 || pairing.vanishes(x, x, order / 2)
    })
}

fn metabolizer_search(
    pairing: &Pairing,
    gens: &[(Vec<i64>, i64)],
    options: &EngineOptions,
    p: i64,
) -> Option<bool> {
    let en = Enumeration::new(gens, &pairing.orders, options.max_metabolizer_order)?;
    let size = en.len();
    let target = (size as f64).sqrt().round() as usize;
    if target * target != size {
        return Some(false);
    }
    let found = find_metabolizer(pairing, &en, target);
    log::trace!("metabolizer search at p = {p} over {size} elements: {found}");
    Some(found)
}

/// Witt class test over `ℤ/p` for odd `p`; even layers are metabolic.
fn odd_primary_metabolic(pairing: &Pairing, part: &PrimaryPart) -> bool {
    let p = part.p;
    let (mut rank, mut det) = (0usize, 1i64);
    for k in (1..=part.max_layer()).step_by(2) {
        let layer = part.layer(k);
        if layer.is_empty() {
            continue;
        }
        rank += layer.len();
        det = det * det_mod_p(layer_matrix(pairing, &layer, p, k), p) % p;
    }
    if rank % 2 == 1 {
        return false;
    }
    let disc = if (rank / 2) % 2 == 0 { det } else { -det };
    legendre(disc.rem_euclid(p), p) == 1
}

fn primary_hyperbolic(pairing: &Pairing, part: &PrimaryPart, options: &EngineOptions) -> Result<bool, HomologyError> {
    if part.p != 2 {
        return Ok(odd_primary_metabolic(pairing, part));
    }
    let gens: Vec<(Vec<i64>, i64)> = part
        .generators
        .iter()
        .map(|(g, k)| (g.clone(), 2i64.pow(*k)))
        .collect();
    metabolizer_search(pairing, &gens, options, 2)
        .ok_or_else(|| over_bound("2-primary part", part.order(), options))
}

/// Odd layers diagonalize; an even 2-primary layer splits only into
/// hyperbolic planes.
fn primary_split(pairing: &Pairing, part: &PrimaryPart, options: &EngineOptions) -> Result<bool, HomologyError> {
    if part.p != 2 {
        return Ok(true);
    }
    all_parts((1..=part.max_layer()).map(|k| {
        let layer = part.layer(k);
        if layer.is_empty() {
            return Ok(true);
        }
        let m = layer_matrix(pairing, &layer, 2, k);
        if (0..m.len()).any(|i| m[i][i] % 2 != 0) {
            return Ok(true);
        }
        let gens: Vec<(Vec<i64>, i64)> = layer.iter().map(|g| ((*g).clone(), 2i64.pow(k))).collect();
        let order = 2u64.checked_pow(k * layer.len() as u32);
        metabolizer_search(pairing, &gens, options, 2)
            .ok_or_else(|| over_bound(&format!("2-primary layer {k}"), order, options))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::abelian_group::MarkedAbelianGroup;
    use std::sync::Arc;

    fn torsion_group(orders: &[i64]) -> Arc<MarkedAbelianGroup> {
        let t = orders.len();
        let mut rel = IntMatrix::zeros(t, t);
        for (i, &d) in orders.iter().enumerate() {
            rel.set(i, i, d);
        }
        Arc::new(MarkedAbelianGroup::new(IntMatrix::zeros(0, t), rel, 0).unwrap())
    }

    fn form(orders: &[i64], modulus: i64, values: &[&[i64]]) -> BilinearForm {
        let g = torsion_group(orders);
        let range = Arc::new(MarkedAbelianGroup::cyclic(modulus).unwrap());
        let pairing = values
            .iter()
            .map(|row| row.iter().map(|&v| vec![v]).collect())
            .collect();
        BilinearForm::from_pairing(g.clone(), g, range, pairing).unwrap()
    }

    #[test]
    fn cyclic_odd_form() {
        // f(1, 1) = 2/5
        let inv = LinkingInvariants::classify(&form(&[5], 5, &[&[2]]), &EngineOptions::default()).unwrap();
        assert_eq!(inv.rank_vector_string(), "5(1)");
        assert_eq!(inv.legendre_vector_string(), "5(-1)");
        assert_eq!(inv.sigma_vector_string().unwrap(), "no 2-torsion");
        assert!(!inv.is_hyperbolic().unwrap());
        assert!(inv.satisfies_kk_two_torsion().unwrap());
    }

    #[test]
    fn hyperbolic_plane() {
        // ℤ/3 ⊕ ℤ/3 with f(e₀, e₁) = 1/3 and isotropic axes
        let f = form(&[3, 3], 3, &[&[0, 1], &[1, 0]]);
        let inv = LinkingInvariants::classify(&f, &EngineOptions::default()).unwrap();
        assert_eq!(inv.rank_vector_string(), "3(2)");
        assert!(inv.is_hyperbolic().unwrap());
        assert!(inv.is_split().unwrap());
    }

    #[test]
    fn two_torsion() {
        // ℤ/2 with f(1, 1) = 1/2 fails the KK condition
        let f = form(&[2], 2, &[&[1]]);
        let inv = LinkingInvariants::classify(&f, &EngineOptions::default()).unwrap();
        assert_eq!(inv.rank_vector_string(), "2(1)");
        assert!(!inv.satisfies_kk_two_torsion().unwrap());
        // the Gauss sum 1 + e^{iπ} vanishes
        assert_eq!(inv.sigma_vector_string().unwrap(), "2(inf)");

        // ℤ/4 with f(1, 1) = 1/4: the sums are 2 + 2i and 1 − 1 + 1 − 1
        let g = form(&[4], 4, &[&[1]]);
        let inv = LinkingInvariants::classify(&g, &EngineOptions::default()).unwrap();
        assert_eq!(inv.sigma_vector_string().unwrap(), "2(1 inf)");
    }

    fn tiny_bound() -> EngineOptions {
        EngineOptions {
            max_metabolizer_order: 4,
            ..EngineOptions::default()
        }
    }

    #[test]
    fn odd_hyperbolicity_ignores_the_enumeration_bound() {
        // the form of L(9, 2): ℤ/9 with f(1, 1) = 2/9, metabolized by ⟨3⟩
        let f = form(&[9], 9, &[&[2]]);
        let inv = LinkingInvariants::classify(&f, &tiny_bound()).unwrap();
        assert_eq!(inv.rank_vector_string(), "3(0 1)");
        assert!(inv.is_hyperbolic().unwrap());
        let searched = LinkingInvariants::classify(&f, &EngineOptions::default()).unwrap();
        assert!(searched.is_hyperbolic().unwrap());

        // ℤ/5 ⊕ ℤ/5 with f = diag(1, 1)/5: −1 is a square mod 5
        let g = form(&[5, 5], 5, &[&[1, 0], &[0, 1]]);
        assert!(LinkingInvariants::classify(&g, &tiny_bound()).unwrap().is_hyperbolic().unwrap());
        // ℤ/3 ⊕ ℤ/3 with f = diag(1, 1)/3: −1 is not a square mod 3
        let h = form(&[3, 3], 3, &[&[1, 0], &[0, 1]]);
        assert!(!LinkingInvariants::classify(&h, &tiny_bound()).unwrap().is_hyperbolic().unwrap());
        assert!(!LinkingInvariants::classify(&h, &EngineOptions::default()).unwrap().is_hyperbolic().unwrap());

        // ℤ/27 with f(1, 1) = 1/27 has odd rank in layer 3
        let odd = form(&[27], 27, &[&[1]]);
        assert!(!LinkingInvariants::classify(&odd, &tiny_bound()).unwrap().is_hyperbolic().unwrap());
    }

    #[test]
    fn oversized_two_part_only_fails_the_enumerated_invariants() {
        // the form of L(24, 5): ℤ/24 with f(1, 1) = 5/24
        let f = form(&[24], 24, &[&[5]]);
        let inv = LinkingInvariants::classify(&f, &tiny_bound()).unwrap();
        assert_eq!(inv.rank_vector_string(), "2(0 0 1) 3(1)");
        assert!(!inv.legendre_vector_string().is_empty());
        assert!(matches!(inv.sigma_vector_string(), Err(HomologyError::UnsupportedForm(_))));
        assert!(inv.satisfies_kk_two_torsion().is_err());
        // |G| = 24 is not a square, so no enumeration is needed
        assert!(!inv.is_hyperbolic().unwrap());
        assert!(inv.is_split().unwrap());
        assert!(inv.embeddability_comment(true).unwrap().contains("not hyperbolic"));

        // ℤ/4 ⊕ ℤ/4 hyperbolic plane: the search would be needed and is refused
        let g = form(&[4, 4], 4, &[&[0, 1], &[1, 0]]);
        let inv = LinkingInvariants::classify(&g, &tiny_bound()).unwrap();
        assert!(inv.is_hyperbolic().is_err());
        assert!(inv.is_split().is_err());
        let full = LinkingInvariants::classify(&g, &EngineOptions::default()).unwrap();
        assert!(full.is_hyperbolic().unwrap());
    }

    #[test]
    fn helpers() {
        assert_eq!(prime_factors(360), vec![2, 3, 5]);
        assert_eq!(valuation(48, 2), 4);
        assert_eq!(det_mod_p(vec![vec![1, 2], vec![3, 4]], 5), 3);
        assert_eq!(legendre(2, 7), 1);
        assert_eq!(legendre(3, 7), -1);
        assert!(is_square(49) && !is_square(50));
    }
}
