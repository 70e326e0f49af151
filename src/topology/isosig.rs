//! Isomorphism signatures.
//!
//! Compact printable encoding of a triangulation: a base-64 alphabet
//! (`a–z A–Z 0–9 + -`), integers written as little-endian runs of 6-bit
//! digits. The body lists one action per facet in breadth-first order
//! (boundary, new simplex, or gluing to an already numbered simplex), three
//! actions per character, followed by the destination of every gluing and
//! the lexicographic index of its permutation in `S_{dim+1}`.
//!
//! [`Triangulation::to_isosig`] encodes the labelling reached from simplex 0
//! without relabelling; it round-trips through [`Triangulation::from_isosig`]
//! but is not a canonical form.

use crate::homology_error::HomologyError;
use crate::topology::perm::Perm;
use crate::topology::triangulation::Triangulation;

const ALPHABET: &[u8; 64] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789+-";

const BOUNDARY: u8 = 0;
const NEW_SIMPLEX: u8 = 1;
const GLUE: u8 = 2;

fn digit(c: u8) -> Result<usize, HomologyError> {
    ALPHABET
        .iter()
        .position(|&a| a == c)
        .ok_or_else(|| HomologyError::InvalidIsosig(format!("bad character {:?}", c as char)))
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn next_digit(&mut self) -> Result<usize, HomologyError> {
        let c = *self
            .bytes
            .get(self.pos)
            .ok_or_else(|| HomologyError::InvalidIsosig("signature truncated".into()))?;
        self.pos += 1;
        digit(c)
    }

    fn read(&mut self, chars: usize) -> Result<usize, HomologyError> {
        let mut v = 0usize;
        for i in 0..chars {
            v |= self.next_digit()? << (6 * i);
        }
        Ok(v)
    }
}

fn write_int(out: &mut String, mut v: usize, chars: usize) {
    for _ in 0..chars {
        out.push(ALPHABET[v & 63] as char);
        v >>= 6;
    }
}

/// Characters per permutation index.
fn perm_chars(dim: usize) -> usize {
    let count: usize = (1..=dim + 1).product();
    if count <= 64 { 1 } else { 2 }
}

impl Triangulation {
    /// Decode a signature of a `dim`-dimensional triangulation.
    pub fn from_isosig(sig: &str, dim: usize) -> Result<Self, HomologyError> {
        let mut r = Reader {
            bytes: sig.as_bytes(),
            pos: 0,
        };
        let first = r.next_digit()?;
        let (size, chars) = if first < 63 {
            (first, 1)
        } else {
            let chars = r.next_digit()?;
            (r.read(chars)?, chars)
        };
        if size == 0 {
            return Err(HomologyError::InvalidIsosig("empty triangulation".into()));
        }
        let facets = (dim + 1) * size;

        let mut actions = Vec::new();
        let mut covered = 0;
        while covered < facets {
            let v = r.next_digit()?;
            for j in 0..3 {
                let a = ((v >> (2 * j)) & 3) as u8;
                if covered == facets {
                    if a != BOUNDARY {
                        return Err(HomologyError::InvalidIsosig("trailing facet action".into()));
                    }
                    continue;
                }
                match a {
                    BOUNDARY => covered += 1,
                    NEW_SIMPLEX | GLUE => covered += 2,
                    _ => return Err(HomologyError::InvalidIsosig("unknown facet action".into())),
                }
                actions.push(a);
            }
        }
        if covered != facets {
            return Err(HomologyError::InvalidIsosig("facet actions overrun".into()));
        }
        let joins = actions.iter().filter(|&&a| a == GLUE).count();
        let dests = (0..joins).map(|_| r.read(chars)).collect::<Result<Vec<_>, _>>()?;
        let pchars = perm_chars(dim);
        let perms = (0..joins)
            .map(|_| {
                let idx = r.read(pchars)?;
                Perm::from_lex_index(dim + 1, idx)
                    .ok_or_else(|| HomologyError::InvalidIsosig(format!("bad permutation index {idx}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if r.pos != sig.len() {
            return Err(HomologyError::InvalidIsosig("trailing characters".into()));
        }

        let mut tri = Triangulation::new(dim, size)?;
        let mut actions = actions.into_iter();
        let (mut next, mut join) = (1usize, 0usize);
        for s in 0..size {
            for f in 0..=dim {
                if tri.adjacent(s, f).is_some() {
                    continue;
                }
                let a = actions
                    .next()
                    .ok_or_else(|| HomologyError::InvalidIsosig("missing facet action".into()))?;
                match a {
                    NEW_SIMPLEX => {
                        if next >= size {
                            return Err(HomologyError::InvalidIsosig("too many simplices".into()));
                        }
                        tri.join(s, f, next, Perm::identity(dim + 1))?;
                        next += 1;
                    }
                    GLUE => {
                        if dests[join] >= size {
                            return Err(HomologyError::InvalidIsosig("bad destination".into()));
                        }
                        tri.join(s, f, dests[join], perms[join])
                            .map_err(|e| HomologyError::InvalidIsosig(e.to_string()))?;
                        join += 1;
                    }
                    _ => {}
                }
            }
        }
        log::trace!("decoded isosig {sig}: dim {dim}, {size} simplices");
        Ok(tri)
    }

    /// Encode the breadth-first labelling from simplex 0.
    pub fn to_isosig(&self) -> Result<String, HomologyError> {
        let n = self.size();
        let dim = self.dim();
        if n == 0 || !self.is_connected() {
            return Err(HomologyError::InvalidTriangulation(
                "signatures need a nonempty connected triangulation".into(),
            ));
        }
        let mut new_of = vec![usize::MAX; n];
        let mut relabel = vec![Perm::identity(dim + 1); n];
        let mut order = vec![0usize];
        new_of[0] = 0;
        let mut done = hashbrown::HashSet::new();
        let (mut actions, mut dests, mut perms) = (Vec::new(), Vec::new(), Vec::new());
        let mut k = 0;
        while k < order.len() {
            let s = order[k];
            let inv = relabel[s].inverse();
            for j in 0..=dim {
                if done.contains(&(k, j)) {
                    continue;
                }
                let f = inv.apply(j);
                let Some(g) = self.adjacent(s, f) else {
                    actions.push(BOUNDARY);
                    done.insert((k, j));
                    continue;
                };
                let t = g.simplex;
                if new_of[t] == usize::MAX {
                    new_of[t] = order.len();
                    order.push(t);
                    relabel[t] = relabel[s].compose(g.perm.inverse());
                    actions.push(NEW_SIMPLEX);
                } else {
                    actions.push(GLUE);
                    dests.push(new_of[t]);
                    perms.push(relabel[t].compose(g.perm).compose(relabel[s].inverse()));
                }
                done.insert((k, j));
                done.insert((new_of[t], relabel[t].apply(g.perm.apply(f))));
            }
            k += 1;
        }

        let mut out = String::new();
        let chars = if n < 63 {
            out.push(ALPHABET[n] as char);
            1
        } else {
            let mut chars = 1;
            while (1usize << (6 * chars)) <= n {
                chars += 1;
            }
            out.push(ALPHABET[63] as char);
            out.push(ALPHABET[chars] as char);
            write_int(&mut out, n, chars);
            chars
        };
        while actions.len() % 3 != 0 {
            actions.push(BOUNDARY);
        }
        for c in actions.chunks(3) {
            out.push(ALPHABET[(c[0] | (c[1] << 2) | (c[2] << 4)) as usize] as char);
        }
        for d in dests {
            write_int(&mut out, d, chars);
        }
        let pchars = perm_chars(dim);
        for p in perms {
            write_int(&mut out, p.lex_index(), pchars);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_small_signatures() {
        let s3 = Triangulation::from_isosig("bkaagj", 3).unwrap();
        assert_eq!(s3.size(), 1);
        assert_eq!(s3.boundary_facet_count(), 0);
        let fig8 = Triangulation::from_isosig("cPcbbbiht", 3).unwrap();
        assert_eq!(fig8.size(), 2);
        assert!(fig8.is_orientable());
        let cs = Triangulation::from_isosig("cMkabbb+aAa3blb", 4).unwrap();
        assert_eq!(cs.size(), 2);
        assert_eq!(cs.boundary_facet_count(), 0);
    }

    #[test]
    fn round_trip_of_own_encoding() {
        for (sig, dim) in [("cPcbbbiht", 3), ("eLPkbcddddcwjb", 3), ("cMkabbb+aAa3blb", 4)] {
            let t = Triangulation::from_isosig(sig, dim).unwrap();
            let again = Triangulation::from_isosig(&t.to_isosig().unwrap(), dim).unwrap();
            assert_eq!(again, t);
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(Triangulation::from_isosig("", 3).is_err());
        assert!(Triangulation::from_isosig("bkaag", 3).is_err());
        assert!(Triangulation::from_isosig("bkaagj*", 3).is_err());
        assert!(Triangulation::from_isosig("gepaadcefeffnkkanax", 3).is_err());
    }
}
