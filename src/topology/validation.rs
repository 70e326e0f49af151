//! Input validation for triangulations handed to the engine.

use crate::homology_error::HomologyError;
use crate::topology::skeleton::Skeleton;
use crate::topology::triangulation::Triangulation;

/// Optional validation toggles for triangulation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriangulationValidationOptions {
    /// Require a single connected component.
    pub check_connected: bool,
    /// Require every gluing to be recorded consistently from both sides.
    pub check_gluing_consistency: bool,
    /// Require boundary vertex links to be discs (dimension 3 only).
    pub check_vertex_links: bool,
    /// How findings are reported.
    pub handling: ValidationHandling,
}

impl Default for TriangulationValidationOptions {
    fn default() -> Self {
        Self::all()
    }
}

impl TriangulationValidationOptions {
    /// Enable all checks and fail on the first finding.
    pub fn all() -> Self {
        Self {
            check_connected: true,
            check_gluing_consistency: true,
            check_vertex_links: true,
            handling: ValidationHandling::Error,
        }
    }

    /// Skip everything optional. Faces identified with themselves under a
    /// nontrivial permutation are still rejected when the skeleton is built.
    pub fn none() -> Self {
        Self {
            check_connected: false,
            check_gluing_consistency: false,
            check_vertex_links: false,
            handling: ValidationHandling::Ignore,
        }
    }
}

/// Behavior for validation findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationHandling {
    /// Skip the checks.
    Ignore,
    /// Log a warning per finding.
    Warn,
    /// Return an error on the first finding.
    Error,
}

fn report(handling: ValidationHandling, msg: String) -> Result<(), HomologyError> {
    match handling {
        ValidationHandling::Ignore => Ok(()),
        ValidationHandling::Warn => {
            log::warn!("triangulation validation: {msg}");
            Ok(())
        }
        ValidationHandling::Error => Err(HomologyError::InvalidTriangulation(msg)),
    }
}

/// Validate a triangulation before building cellular data on it.
pub fn validate_triangulation(
    tri: &Triangulation,
    skeleton: &Skeleton,
    options: &TriangulationValidationOptions,
) -> Result<(), HomologyError> {
    if !(3..=4).contains(&tri.dim()) {
        return Err(HomologyError::InvalidTriangulation(format!(
            "cellular data needs dimension 3 or 4, got {}",
            tri.dim()
        )));
    }
    if tri.size() == 0 {
        return Err(HomologyError::InvalidTriangulation("empty triangulation".into()));
    }
    let handling = options.handling;
    if handling == ValidationHandling::Ignore {
        return Ok(());
    }

    if options.check_connected && !tri.is_connected() {
        report(handling, "triangulation is disconnected".into())?;
    }

    if options.check_gluing_consistency {
        for s in 0..tri.size() {
            for f in 0..=tri.dim() {
                let Some(g) = tri.adjacent(s, f) else {
                    continue;
                };
                let back = tri.adjacent(g.simplex, g.perm.apply(f));
                let ok = back.is_some_and(|b| b.simplex == s && b.perm == g.perm.inverse());
                if !ok {
                    report(handling, format!("gluing of facet ({s}, {f}) is not symmetric"))?;
                }
            }
        }
    }

    if options.check_vertex_links && tri.dim() == 3 {
        for v in 0..skeleton.count(0) {
            if skeleton.is_boundary(0, v) {
                let chi = skeleton.link_euler_char(v);
                if chi != 1 {
                    report(
                        handling,
                        format!("boundary vertex {v} has a link of Euler characteristic {chi}"),
                    )?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_input_is_reported() {
        let tri = Triangulation::lens_space(3, 1)
            .unwrap()
            .orientable_double_cover()
            .unwrap();
        let sk = Skeleton::new(&tri).unwrap();
        let opts = TriangulationValidationOptions::all();
        assert!(matches!(
            validate_triangulation(&tri, &sk, &opts),
            Err(HomologyError::InvalidTriangulation(_))
        ));
        let warn = TriangulationValidationOptions {
            handling: ValidationHandling::Warn,
            ..opts
        };
        assert!(validate_triangulation(&tri, &sk, &warn).is_ok());
    }

    #[test]
    fn ball_passes() {
        let tri = Triangulation::from_facets(3, &[vec![0, 1, 2, 3]]).unwrap();
        let sk = Skeleton::new(&tri).unwrap();
        assert!(validate_triangulation(&tri, &sk, &TriangulationValidationOptions::all()).is_ok());
    }
}
