//! Curve traits and implementations.

mod line;
mod nurbs;
mod polyline;

use knotwork_core::{NurbsError, Result, Tolerance};
use knotwork_math::{Point3, Vector3};

pub use line::Line;
pub use nurbs::{NurbsCurve, NurbsCurveData};
pub use polyline::Polyline;

/// Trait for parametric curves in 3D space.
pub trait Curve: Send + Sync {
    /// Return the parameter domain `(t_min, t_max)`.
    fn domain(&self) -> (f64, f64);

    /// Evaluate the curve at parameter `t`.
    fn point_at(&self, t: f64) -> Result<Point3>;

    /// Derivatives at `t` up to `order`; index 0 is the point, index 1 the
    /// (unnormalized) tangent.
    fn derivatives_at(&self, t: f64, order: usize) -> Result<Vec<Vector3>>;

    /// Polynomial degree of the curve pieces.
    fn degree(&self) -> usize;

    /// The same curve as a NURBS.
    fn to_nurbs(&self) -> NurbsCurve;

    /// Evaluate the tangent vector at parameter `t`.
    fn tangent_at(&self, t: f64) -> Result<Vector3> {
        let ders = self.derivatives_at(t, 1)?;
        Ok(ders[1])
    }

    /// Unit tangent at `t`; fails where the first derivative vanishes.
    fn unit_tangent_at(&self, t: f64) -> Result<Vector3> {
        let tangent = self.tangent_at(t)?;
        let len = tangent.length();
        if len < Tolerance::EPSILON {
            return Err(NurbsError::DegenerateGeometry(format!(
                "zero-length tangent at t={}",
                t
            )));
        }
        Ok(tangent / len)
    }

    /// Whether the curve is closed (start == end).
    fn is_closed(&self) -> bool {
        let (t0, t1) = self.domain();
        match (self.point_at(t0), self.point_at(t1)) {
            (Ok(a), Ok(b)) => (a - b).length() < Tolerance::MAX_TOLERANCE,
            _ => false,
        }
    }
}

/// Check `t` against `(t_min, t_max)` and snap round-off at the ends.
pub(crate) fn clamp_to_domain(domain: (f64, f64), t: f64) -> Result<f64> {
    let (lo, hi) = domain;
    if !(t >= lo - Tolerance::EPSILON && t <= hi + Tolerance::EPSILON) {
        return Err(NurbsError::Domain(format!(
            "parameter {} outside domain [{}, {}]",
            t, lo, hi
        )));
    }
    Ok(t.clamp(lo, hi))
}
