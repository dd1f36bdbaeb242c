//! Polyline: a chain of straight segments.

use knotwork_core::{NurbsError, Result, Tolerance, Validate};
use knotwork_math::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::{clamp_to_domain, Curve, NurbsCurve};
use crate::nurbs::KnotVector;

/// An open chain of vertices, parameterized over `[0, 1]` by cumulative
/// chord length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point3>", into = "Vec<Point3>")]
pub struct Polyline {
    points: Vec<Point3>,
    params: Vec<f64>,
}

impl Polyline {
    /// Needs at least two vertices spanning a non-zero length.
    pub fn new(points: Vec<Point3>) -> Result<Self> {
        if points.len() < 2 {
            return Err(NurbsError::InvalidArgument(format!(
                "polyline needs at least 2 points, got {}",
                points.len()
            )));
        }
        let mut params = Vec::with_capacity(points.len());
        let mut acc = 0.0;
        params.push(0.0);
        for w in points.windows(2) {
            acc += (w[1] - w[0]).length();
            params.push(acc);
        }
        if acc < Tolerance::EPSILON {
            return Err(NurbsError::DegenerateGeometry(
                "polyline has zero length".into(),
            ));
        }
        for p in params.iter_mut() {
            *p /= acc;
        }
        let polyline = Self { points, params };
        polyline.validate()?;
        Ok(polyline)
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Parameter of each vertex.
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| (w[1] - w[0]).length()).sum()
    }

    /// Segment index containing `t`; zero-length segments are skipped.
    fn segment(&self, t: f64) -> usize {
        let last = self.points.len() - 2;
        let i = self.params.partition_point(|&p| p <= t);
        i.saturating_sub(1).min(last)
    }
}

impl Validate for Polyline {
    fn validate(&self) -> Result<()> {
        if self.points.iter().any(|p| !p.is_finite()) {
            return Err(NurbsError::InvalidArgument(
                "polyline points must be finite".into(),
            ));
        }
        Ok(())
    }
}

impl Curve for Polyline {
    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn point_at(&self, t: f64) -> Result<Point3> {
        let t = clamp_to_domain(self.domain(), t)?;
        let i = self.segment(t);
        let (t0, t1) = (self.params[i], self.params[i + 1]);
        let s = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
        Ok(self.points[i] + s * (self.points[i + 1] - self.points[i]))
    }

    fn derivatives_at(&self, t: f64, order: usize) -> Result<Vec<Vector3>> {
        let point = self.point_at(t)?;
        let i = self.segment(t.clamp(0.0, 1.0));
        let dt = self.params[i + 1] - self.params[i];
        let d1 = if dt > 0.0 {
            (self.points[i + 1] - self.points[i]) / dt
        } else {
            Vector3::ZERO
        };
        let mut ders = vec![point];
        ders.extend((1..=order).map(|k| if k == 1 { d1 } else { Vector3::ZERO }));
        Ok(ders)
    }

    fn degree(&self) -> usize {
        1
    }

    /// Degree-1 NURBS with the vertex parameters as knots. Repeated vertices
    /// are dropped.
    fn to_nurbs(&self) -> NurbsCurve {
        let mut knots = vec![0.0];
        let mut points = Vec::with_capacity(self.points.len());
        for (i, (&t, p)) in self.params.iter().zip(&self.points).enumerate() {
            if i > 0 && t <= knots[knots.len() - 1] {
                continue;
            }
            knots.push(t);
            points.push(p.extend(1.0));
        }
        knots.push(1.0);
        NurbsCurve::from_homogeneous(1, KnotVector::from_sorted(knots), points)
    }
}

impl TryFrom<Vec<Point3>> for Polyline {
    type Error = NurbsError;

    fn try_from(points: Vec<Point3>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<Polyline> for Vec<Point3> {
    fn from(polyline: Polyline) -> Self {
        polyline.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knotwork_math::dvec3;

    fn l_shape() -> Polyline {
        Polyline::new(vec![
            dvec3(0.0, 0.0, 0.0),
            dvec3(3.0, 0.0, 0.0),
            dvec3(3.0, 1.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_params_follow_chord_length() {
        let poly = l_shape();
        assert_eq!(poly.params(), &[0.0, 0.75, 1.0]);
        assert!((poly.length() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_point_at() {
        let poly = l_shape();
        assert!((poly.point_at(0.5).unwrap() - dvec3(2.0, 0.0, 0.0)).length() < 1e-12);
        assert!((poly.point_at(0.75).unwrap() - dvec3(3.0, 0.0, 0.0)).length() < 1e-12);
        assert!((poly.point_at(0.875).unwrap() - dvec3(3.0, 0.5, 0.0)).length() < 1e-12);
        assert!((poly.point_at(1.0).unwrap() - dvec3(3.0, 1.0, 0.0)).length() < 1e-12);
        assert!(poly.point_at(1.2).is_err());
    }

    #[test]
    fn test_derivative_is_segment_velocity() {
        let poly = l_shape();
        let d = poly.derivatives_at(0.9, 1).unwrap();
        assert!((d[1] - dvec3(0.0, 4.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_to_nurbs_matches() {
        let poly = l_shape();
        let nurbs = poly.to_nurbs();
        assert_eq!(nurbs.knots().as_slice(), &[0.0, 0.0, 0.75, 1.0, 1.0]);
        for &t in &[0.0, 0.2, 0.75, 0.9, 1.0] {
            let a = poly.point_at(t).unwrap();
            let b = nurbs.point_at(t).unwrap();
            assert!((a - b).length() < 1e-12);
        }
    }

    #[test]
    fn test_to_nurbs_drops_repeated_vertices() {
        let poly = Polyline::new(vec![
            dvec3(0.0, 0.0, 0.0),
            dvec3(1.0, 0.0, 0.0),
            dvec3(1.0, 0.0, 0.0),
            dvec3(1.0, 1.0, 0.0),
        ])
        .unwrap();
        let nurbs = poly.to_nurbs();
        assert_eq!(nurbs.control_points().len(), 3);
        assert_eq!(nurbs.knots().as_slice(), &[0.0, 0.0, 0.5, 1.0, 1.0]);
        assert!(nurbs.validate().is_ok());
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(
            Polyline::new(vec![dvec3(0.0, 0.0, 0.0)]),
            Err(NurbsError::InvalidArgument(_))
        ));
        assert!(matches!(
            Polyline::new(vec![dvec3(1.0, 1.0, 1.0); 3]),
            Err(NurbsError::DegenerateGeometry(_))
        ));
    }
}
