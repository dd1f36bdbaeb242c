//! Line segment curve.

use knotwork_core::{NurbsError, Result};
use knotwork_math::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::{clamp_to_domain, Curve, NurbsCurve};
use crate::nurbs::KnotVector;

/// A line segment from `start` to `end`, parameterized over `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point3,
    pub end: Point3,
}

impl Line {
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).length()
    }
}

impl Curve for Line {
    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn point_at(&self, t: f64) -> Result<Point3> {
        let t = clamp_to_domain(self.domain(), t)?;
        Ok(self.start + t * (self.end - self.start))
    }

    fn derivatives_at(&self, t: f64, order: usize) -> Result<Vec<Vector3>> {
        let mut ders = vec![self.point_at(t)?];
        ders.extend((1..=order).map(|k| {
            if k == 1 {
                self.end - self.start
            } else {
                Vector3::ZERO
            }
        }));
        Ok(ders)
    }

    fn degree(&self) -> usize {
        1
    }

    fn to_nurbs(&self) -> NurbsCurve {
        let knots = KnotVector::from_sorted(vec![0.0, 0.0, 1.0, 1.0]);
        let points = vec![self.start.extend(1.0), self.end.extend(1.0)];
        NurbsCurve::from_homogeneous(1, knots, points)
    }
}

impl TryFrom<&NurbsCurve> for Line {
    type Error = NurbsError;

    /// Succeeds for degree-1 curves with exactly two control points.
    fn try_from(curve: &NurbsCurve) -> Result<Self> {
        match curve.control_points() {
            [start, end] if curve.degree() == 1 => Ok(Self::new(*start, *end)),
            _ => Err(NurbsError::InvalidArgument(
                "curve is not a single line segment".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knotwork_math::DVec3;

    #[test]
    fn test_line_point_at() {
        let line = Line::new(DVec3::new(0.0, 0.0, 0.0), DVec3::new(2.0, 4.0, 6.0));
        let p = line.point_at(0.5).unwrap();
        assert!((p.x - 1.0).abs() < 1e-10);
        assert!((p.y - 2.0).abs() < 1e-10);
        assert!((p.z - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_line_endpoints() {
        let line = Line::new(DVec3::new(1.0, 2.0, 3.0), DVec3::new(4.0, 5.0, 6.0));
        let p0 = line.point_at(0.0).unwrap();
        let p1 = line.point_at(1.0).unwrap();
        assert!((p0 - line.start).length() < 1e-10);
        assert!((p1 - line.end).length() < 1e-10);
    }

    #[test]
    fn test_line_outside_domain() {
        let line = Line::new(DVec3::ZERO, DVec3::X);
        assert!(matches!(line.point_at(1.5), Err(NurbsError::Domain(_))));
        assert!(matches!(line.point_at(-0.1), Err(NurbsError::Domain(_))));
    }

    #[test]
    fn test_line_derivatives() {
        let line = Line::new(DVec3::new(0.0, 0.0, 0.0), DVec3::new(1.0, 0.0, 0.0));
        let ders = line.derivatives_at(0.5, 2).unwrap();
        assert_eq!(ders.len(), 3);
        assert!((ders[1] - DVec3::X).length() < 1e-10);
        assert_eq!(ders[2], DVec3::ZERO);
        let t = line.unit_tangent_at(0.25).unwrap();
        assert!((t - DVec3::X).length() < 1e-12);
    }

    #[test]
    fn test_line_to_nurbs_matches() {
        let line = Line::new(DVec3::new(1.0, -1.0, 0.0), DVec3::new(3.0, 2.0, 5.0));
        let nurbs = line.to_nurbs();
        assert_eq!(nurbs.degree(), 1);
        for &t in &[0.0, 0.3, 1.0] {
            let a = line.point_at(t).unwrap();
            let b = nurbs.point_at(t).unwrap();
            assert!((a - b).length() < 1e-12);
        }
        assert_eq!(Line::try_from(&nurbs).unwrap(), line);
    }
}
