//! NURBS curve implementation.

use knotwork_core::{NurbsError, Result, Validate};
use knotwork_math::{vector::to_homogeneous, HomogeneousPoint, Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::{clamp_to_domain, Curve};
use crate::nurbs::{evaluate, interpolate, refine, KnotVector};

/// A NURBS (Non-Uniform Rational B-Spline) curve.
///
/// Weights default to 1, in which case the curve is a plain polynomial
/// B-spline. The knot vector is clamped and satisfies
/// `knots.len() == control_points.len() + degree + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NurbsCurveData")]
pub struct NurbsCurve {
    degree: usize,
    knots: KnotVector,
    control_points: Vec<Point3>,
    weights: Vec<f64>,
    #[serde(skip)]
    homogeneous: Vec<HomogeneousPoint>,
}

/// Unvalidated plain-data form of a [`NurbsCurve`], as read from serialized input.
#[derive(Debug, Clone, Deserialize)]
pub struct NurbsCurveData {
    pub degree: usize,
    pub knots: Vec<f64>,
    pub control_points: Vec<Point3>,
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
}

impl TryFrom<NurbsCurveData> for NurbsCurve {
    type Error = NurbsError;

    fn try_from(data: NurbsCurveData) -> Result<Self> {
        let knots = KnotVector::new(data.knots)?;
        match data.weights {
            Some(weights) => Self::with_weights(data.degree, knots, data.control_points, weights),
            None => Self::new(data.degree, knots, data.control_points),
        }
    }
}

impl NurbsCurve {
    /// Non-rational curve (all weights 1).
    pub fn new(degree: usize, knots: KnotVector, control_points: Vec<Point3>) -> Result<Self> {
        let weights = vec![1.0; control_points.len()];
        Self::with_weights(degree, knots, control_points, weights)
    }

    pub fn with_weights(
        degree: usize,
        knots: KnotVector,
        control_points: Vec<Point3>,
        weights: Vec<f64>,
    ) -> Result<Self> {
        let homogeneous = control_points
            .iter()
            .zip(&weights)
            .map(|(&p, &w)| to_homogeneous(p, w))
            .collect();
        let curve = Self {
            degree,
            knots,
            control_points,
            weights,
            homogeneous,
        };
        curve.validate()?;
        Ok(curve)
    }

    /// Non-rational curve through a uniform clamped knot vector on `[0, 1]`.
    pub fn from_points(degree: usize, control_points: Vec<Point3>) -> Result<Self> {
        let knots = KnotVector::uniform_clamped(degree, control_points.len())?;
        Self::new(degree, knots, control_points)
    }

    /// Curve of `degree` passing through `points` (chord-length parameters).
    pub fn interpolate(points: &[Point3], degree: usize) -> Result<Self> {
        let row: Vec<HomogeneousPoint> = points.iter().map(|&p| to_homogeneous(p, 1.0)).collect();
        let (knots, mut control) = interpolate::interpolate_rows(&[row], degree)?;
        let points = control.pop().unwrap_or_default();
        Ok(Self::from_homogeneous(degree, knots, points))
    }

    /// Build from homogeneous control points produced by an algorithm that
    /// keeps the curve valid.
    pub(crate) fn from_homogeneous(
        degree: usize,
        knots: KnotVector,
        homogeneous: Vec<HomogeneousPoint>,
    ) -> Self {
        let weights: Vec<f64> = homogeneous.iter().map(|h| h.w).collect();
        let control_points = homogeneous.iter().map(|h| h.truncate() / h.w).collect();
        Self {
            degree,
            knots,
            control_points,
            weights,
            homogeneous,
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn knots(&self) -> &KnotVector {
        &self.knots
    }

    pub fn control_points(&self) -> &[Point3] {
        &self.control_points
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Control points as `(x*w, y*w, z*w, w)`.
    pub fn homogeneous_points(&self) -> &[HomogeneousPoint] {
        &self.homogeneous
    }

    /// Whether any weight differs from 1.
    pub fn is_rational(&self) -> bool {
        self.weights
            .iter()
            .any(|&w| !approx::abs_diff_eq!(w, 1.0, epsilon = 1e-12))
    }

    /// The same curve with one more knot at the interior parameter `t`.
    pub fn insert_knot(&self, t: f64) -> Result<Self> {
        let (lo, hi) = self.domain();
        let t = clamp_to_domain((lo, hi), t)?;
        if t <= lo || t >= hi {
            return Err(NurbsError::InvalidArgument(format!(
                "knot {} must lie inside the domain",
                t
            )));
        }
        if self.knots.multiplicity(t) >= self.degree {
            return Err(NurbsError::InvalidArgument(format!(
                "knot {} already has full multiplicity",
                t
            )));
        }
        let (knots, points) = refine::insert_knot(self.degree, &self.knots, &self.homogeneous, t);
        Ok(Self::from_homogeneous(self.degree, KnotVector::from_sorted(knots), points))
    }

    /// Split into Bézier segments at the interior knots, in parameter order.
    pub fn decompose_into_beziers(&self) -> Vec<Self> {
        refine::decompose_into_beziers(self.degree, &self.knots, &self.homogeneous)
            .into_iter()
            .map(|(knots, points)| {
                Self::from_homogeneous(self.degree, KnotVector::from_sorted(knots), points)
            })
            .collect()
    }

    /// The same point set traversed in the opposite direction.
    pub fn reversed(&self) -> Self {
        let points = self.homogeneous.iter().rev().copied().collect();
        Self::from_homogeneous(self.degree, self.knots.reversed(), points)
    }
}

impl Validate for NurbsCurve {
    fn validate(&self) -> Result<()> {
        if self.control_points.is_empty() {
            return Err(NurbsError::InvalidArgument("curve has no control points".into()));
        }
        if self.weights.len() != self.control_points.len() {
            return Err(NurbsError::DimensionMismatch(format!(
                "{} weights for {} control points",
                self.weights.len(),
                self.control_points.len()
            )));
        }
        if let Some(w) = self.weights.iter().find(|w| !(w.is_finite() && **w > 0.0)) {
            return Err(NurbsError::InvalidArgument(format!(
                "weights must be positive, got {}",
                w
            )));
        }
        if self.control_points.iter().any(|p| !p.is_finite()) {
            return Err(NurbsError::InvalidArgument(
                "control points must be finite".into(),
            ));
        }
        self.knots.validate_for(self.degree, self.control_points.len())
    }
}

impl Curve for NurbsCurve {
    fn domain(&self) -> (f64, f64) {
        self.knots.domain(self.degree)
    }

    fn point_at(&self, t: f64) -> Result<Point3> {
        evaluate::rational_curve_point(self.degree, &self.knots, &self.homogeneous, t)
    }

    fn derivatives_at(&self, t: f64, order: usize) -> Result<Vec<Vector3>> {
        evaluate::rational_curve_derivatives(self.degree, &self.knots, &self.homogeneous, t, order)
    }

    fn degree(&self) -> usize {
        self.degree
    }

    fn to_nurbs(&self) -> NurbsCurve {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knotwork_math::DVec3;

    fn kv(v: &[f64]) -> KnotVector {
        KnotVector::new(v.to_vec()).unwrap()
    }

    fn unit_circle() -> NurbsCurve {
        let w = 1.0_f64 / 2.0_f64.sqrt();
        NurbsCurve::with_weights(
            2,
            kv(&[0.0, 0.0, 0.0, 0.25, 0.25, 0.5, 0.5, 0.75, 0.75, 1.0, 1.0, 1.0]),
            vec![
                DVec3::new(1.0, 0.0, 0.0),
                DVec3::new(1.0, 1.0, 0.0),
                DVec3::new(0.0, 1.0, 0.0),
                DVec3::new(-1.0, 1.0, 0.0),
                DVec3::new(-1.0, 0.0, 0.0),
                DVec3::new(-1.0, -1.0, 0.0),
                DVec3::new(0.0, -1.0, 0.0),
                DVec3::new(1.0, -1.0, 0.0),
                DVec3::new(1.0, 0.0, 0.0),
            ],
            vec![1.0, w, 1.0, w, 1.0, w, 1.0, w, 1.0],
        )
        .unwrap()
    }

    #[test]
    fn test_quadratic_bezier() {
        // Quadratic Bezier curve (degree 2, 3 control points)
        let curve = NurbsCurve::new(
            2,
            kv(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]),
            vec![
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(0.5, 1.0, 0.0),
                DVec3::new(1.0, 0.0, 0.0),
            ],
        )
        .unwrap();

        // Endpoints should interpolate
        let p0 = curve.point_at(0.0).unwrap();
        assert!((p0 - DVec3::new(0.0, 0.0, 0.0)).length() < 1e-10);

        let p1 = curve.point_at(1.0).unwrap();
        assert!((p1 - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-10);

        // Midpoint of quadratic Bezier: (1-t)^2 P0 + 2t(1-t) P1 + t^2 P2
        // At t=0.5: 0.25*P0 + 0.5*P1 + 0.25*P2 = (0.5, 0.5, 0)
        let pm = curve.point_at(0.5).unwrap();
        assert!((pm.x - 0.5).abs() < 1e-10);
        assert!((pm.y - 0.5).abs() < 1e-10);
        assert!(!curve.is_rational());
    }

    #[test]
    fn test_domain() {
        let curve = NurbsCurve::new(
            2,
            kv(&[0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 3.0, 3.0]),
            vec![DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z, DVec3::ONE],
        )
        .unwrap();
        assert_eq!(curve.domain(), (0.0, 3.0));
    }

    #[test]
    fn test_construction_errors() {
        let pts = vec![DVec3::ZERO, DVec3::X, DVec3::Y];
        let err = NurbsCurve::new(2, kv(&[0.0, 0.0, 0.0, 1.0, 1.0]), pts.clone()).unwrap_err();
        assert!(matches!(err, NurbsError::DimensionMismatch(_)));

        let knots = kv(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let err = NurbsCurve::with_weights(2, knots.clone(), pts.clone(), vec![1.0, 1.0]).unwrap_err();
        assert!(matches!(err, NurbsError::DimensionMismatch(_)));

        let err = NurbsCurve::with_weights(2, knots, pts, vec![1.0, -1.0, 1.0]).unwrap_err();
        assert!(matches!(err, NurbsError::InvalidArgument(_)));
    }

    #[test]
    fn test_nurbs_circle() {
        // Represent a unit circle as a NURBS curve (degree 2, 9 control points)
        let curve = unit_circle();
        assert!(curve.is_rational());
        assert!(curve.is_closed());

        // Check that all points lie on the unit circle
        let (t_min, t_max) = curve.domain();
        for i in 0..=20 {
            let t = t_min + (t_max - t_min) * i as f64 / 20.0;
            let p = curve.point_at(t).unwrap();
            let r = (p.x * p.x + p.y * p.y).sqrt();
            assert!(
                (r - 1.0).abs() < 1e-8,
                "NURBS circle point at t={} has radius {}, expected 1.0",
                t,
                r
            );
            assert!(p.z.abs() < 1e-10);
        }
    }

    #[test]
    fn test_tangent_direction() {
        // Straight line as a degree-1 curve: tangent should point in line direction
        let curve = NurbsCurve::from_points(1, vec![DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0)]).unwrap();
        let t = curve.tangent_at(0.5).unwrap();
        assert!(t.x > 0.0);
        assert!(t.y.abs() < 1e-10);
    }

    #[test]
    fn test_decompose_circle_into_quarters() {
        let circle = unit_circle();
        let pieces = circle.decompose_into_beziers();
        assert_eq!(pieces.len(), 4);
        for (i, piece) in pieces.iter().enumerate() {
            let (a, b) = piece.domain();
            assert!((a - 0.25 * i as f64).abs() < 1e-12);
            assert!((b - 0.25 * (i + 1) as f64).abs() < 1e-12);
            let mid = 0.5 * (a + b);
            let expected = circle.point_at(mid).unwrap();
            assert!((piece.point_at(mid).unwrap() - expected).length() < 1e-12);
        }
    }

    #[test]
    fn test_insert_knot_keeps_shape() {
        let circle = unit_circle();
        let refined = circle.insert_knot(0.4).unwrap();
        assert_eq!(refined.control_points().len(), circle.control_points().len() + 1);
        for &t in &[0.1, 0.4, 0.55, 0.9] {
            let a = circle.point_at(t).unwrap();
            let b = refined.point_at(t).unwrap();
            assert!((a - b).length() < 1e-12);
        }
        assert!(circle.insert_knot(1.5).is_err());
    }

    #[test]
    fn test_reversed() {
        let curve = NurbsCurve::from_points(
            3,
            vec![DVec3::ZERO, DVec3::new(1.0, 2.0, 0.0), DVec3::new(3.0, 2.0, 1.0), DVec3::new(4.0, 0.0, 0.0), DVec3::new(5.0, 1.0, 0.0)],
        )
        .unwrap();
        let rev = curve.reversed();
        for &t in &[0.0, 0.2, 0.5, 0.75, 1.0] {
            let a = curve.point_at(t).unwrap();
            let b = rev.point_at(1.0 - t).unwrap();
            assert!((a - b).length() < 1e-12);
        }
    }

    #[test]
    fn test_interpolate() {
        let pts = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(3.0, 4.0, 0.0),
            DVec3::new(-1.0, 4.0, 0.0),
            DVec3::new(-4.0, 0.0, 0.0),
            DVec3::new(-4.0, -3.0, 0.0),
        ];
        let curve = NurbsCurve::interpolate(&pts, 3).unwrap();
        assert_eq!(curve.control_points().len(), pts.len());
        assert!((curve.point_at(0.0).unwrap() - pts[0]).length() < 1e-10);
        assert!((curve.point_at(1.0).unwrap() - pts[4]).length() < 1e-10);
        assert!(curve.validate().is_ok());
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let curve = unit_circle();
        let json = serde_json::to_string(&curve).unwrap();
        let back: NurbsCurve = serde_json::from_str(&json).unwrap();
        assert_eq!(back, curve);

        let bad = r#"{"degree":2,"knots":[0,0,1,1],"control_points":[[0,0,0],[1,0,0],[2,0,0]]}"#;
        assert!(serde_json::from_str::<NurbsCurve>(bad).is_err());
    }
}
