//! Arc length: Gauss-Legendre integration over Bézier segments and its inverse.

use std::sync::OnceLock;

use knotwork_core::{Result, Tolerance};

use crate::curve::{Curve, NurbsCurve};

/// Quadrature order used for every Bézier segment.
const GAUSS_ORDER: usize = 24;

/// Iteration cap for length inversion.
const MAX_INVERSION_STEPS: usize = 64;

/// Length accuracy targeted by [`bezier_param_at_length`], relative to the segment length.
const LENGTH_TOLERANCE: f64 = 1e-12;

/// Gauss-Legendre nodes and weights on `[-1, 1]`.
///
/// Roots of the Legendre polynomial are found by Newton iteration from a
/// Chebyshev initial guess.
pub fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut nodes = vec![0.0; n];
    let mut weights = vec![0.0; n];

    for i in 0..n.div_ceil(2) {
        let mut z = ((i as f64 + 0.75) / (n as f64 + 0.5) * std::f64::consts::PI).cos();
        for _ in 0..100 {
            let (p, dp) = legendre_p_and_dp(n, z);
            let z_new = z - p / dp;
            let done = (z_new - z).abs() < 1e-15;
            z = z_new;
            if done {
                break;
            }
        }

        let (_, dp) = legendre_p_and_dp(n, z);
        let w = 2.0 / ((1.0 - z * z) * dp * dp);
        nodes[i] = -z;
        nodes[n - 1 - i] = z;
        weights[i] = w;
        weights[n - 1 - i] = w;
    }

    (nodes, weights)
}

fn legendre_p_and_dp(n: usize, x: f64) -> (f64, f64) {
    let mut p_prev = 1.0;
    let mut p_curr = x;
    for k in 2..=n {
        let p_next = ((2 * k - 1) as f64 * x * p_curr - (k - 1) as f64 * p_prev) / k as f64;
        p_prev = p_curr;
        p_curr = p_next;
    }
    let dp = n as f64 * (x * p_curr - p_prev) / (x * x - 1.0);
    (p_curr, dp)
}

fn gauss_table() -> &'static (Vec<f64>, Vec<f64>) {
    static TABLE: OnceLock<(Vec<f64>, Vec<f64>)> = OnceLock::new();
    TABLE.get_or_init(|| gauss_legendre(GAUSS_ORDER))
}

fn speed(curve: &NurbsCurve, t: f64) -> Result<f64> {
    Ok(curve.tangent_at(t)?.length())
}

/// Length of a Bézier segment from the start of its domain up to `t`.
pub fn bezier_length(bezier: &NurbsCurve, t: f64) -> Result<f64> {
    let (a, _) = bezier.domain();
    if t <= a {
        return Ok(0.0);
    }
    let half = (t - a) * 0.5;
    let center = (t + a) * 0.5;
    let (nodes, weights) = gauss_table();

    let mut sum = 0.0;
    for (&x, &w) in nodes.iter().zip(weights) {
        sum += w * speed(bezier, center + half * x)?;
    }
    Ok(sum * half)
}

/// Parameter of a Bézier segment at which its length from the start equals
/// `length`.
///
/// Newton steps on `len(t) - length` are kept inside a shrinking bracket and
/// replaced by bisection when they leave it. The iteration is bounded; the
/// last estimate is returned if it has not converged.
pub fn bezier_param_at_length(bezier: &NurbsCurve, length: f64) -> Result<f64> {
    let (a, b) = bezier.domain();
    let total = bezier_length(bezier, b)?;
    if length <= 0.0 {
        return Ok(a);
    }
    if length >= total {
        return Ok(b);
    }

    let tolerance = LENGTH_TOLERANCE * total.max(1.0);
    let (mut lo, mut hi) = (a, b);
    let mut t = a + (b - a) * length / total;

    for _ in 0..MAX_INVERSION_STEPS {
        let f = bezier_length(bezier, t)? - length;
        if f.abs() < tolerance {
            break;
        }
        if f > 0.0 {
            hi = t;
        } else {
            lo = t;
        }
        let d = speed(bezier, t)?;
        let newton = if d > Tolerance::EPSILON { t - f / d } else { f64::NAN };
        t = if newton > lo && newton < hi {
            newton
        } else {
            0.5 * (lo + hi)
        };
    }
    Ok(t)
}

/// Cumulative arc length over a curve's Bézier segments.
///
/// Built once per curve and queried for lengths and their parameters.
#[derive(Debug, Clone)]
pub struct ArcLengthTable {
    segments: Vec<NurbsCurve>,
    cumulative: Vec<f64>,
    domain: (f64, f64),
}

impl ArcLengthTable {
    pub fn new(curve: &dyn Curve) -> Result<Self> {
        let nurbs = curve.to_nurbs();
        let segments = nurbs.decompose_into_beziers();
        let mut cumulative = Vec::with_capacity(segments.len());
        let mut acc = 0.0;
        for segment in &segments {
            acc += bezier_length(segment, segment.domain().1)?;
            cumulative.push(acc);
        }
        Ok(Self {
            segments,
            cumulative,
            domain: curve.domain(),
        })
    }

    pub fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Parameter at arc length `length` from the start, clamped to the domain.
    pub fn parameter_at(&self, length: f64) -> Result<f64> {
        if length <= 0.0 {
            return Ok(self.domain.0);
        }
        if length >= self.total() {
            return Ok(self.domain.1);
        }
        let i = self
            .cumulative
            .partition_point(|&c| c < length)
            .min(self.segments.len() - 1);
        let before = if i == 0 { 0.0 } else { self.cumulative[i - 1] };
        bezier_param_at_length(&self.segments[i], length - before)
    }
}

/// Approximate arc length of the whole curve.
pub fn curve_length(curve: &dyn Curve) -> Result<f64> {
    Ok(ArcLengthTable::new(curve)?.total())
}

/// Parameter at arc length `length` from the start of the curve.
///
/// Lengths outside `[0, curve_length]` clamp to the domain ends.
pub fn parameter_at_length(curve: &dyn Curve, length: f64) -> Result<f64> {
    ArcLengthTable::new(curve)?.parameter_at(length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{Line, Polyline};
    use crate::nurbs::KnotVector;
    use approx::assert_abs_diff_eq;
    use knotwork_math::DVec3;

    fn unit_circle() -> NurbsCurve {
        let w = std::f64::consts::FRAC_1_SQRT_2;
        let knots = KnotVector::new(vec![0.0, 0.0, 0.0, 0.25, 0.25, 0.5, 0.5, 0.75, 0.75, 1.0, 1.0, 1.0]).unwrap();
        let pts = [
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (-1.0, 1.0),
            (-1.0, 0.0),
            (-1.0, -1.0),
            (0.0, -1.0),
            (1.0, -1.0),
            (1.0, 0.0),
        ]
        .iter()
        .map(|&(x, y)| DVec3::new(x, y, 0.0))
        .collect();
        NurbsCurve::with_weights(2, knots, pts, vec![1.0, w, 1.0, w, 1.0, w, 1.0, w, 1.0]).unwrap()
    }

    #[test]
    fn test_gauss_legendre_integrates_polynomials() {
        let (nodes, weights) = gauss_legendre(5);
        let sum_w: f64 = weights.iter().sum();
        assert_abs_diff_eq!(sum_w, 2.0, epsilon = 1e-14);
        // x^8 over [-1, 1] = 2/9, exact for 5 points
        let integral: f64 = nodes.iter().zip(&weights).map(|(x, w)| w * x.powi(8)).sum();
        assert_abs_diff_eq!(integral, 2.0 / 9.0, epsilon = 1e-14);
    }

    #[test]
    fn test_line_length() {
        let line = Line::new(DVec3::ZERO, DVec3::new(3.0, 4.0, 0.0));
        assert_abs_diff_eq!(curve_length(&line).unwrap(), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(parameter_at_length(&line, 2.5).unwrap(), 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_circle_length() {
        let circle = unit_circle();
        let len = curve_length(&circle).unwrap();
        assert!((len - 2.0 * std::f64::consts::PI).abs() < 1e-6, "length {}", len);

        // Quarter of the length lands at the first quarter knot
        let t = parameter_at_length(&circle, len * 0.25).unwrap();
        assert!((t - 0.25).abs() < 1e-6);
        let p = circle.point_at(t).unwrap();
        assert!((p - DVec3::new(0.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_param_at_length_inverts_length() {
        let curve = NurbsCurve::from_points(
            3,
            vec![
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(1.0, 3.0, 0.0),
                DVec3::new(4.0, 3.0, 1.0),
                DVec3::new(5.0, 0.0, 0.0),
            ],
        )
        .unwrap();
        let total = bezier_length(&curve, 1.0).unwrap();
        for &frac in &[0.1, 0.33, 0.5, 0.9] {
            let t = bezier_param_at_length(&curve, total * frac).unwrap();
            let len = bezier_length(&curve, t).unwrap();
            assert_abs_diff_eq!(len, total * frac, epsilon = 1e-9);
        }
        assert_eq!(bezier_param_at_length(&curve, -1.0).unwrap(), 0.0);
        assert_eq!(bezier_param_at_length(&curve, total * 2.0).unwrap(), 1.0);
    }

    #[test]
    fn test_polyline_table() {
        let poly = Polyline::new(vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(2.0, 2.0, 0.0),
        ])
        .unwrap();
        let table = ArcLengthTable::new(&poly).unwrap();
        assert_abs_diff_eq!(table.total(), 4.0, epsilon = 1e-12);
        let t = table.parameter_at(3.0).unwrap();
        assert!((poly.point_at(t).unwrap() - DVec3::new(2.0, 1.0, 0.0)).length() < 1e-9);
    }
}
