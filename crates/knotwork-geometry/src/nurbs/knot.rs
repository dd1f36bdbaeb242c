//! Knot vector type and knot span lookup.

use std::ops::Deref;

use knotwork_core::{NurbsError, Result, Tolerance};
use serde::{Deserialize, Serialize};

/// A validated, non-decreasing sequence of knots.
///
/// The vector on its own only guarantees ordering and finiteness; whether it
/// fits a particular degree and control point count is checked with
/// [`KnotVector::validate_for`] by the curve or surface that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct KnotVector(Vec<f64>);

impl KnotVector {
    pub fn new(knots: Vec<f64>) -> Result<Self> {
        if knots.is_empty() {
            return Err(NurbsError::InvalidArgument("knot vector is empty".into()));
        }
        if let Some(i) = knots.iter().position(|k| !k.is_finite()) {
            return Err(NurbsError::InvalidArgument(format!(
                "knot {} is not finite ({})",
                i, knots[i]
            )));
        }
        if let Some(i) = knots.windows(2).position(|w| w[1] < w[0]) {
            return Err(NurbsError::InvalidArgument(format!(
                "knot vector decreases at index {}: {} > {}",
                i + 1,
                knots[i],
                knots[i + 1]
            )));
        }
        Ok(Self(knots))
    }

    /// Clamped knot vector over `[0, 1]` with evenly spaced interior knots.
    pub fn uniform_clamped(degree: usize, n_points: usize) -> Result<Self> {
        if degree == 0 {
            return Err(NurbsError::InvalidArgument("degree must be positive".into()));
        }
        if n_points <= degree {
            return Err(NurbsError::InvalidArgument(format!(
                "degree {} needs at least {} control points, got {}",
                degree,
                degree + 1,
                n_points
            )));
        }
        let interior = n_points - degree - 1;
        let mut knots = vec![0.0; degree + 1];
        knots.extend((1..=interior).map(|i| i as f64 / (interior + 1) as f64));
        knots.extend(std::iter::repeat(1.0).take(degree + 1));
        Ok(Self(knots))
    }

    /// Wrap knots produced by an algorithm that preserves ordering.
    pub(crate) fn from_sorted(knots: Vec<f64>) -> Self {
        debug_assert!(knots.windows(2).all(|w| w[0] <= w[1]));
        Self(knots)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Check this vector against a degree and control point count:
    /// `len == n_points + degree + 1`, clamped ends, interior multiplicity
    /// at most `degree`, and a non-empty domain.
    pub fn validate_for(&self, degree: usize, n_points: usize) -> Result<()> {
        if degree == 0 {
            return Err(NurbsError::InvalidArgument("degree must be positive".into()));
        }
        if n_points <= degree {
            return Err(NurbsError::InvalidArgument(format!(
                "degree {} needs at least {} control points, got {}",
                degree,
                degree + 1,
                n_points
            )));
        }
        if self.len() != n_points + degree + 1 {
            return Err(NurbsError::DimensionMismatch(format!(
                "knot vector length must be n + p + 1, got {} knots for {} control points with degree {}",
                self.len(),
                n_points,
                degree
            )));
        }
        if !self.is_clamped(degree) {
            return Err(NurbsError::InvalidArgument(format!(
                "knot vector is not clamped for degree {}: {:?}",
                degree, self.0
            )));
        }
        let (t0, t1) = self.domain(degree);
        if t1 - t0 <= Tolerance::EPSILON {
            return Err(NurbsError::InvalidArgument(format!(
                "knot vector has an empty domain [{}, {}]",
                t0, t1
            )));
        }
        let interior = &self.0[degree + 1..self.len() - degree - 1];
        for &k in interior {
            let m = self.multiplicity(k);
            if m > degree {
                return Err(NurbsError::InvalidArgument(format!(
                    "interior knot {} has multiplicity {} > degree {}",
                    k, m, degree
                )));
            }
        }
        Ok(())
    }

    /// Whether the first and last knots are each repeated `degree + 1` times.
    pub fn is_clamped(&self, degree: usize) -> bool {
        if self.len() < 2 * (degree + 1) {
            return false;
        }
        let first = self.0[0];
        let last = self.0[self.len() - 1];
        self.0[..=degree].iter().all(|&k| k == first)
            && self.0[self.len() - degree - 1..].iter().all(|&k| k == last)
    }

    /// Number of knots equal to `t` (within [`Tolerance::EPSILON`]).
    pub fn multiplicity(&self, t: f64) -> usize {
        self.0
            .iter()
            .filter(|&&k| (k - t).abs() < Tolerance::EPSILON)
            .count()
    }

    /// Distinct knot values in increasing order.
    pub fn distinct(&self) -> Vec<f64> {
        let mut out: Vec<f64> = Vec::new();
        for &k in &self.0 {
            if out.last().map_or(true, |&last| k - last >= Tolerance::EPSILON) {
                out.push(k);
            }
        }
        out
    }

    /// Parameter domain `(U[p], U[len - p - 1])` for a curve of `degree`.
    pub fn domain(&self, degree: usize) -> (f64, f64) {
        (self.0[degree], self.0[self.len() - degree - 1])
    }

    /// The same knot spacing mapped onto `[0, 1]`.
    pub fn normalized(&self) -> Self {
        let first = self.0[0];
        let span = self.0[self.len() - 1] - first;
        if span == 0.0 {
            return self.clone();
        }
        Self(self.0.iter().map(|k| (k - first) / span).collect())
    }

    /// Knots of the reversed curve: `a + b - k` in reverse order.
    pub fn reversed(&self) -> Self {
        let sum = self.0[0] + self.0[self.len() - 1];
        Self(self.0.iter().rev().map(|k| sum - k).collect())
    }

    /// Find the knot span for `t`, failing when `t` lies outside the domain.
    ///
    /// Parameters within [`Tolerance::EPSILON`] of a domain end are snapped to it.
    /// `n` is the number of control points minus 1.
    pub fn find_span(&self, degree: usize, n: usize, t: f64) -> Result<usize> {
        let (lo, hi) = (self.0[degree], self.0[n + 1]);
        if !(t >= lo - Tolerance::EPSILON && t <= hi + Tolerance::EPSILON) {
            return Err(NurbsError::Domain(format!(
                "parameter {} outside domain [{}, {}]",
                t, lo, hi
            )));
        }
        Ok(span_index(degree, &self.0, n, t.clamp(lo, hi)))
    }
}

impl Deref for KnotVector {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

impl TryFrom<Vec<f64>> for KnotVector {
    type Error = NurbsError;

    fn try_from(knots: Vec<f64>) -> Result<Self> {
        Self::new(knots)
    }
}

impl From<KnotVector> for Vec<f64> {
    fn from(knots: KnotVector) -> Self {
        knots.0
    }
}

/// Find the knot span index for parameter `t` in the knot vector.
///
/// Returns the index `i` such that `knots[i] <= t < knots[i+1]`,
/// with special handling for the upper boundary. No domain check is done;
/// callers clamp `t` first.
///
/// # Arguments
/// * `degree` - Degree of the B-spline
/// * `knots` - The knot vector
/// * `n` - Number of control points minus 1
/// * `t` - Parameter value
pub fn span_index(degree: usize, knots: &[f64], n: usize, t: f64) -> usize {
    // Special case: t at upper boundary
    if t >= knots[n + 1] {
        return n;
    }
    if t <= knots[degree] {
        // Skip zero-length spans at the start of the domain
        let mut span = degree;
        while span < n && knots[span + 1] <= t {
            span += 1;
        }
        return span;
    }

    // Binary search
    let mut low = degree;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;

    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }

    mid
}
