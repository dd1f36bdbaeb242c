//! Knot insertion and Bézier decomposition on homogeneous control points.

use knotwork_core::Tolerance;
use knotwork_math::HomogeneousPoint;

use super::knot::span_index;

/// Insert `t` once into the knot vector (Boehm's algorithm).
///
/// The curve is unchanged; one control point is added. `t` must lie inside
/// the domain.
pub fn insert_knot(
    degree: usize,
    knots: &[f64],
    points: &[HomogeneousPoint],
    t: f64,
) -> (Vec<f64>, Vec<HomogeneousPoint>) {
    let p = degree;
    let n = points.len() - 1;
    let k = span_index(p, knots, n, t);

    let mut new_points = Vec::with_capacity(points.len() + 1);
    for i in 0..=n + 1 {
        let q = if i + p <= k {
            points[i]
        } else if i > k {
            points[i - 1]
        } else {
            let denom = knots[i + p] - knots[i];
            let alpha = if denom == 0.0 { 0.0 } else { (t - knots[i]) / denom };
            alpha * points[i] + (1.0 - alpha) * points[i - 1]
        };
        new_points.push(q);
    }

    let mut new_knots = Vec::with_capacity(knots.len() + 1);
    new_knots.extend_from_slice(&knots[..=k]);
    new_knots.push(t);
    new_knots.extend_from_slice(&knots[k + 1..]);

    (new_knots, new_points)
}

/// Split a clamped curve into Bézier pieces at its interior knots.
///
/// Each piece is returned as `(knots, points)` with `degree + 1` points and a
/// clamped knot vector spanning one original knot interval.
pub fn decompose_into_beziers(
    degree: usize,
    knots: &[f64],
    points: &[HomogeneousPoint],
) -> Vec<(Vec<f64>, Vec<HomogeneousPoint>)> {
    let p = degree;
    let mut knots = knots.to_vec();
    let mut points = points.to_vec();

    let (t0, t1) = (knots[p], knots[knots.len() - p - 1]);
    let mut interior: Vec<f64> = Vec::new();
    for &k in &knots[p + 1..knots.len() - p - 1] {
        if k - t0 > Tolerance::EPSILON
            && t1 - k > Tolerance::EPSILON
            && interior.last().map_or(true, |&last| k - last > Tolerance::EPSILON)
        {
            interior.push(k);
        }
    }

    for &u in &interior {
        let multiplicity = knots.iter().filter(|&&k| (k - u).abs() < Tolerance::EPSILON).count();
        for _ in multiplicity..p {
            let (k, q) = insert_knot(p, &knots, &points, u);
            knots = k;
            points = q;
        }
    }

    let mut bounds = Vec::with_capacity(interior.len() + 2);
    bounds.push(t0);
    bounds.extend_from_slice(&interior);
    bounds.push(t1);

    bounds
        .windows(2)
        .enumerate()
        .map(|(i, w)| {
            let mut seg_knots = vec![w[0]; p + 1];
            seg_knots.extend(std::iter::repeat(w[1]).take(p + 1));
            let seg_points = points[i * p..=i * p + p].to_vec();
            (seg_knots, seg_points)
        })
        .collect()
}
