//! Point and derivative evaluation for rational B-spline curves and surfaces.
//!
//! Control points are given in homogeneous form `(x*w, y*w, z*w, w)`; the
//! polynomial evaluation happens in 4D and the rational projection is applied
//! last.

use knotwork_core::{NurbsError, Result, Tolerance};
use knotwork_math::{HomogeneousPoint, Point3, Vector3, DVec3};

use super::basis::{basis_function_derivatives, basis_functions};
use super::knot::KnotVector;

/// Binomial coefficient `n choose k` as `f64`.
pub fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

fn check_weight(w: f64) -> Result<()> {
    if w.abs() < Tolerance::EPSILON {
        return Err(NurbsError::DegenerateGeometry(
            "weight sum vanishes at parameter".into(),
        ));
    }
    Ok(())
}

/// Evaluate the homogeneous curve point at `t`.
pub fn curve_point(
    degree: usize,
    knots: &KnotVector,
    points: &[HomogeneousPoint],
    t: f64,
) -> Result<HomogeneousPoint> {
    let n = points.len() - 1;
    let span = knots.find_span(degree, n, t)?;
    let basis = basis_functions(degree, knots, span, t);

    Ok(basis
        .iter()
        .enumerate()
        .fold(HomogeneousPoint::ZERO, |acc, (i, &b)| {
            acc + b * points[span - degree + i]
        }))
}

/// Evaluate a rational curve point at `t`, projected to Cartesian space.
pub fn rational_curve_point(
    degree: usize,
    knots: &KnotVector,
    points: &[HomogeneousPoint],
    t: f64,
) -> Result<Point3> {
    let h = curve_point(degree, knots, points, t)?;
    check_weight(h.w)?;
    Ok(h.truncate() / h.w)
}

/// Derivatives of the homogeneous curve up to `order` (index 0 is the point).
pub fn curve_derivatives(
    degree: usize,
    knots: &KnotVector,
    points: &[HomogeneousPoint],
    t: f64,
    order: usize,
) -> Result<Vec<HomogeneousPoint>> {
    let n = points.len() - 1;
    let span = knots.find_span(degree, n, t)?;
    let ders = basis_function_derivatives(degree, knots, span, t, order);

    Ok(ders
        .iter()
        .map(|row| {
            row.iter().enumerate().fold(HomogeneousPoint::ZERO, |acc, (j, &b)| {
                acc + b * points[span - degree + j]
            })
        })
        .collect())
}

/// Cartesian derivatives of a rational curve up to `order`.
///
/// `C^(k) = (A^(k) - sum_{i=1..k} C(k,i) w^(i) C^(k-i)) / w`, where `A` and `w`
/// are the spatial and weight parts of the homogeneous derivatives.
pub fn rational_curve_derivatives(
    degree: usize,
    knots: &KnotVector,
    points: &[HomogeneousPoint],
    t: f64,
    order: usize,
) -> Result<Vec<Vector3>> {
    let hders = curve_derivatives(degree, knots, points, t, order)?;
    let w0 = hders[0].w;
    check_weight(w0)?;

    let mut ck: Vec<Vector3> = Vec::with_capacity(order + 1);
    for k in 0..=order {
        let mut v = hders[k].truncate();
        for i in 1..=k {
            v -= binomial(k, i) * hders[i].w * ck[k - i];
        }
        ck.push(v / w0);
    }
    Ok(ck)
}

/// Evaluate a homogeneous surface point at `(u, v)`.
///
/// Each row of the grid is collapsed along `v` first; the resulting
/// intermediate points are then blended by the `u` basis.
#[allow(clippy::too_many_arguments)]
pub fn surface_point(
    degree_u: usize,
    degree_v: usize,
    knots_u: &KnotVector,
    knots_v: &KnotVector,
    points: &[Vec<HomogeneousPoint>],
    u: f64,
    v: f64,
) -> Result<HomogeneousPoint> {
    let n_u = points.len() - 1;
    let span_u = knots_u.find_span(degree_u, n_u, u)?;
    let basis_u = basis_functions(degree_u, knots_u, span_u, u);

    let n_v = points[0].len() - 1;
    let span_v = knots_v.find_span(degree_v, n_v, v)?;
    let basis_v = basis_functions(degree_v, knots_v, span_v, v);

    let mut point = HomogeneousPoint::ZERO;
    for (i, &bu) in basis_u.iter().enumerate() {
        let row = &points[span_u - degree_u + i];
        let temp = basis_v
            .iter()
            .enumerate()
            .fold(HomogeneousPoint::ZERO, |acc, (j, &bv)| {
                acc + bv * row[span_v - degree_v + j]
            });
        point += bu * temp;
    }

    Ok(point)
}

/// Evaluate a rational surface point at `(u, v)`.
#[allow(clippy::too_many_arguments)]
pub fn rational_surface_point(
    degree_u: usize,
    degree_v: usize,
    knots_u: &KnotVector,
    knots_v: &KnotVector,
    points: &[Vec<HomogeneousPoint>],
    u: f64,
    v: f64,
) -> Result<Point3> {
    let h = surface_point(degree_u, degree_v, knots_u, knots_v, points, u, v)?;
    check_weight(h.w)?;
    Ok(h.truncate() / h.w)
}

/// Mixed partial derivatives of the homogeneous surface.
///
/// `skl[k][l]` is the derivative taken `k` times in `u` and `l` times in `v`,
/// for `k + l <= order`; entries above that are zero.
#[allow(clippy::too_many_arguments)]
pub fn surface_derivatives(
    degree_u: usize,
    degree_v: usize,
    knots_u: &KnotVector,
    knots_v: &KnotVector,
    points: &[Vec<HomogeneousPoint>],
    u: f64,
    v: f64,
    order: usize,
) -> Result<Vec<Vec<HomogeneousPoint>>> {
    let n_u = points.len() - 1;
    let span_u = knots_u.find_span(degree_u, n_u, u)?;
    let ders_u = basis_function_derivatives(degree_u, knots_u, span_u, u, order);

    let n_v = points[0].len() - 1;
    let span_v = knots_v.find_span(degree_v, n_v, v)?;
    let ders_v = basis_function_derivatives(degree_v, knots_v, span_v, v, order);

    let mut skl = vec![vec![HomogeneousPoint::ZERO; order + 1]; order + 1];
    let mut temp = vec![HomogeneousPoint::ZERO; degree_v + 1];

    for k in 0..=order {
        for (s, slot) in temp.iter_mut().enumerate() {
            *slot = ders_u[k]
                .iter()
                .enumerate()
                .fold(HomogeneousPoint::ZERO, |acc, (r, &b)| {
                    acc + b * points[span_u - degree_u + r][span_v - degree_v + s]
                });
        }
        for l in 0..=(order - k) {
            skl[k][l] = temp
                .iter()
                .zip(&ders_v[l])
                .fold(HomogeneousPoint::ZERO, |acc, (&p, &b)| acc + b * p);
        }
    }

    Ok(skl)
}

/// Cartesian mixed partial derivatives of a rational surface, `k + l <= order`.
#[allow(clippy::too_many_arguments)]
pub fn rational_surface_derivatives(
    degree_u: usize,
    degree_v: usize,
    knots_u: &KnotVector,
    knots_v: &KnotVector,
    points: &[Vec<HomogeneousPoint>],
    u: f64,
    v: f64,
    order: usize,
) -> Result<Vec<Vec<Vector3>>> {
    let hders = surface_derivatives(degree_u, degree_v, knots_u, knots_v, points, u, v, order)?;
    let w00 = hders[0][0].w;
    check_weight(w00)?;

    let mut skl = vec![vec![DVec3::ZERO; order + 1]; order + 1];
    for k in 0..=order {
        for l in 0..=(order - k) {
            let mut val = hders[k][l].truncate();
            for j in 1..=l {
                val -= binomial(l, j) * hders[0][j].w * skl[k][l - j];
            }
            for i in 1..=k {
                val -= binomial(k, i) * hders[i][0].w * skl[k - i][l];
                let mut inner = DVec3::ZERO;
                for j in 1..=l {
                    inner += binomial(l, j) * hders[i][j].w * skl[k - i][l - j];
                }
                val -= binomial(k, i) * inner;
            }
            skl[k][l] = val / w00;
        }
    }

    Ok(skl)
}
